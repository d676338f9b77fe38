//! Order status engine for the dispatch client.
//!
//! This module is the single reader of an order's raw `(status,
//! shipping_details)` pair: it derives the display state, determines which
//! actions a role may take, and computes the next order value resulting
//! from an action. Derived state is never stored; it is recomputed on every
//! read so no second code path can drift from the rules here.
//!
//! All functions are pure and total. There is no error type: callers gate
//! every mutation on [`available_actions`], and the `apply_*` functions
//! trust that gate. An order produced by bypassing it is logically invalid
//! rather than a runtime fault.

use chrono::{DateTime, Utc};
use dispatch_types::{Order, OrderStatus, Role, ShippingEvent};
use serde::Serialize;
use std::fmt;

/// Display state of an order, derived from persisted fields.
///
/// `Dispatched` has no persisted status value; it is inferred from the
/// shipping history, which is why derivation inspects the event list rather
/// than trusting `status` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DerivedState {
	/// No driver assigned yet.
	Pending,
	/// A driver has been assigned; the order has not started moving.
	Dispatched,
	/// In transit.
	Shipping,
	/// Delivered. Terminal.
	Delivered,
}

impl DerivedState {
	/// Position of this state along the forward-only lifecycle.
	pub fn rank(&self) -> u8 {
		match self {
			DerivedState::Pending => 0,
			DerivedState::Dispatched => 1,
			DerivedState::Shipping => 2,
			DerivedState::Delivered => 3,
		}
	}
}

impl fmt::Display for DerivedState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DerivedState::Pending => write!(f, "Pending"),
			DerivedState::Dispatched => write!(f, "Dispatched"),
			DerivedState::Shipping => write!(f, "Shipping"),
			DerivedState::Delivered => write!(f, "Delivered"),
		}
	}
}

/// An action a role may take on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
	/// Assign the candidate driver to a pending order.
	Dispatch,
	/// Move the order to `Shipping`, or update the shipping note while
	/// already in transit.
	MarkShipping,
	/// Move the order to `Delivered`.
	MarkDelivered,
}

impl Action {
	/// The persisted status a status-changing action targets.
	///
	/// `Dispatch` changes no status; it only appends to the history.
	pub fn target_status(&self) -> Option<OrderStatus> {
		match self {
			Action::Dispatch => None,
			Action::MarkShipping => Some(OrderStatus::Shipping),
			Action::MarkDelivered => Some(OrderStatus::Delivered),
		}
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Action::Dispatch => write!(f, "dispatch"),
			Action::MarkShipping => write!(f, "ship"),
			Action::MarkDelivered => write!(f, "deliver"),
		}
	}
}

/// Derives the display state of an order.
///
/// The persisted status wins when it already places the order in transit or
/// at its terminal state; otherwise a driver assignment anywhere in the
/// history means `Dispatched`, and an untouched order is `Pending`. Total
/// over every order, including one with an empty history.
pub fn derive_state(order: &Order) -> DerivedState {
	match order.status {
		OrderStatus::Delivered => DerivedState::Delivered,
		OrderStatus::Shipping => DerivedState::Shipping,
		OrderStatus::Created => {
			if order
				.shipping_details
				.iter()
				.any(|event| event.dispatched_to_id.is_some())
			{
				DerivedState::Dispatched
			} else {
				DerivedState::Pending
			}
		}
	}
}

/// Returns the actions available to `role` on `order`.
///
/// This is the only gate on mutation: no offered sequence can move a state
/// backward, which is what keeps the `apply_*` functions free of runtime
/// checks. Dispatchers act exactly once, on a pending order; shippers take
/// over afterwards. `MarkShipping` stays available while already in
/// `Shipping` so the note can be updated without faking a transition.
pub fn available_actions(order: &Order, role: Role) -> Vec<Action> {
	let state = derive_state(order);

	match role {
		Role::Dispatcher => match state {
			DerivedState::Pending => vec![Action::Dispatch],
			_ => Vec::new(),
		},
		Role::Shipper => match state {
			DerivedState::Dispatched => vec![Action::MarkShipping],
			DerivedState::Shipping => vec![Action::MarkShipping, Action::MarkDelivered],
			DerivedState::Pending | DerivedState::Delivered => Vec::new(),
		},
	}
}

/// Applies a dispatch: appends a dispatch-shaped event assigning `driver_id`
/// with the pickup address, leaving the persisted status untouched.
///
/// Precondition (caller-enforced): [`available_actions`] offered
/// [`Action::Dispatch`] for the caller's role, and a driver has been
/// resolved. Consumes the order and returns the next value.
pub fn apply_dispatch(
	mut order: Order,
	dispatcher_id: &str,
	driver_id: &str,
	pickup_address: Option<String>,
	note: &str,
	timestamp: DateTime<Utc>,
) -> Order {
	order.shipping_details.push(ShippingEvent {
		dispatcher_id: Some(dispatcher_id.to_string()),
		dispatched_to_id: Some(driver_id.to_string()),
		pickup_address,
		note: note.to_string(),
		date_created: timestamp,
	});

	order
}

/// Applies a status change: appends a status-shaped event (note only, no
/// driver or pickup address) and overwrites the persisted status.
///
/// Precondition (caller-enforced): [`available_actions`] offered the action
/// matching `new_status`. This function trusts its caller; monotonicity is
/// guaranteed by the gate never offering a backward move.
pub fn apply_status_change(
	mut order: Order,
	dispatcher_id: &str,
	note: &str,
	timestamp: DateTime<Utc>,
	new_status: OrderStatus,
) -> Order {
	order.shipping_details.push(ShippingEvent {
		dispatcher_id: Some(dispatcher_id.to_string()),
		dispatched_to_id: None,
		pickup_address: None,
		note: note.to_string(),
		date_created: timestamp,
	});
	order.status = new_status;

	order
}
