//! Order data model for the dispatch client.
//!
//! This module defines the order aggregate exactly as the backend delivers
//! it: an identifier, monetary totals, product lines, and an append-only,
//! chronologically ordered list of shipping events. The client never
//! constructs an order from scratch; it fetches, appends events, and
//! overwrites the status field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::time::iso_millis;

/// An order as fetched from the backend.
///
/// Orders are created server-side and read-only for this client except for
/// the `shipping_details` list (append-only) and the `status` field, both of
/// which are modified locally through the status engine and submitted back
/// as a delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Unique identifier for this order.
	pub id: String,
	/// Secondary order reference shown to customers.
	pub order_id: String,
	/// Monetary total in minor units of `currency`.
	pub amount_total: i64,
	/// Timestamp when this order was created.
	#[serde(with = "iso_millis")]
	pub date_created: DateTime<Utc>,
	/// ISO currency code, lowercase on the wire (e.g. "vnd").
	pub currency: String,
	/// Customer contact and delivery address details.
	pub customer_details: CustomerDetails,
	/// Product lines included in this order.
	pub product_details: Vec<ProductLine>,
	/// Shipping history, ordered, append-only. Each event is immutable once
	/// appended.
	pub shipping_details: Vec<ShippingEvent>,
	/// Persisted status of the order.
	pub status: OrderStatus,
	/// Payment status code as reported by the payment processor.
	pub payment_status: i32,
}

impl Order {
	/// Returns the pickup address recorded on the earliest event that
	/// carries one, if any.
	///
	/// Dispatch events reuse this address rather than collecting a new one.
	pub fn pickup_address(&self) -> Option<&str> {
		self.shipping_details
			.iter()
			.find_map(|event| event.pickup_address.as_deref())
	}
}

/// Customer contact details attached to an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
	pub first_name: String,
	pub last_name: String,
	pub address: String,
	pub zip_code: i32,
	pub city: String,
	pub state: String,
	pub email: String,
	pub phone_number: String,
}

/// A single product line within an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLine {
	pub product_id: String,
	pub product_name: String,
	pub color: String,
	pub memory: String,
	pub storage: String,
	pub quantity: i32,
	/// URL of the product image.
	pub image: String,
}

/// An immutable, timestamped record appended to an order's shipping history.
///
/// Exactly one of two shapes occurs in practice: a dispatch event
/// (dispatcher, dispatched-to, and pickup address set, status unchanged) or
/// a status-change event (note only, accompanied by a new order status).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingEvent {
	/// Identifier of the actor who recorded the event.
	pub dispatcher_id: Option<String>,
	/// Identifier of the driver the order was dispatched to. Set only on
	/// dispatch events.
	pub dispatched_to_id: Option<String>,
	/// Pickup address for the driver. Set only on dispatch events.
	pub pickup_address: Option<String>,
	/// Free-text note entered on confirmation.
	pub note: String,
	/// Timestamp when the event was appended.
	#[serde(with = "iso_millis")]
	pub date_created: DateTime<Utc>,
}

/// Persisted status of an order.
///
/// The "Dispatched" display state has no persisted value here; it is derived
/// from the shipping history by the status engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
	/// Order has been created but not yet handed to a shipper.
	Created,
	/// Order is in transit.
	Shipping,
	/// Order has been delivered. Terminal.
	Delivered,
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderStatus::Created => write!(f, "Created"),
			OrderStatus::Shipping => write!(f, "Shipping"),
			OrderStatus::Delivered => write!(f, "Delivered"),
		}
	}
}

/// The single assignable driver offered for a dispatch.
///
/// The backend offers exactly one candidate per dispatch; there is no
/// selection among multiple drivers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
	pub id: String,
	pub name: String,
}
