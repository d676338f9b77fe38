//! Request body types for the backend HTTP endpoints.
//!
//! Field names here are wire facts owned by the backend: login and
//! order-mutation bodies use PascalCase keys, unlike the camelCase order
//! payloads the backend returns. Optional fields serialize as JSON `null`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::order::OrderStatus;
use crate::utils::time::iso_millis;

/// Body for the login endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginRequest {
	/// Email address or phone number identifying the user.
	pub email_or_phone: String,
	pub password: String,
}

/// Body for the dispatch endpoint: assigns a driver and pickup address to an
/// order. The order status is not part of this body and remains unchanged.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DispatchOrderRequest {
	/// Identifier of the order being dispatched.
	pub id: String,
	/// Identifier of the dispatcher recording the assignment.
	pub dispatcher_id: String,
	/// Identifier of the driver the order is assigned to.
	pub dispatched_to_id: String,
	/// Pickup address for the driver, carried over from the order's
	/// shipping history.
	pub pickup_address: Option<String>,
	pub note: String,
	#[serde(with = "iso_millis")]
	pub date_created: DateTime<Utc>,
}

/// Body for the shipping-status endpoint: records a status change with a
/// note. Driver and pickup address are never set on a status change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShippingOrderRequest {
	/// Identifier of the order being updated.
	pub id: String,
	/// Identifier of the actor recording the change.
	pub dispatcher_id: String,
	pub dispatched_to_id: Option<String>,
	pub pickup_address: Option<String>,
	pub note: String,
	#[serde(with = "iso_millis")]
	pub date_created: DateTime<Utc>,
	/// New persisted status for the order.
	pub status: OrderStatus,
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn timestamp() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
	}

	#[test]
	fn test_login_request_field_names() {
		let body = LoginRequest {
			email_or_phone: "linh.tran@example.com".to_string(),
			password: "hunter2".to_string(),
		};
		let value = serde_json::to_value(&body).unwrap();

		assert_eq!(value["EmailOrPhone"], "linh.tran@example.com");
		assert_eq!(value["Password"], "hunter2");
	}

	#[test]
	fn test_dispatch_request_wire_shape() {
		let body = DispatchOrderRequest {
			id: "ord_6f2a".to_string(),
			dispatcher_id: "usr_d1".to_string(),
			dispatched_to_id: "drv_9".to_string(),
			pickup_address: Some("48 Warehouse Rd".to_string()),
			note: "Fragile".to_string(),
			date_created: timestamp(),
		};
		let value = serde_json::to_value(&body).unwrap();

		assert_eq!(value["Id"], "ord_6f2a");
		assert_eq!(value["DispatcherId"], "usr_d1");
		assert_eq!(value["DispatchedToId"], "drv_9");
		assert_eq!(value["PickupAddress"], "48 Warehouse Rd");
		assert_eq!(value["DateCreated"], "2024-05-01T12:00:00.000Z");
		// A dispatch body never carries a status.
		assert!(value.get("Status").is_none());
	}

	#[test]
	fn test_shipping_request_nulls_and_status() {
		let body = ShippingOrderRequest {
			id: "ord_6f2a".to_string(),
			dispatcher_id: "usr_s2".to_string(),
			dispatched_to_id: None,
			pickup_address: None,
			note: "Left at the depot".to_string(),
			date_created: timestamp(),
			status: OrderStatus::Shipping,
		};
		let value = serde_json::to_value(&body).unwrap();

		assert!(value["DispatchedToId"].is_null());
		assert!(value["PickupAddress"].is_null());
		assert_eq!(value["Status"], "Shipping");
	}
}
