//! In-memory view state for the order list.
//!
//! The store holds the orders most recently fetched from the backend plus
//! any optimistic local updates. There is exactly one way to change a
//! single order: `update`, keyed by identifier, so no caller can drift from
//! the fetched list structure.

use dispatch_types::Order;
use tokio::sync::RwLock;

/// Order view state keyed by order identifier.
///
/// Server ordering is preserved; `update` replaces in place.
pub struct OrderStore {
	orders: RwLock<Vec<Order>>,
}

impl OrderStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self {
			orders: RwLock::new(Vec::new()),
		}
	}

	/// Replaces the entire view with a freshly fetched list.
	pub async fn replace_all(&self, orders: Vec<Order>) {
		*self.orders.write().await = orders;
	}

	/// Returns a snapshot of all orders in server order.
	pub async fn all(&self) -> Vec<Order> {
		self.orders.read().await.clone()
	}

	/// Looks up an order by identifier.
	pub async fn get(&self, id: &str) -> Option<Order> {
		self.orders
			.read()
			.await
			.iter()
			.find(|order| order.id == id)
			.cloned()
	}

	/// Replaces the order with a matching identifier.
	///
	/// Returns false when no order matches; an unknown order is never
	/// inserted, since every order originates from a fetch.
	pub async fn update(&self, order: Order) -> bool {
		let mut orders = self.orders.write().await;
		match orders.iter_mut().find(|existing| existing.id == order.id) {
			Some(slot) => {
				*slot = order;
				true
			}
			None => false,
		}
	}
}

impl Default for OrderStore {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{TimeZone, Utc};
	use dispatch_types::{CustomerDetails, OrderStatus};

	fn order(id: &str) -> Order {
		Order {
			id: id.to_string(),
			order_id: format!("SO-{}", id),
			amount_total: 1_000,
			date_created: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
			currency: "vnd".to_string(),
			customer_details: CustomerDetails {
				first_name: "Linh".to_string(),
				last_name: "Tran".to_string(),
				address: "12 Hang Bac".to_string(),
				zip_code: 10_000,
				city: "Hanoi".to_string(),
				state: "HN".to_string(),
				email: "linh.tran@example.com".to_string(),
				phone_number: "+84 912 345 678".to_string(),
			},
			product_details: Vec::new(),
			shipping_details: Vec::new(),
			status: OrderStatus::Created,
			payment_status: 1,
		}
	}

	#[tokio::test]
	async fn test_replace_and_lookup() {
		let store = OrderStore::new();
		store.replace_all(vec![order("a"), order("b")]).await;

		assert_eq!(store.all().await.len(), 2);
		assert!(store.get("a").await.is_some());
		assert!(store.get("c").await.is_none());
	}

	#[tokio::test]
	async fn test_update_replaces_in_place() {
		let store = OrderStore::new();
		store.replace_all(vec![order("a"), order("b")]).await;

		let mut updated = order("b");
		updated.status = OrderStatus::Shipping;
		assert!(store.update(updated).await);

		// Position preserved, value replaced.
		let all = store.all().await;
		assert_eq!(all[1].id, "b");
		assert_eq!(all[1].status, OrderStatus::Shipping);
		assert_eq!(all[0].status, OrderStatus::Created);
	}

	#[tokio::test]
	async fn test_update_unknown_order_is_not_inserted() {
		let store = OrderStore::new();
		store.replace_all(vec![order("a")]).await;

		assert!(!store.update(order("ghost")).await);
		assert_eq!(store.all().await.len(), 1);
	}
}
