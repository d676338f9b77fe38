//! Core orchestration for the dispatch client.
//!
//! This module wires the status engine, the backend API, and the session
//! together: it authenticates, keeps the order view state, gates every
//! mutation through the engine's available actions, and applies the
//! optimistic local result before the backend confirms it. It performs at
//! most one outstanding network call per user-initiated action and never
//! retries.

use chrono::Utc;
use thiserror::Error;

use dispatch_api::{ApiError, OrderApi};
use dispatch_order::{available_actions, derive_state, Action, DerivedState};
use dispatch_storage::{StorageError, StorageService};
use dispatch_types::{
	AuthError, DispatchOrderRequest, Identity, LoginRequest, Order, OrderStatus,
	ShippingOrderRequest,
};

pub mod session;
pub mod store;

pub use session::SessionService;
pub use store::OrderStore;

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum ClientError {
	/// No cached credential; the caller must log in first.
	#[error("Not logged in")]
	NotAuthenticated,
	/// Error that occurs while reading credential claims.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Error that occurs while talking to the backend.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Error that occurs in the token cache.
	#[error(transparent)]
	Storage(#[from] StorageError),
	/// The requested action is not offered for the order's current state
	/// and the caller's role.
	#[error("Cannot {action} an order in state {state}")]
	ActionNotAvailable {
		action: Action,
		state: DerivedState,
	},
	/// Dispatch requested while no driver candidate has resolved.
	#[error("No driver available for dispatch")]
	NoDriverAvailable,
	/// The order identifier matches nothing in the fetched list.
	#[error("Unknown order: {0}")]
	UnknownOrder(String),
}

/// The order-dispatch client.
///
/// Owns the session, the order view state, and the backend connection. All
/// mutation paths go through [`dispatch_order::available_actions`]; a
/// control that the engine does not offer cannot be exercised here.
pub struct DispatchClient {
	api: Box<dyn OrderApi>,
	session: SessionService,
	store: OrderStore,
}

impl DispatchClient {
	/// Creates a new client over the given API connection and storage.
	pub fn new(api: Box<dyn OrderApi>, storage: StorageService) -> Self {
		Self {
			api,
			session: SessionService::new(storage),
			store: OrderStore::new(),
		}
	}

	/// Authenticates against the backend and caches the issued token.
	pub async fn login(&self, email_or_phone: &str, password: &str) -> Result<Identity, ClientError> {
		let request = LoginRequest {
			email_or_phone: email_or_phone.to_string(),
			password: password.to_string(),
		};

		let token = self.api.login(&request).await?;
		let claims = dispatch_types::decode_claims(&token)?;
		let identity = Identity::from_claims(&claims)?;

		self.session.save_token(&token).await?;
		tracing::info!(actor_id = %identity.id, "Logged in");

		Ok(identity)
	}

	/// Drops the cached credential.
	pub async fn logout(&self) -> Result<(), ClientError> {
		self.session.clear().await?;
		tracing::info!("Logged out");
		Ok(())
	}

	/// Returns the identity asserted by the cached credential.
	pub async fn identity(&self) -> Result<Identity, ClientError> {
		let (_, identity) = self.session.authenticated().await?;
		Ok(identity)
	}

	/// Fetches the actor's orders and replaces the view state.
	pub async fn refresh_orders(&self) -> Result<Vec<Order>, ClientError> {
		let (token, identity) = self.session.authenticated().await?;
		let orders = self.api.fetch_orders(&token, &identity.id).await?;

		tracing::debug!(count = orders.len(), "Fetched orders");
		self.store.replace_all(orders.clone()).await;

		Ok(orders)
	}

	/// Returns the current order view state in server order.
	pub async fn orders(&self) -> Vec<Order> {
		self.store.all().await
	}

	/// Looks up a single order from the view state.
	pub async fn order(&self, order_id: &str) -> Result<Order, ClientError> {
		self.store
			.get(order_id)
			.await
			.ok_or_else(|| ClientError::UnknownOrder(order_id.to_string()))
	}

	/// Assigns the offered driver to a pending order.
	///
	/// The pickup address is carried over from the order's shipping
	/// history. The local view is updated optimistically before the
	/// submission outcome is known; on submit failure the error is returned
	/// and the optimistic value stands until the next refresh (last server
	/// write wins).
	pub async fn dispatch(&self, order_id: &str, note: &str) -> Result<Order, ClientError> {
		let (token, identity) = self.session.authenticated().await?;
		let order = self.order(order_id).await?;
		require_action(&order, &identity, Action::Dispatch)?;

		let driver = self
			.api
			.fetch_driver(&token)
			.await?
			.ok_or(ClientError::NoDriverAvailable)?;

		let pickup_address = order.pickup_address().map(str::to_string);
		let timestamp = Utc::now();

		let request = DispatchOrderRequest {
			id: order.id.clone(),
			dispatcher_id: identity.id.clone(),
			dispatched_to_id: driver.id.clone(),
			pickup_address: pickup_address.clone(),
			note: note.to_string(),
			date_created: timestamp,
		};

		let updated = dispatch_order::apply_dispatch(
			order,
			&identity.id,
			&driver.id,
			pickup_address,
			note,
			timestamp,
		);
		self.store.update(updated.clone()).await;

		tracing::info!(order_id = %updated.id, driver_id = %driver.id, "Dispatched order");
		self.api.dispatch_order(&token, &request).await?;

		Ok(updated)
	}

	/// Moves a dispatched order into `Shipping`, or updates the shipping
	/// note while already in transit.
	pub async fn mark_shipping(&self, order_id: &str, note: &str) -> Result<Order, ClientError> {
		self.advance_status(order_id, note, Action::MarkShipping, OrderStatus::Shipping)
			.await
	}

	/// Marks an in-transit order as delivered.
	pub async fn mark_delivered(&self, order_id: &str, note: &str) -> Result<Order, ClientError> {
		self.advance_status(order_id, note, Action::MarkDelivered, OrderStatus::Delivered)
			.await
	}

	async fn advance_status(
		&self,
		order_id: &str,
		note: &str,
		action: Action,
		new_status: OrderStatus,
	) -> Result<Order, ClientError> {
		let (token, identity) = self.session.authenticated().await?;
		let order = self.order(order_id).await?;
		require_action(&order, &identity, action)?;

		let timestamp = Utc::now();
		let request = ShippingOrderRequest {
			id: order.id.clone(),
			dispatcher_id: identity.id.clone(),
			dispatched_to_id: None,
			pickup_address: None,
			note: note.to_string(),
			date_created: timestamp,
			status: new_status,
		};

		let updated =
			dispatch_order::apply_status_change(order, &identity.id, note, timestamp, new_status);
		self.store.update(updated.clone()).await;

		tracing::info!(order_id = %updated.id, status = %new_status, "Updated order status");
		self.api.shipping_order(&token, &request).await?;

		Ok(updated)
	}
}

/// Checks that the engine offers `action` to this actor on this order.
fn require_action(order: &Order, identity: &Identity, action: Action) -> Result<(), ClientError> {
	if available_actions(order, identity.role).contains(&action) {
		Ok(())
	} else {
		Err(ClientError::ActionNotAvailable {
			action,
			state: derive_state(order),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use base64::engine::general_purpose::URL_SAFE_NO_PAD;
	use base64::Engine;
	use chrono::TimeZone;
	use dispatch_storage::implementations::memory::MemoryStorage;
	use dispatch_types::{CustomerDetails, Driver, Role, ShippingEvent, ROLE_CLAIM};
	use serde_json::json;
	use std::sync::{Arc, Mutex};

	fn token_for(role: &str, id: &str) -> String {
		let header = URL_SAFE_NO_PAD.encode(b"{\"alg\":\"HS256\",\"typ\":\"JWT\"}");
		let payload = URL_SAFE_NO_PAD.encode(
			json!({ "Id": id, "FirstName": "Linh", ROLE_CLAIM: role })
				.to_string()
				.as_bytes(),
		);
		format!("{}.{}.sig", header, payload)
	}

	fn pending_order(id: &str) -> Order {
		Order {
			id: id.to_string(),
			order_id: format!("SO-{}", id),
			amount_total: 28_990_000,
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
			shipping_details: vec![ShippingEvent {
				dispatcher_id: None,
				dispatched_to_id: None,
				pickup_address: Some("48 Warehouse Rd".to_string()),
				note: "Order placed".to_string(),
				date_created: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
			}],
			status: OrderStatus::Created,
			payment_status: 1,
		}
	}

	/// Backend stub recording submissions instead of sending them.
	struct StubApi {
		token: String,
		orders: Vec<Order>,
		driver: Option<Driver>,
		fail_submissions: bool,
		dispatched: Arc<Mutex<Vec<DispatchOrderRequest>>>,
		shipped: Arc<Mutex<Vec<ShippingOrderRequest>>>,
	}

	impl StubApi {
		fn new(token: String, orders: Vec<Order>) -> Self {
			Self {
				token,
				orders,
				driver: Some(Driver {
					id: "drv_9".to_string(),
					name: "Quan Pham".to_string(),
				}),
				fail_submissions: false,
				dispatched: Arc::new(Mutex::new(Vec::new())),
				shipped: Arc::new(Mutex::new(Vec::new())),
			}
		}
	}

	#[async_trait]
	impl OrderApi for StubApi {
		async fn login(&self, _request: &LoginRequest) -> Result<String, ApiError> {
			Ok(self.token.clone())
		}

		async fn fetch_orders(&self, _token: &str, _user_id: &str) -> Result<Vec<Order>, ApiError> {
			Ok(self.orders.clone())
		}

		async fn fetch_driver(&self, _token: &str) -> Result<Option<Driver>, ApiError> {
			Ok(self.driver.clone())
		}

		async fn dispatch_order(
			&self,
			_token: &str,
			request: &DispatchOrderRequest,
		) -> Result<(), ApiError> {
			self.dispatched.lock().unwrap().push(request.clone());
			if self.fail_submissions {
				return Err(ApiError::Status(500));
			}
			Ok(())
		}

		async fn shipping_order(
			&self,
			_token: &str,
			request: &ShippingOrderRequest,
		) -> Result<(), ApiError> {
			self.shipped.lock().unwrap().push(request.clone());
			if self.fail_submissions {
				return Err(ApiError::Status(500));
			}
			Ok(())
		}
	}

	fn client_with(api: StubApi) -> DispatchClient {
		DispatchClient::new(
			Box::new(api),
			StorageService::new(Box::new(MemoryStorage::new())),
		)
	}

	#[tokio::test]
	async fn test_login_caches_token_and_maps_role() {
		let client = client_with(StubApi::new(
			token_for("Dispatcher", "usr_d1"),
			Vec::new(),
		));

		let identity = client.login("linh.tran@example.com", "hunter2").await.unwrap();
		assert_eq!(identity.role, Role::Dispatcher);
		assert_eq!(identity.id, "usr_d1");

		// The session now answers without another login.
		let identity = client.identity().await.unwrap();
		assert_eq!(identity.id, "usr_d1");

		client.logout().await.unwrap();
		assert!(matches!(
			client.identity().await,
			Err(ClientError::NotAuthenticated)
		));
	}

	#[tokio::test]
	async fn test_refresh_populates_view_state() {
		let client = client_with(StubApi::new(
			token_for("Dispatcher", "usr_d1"),
			vec![pending_order("ord_1"), pending_order("ord_2")],
		));
		client.login("linh.tran@example.com", "hunter2").await.unwrap();

		let orders = client.refresh_orders().await.unwrap();
		assert_eq!(orders.len(), 2);
		assert_eq!(client.orders().await.len(), 2);
		assert!(client.order("ord_1").await.is_ok());
		assert!(matches!(
			client.order("ord_x").await,
			Err(ClientError::UnknownOrder(_))
		));
	}

	#[tokio::test]
	async fn test_dispatch_happy_path() {
		let api = StubApi::new(token_for("Dispatcher", "usr_d1"), vec![pending_order("ord_1")]);
		let client = client_with(api);
		client.login("linh.tran@example.com", "hunter2").await.unwrap();
		client.refresh_orders().await.unwrap();

		let updated = client.dispatch("ord_1", "Fragile").await.unwrap();
		assert_eq!(derive_state(&updated), DerivedState::Dispatched);
		assert_eq!(updated.status, OrderStatus::Created);

		// Optimistic merge is visible in the view state.
		let stored = client.order("ord_1").await.unwrap();
		assert_eq!(derive_state(&stored), DerivedState::Dispatched);

		// The submitted delta carries the driver and the carried-over
		// pickup address.
		let event = stored.shipping_details.last().unwrap();
		assert_eq!(event.dispatched_to_id.as_deref(), Some("drv_9"));
		assert_eq!(event.pickup_address.as_deref(), Some("48 Warehouse Rd"));
		assert_eq!(event.note, "Fragile");
	}

	#[tokio::test]
	async fn test_dispatch_records_submission() {
		let api = StubApi::new(token_for("Dispatcher", "usr_d1"), vec![pending_order("ord_1")]);
		let dispatched = Arc::clone(&api.dispatched);
		let client = client_with(api);
		client.login("linh.tran@example.com", "hunter2").await.unwrap();
		client.refresh_orders().await.unwrap();
		client.dispatch("ord_1", "Fragile").await.unwrap();

		let submitted = dispatched.lock().unwrap();
		assert_eq!(submitted.len(), 1);
		assert_eq!(submitted[0].id, "ord_1");
		assert_eq!(submitted[0].dispatcher_id, "usr_d1");
		assert_eq!(submitted[0].dispatched_to_id, "drv_9");
	}

	#[tokio::test]
	async fn test_shipper_cannot_dispatch() {
		let client = client_with(StubApi::new(
			token_for("Shipper", "usr_s2"),
			vec![pending_order("ord_1")],
		));
		client.login("quan.pham@example.com", "hunter2").await.unwrap();
		client.refresh_orders().await.unwrap();

		let result = client.dispatch("ord_1", "").await;
		assert!(matches!(
			result,
			Err(ClientError::ActionNotAvailable {
				action: Action::Dispatch,
				state: DerivedState::Pending,
			})
		));
	}

	#[tokio::test]
	async fn test_dispatch_blocked_without_driver() {
		let mut api = StubApi::new(token_for("Dispatcher", "usr_d1"), vec![pending_order("ord_1")]);
		api.driver = None;
		let client = client_with(api);
		client.login("linh.tran@example.com", "hunter2").await.unwrap();
		client.refresh_orders().await.unwrap();

		let result = client.dispatch("ord_1", "").await;
		assert!(matches!(result, Err(ClientError::NoDriverAvailable)));

		// Nothing was applied locally.
		let stored = client.order("ord_1").await.unwrap();
		assert_eq!(derive_state(&stored), DerivedState::Pending);
	}

	#[tokio::test]
	async fn test_shipper_full_flow() {
		let mut order = pending_order("ord_1");
		order.shipping_details.push(ShippingEvent {
			dispatcher_id: Some("usr_d1".to_string()),
			dispatched_to_id: Some("drv_9".to_string()),
			pickup_address: Some("48 Warehouse Rd".to_string()),
			note: "Fragile".to_string(),
			date_created: Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap(),
		});

		let client = client_with(StubApi::new(token_for("Shipper", "usr_s2"), vec![order]));
		client.login("quan.pham@example.com", "hunter2").await.unwrap();
		client.refresh_orders().await.unwrap();

		// Delivery is not offered before shipping starts.
		assert!(matches!(
			client.mark_delivered("ord_1", "").await,
			Err(ClientError::ActionNotAvailable { .. })
		));

		let updated = client.mark_shipping("ord_1", "Picked up").await.unwrap();
		assert_eq!(derive_state(&updated), DerivedState::Shipping);

		// The self-loop note update stays available in Shipping.
		let updated = client.mark_shipping("ord_1", "Traffic on QL1A").await.unwrap();
		assert_eq!(derive_state(&updated), DerivedState::Shipping);

		let updated = client.mark_delivered("ord_1", "Signed for").await.unwrap();
		assert_eq!(derive_state(&updated), DerivedState::Delivered);
		assert_eq!(updated.status, OrderStatus::Delivered);

		// Terminal: nothing further is offered.
		assert!(matches!(
			client.mark_shipping("ord_1", "").await,
			Err(ClientError::ActionNotAvailable { .. })
		));
	}

	#[tokio::test]
	async fn test_optimistic_merge_survives_submit_failure() {
		let mut api = StubApi::new(token_for("Dispatcher", "usr_d1"), vec![pending_order("ord_1")]);
		api.fail_submissions = true;
		let client = client_with(api);
		client.login("linh.tran@example.com", "hunter2").await.unwrap();
		client.refresh_orders().await.unwrap();

		let result = client.dispatch("ord_1", "").await;
		assert!(matches!(result, Err(ClientError::Api(ApiError::Status(500)))));

		// The optimistic value stands until the next refresh.
		let stored = client.order("ord_1").await.unwrap();
		assert_eq!(derive_state(&stored), DerivedState::Dispatched);
	}

	#[tokio::test]
	async fn test_actions_require_authentication() {
		let client = client_with(StubApi::new(
			token_for("Dispatcher", "usr_d1"),
			vec![pending_order("ord_1")],
		));

		assert!(matches!(
			client.refresh_orders().await,
			Err(ClientError::NotAuthenticated)
		));
		assert!(matches!(
			client.dispatch("ord_1", "").await,
			Err(ClientError::NotAuthenticated)
		));
	}
}
