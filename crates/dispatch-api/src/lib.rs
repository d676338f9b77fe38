//! HTTP API module for the dispatch client.
//!
//! This module defines the narrow contract between the client and the
//! remote order-dispatch backend: authentication, order listing, the single
//! assignable driver, and submission of order deltas. The one concrete
//! implementation speaks HTTP; the trait seam exists so the orchestration
//! layer can be exercised against a stub.

use async_trait::async_trait;
use dispatch_types::{DispatchOrderRequest, Driver, LoginRequest, Order, ShippingOrderRequest};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod http;
}

/// Errors that can occur during backend API operations.
#[derive(Debug, Error)]
pub enum ApiError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// Error that occurs when the backend answers with an unexpected status.
	#[error("Unexpected response status: {0}")]
	Status(u16),
	/// Error that occurs when a response body cannot be parsed.
	#[error("Malformed response: {0}")]
	Parse(String),
	/// Login rejected: credentials do not match.
	#[error("Wrong email or password")]
	InvalidCredentials,
	/// Login rejected: no account for the given email or phone.
	#[error("Can't find user")]
	UserNotFound,
	/// Login rejected: the account exists but has not been verified.
	#[error("User is not verified")]
	UserNotVerified,
	/// Error that occurs when the API client cannot be constructed.
	#[error("Invalid API configuration: {0}")]
	Configuration(String),
}

/// Trait defining the interface to the order-dispatch backend.
///
/// One outstanding call per user-initiated action; no retries, no
/// pagination. Implementations carry the bearer token per call rather than
/// holding session state.
#[async_trait]
pub trait OrderApi: Send + Sync {
	/// Authenticates and returns the bearer token issued by the backend.
	async fn login(&self, request: &LoginRequest) -> Result<String, ApiError>;

	/// Fetches the orders visible to the given actor.
	async fn fetch_orders(&self, token: &str, user_id: &str) -> Result<Vec<Order>, ApiError>;

	/// Fetches the single driver currently offered for dispatch.
	///
	/// Returns `None` when no candidate is available; dispatch confirmation
	/// is blocked until one resolves.
	async fn fetch_driver(&self, token: &str) -> Result<Option<Driver>, ApiError>;

	/// Submits a dispatch delta for an order.
	async fn dispatch_order(
		&self,
		token: &str,
		request: &DispatchOrderRequest,
	) -> Result<(), ApiError>;

	/// Submits a status-change delta for an order.
	async fn shipping_order(
		&self,
		token: &str,
		request: &ShippingOrderRequest,
	) -> Result<(), ApiError>;
}

/// Creates the HTTP API client from configuration.
pub fn create_api(
	config: &dispatch_config::ApiConfig,
) -> Result<Box<dyn OrderApi>, ApiError> {
	Ok(Box::new(implementations::http::HttpOrderApi::new(config)?))
}
