//! HTTP implementation of the backend API.
//!
//! Endpoint paths, request body shapes, and the login status-code contract
//! are owned by the backend; this module reproduces them exactly. The login
//! endpoint returns the bearer token as the raw response body rather than a
//! JSON envelope.

use crate::{ApiError, OrderApi};
use async_trait::async_trait;
use dispatch_config::ApiConfig;
use dispatch_types::{DispatchOrderRequest, Driver, LoginRequest, Order, ShippingOrderRequest};
use std::time::Duration;

const LOGIN_PATH: &str = "/api/Users/loginAndroid";
const ORDERS_PATH: &str = "/api/Order/getAndroidOrders";
const DRIVER_PATH: &str = "/api/Users/getDriver";
const DISPATCH_PATH: &str = "/api/Order/DispatchOrder";
const SHIPPING_PATH: &str = "/api/Order/ShippingOrder";

/// HTTP client for the order-dispatch backend.
pub struct HttpOrderApi {
	http: reqwest::Client,
	base_url: String,
}

impl HttpOrderApi {
	/// Creates a new client from API configuration.
	pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
		let http = reqwest::Client::builder()
			.timeout(Duration::from_secs(config.timeout_seconds))
			.danger_accept_invalid_certs(config.accept_invalid_certs)
			.build()
			.map_err(|e| ApiError::Configuration(e.to_string()))?;

		Ok(Self {
			http,
			base_url: config.base_url.trim_end_matches('/').to_string(),
		})
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}
}

/// Maps a login failure status to its user-facing error.
///
/// The backend encodes the rejection reason purely in the status code:
/// 204 means the account does not exist, 401 means it is not verified yet,
/// 400 means the credentials are wrong.
fn login_failure(status: u16) -> ApiError {
	match status {
		204 => ApiError::UserNotFound,
		401 => ApiError::UserNotVerified,
		400 => ApiError::InvalidCredentials,
		other => ApiError::Status(other),
	}
}

/// Normalizes the raw login response body into a bearer token.
///
/// Strips surrounding whitespace and, when the backend quotes the token as
/// a JSON string, the quotes.
fn normalize_token(raw: &str) -> String {
	raw.trim().trim_matches('"').to_string()
}

#[async_trait]
impl OrderApi for HttpOrderApi {
	async fn login(&self, request: &LoginRequest) -> Result<String, ApiError> {
		let response = self
			.http
			.post(self.url(LOGIN_PATH))
			.json(request)
			.send()
			.await
			.map_err(|e| ApiError::Network(e.to_string()))?;

		let status = response.status().as_u16();
		if status != 200 {
			return Err(login_failure(status));
		}

		let body = response
			.text()
			.await
			.map_err(|e| ApiError::Network(e.to_string()))?;

		let token = normalize_token(&body);
		if token.is_empty() {
			return Err(ApiError::Parse("empty token in login response".to_string()));
		}

		Ok(token)
	}

	async fn fetch_orders(&self, token: &str, user_id: &str) -> Result<Vec<Order>, ApiError> {
		tracing::debug!(user_id, "Fetching orders");

		let response = self
			.http
			.get(self.url(ORDERS_PATH))
			.query(&[("userId", user_id)])
			.bearer_auth(token)
			.send()
			.await
			.map_err(|e| ApiError::Network(e.to_string()))?;

		if !response.status().is_success() {
			return Err(ApiError::Status(response.status().as_u16()));
		}

		response
			.json::<Vec<Order>>()
			.await
			.map_err(|e| ApiError::Parse(e.to_string()))
	}

	async fn fetch_driver(&self, token: &str) -> Result<Option<Driver>, ApiError> {
		let response = self
			.http
			.get(self.url(DRIVER_PATH))
			.bearer_auth(token)
			.send()
			.await
			.map_err(|e| ApiError::Network(e.to_string()))?;

		// No candidate on offer is an expected outcome, not a failure.
		if !response.status().is_success() {
			tracing::warn!(status = response.status().as_u16(), "No driver available");
			return Ok(None);
		}

		let body = response
			.text()
			.await
			.map_err(|e| ApiError::Network(e.to_string()))?;

		if body.trim().is_empty() {
			return Ok(None);
		}

		serde_json::from_str(&body)
			.map(Some)
			.map_err(|e| ApiError::Parse(e.to_string()))
	}

	async fn dispatch_order(
		&self,
		token: &str,
		request: &DispatchOrderRequest,
	) -> Result<(), ApiError> {
		tracing::debug!(order_id = %request.id, driver_id = %request.dispatched_to_id, "Submitting dispatch");

		let response = self
			.http
			.post(self.url(DISPATCH_PATH))
			.bearer_auth(token)
			.json(request)
			.send()
			.await
			.map_err(|e| ApiError::Network(e.to_string()))?;

		if !response.status().is_success() {
			return Err(ApiError::Status(response.status().as_u16()));
		}

		Ok(())
	}

	async fn shipping_order(
		&self,
		token: &str,
		request: &ShippingOrderRequest,
	) -> Result<(), ApiError> {
		tracing::debug!(order_id = %request.id, status = %request.status, "Submitting status change");

		let response = self
			.http
			.post(self.url(SHIPPING_PATH))
			.bearer_auth(token)
			.json(request)
			.send()
			.await
			.map_err(|e| ApiError::Network(e.to_string()))?;

		if !response.status().is_success() {
			return Err(ApiError::Status(response.status().as_u16()));
		}

		Ok(())
	}
}
