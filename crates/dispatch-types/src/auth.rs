//! Credential claims and role mapping.
//!
//! The backend issues an opaque bearer token (a JWT) whose payload carries
//! the identity claims this client reads. The token is never verified
//! locally; signature checking is the backend's concern, the client only
//! extracts claims to key the order list and gate elevated actions.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

/// Claim key carrying the actor's role.
pub const ROLE_CLAIM: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";

/// Errors that can occur while reading credential claims.
#[derive(Debug, Error)]
pub enum AuthError {
	/// Error that occurs when the token is not a readable JWT.
	#[error("Malformed token: {0}")]
	MalformedToken(String),
	/// Error that occurs when a claim required for operation is absent.
	#[error("Missing identity claim: {0}")]
	MissingClaim(&'static str),
}

/// Actor role as understood by this client.
///
/// The backend's role claim is an open string; the client treats it as a
/// closed enumeration with `Shipper` as the explicit default for every
/// value other than `"Dispatcher"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
	/// May assign a driver to a pending order.
	Dispatcher,
	/// May advance the shipping status of a dispatched order.
	Shipper,
}

impl Role {
	/// Maps a raw role claim to a role. Absent or unrecognized claims yield
	/// `Shipper`, so a missing claim never grants the elevated role.
	pub fn from_claim(value: Option<&str>) -> Self {
		match value {
			Some("Dispatcher") => Role::Dispatcher,
			_ => Role::Shipper,
		}
	}
}

impl std::fmt::Display for Role {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Role::Dispatcher => write!(f, "Dispatcher"),
			Role::Shipper => write!(f, "Shipper"),
		}
	}
}

/// Raw claims decoded from the token payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
	#[serde(rename = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role")]
	pub role: Option<String>,
	#[serde(rename = "Id")]
	pub id: Option<String>,
	#[serde(rename = "FirstName")]
	pub first_name: Option<String>,
	/// Expiry as Unix seconds, when the issuer includes one.
	#[serde(default)]
	pub exp: Option<i64>,
}

/// The authenticated actor as derived from claims.
#[derive(Debug, Clone)]
pub struct Identity {
	/// Actor identifier; the order list is keyed by it.
	pub id: String,
	pub role: Role,
	pub first_name: Option<String>,
}

impl Identity {
	/// Builds an identity from decoded claims.
	///
	/// A missing role degrades to `Shipper`; a missing id is an error since
	/// nothing can be fetched without it.
	pub fn from_claims(claims: &Claims) -> Result<Self, AuthError> {
		let id = claims
			.id
			.clone()
			.ok_or(AuthError::MissingClaim("Id"))?;

		Ok(Self {
			id,
			role: Role::from_claim(claims.role.as_deref()),
			first_name: claims.first_name.clone(),
		})
	}
}

/// Decodes the claims from a bearer token without verifying it.
///
/// Splits out the payload segment, base64url-decodes it, and parses the
/// claim set. Works on any JWT-shaped token regardless of signing scheme.
pub fn decode_claims(token: &str) -> Result<Claims, AuthError> {
	let payload = token
		.split('.')
		.nth(1)
		.ok_or_else(|| AuthError::MalformedToken("missing payload segment".to_string()))?;

	let bytes = URL_SAFE_NO_PAD
		.decode(payload)
		.map_err(|e| AuthError::MalformedToken(e.to_string()))?;

	serde_json::from_slice(&bytes).map_err(|e| AuthError::MalformedToken(e.to_string()))
}
