//! Session service: the cached bearer credential and the identity behind it.
//!
//! The token is the only durable state this client keeps. It is cached
//! under the `session` namespace with a TTL taken from the token's own
//! `exp` claim, so an expired credential reads as absent instead of being
//! replayed; there is no refresh.

use crate::ClientError;
use dispatch_storage::{StorageError, StorageService};
use dispatch_types::{decode_claims, Identity};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const SESSION_NAMESPACE: &str = "session";
const TOKEN_KEY: &str = "auth_token";

/// Manages the cached bearer token.
pub struct SessionService {
	storage: StorageService,
}

impl SessionService {
	/// Creates a new SessionService over the given storage.
	pub fn new(storage: StorageService) -> Self {
		Self { storage }
	}

	/// Caches a bearer token.
	///
	/// When the token carries an `exp` claim in the future, the cache entry
	/// expires with it; otherwise the entry is permanent and ages out only
	/// on logout.
	pub async fn save_token(&self, token: &str) -> Result<(), StorageError> {
		let ttl = decode_claims(token)
			.ok()
			.and_then(|claims| claims.exp)
			.and_then(|exp| {
				let now = SystemTime::now()
					.duration_since(UNIX_EPOCH)
					.unwrap_or_default()
					.as_secs() as i64;
				(exp > now).then(|| Duration::from_secs((exp - now) as u64))
			});

		self.storage
			.store_with_ttl(SESSION_NAMESPACE, TOKEN_KEY, &token.to_string(), ttl)
			.await
	}

	/// Returns the cached token, if one is present and unexpired.
	pub async fn token(&self) -> Result<Option<String>, StorageError> {
		match self
			.storage
			.retrieve::<String>(SESSION_NAMESPACE, TOKEN_KEY)
			.await
		{
			Ok(token) => Ok(Some(token)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	/// Deletes the cached token.
	pub async fn clear(&self) -> Result<(), StorageError> {
		self.storage.remove(SESSION_NAMESPACE, TOKEN_KEY).await
	}

	/// Returns the cached token together with the identity it asserts.
	///
	/// Fails with [`ClientError::NotAuthenticated`] when no token is
	/// cached; claim problems surface as their own errors.
	pub async fn authenticated(&self) -> Result<(String, Identity), ClientError> {
		let token = self.token().await?.ok_or(ClientError::NotAuthenticated)?;
		let claims = decode_claims(&token)?;
		let identity = Identity::from_claims(&claims)?;
		Ok((token, identity))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use base64::engine::general_purpose::URL_SAFE_NO_PAD;
	use base64::Engine;
	use dispatch_storage::implementations::memory::MemoryStorage;
	use dispatch_types::{Role, ROLE_CLAIM};
	use serde_json::json;

	fn service() -> SessionService {
		SessionService::new(StorageService::new(Box::new(MemoryStorage::new())))
	}

	fn token_with_claims(claims: serde_json::Value) -> String {
		let header = URL_SAFE_NO_PAD.encode(b"{\"alg\":\"HS256\",\"typ\":\"JWT\"}");
		let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
		format!("{}.{}.sig", header, payload)
	}

	#[tokio::test]
	async fn test_token_round_trip() {
		let session = service();
		assert!(session.token().await.unwrap().is_none());

		let token = token_with_claims(json!({ "Id": "usr_d1", ROLE_CLAIM: "Dispatcher" }));
		session.save_token(&token).await.unwrap();
		assert_eq!(session.token().await.unwrap().as_deref(), Some(token.as_str()));

		session.clear().await.unwrap();
		assert!(session.token().await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_authenticated_yields_identity() {
		let session = service();
		let token = token_with_claims(json!({
			"Id": "usr_d1",
			"FirstName": "Linh",
			ROLE_CLAIM: "Dispatcher",
		}));
		session.save_token(&token).await.unwrap();

		let (cached, identity) = session.authenticated().await.unwrap();
		assert_eq!(cached, token);
		assert_eq!(identity.id, "usr_d1");
		assert_eq!(identity.role, Role::Dispatcher);
	}

	#[tokio::test]
	async fn test_authenticated_without_token() {
		let session = service();
		assert!(matches!(
			session.authenticated().await,
			Err(ClientError::NotAuthenticated)
		));
	}

	#[tokio::test]
	async fn test_token_without_id_claim_is_an_auth_error() {
		let session = service();
		session
			.save_token(&token_with_claims(json!({ ROLE_CLAIM: "Shipper" })))
			.await
			.unwrap();

		assert!(matches!(
			session.authenticated().await,
			Err(ClientError::Auth(_))
		));
	}
}
