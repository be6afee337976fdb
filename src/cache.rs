//! Single-use correlation store contract and the bundled bounded in-memory cache.
//!
//! Authorize writes a [`CorrelationRecord`] in the `pending` state; Exchange flips it to
//! `consumed` exactly once through [`StateCache::compare_and_swap`]. Records are never
//! deleted by the engines; eviction inside the backing store reclaims them.

pub mod memory;

pub use memory::MemoryCache;

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Namespace prefix shared by every correlation key.
pub const CACHE_NAMESPACE: &str = "oauth";

/// Boxed future returned by [`StateCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Storage contract for correlation records.
///
/// Implementations must allow concurrent use from unrelated flows, and
/// [`compare_and_swap`](Self::compare_and_swap) must be linearizable per key so two racing
/// exchanges of the same correlation id cannot both observe the `pending` record.
pub trait StateCache
where
	Self: Send + Sync,
{
	/// Returns the stored value, if present.
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>>;

	/// Stores or replaces a value.
	fn set<'a>(&'a self, key: &'a str, value: String) -> CacheFuture<'a, ()>;

	/// Replaces the value only if it still equals `expected`.
	fn compare_and_swap<'a>(
		&'a self,
		key: &'a str,
		expected: &'a str,
		replacement: String,
	) -> CacheFuture<'a, CompareAndSwapOutcome>;
}

/// Result of a [`StateCache::compare_and_swap`] attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareAndSwapOutcome {
	/// The stored value matched and was replaced.
	Updated,
	/// A value exists but differs from the expected one.
	Mismatch,
	/// No value is stored under the key.
	Missing,
}

/// Error type produced by [`StateCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// A correlation record could not be encoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Lifecycle of a correlation record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStatus {
	/// Written by Authorize, not yet exchanged.
	Pending,
	/// Exchanged; any further exchange is a replay.
	Consumed,
}

/// Value stored under a correlation key between Authorize and Exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationRecord {
	/// Lifecycle state.
	pub status: CorrelationStatus,
	/// OAuth 1.0a temporary token secret.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub secret: Option<TokenSecret>,
	/// Caller payload serialized as JSON.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payload: Option<String>,
}
impl CorrelationRecord {
	/// Creates a pending record.
	pub fn pending(secret: Option<TokenSecret>, payload: Option<String>) -> Self {
		Self { status: CorrelationStatus::Pending, secret, payload }
	}

	/// Returns the record in its consumed state.
	pub fn consumed(&self) -> Self {
		Self { status: CorrelationStatus::Consumed, ..self.clone() }
	}

	/// Returns `true` while the record can still be exchanged.
	pub fn is_pending(&self) -> bool {
		matches!(self.status, CorrelationStatus::Pending)
	}

	/// Encodes the record for storage.
	pub fn encode(&self) -> Result<String, CacheError> {
		serde_json::to_string(self)
			.map_err(|e| CacheError::Serialization { message: e.to_string() })
	}

	/// Decodes a stored record.
	pub fn decode(value: &str) -> Result<Self, CacheError> {
		serde_json::from_str(value).map_err(|e| CacheError::Serialization { message: e.to_string() })
	}
}

/// Derives the opaque cache key for a correlation id.
///
/// The key hashes the namespace, provider name, client id, and correlation id so records of
/// different providers or clients can never collide.
pub fn correlation_key(provider: &str, client_id: &str, correlation_id: &str) -> String {
	let mut hasher = Sha256::new();

	for part in [CACHE_NAMESPACE, provider, client_id, correlation_id] {
		hasher.update((part.len() as u64).to_be_bytes());
		hasher.update(part.as_bytes());
	}

	format!("{CACHE_NAMESPACE}.{}", URL_SAFE_NO_PAD.encode(hasher.finalize()))
}

/// Writes a pending record under `key`.
pub(crate) async fn store_pending(
	cache: &dyn StateCache,
	key: &str,
	record: &CorrelationRecord,
) -> Result<()> {
	cache.set(key, record.encode()?).await?;

	Ok(())
}

/// Performs the single-use `pending → consumed` transition for `key`.
///
/// Missing, consumed, undecodable, or concurrently consumed records fail with
/// [`Error::Denied`]; backend failures propagate as [`Error::Cache`].
pub(crate) async fn consume(cache: &dyn StateCache, key: &str) -> Result<CorrelationRecord> {
	let Some(current) = cache.get(key).await? else {
		return Err(Error::Denied);
	};
	let record = CorrelationRecord::decode(&current).map_err(|_| Error::Denied)?;

	if !record.is_pending() {
		return Err(Error::Denied);
	}

	match cache.compare_and_swap(key, &current, record.consumed().encode()?).await? {
		CompareAndSwapOutcome::Updated => Ok(record),
		CompareAndSwapOutcome::Mismatch | CompareAndSwapOutcome::Missing => Err(Error::Denied),
	}
}

/// Restores the caller payload stored with a record.
pub(crate) fn restore_payload<D>(record: &CorrelationRecord) -> Result<Option<D>>
where
	D: DeserializeOwned,
{
	let Some(payload) = record.payload.as_deref().filter(|p| !p.is_empty()) else {
		return Ok(None);
	};
	let de = &mut serde_json::Deserializer::from_str(payload);

	serde_path_to_error::deserialize(de).map(Some).map_err(|source| Error::Payload { source })
}

/// Serializes a caller payload for storage.
pub(crate) fn serialize_payload<P>(payload: Option<&P>) -> Result<Option<String>>
where
	P: ?Sized + Serialize,
{
	let Some(payload) = payload else {
		return Ok(None);
	};
	let mut out = Vec::new();
	let ser = &mut serde_json::Serializer::new(&mut out);

	serde_path_to_error::serialize(payload, ser).map_err(|source| Error::Payload { source })?;

	Ok(Some(String::from_utf8_lossy(&out).into_owned()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn correlation_keys_are_opaque_and_partitioned() {
		let key = correlation_key("github", "client", "state-1");

		assert!(key.starts_with("oauth."));
		assert!(!key.contains("state-1"));
		assert_eq!(key, correlation_key("github", "client", "state-1"));
		assert_ne!(key, correlation_key("gitlab", "client", "state-1"));
		assert_ne!(key, correlation_key("github", "other", "state-1"));
		assert_ne!(correlation_key("ab", "c", "x"), correlation_key("a", "bc", "x"));
	}

	#[test]
	fn records_round_trip_and_consume() {
		let record = CorrelationRecord::pending(Some("tmp-secret".into()), Some("{\"n\":1}".into()));
		let encoded = record.encode().expect("Record should encode.");
		let decoded = CorrelationRecord::decode(&encoded).expect("Record should decode.");

		assert_eq!(decoded, record);
		assert!(decoded.is_pending());
		assert!(!decoded.consumed().is_pending());
		assert!(CorrelationRecord::decode("0,secret,").is_err());
	}

	#[test]
	fn payloads_round_trip_through_records() {
		#[derive(Debug, PartialEq, Serialize, Deserialize)]
		struct Payload {
			next: String,
		}

		let stored = serialize_payload(Some(&Payload { next: "/home".into() }))
			.expect("Payload should serialize.");
		let record = CorrelationRecord::pending(None, stored);
		let restored: Option<Payload> = restore_payload(&record).expect("Payload should restore.");

		assert_eq!(restored, Some(Payload { next: "/home".into() }));
		assert_eq!(serialize_payload::<Payload>(None).expect("None should serialize."), None);

		let broken = CorrelationRecord::pending(None, Some("{\"next\":1}".into()));
		let err = restore_payload::<Payload>(&broken).expect_err("Type mismatch should fail.");

		assert!(matches!(err, Error::Payload { .. }));
	}
}
