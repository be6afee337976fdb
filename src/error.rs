//! Engine-level error types shared across flows, the signing transport, and caches.
//!
//! Every [`Error`] carries an HTTP-style status (see [`Error::status`]) next to its message so
//! callers can forward failures to their own HTTP layer without a second classification pass.

// self
use crate::_prelude::*;

/// Engine-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical engine error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Correlation-store failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Caller misuse or local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Provider body could not be decoded.
	#[error(transparent)]
	Response(#[from] ResponseError),

	/// The end user cancelled the authorization or the callback is incomplete.
	#[error("access_cancel")]
	Cancelled,
	/// The correlation record is missing, already consumed, or the user denied access.
	#[error("access_denied")]
	Denied,
	/// The token carries an expiry instant that already passed.
	#[error("token_expired")]
	TokenExpired,
	/// Provider reported an error field inside the response body.
	#[error("{message}")]
	Provider {
		/// Provider-supplied (or synthesized) message.
		message: String,
		/// HTTP status, never below 400.
		status: u16,
	},
	/// Provider answered with a non-2xx status and no recognizable error field.
	#[error("Status code error: {received}")]
	Status {
		/// HTTP status, never below 400.
		status: u16,
		/// Status code actually returned by the provider.
		received: u16,
	},
	/// OAuth 1.0a temporary-credential response is unusable.
	#[error("{reason}")]
	Handshake {
		/// What was wrong with the response.
		reason: String,
	},
	/// Caller payload could not be stored in or restored from a correlation record.
	#[error("Correlation payload could not be processed.")]
	Payload {
		/// Structured (de)serialization failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// HTTP-style status code associated with the failure.
	pub fn status(&self) -> u16 {
		match self {
			Self::Cancelled | Self::Denied => 403,
			Self::TokenExpired => 401,
			Self::Provider { status, .. } | Self::Status { status, .. } => *status,
			Self::Transport(_) | Self::Response(_) => 502,
			Self::Cache(_) | Self::Config(_) | Self::Handshake { .. } | Self::Payload { .. } => 500,
		}
	}

	/// Returns `true` for cancellation/denial outcomes of the redirect round trip.
	pub fn is_access_failure(&self) -> bool {
		matches!(self, Self::Cancelled | Self::Denied)
	}

	pub(crate) fn provider(message: impl Into<String>, status: u16) -> Self {
		Self::Provider { message: message.into(), status: clamp_status(status) }
	}

	pub(crate) fn status_code(received: u16) -> Self {
		Self::Status { status: clamp_status(received), received }
	}

	pub(crate) fn handshake(reason: impl Into<String>) -> Self {
		Self::Handshake { reason: reason.into() }
	}
}

/// Caller-programming and configuration failures; never retried.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Token was issued for another client identifier.
	#[error("Token.ClientID does not match.")]
	ClientIdMismatch,
	/// Request already carries an Authorization header in the signing scheme.
	#[error("The request has been signed.")]
	AlreadySigned,
	/// Operation does not exist for the protocol version.
	#[error("OAuth {version} does not support {operation}.")]
	Unsupported {
		/// Protocol version label.
		version: &'static str,
		/// Operation label.
		operation: &'static str,
	},
	/// Token has no refresh credential.
	#[error("Cannot refresh the token.")]
	MissingRefreshToken,
	/// Endpoint declares no revocation URL.
	#[error("Token cannot be revoked.")]
	RevokeUnsupported,
	/// Endpoint lacks a URL required by the engine.
	#[error("Endpoint is missing the {endpoint} URL.")]
	MissingEndpoint {
		/// Endpoint label.
		endpoint: &'static str,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Request URI could not be rebuilt after rewriting its query.
	#[error("Request URI is invalid.")]
	InvalidUri(#[from] oauth2::http::uri::InvalidUri),
	/// Request URI could not be parsed as a URL.
	#[error("Request URL is invalid.")]
	InvalidUrl(#[from] url::ParseError),
	/// HMAC key could not be initialized.
	#[error("Signing key is invalid.")]
	SigningKey,
	/// Token builder validation failed.
	#[error("Unable to build token.")]
	TokenBuild(#[from] crate::auth::TokenBuilderError),
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
	/// Dispatcher reported a failure without a structured cause.
	#[error("HTTP client error occurred while calling the provider: {message}.")]
	Other {
		/// Dispatcher-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Provider body decoding failures.
#[derive(Debug, ThisError)]
pub enum ResponseError {
	/// JSON body could not be parsed into an object.
	#[error("Provider returned malformed JSON.")]
	Json {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// XML body could not be tokenized.
	#[error("Provider returned malformed XML.")]
	Xml {
		/// Tokenizer failure.
		#[source]
		source: quick_xml::Error,
	},
}

fn clamp_status(status: u16) -> u16 {
	status.max(400)
}
