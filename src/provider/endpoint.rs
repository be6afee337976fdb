//! Endpoint descriptor data structures shared by both engines.

/// Builder API for assembling endpoints.
pub mod builder;
/// Provider-specific header and parameter quirks.
pub mod quirks;

pub use builder::*;
pub use quirks::*;

// self
use crate::{_prelude::*, auth::ProviderId};

/// Client authentication modes for unauthenticated OAuth 2.0 token calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// HTTP Basic with form-escaped `client_id`/`client_secret`.
	Basic,
	/// Client credentials embedded as request parameters.
	RequestBody,
}

/// URL set declared by a provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointUrls {
	/// OAuth 1.0a temporary-credential URL.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub request_token: Option<Url>,
	/// Authorization URL the end user is redirected to.
	pub authorize: Url,
	/// Token (OAuth 2.0) or access-credential (OAuth 1.0a) URL.
	pub access_token: Url,
	/// Refresh URL; falls back to `access_token` when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<Url>,
	/// Revocation URL.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub revoke_token: Option<Url>,
	/// Base URL for API calls made by adapters.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub api: Option<Url>,
}

/// Immutable endpoint descriptor consumed by the engines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
	/// Provider identifier, also used to namespace correlation keys.
	pub name: ProviderId,
	/// URL definitions.
	pub urls: EndpointUrls,
	/// Provider-specific quirks.
	#[serde(default)]
	pub quirks: EndpointQuirks,
}
impl Endpoint {
	/// Creates a new builder for the provided identifier.
	pub fn builder(name: ProviderId) -> EndpointBuilder {
		EndpointBuilder::new(name)
	}

	/// Client authentication used by OAuth 2.0 calls made without a token.
	pub fn client_auth_method(&self) -> ClientAuthMethod {
		if self.quirks.client_header == "Basic" {
			ClientAuthMethod::Basic
		} else {
			ClientAuthMethod::RequestBody
		}
	}

	/// URL used for refresh grants.
	pub fn refresh_url(&self) -> &Url {
		self.urls.refresh_token.as_ref().unwrap_or(&self.urls.access_token)
	}

	/// Authorization scheme prefix for OAuth 1.0a headers, including the trailing space.
	pub fn oauth1_scheme(&self) -> String {
		if self.quirks.client_header.is_empty() {
			DEFAULT_OAUTH1_SCHEME.to_owned()
		} else {
			format!("{} ", self.quirks.client_header)
		}
	}
}
