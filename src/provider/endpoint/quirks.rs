// self
use crate::_prelude::*;

/// Authorization scheme prefix used by OAuth 1.0a when the endpoint declares none.
pub const DEFAULT_OAUTH1_SCHEME: &str = "OAuth ";

/// Provider-specific quirks that influence how requests are built and responses classified.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointQuirks {
	/// Extra response fields checked for errors after `error_description`, `error`, `errors`.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub error_fields: Vec<String>,
	/// Separator used to join requested scopes; empty means a single space.
	#[serde(skip_serializing_if = "String::is_empty")]
	pub scope_separator: String,
	/// Client authentication header.
	///
	/// OAuth 2.0 switches to HTTP Basic when this is `"Basic"`. OAuth 1.0a uses it as the
	/// Authorization scheme prefix.
	#[serde(skip_serializing_if = "String::is_empty")]
	pub client_header: String,
	/// OAuth 2.0 token header scheme (`Bearer`, `token`, ...); empty embeds `access_token`.
	#[serde(skip_serializing_if = "String::is_empty")]
	pub token_header: String,
	/// Parameter name carrying the client identifier; empty means `client_id`.
	#[serde(skip_serializing_if = "String::is_empty")]
	pub client_id_key: String,
	/// Parameter name carrying the client secret; empty means `client_secret`.
	#[serde(skip_serializing_if = "String::is_empty")]
	pub client_secret_key: String,
}
impl EndpointQuirks {
	/// Effective client identifier parameter name.
	pub fn client_id_param(&self) -> &str {
		if self.client_id_key.is_empty() { "client_id" } else { &self.client_id_key }
	}

	/// Effective client secret parameter name.
	pub fn client_secret_param(&self) -> &str {
		if self.client_secret_key.is_empty() { "client_secret" } else { &self.client_secret_key }
	}
}
