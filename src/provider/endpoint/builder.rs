// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	provider::{Endpoint, EndpointQuirks, EndpointUrls},
};

/// Errors raised while constructing or validating endpoints.
#[derive(Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum EndpointError {
	/// Authorization URL is required by both protocol versions.
	#[error("Missing authorize URL.")]
	MissingAuthorizeUrl,
	/// Token URL is required by both protocol versions.
	#[error("Missing access token URL.")]
	MissingAccessTokenUrl,
	/// Reject scope separators containing control characters.
	#[error("Scope separator must be printable.")]
	InvalidScopeSeparator {
		/// Invalid separator that was supplied.
		separator: String,
	},
	/// Reject header names and parameter keys that cannot travel on the wire.
	#[error("The {quirk} quirk contains control characters.")]
	InvalidQuirk {
		/// Which quirk failed validation.
		quirk: &'static str,
	},
}

/// Builder for [`Endpoint`] values.
#[derive(Debug)]
pub struct EndpointBuilder {
	/// Identifier for the endpoint being constructed.
	pub name: ProviderId,
	/// OAuth 1.0a temporary-credential URL.
	pub request_token: Option<Url>,
	/// Authorization URL.
	pub authorize: Option<Url>,
	/// Token URL.
	pub access_token: Option<Url>,
	/// Refresh URL.
	pub refresh_token: Option<Url>,
	/// Revocation URL.
	pub revoke_token: Option<Url>,
	/// API base URL.
	pub api: Option<Url>,
	/// Provider-specific quirks.
	pub quirks: EndpointQuirks,
}
impl EndpointBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(name: ProviderId) -> Self {
		Self {
			name,
			request_token: None,
			authorize: None,
			access_token: None,
			refresh_token: None,
			revoke_token: None,
			api: None,
			quirks: EndpointQuirks::default(),
		}
	}

	/// Sets the OAuth 1.0a temporary-credential URL.
	pub fn request_token_url(mut self, url: Url) -> Self {
		self.request_token = Some(url);

		self
	}

	/// Sets the authorization URL.
	pub fn authorize_url(mut self, url: Url) -> Self {
		self.authorize = Some(url);

		self
	}

	/// Sets the token URL.
	pub fn access_token_url(mut self, url: Url) -> Self {
		self.access_token = Some(url);

		self
	}

	/// Sets the refresh URL.
	pub fn refresh_token_url(mut self, url: Url) -> Self {
		self.refresh_token = Some(url);

		self
	}

	/// Sets the revocation URL.
	pub fn revoke_token_url(mut self, url: Url) -> Self {
		self.revoke_token = Some(url);

		self
	}

	/// Sets the API base URL.
	pub fn api_url(mut self, url: Url) -> Self {
		self.api = Some(url);

		self
	}

	/// Declares extra response fields checked for provider errors.
	pub fn error_fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.quirks.error_fields.extend(fields.into_iter().map(Into::into));

		self
	}

	/// Overrides the scope separator.
	pub fn scope_separator(mut self, separator: impl Into<String>) -> Self {
		self.quirks.scope_separator = separator.into();

		self
	}

	/// Overrides the client authentication header.
	pub fn client_header(mut self, header: impl Into<String>) -> Self {
		self.quirks.client_header = header.into();

		self
	}

	/// Sets the OAuth 2.0 token header scheme.
	pub fn token_header(mut self, header: impl Into<String>) -> Self {
		self.quirks.token_header = header.into();

		self
	}

	/// Overrides the client credential parameter names.
	pub fn client_keys(mut self, id_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
		self.quirks.client_id_key = id_key.into();
		self.quirks.client_secret_key = secret_key.into();

		self
	}

	/// Replaces all quirks at once.
	pub fn quirks(mut self, quirks: EndpointQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Consumes the builder and validates the resulting endpoint.
	pub fn build(self) -> Result<Endpoint, EndpointError> {
		let authorize = self.authorize.ok_or(EndpointError::MissingAuthorizeUrl)?;
		let access_token = self.access_token.ok_or(EndpointError::MissingAccessTokenUrl)?;
		let urls = EndpointUrls {
			request_token: self.request_token,
			authorize,
			access_token,
			refresh_token: self.refresh_token,
			revoke_token: self.revoke_token,
			api: self.api,
		};
		let endpoint = Endpoint { name: self.name, urls, quirks: self.quirks };

		endpoint.validate()?;

		Ok(endpoint)
	}
}

impl Endpoint {
	/// Validates invariants for the endpoint.
	fn validate(&self) -> Result<(), EndpointError> {
		let quirks = &self.quirks;

		if quirks.scope_separator.chars().any(char::is_control) {
			return Err(EndpointError::InvalidScopeSeparator {
				separator: quirks.scope_separator.clone(),
			});
		}

		validate_quirk("client_header", &quirks.client_header)?;
		validate_quirk("token_header", &quirks.token_header)?;
		validate_quirk("client_id_key", &quirks.client_id_key)?;
		validate_quirk("client_secret_key", &quirks.client_secret_key)?;

		for field in &quirks.error_fields {
			validate_quirk("error_fields", field)?;
		}

		Ok(())
	}
}

fn validate_quirk(quirk: &'static str, value: &str) -> Result<(), EndpointError> {
	if value.chars().any(char::is_control) {
		Err(EndpointError::InvalidQuirk { quirk })
	} else {
		Ok(())
	}
}
