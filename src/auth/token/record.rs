//! Token record issued by a provider, its client binding, and the builder the engines use.

// self
use crate::{
	_prelude::*,
	auth::{User, token::secret::TokenSecret},
	error::ConfigError,
};

/// Errors produced by [`TokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
}

/// Credential issued by a provider together with its client binding and leftover fields.
///
/// `client_id` binds the token to the engine configuration that issued it. An empty value
/// means the token is unbound. Once set, every refresh, revoke, and signing call rejects the
/// token if the engine's client identifier differs (see [`Token::ensure_client`]).
///
/// [`Clone`] produces a fully independent copy: scopes, the raw map, and the nested user
/// record are owned values, so mutating a clone never reaches the original.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
	/// Client identifier of the configuration that issued the token.
	pub client_id: String,
	/// Provider token type (`bearer`, `mac`, ...). Empty when the provider omits it.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub token_type: String,
	/// Access credential.
	pub access_token: TokenSecret,
	/// OAuth 1.0a token secret.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_secret: Option<TokenSecret>,
	/// Refresh credential, if the provider issued one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Raw OpenID Connect ID token; never validated.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
	/// Provider-assigned open identifier.
	#[serde(default, rename = "openid", skip_serializing_if = "Option::is_none")]
	pub open_id: Option<String>,
	/// Granted scopes in provider order.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub scopes: Vec<String>,
	/// Provider fields the engine did not consume.
	#[serde(default, rename = "params", skip_serializing_if = "Map::is_empty")]
	pub raw: Map<String, Value>,
	/// Identity record attached by a provider adapter.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user: Option<User>,
	/// First issue instant.
	pub created: OffsetDateTime,
	/// Last issue or refresh instant.
	pub updated: OffsetDateTime,
	/// Absolute expiry instant; `None` when the provider reported no lifetime.
	#[serde(default, rename = "expired", skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<OffsetDateTime>,
}
impl Token {
	/// Returns a builder seeded with the access credential.
	pub fn builder(access_token: impl Into<String>) -> TokenBuilder {
		TokenBuilder::default().access_token(access_token)
	}

	/// Returns `true` if the token carries an expiry at or before `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| expires_at <= instant)
	}

	/// Convenience helper that checks the expiry using the current UTC instant.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the token carries a non-empty refresh credential.
	pub fn has_refresh_token(&self) -> bool {
		self.refresh_token.as_ref().is_some_and(|secret| !secret.is_empty())
	}

	/// Verifies the token is unbound or bound to `client_id`.
	pub fn ensure_client(&self, client_id: &str) -> Result<(), ConfigError> {
		if self.client_id.is_empty() || self.client_id == client_id {
			Ok(())
		} else {
			Err(ConfigError::ClientIdMismatch)
		}
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("client_id", &self.client_id)
			.field("token_type", &self.token_type)
			.field("access_token", &"<redacted>")
			.field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
			.field("open_id", &self.open_id)
			.field("scopes", &self.scopes)
			.field("raw_keys", &self.raw.keys().collect::<Vec<_>>())
			.field("user", &self.user)
			.field("created", &self.created)
			.field("updated", &self.updated)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`Token`].
#[derive(Clone, Debug, Default)]
pub struct TokenBuilder {
	client_id: String,
	token_type: String,
	access_token: Option<TokenSecret>,
	token_secret: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	id_token: Option<String>,
	open_id: Option<String>,
	scopes: Vec<String>,
	raw: Map<String, Value>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenBuilder {
	/// Binds the token to a client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = client_id.into();

		self
	}

	/// Sets the provider token type.
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = token_type.into();

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the OAuth 1.0a token secret.
	pub fn token_secret(mut self, secret: impl Into<String>) -> Self {
		self.token_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the raw ID token.
	pub fn id_token(mut self, token: impl Into<String>) -> Self {
		self.id_token = Some(token.into());

		self
	}

	/// Provides the provider-assigned open identifier.
	pub fn open_id(mut self, open_id: impl Into<String>) -> Self {
		self.open_id = Some(open_id.into());

		self
	}

	/// Sets the granted scopes.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the leftover provider fields.
	pub fn raw(mut self, raw: Map<String, Value>) -> Self {
		self.raw = raw;

		self
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces a [`Token`].
	pub fn build(self) -> Result<Token, TokenBuilderError> {
		let access_token = self.access_token.ok_or(TokenBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = self
			.expires_at
			.or_else(|| self.expires_in.and_then(|delta| issued_at.checked_add(delta)));

		Ok(Token {
			client_id: self.client_id,
			token_type: self.token_type,
			access_token,
			token_secret: self.token_secret,
			refresh_token: self.refresh_token,
			id_token: self.id_token,
			open_id: self.open_id,
			scopes: self.scopes,
			raw: self.raw,
			user: None,
			created: issued_at,
			updated: issued_at,
			expires_at,
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn fixture() -> Token {
		Token::builder("access")
			.client_id("client-a")
			.refresh_token("refresh")
			.scopes(["read", "write"])
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::hours(1))
			.build()
			.expect("Token builder should succeed for the fixture.")
	}

	#[test]
	fn builder_handles_relative_and_missing_expiry() {
		let token = fixture();

		assert_eq!(token.created, macros::datetime!(2025-01-01 00:00 UTC));
		assert_eq!(token.expires_at, Some(macros::datetime!(2025-01-01 01:00 UTC)));
		assert!(!token.is_expired_at(macros::datetime!(2025-01-01 00:59 UTC)));
		assert!(token.is_expired_at(macros::datetime!(2025-01-01 01:00 UTC)));

		let open = Token::builder("access").build().expect("Token without expiry should build.");

		assert!(open.expires_at.is_none());
		assert!(!open.is_expired());
		assert_eq!(TokenBuilder::default().build(), Err(TokenBuilderError::MissingAccessToken));

		let unbounded = Token::builder("access")
			.expires_in(Duration::MAX)
			.build()
			.expect("Unrepresentable lifetimes should still build.");

		assert!(unbounded.expires_at.is_none());
	}

	#[test]
	fn client_binding_rejects_foreign_clients() {
		let token = fixture();

		assert!(token.ensure_client("client-a").is_ok());
		assert!(matches!(token.ensure_client("client-b"), Err(ConfigError::ClientIdMismatch)));

		let unbound = Token { client_id: String::new(), ..token };

		assert!(unbound.ensure_client("anyone").is_ok());
	}

	#[test]
	fn clones_do_not_share_scopes_raw_or_user() {
		let mut original = fixture();

		original.raw.insert("uid".into(), Value::from(42));
		original.user = Some(User { id: "42".into(), ..Default::default() });

		let mut copy = original.clone();

		copy.scopes.push("admin".into());
		copy.raw.insert("extra".into(), Value::Bool(true));

		if let Some(user) = copy.user.as_mut() {
			user.name = "changed".into();
		}

		assert_eq!(original.scopes, vec!["read", "write"]);
		assert!(!original.raw.contains_key("extra"));
		assert_eq!(original.user.as_ref().map(|user| user.name.as_str()), Some(""));
	}

	#[test]
	fn debug_output_redacts_credentials() {
		let rendered = format!("{:?}", fixture());

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("\"access\""));
		assert!(!rendered.contains("refresh\""));
	}
}
