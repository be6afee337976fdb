//! OAuth 1.0a engine.

pub mod signature;

pub use signature::Seed;

// std
use std::future;
// self
use crate::{
	_prelude::*,
	auth::{Token, TokenBuilderError},
	cache::{self, StateCache},
	client::{ClientFuture, Exchanged, OAuthClient, Signer},
	config::Config,
	error::ConfigError,
	flows::{self, query_value},
	http::{HttpDispatcher, HttpRequest, Method, Request, header},
	obs::{self, FlowKind},
	params::{self, Params, merge_values, params},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;
use signature::Signing;

#[cfg(feature = "reqwest")]
/// OAuth 1.0a engine specialized for the crate's default reqwest dispatcher.
pub type ReqwestOAuth1 = OAuth1<ReqwestHttpClient>;

/// OAuth 1.0a engine signing every request with HMAC-SHA1.
///
/// Authorize runs the temporary-credential handshake against the endpoint's request-token
/// URL. Password, client-credentials, refresh, and revoke operations do not exist in
/// OAuth 1.0a and fail with [`ConfigError::Unsupported`].
pub struct OAuth1<C>
where
	C: ?Sized + HttpDispatcher,
{
	config: Config<C>,
}
impl<C> OAuth1<C>
where
	C: ?Sized + HttpDispatcher,
{
	/// Creates an engine owning `config`.
	pub fn new(config: Config<C>) -> Self {
		Self { config }
	}

	/// Deterministic form of [`Signer::signature`] with a fixed timestamp and nonce.
	pub fn signature_at(
		&self,
		request: &mut HttpRequest,
		token: Option<&Token>,
		values: Option<&Params>,
		timestamp: i64,
		nonce: &str,
	) -> Result<()> {
		if token.is_some_and(Token::is_expired) {
			return Err(Error::TokenExpired);
		}

		let config = &self.config;
		let scheme = config.endpoint.oauth1_scheme();
		let mut oauth = Seed::take(request).map(|seed| seed.0).unwrap_or_default();

		if let Some(existing) = request.headers().get(header::AUTHORIZATION) {
			let existing = String::from_utf8_lossy(existing.as_bytes());

			if existing.starts_with(&scheme) {
				return Err(ConfigError::AlreadySigned.into());
			}

			oauth = merge_values(false, params::parse_query(&existing), [&oauth]);
		}

		oauth.extend(params([
			("oauth_signature_method", signature::SIGNATURE_METHOD),
			("oauth_consumer_key", config.client_id.as_str()),
			("oauth_timestamp", timestamp.to_string().as_str()),
			("oauth_nonce", nonce),
			("oauth_version", signature::VERSION),
		]));

		let mut token_secret = "";

		if let Some(token) = token {
			token.ensure_client(&config.client_id)?;
			oauth.insert("oauth_token".into(), token.access_token.expose().into());

			token_secret = token.token_secret.as_ref().map(|secret| secret.expose()).unwrap_or_default();
		}

		signature::finalize(
			request,
			Signing { scheme: &scheme, oauth, consumer_secret: &config.client_secret, token_secret },
			values,
		)
	}

	async fn request_access_token(&self, mut values: Params) -> Result<Token> {
		let mut take = |key: &str| values.remove(key).filter(|value| !value.is_empty());
		let (Some(oauth_token), Some(verifier), Some(secret)) =
			(take("oauth_token"), take("oauth_verifier"), take("oauth_token_secret"))
		else {
			return Err(Error::Denied);
		};
		let now = OffsetDateTime::now_utc();
		let mut request = flows::form_post(&self.config.endpoint.urls.access_token, &values)?;

		Seed::new([("oauth_verifier", verifier)]).attach(&mut request);

		let temporary =
			Token::builder(oauth_token).token_secret(secret).issued_at(now).build().map_err(ConfigError::from)?;
		let mut raw = self.config.dispatch(self, request, Some(&temporary)).await?;
		let access_token = flows::take_string(&mut raw, "oauth_token");
		let token_secret = flows::take_string(&mut raw, "oauth_token_secret");
		let id_token = flows::take_string(&mut raw, "id_token");
		let open_id = flows::take_string(&mut raw, "openid");
		let mut builder = Token::builder(
			access_token.ok_or(TokenBuilderError::MissingAccessToken).map_err(ConfigError::from)?,
		)
		.client_id(self.config.client_id.as_str())
		.issued_at(now)
		.raw(raw);

		if let Some(secret) = token_secret {
			builder = builder.token_secret(secret);
		}
		if let Some(id_token) = id_token {
			builder = builder.id_token(id_token);
		}
		if let Some(open_id) = open_id {
			builder = builder.open_id(open_id);
		}

		builder.build().map_err(|e| ConfigError::from(e).into())
	}

	async fn temporary_credentials(&self) -> Result<(String, String)> {
		let url = self
			.config
			.endpoint
			.urls
			.request_token
			.as_ref()
			.ok_or(ConfigError::MissingEndpoint { endpoint: "request_token" })?;
		let mut request = Request::builder()
			.method(Method::POST)
			.uri(url.as_str())
			.body(Vec::new())
			.map_err(ConfigError::from)?;

		Seed::new([("oauth_callback", self.config.redirect_uri.as_str())]).attach(&mut request);

		let raw = self.config.dispatch(self, request, None).await?;

		if raw.get("oauth_callback_confirmed").and_then(Value::as_str) != Some("true") {
			return Err(Error::handshake("oauth_callback_confirmed was not true"));
		}

		let field = |key: &str| {
			raw.get(key)
				.and_then(Value::as_str)
				.filter(|value| !value.is_empty())
				.map(str::to_owned)
				.ok_or_else(|| Error::handshake(format!("{key} not string")))
		};

		Ok((field("oauth_token")?, field("oauth_token_secret")?))
	}
}
impl<C> Clone for OAuth1<C>
where
	C: ?Sized + HttpDispatcher,
{
	fn clone(&self) -> Self {
		Self { config: self.config.clone() }
	}
}
impl<C> Debug for OAuth1<C>
where
	C: ?Sized + HttpDispatcher,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth1").field("config", &self.config).finish()
	}
}
impl<C> Signer for OAuth1<C>
where
	C: ?Sized + HttpDispatcher,
{
	fn signature(
		&self,
		request: &mut HttpRequest,
		token: Option<&Token>,
		values: Option<&Params>,
	) -> Result<()> {
		let timestamp = OffsetDateTime::now_utc().unix_timestamp();

		self.signature_at(request, token, values, timestamp, &flows::random_string(signature::NONCE_LEN))
	}
}
impl<C> OAuthClient for OAuth1<C>
where
	C: ?Sized + HttpDispatcher,
{
	type Dispatcher = C;

	fn config(&self) -> &Config<C> {
		&self.config
	}

	fn version(&self) -> &'static str {
		"1.0"
	}

	fn correlation_id<'q>(&self, query: &'q Params) -> Option<&'q str> {
		query_value(query, "oauth_token").or_else(|| query_value(query, "denied"))
	}

	fn cancel(&self, query: &Params) -> bool {
		query_value(query, "error").is_some()
			|| query_value(query, "denied").is_some()
			|| query_value(query, "oauth_token").is_none()
			|| query_value(query, "oauth_verifier").is_none()
	}

	fn authorize<'a, P>(
		&'a self,
		payload: Option<&P>,
		cache: Option<&'a dyn StateCache>,
		values: Params,
	) -> ClientFuture<'a, Url>
	where
		P: ?Sized + Serialize,
	{
		let payload = cache::serialize_payload(payload);

		Box::pin(obs::observe(FlowKind::Authorize, "oauth1.authorize", async move {
			let payload = payload?;
			let (oauth_token, oauth_token_secret) = self.temporary_credentials().await?;
			let mut url = self.config.endpoint.urls.authorize.clone();
			let query = merge_values(
				true,
				url.query().map(params::parse_query).unwrap_or_default(),
				[&values, &params([("oauth_token", oauth_token.as_str())])],
			);

			url.set_query(None);

			let url = params::with_query(url, &query);

			if let Some(cache) = cache {
				let key = self.config.cache_key(&oauth_token);

				flows::store_correlation(cache, &key, Some(oauth_token_secret), payload).await?;
			}

			Ok(url)
		}))
	}

	fn exchange<'a, D>(
		&'a self,
		query: &'a Params,
		cache: Option<&'a dyn StateCache>,
		values: Params,
	) -> ClientFuture<'a, Exchanged<D>>
	where
		D: 'a + DeserializeOwned + Send,
	{
		Box::pin(obs::observe(FlowKind::Exchange, "oauth1.exchange", async move {
			let oauth_token = query_value(query, "oauth_token");
			let mut secret = None;
			let mut payload = None;

			if let Some(cache) = cache {
				let Some(id) = self.correlation_id(query) else {
					return Err(Error::Denied);
				};
				let consumed = cache::consume(cache, &self.config.cache_key(id)).await;

				if oauth_token.is_none() {
					consumed?;

					return Err(Error::Denied);
				}
				if self.cancel(query) {
					return Err(Error::Cancelled);
				}

				let record = consumed?;

				payload = cache::restore_payload(&record)?;
				secret = record.secret.map(|secret| secret.expose().to_owned());
			} else if self.cancel(query) {
				return Err(Error::Cancelled);
			}

			let mut append = params([
				("oauth_token", oauth_token.unwrap_or_default()),
				("oauth_verifier", query_value(query, "oauth_verifier").unwrap_or_default()),
			]);

			if let Some(secret) = secret.filter(|secret| !secret.is_empty()) {
				append.insert("oauth_token_secret".into(), secret);
			}

			let token = self.request_access_token(merge_values(false, values, [&append])).await?;

			Ok(Exchanged { token, payload })
		}))
	}

	fn access_token(&self, values: Params) -> ClientFuture<'_, Token> {
		Box::pin(obs::observe(
			FlowKind::AccessToken,
			"oauth1.access_token",
			self.request_access_token(values),
		))
	}

	fn password_token(&self, _values: Params) -> ClientFuture<'_, Token> {
		Box::pin(future::ready(Err(unsupported("password_token"))))
	}

	fn client_credentials_token(&self, _values: Params) -> ClientFuture<'_, Token> {
		Box::pin(future::ready(Err(unsupported("client_credentials_token"))))
	}

	fn refresh_token<'a>(&'a self, _token: &'a Token, _values: Params) -> ClientFuture<'a, Token> {
		Box::pin(future::ready(Err(unsupported("refresh_token"))))
	}

	fn revoke_token<'a>(&'a self, _token: &'a Token, _values: Params) -> ClientFuture<'a, ()> {
		Box::pin(future::ready(Err(unsupported("revoke_token"))))
	}
}

fn unsupported(operation: &'static str) -> Error {
	ConfigError::Unsupported { version: "1.0", operation }.into()
}
