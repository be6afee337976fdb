//! OAuth 2.0 engine.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{Token, TokenBuilderError, parse_granted_scopes},
	cache::{self, StateCache},
	client::{ClientFuture, Exchanged, OAuthClient, Signer},
	config::Config,
	error::ConfigError,
	flows::{self, query_value},
	http::{HttpDispatcher, HttpRequest, header},
	obs::{self, FlowKind},
	params::{self, Params, merge_values, params},
	provider::ClientAuthMethod,
	response::Normalized,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Length of the generated `state` value.
pub const STATE_LEN: usize = 48;

#[cfg(feature = "reqwest")]
/// OAuth 2.0 engine specialized for the crate's default reqwest dispatcher.
pub type ReqwestOAuth2 = OAuth2<ReqwestHttpClient>;

/// OAuth 2.0 authorization-code engine.
///
/// Token endpoints are authenticated with the client credentials (HTTP Basic when the
/// endpoint's client header is `Basic`, request-body parameters otherwise). API calls carry
/// the access token either in an `Authorization: <token header> <token>` header or as an
/// `access_token` parameter.
pub struct OAuth2<C>
where
	C: ?Sized + HttpDispatcher,
{
	config: Config<C>,
}
impl<C> OAuth2<C>
where
	C: ?Sized + HttpDispatcher,
{
	/// Creates an engine owning `config`.
	pub fn new(config: Config<C>) -> Self {
		Self { config }
	}

	/// POSTs `values` as a form to `url` and folds the response into a token.
	///
	/// `current` is updated in place when present (refresh); otherwise a new token is built
	/// and the response must carry an `access_token`.
	pub async fn request_token(
		&self,
		url: &Url,
		current: Option<Token>,
		values: Params,
	) -> Result<Token> {
		let now = OffsetDateTime::now_utc();
		let request = flows::form_post(url, &merge_values(true, Params::new(), [&values]))?;
		let raw = self.config.dispatch(self, request, None).await?;

		self.apply_token_response(current, raw, now)
	}

	fn apply_token_response(
		&self,
		current: Option<Token>,
		mut raw: Normalized,
		now: OffsetDateTime,
	) -> Result<Token> {
		let access_token = flows::take_string(&mut raw, "access_token");
		let token_type = flows::take_string(&mut raw, "token_type");
		let refresh_token = flows::take_string(&mut raw, "refresh_token");
		let id_token = flows::take_string(&mut raw, "id_token");
		let mut token = match current {
			Some(token) => token,
			None => Token::builder(
				access_token.as_deref().ok_or(TokenBuilderError::MissingAccessToken).map_err(ConfigError::from)?,
			)
			.issued_at(now)
			.build()
			.map_err(ConfigError::from)?,
		};

		token.client_id = self.config.client_id.clone();
		token.updated = now;

		if let Some(value) = access_token {
			token.access_token = value.into();
		}
		if let Some(value) = token_type {
			token.token_type = value;
		}
		if let Some(value) = refresh_token {
			token.refresh_token = Some(value.into());
		}
		if let Some(value) = id_token {
			token.id_token = Some(value);
		}
		if let Some(seconds) = expiry_seconds(&raw) {
			// Lifetimes beyond the representable range leave the expiry unset.
			token.expires_at = now.checked_add(Duration::seconds(seconds));
		}

		let scopes = raw.get("scope").or_else(|| raw.get("scopes")).map(parse_granted_scopes);

		if let Some(scopes) = scopes.filter(|scopes| !scopes.is_empty()) {
			token.scopes = scopes;
		}

		token.raw = raw;

		Ok(token)
	}

	async fn exchange_code(&self, values: Params) -> Result<Token> {
		let defaults = params([("redirect_uri", self.config.redirect_uri.as_str())]);
		let values =
			merge_values(true, defaults, [&values, &params([("grant_type", "authorization_code")])]);

		self.request_token(&self.config.endpoint.urls.access_token, None, values).await
	}

	fn sign_client(&self, request: &mut HttpRequest, values: &mut Params) -> Result<()> {
		let config = &self.config;
		let quirks = &config.endpoint.quirks;

		match config.endpoint.client_auth_method() {
			ClientAuthMethod::Basic => {
				let credentials = format!(
					"{}:{}",
					query_escape(&config.client_id),
					query_escape(&config.client_secret)
				);

				request.headers_mut().insert(
					header::AUTHORIZATION,
					flows::header_value(&format!("Basic {}", STANDARD.encode(credentials)))?,
				);
			},
			ClientAuthMethod::RequestBody => {
				values.insert(quirks.client_id_param().into(), config.client_id.clone());
				values.insert(quirks.client_secret_param().into(), config.client_secret.clone());
			},
		}

		Ok(())
	}
}
impl<C> Clone for OAuth2<C>
where
	C: ?Sized + HttpDispatcher,
{
	fn clone(&self) -> Self {
		Self { config: self.config.clone() }
	}
}
impl<C> Debug for OAuth2<C>
where
	C: ?Sized + HttpDispatcher,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2").field("config", &self.config).finish()
	}
}
impl<C> Signer for OAuth2<C>
where
	C: ?Sized + HttpDispatcher,
{
	fn signature(
		&self,
		request: &mut HttpRequest,
		token: Option<&Token>,
		values: Option<&Params>,
	) -> Result<()> {
		let mut values = values.cloned().unwrap_or_default();

		match token {
			None => self.sign_client(request, &mut values)?,
			Some(token) => {
				token.ensure_client(&self.config.client_id)?;

				let token_header = &self.config.endpoint.quirks.token_header;

				if token_header.is_empty() {
					values.insert("access_token".into(), token.access_token.expose().into());
				} else {
					request.headers_mut().insert(
						header::AUTHORIZATION,
						flows::header_value(&format!("{token_header} {}", token.access_token.expose()))?,
					);
				}
			},
		}

		params::set_values(request, &values)
	}
}
impl<C> OAuthClient for OAuth2<C>
where
	C: ?Sized + HttpDispatcher,
{
	type Dispatcher = C;

	fn config(&self) -> &Config<C> {
		&self.config
	}

	fn version(&self) -> &'static str {
		"2.0"
	}

	fn correlation_id<'q>(&self, query: &'q Params) -> Option<&'q str> {
		query_value(query, "state")
	}

	fn cancel(&self, query: &Params) -> bool {
		query_value(query, "error").is_some()
			|| query_value(query, "denied").is_some()
			|| query_value(query, "code").is_none()
			|| query_value(query, "state").is_none()
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

		Box::pin(obs::observe(FlowKind::Authorize, "oauth2.authorize", async move {
			let payload = payload?;
			let config = &self.config;
			let state = flows::random_string(STATE_LEN);
			let mut url = config.endpoint.urls.authorize.clone();
			let defaults = params([
				("scope", config.scope()),
				("redirect_uri", config.redirect_uri.clone()),
				("response_type", "code".to_owned()),
			]);
			let append = params([
				(config.endpoint.quirks.client_id_param(), config.client_id.as_str()),
				("state", state.as_str()),
			]);
			let query = merge_values(
				true,
				url.query().map(params::parse_query).unwrap_or_default(),
				[&defaults, &values, &append],
			);

			url.set_query(None);

			let url = params::with_query(url, &query);

			if let Some(cache) = cache {
				flows::store_correlation(cache, &config.cache_key(&state), None, payload).await?;
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
		Box::pin(obs::observe(FlowKind::Exchange, "oauth2.exchange", async move {
			let mut payload = None;

			if let Some(cache) = cache {
				let Some(state) = self.correlation_id(query) else {
					return Err(Error::Cancelled);
				};
				let consumed = cache::consume(cache, &self.config.cache_key(state)).await;

				if self.cancel(query) {
					return Err(Error::Cancelled);
				}

				payload = cache::restore_payload(&consumed?)?;
			} else if self.cancel(query) {
				return Err(Error::Cancelled);
			}

			let code = query_value(query, "code").unwrap_or_default();
			let values = merge_values(false, values, [&params([("code", code)])]);
			let token = self.exchange_code(values).await?;

			Ok(Exchanged { token, payload })
		}))
	}

	fn access_token(&self, values: Params) -> ClientFuture<'_, Token> {
		Box::pin(obs::observe(FlowKind::AccessToken, "oauth2.access_token", self.exchange_code(values)))
	}

	fn password_token(&self, values: Params) -> ClientFuture<'_, Token> {
		Box::pin(obs::observe(FlowKind::PasswordToken, "oauth2.password", async move {
			let values = merge_values(true, values, [&params([("grant_type", "password")])]);

			self.request_token(&self.config.endpoint.urls.access_token, None, values).await
		}))
	}

	fn client_credentials_token(&self, values: Params) -> ClientFuture<'_, Token> {
		Box::pin(obs::observe(FlowKind::ClientCredentials, "oauth2.client_credentials", async move {
			let values = merge_values(true, values, [&params([("grant_type", "client_credentials")])]);

			self.request_token(&self.config.endpoint.urls.access_token, None, values).await
		}))
	}

	fn refresh_token<'a>(&'a self, token: &'a Token, values: Params) -> ClientFuture<'a, Token> {
		Box::pin(obs::observe(FlowKind::Refresh, "oauth2.refresh", async move {
			if !token.has_refresh_token() {
				return Err(ConfigError::MissingRefreshToken.into());
			}

			let refresh_token = token.refresh_token.as_ref().map(|secret| secret.expose()).unwrap_or_default();

			token.ensure_client(&self.config.client_id)?;

			let values = merge_values(true, values, [&params([
				("grant_type", "refresh_token"),
				("refresh_token", refresh_token),
			])]);

			self.request_token(self.config.endpoint.refresh_url(), Some(token.clone()), values).await
		}))
	}

	fn revoke_token<'a>(&'a self, token: &'a Token, values: Params) -> ClientFuture<'a, ()> {
		Box::pin(obs::observe(FlowKind::Revoke, "oauth2.revoke", async move {
			let Some(url) = self.config.endpoint.urls.revoke_token.as_ref() else {
				return Err(ConfigError::RevokeUnsupported.into());
			};

			token.ensure_client(&self.config.client_id)?;

			let mut values =
				merge_values(false, params([("token_type_hint", "access_token")]), [&values]);

			if query_value(&values, "token").is_none() {
				let credential = if values.get("token_type_hint").is_some_and(|hint| hint == "refresh_token") {
					token.refresh_token.as_ref().map(|secret| secret.expose().to_owned()).unwrap_or_default()
				} else {
					token.access_token.expose().to_owned()
				};

				values.insert("token".into(), credential);
			}

			let request = flows::form_post(url, &values)?;

			self.config.dispatch(self, request, None).await?;

			Ok(())
		}))
	}
}

fn query_escape(value: &str) -> String {
	form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

// `expires_in` wins over `expires`; numbers and numeric strings are truncated to whole seconds.
fn expiry_seconds(raw: &Normalized) -> Option<i64> {
	let value = raw.get("expires_in").filter(|v| !v.is_null()).or_else(|| raw.get("expires"))?;
	let seconds = match value {
		Value::Number(n) => n.as_f64()?,
		Value::String(s) => s.trim().parse::<f64>().ok()?,
		_ => return None,
	};

	if !seconds.is_finite() {
		return None;
	}

	Some(seconds.trunc() as i64).filter(|seconds| *seconds != 0)
}
