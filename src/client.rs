//! Engine-agnostic client surface shared by the OAuth 1.0a and OAuth 2.0 engines.
//!
//! [`Signer`] is the only capability the [`SigningTransport`](crate::transport::SigningTransport)
//! needs. [`OAuthClient`] layers the redirect round trip and the token endpoints on top, so
//! provider adapters can compose an engine and override one or two operations by delegation.

// self
use crate::{
	_prelude::*,
	auth::Token,
	cache::StateCache,
	config::Config,
	http::{HttpDispatcher, HttpRequest, Method, Request},
	obs::{self, FlowKind},
	params::Params,
	response::Normalized,
};

/// Boxed `Send` future returned by [`OAuthClient`] operations.
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Attaches the provider-required authentication proof to an outgoing request.
pub trait Signer
where
	Self: Send + Sync,
{
	/// Signs `request` in place.
	///
	/// `token` is absent for client-authenticated calls (token endpoints). `values` are merged
	/// into the form body or query, whichever the request carries.
	fn signature(
		&self,
		request: &mut HttpRequest,
		token: Option<&Token>,
		values: Option<&Params>,
	) -> Result<()>;
}

/// Token obtained by [`OAuthClient::exchange`] together with the payload stored at Authorize.
#[derive(Clone, Debug)]
pub struct Exchanged<D> {
	/// Issued credential.
	pub token: Token,
	/// Caller payload restored from the correlation record.
	pub payload: Option<D>,
}

/// Three-legged authorization client.
///
/// Every operation is a single request/response exchange (Authorize for OAuth 1.0a performs
/// the temporary-credential handshake). Engines hold read-only configuration, so one instance
/// can serve concurrent flows.
pub trait OAuthClient
where
	Self: Signer,
{
	/// Dispatcher type carried by the configuration.
	type Dispatcher: ?Sized + HttpDispatcher;

	/// Configuration owned by the engine.
	fn config(&self) -> &Config<Self::Dispatcher>;

	/// Provider name.
	fn name(&self) -> &str {
		self.config().name()
	}

	/// Protocol version label (`"1.0"` or `"2.0"`).
	fn version(&self) -> &'static str;

	/// Correlation id carried by a callback query.
	fn correlation_id<'q>(&self, query: &'q Params) -> Option<&'q str>;

	/// Returns `true` when the callback reports a cancellation or is incomplete.
	fn cancel(&self, query: &Params) -> bool;

	/// Builds the redirect URL and, with a cache, stores a pending correlation record.
	fn authorize<'a, P>(
		&'a self,
		payload: Option<&P>,
		cache: Option<&'a dyn StateCache>,
		values: Params,
	) -> ClientFuture<'a, Url>
	where
		P: ?Sized + Serialize;

	/// Consumes the correlation record of a callback and exchanges it for a token.
	fn exchange<'a, D>(
		&'a self,
		query: &'a Params,
		cache: Option<&'a dyn StateCache>,
		values: Params,
	) -> ClientFuture<'a, Exchanged<D>>
	where
		D: 'a + DeserializeOwned + Send;

	/// Exchanges an authorization code or verifier for a token.
	fn access_token(&self, values: Params) -> ClientFuture<'_, Token>;

	/// Resource-owner password grant; `values` carries `username` and `password`.
	fn password_token(&self, values: Params) -> ClientFuture<'_, Token>;

	/// Client Credentials grant.
	fn client_credentials_token(&self, values: Params) -> ClientFuture<'_, Token>;

	/// Refreshes `token`; the result is an updated copy.
	fn refresh_token<'a>(&'a self, token: &'a Token, values: Params) -> ClientFuture<'a, Token>;

	/// Revokes `token` at the provider.
	fn revoke_token<'a>(&'a self, token: &'a Token, values: Params) -> ClientFuture<'a, ()>;

	/// Signs `request` with `token`, dispatches it, and normalizes the response.
	fn response<'a>(
		&'a self,
		request: HttpRequest,
		token: Option<&'a Token>,
	) -> ClientFuture<'a, Normalized> {
		Box::pin(obs::observe(
			FlowKind::Response,
			"response",
			self.config().dispatch(self, request, token),
		))
	}
}

/// Fetches the provider profile at `url` with `token`.
///
/// Provider adapters map the normalized map into their own identity record.
pub async fn fetch_profile<C>(client: &C, token: &Token, url: &Url) -> Result<Normalized>
where
	C: ?Sized + OAuthClient,
{
	let request = Request::builder()
		.method(Method::GET)
		.uri(url.as_str())
		.body(Vec::new())
		.map_err(crate::error::ConfigError::from)?;

	client.response(request, Some(token)).await
}
