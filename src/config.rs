//! Engine configuration shared by the OAuth 1.0a and OAuth 2.0 engines.

// self
use crate::{
	_prelude::*,
	auth::{Token, join_scopes},
	cache,
	client::Signer,
	http::{HttpDispatcher, HttpRequest},
	provider::Endpoint,
	response::{self, Normalized},
	transport::SigningTransport,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Configuration specialized for the crate's default reqwest dispatcher.
pub type ReqwestConfig = Config<ReqwestHttpClient>;

/// Runtime switches passed explicitly to the signing transport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runtime {
	/// Dump every signed request and raw response through `tracing::debug!`.
	pub debug: bool,
}
impl Runtime {
	/// Runtime with request/response dumps enabled.
	pub fn debug() -> Self {
		Self { debug: true }
	}
}

/// Provider endpoint, client credentials, and dispatcher owned by one engine.
///
/// The configuration is read-only once an engine owns it, so one engine can serve
/// concurrent flows without locking.
pub struct Config<C>
where
	C: ?Sized + HttpDispatcher,
{
	/// Provider endpoint descriptor.
	pub endpoint: Endpoint,
	/// Client identifier registered with the provider.
	pub client_id: String,
	/// Client secret; empty for public clients.
	pub client_secret: String,
	/// Scopes requested during Authorize.
	pub scopes: Vec<String>,
	/// Redirect URI registered with the provider.
	pub redirect_uri: String,
	/// Shared dispatcher; every request asks it for a fresh handle.
	pub http_client: Arc<C>,
	/// Runtime switches.
	pub runtime: Runtime,
}
impl<C> Config<C>
where
	C: ?Sized + HttpDispatcher,
{
	/// Creates a configuration that reuses the caller-provided dispatcher.
	pub fn with_http_client(
		endpoint: Endpoint,
		client_id: impl Into<String>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			endpoint,
			client_id: client_id.into(),
			client_secret: String::new(),
			scopes: Vec::new(),
			redirect_uri: String::new(),
			http_client: http_client.into(),
			runtime: Runtime::default(),
		}
	}

	/// Sets the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = secret.into();

		self
	}

	/// Sets the scopes requested during Authorize.
	pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the redirect URI.
	pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
		self.redirect_uri = redirect_uri.into();

		self
	}

	/// Replaces the runtime switches.
	pub fn with_runtime(mut self, runtime: Runtime) -> Self {
		self.runtime = runtime;

		self
	}

	/// Provider name.
	pub fn name(&self) -> &str {
		&self.endpoint.name
	}

	/// Requested scopes joined with the endpoint separator.
	pub fn scope(&self) -> String {
		join_scopes(&self.scopes, &self.endpoint.quirks.scope_separator)
	}

	/// Opaque cache key for a correlation id under this provider and client.
	pub fn cache_key(&self, correlation_id: &str) -> String {
		cache::correlation_key(self.name(), &self.client_id, correlation_id)
	}

	/// Builds a signing transport on a fresh dispatcher handle.
	pub fn transport<'a, S>(
		&self,
		signer: &'a S,
		token: Option<&'a Token>,
	) -> SigningTransport<'a, S, C>
	where
		S: ?Sized + Signer,
	{
		SigningTransport::new(signer, token, self.http_client.as_ref(), self.runtime)
	}

	/// Signs, dispatches, and normalizes one request.
	pub async fn dispatch<S>(
		&self,
		signer: &S,
		request: HttpRequest,
		token: Option<&Token>,
	) -> Result<Normalized>
	where
		S: ?Sized + Signer,
	{
		let response = self.transport(signer, token).send(request).await?;

		response::normalize_response(&response, &self.endpoint.quirks.error_fields)
	}
}
#[cfg(feature = "reqwest")]
impl Config<ReqwestHttpClient> {
	/// Creates a configuration backed by a default reqwest client.
	pub fn new(endpoint: Endpoint, client_id: impl Into<String>) -> Self {
		Self::with_http_client(endpoint, client_id, ReqwestHttpClient::default())
	}
}
impl<C> Clone for Config<C>
where
	C: ?Sized + HttpDispatcher,
{
	fn clone(&self) -> Self {
		Self {
			endpoint: self.endpoint.clone(),
			client_id: self.client_id.clone(),
			client_secret: self.client_secret.clone(),
			scopes: self.scopes.clone(),
			redirect_uri: self.redirect_uri.clone(),
			http_client: self.http_client.clone(),
			runtime: self.runtime,
		}
	}
}
impl<C> Debug for Config<C>
where
	C: ?Sized + HttpDispatcher,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Config")
			.field("endpoint", &self.endpoint)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.field("scopes", &self.scopes)
			.field("redirect_uri", &self.redirect_uri)
			.field("runtime", &self.runtime)
			.finish()
	}
}
