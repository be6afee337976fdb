//! HTTP seam shared by the engines and the signing transport.
//!
//! The engines never talk to a concrete HTTP stack. Callers hand a [`HttpDispatcher`] to the
//! [`Config`](crate::config::Config); every outgoing request asks it for a fresh
//! [`AsyncHttpClient`] handle, so the shared dispatcher itself is never wrapped or mutated.
//! Requests and responses are the `http` crate types re-exported through `oauth2`.

// std
use std::ops::Deref;
// crates.io
pub use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header},
};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};

/// Response bodies are truncated to this many bytes before normalization.
pub const MAX_BODY_BYTES: usize = 1 << 20;

/// Source of [`AsyncHttpClient`] handles used to dispatch signed requests.
///
/// Implementations must be `Send + Sync + 'static` so one dispatcher can back many engines,
/// and the handles they return must own whatever state they need so the request futures
/// stay `Send` for the lifetime of the call.
pub trait HttpDispatcher
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Per-request [`AsyncHttpClient`] handle.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a fresh handle; the dispatcher itself is left untouched.
	fn dispatcher(&self) -> Self::Handle;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Provider token endpoints answer directly, so a custom [`ReqwestClient`] should disable
/// redirect following before it is wrapped here.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpDispatcher for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn dispatcher(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}
}

/// Handle returned by [`ReqwestHttpClient`]; reads at most [`MAX_BODY_BYTES`] per response.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let mut response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut body = Vec::new();

			while let Some(chunk) = response.chunk().await.map_err(Box::new)? {
				let room = MAX_BODY_BYTES - body.len();

				if chunk.len() >= room {
					body.extend_from_slice(&chunk[..room]);

					break;
				}

				body.extend_from_slice(&chunk);
			}

			let mut response_new = HttpResponse::new(body);

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Classifies a dispatcher failure into the engine taxonomy.
pub fn map_http_client_error<E>(err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => TransportError::Network { source: inner }.into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransportError::Other { message }.into(),
		other => TransportError::Other { message: other.to_string() }.into(),
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::io;
	// self
	use super::*;

	#[test]
	fn dispatcher_failures_map_to_transport_and_config_errors() {
		let err = map_http_client_error::<io::Error>(HttpClientError::Io(io::Error::other("reset")));

		assert!(matches!(err, Error::Transport(TransportError::Io(_))));
		assert_eq!(err.status(), 502);

		let err = map_http_client_error::<io::Error>(HttpClientError::Reqwest(Box::new(
			io::Error::other("dns"),
		)));

		assert!(matches!(err, Error::Transport(TransportError::Network { .. })));

		let err = map_http_client_error::<io::Error>(HttpClientError::Other("boom".into()));

		assert_eq!(err.to_string(), "HTTP client error occurred while calling the provider: boom.");
	}
}
