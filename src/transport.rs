//! Signing transport: signs exactly one outgoing request, dispatches it, and optionally dumps
//! both sides of the exchange.

// self
use crate::{
	_prelude::*,
	auth::Token,
	client::Signer,
	config::Runtime,
	http::{self, AsyncHttpClient, HttpDispatcher, HttpRequest, HttpResponse},
	obs,
	params::Params,
};

/// Per-request signing layer over a fresh dispatcher handle.
///
/// The handle comes from [`HttpDispatcher::dispatcher`], so the caller's shared dispatcher is
/// never wrapped or mutated. A transport never wraps another transport: [`rebind`](Self::rebind)
/// swaps the credential on the same handle and [`into_parent`](Self::into_parent) hands the
/// bare handle back.
pub struct SigningTransport<'a, S, D>
where
	S: ?Sized + Signer,
	D: ?Sized + HttpDispatcher,
{
	signer: &'a S,
	token: Option<&'a Token>,
	values: Option<&'a Params>,
	parent: D::Handle,
	runtime: Runtime,
}
impl<'a, S, D> SigningTransport<'a, S, D>
where
	S: ?Sized + Signer,
	D: ?Sized + HttpDispatcher,
{
	/// Creates a transport on a handle freshly produced by `dispatcher`.
	pub fn new(
		signer: &'a S,
		token: Option<&'a Token>,
		dispatcher: &D,
		runtime: Runtime,
	) -> Self {
		Self::with_parent(signer, token, dispatcher.dispatcher(), runtime)
	}

	/// Creates a transport on an existing bare handle.
	pub fn with_parent(
		signer: &'a S,
		token: Option<&'a Token>,
		parent: D::Handle,
		runtime: Runtime,
	) -> Self {
		Self { signer, token, values: None, parent, runtime }
	}

	/// Extra values merged into the request during signing.
	pub fn with_values(mut self, values: &'a Params) -> Self {
		self.values = Some(values);

		self
	}

	/// Replaces the credential while keeping the same underlying handle.
	pub fn rebind(self, token: Option<&'a Token>) -> Self {
		Self { token, ..self }
	}

	/// Discards the signing layer and returns the bare handle.
	pub fn into_parent(self) -> D::Handle {
		self.parent
	}

	/// Signs `request`, dispatches it, and returns the raw response.
	pub async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse> {
		self.signer.signature(&mut request, self.token, self.values)?;

		if self.runtime.debug {
			obs::dump_request(&request);
		}

		let response = self.parent.call(request).await.map_err(http::map_http_client_error)?;

		if self.runtime.debug {
			obs::dump_response(&response);
		}

		Ok(response)
	}
}
impl<S, D> Debug for SigningTransport<'_, S, D>
where
	S: ?Sized + Signer,
	D: ?Sized + HttpDispatcher,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SigningTransport")
			.field("token", &self.token)
			.field("values", &self.values)
			.field("runtime", &self.runtime)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::Mutex;
	// crates.io
	use oauth2::http::{Request, header};
	// self
	use super::*;
	use crate::http::{HeaderValue, HttpClientError};

	#[derive(Clone, Debug, Default)]
	struct Echo {
		seen: Arc<Mutex<Vec<HttpRequest>>>,
	}
	impl HttpDispatcher for Echo {
		type Handle = Echo;
		type TransportError = std::io::Error;

		fn dispatcher(&self) -> Self::Handle {
			self.clone()
		}
	}
	impl<'c> AsyncHttpClient<'c> for Echo {
		type Error = HttpClientError<std::io::Error>;
		type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

		fn call(&'c self, request: HttpRequest) -> Self::Future {
			Box::pin(async move {
				let body = request.body().clone();

				self.seen.lock().expect("Recorder lock should not be poisoned.").push(request);

				Ok(HttpResponse::new(body))
			})
		}
	}

	struct Stamp;
	impl Signer for Stamp {
		fn signature(
			&self,
			request: &mut HttpRequest,
			token: Option<&Token>,
			values: Option<&Params>,
		) -> Result<()> {
			let value = token.map(|t| t.access_token.expose().to_owned()).unwrap_or_default();

			request.headers_mut().insert(
				header::AUTHORIZATION,
				HeaderValue::from_str(&value).expect("Fixture header should be valid."),
			);

			if let Some(values) = values {
				crate::params::set_values(request, values)?;
			}

			Ok(())
		}
	}

	fn request() -> HttpRequest {
		Request::builder()
			.method("GET")
			.uri("https://api.provider.test/me")
			.body(b"ping".to_vec())
			.expect("Request fixture should build.")
	}

	#[tokio::test]
	async fn signs_once_and_leaves_dispatcher_untouched() {
		let echo = Echo::default();
		let token = Token::builder("tok").build().expect("Token fixture should build.");
		let extra = crate::params::params([("fields", "id")]);
		let transport = SigningTransport::new(&Stamp, Some(&token), &echo, Runtime::debug())
			.with_values(&extra);
		let response = transport.send(request()).await.expect("Echo dispatch should succeed.");

		assert_eq!(response.body().as_slice(), b"ping");

		let seen = echo.seen.lock().expect("Recorder lock should not be poisoned.");

		assert_eq!(seen.len(), 1);
		assert_eq!(seen[0].headers()[header::AUTHORIZATION], "tok");
		assert_eq!(seen[0].uri().query(), Some("fields=id"));
	}

	#[tokio::test]
	async fn rebinding_swaps_credentials_without_nesting() {
		let echo = Echo::default();
		let first = Token::builder("first").build().expect("Token fixture should build.");
		let second = Token::builder("second").build().expect("Token fixture should build.");
		let transport = SigningTransport::new(&Stamp, Some(&first), &echo, Runtime::default())
			.rebind(Some(&second));

		transport.send(request()).await.expect("Echo dispatch should succeed.");

		let parent: Echo = transport.into_parent();
		let seen = parent.seen.lock().expect("Recorder lock should not be poisoned.");

		assert_eq!(seen.len(), 1);
		assert_eq!(seen[0].headers()[header::AUTHORIZATION], "second");
	}
}
