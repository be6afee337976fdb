#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	future::Future,
	pin::Pin,
	sync::{Arc, Mutex},
};
// self
use oauth_relay::{
	auth::ProviderId,
	config::Config,
	http::{
		AsyncHttpClient, HeaderMap, HeaderValue, HttpClientError, HttpDispatcher, HttpRequest,
		HttpResponse, StatusCode, header,
	},
	params::{Params, parse_query},
	provider::{Endpoint, EndpointBuilder},
	url::Url,
};

pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";
pub const REDIRECT_URI: &str = "https://app.test/callback";

/// Snapshot of one request received by [`FakeProvider`].
#[derive(Clone, Debug)]
pub struct Recorded {
	pub method: String,
	pub uri: String,
	pub headers: HeaderMap,
	pub body: String,
}
impl Recorded {
	pub fn form(&self) -> Params {
		parse_query(&self.body)
	}

	pub fn query(&self) -> Params {
		Url::parse(&self.uri)
			.expect("Recorded URI should parse.")
			.query()
			.map(parse_query)
			.unwrap_or_default()
	}

	pub fn authorization(&self) -> &str {
		self.headers
			.get(header::AUTHORIZATION)
			.expect("Request should carry an Authorization header.")
			.to_str()
			.expect("Authorization header should be ASCII.")
	}
}

/// In-process provider that replays queued replies and records every request.
#[derive(Clone, Debug, Default)]
pub struct FakeProvider {
	requests: Arc<Mutex<Vec<Recorded>>>,
	replies: Arc<Mutex<VecDeque<(u16, &'static str, String)>>>,
}
impl FakeProvider {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn reply(&self, status: u16, content_type: &'static str, body: &str) -> &Self {
		self.replies
			.lock()
			.expect("Reply queue lock should not be poisoned.")
			.push_back((status, content_type, body.to_owned()));

		self
	}

	pub fn requests(&self) -> Vec<Recorded> {
		self.requests.lock().expect("Request log lock should not be poisoned.").clone()
	}
}
impl HttpDispatcher for FakeProvider {
	type Handle = FakeProvider;
	type TransportError = std::io::Error;

	fn dispatcher(&self) -> Self::Handle {
		self.clone()
	}
}
impl<'c> AsyncHttpClient<'c> for FakeProvider {
	type Error = HttpClientError<std::io::Error>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.requests.lock().expect("Request log lock should not be poisoned.").push(Recorded {
				method: request.method().to_string(),
				uri: request.uri().to_string(),
				headers: request.headers().clone(),
				body: String::from_utf8_lossy(request.body()).into_owned(),
			});

			let Some((status, content_type, body)) =
				self.replies.lock().expect("Reply queue lock should not be poisoned.").pop_front()
			else {
				return Err(HttpClientError::Other("fake provider has no queued reply".into()));
			};
			let mut response = HttpResponse::new(body.into_bytes());

			*response.status_mut() = StatusCode::from_u16(status).expect("Reply status should be valid.");
			response.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));

			Ok(response)
		})
	}
}

pub fn url(value: &str) -> Url {
	Url::parse(value).expect("Fixture URL should parse.")
}

pub fn endpoint_builder(name: &str) -> EndpointBuilder {
	Endpoint::builder(ProviderId::new(name).expect("Provider identifier should be valid."))
		.request_token_url(url("https://provider.test/oauth/request_token"))
		.authorize_url(url("https://provider.test/oauth/authorize?display=page"))
		.access_token_url(url("https://provider.test/oauth/token"))
}

pub fn config(endpoint: Endpoint, provider: &FakeProvider) -> Config<FakeProvider> {
	Config::with_http_client(endpoint, CLIENT_ID, provider.clone())
		.with_client_secret(CLIENT_SECRET)
		.with_redirect_uri(REDIRECT_URI)
}

pub fn query_of(url: &Url) -> Params {
	url.query().map(parse_query).unwrap_or_default()
}
