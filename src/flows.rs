//! Protocol engines implementing [`OAuthClient`](crate::client::OAuthClient).
//!
//! [`OAuth2`] drives the authorization-code redirect plus the password, client-credentials,
//! refresh, and revocation grants. [`OAuth1`] drives the temporary-credential handshake and
//! HMAC-SHA1 signing. Both share the helpers below for form posts, callback parsing, and the
//! correlation round trip.

pub mod oauth1;
pub mod oauth2;

pub use self::{oauth1::OAuth1, oauth2::OAuth2};

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	cache::{self, CorrelationRecord, StateCache},
	error::ConfigError,
	http::{HeaderValue, HttpRequest, Method, Request, header},
	params::{self, FORM_CONTENT_TYPE, Params},
	response::Normalized,
};

/// Alphanumeric string drawn from the thread-local CSPRNG.
pub fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

/// Non-empty value of `key` in a callback query.
pub fn query_value<'q>(query: &'q Params, key: &str) -> Option<&'q str> {
	query.get(key).map(String::as_str).filter(|value| !value.is_empty())
}

pub(crate) fn form_post(url: &Url, values: &Params) -> Result<HttpRequest> {
	let body = params::encode(values).into_bytes();

	Request::builder()
		.method(Method::POST)
		.uri(url.as_str())
		.header(header::CONTENT_TYPE, FORM_CONTENT_TYPE)
		.header(header::CONTENT_LENGTH, HeaderValue::from(body.len()))
		.body(body)
		.map_err(|e| ConfigError::from(e).into())
}

pub(crate) fn header_value(value: &str) -> Result<HeaderValue> {
	HeaderValue::from_str(value)
		.map_err(|e| ConfigError::from(::oauth2::http::Error::from(e)).into())
}

// Removes `key` and keeps it only when the provider sent a string.
pub(crate) fn take_string(raw: &mut Normalized, key: &str) -> Option<String> {
	match raw.remove(key) {
		Some(Value::String(value)) => Some(value),
		_ => None,
	}
}

pub(crate) async fn store_correlation(
	cache: &dyn StateCache,
	key: &str,
	secret: Option<String>,
	payload: Option<String>,
) -> Result<()> {
	let record = CorrelationRecord::pending(secret.map(Into::into), payload);

	cache::store_pending(cache, key, &record).await
}

#[cfg(test)]
pub(crate) mod testing {
	// std
	use std::sync::Mutex;
	// self
	use super::*;
	use crate::http::{AsyncHttpClient, HttpClientError, HttpDispatcher, HttpResponse, StatusCode};

	/// Replays canned responses and records every request it receives.
	#[derive(Clone, Debug, Default)]
	pub(crate) struct Scripted {
		pub(crate) seen: Arc<Mutex<Vec<HttpRequest>>>,
		replies: Arc<Mutex<Vec<(u16, &'static str, String)>>>,
	}
	impl Scripted {
		pub(crate) fn reply(self, status: u16, content_type: &'static str, body: &str) -> Self {
			self.replies
				.lock()
				.expect("Reply lock should not be poisoned.")
				.push((status, content_type, body.to_owned()));

			self
		}

		pub(crate) fn with_requests<R>(&self, f: impl FnOnce(&[HttpRequest]) -> R) -> R {
			f(&self.seen.lock().expect("Recorder lock should not be poisoned."))
		}
	}
	impl HttpDispatcher for Scripted {
		type Handle = Scripted;
		type TransportError = std::io::Error;

		fn dispatcher(&self) -> Self::Handle {
			self.clone()
		}
	}
	impl<'c> AsyncHttpClient<'c> for Scripted {
		type Error = HttpClientError<std::io::Error>;
		type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

		fn call(&'c self, request: HttpRequest) -> Self::Future {
			Box::pin(async move {
				self.seen.lock().expect("Recorder lock should not be poisoned.").push(request);

				let mut replies = self.replies.lock().expect("Reply lock should not be poisoned.");

				if replies.is_empty() {
					return Err(HttpClientError::Other("no scripted reply".into()));
				}

				let (status, content_type, body) = replies.remove(0);
				let mut response = HttpResponse::new(body.into_bytes());

				*response.status_mut() =
					StatusCode::from_u16(status).expect("Scripted status should be valid.");
				response.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));

				Ok(response)
			})
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn random_strings_are_alphanumeric() {
		let value = random_string(48);

		assert_eq!(value.len(), 48);
		assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(value, random_string(48));
	}

	#[test]
	fn form_posts_declare_length_and_media_type() {
		let url = Url::parse("https://provider.test/token").expect("Fixture URL should parse.");
		let request = form_post(&url, &params::params([("grant_type", "password"), ("username", "a b")]))
			.expect("Form post should build.");

		assert_eq!(request.method(), Method::POST);
		assert_eq!(request.body().as_slice(), b"grant_type=password&username=a+b");
		assert_eq!(request.headers()[header::CONTENT_LENGTH], "32");
		assert!(params::is_form(&request));
	}

	#[test]
	fn take_string_drops_non_strings() {
		let mut raw = Normalized::new();

		raw.insert("a".into(), Value::from("x"));
		raw.insert("b".into(), Value::from(1));

		assert_eq!(take_string(&mut raw, "a").as_deref(), Some("x"));
		assert_eq!(take_string(&mut raw, "b"), None);
		assert!(raw.is_empty());
	}
}
