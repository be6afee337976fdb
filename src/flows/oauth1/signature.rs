//! HMAC-SHA1 request signing (RFC 5849 section 3.4).
//!
//! Signing is split in two phases. A [`Seed`] attaches protocol parameters such as
//! `oauth_callback` or `oauth_verifier` to a request that has not been signed yet;
//! [`finalize`] later folds the seed, the request parameters, and the credentials into the
//! final `Authorization` header.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::Sha1;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	flows,
	http::{HttpRequest, header},
	params::{self, Params, merge_values},
};

/// `oauth_signature_method` value.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
/// `oauth_version` value.
pub const VERSION: &str = "1.0";
/// Length of the generated `oauth_nonce`.
pub const NONCE_LEN: usize = 16;

// RFC 3986 unreserved characters stay literal.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Protocol parameters attached to a request before it is signed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Seed(pub Params);
impl Seed {
	/// Creates a seed from literal pairs.
	pub fn new<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self(params::params(pairs))
	}

	/// Attaches the seed to `request`; the signer consumes it.
	pub fn attach(self, request: &mut HttpRequest) {
		request.extensions_mut().insert(self);
	}

	/// Removes the seed from `request`, if one was attached.
	pub fn take(request: &mut HttpRequest) -> Option<Self> {
		request.extensions_mut().remove::<Self>()
	}
}

/// Secrets and protocol parameters used by [`finalize`].
#[derive(Clone, Debug)]
pub struct Signing<'a> {
	/// Authorization scheme including its trailing space (`"OAuth "`).
	pub scheme: &'a str,
	/// `oauth_*` parameters; `oauth_signature` is added by [`finalize`].
	pub oauth: Params,
	/// Client secret.
	pub consumer_secret: &'a str,
	/// Token secret; empty without a token.
	pub token_secret: &'a str,
}

/// Percent-encodes `value`, leaving only RFC 3986 unreserved characters literal.
pub fn percent_encode(value: &str) -> String {
	utf8_percent_encode(value, UNRESERVED).to_string()
}

/// Canonical parameter string: encoded pairs sorted by key then value, joined with `&`.
pub fn normalize_parameters(parameters: &Params) -> String {
	let mut pairs = parameters
		.iter()
		.map(|(k, v)| (percent_encode(k), percent_encode(v)))
		.collect::<Vec<_>>();

	pairs.sort();

	pairs.into_iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&")
}

/// Signature base string.
pub fn base_string(method: &str, base_url: &Url, parameters: &Params) -> String {
	format!(
		"{}&{}&{}",
		method.to_ascii_uppercase(),
		percent_encode(base_url.as_str()),
		percent_encode(&normalize_parameters(parameters))
	)
}

/// `encode(consumer secret) & encode(token secret)`.
pub fn signing_key(consumer_secret: &str, token_secret: &str) -> String {
	format!("{}&{}", percent_encode(consumer_secret), percent_encode(token_secret))
}

/// Base64 HMAC-SHA1 of `base` under `key`.
pub fn sign(key: &str, base: &str) -> Result<String> {
	let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes()).map_err(|_| ConfigError::SigningKey)?;

	mac.update(base.as_bytes());

	Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Header value: scheme followed by sorted `key="value"` pairs joined with `", "`.
pub fn authorization_header(scheme: &str, oauth: &Params) -> String {
	let pairs = oauth
		.iter()
		.map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
		.collect::<Vec<_>>()
		.join(", ");

	format!("{scheme}{pairs}")
}

/// Merges `values` into the request, signs it, and installs the `Authorization` header.
///
/// The signature covers the query, the form body (form-encoded requests only), the merged
/// values, and every `oauth_*` parameter. The query is excluded from the base URL.
pub fn finalize(request: &mut HttpRequest, signing: Signing, values: Option<&Params>) -> Result<()> {
	if let Some(values) = values {
		params::set_values(request, values)?;
	}

	let Signing { scheme, mut oauth, consumer_secret, token_secret } = signing;
	let parameters =
		merge_values(false, params::request_query(request), [&params::request_form(request), &oauth]);
	let base_url = params::request_base_url(request)?;
	let base = base_string(request.method().as_str(), &base_url, &parameters);

	oauth.insert("oauth_signature".into(), sign(&signing_key(consumer_secret, token_secret), &base)?);

	request
		.headers_mut()
		.insert(header::AUTHORIZATION, flows::header_value(&authorization_header(scheme, &oauth))?);

	Ok(())
}
