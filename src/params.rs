//! Single-valued request parameters and the helpers that read and rewrite them on requests.
//!
//! Every key holds exactly one value; when a wire form repeats a key, the first occurrence
//! wins. Merges are ordered: later sources override earlier ones.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{HeaderValue, HttpRequest, header},
};

/// Media type of every token-endpoint request body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Ordered, single-valued parameter set.
pub type Params = BTreeMap<String, String>;

/// Merges `merges` into `base` in order, later keys overriding earlier ones.
///
/// When `delete_empty` is set, keys whose final value is empty are removed, which lets
/// callers suppress a default by passing an empty override.
pub fn merge_values<'a, I>(delete_empty: bool, mut base: Params, merges: I) -> Params
where
	I: IntoIterator<Item = &'a Params>,
{
	for merge in merges {
		base.extend(merge.iter().map(|(k, v)| (k.clone(), v.clone())));
	}

	if delete_empty {
		base.retain(|_, v| !v.is_empty());
	}

	base
}

/// Parses a URL-encoded query or form body; the first value of a repeated key wins.
pub fn parse_query(query: &str) -> Params {
	let mut params = Params::new();

	for (k, v) in form_urlencoded::parse(query.as_bytes()) {
		params.entry(k.into_owned()).or_insert_with(|| v.into_owned());
	}

	params
}

/// Encodes parameters as `application/x-www-form-urlencoded`, sorted by key.
pub fn encode(params: &Params) -> String {
	form_urlencoded::Serializer::new(String::new()).extend_pairs(params.iter()).finish()
}

/// Returns `true` when the request declares a form-encoded body.
pub fn is_form(request: &HttpRequest) -> bool {
	request
		.headers()
		.get(header::CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.split(';').next())
		.is_some_and(|media| media.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

/// Query parameters of the request URI.
pub fn request_query(request: &HttpRequest) -> Params {
	request.uri().query().map(parse_query).unwrap_or_default()
}

/// Form-body parameters; empty unless the request is form-encoded.
pub fn request_form(request: &HttpRequest) -> Params {
	if is_form(request) { parse_query(&String::from_utf8_lossy(request.body())) } else { Params::new() }
}

/// Request URL with query and fragment removed.
pub fn request_base_url(request: &HttpRequest) -> Result<Url> {
	let mut url = Url::parse(&request.uri().to_string()).map_err(ConfigError::from)?;

	url.set_query(None);
	url.set_fragment(None);

	Ok(url)
}

/// Merges `values` into the form body when the request is form-encoded, else into the query.
///
/// The body is re-encoded and `Content-Length` updated to match.
pub fn set_values(request: &mut HttpRequest, values: &Params) -> Result<()> {
	if values.is_empty() {
		return Ok(());
	}

	if is_form(request) {
		let body = merge_values(false, request_form(request), [values]);

		set_form_body(request, &body);
	} else {
		let query = merge_values(false, request_query(request), [values]);

		set_query(request, &query)?;
	}

	Ok(())
}

/// Replaces the request body with `params` encoded as a form.
pub fn set_form_body(request: &mut HttpRequest, params: &Params) {
	let body = encode(params).into_bytes();

	request.headers_mut().insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
	*request.body_mut() = body;
}

/// Replaces the request query with `params`.
pub fn set_query(request: &mut HttpRequest, params: &Params) -> Result<()> {
	let mut url = Url::parse(&request.uri().to_string()).map_err(ConfigError::from)?;

	if params.is_empty() {
		url.set_query(None);
	} else {
		url.set_query(Some(&encode(params)));
	}

	*request.uri_mut() = url.as_str().parse().map_err(ConfigError::from)?;

	Ok(())
}

/// Appends `params` to `url`, overriding keys already present in its query.
pub fn with_query(mut url: Url, params: &Params) -> Url {
	let merged = merge_values(true, url.query().map(parse_query).unwrap_or_default(), [params]);

	if merged.is_empty() {
		url.set_query(None);
	} else {
		url.set_query(Some(&encode(&merged)));
	}

	url
}

/// Builds a [`Params`] from literal pairs.
pub fn params<I, K, V>(pairs: I) -> Params
where
	I: IntoIterator<Item = (K, V)>,
	K: Into<String>,
	V: Into<String>,
{
	pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::Request;
	// self
	use super::*;

	#[test]
	fn merges_override_in_order_and_drop_empties() {
		let base = params([("a", "1"), ("b", "2")]);
		let merged = merge_values(true, base.clone(), [&params([("b", "3")]), &params([("a", "")])]);

		assert_eq!(merged, params([("b", "3")]));

		let kept = merge_values(false, base, [&params([("a", "")])]);

		assert_eq!(kept.get("a").map(String::as_str), Some(""));
	}

	#[test]
	fn parse_keeps_first_value_and_decodes() {
		let parsed = parse_query("a=1&a=2&msg=hello+world&sym=%26");

		assert_eq!(parsed, params([("a", "1"), ("msg", "hello world"), ("sym", "&")]));
		assert_eq!(encode(&parsed), "a=1&msg=hello+world&sym=%26");
	}

	#[test]
	fn set_values_targets_body_for_forms() {
		let mut request = Request::builder()
			.method("POST")
			.uri("https://provider.test/token?x=1")
			.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded; charset=utf-8")
			.body(b"grant_type=password".to_vec())
			.expect("Request fixture should build.");

		set_values(&mut request, &params([("client_id", "abc")])).expect("Body merge should work.");

		assert_eq!(request.body().as_slice(), b"client_id=abc&grant_type=password");
		assert_eq!(request.headers()[header::CONTENT_LENGTH], "33");
		assert_eq!(request.uri().query(), Some("x=1"));
	}

	#[test]
	fn set_values_targets_query_otherwise() {
		let mut request = Request::builder()
			.method("GET")
			.uri("https://provider.test/me?fields=id")
			.body(Vec::new())
			.expect("Request fixture should build.");

		set_values(&mut request, &params([("access_token", "t k")])).expect("Query merge should work.");

		assert_eq!(request.uri().query(), Some("access_token=t+k&fields=id"));
		assert!(request.body().is_empty());
		assert_eq!(
			request_base_url(&request).expect("Base URL should parse.").as_str(),
			"https://provider.test/me"
		);
	}

	#[test]
	fn with_query_merges_into_existing_urls() {
		let url = Url::parse("https://provider.test/authorize?display=page&x=")
			.expect("Fixture URL should parse.");
		let url = with_query(url, &params([("state", "s"), ("display", "popup")]));

		assert_eq!(url.as_str(), "https://provider.test/authorize?display=popup&state=s");
	}
}
