//! Provider response normalization.
//!
//! Providers answer token and profile calls with JSON, XML, form-encoded, or JSONP-wrapped
//! bodies and report failures either through the status line or through error fields inside
//! a 200 body. [`normalize`] folds all of those shapes into one [`Normalized`] map and
//! classifies failures so callers never mistake an error body for success.

mod xml;

// std
use std::sync::LazyLock;
// crates.io
use regex::Regex;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	error::ResponseError,
	http::{HttpResponse, MAX_BODY_BYTES, header},
};

/// Canonical key/value view of a provider response.
pub type Normalized = Map<String, Value>;

/// Error fields every provider is checked for, in priority order.
pub const ERROR_FIELDS: [&str; 3] = ["error_description", "error", "errors"];

static JSONP: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?s)^[0-9a-zA-Z._]+\((.*)\);?$").expect("JSONP pattern should compile.")
});

/// Normalizes a dispatched response.
pub fn normalize_response(response: &HttpResponse, extra_error_fields: &[String]) -> Result<Normalized> {
	let content_type = response.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok());

	normalize(response.status().as_u16(), content_type, response.body(), extra_error_fields)
}

/// Normalizes a raw body given its status and declared `Content-Type`.
///
/// Bodies beyond [`MAX_BODY_BYTES`] are truncated. Error fields are scanned in
/// [`ERROR_FIELDS`] order followed by `extra_error_fields`; the first hit fails with a
/// provider error (status clamped to at least 400). Without an error field, a status outside
/// `200..=299` fails with a status error.
pub fn normalize(
	status: u16,
	content_type: Option<&str>,
	body: &[u8],
	extra_error_fields: &[String],
) -> Result<Normalized> {
	let body = &body[..body.len().min(MAX_BODY_BYTES)];
	let body = String::from_utf8_lossy(body);
	let data = parse_body(unwrap_jsonp(body.trim()), &media_subtype(content_type))?;
	let fields = ERROR_FIELDS.into_iter().chain(extra_error_fields.iter().map(String::as_str));

	for field in fields {
		if let Some(message) = data.get(field).and_then(|value| error_message(field, value)) {
			return Err(Error::provider(message, status));
		}
	}

	if !(200..=299).contains(&status) {
		return Err(Error::status_code(status));
	}

	Ok(data)
}

fn unwrap_jsonp(body: &str) -> &str {
	if body.len() > 2 && (body.ends_with(')') || body.ends_with(");")) {
		if let Some(inner) = JSONP.captures(body).and_then(|c| c.get(1)) {
			return inner.as_str().trim();
		}
	}

	body
}

fn media_subtype(content_type: Option<&str>) -> String {
	content_type
		.and_then(|value| value.split(';').next())
		.and_then(|media| media.trim().split_once('/'))
		.map(|(_, subtype)| subtype.to_ascii_lowercase())
		.unwrap_or_default()
}

fn parse_body(body: &str, subtype: &str) -> Result<Normalized> {
	let mut data = Normalized::new();

	if body.len() < 2 {
		data.insert("result".into(), Value::String(body.into()));

		return Ok(data);
	}
	if body.starts_with('<') && body.ends_with('>') && matches!(subtype, "xml" | "rss+xml") {
		return Ok(xml::fold(body)?);
	}
	if matches!(subtype, "x-www-form-urlencoded" | "plain") || !body.starts_with('{') {
		return Ok(parse_form(body));
	}

	let de = &mut serde_json::Deserializer::from_str(body);

	serde_path_to_error::deserialize(de).map_err(|source| ResponseError::Json { source }.into())
}

fn parse_form(body: &str) -> Normalized {
	let mut data = Normalized::new();

	for (k, v) in form_urlencoded::parse(body.as_bytes()) {
		let v = Value::String(v.into_owned());

		match data.get_mut(k.as_ref()) {
			Some(Value::Array(values)) => values.push(v),
			Some(existing) => {
				let first = existing.take();

				*existing = Value::Array(vec![first, v]);
			},
			None => {
				data.insert(k.into_owned(), v);
			},
		}
	}

	data
}

fn error_message(field: &str, value: &Value) -> Option<String> {
	match value {
		Value::Null => None,
		Value::String(s) if s.is_empty() => None,
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => numeric_message(field, n.as_f64().unwrap_or_default()),
		other => Some(format!("oauth error: {field}: {other}")),
	}
}

// Providers use `0` as a success sentinel.
fn numeric_message(field: &str, n: f64) -> Option<String> {
	if n == 0.0 { None } else { Some(format!("oauth error: {field}: {n:.0}")) }
}
