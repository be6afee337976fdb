//! Identity records produced by provider adapters after a profile fetch.

// self
use crate::_prelude::*;

/// Normalized identity of the end user behind a token.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
	/// Provider-scoped user identifier.
	pub id: String,
	/// Login handle.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub username: String,
	/// Display nickname.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub nickname: String,
	/// Full name.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub name: String,
	/// Family name.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub family_name: String,
	/// Given name.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub given_name: String,
	/// Avatar URL.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub avatar: String,
	/// Provider-reported gender label.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub gender: String,
	/// BCP 47 style locale, see [`format_locale`].
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub locale: String,
	/// Free-form profile description.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub description: String,
	/// Profile URL.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub link: String,
	/// Verified or unverified contact handles.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub auths: Vec<Auth>,
	/// Unmapped profile fields.
	#[serde(default, skip_serializing_if = "Map::is_empty")]
	pub raw: Map<String, Value>,
	/// Birthday, when disclosed.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub birthday: Option<OffsetDateTime>,
	/// Account creation instant at the provider.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created: Option<OffsetDateTime>,
	/// Last profile update instant.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated: Option<OffsetDateTime>,
}

/// Contact handle (email, phone, ...) attached to a [`User`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
	/// Handle kind, e.g. `email`.
	#[serde(rename = "type")]
	pub kind: String,
	/// Handle value.
	pub value: String,
	/// Whether the provider verified the handle.
	#[serde(default)]
	pub verified: bool,
}

/// Normalizes provider locale labels into `language-Script-REGION` form.
///
/// Underscores become dashes, the language is lowercased, a two-part tag uppercases the
/// region, and longer tags title-case the script and uppercase the remaining subtags.
pub fn format_locale(locale: &str) -> String {
	let mut parts: Vec<String> = locale.replace('_', "-").split('-').map(str::to_owned).collect();

	parts[0] = parts[0].to_lowercase();

	match parts.len() {
		1 => {},
		2 => parts[1] = parts[1].to_uppercase(),
		_ => {
			parts[1] = title_case(&parts[1]);

			for part in parts.iter_mut().skip(2) {
				*part = part.to_uppercase();
			}
		},
	}

	parts.join("-")
}

fn title_case(part: &str) -> String {
	let mut chars = part.chars();

	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
		None => String::new(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn locales_normalize_case_and_separators() {
		assert_eq!(format_locale("EN"), "en");
		assert_eq!(format_locale("en_us"), "en-US");
		assert_eq!(format_locale("zh_hans_cn"), "zh-Hans-CN");
		assert_eq!(format_locale("ZH-HANT-tw-x"), "zh-Hant-TW-X");
		assert_eq!(format_locale(""), "");
	}

	#[test]
	fn auth_kind_serializes_as_type() {
		let auth = Auth { kind: "email".into(), value: "a@example.com".into(), verified: true };
		let json = serde_json::to_value(&auth).expect("Auth record should serialize.");

		assert_eq!(json, serde_json::json!({ "type": "email", "value": "a@example.com", "verified": true }));
	}
}
