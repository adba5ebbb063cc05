//! Provider-agnostic user profile produced from Yahoo's profile payload.
//!
//! Yahoo answers the profile endpoint with `{"profile": {...}}`. Fields are read from that
//! envelope when present and from the top-level object otherwise, so proxies that unwrap the
//! envelope keep working. Every absent optional field degrades to an empty string or empty
//! list instead of failing the login.

// self
use crate::{_prelude::*, config::PROVIDER_NAME};

/// Email `type` assigned to addresses Yahoo marks as primary.
pub const PRIMARY_EMAIL_TYPE: &str = "account";
/// Email `type` assigned when Yahoo supplies none.
pub const UNKNOWN_EMAIL_TYPE: &str = "unknown";

/// Normalized identity handed to the host's verify hook.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedProfile {
	/// Constant provider tag (`yahoo`).
	pub provider: String,
	/// GUID resolved from the GUID endpoint.
	pub id: String,
	/// Given and family names joined by a single space.
	pub display_name: String,
	/// Structured name.
	pub name: ProfileName,
	/// Email addresses in provider order.
	pub emails: Vec<ProfileEmail>,
	/// Always exactly one entry.
	pub photos: Vec<ProfilePhoto>,
	/// Profile response body exactly as received.
	#[serde(rename = "_raw")]
	pub raw: String,
	/// Decoded profile response with `id` overwritten by the resolved GUID.
	#[serde(rename = "_json")]
	pub json: JsonMap<String, JsonValue>,
}
impl NormalizedProfile {
	/// Builds a profile from the decoded payload.
	///
	/// `json` must already carry the authoritative GUID in its `id` field; `guid` is copied
	/// into [`NormalizedProfile::id`].
	pub fn from_payload(guid: &str, raw: String, json: JsonMap<String, JsonValue>) -> Self {
		let fields = match json.get("profile") {
			Some(JsonValue::Object(profile)) => profile,
			_ => &json,
		};
		let given_name = str_field(fields, "givenName").to_owned();
		let family_name = str_field(fields, "familyName").to_owned();
		let emails = match fields.get("emails") {
			Some(JsonValue::Array(entries)) =>
				entries.iter().map(ProfileEmail::from_entry).collect(),
			_ => Vec::new(),
		};
		let image_url = match fields.get("image") {
			Some(JsonValue::Object(image)) => str_field(image, "imageUrl"),
			_ => "",
		};
		let photos = vec![ProfilePhoto { value: image_url.to_owned() }];

		Self {
			provider: PROVIDER_NAME.into(),
			id: guid.to_owned(),
			display_name: format!("{given_name} {family_name}"),
			name: ProfileName { given_name, family_name },
			emails,
			photos,
			raw,
			json,
		}
	}
}

/// Structured name with empty-string defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileName {
	/// Given (first) name.
	pub given_name: String,
	/// Family (last) name.
	pub family_name: String,
}

/// Single email address with its classification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEmail {
	/// Address as reported by Yahoo (`handle`).
	pub value: String,
	/// `account` for the primary address, otherwise Yahoo's `type` or `unknown`.
	#[serde(rename = "type")]
	pub kind: String,
}
impl ProfileEmail {
	fn from_entry(entry: &JsonValue) -> Self {
		let empty = JsonMap::new();
		let entry = entry.as_object().unwrap_or(&empty);
		let kind = if entry.get("primary").and_then(JsonValue::as_bool) == Some(true) {
			PRIMARY_EMAIL_TYPE
		} else {
			match str_field(entry, "type") {
				"" => UNKNOWN_EMAIL_TYPE,
				kind => kind,
			}
		};

		Self { value: str_field(entry, "handle").to_owned(), kind: kind.to_owned() }
	}
}

/// Photo URL entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePhoto {
	/// Image URL, or empty when Yahoo has none.
	pub value: String,
}

fn str_field<'a>(object: &'a JsonMap<String, JsonValue>, key: &str) -> &'a str {
	object.get(key).and_then(JsonValue::as_str).unwrap_or_default()
}
