//! Immutable strategy configuration resolved once at construction time.
//!
//! [`StrategyConfig`] carries Yahoo's endpoint set, the client credentials, and the
//! precomputed `Authorization: Basic` header used for every token exchange. Hosts either
//! deserialize a [`StrategyOptions`] bag (using the conventional option names) or assemble
//! the config through [`StrategyConfigBuilder`]. Omitted endpoints fall back to Yahoo's fixed
//! defaults.

/// Builder API and host-facing options.
pub mod builder;

pub use builder::*;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, error::ConfigError};

/// Default authorization endpoint.
pub const DEFAULT_AUTHORIZATION_URL: &str = "https://api.login.yahoo.com/oauth2/request_auth";
/// Default token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://api.login.yahoo.com/oauth2/get_token";
/// Default user-GUID endpoint.
pub const DEFAULT_USER_GUID_URL: &str = "https://social.yahooapis.com/v1/me/guid?format=json";
/// Default user-profile endpoint template.
pub const DEFAULT_USER_PROFILE_URL: &str =
	"https://social.yahooapis.com/v1/user/:xoauthYahooGuid/profile?format=json";
/// Placeholder substituted with the resolved GUID in the profile URL template.
pub const GUID_PLACEHOLDER: &str = ":xoauthYahooGuid";
/// Provider tag stamped on every normalized profile.
pub const PROVIDER_NAME: &str = "yahoo";

/// Endpoint set used by the strategy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyEndpoints {
	/// Authorization endpoint end-users are redirected to.
	pub authorization: Url,
	/// Token endpoint used for the authorization-code exchange.
	pub token: Url,
	/// Endpoint returning `{"guid": {"value": ...}}` for the token's owner.
	pub user_guid: Url,
	/// Profile endpoint template containing [`GUID_PLACEHOLDER`].
	pub user_profile_template: String,
}

/// Immutable strategy configuration shared by every concurrent authentication.
#[derive(Clone)]
pub struct StrategyConfig {
	/// Endpoint definitions.
	pub endpoints: StrategyEndpoints,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: String,
	/// Redirect URI registered with Yahoo, if any.
	pub callback_url: Option<Url>,
	/// Separator used when joining requested scopes.
	pub scope_separator: String,
	basic_auth_header: String,
}
impl StrategyConfig {
	/// Creates a new builder for the provided client credentials.
	pub fn builder(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> StrategyConfigBuilder {
		StrategyConfigBuilder::new(client_id, client_secret)
	}

	/// Validates host-supplied options and applies provider defaults.
	pub fn from_options(options: StrategyOptions) -> Result<Self, ConfigError> {
		StrategyConfigBuilder::from(options).build()
	}

	/// `Authorization` header value sent with every token exchange.
	pub fn basic_auth_header(&self) -> &str {
		&self.basic_auth_header
	}

	/// Substitutes `guid` into the profile URL template.
	///
	/// Only the first placeholder is replaced, and the GUID is inserted verbatim.
	pub fn user_profile_url(&self, guid: &str) -> Result<Url, url::ParseError> {
		Url::parse(&self.endpoints.user_profile_template.replacen(GUID_PLACEHOLDER, guid, 1))
	}
}
impl Debug for StrategyConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StrategyConfig")
			.field("endpoints", &self.endpoints)
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("callback_url", &self.callback_url)
			.field("scope_separator", &self.scope_separator)
			.finish()
	}
}

/// Encodes `client_id:client_secret` as an HTTP Basic credential.
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
	format!("Basic {}", STANDARD.encode(format!("{client_id}:{client_secret}")))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn basic_auth_header_encodes_raw_credentials() {
		assert_eq!(basic_auth_header("client", "secret"), "Basic Y2xpZW50OnNlY3JldA==");
		// Reserved characters are encoded as-is, without form-urlencoding first.
		assert_eq!(basic_auth_header("a b", "c:d"), "Basic YSBiOmM6ZA==");
	}

	#[test]
	fn profile_url_substitutes_guid_once() {
		let config = StrategyConfig::builder("client", "secret")
			.user_profile_url("https://example.com/u/:xoauthYahooGuid/p?g=:xoauthYahooGuid")
			.build()
			.expect("Config with a placeholder template should build.");
		let url = config.user_profile_url("G1").expect("Substituted URL should parse.");

		assert_eq!(url.as_str(), "https://example.com/u/G1/p?g=:xoauthYahooGuid");
	}

	#[test]
	fn debug_redacts_client_secret() {
		let config = StrategyConfig::builder("client", "very-secret")
			.build()
			.expect("Default config should build.");
		let rendered = format!("{config:?}");

		assert!(!rendered.contains("very-secret"));
		assert!(!rendered.contains(config.basic_auth_header()));
	}
}
