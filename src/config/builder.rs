// self
use crate::{
	_prelude::*,
	config::{
		DEFAULT_AUTHORIZATION_URL, DEFAULT_TOKEN_URL, DEFAULT_USER_GUID_URL,
		DEFAULT_USER_PROFILE_URL, GUID_PLACEHOLDER, StrategyConfig, StrategyEndpoints,
	},
	error::ConfigError,
};

/// Host-facing option bag using the conventional strategy option names.
///
/// Every endpoint is optional and falls back to Yahoo's default when omitted.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyOptions {
	/// Overrides the authorization endpoint.
	#[serde(rename = "authorizationURL", default, skip_serializing_if = "Option::is_none")]
	pub authorization_url: Option<String>,
	/// Overrides the token endpoint.
	#[serde(rename = "tokenURL", default, skip_serializing_if = "Option::is_none")]
	pub token_url: Option<String>,
	/// OAuth 2.0 client identifier.
	#[serde(rename = "clientID")]
	pub client_id: String,
	/// OAuth 2.0 client secret.
	#[serde(rename = "clientSecret")]
	pub client_secret: String,
	/// Redirect URI registered with Yahoo.
	#[serde(rename = "callbackURL", default, skip_serializing_if = "Option::is_none")]
	pub callback_url: Option<String>,
	/// Overrides the profile endpoint template.
	#[serde(rename = "userProfileURL", default, skip_serializing_if = "Option::is_none")]
	pub user_profile_url: Option<String>,
	/// Overrides the GUID endpoint.
	#[serde(rename = "userGUIDUrl", default, skip_serializing_if = "Option::is_none")]
	pub user_guid_url: Option<String>,
	/// Overrides the scope separator.
	#[serde(rename = "scopeSeparator", default, skip_serializing_if = "Option::is_none")]
	pub scope_separator: Option<String>,
}
impl Debug for StrategyOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StrategyOptions")
			.field("authorization_url", &self.authorization_url)
			.field("token_url", &self.token_url)
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("callback_url", &self.callback_url)
			.field("user_profile_url", &self.user_profile_url)
			.field("user_guid_url", &self.user_guid_url)
			.field("scope_separator", &self.scope_separator)
			.finish()
	}
}

/// Builder for [`StrategyConfig`] values.
#[derive(Clone, Debug)]
pub struct StrategyConfigBuilder {
	options: StrategyOptions,
}
impl StrategyConfigBuilder {
	/// Creates a new builder seeded with the provided client credentials.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self {
			options: StrategyOptions {
				client_id: client_id.into(),
				client_secret: client_secret.into(),
				..Default::default()
			},
		}
	}

	/// Overrides the authorization endpoint.
	pub fn authorization_url(mut self, url: impl Into<String>) -> Self {
		self.options.authorization_url = Some(url.into());

		self
	}

	/// Overrides the token endpoint.
	pub fn token_url(mut self, url: impl Into<String>) -> Self {
		self.options.token_url = Some(url.into());

		self
	}

	/// Sets the redirect URI registered with Yahoo.
	pub fn callback_url(mut self, url: impl Into<String>) -> Self {
		self.options.callback_url = Some(url.into());

		self
	}

	/// Overrides the GUID endpoint.
	pub fn user_guid_url(mut self, url: impl Into<String>) -> Self {
		self.options.user_guid_url = Some(url.into());

		self
	}

	/// Overrides the profile endpoint template; it must contain `:xoauthYahooGuid`.
	pub fn user_profile_url(mut self, template: impl Into<String>) -> Self {
		self.options.user_profile_url = Some(template.into());

		self
	}

	/// Overrides the separator used to join scopes in the authorization URL.
	pub fn scope_separator(mut self, separator: impl Into<String>) -> Self {
		self.options.scope_separator = Some(separator.into());

		self
	}

	/// Consumes the builder, applies defaults, and validates the resulting config.
	pub fn build(self) -> Result<StrategyConfig, ConfigError> {
		let StrategyOptions {
			authorization_url,
			token_url,
			client_id,
			client_secret,
			callback_url,
			user_profile_url,
			user_guid_url,
			scope_separator,
		} = self.options;

		if client_id.trim().is_empty() {
			return Err(ConfigError::MissingClientId);
		}

		let authorization = parse_endpoint(
			"authorization",
			authorization_url.as_deref().unwrap_or(DEFAULT_AUTHORIZATION_URL),
		)?;
		let token = parse_endpoint("token", token_url.as_deref().unwrap_or(DEFAULT_TOKEN_URL))?;
		let user_guid = parse_endpoint(
			"user GUID",
			user_guid_url.as_deref().unwrap_or(DEFAULT_USER_GUID_URL),
		)?;
		let user_profile_template =
			user_profile_url.unwrap_or_else(|| DEFAULT_USER_PROFILE_URL.to_owned());

		parse_endpoint("user profile", &user_profile_template)?;

		if !user_profile_template.contains(GUID_PLACEHOLDER) {
			return Err(ConfigError::MissingGuidPlaceholder {
				placeholder: GUID_PLACEHOLDER,
				url: user_profile_template,
			});
		}

		let callback_url =
			callback_url.as_deref().map(|url| parse_endpoint("callback", url)).transpose()?;
		let basic_auth_header = super::basic_auth_header(&client_id, &client_secret);

		Ok(StrategyConfig {
			endpoints: StrategyEndpoints { authorization, token, user_guid, user_profile_template },
			client_id,
			client_secret,
			callback_url,
			scope_separator: scope_separator.unwrap_or_else(|| " ".into()),
			basic_auth_header,
		})
	}
}
impl From<StrategyOptions> for StrategyConfigBuilder {
	fn from(options: StrategyOptions) -> Self {
		Self { options }
	}
}

fn parse_endpoint(endpoint: &'static str, url: &str) -> Result<Url, ConfigError> {
	Url::parse(url).map_err(|source| ConfigError::InvalidUrl {
		endpoint,
		url: url.to_owned(),
		source,
	})
}
