//! Tokens minted by the authorization-code exchange.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Tokens returned by Yahoo's token endpoint for a single authorization code.
///
/// The grant is handed to the verify hook as-is; nothing in this crate stores or refreshes it.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessTokenGrant {
	/// Bearer token used for the GUID and profile lookups.
	pub access_token: TokenSecret,
	/// Refresh token, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Token type reported by the provider (normally `bearer`).
	pub token_type: String,
	/// Instant the grant was received.
	pub issued_at: OffsetDateTime,
	/// Expiry derived from `expires_in`, when the provider reported one.
	pub expires_at: Option<OffsetDateTime>,
	/// GUID hint Yahoo attaches to token responses (`xoauth_yahoo_guid`).
	///
	/// Informational only: profile resolution always asks the GUID endpoint.
	pub xoauth_yahoo_guid: Option<String>,
}
impl AccessTokenGrant {
	/// Creates a grant for a bare access token issued now.
	pub fn new(access_token: impl Into<TokenSecret>) -> Self {
		Self {
			access_token: access_token.into(),
			refresh_token: None,
			token_type: "bearer".into(),
			issued_at: OffsetDateTime::now_utc(),
			expires_at: None,
			xoauth_yahoo_guid: None,
		}
	}

	/// Attaches a refresh token.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(refresh_token.into());

		self
	}

	/// Derives the expiry from a relative lifetime measured from `issued_at`.
	pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
		self.expires_at = Some(self.issued_at + expires_in);

		self
	}
}
impl Debug for AccessTokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessTokenGrant")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("xoauth_yahoo_guid", &self.xoauth_yahoo_guid)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn expiry_tracks_issued_at() {
		let grant = AccessTokenGrant::new("access").with_expires_in(Duration::seconds(3600));
		let issued_at = grant.issued_at;

		assert_eq!(grant.expires_at, Some(issued_at + Duration::seconds(3600)));
		assert_eq!(AccessTokenGrant::new("access").expires_at, None);
	}

	#[test]
	fn debug_redacts_tokens() {
		let grant = AccessTokenGrant::new("access-secret").with_refresh_token("refresh-secret");
		let rendered = format!("{grant:?}");

		assert!(!rendered.contains("access-secret"));
		assert!(!rendered.contains("refresh-secret"));
		assert!(rendered.contains("<redacted>"));
	}
}
