//! Callback handling that ties the token exchange, profile resolution, and the host's verify
//! hook together.
//!
//! [`YahooStrategy::authenticate`] is driven by the query parameters Yahoo appends to the
//! redirect URI. A request without a `code` produces the authorization redirect, a request with
//! one runs the full exchange → GUID → profile → verify pipeline.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::StrategyConfig,
	error::ResolutionError,
	http::{ResourceHttpClient, TokenHttpClient},
	oauth,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	profile::NormalizedProfile,
	resolver::ProfileResolver,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// OAuth `error` value Yahoo sends when the user declines the consent screen.
pub const ACCESS_DENIED: &str = "access_denied";

/// Boxed future returned by [`Verify::verify`].
pub type VerifyFuture<'a, U> =
	Pin<Box<dyn Future<Output = Result<Option<U>, BoxError>> + 'a + Send>>;

/// Strategy wired to the default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestStrategy<V> = YahooStrategy<ReqwestHttpClient, V>;

/// Host hook mapping a resolved Yahoo identity onto an application user.
///
/// Returning `Ok(None)` rejects the login without treating it as an error.
pub trait Verify
where
	Self: 'static + Send + Sync,
{
	/// Application user produced on success.
	type User: Send;

	/// Looks up or provisions the user described by `request`.
	fn verify(&self, request: VerifyRequest) -> VerifyFuture<'_, Self::User>;
}
impl<F, Fut, U> Verify for F
where
	F: 'static + Send + Sync + Fn(VerifyRequest) -> Fut,
	Fut: 'static + Send + Future<Output = Result<Option<U>, BoxError>>,
	U: Send,
{
	type User = U;

	fn verify(&self, request: VerifyRequest) -> VerifyFuture<'_, Self::User> {
		Box::pin(self(request))
	}
}

/// Everything the verify hook learns about a successful login.
#[derive(Clone, Debug)]
pub struct VerifyRequest {
	/// Access token issued by the token endpoint.
	pub access_token: TokenSecret,
	/// Refresh token, when Yahoo issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Profile resolved with `access_token`.
	pub profile: NormalizedProfile,
}

/// Query parameters Yahoo appends to the redirect URI.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
	/// Authorization code to exchange.
	#[serde(default)]
	pub code: Option<String>,
	/// OAuth error code, when authorization failed.
	#[serde(default)]
	pub error: Option<String>,
	/// Human-readable companion to `error`.
	#[serde(default)]
	pub error_description: Option<String>,
	/// Opaque state echoed back by Yahoo; forwarded on the redirect when present.
	#[serde(default)]
	pub state: Option<String>,
}

/// Result of processing a callback request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthOutcome<U> {
	/// Send the user agent to this authorization URL.
	Redirect(Url),
	/// The verify hook accepted the login.
	Success(U),
	/// The user declined consent or the verify hook rejected the login.
	Failure {
		/// Provider- or host-supplied explanation, if any.
		message: Option<String>,
	},
}

/// Yahoo OAuth 2.0 strategy.
///
/// Holds only immutable state, so one instance can serve concurrent callbacks.
pub struct YahooStrategy<C, V>
where
	C: ?Sized + TokenHttpClient + ResourceHttpClient,
	V: Verify,
{
	config: Arc<StrategyConfig>,
	http_client: Arc<C>,
	resolver: ProfileResolver<C>,
	verify: V,
	scope: Vec<String>,
}
#[cfg(feature = "reqwest")]
impl<V> YahooStrategy<ReqwestHttpClient, V>
where
	V: Verify,
{
	/// Creates a strategy backed by a default [`ReqwestHttpClient`].
	pub fn new(config: StrategyConfig, verify: V) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default(), verify)
	}
}
impl<C, V> YahooStrategy<C, V>
where
	C: ?Sized + TokenHttpClient + ResourceHttpClient,
	V: Verify,
{
	/// Creates a strategy that routes every request through `http_client`.
	pub fn with_http_client(
		config: StrategyConfig,
		http_client: impl Into<Arc<C>>,
		verify: V,
	) -> Self {
		let config = Arc::new(config);
		let http_client = http_client.into();
		let resolver = ProfileResolver::new(config.clone(), http_client.clone());

		Self { config, http_client, resolver, verify, scope: Vec::new() }
	}

	/// Sets the scopes requested on the authorization redirect.
	pub fn with_scope<I, S>(mut self, scope: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scope = scope.into_iter().map(Into::into).collect();

		self
	}

	/// Configuration the strategy was built from.
	pub fn config(&self) -> &StrategyConfig {
		&self.config
	}

	/// Resolver used for profile lookups.
	pub fn resolver(&self) -> &ProfileResolver<C> {
		&self.resolver
	}

	/// Builds the authorization URL for `scope`, forwarding `state` when supplied.
	pub fn authorization_url(&self, scope: &[&str], state: Option<&str>) -> Url {
		FlowSpan::new(FlowKind::Authorize, "authorization_url")
			.in_scope(|| oauth::authorization_url(&self.config, scope, state))
	}

	/// Processes a callback request.
	///
	/// - `error=access_denied` yields [`AuthOutcome::Failure`].
	/// - Any other `error` yields [`Error::Authorization`].
	/// - A missing `code` yields [`AuthOutcome::Redirect`] using the configured scopes.
	/// - Otherwise the code is exchanged, the profile resolved, and the verify hook consulted.
	pub async fn authenticate(&self, params: CallbackParams) -> Result<AuthOutcome<V::User>> {
		const KIND: FlowKind = FlowKind::Authorize;

		let span = FlowSpan::new(KIND, "authenticate");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.handle_callback(params)).await;

		span.record(&result);
		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Resolves the profile owned by `access_token`.
	pub async fn user_profile(
		&self,
		access_token: &TokenSecret,
	) -> Result<NormalizedProfile, ResolutionError> {
		self.resolver.resolve_profile(access_token).await
	}

	async fn handle_callback(&self, params: CallbackParams) -> Result<AuthOutcome<V::User>> {
		let CallbackParams { code, error, error_description, state } = params;

		if let Some(error) = error {
			if error == ACCESS_DENIED {
				return Ok(AuthOutcome::Failure { message: error_description });
			}

			return Err(Error::Authorization { error, description: error_description });
		}

		let Some(code) = code.filter(|code| !code.is_empty()) else {
			let scope = self.scope.iter().map(String::as_str).collect::<Vec<_>>();

			return Ok(AuthOutcome::Redirect(oauth::authorization_url(
				&self.config,
				&scope,
				state.as_deref(),
			)));
		};
		let grant = oauth::exchange_code(&self.config, self.http_client.as_ref(), &code).await?;
		let profile = self.resolver.resolve_profile(&grant.access_token).await?;
		let request = VerifyRequest {
			access_token: grant.access_token,
			refresh_token: grant.refresh_token,
			profile,
		};

		match self.verify.verify(request).await.map_err(Error::Verify)? {
			Some(user) => Ok(AuthOutcome::Success(user)),
			None => Ok(AuthOutcome::Failure { message: None }),
		}
	}
}
impl<C, V> Debug for YahooStrategy<C, V>
where
	C: ?Sized + TokenHttpClient + ResourceHttpClient,
	V: Verify,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("YahooStrategy")
			.field("config", &self.config)
			.field("scope", &self.scope)
			.finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;

	async fn accept(request: VerifyRequest) -> Result<Option<String>, BoxError> {
		Ok(Some(request.profile.id))
	}

	fn build() -> YahooStrategy<ReqwestHttpClient, impl Verify<User = String>> {
		let config = StrategyConfig::builder("client", "secret")
			.callback_url("https://app.example.com/cb")
			.build()
			.expect("Config should build.");

		YahooStrategy::new(config, accept).with_scope(["openid", "sdct-r"])
	}

	#[tokio::test]
	async fn missing_code_redirects_with_scope_and_state() {
		let outcome = build()
			.authenticate(CallbackParams { state: Some("xyz".into()), ..Default::default() })
			.await
			.expect("Redirect should not fail.");
		let AuthOutcome::Redirect(url) = outcome else { panic!("Expected a redirect.") };
		let query = url.query_pairs().into_owned().collect::<HashMap<_, _>>();

		assert!(url.as_str().starts_with("https://api.login.yahoo.com/oauth2/request_auth?"));
		assert_eq!(query.get("response_type").map(String::as_str), Some("code"));
		assert_eq!(query.get("client_id").map(String::as_str), Some("client"));
		assert_eq!(
			query.get("redirect_uri").map(String::as_str),
			Some("https://app.example.com/cb")
		);
		assert_eq!(query.get("scope").map(String::as_str), Some("openid sdct-r"));
		assert_eq!(query.get("state").map(String::as_str), Some("xyz"));
	}

	#[tokio::test]
	async fn access_denied_is_a_failure_not_an_error() {
		let outcome = build()
			.authenticate(CallbackParams {
				error: Some(ACCESS_DENIED.into()),
				error_description: Some("User declined.".into()),
				..Default::default()
			})
			.await
			.expect("Denied consent should not be an error.");

		assert_eq!(outcome, AuthOutcome::Failure { message: Some("User declined.".into()) });
	}

	#[tokio::test]
	async fn other_callback_errors_are_reported() {
		let err = build()
			.authenticate(CallbackParams {
				error: Some("server_error".into()),
				..Default::default()
			})
			.await
			.expect_err("Callback error should surface.");

		assert!(matches!(
			err,
			Error::Authorization { ref error, description: None } if error == "server_error"
		));
	}

	#[test]
	fn callback_params_deserialize_from_query_shape() {
		let params: CallbackParams = serde_json::from_str(r#"{"code":"abc","state":"s"}"#)
			.expect("Callback params should deserialize.");

		assert_eq!(params.code.as_deref(), Some("abc"));
		assert_eq!(params.state.as_deref(), Some("s"));
		assert_eq!(params.error, None);
	}
}
