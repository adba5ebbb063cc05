//! Authorization redirect and authorization-code exchange built on the `oauth2` crate.
//!
//! Yahoo expects client credentials as `Authorization: Basic base64(id:secret)` on the token
//! endpoint. The `oauth2` client is configured as a public client (so it never emits its own
//! credentials header) and every token request passes through [`BasicAuthHandle`], which
//! stamps the header precomputed in [`StrategyConfig`].

pub use oauth2;

// crates.io
use oauth2::{
	AsyncHttpClient, AuthUrl, AuthorizationCode, Client, ClientId, EndpointNotSet, EndpointSet,
	ExtraTokenFields, HttpClientError, HttpRequest, RedirectUrl, RequestTokenError,
	StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse, BasicTokenType,
	},
	http::{HeaderValue, header::AUTHORIZATION},
};
// self
use crate::{
	_prelude::*,
	auth::AccessTokenGrant,
	config::StrategyConfig,
	error::{ConfigError, TransientError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

type YahooTokenResponse = StandardTokenResponse<YahooTokenFields, BasicTokenType>;
type ConfiguredClient = Client<
	BasicErrorResponse,
	YahooTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;

/// Yahoo-specific token response fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YahooTokenFields {
	/// GUID of the user the token was issued to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub xoauth_yahoo_guid: Option<String>,
}
impl ExtraTokenFields for YahooTokenFields {}

/// [`AsyncHttpClient`] decorator that sets the `Authorization` header on every request.
pub struct BasicAuthHandle<H> {
	inner: H,
	authorization: HeaderValue,
}
impl<H> BasicAuthHandle<H> {
	/// Wraps `inner`, sending `authorization` verbatim as the `Authorization` header.
	pub fn new(inner: H, authorization: &str) -> Result<Self, ConfigError> {
		let authorization =
			HeaderValue::from_str(authorization).map_err(|e| ConfigError::HttpRequest(e.into()))?;

		Ok(Self { inner, authorization })
	}
}
impl<'c, H> AsyncHttpClient<'c> for BasicAuthHandle<H>
where
	H: AsyncHttpClient<'c>,
{
	type Error = H::Error;
	type Future = H::Future;

	fn call(&'c self, mut request: HttpRequest) -> Self::Future {
		request.headers_mut().insert(AUTHORIZATION, self.authorization.clone());

		self.inner.call(request)
	}
}

/// Builds the URL end-users are redirected to in order to grant access.
///
/// `state` is forwarded untouched; generating and checking it is the host's job.
pub fn authorization_url(config: &StrategyConfig, scope: &[&str], state: Option<&str>) -> Url {
	let mut url = config.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", &config.client_id);

	if let Some(callback) = &config.callback_url {
		pairs.append_pair("redirect_uri", callback.as_str());
	}

	let scope = scope.iter().filter(|value| !value.is_empty()).copied().collect::<Vec<_>>();

	if !scope.is_empty() {
		pairs.append_pair("scope", &scope.join(&config.scope_separator));
	}
	if let Some(state) = state {
		pairs.append_pair("state", state);
	}

	drop(pairs);

	url
}

/// Exchanges an authorization code for tokens at the configured token endpoint.
pub async fn exchange_code<C>(
	config: &StrategyConfig,
	http_client: &C,
	code: &str,
) -> Result<AccessTokenGrant>
where
	C: ?Sized + TokenHttpClient,
{
	const KIND: FlowKind = FlowKind::CodeExchange;

	let span = FlowSpan::new(KIND, "exchange_code");

	obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

	let result = span
		.instrument(async move {
			let oauth_client = build_client(config)?;
			let meta = ResponseMetadataSlot::default();
			let handle = BasicAuthHandle::new(
				http_client.with_metadata(meta.clone()),
				config.basic_auth_header(),
			)?;
			let response = oauth_client
				.exchange_code(AuthorizationCode::new(code.to_owned()))
				.request_async(&handle)
				.await
				.map_err(|e| map_request_error(meta.take(), e))?;

			map_token_response(response)
		})
		.await;

	span.record(&result);
	obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

	result
}

fn build_client(config: &StrategyConfig) -> Result<ConfiguredClient> {
	let auth_url = AuthUrl::from_url(config.endpoints.authorization.clone());
	let token_url = TokenUrl::from_url(config.endpoints.token.clone());
	let mut client: ConfiguredClient = Client::new(ClientId::new(config.client_id.clone()))
		.set_auth_uri(auth_url)
		.set_token_uri(token_url);

	if let Some(callback) = &config.callback_url {
		client = client.set_redirect_uri(RedirectUrl::from_url(callback.clone()));
	}

	Ok(client)
}

fn map_token_response(response: YahooTokenResponse) -> Result<AccessTokenGrant> {
	let mut grant = AccessTokenGrant::new(response.access_token().secret().to_owned());

	grant.token_type = response.token_type().as_ref().to_owned();
	grant.xoauth_yahoo_guid = response.extra_fields().xoauth_yahoo_guid.clone();

	if let Some(refresh) = response.refresh_token() {
		grant = grant.with_refresh_token(refresh.secret().to_owned());
	}
	if let Some(expires_in) = response.expires_in() {
		let expires_in = i64::try_from(expires_in.as_secs())
			.map_err(|_| ConfigError::ExpiresInOutOfRange)?;

		grant = grant.with_expires_in(Duration::seconds(expires_in));
	}

	Ok(grant)
}

/// Canonical token-endpoint error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenErrorKind {
	InvalidGrant,
	InvalidClient,
	InsufficientScope,
	Transient,
}

fn map_request_error<E>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	let meta = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, meta),
		RequestTokenError::Request(error) => map_transport_error(error, meta),
		RequestTokenError::Parse(source, _body) =>
			TransientError::TokenResponseParse { source, status: meta_status(meta) }.into(),
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

fn map_server_response_error(
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let code = response.error().as_ref();
	let description = response.error_description().map(String::as_str);
	let message = match description {
		Some(description) => format!("Token endpoint returned an OAuth error: {description}"),
		None => format!("Token endpoint returned an OAuth error: {code}"),
	};
	let kind = classify_token_error(code, description)
		.unwrap_or_else(|| classify_status(meta_status(meta)));

	match kind {
		TokenErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		TokenErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		TokenErrorKind::InsufficientScope => Error::InsufficientScope { reason: message },
		TokenErrorKind::Transient => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

fn map_transport_error<E>(err: HttpClientError<E>, meta: Option<&ResponseMetadata>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransientError::TokenEndpoint {
			message: format!("HTTP client error occurred while calling the token endpoint: {message}"),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
		_ => TransientError::TokenEndpoint {
			message: "HTTP client error occurred while calling the token endpoint".into(),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

fn classify_token_error(code: &str, description: Option<&str>) -> Option<TokenErrorKind> {
	match_exact_value(code).or_else(|| description.and_then(match_exact_value))
}

fn match_exact_value(value: &str) -> Option<TokenErrorKind> {
	if value.eq_ignore_ascii_case("invalid_grant") || value.eq_ignore_ascii_case("access_denied") {
		Some(TokenErrorKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(TokenErrorKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_scope")
		|| value.eq_ignore_ascii_case("insufficient_scope")
	{
		Some(TokenErrorKind::InsufficientScope)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(TokenErrorKind::Transient)
	} else {
		None
	}
}

fn classify_status(status: Option<u16>) -> TokenErrorKind {
	match status {
		Some(400 | 404 | 410) => TokenErrorKind::InvalidGrant,
		Some(401) => TokenErrorKind::InvalidClient,
		Some(403) => TokenErrorKind::InsufficientScope,
		_ => TokenErrorKind::Transient,
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}
