//! Two-phase profile resolution: access token → GUID → normalized profile.
//!
//! Yahoo does not expose a "me" profile endpoint, so the resolver first asks the GUID
//! endpoint who owns the token and then fetches that user's profile. The two requests are
//! strictly sequential and any failure ends the resolution without a partial result.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::StrategyConfig,
	error::ResolutionError,
	http::{FetchError, ResourceHttpClient},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	profile::NormalizedProfile,
};

/// Message for error bodies that are not JSON or lack the expected `error` member.
const UNEXPECTED_ERROR_BODY: &str = "unexpected error body";

#[derive(Deserialize)]
struct GuidResponse {
	guid: GuidValue,
}

#[derive(Deserialize)]
struct GuidValue {
	value: String,
}

/// Resolves an access token into a [`NormalizedProfile`].
///
/// The resolver only reads its [`StrategyConfig`] and HTTP client, so a single instance can
/// serve any number of concurrent logins.
pub struct ProfileResolver<C>
where
	C: ?Sized + ResourceHttpClient,
{
	config: Arc<StrategyConfig>,
	http_client: Arc<C>,
}
impl<C> ProfileResolver<C>
where
	C: ?Sized + ResourceHttpClient,
{
	/// Creates a resolver that issues its lookups through `http_client`.
	pub fn new(config: Arc<StrategyConfig>, http_client: impl Into<Arc<C>>) -> Self {
		Self { config, http_client: http_client.into() }
	}

	/// Configuration the resolver reads endpoints from.
	pub fn config(&self) -> &StrategyConfig {
		&self.config
	}

	/// Fetches the token owner's GUID, then their profile, and normalizes the result.
	pub async fn resolve_profile(
		&self,
		access_token: &TokenSecret,
	) -> Result<NormalizedProfile, ResolutionError> {
		const KIND: FlowKind = FlowKind::ProfileResolution;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = match self.resolve_guid(access_token).await {
			Ok(guid) => self.fetch_profile(access_token, guid).await,
			Err(e) => Err(e),
		};

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn resolve_guid(&self, access_token: &TokenSecret) -> Result<String, ResolutionError> {
		let span = FlowSpan::new(FlowKind::ProfileResolution, "guid");

		let result = span
			.instrument(async move {
				let body = self
					.http_client
					.get(&self.config.endpoints.user_guid, access_token)
					.await
					.map_err(map_guid_fetch_error)?;

				parse_guid(&body)
			})
			.await;

		span.record(&result);

		result
	}

	async fn fetch_profile(
		&self,
		access_token: &TokenSecret,
		guid: String,
	) -> Result<NormalizedProfile, ResolutionError> {
		let span = FlowSpan::new(FlowKind::ProfileResolution, "profile");

		let result = span
			.instrument(async move {
				let url = self.config.user_profile_url(&guid).map_err(|e| {
					ResolutionError::GuidParse {
						message: Some(format!(
							"GUID `{guid}` does not form a valid profile URL: {e}"
						)),
						status: None,
					}
				})?;
				let body = self
					.http_client
					.get(&url, access_token)
					.await
					.map_err(map_profile_fetch_error)?;
				let mut json = serde_json::from_str::<JsonMap<String, JsonValue>>(&body)
					.map_err(|e| ResolutionError::ProfileParse {
						message: Some(e.to_string()),
						status: None,
					})?;

				json.insert("id".into(), JsonValue::String(guid.clone()));

				Ok(NormalizedProfile::from_payload(&guid, body, json))
			})
			.await;

		span.record(&result);

		result
	}
}
impl<C> Clone for ProfileResolver<C>
where
	C: ?Sized + ResourceHttpClient,
{
	fn clone(&self) -> Self {
		Self { config: self.config.clone(), http_client: self.http_client.clone() }
	}
}
impl<C> Debug for ProfileResolver<C>
where
	C: ?Sized + ResourceHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProfileResolver").field("config", &self.config).finish()
	}
}

fn parse_guid(body: &str) -> Result<String, ResolutionError> {
	let parse_error = |message: String| ResolutionError::GuidParse {
		message: Some(message),
		status: None,
	};
	let mut de = serde_json::Deserializer::from_str(body);
	let response: GuidResponse = serde_path_to_error::deserialize(&mut de)
		.map_err(|e| parse_error(format!("{} at `{}`", e.inner(), e.path())))?;

	de.end().map_err(|e| parse_error(e.to_string()))?;

	Ok(response.guid.value)
}

fn map_guid_fetch_error(err: FetchError) -> ResolutionError {
	let message = err.to_string();
	let FetchError { status, data, .. } = err;
	let Some(data) = data else {
		return ResolutionError::GuidTransport { message: Some(message), status };
	};

	match provider_error(&data) {
		Some(error) => ResolutionError::GuidProvider {
			message: error.get("detail").and_then(JsonValue::as_str).map(ToOwned::to_owned),
			status,
		},
		None => ResolutionError::GuidProvider {
			message: Some(UNEXPECTED_ERROR_BODY.into()),
			status: None,
		},
	}
}

fn map_profile_fetch_error(err: FetchError) -> ResolutionError {
	let message = err.to_string();
	let FetchError { status, data, .. } = err;
	let Some(data) = data else {
		return ResolutionError::ProfileTransport { message: Some(message), status };
	};
	let description = provider_error(&data).and_then(|error| {
		error.get("description").and_then(JsonValue::as_str).map(ToOwned::to_owned)
	});

	match description {
		Some(description) =>
			ResolutionError::ProfileProvider { message: Some(description), status },
		None => ResolutionError::ProfileProvider {
			message: Some(UNEXPECTED_ERROR_BODY.into()),
			status: None,
		},
	}
}

/// Extracts the `error` member of a Yahoo error body, if the body is JSON and has one.
fn provider_error(data: &str) -> Option<JsonValue> {
	match serde_json::from_str::<JsonValue>(data) {
		Ok(JsonValue::Object(mut body)) => body.remove("error"),
		_ => None,
	}
}
