#![cfg(feature = "reqwest")]

// std
use std::collections::VecDeque;
// self
use oauth2_yahoo::{
	_preludet::*,
	auth::TokenSecret,
	config::StrategyConfig,
	error::ResolutionError,
	http::{FetchError, FetchFuture, ResourceHttpClient},
	resolver::ProfileResolver,
};

type Reply = Result<String, FetchError>;

/// Replays canned replies in order and records every requested URL.
struct ScriptedHttpClient {
	replies: Mutex<VecDeque<Reply>>,
	calls: Mutex<Vec<(String, String)>>,
}
impl ScriptedHttpClient {
	fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
		Self { replies: Mutex::new(replies.into_iter().collect()), calls: Default::default() }
	}

	fn calls(&self) -> Vec<(String, String)> {
		self.calls.lock().clone()
	}
}
impl ResourceHttpClient for ScriptedHttpClient {
	fn get<'a>(&'a self, url: &'a Url, access_token: &'a TokenSecret) -> FetchFuture<'a> {
		self.calls.lock().push((url.to_string(), access_token.expose().to_owned()));

		let reply = self.replies.lock().pop_front().unwrap_or_else(|| {
			Err(FetchError::network(std::io::Error::other("No scripted reply left.")))
		});

		Box::pin(async move { reply })
	}
}

fn build_resolver(client: Arc<ScriptedHttpClient>) -> ProfileResolver<ScriptedHttpClient> {
	let config = StrategyConfig::builder(TEST_CLIENT_ID, TEST_CLIENT_SECRET)
		.user_guid_url("https://social.example.com/v1/me/guid?format=json")
		.user_profile_url("https://social.example.com/v1/user/:xoauthYahooGuid/profile?format=json")
		.build()
		.expect("Scripted config should build.");

	ProfileResolver::new(Arc::new(config), client)
}

#[tokio::test]
async fn substitutes_guid_into_profile_url_and_reuses_token() {
	let client = Arc::new(ScriptedHttpClient::new([
		Ok("{\"guid\":{\"value\":\"ABC-123\"}}".into()),
		Ok("{\"profile\":{\"givenName\":\"Grace\",\"familyName\":\"Hopper\"}}".into()),
	]));
	let resolver = build_resolver(client.clone());
	let profile = resolver
		.resolve_profile(&TokenSecret::new("scripted-token"))
		.await
		.expect("Scripted resolution should succeed.");

	assert_eq!(profile.id, "ABC-123");
	assert_eq!(profile.display_name, "Grace Hopper");
	assert_eq!(
		client.calls(),
		vec![
			(
				"https://social.example.com/v1/me/guid?format=json".into(),
				"scripted-token".into()
			),
			(
				"https://social.example.com/v1/user/ABC-123/profile?format=json".into(),
				"scripted-token".into()
			),
		]
	);
}

#[tokio::test]
async fn guid_transport_failure_skips_profile_lookup() {
	let client = Arc::new(ScriptedHttpClient::new([Err(FetchError::network(
		std::io::Error::other("connection reset"),
	))]));
	let resolver = build_resolver(client.clone());
	let err = resolver
		.resolve_profile(&TokenSecret::new("scripted-token"))
		.await
		.expect_err("A GUID transport failure should fail resolution.");

	assert!(matches!(err, ResolutionError::GuidTransport { status: None, .. }));
	assert_eq!(client.calls().len(), 1);
}

#[tokio::test]
async fn profile_transport_failure_is_reported_for_the_profile_phase() {
	let client = Arc::new(ScriptedHttpClient::new([
		Ok("{\"guid\":{\"value\":\"ABC-123\"}}".into()),
		Err(FetchError::network(std::io::Error::other("timed out")).with_status(502)),
	]));
	let resolver = build_resolver(client.clone());
	let err = resolver
		.resolve_profile(&TokenSecret::new("scripted-token"))
		.await
		.expect_err("A profile transport failure should fail resolution.");

	assert!(matches!(err, ResolutionError::ProfileTransport { status: Some(502), .. }));
	assert_eq!(client.calls().len(), 2);
}

#[tokio::test]
async fn generic_guid_error_body_has_no_status() {
	let client = Arc::new(ScriptedHttpClient::new([Err(FetchError::response(
		500,
		"{\"unexpected\":true}",
	))]));
	let resolver = build_resolver(client.clone());
	let err = resolver
		.resolve_profile(&TokenSecret::new("scripted-token"))
		.await
		.expect_err("A GUID error body without `error` should fail resolution.");

	assert_eq!(
		err,
		ResolutionError::GuidProvider {
			message: Some("unexpected error body".into()),
			status: None
		}
	);
	assert_eq!(err.to_string(), "Failed to fetch user GUID: unexpected error body.");
	assert_eq!(client.calls().len(), 1);
}
