//! Walks through a full Yahoo login against a local stand-in for Yahoo's endpoints: build the
//! authorization redirect, handle the callback, and map the normalized profile onto an
//! application user.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use oauth2_yahoo::{
	config::{StrategyConfig, StrategyOptions},
	error::BoxError,
	strategy::{AuthOutcome, CallbackParams, ReqwestStrategy, VerifyRequest},
};

#[derive(Debug)]
struct AppUser {
	yahoo_guid: String,
	name: String,
	email: Option<String>,
}

async fn find_or_create_user(request: VerifyRequest) -> Result<Option<AppUser>, BoxError> {
	let profile = request.profile;

	Ok(Some(AppUser {
		yahoo_guid: profile.id,
		name: profile.display_name,
		email: profile.emails.into_iter().next().map(|email| email.value),
	}))
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/get_token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":3600,\"xoauth_yahoo_guid\":\"DEMOGUID\"}",
			);
		})
		.await;
	let guid_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/me/guid");
			then.status(200).body("{\"guid\":{\"value\":\"DEMOGUID\"}}");
		})
		.await;
	let profile_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/user/DEMOGUID/profile");
			then.status(200).body(
				"{\"profile\":{\"givenName\":\"Demo\",\"familyName\":\"User\",\"emails\":[{\"handle\":\"demo@yahoo.com\",\"primary\":true}]}}",
			);
		})
		.await;
	// Hosts usually load this bag from their own config file.
	let options: StrategyOptions = serde_json::from_value(serde_json::json!({
		"clientID": "demo-client",
		"clientSecret": "demo-secret",
		"callbackURL": "https://app.example.com/auth/yahoo/callback",
		"authorizationURL": server.url("/oauth2/request_auth"),
		"tokenURL": server.url("/oauth2/get_token"),
		"userGUIDUrl": server.url("/v1/me/guid?format=json"),
		"userProfileURL": server.url("/v1/user/:xoauthYahooGuid/profile?format=json"),
	}))?;
	let strategy = ReqwestStrategy::new(StrategyConfig::from_options(options)?, find_or_create_user)
		.with_scope(["openid", "sdct-r"]);

	// First visit: no `code` yet, so the strategy asks for a redirect.
	if let AuthOutcome::Redirect(url) = strategy
		.authenticate(CallbackParams { state: Some("demo-state".into()), ..Default::default() })
		.await?
	{
		println!("Send your user to {url}.");
	}

	// Yahoo redirects back with an authorization code.
	match strategy
		.authenticate(CallbackParams {
			code: Some("demo-code".into()),
			state: Some("demo-state".into()),
			..Default::default()
		})
		.await?
	{
		AuthOutcome::Success(user) => println!(
			"Signed in {} ({}) as {:?}.",
			user.name, user.yahoo_guid, user.email
		),
		AuthOutcome::Failure { message } => eprintln!("Login rejected: {message:?}."),
		AuthOutcome::Redirect(url) => eprintln!("Unexpected redirect to {url}."),
	}

	token_mock.assert_async().await;
	guid_mock.assert_async().await;
	profile_mock.assert_async().await;

	Ok(())
}
