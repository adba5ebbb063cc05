//! Yahoo OAuth 2.0 strategy: resolve the user's GUID, fetch the matching profile, and hand a
//! provider-agnostic [`profile::NormalizedProfile`] to the host's verify hook.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod profile;
pub mod resolver;
pub mod strategy;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::{StrategyConfig, StrategyConfigBuilder},
		http::ReqwestHttpClient,
		resolver::ProfileResolver,
	};

	/// Client identifier used by test configs.
	pub const TEST_CLIENT_ID: &str = "test-client";
	/// Client secret used by test configs.
	pub const TEST_CLIENT_SECRET: &str = "test-secret";

	/// Builds a reqwest HTTP client for talking to `httpmock` servers during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Returns a config builder whose endpoints all point at `base` (e.g. an `httpmock` URL).
	pub fn test_config_builder(base: &str) -> StrategyConfigBuilder {
		let base = base.trim_end_matches('/');

		StrategyConfig::builder(TEST_CLIENT_ID, TEST_CLIENT_SECRET)
			.authorization_url(format!("{base}/oauth2/request_auth"))
			.token_url(format!("{base}/oauth2/get_token"))
			.callback_url("https://app.example.com/auth/yahoo/callback")
			.user_guid_url(format!("{base}/v1/me/guid?format=json"))
			.user_profile_url(format!("{base}/v1/user/:xoauthYahooGuid/profile?format=json"))
	}

	/// Constructs a reqwest-backed [`ProfileResolver`] against the mock endpoints under `base`.
	pub fn build_reqwest_test_resolver(base: &str) -> ProfileResolver<ReqwestHttpClient> {
		let config =
			test_config_builder(base).build().expect("Test strategy config should be valid.");

		ProfileResolver::new(Arc::new(config), test_reqwest_http_client())
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{BoxError, Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
