#![cfg(feature = "reqwest")]

// self
use oauth2_yahoo::{
	_preludet::*,
	config::StrategyConfig,
	error::{TransientError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	oauth::{
		self,
		oauth2::{
			AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
			http::{
				HeaderValue, StatusCode,
				header::{AUTHORIZATION, CONTENT_TYPE},
			},
		},
	},
};

#[derive(Debug)]
enum FakeTransportError {
	Reset,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Reset => write!(f, "Connection reset."),
		}
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Copy)]
enum Script {
	Throttled { retry_after: Duration },
	Reset,
}

/// Token transport that never touches the network and remembers every `Authorization` header.
#[derive(Clone)]
struct FakeHttpClient {
	script: Script,
	authorizations: Arc<Mutex<Vec<String>>>,
}
impl FakeHttpClient {
	fn new(script: Script) -> Self {
		Self { script, authorizations: Default::default() }
	}

	fn authorizations(&self) -> Vec<String> {
		self.authorizations.lock().clone()
	}
}
impl TokenHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { slot, client: self.clone() }
	}
}

struct FakeHttpHandle {
	slot: ResponseMetadataSlot,
	client: FakeHttpClient,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		let slot = self.slot.clone();
		let script = self.client.script;

		if let Some(value) = request.headers().get(AUTHORIZATION) {
			self.client
				.authorizations
				.lock()
				.push(value.to_str().expect("Authorization header should be ASCII.").to_owned());
		}

		Box::pin(async move {
			assert!(
				slot.take().is_none(),
				"ResponseMetadataSlot must be clear before dispatching a request."
			);

			match script {
				Script::Throttled { retry_after } => {
					slot.store(ResponseMetadata { status: Some(429), retry_after: Some(retry_after) });

					let mut response =
						HttpResponse::new(b"{\"error\":\"temporarily_unavailable\"}".to_vec());

					*response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
					response
						.headers_mut()
						.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

					Ok(response)
				},
				Script::Reset => Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Reset))),
			}
		})
	}
}

fn build_config() -> StrategyConfig {
	StrategyConfig::builder(TEST_CLIENT_ID, TEST_CLIENT_SECRET)
		.token_url("https://login.example.com/oauth2/get_token")
		.build()
		.expect("Failed to build token exchange config.")
}

#[tokio::test]
async fn throttled_exchange_surfaces_status_and_retry_after() {
	let config = build_config();
	let client = FakeHttpClient::new(Script::Throttled { retry_after: Duration::seconds(30) });
	let err = oauth::exchange_code(&config, &client, "code-429")
		.await
		.expect_err("A throttled token endpoint should fail the exchange.");

	match err {
		Error::Transient(TransientError::TokenEndpoint { status, retry_after, .. }) => {
			assert_eq!(status, Some(429));
			assert_eq!(retry_after, Some(Duration::seconds(30)));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert_eq!(client.authorizations(), vec![config.basic_auth_header().to_owned()]);
}

#[tokio::test]
async fn transport_failure_maps_to_network_error() {
	let config = build_config();
	let client = FakeHttpClient::new(Script::Reset);
	let err = oauth::exchange_code(&config, &client, "code-reset")
		.await
		.expect_err("A transport failure should fail the exchange.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
	assert_eq!(client.authorizations().len(), 1);
}
