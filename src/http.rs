//! Transport primitives for the token exchange and the authenticated profile lookups.
//!
//! Two seams are exposed:
//!
//! - [`ResourceHttpClient`] performs the bearer-authenticated `GET` requests the
//!   [`ProfileResolver`](crate::resolver::ProfileResolver) issues against the GUID and profile
//!   endpoints. Failures surface as [`FetchError`], which keeps the raw response body so the
//!   resolver can unwrap Yahoo's error payloads.
//! - [`TokenHttpClient`] hands out `oauth2` [`AsyncHttpClient`] handles for the code exchange,
//!   each tied to a [`ResponseMetadataSlot`] so failures can be classified with the HTTP
//!   status and retry hints that produced them.
//!
//! [`ReqwestHttpClient`] implements both behind the default `reqwest` feature.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError};
#[cfg(feature = "reqwest")] use oauth2::{HttpRequest, HttpResponse};
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Boxed future returned by [`ResourceHttpClient::get`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<String, FetchError>> + 'a + Send>>;

/// Bearer-authenticated `GET` capability used for the GUID and profile lookups.
///
/// Implementations must deliver the access token in the `Authorization: Bearer` header,
/// never as a query parameter, and return the response body as text on a 2xx status.
pub trait ResourceHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Fetches `url` on behalf of the owner of `access_token`.
	fn get<'a>(&'a self, url: &'a Url, access_token: &'a TokenSecret) -> FetchFuture<'a>;
}

/// Failure reported by a [`ResourceHttpClient`].
///
/// `data` holds the response body when the server answered with a non-2xx status; it is
/// `None` when no response body was received at all (DNS, TLS, connection resets, ...).
#[derive(Debug, ThisError)]
#[error("{}", describe(.status, .source))]
pub struct FetchError {
	/// HTTP status code, when a response was received.
	pub status: Option<u16>,
	/// Raw response body, when a response was received.
	pub data: Option<String>,
	/// Underlying transport failure, if any.
	#[source]
	pub source: Option<BoxError>,
}
impl FetchError {
	/// Error for a non-2xx response carrying `data` as its body.
	///
	/// A blank body is treated as no body at all, so only `status` is kept.
	pub fn response(status: u16, data: impl Into<String>) -> Self {
		let data = data.into();
		let data = if data.trim().is_empty() { None } else { Some(data) };

		Self { status: Some(status), data, source: None }
	}

	/// Error for a request that never produced a response body.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self { status: None, data: None, source: Some(Box::new(src)) }
	}

	/// Attaches an HTTP status to a body-less failure.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}
}

/// Abstraction over HTTP transports capable of executing the authorization-code exchange
/// while publishing response metadata for error classification.
///
/// Implementations must be `Send + Sync + 'static`, and the handles they return must own
/// whatever state they need so their request futures stay `Send` while in flight.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds an [`AsyncHttpClient`] handle that records outcomes in `slot`.
	///
	/// Call [`ResponseMetadataSlot::take`] before submitting the request and
	/// [`ResponseMetadataSlot::store`] once a status is known.
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Captures metadata from the most recent token-endpoint response.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the token endpoint, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] serving both the token exchange and the profile
/// lookups.
///
/// Token requests should not follow redirects; configure any custom [`ReqwestClient`]
/// accordingly before wrapping it.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ResourceHttpClient for ReqwestHttpClient {
	fn get<'a>(&'a self, url: &'a Url, access_token: &'a TokenSecret) -> FetchFuture<'a> {
		Box::pin(async move {
			let response = self
				.0
				.get(url.clone())
				.bearer_auth(access_token.expose())
				.send()
				.await
				.map_err(FetchError::network)?;
			let status = response.status();
			let body = match response.text().await {
				Ok(body) => body,
				Err(e) => return Err(FetchError::network(e).with_status(status.as_u16())),
			};

			if status.is_success() {
				Ok(body)
			} else {
				Err(FetchError::response(status.as_u16(), body))
			}
		})
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = InstrumentedHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		InstrumentedHandle::new(self.0.clone(), slot)
	}
}

#[cfg(feature = "reqwest")]
struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

/// Handle returned by [`ReqwestHttpClient`] that satisfies [`TokenHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
#[cfg(feature = "reqwest")]
impl InstrumentedHandle {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self(Arc::new(InstrumentedHttpClient { client, slot }))
	}
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let response = client
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let retry_after = parse_retry_after(&headers);

			client.slot.store(ResponseMetadata { status: Some(status.as_u16()), retry_after });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

fn describe(status: &Option<u16>, source: &Option<BoxError>) -> String {
	match (status, source) {
		(Some(status), Some(source)) =>
			format!("Request failed with HTTP status {status}: {source}"),
		(Some(status), None) => format!("Request failed with HTTP status {status}"),
		(None, Some(source)) => format!("Request failed: {source}"),
		(None, None) => "Request failed".into(),
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).ok()?));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn fetch_error_keeps_body_and_status() {
		let err = FetchError::response(401, "{\"error\":{}}");

		assert_eq!(err.status, Some(401));
		assert_eq!(err.data.as_deref(), Some("{\"error\":{}}"));
		assert_eq!(err.to_string(), "Request failed with HTTP status 401");
	}

	#[test]
	fn blank_error_body_counts_as_no_body() {
		let err = FetchError::response(401, "  \n");

		assert_eq!(err.status, Some(401));
		assert_eq!(err.data, None);
	}

	#[test]
	fn status_and_source_are_both_described() {
		let err = FetchError::network(std::io::Error::other("body truncated")).with_status(502);

		assert_eq!(err.to_string(), "Request failed with HTTP status 502: body truncated");
	}

	#[test]
	fn metadata_slot_take_clears_value() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(503), retry_after: None });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(503));
		assert!(slot.take().is_none());
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn retry_after_parses_delta_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, "120".parse().expect("Header value should parse."));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(120)));
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn retry_after_rejects_out_of_range_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(
			RETRY_AFTER,
			u64::MAX.to_string().parse().expect("Header value should parse."),
		);

		assert_eq!(parse_retry_after(&headers), None);
	}
}
