//! Strategy-level error types shared across configuration, token exchange, and profile
//! resolution.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used wherever a transport or host hook supplies its own error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical strategy error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The GUID or profile lookup failed.
	#[error(transparent)]
	Resolution(#[from] ResolutionError),

	/// Requested scopes exceed what was granted.
	#[error("Token lacks the required scopes: {reason}.")]
	InsufficientScope {
		/// Provider- or strategy-supplied reason string.
		reason: String,
	},
	/// Provider rejected the grant (e.g., bad or reused authorization code).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or strategy-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or strategy-supplied reason string.
		reason: String,
	},
	/// The authorization redirect came back with an error other than `access_denied`.
	#[error("Authorization endpoint returned an error: {error}.")]
	Authorization {
		/// OAuth `error` code from the callback query.
		error: String,
		/// OAuth `error_description` from the callback query, if any.
		description: Option<String>,
	},
	/// The host's verify hook failed.
	#[error("Verify hook failed.")]
	Verify(#[source] BoxError),
}

/// Configuration and validation failures raised while building the strategy.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A configured endpoint is not a valid URL.
	#[error("The {endpoint} URL is invalid: {url}.")]
	InvalidUrl {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// The offending value.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Profile URL template lacks the GUID placeholder.
	#[error("The user profile URL must contain the `{placeholder}` placeholder: {url}.")]
	MissingGuidPlaceholder {
		/// Placeholder the template must contain.
		placeholder: &'static str,
		/// The offending template.
		url: String,
	},
	/// Client identifier is empty.
	#[error("Client identifier must not be empty.")]
	MissingClientId,
	/// Token endpoint returned an `expires_in` that does not fit the supported range.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or strategy-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO) while talking to the token endpoint.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

/// Which of the two profile lookups failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResolutionPhase {
	/// `GET` against the user-GUID endpoint.
	Guid,
	/// `GET` against the user-profile endpoint.
	Profile,
}
impl ResolutionPhase {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ResolutionPhase::Guid => "guid",
			ResolutionPhase::Profile => "profile",
		}
	}
}
impl Display for ResolutionPhase {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Failures raised while resolving a user profile from an access token.
///
/// Every variant carries an optional human-readable message and an optional HTTP status so
/// hosts can log or display the failure without inspecting transport internals.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ResolutionError {
	/// The GUID request failed before any response body was received.
	#[error("Failed to fetch user GUID{}.", detail(.message))]
	GuidTransport {
		/// Transport-supplied message.
		message: Option<String>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The GUID endpoint answered with an error payload.
	#[error("Failed to fetch user GUID{}.", detail(.message))]
	GuidProvider {
		/// Provider-supplied `error.detail`, or a generic message.
		message: Option<String>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The GUID response could not be parsed.
	#[error("Failed to parse user GUID{}.", detail(.message))]
	GuidParse {
		/// Parser-supplied message.
		message: Option<String>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The profile request failed before any response body was received.
	#[error("Failed to fetch user profile{}.", detail(.message))]
	ProfileTransport {
		/// Transport-supplied message.
		message: Option<String>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The profile endpoint answered with an error payload.
	#[error("Failed to fetch user profile{}.", detail(.message))]
	ProfileProvider {
		/// Provider-supplied `error.description`, or a generic message.
		message: Option<String>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The profile response could not be parsed.
	#[error("Failed to parse user profile{}.", detail(.message))]
	ProfileParse {
		/// Parser-supplied message.
		message: Option<String>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl ResolutionError {
	/// Lookup that produced the failure.
	pub fn phase(&self) -> ResolutionPhase {
		match self {
			Self::GuidTransport { .. } | Self::GuidProvider { .. } | Self::GuidParse { .. } =>
				ResolutionPhase::Guid,
			Self::ProfileTransport { .. }
			| Self::ProfileProvider { .. }
			| Self::ProfileParse { .. } => ResolutionPhase::Profile,
		}
	}

	/// Human-readable message attached to the failure, if any.
	pub fn message(&self) -> Option<&str> {
		match self {
			Self::GuidTransport { message, .. }
			| Self::GuidProvider { message, .. }
			| Self::GuidParse { message, .. }
			| Self::ProfileTransport { message, .. }
			| Self::ProfileProvider { message, .. }
			| Self::ProfileParse { message, .. } => message.as_deref(),
		}
	}

	/// HTTP status attached to the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::GuidTransport { status, .. }
			| Self::GuidProvider { status, .. }
			| Self::GuidParse { status, .. }
			| Self::ProfileTransport { status, .. }
			| Self::ProfileProvider { status, .. }
			| Self::ProfileParse { status, .. } => *status,
		}
	}
}

fn detail(message: &Option<String>) -> String {
	match message {
		Some(message) => format!(": {message}"),
		None => String::new(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn resolution_error_accessors_expose_context() {
		let err = ResolutionError::GuidProvider {
			message: Some("bad token".into()),
			status: Some(401),
		};

		assert_eq!(err.phase(), ResolutionPhase::Guid);
		assert_eq!(err.message(), Some("bad token"));
		assert_eq!(err.status(), Some(401));
		assert_eq!(err.to_string(), "Failed to fetch user GUID: bad token.");

		let err = ResolutionError::ProfileParse { message: None, status: None };

		assert_eq!(err.phase(), ResolutionPhase::Profile);
		assert_eq!(err.to_string(), "Failed to parse user profile.");
	}
}
