//! Crate-level error types shared by the credential store, transports, and fetch loop.
//!
//! Rate limiting and natural end-of-data are not errors; the fetch loop reports them
//! through [`crate::fetch::StopReason`] instead.

// std
use std::{io, path::PathBuf};
// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credentials are missing, malformed, or were rejected upstream.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Non-auth, non-rate-limit transport failure.
	#[error(transparent)]
	Http(#[from] HttpError),
	/// Credential file could not be read or written.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),
	/// Console interaction failed during the PIN flow.
	#[error("Console prompt failed.")]
	Prompt(#[source] io::Error),
}

/// Authorization failures. Never retried.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Credential file does not exist.
	#[error("No credential data: {} does not exist.", path.display())]
	MissingFile {
		/// Path that was checked.
		path: PathBuf,
	},
	/// Credential file exists but lacks the credential section.
	#[error("No credential data: section [{section}] is missing.")]
	MissingSection {
		/// Expected section name.
		section: String,
	},
	/// Credential section lacks one of the required keys.
	#[error("Credential section [{section}] is missing option `{option}`.")]
	MissingOption {
		/// Section that was inspected.
		section: String,
		/// Missing key.
		option: &'static str,
	},
	/// Credential data could not be parsed.
	#[error("Credential data is malformed: {message}.")]
	Malformed {
		/// Parser- or validator-supplied message.
		message: String,
	},
	/// Credentials are not fully populated.
	#[error("Credentials are incomplete.")]
	Incomplete,
	/// Remote service rejected the credentials (or the PIN).
	#[error("Authorization rejected: {reason}.")]
	Rejected {
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Human-readable reason string.
		reason: String,
	},
}

/// Transport failures other than authorization and rate limiting.
#[derive(Debug, ThisError)]
pub enum HttpError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	ClientBuild {
		/// Underlying builder failure.
		#[source]
		source: BoxError,
	},
	/// Endpoint could not be joined onto the configured base URL.
	#[error("Endpoint `{endpoint}` is not a valid URL path.")]
	InvalidEndpoint {
		/// Endpoint as supplied by the caller.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Server answered with an unexpected status.
	#[error("API returned HTTP {status}: {message}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Body or reason phrase summarizing the failure.
		message: String,
	},
	/// Response body could not be decoded.
	#[error("API returned a malformed response.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Response body did not have the expected shape.
	#[error("API returned an unexpected response: {message}.")]
	UnexpectedShape {
		/// Description of the mismatch.
		message: String,
	},
}
impl HttpError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport's builder failure.
	pub fn client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::ClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for HttpError {
	fn from(e: ReqwestError) -> Self {
		if e.is_builder() { Self::client_build(e) } else { Self::network(e) }
	}
}

/// Credential persistence failures.
#[derive(Debug, ThisError)]
pub enum StoreError {
	/// Backing file could not be read, opened for writing, or replaced.
	#[error("I/O failure on {}: {source}", path.display())]
	Io {
		/// Path being written.
		path: PathBuf,
		/// Underlying I/O failure.
		#[source]
		source: io::Error,
	},
	/// Credential data could not be serialized.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
}
