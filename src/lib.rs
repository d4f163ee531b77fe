//! Suck down tweets from rate-limited, cursor-paginated APIs: bounded fetch loops with
//! caller filters and cutoffs, OAuth 1.0a credential storage, and an interactive PIN flow
//! for minting new credentials.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod helper;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod store;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and mock-server fixtures shared by unit and integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::Credentials,
		config::ServiceConfig,
		fetch::{CredentialSource, Fetcher},
		http::ReqwestTransport,
	};

	/// Fetcher type alias used by reqwest-backed integration tests.
	pub type ReqwestTestFetcher = Fetcher<ReqwestTransport>;

	/// Credentials fixture accepted by every mock server in the test suite.
	pub fn test_credentials() -> Credentials {
		Credentials::new("consumer-key", "consumer-secret", "oauth-token", "oauth-token-secret")
	}

	/// Points every service URL at the provided mock server base (e.g. `httpmock`'s
	/// `server.base_url()`).
	pub fn test_service_config(base_url: &str) -> ServiceConfig {
		let base = base_url.trim_end_matches('/');

		ServiceConfig::builder()
			.api_base(
				Url::parse(&format!("{base}/1.1/")).expect("Failed to parse mock API base URL."),
			)
			.oauth_base(
				Url::parse(&format!("{base}/oauth/")).expect("Failed to parse mock OAuth base URL."),
			)
			.authorize_url(
				Url::parse(&format!("{base}/oauth/authenticate"))
					.expect("Failed to parse mock authorize URL."),
			)
			.build()
	}

	/// Builds a reqwest client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_client() -> ReqwestClient {
		ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.")
	}

	/// Builds a reqwest transport pointed at the mock server.
	pub fn test_reqwest_transport(base_url: &str) -> ReqwestTransport {
		ReqwestTransport::with_client(test_reqwest_client(), test_service_config(base_url))
	}

	/// Constructs a [`Fetcher`] backed by [`test_credentials`] and the reqwest transport used
	/// across integration tests.
	pub fn build_reqwest_test_fetcher(base_url: &str) -> ReqwestTestFetcher {
		Fetcher::with_transport(
			CredentialSource::Resolved(test_credentials()),
			test_reqwest_transport(base_url),
		)
		.expect("Resolved credentials should never fail to construct a fetcher.")
		.with_config(test_service_config(base_url))
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map, Value};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

/// Crate version, as published.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate authors, as published.
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
/// License identifier, as published.
pub const LICENSE: &str = env!("CARGO_PKG_LICENSE");

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
