//! Transport primitives for paginated API calls and the OAuth 1.0a token exchange.
//!
//! The module exposes [`ApiTransport`] and [`TokenExchange`] alongside [`ResponseMetadata`]
//! and [`ResponseMetadataSlot`] so callers can plug in custom HTTP clients without losing
//! rate-limit introspection. Implementations call [`ResponseMetadataSlot::take`] before
//! dispatching a request and [`ResponseMetadataSlot::store`] once an HTTP status and
//! headers are known, which lets the fetch loop stop before the budget runs dry.

// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	StatusCode,
	header::{AUTHORIZATION, HeaderMap, RETRY_AFTER},
};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	auth::{ConsumerPair, Credentials, TokenPair},
	error::HttpError,
};
#[cfg(feature = "reqwest")] use crate::{config::ServiceConfig, oauth::Signer};

/// Query parameters sent with a resource request.
pub type QueryParams = BTreeMap<String, String>;

/// Boxed future returned by transport operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CallError>> + 'a + Send>>;

/// The three failure classes a transport reports.
#[derive(Debug, ThisError)]
pub enum CallError {
	/// Credentials were rejected.
	#[error("Request was not authorized (HTTP {status}): {message}.")]
	Unauthorized {
		/// HTTP status code.
		status: u16,
		/// Server-supplied explanation.
		message: String,
	},
	/// The request budget for the current window is spent.
	#[error("Rate limit exceeded.")]
	RateLimited {
		/// How long until the budget refills, when the server says.
		retry_after: Option<Duration>,
	},
	/// Any other failure.
	#[error(transparent)]
	Failed(#[from] HttpError),
}

/// Resource retrieval capability used by [`crate::fetch::Fetcher`].
///
/// Implementations must be `Send + Sync + 'static` so fetchers can be moved across tasks,
/// and the futures they return must be `Send`.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Issues one signed `GET` for `endpoint` with `params` and returns the decoded body.
	///
	/// # Metadata Contract
	///
	/// - Call [`ResponseMetadataSlot::take`] before submitting the request so stale
	///   information never leaks across calls.
	/// - Once a response (successful or erroneous) provides status and headers, save them with
	///   [`ResponseMetadataSlot::store`].
	fn get<'a>(
		&'a self,
		credentials: &'a Credentials,
		endpoint: &'a str,
		params: &'a QueryParams,
		slot: ResponseMetadataSlot,
	) -> TransportFuture<'a, Value>;
}

/// Temporary request token plus the page where the operator approves it.
#[derive(Clone, Debug)]
pub struct RequestToken {
	/// Request token and its signing secret.
	pub pair: TokenPair,
	/// Authorization page carrying the request token.
	pub authorize_url: Url,
}

/// Token minting capability used by [`crate::helper::CredentialHelper`].
pub trait TokenExchange
where
	Self: 'static + Send + Sync,
{
	/// Obtains a temporary request token for out-of-band (PIN) authorization.
	fn request_token<'a>(&'a self, consumer: &'a ConsumerPair)
	-> TransportFuture<'a, RequestToken>;

	/// Trades an approved request token and its PIN for the permanent token pair.
	fn access_token<'a>(
		&'a self,
		consumer: &'a ConsumerPair,
		request: &'a TokenPair,
		pin: &'a str,
	) -> TransportFuture<'a, TokenPair>;
}

/// Captures metadata from the most recent HTTP response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Requests left in the current window (`x-rate-limit-remaining`).
	pub rate_limit_remaining: Option<u32>,
	/// Instant the window resets (`x-rate-limit-reset`).
	pub rate_limit_reset: Option<OffsetDateTime>,
}
impl ResponseMetadata {
	/// Whether the server reported exactly zero requests left.
	pub fn budget_exhausted(&self) -> bool {
		self.rate_limit_remaining == Some(0)
	}

	/// Best available wait before the next request may succeed.
	pub fn wait_hint(&self, now: OffsetDateTime) -> Option<Duration> {
		self.retry_after.or_else(|| {
			self.rate_limit_reset.map(|reset| reset - now).filter(|delta| delta.is_positive())
		})
	}
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between a transport and its caller.
///
/// The fetch loop creates a fresh slot for each request and reads the captured metadata
/// immediately after the transport resolves.
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

/// Default transport: reqwest plus OAuth 1.0a signing against a [`ServiceConfig`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	config: ServiceConfig,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Transport against the default (Twitter) service configuration.
	pub fn new() -> Self {
		Self::default()
	}

	/// Transport against a custom service configuration.
	pub fn with_config(config: ServiceConfig) -> Self {
		Self { client: ReqwestClient::default(), config }
	}

	/// Wraps an existing reqwest [`ReqwestClient`] (timeouts, proxies, etc. live there).
	pub fn with_client(client: ReqwestClient, config: ServiceConfig) -> Self {
		Self { client, config }
	}

	/// Service configuration used to build URLs.
	pub fn config(&self) -> &ServiceConfig {
		&self.config
	}

	fn resource_url(&self, endpoint: &str, params: &QueryParams) -> Result<Url, HttpError> {
		let path = format!("{}{}", endpoint.trim_matches('/'), self.config.endpoint_suffix);
		let mut url = self.config.api_base.join(&path).map_err(|source| {
			HttpError::InvalidEndpoint { endpoint: endpoint.to_owned(), source }
		})?;

		if !params.is_empty() {
			url.query_pairs_mut().extend_pairs(params.iter());
		}

		Ok(url)
	}

	fn oauth_url(&self, step: &str) -> Result<Url, HttpError> {
		self.config
			.oauth_base
			.join(step)
			.map_err(|source| HttpError::InvalidEndpoint { endpoint: step.to_owned(), source })
	}

	async fn post_oauth(
		&self,
		step: &str,
		signer: Signer<'_>,
		extra: &[(&str, &str)],
	) -> Result<TokenPair, CallError> {
		let url = self.oauth_url(step)?;
		let header = signer.authorization_header("POST", &url, &[], extra);
		let response =
			self.client.post(url).header(AUTHORIZATION, header).send().await.map_err(HttpError::from)?;
		let status = response.status();
		let metadata = ResponseMetadata::from_headers(status, response.headers());
		let body = response.bytes().await.map_err(HttpError::from)?;

		classify(status, &metadata, &body)?;

		parse_token_pair(&body)
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn get<'a>(
		&'a self,
		credentials: &'a Credentials,
		endpoint: &'a str,
		params: &'a QueryParams,
		slot: ResponseMetadataSlot,
	) -> TransportFuture<'a, Value> {
		Box::pin(async move {
			slot.take();

			let url = self.resource_url(endpoint, params)?;
			let header = Signer::credentials(credentials).authorization_header("GET", &url, &[], &[]);
			let response = self
				.client
				.get(url)
				.header(AUTHORIZATION, header)
				.send()
				.await
				.map_err(HttpError::from)?;
			let status = response.status();
			let metadata = ResponseMetadata::from_headers(status, response.headers());

			slot.store(metadata.clone());

			let body = response.bytes().await.map_err(HttpError::from)?;

			classify(status, &metadata, &body)?;

			let mut deserializer = serde_json::Deserializer::from_slice(&body);

			Ok(serde_path_to_error::deserialize(&mut deserializer)
				.map_err(|source| HttpError::Decode { source })?)
		})
	}
}
#[cfg(feature = "reqwest")]
impl TokenExchange for ReqwestTransport {
	fn request_token<'a>(
		&'a self,
		consumer: &'a ConsumerPair,
	) -> TransportFuture<'a, RequestToken> {
		Box::pin(async move {
			let pair = self
				.post_oauth("request_token", Signer::consumer(consumer), &[("oauth_callback", "oob")])
				.await?;
			let mut authorize_url = self.config.authorize_url.clone();

			authorize_url.query_pairs_mut().append_pair("oauth_token", pair.token.expose());

			Ok(RequestToken { pair, authorize_url })
		})
	}

	fn access_token<'a>(
		&'a self,
		consumer: &'a ConsumerPair,
		request: &'a TokenPair,
		pin: &'a str,
	) -> TransportFuture<'a, TokenPair> {
		Box::pin(async move {
			let signer = Signer::consumer(consumer).with_token(request);

			self.post_oauth("access_token", signer, &[("oauth_verifier", pin)]).await
		})
	}
}

#[cfg(feature = "reqwest")]
impl ResponseMetadata {
	fn from_headers(status: StatusCode, headers: &HeaderMap) -> Self {
		Self {
			status: Some(status.as_u16()),
			retry_after: parse_retry_after(headers),
			rate_limit_remaining: header_str(headers, "x-rate-limit-remaining")
				.and_then(|raw| raw.parse().ok()),
			rate_limit_reset: header_str(headers, "x-rate-limit-reset")
				.and_then(|raw| raw.parse::<i64>().ok())
				.and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok()),
		}
	}
}

#[cfg(feature = "reqwest")]
fn classify(status: StatusCode, meta: &ResponseMetadata, body: &[u8]) -> Result<(), CallError> {
	match status.as_u16() {
		_ if status.is_success() => Ok(()),
		401 => Err(CallError::Unauthorized {
			status: status.as_u16(),
			message: error_message(status, body),
		}),
		// 420 is the legacy "Enhance Your Calm" rate-limit status.
		420 | 429 =>
			Err(CallError::RateLimited { retry_after: meta.wait_hint(OffsetDateTime::now_utc()) }),
		code => Err(HttpError::Status { status: code, message: error_message(status, body) }.into()),
	}
}

#[cfg(feature = "reqwest")]
fn error_message(status: StatusCode, body: &[u8]) -> String {
	#[derive(Deserialize)]
	struct ErrorBody {
		errors: Vec<ErrorEntry>,
	}
	#[derive(Deserialize)]
	struct ErrorEntry {
		message: String,
	}

	if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
		if !parsed.errors.is_empty() {
			return parsed
				.errors
				.into_iter()
				.map(|entry| entry.message)
				.collect::<Vec<_>>()
				.join("; ");
		}
	}

	let text = String::from_utf8_lossy(body);
	let text = text.trim();

	if text.is_empty() {
		status.canonical_reason().unwrap_or("unknown error").to_owned()
	} else {
		text.chars().take(200).collect()
	}
}

#[cfg(feature = "reqwest")]
fn parse_token_pair(body: &[u8]) -> Result<TokenPair, CallError> {
	let mut token = None;
	let mut secret = None;

	for (key, value) in url::form_urlencoded::parse(body) {
		match key.as_ref() {
			"oauth_token" => token = Some(value.into_owned()),
			"oauth_token_secret" => secret = Some(value.into_owned()),
			_ => {},
		}
	}

	match (token, secret) {
		(Some(token), Some(secret)) => Ok(TokenPair::new(token, secret)),
		_ => Err(HttpError::UnexpectedShape {
			message: "token response lacks oauth_token or oauth_token_secret".into(),
		}
		.into()),
	}
}

#[cfg(feature = "reqwest")]
fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
	headers.get(name)?.to_str().ok().map(str::trim)
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let raw = header_str(headers, RETRY_AFTER.as_str())?;

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
