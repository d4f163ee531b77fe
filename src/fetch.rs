//! Bounded, cursor-driven retrieval of paginated result sets.
//!
//! [`Fetcher::fetch`] walks an endpoint that pages backwards by `max_id`, applying caller
//! filters to every batch and stopping on the first of:
//!
//! - an empty batch (the server has nothing older),
//! - a cutoff predicate accepting the last retained item of a batch,
//! - `max_requests` round trips,
//! - a rate-limit response, or a response reporting zero requests left in the window.
//!
//! Rate limiting is a normal way for a fetch to end: the items gathered so far are returned
//! and [`Fetcher::hit_rate_limit`] reports it. Authorization and transport failures abort
//! the fetch and discard partial results.

// std
use std::ops::Deref;
// self
use crate::{
	_prelude::*,
	auth::Credentials,
	config::ServiceConfig,
	error::{AuthError, HttpError},
	http::{ApiTransport, CallError, QueryParams, ResponseMetadata, ResponseMetadataSlot},
	obs::{self, OpSpan, Operation, Outcome},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Query parameter carrying the cursor.
pub const MAX_ID: &str = "max_id";

/// Caller-supplied test over a single item.
pub type Predicate = Box<dyn Fn(&Item) -> bool + Send + Sync>;

#[cfg(feature = "reqwest")]
/// Fetcher specialized for the crate's default reqwest transport.
pub type ReqwestFetcher = Fetcher<ReqwestTransport>;

/// One record returned by the API: an integer `id` plus every other field, untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
	/// Identifier the cursor is derived from.
	pub id: u64,
	/// Remaining fields.
	#[serde(flatten)]
	pub fields: Map<String, Value>,
}
impl Item {
	/// Creates an item with no fields besides `id`.
	pub fn new(id: u64) -> Self {
		Self { id, fields: Map::new() }
	}

	/// Adds a field.
	pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.fields.insert(name.into(), value.into());

		self
	}

	/// Looks up a field other than `id`.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.fields.get(name)
	}
}

/// Everything that shapes one fetch: endpoint, query, and caller policies.
pub struct FetchRequest {
	endpoint: String,
	params: QueryParams,
	cutoff: Option<Predicate>,
	filters: Vec<Predicate>,
	max_requests: usize,
}
impl FetchRequest {
	/// Round trips allowed when the caller does not say otherwise.
	pub const DEFAULT_MAX_REQUESTS: usize = 15;

	/// Starts a request for `endpoint` (e.g. `statuses/user_timeline`).
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self {
			endpoint: endpoint.into(),
			params: QueryParams::new(),
			cutoff: None,
			filters: Vec::new(),
			max_requests: Self::DEFAULT_MAX_REQUESTS,
		}
	}

	/// Adds one query parameter.
	pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
		self.params.insert(name.into(), value.to_string());

		self
	}

	/// Adds several query parameters. The caller's map is copied, never mutated.
	pub fn params<I, K, V>(mut self, params: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: ToString,
	{
		self.params.extend(params.into_iter().map(|(k, v)| (k.into(), v.to_string())));

		self
	}

	/// Stops the fetch once `cutoff` accepts the last retained item of a batch; every item it
	/// accepts in that batch is dropped.
	pub fn cutoff(mut self, cutoff: impl 'static + Fn(&Item) -> bool + Send + Sync) -> Self {
		self.cutoff = Some(Box::new(cutoff));

		self
	}

	/// Appends a filter; items it rejects are dropped from every batch. Filters run in the
	/// order they were added.
	pub fn filter(mut self, filter: impl 'static + Fn(&Item) -> bool + Send + Sync) -> Self {
		self.filters.push(Box::new(filter));

		self
	}

	/// Bounds the number of round trips.
	pub fn max_requests(mut self, max_requests: usize) -> Self {
		self.max_requests = max_requests;

		self
	}

	/// Endpoint being fetched.
	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}
}
impl Debug for FetchRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FetchRequest")
			.field("endpoint", &self.endpoint)
			.field("params", &self.params)
			.field("cutoff", &self.cutoff.is_some())
			.field("filters", &self.filters.len())
			.field("max_requests", &self.max_requests)
			.finish()
	}
}

/// Why a fetch loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StopReason {
	/// The server returned an empty batch.
	Exhausted,
	/// The cutoff accepted the last retained item of a batch.
	Cutoff,
	/// `max_requests` round trips were made.
	MaxRequests,
	/// The server refused a request, or reported no budget left.
	RateLimited,
}
impl StopReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StopReason::Exhausted => "exhausted",
			StopReason::Cutoff => "cutoff",
			StopReason::MaxRequests => "max_requests",
			StopReason::RateLimited => "rate_limited",
		}
	}
}
impl Display for StopReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Retained items from one fetch, in server order.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultSet {
	/// Items that survived filters and cutoff.
	pub items: Vec<Item>,
	/// Round trips issued, including a rate-limited or empty final one.
	pub requests: usize,
	/// Why the loop ended.
	pub stop: StopReason,
	/// `max_id` that resumes where this fetch left off, if any batch was received.
	pub next_max_id: Option<u64>,
}
impl ResultSet {
	/// Whether the fetch ended because of the rate limit.
	pub fn hit_rate_limit(&self) -> bool {
		self.stop == StopReason::RateLimited
	}

	/// Consumes the set, returning the items.
	pub fn into_items(self) -> Vec<Item> {
		self.items
	}
}
impl Deref for ResultSet {
	type Target = [Item];

	fn deref(&self) -> &Self::Target {
		&self.items
	}
}
impl IntoIterator for ResultSet {
	type IntoIter = std::vec::IntoIter<Item>;
	type Item = Item;

	fn into_iter(self) -> Self::IntoIter {
		self.items.into_iter()
	}
}

/// Where a [`Fetcher`] gets its credentials: already resolved, or a store that is loaded
/// on demand.
#[derive(Debug)]
pub enum CredentialSource {
	/// Credentials used verbatim.
	Resolved(Credentials),
	/// Store that is loaded during construction unless it already is.
	Store(CredentialStore),
}
impl CredentialSource {
	/// Produces the credential tuple, loading the store if needed.
	pub fn resolve(self) -> Result<Credentials> {
		match self {
			Self::Resolved(credentials) => Ok(credentials),
			Self::Store(mut store) => {
				if !store.is_loaded() {
					store.load()?;
				}

				store.get().cloned().ok_or_else(|| AuthError::Incomplete.into())
			},
		}
	}
}
impl From<Credentials> for CredentialSource {
	fn from(credentials: Credentials) -> Self {
		Self::Resolved(credentials)
	}
}
impl From<CredentialStore> for CredentialSource {
	fn from(store: CredentialStore) -> Self {
		Self::Store(store)
	}
}

/// Runs bounded pagination loops against one transport with one credential tuple.
///
/// A fetcher may be reused for any number of sequential fetches; each resets the rate-limit
/// flag. `fetch` takes `&mut self`, so one instance never runs two loops at once.
pub struct Fetcher<T>
where
	T: ApiTransport,
{
	transport: T,
	credentials: Credentials,
	config: ServiceConfig,
	hit_rate_limit: bool,
	last_response: Option<ResponseMetadata>,
}
impl<T> Fetcher<T>
where
	T: ApiTransport,
{
	/// Creates a fetcher over the provided transport.
	///
	/// Loads the credential store if the source is an unloaded store; fails with
	/// [`AuthError`] if that load fails.
	pub fn with_transport(source: impl Into<CredentialSource>, transport: T) -> Result<Self> {
		Ok(Self {
			transport,
			credentials: source.into().resolve()?,
			config: ServiceConfig::default(),
			hit_rate_limit: false,
			last_response: None,
		})
	}

	/// Overrides the service configuration used to interpret responses.
	pub fn with_config(mut self, config: ServiceConfig) -> Self {
		self.config = config;

		self
	}

	/// Whether the most recent fetch ended because of the rate limit.
	pub fn hit_rate_limit(&self) -> bool {
		self.hit_rate_limit
	}

	/// Metadata of the most recent response, for inspecting the remaining budget.
	pub fn last_response(&self) -> Option<&ResponseMetadata> {
		self.last_response.as_ref()
	}

	/// Credentials every request is signed with.
	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	/// Underlying transport.
	pub fn transport(&self) -> &T {
		&self.transport
	}

	/// Runs one pagination loop and returns the retained items.
	///
	/// Never fails because of rate limiting or running out of data; fails with
	/// [`Error::Auth`] when the credentials are rejected and [`Error::Http`] on any other
	/// transport failure.
	pub async fn fetch(&mut self, request: FetchRequest) -> Result<ResultSet> {
		const OP: Operation = Operation::Fetch;

		let span = OpSpan::new(OP, "fetch");

		obs::record_outcome(OP, Outcome::Attempt);

		self.hit_rate_limit = false;

		let result = span.instrument(self.run(request)).await;

		match &result {
			Ok(set) if set.hit_rate_limit() => obs::record_outcome(OP, Outcome::RateLimited),
			Ok(_) => obs::record_outcome(OP, Outcome::Success),
			Err(_) => obs::record_outcome(OP, Outcome::Failure),
		}

		result
	}

	async fn run(&mut self, request: FetchRequest) -> Result<ResultSet> {
		let FetchRequest { endpoint, mut params, cutoff, filters, max_requests } = request;
		let container = self.config.container_for(&endpoint).map(str::to_owned);
		let mut items = Vec::new();
		let mut requests = 0;
		let mut next_max_id = None;
		let stop = loop {
			if requests >= max_requests {
				break StopReason::MaxRequests;
			}

			let slot = ResponseMetadataSlot::default();
			let outcome =
				self.transport.get(&self.credentials, &endpoint, &params, slot.clone()).await;

			requests += 1;
			self.last_response = slot.take();

			let body = match outcome {
				Ok(body) => body,
				Err(CallError::RateLimited { retry_after }) => {
					self.hit_rate_limit = true;
					obs::rate_limit_hit(requests, retry_after);

					break StopReason::RateLimited;
				},
				Err(CallError::Unauthorized { status, message }) =>
					return Err(AuthError::Rejected { status: Some(status), reason: message }.into()),
				Err(CallError::Failed(e)) => return Err(e.into()),
			};
			let mut batch = decode_batch(body, container.as_deref())?;
			// The cursor follows what the server sent, not what the caller kept.
			let Some(last_seen) = batch.last().map(|item| item.id) else {
				break StopReason::Exhausted;
			};
			let received = batch.len();

			for filter in &filters {
				batch.retain(|item| filter(item));
			}

			let cut = match &cutoff {
				Some(cutoff) if batch.last().is_some_and(|item| cutoff(item)) => {
					batch.retain(|item| !cutoff(item));

					true
				},
				_ => false,
			};
			let remaining = self.last_response.as_ref().and_then(|meta| meta.rate_limit_remaining);

			obs::batch_received(requests, received, batch.len(), remaining);
			obs::record_items(&endpoint, batch.len());
			items.extend(batch);

			let cursor = last_seen.saturating_sub(1);

			params.insert(MAX_ID.into(), cursor.to_string());
			next_max_id = Some(cursor);

			if cut {
				break StopReason::Cutoff;
			}
			if requests >= max_requests {
				break StopReason::MaxRequests;
			}
			if let Some(meta) = self.last_response.as_ref().filter(|meta| meta.budget_exhausted()) {
				self.hit_rate_limit = true;
				obs::rate_limit_hit(requests, meta.wait_hint(OffsetDateTime::now_utc()));

				break StopReason::RateLimited;
			}
		};

		obs::fetch_stopped(stop.as_str(), requests, items.len());

		Ok(ResultSet { items, requests, stop, next_max_id })
	}
}
#[cfg(feature = "reqwest")]
impl Fetcher<ReqwestTransport> {
	/// Creates a fetcher that talks to the default (Twitter) service over reqwest.
	pub fn new(source: impl Into<CredentialSource>) -> Result<Self> {
		Self::with_service(source, ServiceConfig::default())
	}

	/// Creates a reqwest-backed fetcher for a custom service configuration.
	pub fn with_service(source: impl Into<CredentialSource>, config: ServiceConfig) -> Result<Self> {
		Ok(Self::with_transport(source, ReqwestTransport::with_config(config.clone()))?
			.with_config(config))
	}
}
impl<T> Debug for Fetcher<T>
where
	T: ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Fetcher")
			.field("credentials", &self.credentials)
			.field("hit_rate_limit", &self.hit_rate_limit)
			.field("last_response", &self.last_response)
			.finish()
	}
}

fn decode_batch(body: Value, container: Option<&str>) -> Result<Vec<Item>, HttpError> {
	let body = match (container, body) {
		(None, body) => body,
		(Some(field), Value::Object(mut envelope)) =>
			envelope.remove(field).ok_or_else(|| HttpError::UnexpectedShape {
				message: format!("response lacks the `{field}` field"),
			})?,
		(Some(field), _) =>
			return Err(HttpError::UnexpectedShape {
				message: format!("expected an object holding `{field}`"),
			}),
	};

	serde_path_to_error::deserialize(body).map_err(|source| HttpError::Decode { source })
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn items_keep_unknown_fields() {
		let batch = decode_batch(json!([{ "id": 7, "text": "hello", "lang": "en" }]), None)
			.expect("Array of items should decode.");

		assert_eq!(batch, vec![Item::new(7).with_field("text", "hello").with_field("lang", "en")]);
		assert_eq!(batch[0].get("text"), Some(&json!("hello")));
	}

	#[test]
	fn search_batches_are_unwrapped() {
		let body = json!({ "statuses": [{ "id": 3 }, { "id": 2 }], "search_metadata": {} });
		let batch = decode_batch(body, Some("statuses")).expect("Search envelope should decode.");

		assert_eq!(batch.iter().map(|item| item.id).collect::<Vec<_>>(), vec![3, 2]);
	}

	#[test]
	fn malformed_batches_are_http_errors() {
		assert!(matches!(
			decode_batch(json!({ "search_metadata": {} }), Some("statuses")),
			Err(HttpError::UnexpectedShape { .. })
		));

		let err = decode_batch(json!([{ "id": "not-a-number" }]), None)
			.expect_err("String ids should not decode.");

		match err {
			HttpError::Decode { source } => assert_eq!(source.path().to_string(), "[0].id"),
			other => panic!("Expected a decode error, got {other:?}."),
		}
	}

	#[test]
	fn request_builder_copies_params() {
		let caller_params = BTreeMap::from([("screen_name", "cash")]);
		let request = FetchRequest::new("statuses/user_timeline")
			.params(caller_params.clone())
			.param("count", 200)
			.max_requests(3);

		assert_eq!(request.params.get("screen_name").map(String::as_str), Some("cash"));
		assert_eq!(request.params.get("count").map(String::as_str), Some("200"));
		assert_eq!(request.max_requests, 3);
		assert_eq!(caller_params.len(), 1);
	}

	#[test]
	fn resolved_source_is_used_verbatim() {
		let credentials = CredentialSource::from(Credentials::new("", "", "", ""))
			.resolve()
			.expect("Resolved credentials should never fail.");

		assert!(!credentials.is_complete());
	}
}
