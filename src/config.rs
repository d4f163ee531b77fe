//! Service configuration: base URLs and endpoint-specific response shapes.
//!
//! [`ServiceConfig::default`] targets the Twitter v1.1 REST API. Tests and alternate
//! deployments point the builder at their own hosts.

// self
use crate::_prelude::*;

const DEFAULT_API_BASE: &str = "https://api.twitter.com/1.1/";
const DEFAULT_OAUTH_BASE: &str = "https://api.twitter.com/oauth/";
const DEFAULT_AUTHORIZE_URL: &str = "https://api.twitter.com/oauth/authenticate";
const DEFAULT_SEARCH_ENDPOINT: &str = "search/tweets";
const DEFAULT_SEARCH_CONTAINER: &str = "statuses";
const DEFAULT_ENDPOINT_SUFFIX: &str = ".json";

/// Where the API lives and how its responses are shaped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
	/// Base URL that resource endpoints (e.g. `statuses/user_timeline`) are joined onto.
	pub api_base: Url,
	/// Base URL for `request_token` / `access_token`.
	pub oauth_base: Url,
	/// Page the operator visits to approve access and obtain a PIN.
	pub authorize_url: Url,
	/// Suffix appended to every resource endpoint.
	pub endpoint_suffix: String,
	/// Endpoint whose batch is nested inside [`ServiceConfig::search_container`].
	pub search_endpoint: String,
	/// Field holding the batch for the search endpoint.
	pub search_container: String,
}
impl ServiceConfig {
	/// Returns a builder seeded with the Twitter defaults.
	pub fn builder() -> ServiceConfigBuilder {
		ServiceConfigBuilder::default()
	}

	/// Field the batch is nested in for `endpoint`, if any.
	pub fn container_for(&self, endpoint: &str) -> Option<&str> {
		(endpoint.trim_matches('/') == self.search_endpoint)
			.then_some(self.search_container.as_str())
	}
}
impl Default for ServiceConfig {
	fn default() -> Self {
		ServiceConfigBuilder::default().build()
	}
}

/// Builder for [`ServiceConfig`] values.
#[derive(Debug)]
pub struct ServiceConfigBuilder {
	api_base: Url,
	oauth_base: Url,
	authorize_url: Url,
	endpoint_suffix: String,
	search_endpoint: String,
	search_container: String,
}
impl ServiceConfigBuilder {
	/// Overrides the resource base URL.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = url;

		self
	}

	/// Overrides the OAuth base URL.
	pub fn oauth_base(mut self, url: Url) -> Self {
		self.oauth_base = url;

		self
	}

	/// Overrides the authorization page URL.
	pub fn authorize_url(mut self, url: Url) -> Self {
		self.authorize_url = url;

		self
	}

	/// Overrides the endpoint suffix (use an empty string for extensionless APIs).
	pub fn endpoint_suffix(mut self, suffix: impl Into<String>) -> Self {
		self.endpoint_suffix = suffix.into();

		self
	}

	/// Overrides the search endpoint and the field its batch is nested in.
	pub fn search(mut self, endpoint: impl Into<String>, container: impl Into<String>) -> Self {
		self.search_endpoint = endpoint.into();
		self.search_container = container.into();

		self
	}

	/// Finalizes the configuration, normalizing base URLs so endpoints join beneath them.
	pub fn build(self) -> ServiceConfig {
		ServiceConfig {
			api_base: with_trailing_slash(self.api_base),
			oauth_base: with_trailing_slash(self.oauth_base),
			authorize_url: self.authorize_url,
			endpoint_suffix: self.endpoint_suffix,
			search_endpoint: self.search_endpoint.trim_matches('/').to_owned(),
			search_container: self.search_container,
		}
	}
}
impl Default for ServiceConfigBuilder {
	fn default() -> Self {
		Self {
			api_base: builtin_url(DEFAULT_API_BASE),
			oauth_base: builtin_url(DEFAULT_OAUTH_BASE),
			authorize_url: builtin_url(DEFAULT_AUTHORIZE_URL),
			endpoint_suffix: DEFAULT_ENDPOINT_SUFFIX.into(),
			search_endpoint: DEFAULT_SEARCH_ENDPOINT.into(),
			search_container: DEFAULT_SEARCH_CONTAINER.into(),
		}
	}
}

// Only called with the `DEFAULT_*` constants above, all of which are absolute URLs.
fn builtin_url(raw: &'static str) -> Url {
	Url::parse(raw).expect("Built-in service URLs are valid.")
}

fn with_trailing_slash(mut url: Url) -> Url {
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	url
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_target_twitter() {
		let config = ServiceConfig::default();

		assert_eq!(config.api_base.as_str(), "https://api.twitter.com/1.1/");
		assert_eq!(config.oauth_base.as_str(), "https://api.twitter.com/oauth/");
		assert_eq!(config.container_for("search/tweets"), Some("statuses"));
		assert_eq!(config.container_for("statuses/user_timeline"), None);
	}

	#[test]
	fn builder_normalizes_base_paths() {
		let config = ServiceConfig::builder()
			.api_base(Url::parse("http://127.0.0.1:9000/1.1").expect("Fixture URL should parse."))
			.search("/search/all/", "results")
			.build();

		assert_eq!(config.api_base.as_str(), "http://127.0.0.1:9000/1.1/");
		assert_eq!(config.container_for("search/all"), Some("results"));
	}
}
