//! The four-secret OAuth 1.0a credential tuple plus the intermediate token pairs minted
//! during the PIN flow.

// self
use crate::{_prelude::*, auth::Secret};

/// Consumer key/secret plus the user's access token/secret.
///
/// Either fully populated or treated as absent: see [`Credentials::is_complete`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// Application (consumer) key.
	pub consumer_key: Secret,
	/// Application (consumer) secret.
	pub consumer_secret: Secret,
	/// User access token.
	pub oauth_token: Secret,
	/// User access token secret.
	pub oauth_token_secret: Secret,
}
impl Credentials {
	/// Builds credentials from the four raw strings, verbatim.
	pub fn new(
		consumer_key: impl Into<String>,
		consumer_secret: impl Into<String>,
		oauth_token: impl Into<String>,
		oauth_token_secret: impl Into<String>,
	) -> Self {
		Self {
			consumer_key: Secret::new(consumer_key),
			consumer_secret: Secret::new(consumer_secret),
			oauth_token: Secret::new(oauth_token),
			oauth_token_secret: Secret::new(oauth_token_secret),
		}
	}

	/// Whether all four fields are non-empty.
	pub fn is_complete(&self) -> bool {
		!(self.consumer_key.is_empty()
			|| self.consumer_secret.is_empty()
			|| self.oauth_token.is_empty()
			|| self.oauth_token_secret.is_empty())
	}

	/// Consumer half of the tuple.
	pub fn consumer(&self) -> ConsumerPair {
		ConsumerPair { key: self.consumer_key.clone(), secret: self.consumer_secret.clone() }
	}

	/// Access-token half of the tuple.
	pub fn token(&self) -> TokenPair {
		TokenPair { token: self.oauth_token.clone(), secret: self.oauth_token_secret.clone() }
	}

	/// Exposes the raw strings in `(consumer_key, consumer_secret, oauth_token,
	/// oauth_token_secret)` order.
	pub fn expose(&self) -> (&str, &str, &str, &str) {
		(
			self.consumer_key.expose(),
			self.consumer_secret.expose(),
			self.oauth_token.expose(),
			self.oauth_token_secret.expose(),
		)
	}
}
impl<A, B, C, D> From<(A, B, C, D)> for Credentials
where
	A: Into<String>,
	B: Into<String>,
	C: Into<String>,
	D: Into<String>,
{
	fn from((key, secret, token, token_secret): (A, B, C, D)) -> Self {
		Self::new(key, secret, token, token_secret)
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("consumer_key", &self.consumer_key)
			.field("complete", &self.is_complete())
			.finish()
	}
}

/// Application credentials registered with the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumerPair {
	/// Consumer key.
	pub key: Secret,
	/// Consumer secret.
	pub secret: Secret,
}
impl ConsumerPair {
	/// Wraps the two raw strings.
	pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { key: Secret::new(key), secret: Secret::new(secret) }
	}

	/// Completes the tuple with an access token pair.
	pub fn with_token(self, token: TokenPair) -> Credentials {
		Credentials {
			consumer_key: self.key,
			consumer_secret: self.secret,
			oauth_token: token.token,
			oauth_token_secret: token.secret,
		}
	}
}

/// OAuth token plus its signing secret (request token or access token).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenPair {
	/// Public token value.
	pub token: Secret,
	/// Token secret used for signing.
	pub secret: Secret,
}
impl TokenPair {
	/// Wraps the two raw strings.
	pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { token: Secret::new(token), secret: Secret::new(secret) }
	}
}
