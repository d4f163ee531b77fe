//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1).
//!
//! [`Signer`] turns a method, URL, and parameter list into the `Authorization` header value
//! expected by the API. Query-string parameters are read from the URL itself; form body
//! parameters and protocol extras (`oauth_callback`, `oauth_verifier`) are passed alongside.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::{Rng, distr::Alphanumeric};
use sha1::Sha1;
use url::Position;
// self
use crate::{
	_prelude::*,
	auth::{ConsumerPair, Credentials, TokenPair},
};

type HmacSha1 = Hmac<Sha1>;

const NONCE_LEN: usize = 32;
const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
// RFC 5849 section 3.6: everything except ALPHA, DIGIT, '-', '.', '_', '~'.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Signs requests on behalf of a consumer and, optionally, a token holder.
#[derive(Clone, Copy)]
pub struct Signer<'a> {
	consumer_key: &'a str,
	consumer_secret: &'a str,
	token: Option<(&'a str, &'a str)>,
}
impl<'a> Signer<'a> {
	/// Signs as the application only (used to obtain a request token).
	pub fn consumer(consumer: &'a ConsumerPair) -> Self {
		Self {
			consumer_key: consumer.key.expose(),
			consumer_secret: consumer.secret.expose(),
			token: None,
		}
	}

	/// Signs as the user identified by the full credential tuple.
	pub fn credentials(credentials: &'a Credentials) -> Self {
		Self {
			consumer_key: credentials.consumer_key.expose(),
			consumer_secret: credentials.consumer_secret.expose(),
			token: Some((credentials.oauth_token.expose(), credentials.oauth_token_secret.expose())),
		}
	}

	/// Adds (or replaces) the token used for signing.
	pub fn with_token(mut self, token: &'a TokenPair) -> Self {
		self.token = Some((token.token.expose(), token.secret.expose()));

		self
	}

	/// Builds the `Authorization` header for a request, using a fresh nonce and the current
	/// time.
	///
	/// `body` holds form-encoded body parameters (empty for `GET`); `extra` holds additional
	/// `oauth_*` protocol parameters that belong in the header.
	pub fn authorization_header(
		&self,
		method: &str,
		url: &Url,
		body: &[(String, String)],
		extra: &[(&str, &str)],
	) -> String {
		let nonce = random_nonce();
		let timestamp = OffsetDateTime::now_utc().unix_timestamp();

		self.authorization_header_at(method, url, body, extra, &nonce, timestamp)
	}

	pub(crate) fn authorization_header_at(
		&self,
		method: &str,
		url: &Url,
		body: &[(String, String)],
		extra: &[(&str, &str)],
		nonce: &str,
		timestamp: i64,
	) -> String {
		let mut protocol = self.protocol_params(extra, nonce, timestamp);
		let signature = self.signature(method, url, body, &protocol);

		protocol.insert("oauth_signature".into(), signature);

		let rendered = protocol
			.iter()
			.map(|(key, value)| format!("{}=\"{}\"", encode(key), encode(value)))
			.collect::<Vec<_>>()
			.join(", ");

		format!("OAuth {rendered}")
	}

	fn protocol_params(
		&self,
		extra: &[(&str, &str)],
		nonce: &str,
		timestamp: i64,
	) -> BTreeMap<String, String> {
		let mut params = BTreeMap::new();

		params.insert("oauth_consumer_key".into(), self.consumer_key.to_owned());
		params.insert("oauth_nonce".into(), nonce.to_owned());
		params.insert("oauth_signature_method".into(), SIGNATURE_METHOD.into());
		params.insert("oauth_timestamp".into(), timestamp.to_string());
		params.insert("oauth_version".into(), OAUTH_VERSION.into());

		if let Some((token, _)) = self.token {
			params.insert("oauth_token".into(), token.to_owned());
		}
		for (key, value) in extra {
			params.insert((*key).to_owned(), (*value).to_owned());
		}

		params
	}

	fn signature(
		&self,
		method: &str,
		url: &Url,
		body: &[(String, String)],
		protocol: &BTreeMap<String, String>,
	) -> String {
		let base = base_string(method, url, body, protocol);
		let key = format!(
			"{}&{}",
			encode(self.consumer_secret),
			encode(self.token.map(|(_, secret)| secret).unwrap_or_default())
		);
		// HMAC pads or hashes the key to the block size, so no key length is rejected.
		let mut mac =
			HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length.");

		mac.update(base.as_bytes());

		STANDARD.encode(mac.finalize().into_bytes())
	}
}
impl Debug for Signer<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Signer").field("has_token", &self.token.is_some()).finish()
	}
}

fn base_string(
	method: &str,
	url: &Url,
	body: &[(String, String)],
	protocol: &BTreeMap<String, String>,
) -> String {
	let mut pairs = url
		.query_pairs()
		.map(|(key, value)| (encode(&key), encode(&value)))
		.chain(body.iter().map(|(key, value)| (encode(key), encode(value))))
		.chain(protocol.iter().map(|(key, value)| (encode(key), encode(value))))
		.collect::<Vec<_>>();

	pairs.sort();

	let normalized = pairs
		.iter()
		.map(|(key, value)| format!("{key}={value}"))
		.collect::<Vec<_>>()
		.join("&");

	format!(
		"{}&{}&{}",
		method.to_ascii_uppercase(),
		encode(&url[..Position::AfterPath]),
		encode(&normalized)
	)
}

fn encode(value: &str) -> String {
	utf8_percent_encode(value, UNRESERVED).to_string()
}

fn random_nonce() -> String {
	rand::rng().sample_iter(Alphanumeric).take(NONCE_LEN).map(char::from).collect()
}
