//! Credential store: holds, validates, and persists the four-secret tuple.
//!
//! The store keeps its data in one `[Auth]` section of an INI document with the unquoted keys
//! `consumer_key`, `consumer_secret`, `oauth_token`, and `oauth_token_secret`. Where the
//! document lives is up to the [`StoreBackend`]: [`FileBackend`] for real use,
//! [`MemoryBackend`] for tests and demos.

pub mod file;
pub mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

// std
use std::path::{Path, PathBuf};
// crates.io
use ini::Ini;
// self
use crate::{
	_prelude::*,
	auth::{Credentials, Secret},
	error::{AuthError, StoreError},
};

/// File name used when no explicit path is supplied.
pub const DEFAULT_FILENAME: &str = "tweetvac.cfg";
/// Section holding the credential keys.
pub const SECTION: &str = "Auth";

const CONSUMER_KEY: &str = "consumer_key";
const CONSUMER_SECRET: &str = "consumer_secret";
const OAUTH_TOKEN: &str = "oauth_token";
const OAUTH_TOKEN_SECRET: &str = "oauth_token_secret";

/// Raw text storage behind a [`CredentialStore`].
pub trait StoreBackend
where
	Self: Send + Sync,
{
	/// Where the document lives; used in error messages.
	fn location(&self) -> &Path;

	/// Returns the whole document, or `None` when it does not exist.
	fn read(&self) -> Result<Option<String>, StoreError>;

	/// Replaces the whole document.
	fn write(&self, contents: &str) -> Result<(), StoreError>;
}

/// Holds the credential tuple and moves it to and from a [`StoreBackend`].
///
/// Starts empty; [`load`](Self::load) or [`set`](Self::set) populate it and
/// [`save`](Self::save) persists it. A failed load leaves the store untouched.
#[derive(Clone)]
pub struct CredentialStore {
	backend: Arc<dyn StoreBackend>,
	credentials: Option<Credentials>,
}
impl CredentialStore {
	/// Creates an empty store over the provided backend.
	pub fn new(backend: impl 'static + StoreBackend) -> Self {
		Self { backend: Arc::new(backend), credentials: None }
	}

	/// Creates an empty store backed by the file at `path`.
	pub fn open(path: impl Into<PathBuf>) -> Self {
		Self::new(FileBackend::new(path))
	}

	/// Whether all four fields are populated and non-empty.
	pub fn is_loaded(&self) -> bool {
		self.credentials.as_ref().is_some_and(Credentials::is_complete)
	}

	/// Reads the four fields from the backend.
	pub fn load(&mut self) -> Result<()> {
		let contents = self.backend.read()?.ok_or_else(|| AuthError::MissingFile {
			path: self.backend.location().to_path_buf(),
		})?;

		self.credentials = Some(parse_document(&contents)?);

		Ok(())
	}

	/// Assigns the four fields verbatim.
	pub fn set(&mut self, credentials: impl Into<Credentials>) {
		self.credentials = Some(credentials.into());
	}

	/// Returns the current tuple, if any was loaded or set.
	pub fn get(&self) -> Option<&Credentials> {
		self.credentials.as_ref()
	}

	/// Writes the four fields to the backend, replacing the `[Auth]` section and keeping
	/// any other sections already present. Refuses to write a tuple with an empty field.
	pub fn save(&self) -> Result<()> {
		let credentials = self
			.credentials
			.as_ref()
			.filter(|credentials| credentials.is_complete())
			.ok_or(AuthError::Incomplete)?;
		// A document that does not parse is replaced wholesale; a failed read is not.
		let mut document = match self.backend.read()? {
			Some(contents) => Ini::load_from_str(&contents).unwrap_or_default(),
			None => Ini::new(),
		};

		document.delete(Some(SECTION));

		for (name, value) in [
			(CONSUMER_KEY, &credentials.consumer_key),
			(CONSUMER_SECRET, &credentials.consumer_secret),
			(OAUTH_TOKEN, &credentials.oauth_token),
			(OAUTH_TOKEN_SECRET, &credentials.oauth_token_secret),
		] {
			document.with_section(Some(SECTION)).set(name, value.expose());
		}

		let mut buffer = Vec::new();

		document.write_to(&mut buffer).map_err(|e| StoreError::Serialization {
			message: format!("Failed to render credential section: {e}"),
		})?;

		let serialized = String::from_utf8(buffer).map_err(|e| StoreError::Serialization {
			message: format!("Credential document is not UTF-8: {e}"),
		})?;

		self.backend.write(&serialized)?;

		Ok(())
	}

	/// Where the backing document lives.
	pub fn location(&self) -> &Path {
		self.backend.location()
	}
}
impl Default for CredentialStore {
	fn default() -> Self {
		Self::open(DEFAULT_FILENAME)
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialStore")
			.field("location", &self.backend.location())
			.field("loaded", &self.is_loaded())
			.finish()
	}
}

fn parse_document(contents: &str) -> Result<Credentials, AuthError> {
	let document =
		Ini::load_from_str(contents).map_err(|e| AuthError::Malformed { message: e.to_string() })?;
	let section = document
		.section(Some(SECTION))
		.ok_or_else(|| AuthError::MissingSection { section: SECTION.into() })?;
	let option = |name: &'static str| -> Result<Secret, AuthError> {
		section
			.get(name)
			.map(Secret::new)
			.ok_or_else(|| AuthError::MissingOption { section: SECTION.into(), option: name })
	};

	Ok(Credentials {
		consumer_key: option(CONSUMER_KEY)?,
		consumer_secret: option(CONSUMER_SECRET)?,
		oauth_token: option(OAUTH_TOKEN)?,
		oauth_token_secret: option(OAUTH_TOKEN_SECRET)?,
	})
}
