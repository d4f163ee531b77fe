//! File-backed [`StoreBackend`] writing the credential document to disk.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{error::StoreError, store::StoreBackend};

/// Persists the credential document to a single file.
///
/// Writes go through a sibling `.tmp` file that is synced and renamed over the target, so
/// a crash mid-write never leaves a truncated document. There is no locking against other
/// writers: the last rename wins.
#[derive(Clone, Debug)]
pub struct FileBackend {
	path: PathBuf,
}
impl FileBackend {
	/// Targets the file at `path`; nothing is touched until the first read or write.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	fn io_error(path: &Path, source: std::io::Error) -> StoreError {
		StoreError::Io { path: path.to_path_buf(), source }
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| Self::io_error(parent, e))?;
		}

		Ok(())
	}
}
impl StoreBackend for FileBackend {
	fn location(&self) -> &Path {
		&self.path
	}

	fn read(&self) -> Result<Option<String>, StoreError> {
		match fs::read_to_string(&self.path) {
			Ok(contents) => Ok(Some(contents)),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
			Err(e) => Err(Self::io_error(&self.path, e)),
		}
	}

	fn write(&self, contents: &str) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| Self::io_error(&tmp_path, e))?;

			file.write_all(contents.as_bytes()).map_err(|e| Self::io_error(&tmp_path, e))?;
			file.sync_all().map_err(|e| Self::io_error(&tmp_path, e))?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| Self::io_error(&self.path, e))
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;
	use crate::{_prelude::*, error::AuthError, store::CredentialStore};

	fn temp_path(tag: &str) -> PathBuf {
		let unique = format!(
			"tweetvac_file_backend_{tag}_{}_{}.cfg",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path("round_trip");
		let mut store = CredentialStore::open(&path);

		store.set(("consumer-key", "consumer-secret", "oauth-token", "oauth-token-secret"));
		store.save().expect("Failed to save credentials to the file backend.");

		let mut reopened = CredentialStore::open(&path);

		reopened.load().expect("Failed to reload credentials from the file backend.");

		assert!(reopened.is_loaded());
		assert_eq!(reopened.get(), store.get());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary credential file {}: {e}", path.display())
		});
	}

	#[test]
	fn missing_file_is_an_auth_error() {
		let mut store = CredentialStore::open(temp_path("missing"));

		assert!(matches!(
			store.load().expect_err("Absent file should not load."),
			Error::Auth(AuthError::MissingFile { .. })
		));
	}

	#[test]
	fn undecodable_file_is_left_untouched_on_save() {
		let path = temp_path("non_utf8");
		let original = b"[Other]\nkeep = \xff\xfe\n".to_vec();

		fs::write(&path, &original).expect("Failed to seed non-UTF-8 credential file.");

		let mut store = CredentialStore::open(&path);

		store.set(("k", "s", "t", "ts"));

		assert!(matches!(
			store.save().expect_err("Unreadable document should not be overwritten."),
			Error::Storage(StoreError::Io { .. })
		));
		assert_eq!(fs::read(&path).expect("Seeded file should still exist."), original);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary credential file {}: {e}", path.display())
		});
	}

	#[test]
	fn unwritable_destination_is_a_storage_error() {
		let blocker = temp_path("blocker");

		fs::write(&blocker, "not a directory").expect("Failed to create blocker file.");

		let mut store = CredentialStore::open(blocker.join("tweetvac.cfg"));

		store.set(("k", "s", "t", "ts"));

		assert!(matches!(
			store.save().expect_err("Saving beneath a regular file should fail."),
			Error::Storage(StoreError::Io { .. })
		));

		fs::remove_file(&blocker).unwrap_or_else(|e| {
			panic!("Failed to remove blocker file {}: {e}", blocker.display())
		});
	}
}
