//! Thread-safe in-memory [`StoreBackend`] for tests and demos.

// std
use std::path::Path;
// self
use crate::{_prelude::*, error::StoreError, store::StoreBackend};

/// Keeps the credential document in-process. Clones share the same document.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend(Arc<RwLock<Option<String>>>);
impl MemoryBackend {
	/// Seeds the backend with an existing document.
	pub fn with_contents(contents: impl Into<String>) -> Self {
		Self(Arc::new(RwLock::new(Some(contents.into()))))
	}

	/// Snapshot of the current document.
	pub fn contents(&self) -> Option<String> {
		self.0.read().clone()
	}
}
impl StoreBackend for MemoryBackend {
	fn location(&self) -> &Path {
		Path::new(":memory:")
	}

	fn read(&self) -> Result<Option<String>, StoreError> {
		Ok(self.contents())
	}

	fn write(&self, contents: &str) -> Result<(), StoreError> {
		*self.0.write() = Some(contents.to_owned());

		Ok(())
	}
}
