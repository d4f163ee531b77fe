//! OAuth 1.0a credential models: the four-secret tuple and its redacting secret wrapper.

pub mod credentials;
pub mod secret;

pub use credentials::*;
pub use secret::*;
