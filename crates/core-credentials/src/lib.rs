//! Core Credentials - encrypted OAuth token storage (C1)
//!
//! The only crate allowed to see plaintext access/refresh tokens. Every
//! other crate goes through [`CredentialStore`] and gets back decrypted
//! values already wrapped in `core_models::Credential`.

pub mod encryption;
pub mod error;
pub mod store;

pub use encryption::load_master_key;
pub use error::CredentialError;
pub use store::CredentialStore;
