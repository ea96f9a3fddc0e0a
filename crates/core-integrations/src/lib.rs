//! Core Integrations - third-party adapters (C2) and the credential-aware
//! dispatcher (C3) that fronts them.

pub mod adapters;
pub mod cache;
pub mod dispatcher;
pub mod error;

pub use dispatcher::{Dispatcher, OAuthClientConfig};
pub use error::IntegrationError;
