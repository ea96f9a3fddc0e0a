//! Core Models - Shared domain types for the workflow automation engine
//!
//! This crate is the single source of truth for the engine's data model:
//! users, stored OAuth credentials, workflows and their step graphs,
//! processed-trigger markers, workflow runs, and the append-only log.

pub mod credential;
pub mod error;
pub mod log;
pub mod processed_trigger;
pub mod run;
pub mod user;
pub mod workflow;

pub use credential::*;
pub use error::*;
pub use log::*;
pub use processed_trigger::*;
pub use run::*;
pub use user::*;
pub use workflow::*;
