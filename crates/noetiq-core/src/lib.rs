//! # noetiq-core
//!
//! Core types, traits, and abstractions for the Noetiq session controller.
//!
//! This crate provides the data structures crossing the storage gateway
//! boundary, the [`StorageGateway`] trait itself, the shared error type, the
//! session event bus, configuration, and logging setup that the other Noetiq
//! crates depend on.

pub mod config;
pub mod credential;
pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod temporal;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::SessionConfig;
pub use credential::Credential;
pub use defaults::random_icon;
pub use error::{Error, Result};
pub use events::{EventBus, EventEnvelope, SessionEvent};
pub use logging::{init_tracing, LogConfig, LogFormat};
pub use models::*;
pub use temporal::{describe_edit_date, describe_edit_date_local};
pub use traits::*;
