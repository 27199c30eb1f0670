//! # noetiq-store
//!
//! In-memory storage gateway backend for Noetiq.
//!
//! [`MemoryGateway`] implements the full [`StorageGateway`] command surface
//! against process memory. It stands in for the encrypted on-disk engine in
//! tests and demos, and doubles as an instrumented test double: every command
//! is journaled in issue order, and latency or failures can be injected per
//! command (or per note for note-addressed commands).
//!
//! ## Example
//!
//! ```rust
//! use noetiq_core::{Credential, StorageGateway, VaultDraft};
//! use noetiq_store::MemoryGateway;
//!
//! # tokio_test_block_on(async {
//! let gateway = MemoryGateway::with_password("secret", "usual one");
//! let credential = Credential::new("secret");
//! gateway
//!     .create_vault(&credential, &VaultDraft::new("📦", "Work", ""))
//!     .await
//!     .unwrap();
//! assert_eq!(gateway.list_vaults(&credential).await.unwrap().len(), 1);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

pub mod journal;
pub mod memory;

pub use journal::{Command, GatewayCall};
pub use memory::MemoryGateway;

// Re-export core types
pub use noetiq_core::*;
