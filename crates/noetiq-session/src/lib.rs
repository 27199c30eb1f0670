//! # noetiq-session
//!
//! Client-side controllers for Noetiq's password-gated vaults.
//!
//! - [`Session`] holds the unlocking credential, or nothing while locked.
//! - [`Account`] runs first-run setup, login, password change, and logout.
//! - [`VaultCatalog`] lists, filters, and mutates vaults, always handing back
//!   a freshly fetched catalog.
//! - [`NoteSession`] owns the open vault: its note index, the active note,
//!   debounced content autosave ([`AutosaveScheduler`]) and debounced title
//!   commits. Stale content loads and index refreshes are discarded instead
//!   of overwriting newer state.
//!
//! Every operation goes through a [`noetiq_core::StorageGateway`]; no
//! controller retries a failed request.
//!
//! Results of credentialed catalog and note calls should be passed through
//! [`Session::guard`], which locks the session when the gateway rejects the
//! credential:
//!
//! ```ignore
//! let vaults = session.guard(catalog.list(session.require()?).await)?;
//! ```

pub mod account;
pub mod autosave;
pub mod catalog;
pub mod debounce;
pub mod note_session;
pub mod session;

pub use account::{Account, EntryPoint, PasswordChange};
pub use autosave::{AutosaveScheduler, Snapshot};
pub use catalog::{CatalogView, VaultCatalog};
pub use debounce::{Commit, Debouncer};
pub use note_session::{LoadOutcome, NoteSession, SessionPhase};
pub use session::Session;
