//! Core traits for Noetiq abstractions.
//!
//! The storage gateway is the only seam between the session controllers and
//! the authoritative, encrypted backend. Implementations marshal requests and
//! responses; they hold no retry, caching, or business rules.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::credential::Credential;
use crate::error::Result;
use crate::models::*;

// =============================================================================
// STORAGE GATEWAY
// =============================================================================

/// Request/response command surface of the external storage engine.
///
/// All payloads are plaintext at this boundary; encryption is the
/// implementation's concern. A rejected credential surfaces as
/// [`Error::Credential`](crate::Error::Credential), any other failure as
/// [`Error::Transport`](crate::Error::Transport) or
/// [`Error::NotFound`](crate::Error::NotFound).
#[async_trait]
pub trait StorageGateway: Send + Sync {
    // --- vault catalog ------------------------------------------------------

    /// List every vault. Source of truth for the catalog.
    async fn list_vaults(&self, credential: &Credential) -> Result<Vec<Vault>>;

    /// Create a vault; the backend assigns its id.
    async fn create_vault(&self, credential: &Credential, draft: &VaultDraft) -> Result<()>;

    /// Replace the mutable fields of a vault.
    async fn update_vault(
        &self,
        credential: &Credential,
        id: &VaultId,
        name: &str,
        description: &str,
        icon: &str,
    ) -> Result<()>;

    /// Delete a vault and, on the backend side, all of its notes.
    async fn delete_vault(&self, credential: &Credential, id: &VaultId) -> Result<()>;

    /// Number of notes stored in a vault. Takes no credential.
    async fn get_vault_notes_number(&self, vault: &VaultId) -> Result<usize>;

    // --- notes --------------------------------------------------------------

    /// Ordered note index of a vault.
    async fn get_notes_index(
        &self,
        credential: &Credential,
        vault: &VaultId,
    ) -> Result<Vec<NoteIndexEntry>>;

    /// Create an empty note; the backend appends it to the index.
    async fn create_note(&self, credential: &Credential, vault: &VaultId, icon: &str)
        -> Result<()>;

    async fn delete_note(&self, credential: &Credential, note: &NoteId, vault: &VaultId)
        -> Result<()>;

    async fn update_note_title(
        &self,
        credential: &Credential,
        vault: &VaultId,
        note: &NoteId,
        title: &str,
    ) -> Result<()>;

    async fn update_note_icon(
        &self,
        credential: &Credential,
        vault: &VaultId,
        note: &NoteId,
        icon: &str,
    ) -> Result<()>;

    /// Load the full document payload of a note.
    async fn get_note_data(
        &self,
        credential: &Credential,
        vault: &VaultId,
        note: &NoteId,
    ) -> Result<NoteDocument>;

    /// Persist the full document payload of a note.
    async fn save_note_data(
        &self,
        credential: &Credential,
        vault: &VaultId,
        note: &NoteId,
        document: &NoteDocument,
    ) -> Result<()>;

    /// Last modification time of a note. Takes no credential.
    async fn get_note_edit_date(&self, vault: &VaultId, note: &NoteId) -> Result<DateTime<Utc>>;

    // --- root credential ----------------------------------------------------

    /// First-run setup of the root password and its public hint.
    async fn set_password(&self, password: &str, hint: &str) -> Result<()>;

    /// Re-key all content from `old_password` to `new_password`.
    async fn reencrypt_data(&self, old_password: &str, new_password: &str, new_hint: &str)
        -> Result<()>;

    /// Public metadata; `None` when no password has ever been set.
    async fn read_public(&self) -> Result<Option<PublicInfo>>;
}
