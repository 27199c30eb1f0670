//! In-memory [`StorageGateway`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::trace;
use uuid::Uuid;

use noetiq_core::{
    Credential, Error, NoteDocument, NoteId, NoteIndexEntry, PublicInfo, Result, StorageGateway,
    Vault, VaultDraft, VaultId,
};

use noetiq_core::defaults::FALLBACK_NOTE_ICON;

use crate::journal::{Command, GatewayCall, Journal};

struct RootKey {
    password: String,
    hint: String,
}

struct NoteRecord {
    entry: NoteIndexEntry,
    document: NoteDocument,
    modified: DateTime<Utc>,
}

struct VaultRecord {
    vault: Vault,
    notes: Vec<NoteRecord>,
}

impl VaultRecord {
    fn note(&self, id: &NoteId) -> Result<&NoteRecord> {
        self.notes
            .iter()
            .find(|n| &n.entry.filename == id)
            .ok_or_else(|| Error::NotFound(format!("note {id}")))
    }

    fn note_mut(&mut self, id: &NoteId) -> Result<&mut NoteRecord> {
        self.notes
            .iter_mut()
            .find(|n| &n.entry.filename == id)
            .ok_or_else(|| Error::NotFound(format!("note {id}")))
    }
}

#[derive(Default)]
struct StoreState {
    root: Option<RootKey>,
    vaults: Vec<VaultRecord>,
}

impl StoreState {
    fn authorize(&self, credential: &Credential) -> Result<()> {
        self.check_password(credential.expose())
    }

    fn check_password(&self, password: &str) -> Result<()> {
        match &self.root {
            None => Err(Error::Credential("No password has been set".to_string())),
            Some(root) if root.password == password => Ok(()),
            Some(_) => Err(Error::Credential("Decrypt failed".to_string())),
        }
    }

    fn vault(&self, id: &VaultId) -> Result<&VaultRecord> {
        self.vaults
            .iter()
            .find(|v| &v.vault.id == id)
            .ok_or_else(|| Error::NotFound(format!("vault {id}")))
    }

    fn vault_mut(&mut self, id: &VaultId) -> Result<&mut VaultRecord> {
        self.vaults
            .iter_mut()
            .find(|v| &v.vault.id == id)
            .ok_or_else(|| Error::NotFound(format!("vault {id}")))
    }
}

/// Volatile storage backend holding vaults and notes in process memory.
///
/// Behaves like the real engine at the command boundary: the password gates
/// every credentialed command, ids are assigned on creation, new notes are
/// appended to the index, and deleting a vault drops its notes. Intended for
/// tests and demos; it also records every issued command (see
/// [`MemoryGateway::calls`]) and can delay or fail chosen commands.
pub struct MemoryGateway {
    state: Mutex<StoreState>,
    journal: Mutex<Journal>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    /// A gateway in first-run state: no password set, no vaults.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            journal: Mutex::new(Journal::default()),
        }
    }

    /// A gateway whose root password is already set.
    pub fn with_password(password: impl Into<String>, hint: impl Into<String>) -> Self {
        let state = StoreState {
            root: Some(RootKey {
                password: password.into(),
                hint: hint.into(),
            }),
            vaults: Vec::new(),
        };
        Self {
            state: Mutex::new(state),
            journal: Mutex::new(Journal::default()),
        }
    }

    // --- seeding and inspection (not recorded in the journal) ---------------

    /// Insert a vault directly, bypassing the credential check.
    pub async fn seed_vault(&self, draft: VaultDraft) -> VaultId {
        let id = VaultId::new(Uuid::new_v4().to_string());
        self.state.lock().await.vaults.push(VaultRecord {
            vault: Vault {
                id: id.clone(),
                icon: draft.icon,
                name: draft.name,
                description: draft.description,
            },
            notes: Vec::new(),
        });
        id
    }

    /// Insert a note directly at the end of a vault's index.
    pub async fn seed_note(
        &self,
        vault: &VaultId,
        title: &str,
        document: NoteDocument,
    ) -> Result<NoteId> {
        let mut state = self.state.lock().await;
        let record = state.vault_mut(vault)?;
        let note = new_note_id();
        let now = Utc::now();
        record.notes.push(NoteRecord {
            entry: NoteIndexEntry {
                filename: note.clone(),
                icon: FALLBACK_NOTE_ICON.to_string(),
                title: title.to_string(),
                edit_timestamp: Some(now),
            },
            document,
            modified: now,
        });
        Ok(note)
    }

    /// Stored document of a note, if it exists.
    pub async fn stored_document(&self, vault: &VaultId, note: &NoteId) -> Option<NoteDocument> {
        let state = self.state.lock().await;
        let record = state.vault(vault).ok()?;
        record.note(note).ok().map(|n| n.document.clone())
    }

    /// Stored index entry of a note, if it exists.
    pub async fn stored_entry(&self, vault: &VaultId, note: &NoteId) -> Option<NoteIndexEntry> {
        let state = self.state.lock().await;
        let record = state.vault(vault).ok()?;
        record.note(note).ok().map(|n| n.entry.clone())
    }

    /// Current root password hint, if a password is set.
    pub async fn stored_hint(&self) -> Option<String> {
        self.state.lock().await.root.as_ref().map(|r| r.hint.clone())
    }

    /// Every command issued so far, in issue order.
    pub async fn calls(&self) -> Vec<GatewayCall> {
        self.journal.lock().await.calls.clone()
    }

    /// Number of issued commands of one kind.
    pub async fn count(&self, command: Command) -> usize {
        self.journal
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.command() == command)
            .count()
    }

    pub async fn clear_calls(&self) {
        self.journal.lock().await.calls.clear();
    }

    // --- behaviour injection ------------------------------------------------

    /// Delay every response to `command`.
    pub async fn set_latency(&self, command: Command, delay: Duration) {
        self.journal.lock().await.set_latency(command, delay);
    }

    /// Delay responses to `command` addressing one note; wins over
    /// [`MemoryGateway::set_latency`].
    pub async fn set_note_latency(&self, command: Command, note: &NoteId, delay: Duration) {
        self.journal
            .lock()
            .await
            .set_note_latency(command, note.clone(), delay);
    }

    /// Make the next `command` fail with a transport error.
    pub async fn fail_next(&self, command: Command, message: impl Into<String>) {
        self.journal.lock().await.fail_next(command, message.into());
    }

    /// Record the call, then simulate latency and injected failure.
    async fn enter(&self, call: GatewayCall) -> Result<()> {
        trace!(command = ?call.command(), "gateway call issued");
        let (delay, fault) = self.journal.lock().await.issue(call);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match fault {
            Some(message) => Err(Error::Transport(message)),
            None => Ok(()),
        }
    }
}

fn new_note_id() -> NoteId {
    NoteId::new(format!("{}.json", Uuid::new_v4()))
}

#[async_trait]
impl StorageGateway for MemoryGateway {
    async fn list_vaults(&self, credential: &Credential) -> Result<Vec<Vault>> {
        self.enter(GatewayCall::ListVaults).await?;
        let state = self.state.lock().await;
        state.authorize(credential)?;
        Ok(state.vaults.iter().map(|v| v.vault.clone()).collect())
    }

    async fn create_vault(&self, credential: &Credential, draft: &VaultDraft) -> Result<()> {
        self.enter(GatewayCall::CreateVault {
            name: draft.name.clone(),
        })
        .await?;
        let mut state = self.state.lock().await;
        state.authorize(credential)?;
        state.vaults.push(VaultRecord {
            vault: Vault {
                id: VaultId::new(Uuid::new_v4().to_string()),
                icon: draft.icon.clone(),
                name: draft.name.clone(),
                description: draft.description.clone(),
            },
            notes: Vec::new(),
        });
        Ok(())
    }

    async fn update_vault(
        &self,
        credential: &Credential,
        id: &VaultId,
        name: &str,
        description: &str,
        icon: &str,
    ) -> Result<()> {
        self.enter(GatewayCall::UpdateVault {
            vault: id.clone(),
            name: name.to_string(),
        })
        .await?;
        let mut state = self.state.lock().await;
        state.authorize(credential)?;
        let record = state.vault_mut(id)?;
        record.vault.name = name.to_string();
        record.vault.description = description.to_string();
        record.vault.icon = icon.to_string();
        Ok(())
    }

    async fn delete_vault(&self, credential: &Credential, id: &VaultId) -> Result<()> {
        self.enter(GatewayCall::DeleteVault { vault: id.clone() })
            .await?;
        let mut state = self.state.lock().await;
        state.authorize(credential)?;
        let before = state.vaults.len();
        state.vaults.retain(|v| &v.vault.id != id);
        if state.vaults.len() == before {
            return Err(Error::NotFound(format!("vault {id}")));
        }
        Ok(())
    }

    async fn get_vault_notes_number(&self, vault: &VaultId) -> Result<usize> {
        self.enter(GatewayCall::GetVaultNotesNumber {
            vault: vault.clone(),
        })
        .await?;
        let state = self.state.lock().await;
        Ok(state.vault(vault)?.notes.len())
    }

    async fn get_notes_index(
        &self,
        credential: &Credential,
        vault: &VaultId,
    ) -> Result<Vec<NoteIndexEntry>> {
        self.enter(GatewayCall::GetNotesIndex {
            vault: vault.clone(),
        })
        .await?;
        let state = self.state.lock().await;
        state.authorize(credential)?;
        Ok(state
            .vault(vault)?
            .notes
            .iter()
            .map(|n| n.entry.clone())
            .collect())
    }

    async fn create_note(
        &self,
        credential: &Credential,
        vault: &VaultId,
        icon: &str,
    ) -> Result<()> {
        self.enter(GatewayCall::CreateNote {
            vault: vault.clone(),
            icon: icon.to_string(),
        })
        .await?;
        let mut state = self.state.lock().await;
        state.authorize(credential)?;
        let record = state.vault_mut(vault)?;
        let now = Utc::now();
        record.notes.push(NoteRecord {
            entry: NoteIndexEntry {
                filename: new_note_id(),
                icon: icon.to_string(),
                title: String::new(),
                edit_timestamp: Some(now),
            },
            document: NoteDocument::default(),
            modified: now,
        });
        Ok(())
    }

    async fn delete_note(
        &self,
        credential: &Credential,
        note: &NoteId,
        vault: &VaultId,
    ) -> Result<()> {
        self.enter(GatewayCall::DeleteNote {
            vault: vault.clone(),
            note: note.clone(),
        })
        .await?;
        let mut state = self.state.lock().await;
        state.authorize(credential)?;
        let record = state.vault_mut(vault)?;
        let before = record.notes.len();
        record.notes.retain(|n| &n.entry.filename != note);
        if record.notes.len() == before {
            return Err(Error::NotFound(format!("note {note}")));
        }
        Ok(())
    }

    async fn update_note_title(
        &self,
        credential: &Credential,
        vault: &VaultId,
        note: &NoteId,
        title: &str,
    ) -> Result<()> {
        self.enter(GatewayCall::UpdateNoteTitle {
            vault: vault.clone(),
            note: note.clone(),
            title: title.to_string(),
        })
        .await?;
        let mut state = self.state.lock().await;
        state.authorize(credential)?;
        state.vault_mut(vault)?.note_mut(note)?.entry.title = title.to_string();
        Ok(())
    }

    async fn update_note_icon(
        &self,
        credential: &Credential,
        vault: &VaultId,
        note: &NoteId,
        icon: &str,
    ) -> Result<()> {
        self.enter(GatewayCall::UpdateNoteIcon {
            vault: vault.clone(),
            note: note.clone(),
            icon: icon.to_string(),
        })
        .await?;
        let mut state = self.state.lock().await;
        state.authorize(credential)?;
        state.vault_mut(vault)?.note_mut(note)?.entry.icon = icon.to_string();
        Ok(())
    }

    async fn get_note_data(
        &self,
        credential: &Credential,
        vault: &VaultId,
        note: &NoteId,
    ) -> Result<NoteDocument> {
        self.enter(GatewayCall::GetNoteData {
            vault: vault.clone(),
            note: note.clone(),
        })
        .await?;
        let state = self.state.lock().await;
        state.authorize(credential)?;
        Ok(state.vault(vault)?.note(note)?.document.clone())
    }

    async fn save_note_data(
        &self,
        credential: &Credential,
        vault: &VaultId,
        note: &NoteId,
        document: &NoteDocument,
    ) -> Result<()> {
        self.enter(GatewayCall::SaveNoteData {
            vault: vault.clone(),
            note: note.clone(),
        })
        .await?;
        let mut state = self.state.lock().await;
        state.authorize(credential)?;
        let record = state.vault_mut(vault)?.note_mut(note)?;
        let now = Utc::now();
        record.document = document.clone();
        record.modified = now;
        record.entry.edit_timestamp = Some(now);
        Ok(())
    }

    async fn get_note_edit_date(&self, vault: &VaultId, note: &NoteId) -> Result<DateTime<Utc>> {
        self.enter(GatewayCall::GetNoteEditDate {
            vault: vault.clone(),
            note: note.clone(),
        })
        .await?;
        let state = self.state.lock().await;
        Ok(state.vault(vault)?.note(note)?.modified)
    }

    async fn set_password(&self, password: &str, hint: &str) -> Result<()> {
        self.enter(GatewayCall::SetPassword).await?;
        let mut state = self.state.lock().await;
        // A fresh root key starts from an empty catalog.
        state.root = Some(RootKey {
            password: password.to_string(),
            hint: hint.to_string(),
        });
        state.vaults.clear();
        Ok(())
    }

    async fn reencrypt_data(
        &self,
        old_password: &str,
        new_password: &str,
        new_hint: &str,
    ) -> Result<()> {
        self.enter(GatewayCall::ReencryptData).await?;
        let mut state = self.state.lock().await;
        state.check_password(old_password)?;
        state.root = Some(RootKey {
            password: new_password.to_string(),
            hint: new_hint.to_string(),
        });
        Ok(())
    }

    async fn read_public(&self) -> Result<Option<PublicInfo>> {
        self.enter(GatewayCall::ReadPublic).await?;
        let state = self.state.lock().await;
        Ok(state.root.as_ref().map(|r| PublicInfo {
            hint: r.hint.clone(),
        }))
    }
}
