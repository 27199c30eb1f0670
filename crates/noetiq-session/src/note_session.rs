//! Note session controller: the open vault, its note index, and the active note.
//!
//! All state sits behind one `tokio::sync::Mutex` that is never held across a
//! gateway call. Async results are checked against two counters before they
//! are applied:
//!
//! - the **generation**, bumped by every selection (and by anything else
//!   that changes the active note), rejects stale content loads;
//! - the **epoch**, bumped by every vault open and close, rejects index
//!   refreshes that resolve after their vault is gone.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, instrument, warn};

use noetiq_core::{
    random_icon, Credential, Error, EventBus, EventEnvelope, NoteContent, NoteDocument, NoteId,
    NoteIndexEntry, Result, SessionConfig, SessionEvent, StorageGateway, VaultId,
};

use crate::autosave::{AutosaveScheduler, Snapshot};
use crate::debounce::{Commit, Debouncer};

// ============================================================================
// Public state types
// ============================================================================

/// Coarse state of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    NoVaultOpen,
    /// Index loaded, no active note.
    Idle,
    NoteLoading(NoteId),
    NoteReady(NoteId),
}

/// Whether a content load ended up in the controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// The active note changed while the load was in flight.
    Discarded,
}

// ============================================================================
// Internal state
// ============================================================================

enum Active {
    None,
    Loading(NoteId),
    Ready(NoteContent),
}

impl Active {
    fn note(&self) -> Option<&NoteId> {
        match self {
            Active::None => None,
            Active::Loading(note) => Some(note),
            Active::Ready(content) => Some(&content.note),
        }
    }
}

struct OpenVault {
    vault: VaultId,
    credential: Credential,
    epoch: u64,
    index: Vec<NoteIndexEntry>,
    active: Active,
    autosave: AutosaveScheduler,
    titles: Debouncer<TitleCommitter>,
    /// Set once `close_vault` starts flushing; no further edits are taken.
    closing: bool,
}

impl OpenVault {
    fn context(&self) -> VaultContext {
        VaultContext {
            vault: self.vault.clone(),
            credential: self.credential.clone(),
            epoch: self.epoch,
            autosave: self.autosave.clone(),
            titles: self.titles.clone(),
        }
    }
}

#[derive(Default)]
struct SessionState {
    epoch: u64,
    generation: u64,
    vault: Option<OpenVault>,
}

impl SessionState {
    /// The open vault, if it is still the one opened under `epoch`.
    fn vault_at(&mut self, epoch: u64) -> Option<&mut OpenVault> {
        self.vault.as_mut().filter(|v| v.epoch == epoch)
    }

    /// The open vault, unless it is being closed.
    fn open_mut(&mut self) -> Result<&mut OpenVault> {
        self.vault
            .as_mut()
            .filter(|v| !v.closing)
            .ok_or(Error::NoVaultOpen)
    }
}

/// Everything an operation needs to talk to the gateway without holding
/// the state lock.
#[derive(Clone)]
struct VaultContext {
    vault: VaultId,
    credential: Credential,
    epoch: u64,
    autosave: AutosaveScheduler,
    titles: Debouncer<TitleCommitter>,
}

impl VaultContext {
    /// Flush pending title and content edits, in that order.
    async fn flush(&self) {
        self.titles.flush().await;
        self.autosave.flush_now().await;
    }
}

struct Inner {
    gateway: Arc<dyn StorageGateway>,
    config: SessionConfig,
    events: EventBus,
    state: Mutex<SessionState>,
}

// ============================================================================
// Title commits
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct TitleEdit {
    note: NoteId,
    title: String,
}

struct TitleCommitter {
    session: Weak<Inner>,
    vault: VaultId,
    credential: Credential,
    epoch: u64,
}

#[async_trait]
impl Commit for TitleCommitter {
    type Item = TitleEdit;

    async fn commit(&self, edit: TitleEdit) {
        let Some(inner) = self.session.upgrade() else {
            return;
        };
        let session = NoteSession { inner };

        if let Err(e) = session
            .inner
            .gateway
            .update_note_title(&self.credential, &self.vault, &edit.note, &edit.title)
            .await
        {
            warn!(
                component = "note_session",
                op = "rename_title",
                note_id = %edit.note,
                error = %e,
                "Title commit failed"
            );
            session
                .inner
                .events
                .notice("rename_title", format!("Could not rename note {}: {}", edit.note, e));
            return;
        }

        session
            .inner
            .events
            .emit(SessionEvent::TitleCommitted { note: edit.note });
        if let Err(e) = session
            .refresh_at(&self.vault, &self.credential, self.epoch)
            .await
        {
            session.inner.events.notice("refresh_index", e.to_string());
        }
    }
}

// ============================================================================
// NoteSession
// ============================================================================

/// Controller for the open vault and its active note.
///
/// Cheap to clone; clones drive the same state, which lets one task keep a
/// slow load in flight while another switches notes.
#[derive(Clone)]
pub struct NoteSession {
    inner: Arc<Inner>,
}

impl NoteSession {
    pub fn new(gateway: Arc<dyn StorageGateway>, config: SessionConfig, events: EventBus) -> Self {
        Self {
            inner: Arc::new(Inner {
                gateway,
                config,
                events,
                state: Mutex::new(SessionState::default()),
            }),
        }
    }

    /// Controller with its own event bus, sized by `config`.
    pub fn from_config(gateway: Arc<dyn StorageGateway>, config: SessionConfig) -> Self {
        let events = EventBus::from_config(&config);
        Self::new(gateway, config, events)
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.inner.events.subscribe()
    }

    async fn context(&self) -> Result<VaultContext> {
        let mut state = self.inner.state.lock().await;
        state.open_mut().map(|open| open.context())
    }

    // ------------------------------------------------------------------------
    // Vault lifecycle
    // ------------------------------------------------------------------------

    /// Open `vault` and load its index. Any vault already open is closed
    /// first, with its pending edits flushed.
    #[instrument(skip(self, credential), fields(vault_id = %vault))]
    pub async fn open_vault(&self, credential: &Credential, vault: &VaultId) -> Result<()> {
        self.close_vault().await?;

        let index = self.inner.gateway.get_notes_index(credential, vault).await?;

        let previous = {
            let mut state = self.inner.state.lock().await;
            state.epoch += 1;
            state.generation += 1;
            let epoch = state.epoch;
            let open = OpenVault {
                vault: vault.clone(),
                credential: credential.clone(),
                epoch,
                index,
                active: Active::None,
                closing: false,
                autosave: AutosaveScheduler::new(
                    Arc::clone(&self.inner.gateway),
                    credential.clone(),
                    vault.clone(),
                    self.inner.config.autosave_window(),
                    self.inner.events.clone(),
                ),
                titles: Debouncer::new(
                    TitleCommitter {
                        session: Arc::downgrade(&self.inner),
                        vault: vault.clone(),
                        credential: credential.clone(),
                        epoch,
                    },
                    self.inner.config.title_window(),
                ),
            };
            let note_count = open.index.len();
            let previous = state.vault.replace(open);
            info!(component = "note_session", epoch, note_count, "Vault opened");
            self.inner.events.emit(SessionEvent::VaultOpened {
                vault: vault.clone(),
                note_count,
            });
            previous
        };

        // Another open raced this one between close and install.
        if let Some(previous) = previous {
            previous.context().flush().await;
            self.inner.events.emit(SessionEvent::VaultClosed {
                vault: previous.vault,
            });
        }
        Ok(())
    }

    /// Flush pending edits, then drop all vault-scoped state. A no-op when
    /// nothing is open.
    ///
    /// Edits are refused from the moment closing starts, so everything the
    /// editor handed over is in the flush.
    pub async fn close_vault(&self) -> Result<()> {
        let ctx = {
            let mut state = self.inner.state.lock().await;
            match state.open_mut() {
                Ok(open) => {
                    open.closing = true;
                    open.context()
                }
                Err(_) => return Ok(()),
            }
        };

        ctx.flush().await;

        let mut state = self.inner.state.lock().await;
        if state.vault_at(ctx.epoch).is_some() {
            state.vault = None;
            state.epoch += 1;
            state.generation += 1;
            info!(component = "note_session", vault_id = %ctx.vault, "Vault closed");
            self.inner
                .events
                .emit(SessionEvent::VaultClosed { vault: ctx.vault });
        }
        Ok(())
    }

    /// Re-fetch the index of the open vault.
    pub async fn refresh_index(&self) -> Result<Vec<NoteIndexEntry>> {
        let ctx = self.context().await?;
        self.refresh_at(&ctx.vault, &ctx.credential, ctx.epoch).await
    }

    /// Fetch the index and install it only if the vault opened under `epoch`
    /// is still open.
    async fn refresh_at(
        &self,
        vault: &VaultId,
        credential: &Credential,
        epoch: u64,
    ) -> Result<Vec<NoteIndexEntry>> {
        let index = self.inner.gateway.get_notes_index(credential, vault).await?;

        let mut state = self.inner.state.lock().await;
        match state.vault_at(epoch) {
            Some(open) => {
                open.index = index.clone();
                debug!(
                    component = "note_session",
                    op = "refresh_index",
                    result_count = index.len(),
                    "Index refreshed"
                );
                self.inner.events.emit(SessionEvent::IndexRefreshed {
                    vault: vault.clone(),
                    note_count: index.len(),
                });
            }
            None => {
                debug!(
                    component = "note_session",
                    op = "refresh_index",
                    epoch,
                    "Discarding index for closed vault"
                );
            }
        }
        Ok(index)
    }

    // ------------------------------------------------------------------------
    // Note selection
    // ------------------------------------------------------------------------

    /// Make `note` the active note and load its content.
    ///
    /// The previous note stops taking edits first. Its pending edits are then
    /// saved before the load is issued. The loaded content is applied only if
    /// `note` is still active when it arrives.
    #[instrument(skip(self), fields(note_id = %note))]
    pub async fn select_note(&self, note: &NoteId) -> Result<LoadOutcome> {
        let (ctx, generation) = {
            let mut state = self.inner.state.lock().await;
            state.generation += 1;
            let generation = state.generation;
            let open = state.open_mut()?;
            open.active = Active::Loading(note.clone());
            (open.context(), generation)
        };
        self.inner.events.emit(SessionEvent::NoteLoading {
            note: note.clone(),
            generation,
        });

        ctx.flush().await;
        if !self.is_current(ctx.epoch, generation).await {
            return Ok(self.discard(note, generation));
        }

        let loaded = self
            .inner
            .gateway
            .get_note_data(&ctx.credential, &ctx.vault, note)
            .await;

        let document = match loaded {
            Ok(document) => {
                if !self.is_current(ctx.epoch, generation).await {
                    return Ok(self.discard(note, generation));
                }
                document
            }
            Err(e) => {
                let mut state = self.inner.state.lock().await;
                if state.generation != generation {
                    drop(state);
                    return Ok(self.discard(note, generation));
                }
                if let Some(open) = state.vault_at(ctx.epoch) {
                    open.active = Active::None;
                }
                return Err(e);
            }
        };

        let edited = match self.inner.gateway.get_note_edit_date(&ctx.vault, note).await {
            Ok(edited) => Some(edited),
            Err(e) => {
                warn!(
                    component = "note_session",
                    note_id = %note,
                    error = %e,
                    "Edit date unavailable"
                );
                None
            }
        };

        let mut state = self.inner.state.lock().await;
        if state.generation != generation {
            drop(state);
            return Ok(self.discard(note, generation));
        }
        let Some(open) = state.vault_at(ctx.epoch) else {
            return Ok(self.discard(note, generation));
        };
        let (title, icon) = open
            .index
            .iter()
            .find(|e| &e.filename == note)
            .map(|e| (e.title.clone(), e.icon.clone()))
            .unwrap_or_default();
        open.active = Active::Ready(NoteContent {
            note: note.clone(),
            title,
            icon,
            document,
            edited,
        });
        drop(state);

        debug!(component = "note_session", generation, "Note ready");
        self.inner.events.emit(SessionEvent::NoteReady {
            note: note.clone(),
            generation,
        });
        Ok(LoadOutcome::Applied)
    }

    async fn is_current(&self, epoch: u64, generation: u64) -> bool {
        let mut state = self.inner.state.lock().await;
        state.generation == generation && state.vault_at(epoch).is_some()
    }

    fn discard(&self, note: &NoteId, generation: u64) -> LoadOutcome {
        debug!(component = "note_session", note_id = %note, generation, "Discarding stale load");
        self.inner.events.emit(SessionEvent::LoadDiscarded {
            note: note.clone(),
            generation,
        });
        LoadOutcome::Discarded
    }

    // ------------------------------------------------------------------------
    // Note mutations
    // ------------------------------------------------------------------------

    /// Create a note, refresh the index, and select the new note.
    ///
    /// The new note is taken to be the last index entry, since the backend
    /// appends. Returns its id once its content has loaded.
    #[instrument(skip(self))]
    pub async fn create_note(&self) -> Result<NoteId> {
        let ctx = self.context().await?;
        ctx.flush().await;

        let icon = random_icon();
        self.inner
            .gateway
            .create_note(&ctx.credential, &ctx.vault, &icon)
            .await?;
        let index = self
            .refresh_at(&ctx.vault, &ctx.credential, ctx.epoch)
            .await?;

        let note = index
            .last()
            .map(|entry| entry.filename.clone())
            .ok_or_else(|| Error::Internal("Index is empty after creating a note".to_string()))?;
        info!(component = "note_session", note_id = %note, "Note created");
        self.inner
            .events
            .emit(SessionEvent::NoteCreated { note: note.clone() });

        self.select_note(&note).await?;
        Ok(note)
    }

    /// Buffer the editor's latest document for the active note.
    ///
    /// The snapshot enters the autosave slot while the state lock is held, so
    /// a concurrent switch or close always finds it there when it flushes.
    pub async fn edit(&self, document: NoteDocument) -> Result<()> {
        let (displaced, autosave) = {
            let mut state = self.inner.state.lock().await;
            let open = state.open_mut()?;
            let Active::Ready(content) = &mut open.active else {
                return Err(Error::NoActiveNote);
            };
            content.document = document.clone();
            let snapshot = Snapshot {
                note: content.note.clone(),
                document,
            };
            (open.autosave.buffer(snapshot).await, open.autosave.clone())
        };
        if let Some(displaced) = displaced {
            autosave.save(displaced).await;
        }
        Ok(())
    }

    /// Retitle the active note. The gateway sees the title once edits stop
    /// for the title window; the index is refreshed after that commit.
    pub async fn rename_title(&self, title: &str) -> Result<()> {
        let (displaced, titles) = {
            let mut state = self.inner.state.lock().await;
            let open = state.open_mut()?;
            let Active::Ready(content) = &mut open.active else {
                return Err(Error::NoActiveNote);
            };
            content.title = title.to_string();
            let note = content.note.clone();
            let edit = TitleEdit {
                note: note.clone(),
                title: title.to_string(),
            };
            let displaced = open.titles.schedule(edit).await.filter(|d| d.note != note);
            (displaced, open.titles.clone())
        };
        if let Some(displaced) = displaced {
            titles.commit_now(displaced).await;
        }
        Ok(())
    }

    /// Set the active note's icon immediately, then refresh the index.
    pub async fn change_icon(&self, icon: &str) -> Result<()> {
        let ctx = self.context().await?;
        let note = self.active_note().await.ok_or(Error::NoActiveNote)?;

        self.inner
            .gateway
            .update_note_icon(&ctx.credential, &ctx.vault, &note, icon)
            .await?;

        {
            let mut state = self.inner.state.lock().await;
            if let Some(open) = state.vault_at(ctx.epoch) {
                if let Active::Ready(content) = &mut open.active {
                    if content.note == note {
                        content.icon = icon.to_string();
                    }
                }
            }
        }
        self.inner
            .events
            .emit(SessionEvent::IconChanged { note: note.clone() });

        self.refresh_at(&ctx.vault, &ctx.credential, ctx.epoch)
            .await?;
        Ok(())
    }

    /// Delete a note of the open vault.
    ///
    /// Deleting the active note first clears the active state, so any load
    /// still in flight for it is discarded. Its unsaved edits are held back
    /// and dropped once the delete succeeds; if the delete fails they are
    /// saved instead.
    #[instrument(skip(self), fields(note_id = %note))]
    pub async fn delete_note(&self, note: &NoteId) -> Result<()> {
        let (ctx, held_content, held_title) = {
            let mut state = self.inner.state.lock().await;
            let was_active = state.open_mut()?.active.note() == Some(note);
            if was_active {
                state.generation += 1;
            }
            let open = state.open_mut()?;
            if was_active {
                open.active = Active::None;
            }
            let held_content = open.autosave.discard_for(note).await;
            let held_title = open.titles.cancel_if(|edit| &edit.note == note).await;
            (open.context(), held_content, held_title)
        };

        if let Err(e) = self
            .inner
            .gateway
            .delete_note(&ctx.credential, note, &ctx.vault)
            .await
        {
            warn!(
                component = "note_session",
                op = "delete_note",
                note_id = %note,
                error = %e,
                "Delete failed, saving held edits"
            );
            if let Some(snapshot) = held_content {
                ctx.autosave.save(snapshot).await;
            }
            if let Some(edit) = held_title {
                ctx.titles.commit_now(edit).await;
            }
            self.inner
                .events
                .notice("delete_note", format!("Could not delete note {}: {}", note, e));
            return Err(e);
        }
        info!(component = "note_session", "Note deleted");
        self.inner
            .events
            .emit(SessionEvent::NoteDeleted { note: note.clone() });

        self.refresh_at(&ctx.vault, &ctx.credential, ctx.epoch)
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    pub async fn phase(&self) -> SessionPhase {
        let state = self.inner.state.lock().await;
        match &state.vault {
            None => SessionPhase::NoVaultOpen,
            Some(open) => match &open.active {
                Active::None => SessionPhase::Idle,
                Active::Loading(note) => SessionPhase::NoteLoading(note.clone()),
                Active::Ready(content) => SessionPhase::NoteReady(content.note.clone()),
            },
        }
    }

    pub async fn vault(&self) -> Option<VaultId> {
        let state = self.inner.state.lock().await;
        state.vault.as_ref().map(|open| open.vault.clone())
    }

    /// Cached index of the open vault; empty when nothing is open.
    pub async fn index(&self) -> Vec<NoteIndexEntry> {
        let state = self.inner.state.lock().await;
        state
            .vault
            .as_ref()
            .map(|open| open.index.clone())
            .unwrap_or_default()
    }

    pub async fn active_note(&self) -> Option<NoteId> {
        let state = self.inner.state.lock().await;
        state
            .vault
            .as_ref()
            .and_then(|open| open.active.note().cloned())
    }

    /// Content of the active note once it is loaded.
    pub async fn content(&self) -> Option<NoteContent> {
        let state = self.inner.state.lock().await;
        match state.vault.as_ref().map(|open| &open.active) {
            Some(Active::Ready(content)) => Some(content.clone()),
            _ => None,
        }
    }

    /// Index entry of the active note.
    pub async fn active_entry(&self) -> Option<NoteIndexEntry> {
        let state = self.inner.state.lock().await;
        let open = state.vault.as_ref()?;
        let note = open.active.note()?;
        open.index.iter().find(|e| &e.filename == note).cloned()
    }

    /// Whether content or title edits are still waiting for their window.
    pub async fn has_pending_edits(&self) -> bool {
        match self.context().await {
            Ok(ctx) => ctx.autosave.has_pending().await || ctx.titles.has_pending().await,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noetiq_core::VaultDraft;
    use noetiq_store::{Command, MemoryGateway};
    use serde_json::json;

    async fn opened() -> (Arc<MemoryGateway>, NoteSession, VaultId, Vec<NoteId>) {
        let gateway = Arc::new(MemoryGateway::with_password("pw", ""));
        let vault = gateway.seed_vault(VaultDraft::new("📦", "Work", "")).await;
        let mut notes = Vec::new();
        for title in ["a", "b", "c"] {
            let doc = NoteDocument::new(json!({"blocks": [{"type": "paragraph", "data": {"text": title}}]}));
            notes.push(gateway.seed_note(&vault, title, doc).await.unwrap());
        }
        let session = NoteSession::new(gateway.clone(), SessionConfig::default(), EventBus::new(64));
        session.open_vault(&Credential::new("pw"), &vault).await.unwrap();
        (gateway, session, vault, notes)
    }

    #[tokio::test]
    async fn test_operations_require_open_vault() {
        let gateway = Arc::new(MemoryGateway::with_password("pw", ""));
        let session = NoteSession::new(gateway, SessionConfig::default(), EventBus::default());
        assert_eq!(session.phase().await, SessionPhase::NoVaultOpen);
        assert!(matches!(
            session.select_note(&NoteId::new("x")).await,
            Err(Error::NoVaultOpen)
        ));
        assert!(matches!(session.create_note().await, Err(Error::NoVaultOpen)));
        session.close_vault().await.unwrap();
    }

    #[tokio::test]
    async fn test_from_config_sizes_event_bus() {
        let gateway = Arc::new(MemoryGateway::with_password("pw", ""));
        let vault = gateway.seed_vault(VaultDraft::new("📦", "Work", "")).await;
        let config = SessionConfig::default().with_event_capacity(1);
        let session = NoteSession::from_config(gateway, config);
        let mut rx = session.subscribe();

        session.open_vault(&Credential::new("pw"), &vault).await.unwrap();
        session.close_vault().await.unwrap();

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
    }

    #[tokio::test]
    async fn test_open_vault_loads_index_idle() {
        let (_gateway, session, vault, _notes) = opened().await;
        assert_eq!(session.phase().await, SessionPhase::Idle);
        assert_eq!(session.vault().await, Some(vault));
        assert_eq!(session.index().await.len(), 3);
        assert!(session.active_note().await.is_none());
    }

    #[tokio::test]
    async fn test_open_vault_with_wrong_credential_stays_closed() {
        let gateway = Arc::new(MemoryGateway::with_password("pw", ""));
        let vault = gateway.seed_vault(VaultDraft::new("📦", "Work", "")).await;
        let session = NoteSession::new(gateway, SessionConfig::default(), EventBus::default());
        let err = session
            .open_vault(&Credential::new("bad"), &vault)
            .await
            .unwrap_err();
        assert!(err.is_credential());
        assert_eq!(session.phase().await, SessionPhase::NoVaultOpen);
    }

    #[tokio::test]
    async fn test_select_note_applies_content() {
        let (_gateway, session, _vault, notes) = opened().await;
        let outcome = session.select_note(&notes[1]).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Applied);
        assert_eq!(session.phase().await, SessionPhase::NoteReady(notes[1].clone()));

        let content = session.content().await.unwrap();
        assert_eq!(content.title, "b");
        assert!(content.edited.is_some());
        assert_eq!(session.active_entry().await.unwrap().title, "b");
    }

    #[tokio::test]
    async fn test_select_missing_note_returns_to_idle() {
        let (_gateway, session, _vault, _notes) = opened().await;
        let err = session.select_note(&NoteId::new("gone.json")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(session.phase().await, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_edit_requires_ready_note() {
        let (_gateway, session, _vault, _notes) = opened().await;
        assert!(matches!(
            session.edit(NoteDocument::default()).await,
            Err(Error::NoActiveNote)
        ));
        assert!(matches!(session.rename_title("x").await, Err(Error::NoActiveNote)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rename_title_is_debounced_then_refreshes_index() {
        let (gateway, session, vault, notes) = opened().await;
        session.select_note(&notes[0]).await.unwrap();

        session.rename_title("Pl").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        session.rename_title("Plan").await.unwrap();
        assert_eq!(session.content().await.unwrap().title, "Plan");

        tokio::time::sleep(std::time::Duration::from_millis(1999)).await;
        assert_eq!(gateway.count(Command::UpdateNoteTitle).await, 0);

        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        assert_eq!(gateway.count(Command::UpdateNoteTitle).await, 1);
        assert_eq!(gateway.stored_entry(&vault, &notes[0]).await.unwrap().title, "Plan");
        assert_eq!(session.index().await[0].title, "Plan");
    }

    #[tokio::test]
    async fn test_change_icon_refreshes_index() {
        let (gateway, session, _vault, notes) = opened().await;
        session.select_note(&notes[2]).await.unwrap();
        gateway.clear_calls().await;

        session.change_icon("🚀").await.unwrap();
        assert_eq!(session.content().await.unwrap().icon, "🚀");
        assert_eq!(session.index().await[2].icon, "🚀");
        assert_eq!(gateway.count(Command::GetNotesIndex).await, 1);
    }

    #[tokio::test]
    async fn test_close_vault_flushes_and_clears() {
        let (gateway, session, vault, notes) = opened().await;
        session.select_note(&notes[0]).await.unwrap();
        let doc = NoteDocument::new(json!({"blocks": []}));
        session.edit(doc.clone()).await.unwrap();
        session.rename_title("Renamed").await.unwrap();
        assert!(session.has_pending_edits().await);

        session.close_vault().await.unwrap();
        assert_eq!(session.phase().await, SessionPhase::NoVaultOpen);
        assert!(session.index().await.is_empty());
        assert_eq!(gateway.stored_document(&vault, &notes[0]).await, Some(doc));
        assert_eq!(gateway.stored_entry(&vault, &notes[0]).await.unwrap().title, "Renamed");
    }

    #[tokio::test]
    async fn test_open_other_vault_closes_previous_with_flush() {
        let (gateway, session, vault, notes) = opened().await;
        let other = gateway.seed_vault(VaultDraft::new("🏠", "Home", "")).await;
        session.select_note(&notes[0]).await.unwrap();
        let doc = NoteDocument::new(json!({"blocks": [{"type": "paragraph", "data": {"text": "z"}}]}));
        session.edit(doc.clone()).await.unwrap();

        session.open_vault(&Credential::new("pw"), &other).await.unwrap();
        assert_eq!(session.vault().await, Some(other));
        assert_eq!(session.phase().await, SessionPhase::Idle);
        assert_eq!(gateway.stored_document(&vault, &notes[0]).await, Some(doc));
    }

    #[tokio::test]
    async fn test_delete_inactive_note_keeps_active() {
        let (_gateway, session, _vault, notes) = opened().await;
        session.select_note(&notes[0]).await.unwrap();
        session.delete_note(&notes[1]).await.unwrap();

        assert_eq!(session.phase().await, SessionPhase::NoteReady(notes[0].clone()));
        assert_eq!(session.index().await.len(), 2);
    }
}
