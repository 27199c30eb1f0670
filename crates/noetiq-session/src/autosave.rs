//! Debounced content autosave for the notes of one open vault.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use noetiq_core::{
    Credential, EventBus, NoteDocument, NoteId, SessionEvent, StorageGateway, VaultId,
};

use crate::debounce::{Commit, Debouncer};

/// Latest editor state of one note, waiting to be saved.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub note: NoteId,
    pub document: NoteDocument,
}

pub struct SaveCommitter {
    gateway: Arc<dyn StorageGateway>,
    credential: Credential,
    vault: VaultId,
    events: EventBus,
}

#[async_trait]
impl Commit for SaveCommitter {
    type Item = Snapshot;

    async fn commit(&self, snapshot: Snapshot) {
        let result = self
            .gateway
            .save_note_data(&self.credential, &self.vault, &snapshot.note, &snapshot.document)
            .await;
        match result {
            Ok(()) => {
                debug!(
                    component = "autosave",
                    vault_id = %self.vault,
                    note_id = %snapshot.note,
                    "Note saved"
                );
                self.events.emit(SessionEvent::NoteSaved {
                    note: snapshot.note,
                });
            }
            // Not retried; the next edit schedules a fresh save.
            Err(e) => {
                warn!(
                    component = "autosave",
                    vault_id = %self.vault,
                    note_id = %snapshot.note,
                    error = %e,
                    "Autosave failed"
                );
                self.events
                    .notice("autosave", format!("Could not save note {}: {}", snapshot.note, e));
            }
        }
    }
}

/// Saves the buffered snapshot once edits stop for the configured window.
///
/// Holds one snapshot at a time. An edit for a different note than the one
/// pending flushes the pending one first, so a timer never carries over from
/// one note to another.
#[derive(Clone)]
pub struct AutosaveScheduler {
    debouncer: Debouncer<SaveCommitter>,
}

impl AutosaveScheduler {
    pub fn new(
        gateway: Arc<dyn StorageGateway>,
        credential: Credential,
        vault: VaultId,
        window: Duration,
        events: EventBus,
    ) -> Self {
        let committer = SaveCommitter {
            gateway,
            credential,
            vault,
            events,
        };
        Self {
            debouncer: Debouncer::new(committer, window),
        }
    }

    pub fn vault(&self) -> &VaultId {
        &self.debouncer.committer().vault
    }

    /// Buffer `document` for `note` and restart the window.
    pub async fn on_edit(&self, note: NoteId, document: NoteDocument) {
        let other_note_pending = self
            .debouncer
            .inspect(|pending| pending.is_some_and(|s| s.note != note))
            .await;
        if other_note_pending {
            self.flush_now().await;
        }
        if let Some(displaced) = self.buffer(Snapshot { note, document }).await {
            self.save(displaced).await;
        }
    }

    /// Replace the buffered snapshot without flushing first. A displaced
    /// snapshot of another note is handed back for the caller to save.
    pub(crate) async fn buffer(&self, snapshot: Snapshot) -> Option<Snapshot> {
        let note = snapshot.note.clone();
        self.debouncer
            .schedule(snapshot)
            .await
            .filter(|displaced| displaced.note != note)
    }

    /// Save `snapshot` now, outside the debounce window.
    pub async fn save(&self, snapshot: Snapshot) {
        self.debouncer.commit_now(snapshot).await;
    }

    /// Save the buffered snapshot now, if any, and wait for the save.
    pub async fn flush_now(&self) -> bool {
        let flushed = self.debouncer.flush().await;
        if flushed {
            debug!(
                component = "autosave",
                op = "flush",
                vault_id = %self.vault(),
                "Flushed pending save"
            );
        }
        flushed
    }

    /// Drop the buffered snapshot without saving it.
    pub async fn cancel(&self) -> Option<Snapshot> {
        self.debouncer.cancel().await
    }

    /// Drop the buffered snapshot only if it belongs to `note`.
    pub async fn discard_for(&self, note: &NoteId) -> Option<Snapshot> {
        self.debouncer.cancel_if(|s| &s.note == note).await
    }

    pub async fn has_pending(&self) -> bool {
        self.debouncer.has_pending().await
    }

    pub async fn pending_note(&self) -> Option<NoteId> {
        self.debouncer
            .inspect(|pending| pending.map(|s| s.note.clone()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noetiq_core::VaultDraft;
    use noetiq_store::{Command, GatewayCall, MemoryGateway};
    use serde_json::json;

    const WINDOW: Duration = Duration::from_millis(2000);

    async fn fixture() -> (Arc<MemoryGateway>, AutosaveScheduler, VaultId, NoteId, NoteId, EventBus) {
        let gateway = Arc::new(MemoryGateway::with_password("pw", ""));
        let vault = gateway.seed_vault(VaultDraft::new("📦", "Work", "")).await;
        let a = gateway.seed_note(&vault, "a", NoteDocument::default()).await.unwrap();
        let b = gateway.seed_note(&vault, "b", NoteDocument::default()).await.unwrap();
        let events = EventBus::new(16);
        let scheduler = AutosaveScheduler::new(
            gateway.clone(),
            Credential::new("pw"),
            vault.clone(),
            WINDOW,
            events.clone(),
        );
        (gateway, scheduler, vault, a, b, events)
    }

    fn doc(text: &str) -> NoteDocument {
        NoteDocument::new(json!({"blocks": [{"type": "paragraph", "data": {"text": text}}]}))
    }

    #[tokio::test(start_paused = true)]
    async fn test_saves_latest_snapshot_after_window() {
        let (gateway, scheduler, vault, a, _, _) = fixture().await;
        scheduler.on_edit(a.clone(), doc("one")).await;
        tokio::time::sleep(Duration::from_millis(1000)).await;
        scheduler.on_edit(a.clone(), doc("two")).await;

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(gateway.count(Command::SaveNoteData).await, 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(gateway.count(Command::SaveNoteData).await, 1);
        assert_eq!(gateway.stored_document(&vault, &a).await, Some(doc("two")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_now_saves_immediately() {
        let (gateway, scheduler, vault, a, _, _) = fixture().await;
        assert!(!scheduler.flush_now().await);

        scheduler.on_edit(a.clone(), doc("x")).await;
        assert!(scheduler.flush_now().await);
        assert_eq!(gateway.stored_document(&vault, &a).await, Some(doc("x")));
        assert!(!scheduler.has_pending().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_for_other_note_flushes_pending_first() {
        let (gateway, scheduler, vault, a, b, _) = fixture().await;
        scheduler.on_edit(a.clone(), doc("for a")).await;
        scheduler.on_edit(b.clone(), doc("for b")).await;

        assert_eq!(gateway.stored_document(&vault, &a).await, Some(doc("for a")));
        assert_eq!(scheduler.pending_note().await, Some(b.clone()));
        assert_eq!(
            gateway.calls().await,
            vec![GatewayCall::SaveNoteData { vault, note: a }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_discard_for_only_matching_note() {
        let (gateway, scheduler, _, a, b, _) = fixture().await;
        scheduler.on_edit(a.clone(), doc("x")).await;
        assert!(scheduler.discard_for(&b).await.is_none());
        assert!(scheduler.discard_for(&a).await.is_some());

        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(gateway.count(Command::SaveNoteData).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_is_reported_not_retried() {
        let (gateway, scheduler, _, a, _, events) = fixture().await;
        let mut rx = events.subscribe();
        gateway.fail_next(Command::SaveNoteData, "disk full").await;

        scheduler.on_edit(a, doc("x")).await;
        tokio::time::sleep(WINDOW * 3).await;

        assert_eq!(gateway.count(Command::SaveNoteData).await, 1);
        let envelope = rx.recv().await.unwrap();
        assert!(matches!(
            envelope.payload,
            SessionEvent::Notice { ref operation, ref message }
                if operation == "autosave" && message.contains("disk full")
        ));
    }
}
