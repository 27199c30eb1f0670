//! Session event types, envelope schema, and event bus.
//!
//! Controllers report state transitions and background failures here. A UI
//! layer subscribes to redraw on index refreshes and to surface non-blocking
//! notices (an autosave that failed, a title that could not be committed)
//! without those failures interrupting the user's flow.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::models::{NoteId, VaultId};

// ============================================================================
// Event Envelope
// ============================================================================

/// Wrapper carrying identity and timing metadata around a [`SessionEvent`].
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    /// Namespaced event type (e.g., `"note.saved"`).
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
    pub payload: SessionEvent,
}

impl EventEnvelope {
    pub fn new(event: SessionEvent) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event.namespaced_event_type().to_string(),
            occurred_at: Utc::now(),
            payload: event,
        }
    }
}

// ============================================================================
// Session Events
// ============================================================================

/// Domain events emitted by the catalog and note session controllers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A vault was opened and its index loaded.
    VaultOpened { vault: VaultId, note_count: usize },
    /// The open vault was closed after flushing.
    VaultClosed { vault: VaultId },
    /// The cached note index was replaced by a fresh fetch.
    IndexRefreshed { vault: VaultId, note_count: usize },
    /// A content load was issued for the newly active note.
    NoteLoading { note: NoteId, generation: u64 },
    /// The active note's content was applied.
    NoteReady { note: NoteId, generation: u64 },
    /// A load resolved after its note stopped being the active one.
    LoadDiscarded { note: NoteId, generation: u64 },
    /// Buffered content reached the gateway.
    NoteSaved { note: NoteId },
    /// A new note was created and selected.
    NoteCreated { note: NoteId },
    /// A note was deleted.
    NoteDeleted { note: NoteId },
    /// A debounced title edit was committed.
    TitleCommitted { note: NoteId },
    /// A note's icon was changed.
    IconChanged { note: NoteId },
    /// The vault catalog was replaced by a fresh fetch.
    CatalogRefreshed { vault_count: usize },
    /// Non-blocking failure of background work; logged, never retried.
    Notice { operation: String, message: String },
}

impl SessionEvent {
    /// Returns the namespaced event type for the envelope.
    pub fn namespaced_event_type(&self) -> &'static str {
        match self {
            SessionEvent::VaultOpened { .. } => "vault.opened",
            SessionEvent::VaultClosed { .. } => "vault.closed",
            SessionEvent::IndexRefreshed { .. } => "index.refreshed",
            SessionEvent::NoteLoading { .. } => "note.loading",
            SessionEvent::NoteReady { .. } => "note.ready",
            SessionEvent::LoadDiscarded { .. } => "note.load_discarded",
            SessionEvent::NoteSaved { .. } => "note.saved",
            SessionEvent::NoteCreated { .. } => "note.created",
            SessionEvent::NoteDeleted { .. } => "note.deleted",
            SessionEvent::TitleCommitted { .. } => "note.title_committed",
            SessionEvent::IconChanged { .. } => "note.icon_changed",
            SessionEvent::CatalogRefreshed { .. } => "catalog.refreshed",
            SessionEvent::Notice { .. } => "notice",
        }
    }

    /// Note this event relates to, if any.
    pub fn note(&self) -> Option<&NoteId> {
        match self {
            SessionEvent::NoteLoading { note, .. }
            | SessionEvent::NoteReady { note, .. }
            | SessionEvent::LoadDiscarded { note, .. }
            | SessionEvent::NoteSaved { note }
            | SessionEvent::NoteCreated { note }
            | SessionEvent::NoteDeleted { note }
            | SessionEvent::TitleCommitted { note }
            | SessionEvent::IconChanged { note } => Some(note),
            _ => None,
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast-based event bus for distributing session events.
///
/// Slow receivers that fall behind get a `Lagged` error and miss events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Bus sized by [`SessionConfig::event_capacity`].
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.event_capacity)
    }

    /// Emit an event to all subscribers. Dropped silently when nobody listens.
    pub fn emit(&self, event: SessionEvent) {
        let envelope = EventEnvelope::new(event);
        tracing::trace!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Shorthand for a [`SessionEvent::Notice`].
    pub fn notice(&self, operation: &str, message: impl Into<String>) {
        self.emit(SessionEvent::Notice {
            operation: operation.to_string(),
            message: message.into(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}
