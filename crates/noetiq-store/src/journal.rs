//! Call journal, latency, and fault injection for [`MemoryGateway`](crate::MemoryGateway).
//!
//! Every command is recorded at the moment it is *issued*, before any
//! simulated latency elapses, so tests can assert on request ordering
//! independently of response ordering.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use noetiq_core::{NoteId, VaultId};

/// Gateway command kinds, used as keys for latency and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    ListVaults,
    CreateVault,
    UpdateVault,
    DeleteVault,
    GetVaultNotesNumber,
    GetNotesIndex,
    CreateNote,
    DeleteNote,
    UpdateNoteTitle,
    UpdateNoteIcon,
    GetNoteData,
    SaveNoteData,
    GetNoteEditDate,
    SetPassword,
    ReencryptData,
    ReadPublic,
}

/// One issued gateway command with the arguments tests care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ListVaults,
    CreateVault { name: String },
    UpdateVault { vault: VaultId, name: String },
    DeleteVault { vault: VaultId },
    GetVaultNotesNumber { vault: VaultId },
    GetNotesIndex { vault: VaultId },
    CreateNote { vault: VaultId, icon: String },
    DeleteNote { vault: VaultId, note: NoteId },
    UpdateNoteTitle { vault: VaultId, note: NoteId, title: String },
    UpdateNoteIcon { vault: VaultId, note: NoteId, icon: String },
    GetNoteData { vault: VaultId, note: NoteId },
    SaveNoteData { vault: VaultId, note: NoteId },
    GetNoteEditDate { vault: VaultId, note: NoteId },
    SetPassword,
    ReencryptData,
    ReadPublic,
}

impl GatewayCall {
    pub fn command(&self) -> Command {
        match self {
            GatewayCall::ListVaults => Command::ListVaults,
            GatewayCall::CreateVault { .. } => Command::CreateVault,
            GatewayCall::UpdateVault { .. } => Command::UpdateVault,
            GatewayCall::DeleteVault { .. } => Command::DeleteVault,
            GatewayCall::GetVaultNotesNumber { .. } => Command::GetVaultNotesNumber,
            GatewayCall::GetNotesIndex { .. } => Command::GetNotesIndex,
            GatewayCall::CreateNote { .. } => Command::CreateNote,
            GatewayCall::DeleteNote { .. } => Command::DeleteNote,
            GatewayCall::UpdateNoteTitle { .. } => Command::UpdateNoteTitle,
            GatewayCall::UpdateNoteIcon { .. } => Command::UpdateNoteIcon,
            GatewayCall::GetNoteData { .. } => Command::GetNoteData,
            GatewayCall::SaveNoteData { .. } => Command::SaveNoteData,
            GatewayCall::GetNoteEditDate { .. } => Command::GetNoteEditDate,
            GatewayCall::SetPassword => Command::SetPassword,
            GatewayCall::ReencryptData => Command::ReencryptData,
            GatewayCall::ReadPublic => Command::ReadPublic,
        }
    }

    /// Note addressed by this call, if any.
    pub fn note(&self) -> Option<&NoteId> {
        match self {
            GatewayCall::DeleteNote { note, .. }
            | GatewayCall::UpdateNoteTitle { note, .. }
            | GatewayCall::UpdateNoteIcon { note, .. }
            | GatewayCall::GetNoteData { note, .. }
            | GatewayCall::SaveNoteData { note, .. }
            | GatewayCall::GetNoteEditDate { note, .. } => Some(note),
            _ => None,
        }
    }
}

/// Recorded calls plus the injected behaviour for upcoming ones.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    pub(crate) calls: Vec<GatewayCall>,
    latency: HashMap<Command, Duration>,
    note_latency: HashMap<(Command, NoteId), Duration>,
    faults: HashMap<Command, VecDeque<String>>,
}

impl Journal {
    /// Record `call` and return the latency and fault that apply to it.
    pub(crate) fn issue(&mut self, call: GatewayCall) -> (Duration, Option<String>) {
        let command = call.command();
        let delay = call
            .note()
            .and_then(|note| self.note_latency.get(&(command, note.clone())))
            .or_else(|| self.latency.get(&command))
            .copied()
            .unwrap_or(Duration::ZERO);
        let fault = self.faults.get_mut(&command).and_then(VecDeque::pop_front);
        self.calls.push(call);
        (delay, fault)
    }

    pub(crate) fn set_latency(&mut self, command: Command, delay: Duration) {
        self.latency.insert(command, delay);
    }

    pub(crate) fn set_note_latency(&mut self, command: Command, note: NoteId, delay: Duration) {
        self.note_latency.insert((command, note), delay);
    }

    pub(crate) fn fail_next(&mut self, command: Command, message: String) {
        self.faults.entry(command).or_default().push_back(message);
    }
}
