//! Centralized default constants for Noetiq.
//!
//! Every crate references these constants instead of defining its own magic
//! numbers.

use rand::seq::SliceRandom;

// =============================================================================
// DEBOUNCE WINDOWS
// =============================================================================

/// Quiescence window before buffered note content is autosaved (milliseconds).
pub const AUTOSAVE_DEBOUNCE_MS: u64 = 2000;

/// Quiescence window before a title edit is committed (milliseconds).
pub const TITLE_DEBOUNCE_MS: u64 = 2000;

// =============================================================================
// EVENTS
// =============================================================================

/// Broadcast buffer capacity for the session event bus.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// DISPLAY
// =============================================================================

/// Label shown for a note whose title is blank.
pub const UNTITLED_NOTE: &str = "Untitled";

/// Icon used when an index entry carries none.
pub const FALLBACK_NOTE_ICON: &str = "📝";

// =============================================================================
// ICONS
// =============================================================================

/// Emoji palette new vaults and notes draw their default icon from.
pub const ICON_PALETTE: &[&str] = &[
    "😀", "😎", "🤓", "🥳", "🤯", "😇", "😈", "😴", "😭", "😅", "😬", "🤔", "😶‍🌫️", "😺", "😻",
    "🙃", "😮‍💨", "🤠", "🍕", "🍣", "🍎", "🥑", "🍩", "🍪", "🍉", "🍞", "🥐", "🍔", "🌮", "📦",
    "💡", "📚", "🖋️", "🔐", "💾", "🪄", "📅", "📎", "🧲", "🧠", "💻", "🖥️", "⌨️", "🖱️", "📱",
    "🧮", "📡", "🔋", "🔧", "🛠️", "🌱", "🌸", "🌈", "🌍", "🌕", "🔥", "❄️", "💧", "🌊", "🪐",
    "🐶", "🐱", "🐸", "🐢", "🦉", "🐝", "🐘", "🐙", "🦕", "🦄", "🎨", "🎸", "🎮", "🎲", "📸",
    "🎬", "🎧", "🎯", "🪅", "🔮", "🚀", "🧘", "🧳", "🧼", "🏕️", "🔎", "🧩", "📝", "✉️",
];

/// Pick a random icon from [`ICON_PALETTE`].
pub fn random_icon() -> String {
    ICON_PALETTE
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FALLBACK_NOTE_ICON)
        .to_string()
}
