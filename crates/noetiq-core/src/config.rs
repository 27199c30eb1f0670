//! Session controller configuration.

use std::time::Duration;

use crate::defaults::{AUTOSAVE_DEBOUNCE_MS, EVENT_BUS_CAPACITY, TITLE_DEBOUNCE_MS};

/// Timing and buffering knobs for the note session and catalog controllers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Quiescence window before buffered content is autosaved.
    pub autosave_debounce_ms: u64,
    /// Quiescence window before a title edit is committed.
    pub title_debounce_ms: u64,
    /// Event bus buffer capacity.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autosave_debounce_ms: AUTOSAVE_DEBOUNCE_MS,
            title_debounce_ms: TITLE_DEBOUNCE_MS,
            event_capacity: EVENT_BUS_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `NOETIQ_AUTOSAVE_DEBOUNCE_MS` | `2000` | Autosave quiescence window |
    /// | `NOETIQ_TITLE_DEBOUNCE_MS` | `2000` | Title commit quiescence window |
    /// | `NOETIQ_EVENT_CAPACITY` | `256` | Event bus buffer size |
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("NOETIQ_AUTOSAVE_DEBOUNCE_MS") {
            match val.parse::<u64>() {
                Ok(ms) => config.autosave_debounce_ms = ms,
                Err(_) => {
                    tracing::warn!(
                        value = %val,
                        "Invalid NOETIQ_AUTOSAVE_DEBOUNCE_MS, using default"
                    )
                }
            }
        }

        if let Ok(val) = std::env::var("NOETIQ_TITLE_DEBOUNCE_MS") {
            match val.parse::<u64>() {
                Ok(ms) => config.title_debounce_ms = ms,
                Err(_) => {
                    tracing::warn!(
                        value = %val,
                        "Invalid NOETIQ_TITLE_DEBOUNCE_MS, using default"
                    )
                }
            }
        }

        if let Ok(val) = std::env::var("NOETIQ_EVENT_CAPACITY") {
            match val.parse::<usize>() {
                Ok(n) => config.event_capacity = n.max(1),
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid NOETIQ_EVENT_CAPACITY, using default")
                }
            }
        }

        config
    }

    pub fn with_autosave_debounce(mut self, ms: u64) -> Self {
        self.autosave_debounce_ms = ms;
        self
    }

    pub fn with_title_debounce(mut self, ms: u64) -> Self {
        self.title_debounce_ms = ms;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub fn autosave_window(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn title_window(&self) -> Duration {
        Duration::from_millis(self.title_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_windows() {
        let config = SessionConfig::default();
        assert_eq!(config.autosave_window(), Duration::from_millis(2000));
        assert_eq!(config.title_window(), Duration::from_millis(2000));
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn test_builder_overrides() {
        let config = SessionConfig::default()
            .with_autosave_debounce(500)
            .with_title_debounce(750)
            .with_event_capacity(0);
        assert_eq!(config.autosave_debounce_ms, 500);
        assert_eq!(config.title_debounce_ms, 750);
        assert_eq!(config.event_capacity, 1);
    }

    #[test]
    fn test_from_env_reads_overrides() {
        std::env::set_var("NOETIQ_AUTOSAVE_DEBOUNCE_MS", "1500");
        std::env::set_var("NOETIQ_TITLE_DEBOUNCE_MS", "not-a-number");
        let config = SessionConfig::from_env();
        std::env::remove_var("NOETIQ_AUTOSAVE_DEBOUNCE_MS");
        std::env::remove_var("NOETIQ_TITLE_DEBOUNCE_MS");

        assert_eq!(config.autosave_debounce_ms, 1500);
        assert_eq!(config.title_debounce_ms, TITLE_DEBOUNCE_MS);
    }
}
