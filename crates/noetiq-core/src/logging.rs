//! Structured logging schema, field name constants, and subscriber setup.
//!
//! All crates use these constants for consistent structured logging fields.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Blocking failure surfaced to the user (credential rejected) |
//! | WARN  | Background failure that was swallowed (autosave, title commit) |
//! | INFO  | Lifecycle events (vault opened/closed, note created/deleted) |
//! | DEBUG | Decision points (stale result discarded, flush issued) |
//! | TRACE | Per-call gateway traffic, event bus emissions |

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{Error, Result};

// ─── Identity fields ───────────────────────────────────────────────────────

/// Component within the session layer.
/// Values: "catalog", "note_session", "autosave", "account", "gateway"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "select_note", "flush", "refresh_index", "create_vault"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Vault id being operated on.
pub const VAULT_ID: &str = "vault_id";

/// Note filename being operated on.
pub const NOTE_ID: &str = "note_id";

/// Selection generation token captured by an async load.
pub const GENERATION: &str = "generation";

/// Vault epoch captured by an async index refresh.
pub const EPOCH: &str = "epoch";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Number of entries in a refreshed index or catalog.
pub const RESULT_COUNT: &str = "result_count";

/// Debounce window in milliseconds.
pub const WINDOW_MS: &str = "window_ms";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

// ─── Subscriber setup ──────────────────────────────────────────────────────

/// Output encoding of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Parse `"json"` (case-insensitive); anything else is text.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Subscriber configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Write to a daily-rolling file instead of stdout.
    pub file: Option<PathBuf>,
    /// Force ANSI colors on or off; auto-detected when `None`.
    pub ansi: Option<bool>,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            file: None,
            ansi: None,
            default_filter: "noetiq_session=debug,noetiq_store=info".to_string(),
        }
    }
}

impl LogConfig {
    /// Read configuration from the environment.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `LOG_FORMAT` | `text` | `json` or `text` |
    /// | `LOG_FILE` | unset | path of a daily-rolling log file |
    /// | `LOG_ANSI` | auto | `true`/`1` or `false`/`0` |
    /// | `RUST_LOG` | see [`LogConfig::default`] | standard env filter |
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("LOG_FORMAT") {
            config.format = LogFormat::parse(&v);
        }
        config.file = std::env::var("LOG_FILE").ok().map(PathBuf::from);
        config.ansi = std::env::var("LOG_ANSI")
            .ok()
            .map(|v| v == "true" || v == "1");
        config
    }
}

/// Install the global tracing subscriber.
///
/// Returns the appender guard when logging to a file; keep it alive for the
/// life of the process or buffered lines are lost. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));
    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = config.file {
        let dir = path.parent().unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("noetiq.log");
        let appender = tracing_appender::rolling::daily(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        match config.format {
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .try_init(),
            LogFormat::Text => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(config.ansi.unwrap_or(false)),
                )
                .try_init(),
        }
        .map_err(|e| Error::Internal(format!("Failed to install subscriber: {e}")))?;
        Some(guard)
    } else {
        match config.format {
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init(),
            LogFormat::Text => {
                let mut layer = tracing_subscriber::fmt::layer();
                if let Some(ansi) = config.ansi {
                    layer = layer.with_ansi(ansi);
                }
                registry.with(layer).try_init()
            }
        }
        .map_err(|e| Error::Internal(format!("Failed to install subscriber: {e}")))?;
        None
    };

    tracing::info!(
        log_format = ?config.format,
        log_file = config.file.as_deref().and_then(Path::to_str).unwrap_or("(stdout)"),
        "Logging initialized"
    );
    Ok(guard)
}
