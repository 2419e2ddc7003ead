//! Error taxonomy for the emotional core.
//!
//! Three families: schema/config problems surfaced at load time, unknown
//! event kinds (always a caller bug), and transient persistence failures.
//! Out-of-range numeric values are never errors — every mutation path
//! clamps instead.

use thiserror::Error;

/// Malformed or unrecognized configuration / persisted schema.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown emotion dimension: {name}")]
    UnknownDimension { name: String },

    #[error("unknown event kind in config table: {name}")]
    UnknownEventKind { name: String },

    #[error("persisted schema version {found} is newer than supported {supported}")]
    UnsupportedSchema { found: u32, supported: u32 },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A caller handed the core an event it has no mapping for. This is an
/// integration bug and is propagated loudly, never swallowed.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("no delta mapping for event kind: {kind}")]
    UnknownKind { kind: String },
}

/// Transient I/O failure against durable storage. Recoverable: callers
/// retry once and then degrade to in-memory state.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage unavailable: {0}")]
    Storage(String),

    #[error("persisted record is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}
