use thiserror::Error;

/// Invalid tier-3 parameter overrides.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("override document must be a JSON object")]
    NotAnObject,
    #[error("invalid override for subsystem `{subsystem}`: {source}")]
    InvalidSubsystem {
        subsystem: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("override JSON could not be parsed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the raw key-value storage transport.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded for key `{0}`")]
    QuotaExceeded(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reasons a saved document yields no usable state.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("saved state is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("saved state has no version field")]
    MissingVersion,
    #[error("unsupported saved-state version {0}")]
    UnsupportedVersion(u64),
    #[error("migration from v{from} failed: {reason}")]
    Migration { from: u64, reason: String },
}

/// Rejected family tables for the unified config.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unified config needs at least one family")]
    NoFamilies,
    #[error("duplicate family id `{0}`")]
    DuplicateFamily(String),
    #[error("family id `{0}` must be non-empty and free of ':' and '|'")]
    InvalidFamilyId(String),
}
