//! Error types for guide parsing and configuration.

/// Document-level EPG failure. Record-level problems never surface here;
/// they are skipped by the parser.
#[derive(Debug, thiserror::Error)]
pub enum EpgError {
    /// The input is not well-formed XML (unclosed root, mismatched tags,
    /// no root element, undecodable bytes).
    #[error("Malformed EPG document at byte {position}: {reason}")]
    MalformedDocument { position: u64, reason: String },
}

impl EpgError {
    pub fn malformed<S: Into<String>>(position: u64, reason: S) -> Self {
        Self::MalformedDocument {
            position,
            reason: reason.into(),
        }
    }
}

/// Configuration file failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
