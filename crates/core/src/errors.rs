use thiserror::Error;

/// Unified error type for the entire market-research-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection / Network ────────────────────────────────────────
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({service}): {message}")]
    Api {
        service: String,
        message: String,
    },

    // ── Sheet contents ──────────────────────────────────────────────
    #[error("Unrecognized sheet layout: {0}")]
    Layout(String),

    #[error("Row {0} is not a data row")]
    RowNotFound(u32),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Record validation failed: {0}")]
    Validation(String),

    #[error("Invalid import file: {0}")]
    ImportFormat(String),

    // ── Configuration / Local files ─────────────────────────────────
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl CoreError {
    /// True for failures that make the backing sheet unusable for this session
    /// (bad credential, missing document, unreachable service).
    pub fn is_connection(&self) -> bool {
        matches!(self, CoreError::Connection(_) | CoreError::Network(_))
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL; drop the query string so
        // search terms and tokens passed as parameters never reach logs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
