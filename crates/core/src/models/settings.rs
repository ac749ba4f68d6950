use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::CoreError;

pub const ENV_DOCUMENT: &str = "MARKET_RESEARCH_DOCUMENT";
pub const ENV_WORKSHEET: &str = "MARKET_RESEARCH_WORKSHEET";
pub const ENV_CREDENTIALS: &str = "MARKET_RESEARCH_CREDENTIALS";

/// User-configurable settings. Every field has a default, so a settings file
/// only needs to list what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name of the spreadsheet document holding the ledger.
    pub document_name: String,

    /// Zero-based index of the worksheet inside the document.
    pub worksheet_index: usize,

    /// JSON file holding the access token (`{"access_token": "..."}`).
    pub credentials_path: Option<PathBuf>,

    /// Note attached to every bulk-imported record.
    pub import_note: String,

    /// Label suffix marking a sell price in import files.
    pub sell_marker: String,

    /// Label suffix marking a buy price in import files.
    pub buy_marker: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            document_name: "Market Research".to_string(),
            worksheet_index: 0,
            credentials_path: None,
            import_note: "bulk-imported".to_string(),
            sell_marker: "(sell)".to_string(),
            buy_marker: "(buy)".to_string(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| CoreError::Config(format!("Failed to parse settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file on disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Apply `MARKET_RESEARCH_*` environment variables on top of these settings.
    pub fn apply_env(self) -> Result<Self, CoreError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any name → value lookup. Empty values are ignored.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(document) = get(ENV_DOCUMENT) {
            self.document_name = document;
        }
        if let Some(index) = get(ENV_WORKSHEET) {
            self.worksheet_index = index.trim().parse().map_err(|_| {
                CoreError::Config(format!("{ENV_WORKSHEET} must be a non-negative integer, got '{index}'"))
            })?;
        }
        if let Some(path) = get(ENV_CREDENTIALS) {
            self.credentials_path = Some(PathBuf::from(path));
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.document_name.trim().is_empty() {
            return Err(CoreError::Config("document_name must not be empty".into()));
        }
        let sell = self.sell_marker.trim();
        let buy = self.buy_marker.trim();
        if sell.is_empty() || buy.is_empty() {
            return Err(CoreError::Config("import markers must not be empty".into()));
        }
        if sell == buy {
            return Err(CoreError::Config(format!(
                "sell and buy markers must differ (both are '{sell}')"
            )));
        }
        Ok(())
    }
}
