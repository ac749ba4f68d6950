use serde::Deserialize;
use std::path::Path;

use crate::errors::CoreError;

/// Environment variable holding a ready-to-use OAuth access token.
pub const ENV_ACCESS_TOKEN: &str = "MARKET_RESEARCH_ACCESS_TOKEN";

/// Bearer credential for the spreadsheet service.
///
/// Minting the token (service-account JWT exchange, user consent, ...) happens
/// outside this library; we only carry the result.
#[derive(Clone)]
pub struct Credential {
    access_token: String,
}

// Keep the token out of debug output.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct CredentialFile {
    access_token: String,
}

impl Credential {
    pub fn from_token(token: impl Into<String>) -> Result<Self, CoreError> {
        let access_token = token.into().trim().to_string();
        if access_token.is_empty() {
            return Err(CoreError::Connection("access token is empty".into()));
        }
        Ok(Self { access_token })
    }

    /// Parse a credential JSON document: `{"access_token": "..."}`.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let file: CredentialFile = serde_json::from_str(json)
            .map_err(|e| CoreError::Connection(format!("Malformed credential file: {e}")))?;
        Self::from_token(file.access_token)
    }

    /// Read a credential file from disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Connection(format!("Cannot read credential file {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    /// Take the token from `MARKET_RESEARCH_ACCESS_TOKEN`, falling back to
    /// the credential file at `path` when the variable is unset.
    pub fn resolve(path: Option<&Path>) -> Result<Self, CoreError> {
        if let Ok(token) = std::env::var(ENV_ACCESS_TOKEN) {
            if !token.trim().is_empty() {
                return Self::from_token(token);
            }
        }
        match path {
            #[cfg(not(target_arch = "wasm32"))]
            Some(path) => Self::from_file(path),
            _ => Err(CoreError::Connection(format!(
                "no credential: set {ENV_ACCESS_TOKEN} or configure credentials_path"
            ))),
        }
    }

    pub(crate) fn bearer(&self) -> &str {
        &self.access_token
    }
}
