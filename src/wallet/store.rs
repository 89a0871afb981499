//! Persistence of the authorized account across restarts.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::wallet::provider::{AccountInfo, WalletError, WalletResult};

/// Stores the active account as a JSON file. Without a path, nothing is
/// persisted.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: Option<PathBuf>,
}

impl SessionStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn in_memory() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load the saved account. A missing file means no session.
    pub fn load(&self) -> WalletResult<Option<AccountInfo>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Store(format!("failed to read {}: {}", path.display(), e)))?;
        let account: AccountInfo = serde_json::from_str(&json)
            .map_err(|e| WalletError::Store(format!("failed to parse {}: {}", path.display(), e)))?;
        info!(path = %path.display(), address = %account.address, "Session restored");
        Ok(Some(account))
    }

    pub fn save(&self, account: &AccountInfo) -> WalletResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(account)
            .map_err(|e| WalletError::Store(format!("failed to serialize session: {}", e)))?;
        std::fs::write(path, json)
            .map_err(|e| WalletError::Store(format!("failed to write {}: {}", path.display(), e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(|e| {
                WalletError::Store(format!("failed to set permissions on {}: {}", path.display(), e))
            })?;
        }

        info!(path = %path.display(), address = %account.address, "Session saved");
        Ok(())
    }

    pub fn clear(&self) -> WalletResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match std::fs::remove_file(path) {
            Ok(()) => {
                info!(path = %path.display(), "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WalletError::Store(format!(
                "failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
