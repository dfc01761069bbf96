//! File-based token store.
//!
//! The current token survives restarts in a single JSON document:
//! ```json
//! {
//!   "schema_version": 1,
//!   "token": {
//!     "value": "eyJhbGciOi...",
//!     "kind": "jwt",
//!     "created_at": "2024-01-01T00:00:00Z",
//!     "expires_at": "2024-01-01T01:00:00Z"
//!   }
//! }
//! ```
//! The file should not be committed or shared; it holds a live credential.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use authgate_application::ports::{Clock, FileSystem, FileSystemError};
use authgate_application::{TokenChanges, TokenNotifier, TokenStore, TokenStoreError};
use authgate_domain::{AuthToken, TokenKind};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// Current on-disk format version.
const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct TokenFile {
    schema_version: u32,
    token: AuthToken,
}

/// Default location of the token file: `<data dir>/authgate/token.json`.
#[must_use]
pub fn default_token_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("authgate").join("token.json"))
}

/// Durable token store backed by one JSON file.
///
/// Every `get` reads the file, so the stored document is the only source of
/// truth even when several processes share it. Writes replace the file
/// atomically, so a reader never observes a half-written document.
pub struct FileTokenStore<F> {
    fs: F,
    path: PathBuf,
    kind: TokenKind,
    clock: Arc<dyn Clock>,
    /// Readers share it; `set` and `clear` hold it exclusively.
    lock: RwLock<()>,
    notifier: TokenNotifier,
}

impl<F: FileSystem> FileTokenStore<F> {
    /// Open the store at `path`, loading any token persisted there.
    ///
    /// A missing file means no token.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub async fn open(
        fs: F,
        path: impl Into<PathBuf>,
        kind: TokenKind,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenStoreError> {
        let path = path.into();
        let initial = load(&fs, &path).await?;
        debug!(path = %path.display(), has_token = initial.is_some(), "Opened token file");
        Ok(Self {
            fs,
            path,
            kind,
            clock,
            lock: RwLock::new(()),
            notifier: TokenNotifier::new(initial),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the kind tokens are normalized into.
    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        self.kind
    }
}

async fn load<F: FileSystem>(fs: &F, path: &Path) -> Result<Option<AuthToken>, TokenStoreError> {
    if !fs.exists(path).await {
        return Ok(None);
    }
    let bytes = match fs.read_file(path).await {
        Ok(bytes) => bytes,
        // removed between the existence check and the read
        Err(FileSystemError::NotFound(_)) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let file: TokenFile =
        from_json_bytes(&bytes).map_err(|e| TokenStoreError::Serialization(e.to_string()))?;
    if file.schema_version != SCHEMA_VERSION {
        return Err(TokenStoreError::Serialization(format!(
            "unsupported token file schema version {} (expected {SCHEMA_VERSION})",
            file.schema_version
        )));
    }
    Ok(Some(file.token))
}

impl<F> std::fmt::Debug for FileTokenStore<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTokenStore")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F: FileSystem + Sync> TokenStore for FileTokenStore<F> {
    async fn get(&self) -> Result<Option<AuthToken>, TokenStoreError> {
        let _guard = self.lock.read().await;
        load(&self.fs, &self.path).await
    }

    async fn set(&self, token: AuthToken) -> Result<(), TokenStoreError> {
        let token = token.wrap(self.kind, self.clock.now());
        let document = TokenFile {
            schema_version: SCHEMA_VERSION,
            token,
        };
        let content = to_json_stable_bytes(&document)
            .map_err(|e| TokenStoreError::Serialization(e.to_string()))?;

        let _guard = self.lock.write().await;
        self.fs.write_file(&self.path, &content).await?;
        info!(path = %self.path.display(), kind = ?self.kind, "Token written to file");
        self.notifier.publish(Some(document.token));
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        let _guard = self.lock.write().await;
        match self.fs.remove_file(&self.path).await {
            Ok(()) => info!(path = %self.path.display(), "Token file removed"),
            Err(FileSystemError::NotFound(_)) => {
                debug!(path = %self.path.display(), "No token file to remove");
            }
            Err(e) => return Err(e.into()),
        }
        self.notifier.publish(None);
        Ok(())
    }

    fn changes(&self) -> TokenChanges {
        self.notifier.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::TokioFileSystem;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::from_timestamp(1_700_000_000, 0).unwrap()
        }
    }

    #[test]
    fn test_default_path_ends_with_token_file() {
        if let Some(path) = default_token_path() {
            assert!(path.ends_with("authgate/token.json"));
        }
    }

    #[tokio::test]
    async fn test_written_file_is_versioned_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token.json");
        let store =
            FileTokenStore::open(TokioFileSystem::new(), &path, TokenKind::Simple, Arc::new(FixedClock))
                .await
                .unwrap();

        store.set(AuthToken::new("abc123")).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["schema_version"], 1);
        assert_eq!(raw["token"]["value"], "abc123");
        assert_eq!(raw["token"]["kind"], "simple");
        assert_eq!(raw["token"]["created_at"], "2023-11-14T22:13:20Z");
    }

    #[tokio::test]
    async fn test_unknown_schema_version_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(
            &path,
            r#"{"schema_version": 99, "token": {"value": "x", "created_at": "2024-01-01T00:00:00Z"}}"#,
        )
        .unwrap();

        let result =
            FileTokenStore::open(TokioFileSystem::new(), &path, TokenKind::Simple, Arc::new(FixedClock))
                .await;
        assert!(matches!(result, Err(TokenStoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_clear_without_file_still_notifies() {
        let dir = tempdir().unwrap();
        let store = FileTokenStore::open(
            TokioFileSystem::new(),
            dir.path().join("token.json"),
            TokenKind::Simple,
            Arc::new(FixedClock),
        )
        .await
        .unwrap();
        let mut changes = store.changes();
        assert_eq!(changes.next().await.unwrap(), None);

        store.clear().await.unwrap();
        assert_eq!(changes.next().await.unwrap(), None);
    }
}
