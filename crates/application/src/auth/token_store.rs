//! Token store port and in-memory implementation.
//!
//! A token store is the single source of truth for the current token. It
//! normalizes whatever it is given into its own representation, so callers
//! must read the value back rather than trust what they wrote.

use std::sync::Arc;

use async_trait::async_trait;
use authgate_domain::{AuthToken, TokenKind};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use super::changes::{TokenChanges, TokenNotifier};
use crate::ports::{Clock, FileSystemError};

/// Errors that can occur during token store operations.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File system error.
    #[error("file system error: {0}")]
    FileSystem(#[from] FileSystemError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable holder of at most one current token.
///
/// `set` followed by `get` must observe the value just written, and every
/// mutation is published on [`TokenStore::changes`].
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns the current token, or `None` when unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    async fn get(&self) -> Result<Option<AuthToken>, TokenStoreError>;

    /// Replaces the current token. Resolves once the write is durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be persisted.
    async fn set(&self, token: AuthToken) -> Result<(), TokenStoreError>;

    /// Removes the current token. Resolves once the removal is durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be updated.
    async fn clear(&self) -> Result<(), TokenStoreError>;

    /// Subscribe to mutations, starting with the current value.
    fn changes(&self) -> TokenChanges;
}

/// Thread-safe in-memory token store.
///
/// Lives as long as the process; useful for tests and short-lived tools.
pub struct InMemoryTokenStore {
    slot: RwLock<Option<AuthToken>>,
    kind: TokenKind,
    clock: Arc<dyn Clock>,
    notifier: TokenNotifier,
}

impl InMemoryTokenStore {
    /// Create an empty store that wraps tokens into `kind`.
    #[must_use]
    pub fn new(kind: TokenKind, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: RwLock::new(None),
            kind,
            clock,
            notifier: TokenNotifier::new(None),
        }
    }

    /// Returns the kind tokens are normalized into.
    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        self.kind
    }
}

impl std::fmt::Debug for InMemoryTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTokenStore")
            .field("kind", &self.kind)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self) -> Result<Option<AuthToken>, TokenStoreError> {
        Ok(self.slot.read().await.clone())
    }

    async fn set(&self, token: AuthToken) -> Result<(), TokenStoreError> {
        let token = token.wrap(self.kind, self.clock.now());
        // publish under the slot lock so subscribers see writes in slot order
        let mut slot = self.slot.write().await;
        *slot = Some(token.clone());
        self.notifier.publish(Some(token));
        drop(slot);
        info!(kind = ?self.kind, "Token stored in memory");
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        let mut slot = self.slot.write().await;
        slot.take();
        self.notifier.publish(None);
        drop(slot);
        info!("Token cleared from memory");
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
    use crate::auth::ChangesError;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn store() -> InMemoryTokenStore {
        let clock = FixedClock(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        InMemoryTokenStore::new(TokenKind::Simple, Arc::new(clock))
    }

    #[tokio::test]
    async fn test_read_after_write() {
        let store = store();
        assert!(store.get().await.unwrap().is_none());

        store.set(AuthToken::new("abc123")).await.unwrap();
        let token = store.get().await.unwrap().unwrap();
        assert_eq!(token.value(), "abc123");
        assert_eq!(
            token.created_at,
            DateTime::from_timestamp(1_700_000_000, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_clear_emits_absent() {
        let store = store();
        store.set(AuthToken::new("abc123")).await.unwrap();

        let mut changes = store.changes();
        assert!(changes.next().await.unwrap().is_some());

        store.clear().await.unwrap();
        assert_eq!(changes.next().await.unwrap(), None);
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_emits_once_per_mutation() {
        let store = store();
        let mut changes = store.changes();
        changes.next().await.unwrap();

        store.set(AuthToken::new("one")).await.unwrap();
        store.set(AuthToken::new("two")).await.unwrap();

        assert_eq!(changes.try_next().unwrap().unwrap().value(), "one");
        assert_eq!(changes.try_next().unwrap().unwrap().value(), "two");
        assert_eq!(changes.try_next(), Err(ChangesError::Empty));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_last_change_matches_stored_value_under_concurrent_sets() {
        let store = Arc::new(store());
        let mut changes = store.changes();
        changes.next().await.unwrap();

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store.set(AuthToken::new(format!("token-{i}"))).await.unwrap();
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let current = store.get().await.unwrap();
        let mut last = None;
        while let Ok(token) = changes.try_next() {
            last = token;
        }
        assert_eq!(last, current);
        assert_eq!(store.changes().next().await.unwrap(), current);
    }
}
