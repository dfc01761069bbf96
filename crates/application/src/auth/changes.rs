//! Token change notifications.
//!
//! A [`TokenNotifier`] is owned by a token store. Every mutation publishes
//! the new current token (or its absence) and every new subscriber first
//! receives the latest value, then each later publication in order.

use std::sync::{Mutex, MutexGuard, PoisonError};

use authgate_domain::AuthToken;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, warn};

/// Number of publications buffered per subscriber before it starts lagging.
const CHANGES_CAPACITY: usize = 16;

/// Reasons a change subscription yields no value.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ChangesError {
    /// Nothing has been published since the last read.
    #[error("no token change pending")]
    Empty,
    /// The owning token store has been dropped.
    #[error("token store closed")]
    Closed,
}

struct NotifierState {
    latest: Option<AuthToken>,
    sender: broadcast::Sender<Option<AuthToken>>,
}

/// Publisher side of the token change stream.
pub struct TokenNotifier {
    state: Mutex<NotifierState>,
}

impl TokenNotifier {
    /// Create a notifier whose replay value is `initial`.
    #[must_use]
    pub fn new(initial: Option<AuthToken>) -> Self {
        let (sender, _) = broadcast::channel(CHANGES_CAPACITY);
        Self {
            state: Mutex::new(NotifierState {
                latest: initial,
                sender,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, NotifierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a new current value and push it to every subscriber.
    pub fn publish(&self, token: Option<AuthToken>) {
        let mut state = self.lock();
        state.latest.clone_from(&token);
        // No subscribers is fine; the value is still replayed to later ones.
        let receivers = state.sender.send(token).unwrap_or(0);
        debug!(receivers, "Token change published");
    }

    /// Subscribe, replaying the latest value first.
    #[must_use]
    pub fn subscribe(&self) -> TokenChanges {
        let state = self.lock();
        TokenChanges {
            replay: Some(state.latest.clone()),
            receiver: state.sender.subscribe(),
        }
    }

    /// The most recently published value.
    #[must_use]
    pub fn latest(&self) -> Option<AuthToken> {
        self.lock().latest.clone()
    }
}

impl std::fmt::Debug for TokenNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("TokenNotifier")
            .field("has_token", &state.latest.is_some())
            .field("subscribers", &state.sender.receiver_count())
            .finish()
    }
}

/// Subscriber side of the token change stream.
#[derive(Debug)]
pub struct TokenChanges {
    #[allow(clippy::option_option)]
    replay: Option<Option<AuthToken>>,
    receiver: broadcast::Receiver<Option<AuthToken>>,
}

impl TokenChanges {
    /// Wait for the next value.
    ///
    /// The first call returns the value current at subscription time.
    /// A subscriber that falls behind skips to the oldest value still buffered.
    ///
    /// # Errors
    ///
    /// Returns [`ChangesError::Closed`] once the store is gone.
    pub async fn next(&mut self) -> Result<Option<AuthToken>, ChangesError> {
        if let Some(value) = self.replay.take() {
            return Ok(value);
        }
        loop {
            match self.receiver.recv().await {
                Ok(value) => return Ok(value),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Token change subscriber lagged, skipping ahead");
                }
                Err(RecvError::Closed) => return Err(ChangesError::Closed),
            }
        }
    }

    /// Take the next value without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`ChangesError::Empty`] if nothing is pending and
    /// [`ChangesError::Closed`] once the store is gone.
    pub fn try_next(&mut self) -> Result<Option<AuthToken>, ChangesError> {
        if let Some(value) = self.replay.take() {
            return Ok(value);
        }
        loop {
            match self.receiver.try_recv() {
                Ok(value) => return Ok(value),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Token change subscriber lagged, skipping ahead");
                }
                Err(TryRecvError::Empty) => return Err(ChangesError::Empty),
                Err(TryRecvError::Closed) => return Err(ChangesError::Closed),
            }
        }
    }

    /// Map this stream to authentication state.
    #[must_use]
    pub fn authenticated(self) -> AuthenticationChanges {
        AuthenticationChanges { inner: self }
    }
}

/// Token changes mapped to "is a token present".
#[derive(Debug)]
pub struct AuthenticationChanges {
    inner: TokenChanges,
}

impl AuthenticationChanges {
    /// Wait for the next authentication state.
    ///
    /// # Errors
    ///
    /// Returns [`ChangesError::Closed`] once the store is gone.
    pub async fn next(&mut self) -> Result<bool, ChangesError> {
        self.inner.next().await.map(|token| is_present(token.as_ref()))
    }

    /// Take the next authentication state without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`ChangesError::Empty`] if nothing is pending and
    /// [`ChangesError::Closed`] once the store is gone.
    pub fn try_next(&mut self) -> Result<bool, ChangesError> {
        self.inner.try_next().map(|token| is_present(token.as_ref()))
    }
}

pub(crate) fn is_present(token: Option<&AuthToken>) -> bool {
    token.is_some_and(AuthToken::is_present)
}
