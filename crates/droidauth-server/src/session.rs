//! Login session state.
//!
//! One session covers one browser sign-in. It moves forward only:
//!
//! ```text
//! Idle -> AwaitingCapture -> Captured -> Exchanging -> Resolved
//! ```
//!
//! The first `oauth_token` cookie seen wins; later ones are ignored. The
//! exchange that follows a capture runs on the session's task tracker, so
//! callers can await it instead of racing a detached task. The lock is only
//! held for field reads and writes, never across I/O.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::oneshot;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use crate::exchange::SharedExchange;

/// Where a login session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginPhase {
    Idle,
    AwaitingCapture,
    Captured,
    Exchanging,
    Resolved,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Master token stored for this account.
    Success { email: String },
    /// The exchange failed.
    Failed { error: String },
    /// The session was discarded before it resolved.
    Abandoned,
}

/// Point-in-time view for pollers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginSnapshot {
    pub id: Uuid,
    pub phase: LoginPhase,
    pub captured: bool,
    pub email: String,
    pub error: String,
}

#[derive(Debug)]
struct Inner {
    phase: LoginPhase,
    token: Option<String>,
    email: String,
    error: String,
    abandoned: bool,
    waiters: Vec<oneshot::Sender<LoginOutcome>>,
}

impl Inner {
    fn outcome(&self) -> Option<LoginOutcome> {
        if self.phase == LoginPhase::Resolved {
            Some(if self.error.is_empty() {
                LoginOutcome::Success {
                    email: self.email.clone(),
                }
            } else {
                LoginOutcome::Failed {
                    error: self.error.clone(),
                }
            })
        } else if self.abandoned {
            Some(LoginOutcome::Abandoned)
        } else {
            None
        }
    }

    fn advance(&mut self, to: LoginPhase) {
        if to > self.phase {
            self.phase = to;
        }
    }
}

/// An explicitly owned login session.
#[derive(Debug)]
pub struct LoginSession {
    id: Uuid,
    inner: Mutex<Inner>,
    tasks: TaskTracker,
}

impl LoginSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            inner: Mutex::new(Inner {
                phase: LoginPhase::Idle,
                token: None,
                email: String::new(),
                error: String::new(),
                abandoned: false,
                waiters: Vec::new(),
            }),
            tasks: TaskTracker::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> LoginPhase {
        self.inner.lock().phase
    }

    pub fn snapshot(&self) -> LoginSnapshot {
        let inner = self.inner.lock();
        LoginSnapshot {
            id: self.id,
            phase: inner.phase,
            captured: inner.phase >= LoginPhase::Captured,
            email: inner.email.clone(),
            error: inner.error.clone(),
        }
    }

    /// Record that the browser has started talking to the proxy.
    pub fn mark_request(&self) {
        self.inner.lock().advance(LoginPhase::AwaitingCapture);
    }

    /// First-writer-wins capture. Returns whether this call won.
    pub fn try_capture(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        let mut inner = self.inner.lock();
        if inner.token.is_some() || inner.abandoned {
            return false;
        }
        inner.token = Some(token.to_string());
        inner.advance(LoginPhase::Captured);
        true
    }

    /// Capture `token` and, if this call won, start the exchange in the
    /// background. Never waits on the exchange.
    pub fn capture(self: &Arc<Self>, token: &str, exchange: SharedExchange) -> bool {
        if !self.try_capture(token) {
            return false;
        }
        tracing::info!(session = %self.id, token_len = token.len(), "Captured login cookie");

        self.inner.lock().advance(LoginPhase::Exchanging);
        let session = Arc::clone(self);
        let token = token.to_string();
        self.tasks.spawn(async move {
            let result = exchange.exchange(&token).await;
            session.resolve(result.map_err(|e| e.to_string()));
        });
        true
    }

    /// Record the exchange result and wake every waiter.
    pub fn resolve(&self, result: std::result::Result<String, String>) {
        let (outcome, waiters) = {
            let mut inner = self.inner.lock();
            if inner.phase == LoginPhase::Resolved {
                return;
            }
            match result {
                Ok(email) => inner.email = email,
                Err(error) => {
                    tracing::warn!(session = %self.id, error = %error, "Login exchange failed");
                    inner.error = error;
                }
            }
            inner.advance(LoginPhase::Resolved);
            (inner.outcome(), std::mem::take(&mut inner.waiters))
        };

        if let Some(outcome) = outcome {
            for waiter in waiters {
                let _ = waiter.send(outcome.clone());
            }
        }
    }

    /// Mark the session discarded. Pending waiters see [`LoginOutcome::Abandoned`].
    pub fn abandon(&self) {
        let waiters = {
            let mut inner = self.inner.lock();
            if inner.phase == LoginPhase::Resolved {
                return;
            }
            inner.abandoned = true;
            std::mem::take(&mut inner.waiters)
        };
        for waiter in waiters {
            let _ = waiter.send(LoginOutcome::Abandoned);
        }
    }

    /// Wait until the session resolves or is abandoned.
    pub async fn wait_resolved(&self) -> LoginOutcome {
        let rx = {
            let mut inner = self.inner.lock();
            if let Some(outcome) = inner.outcome() {
                return outcome;
            }
            let (tx, rx) = oneshot::channel();
            inner.waiters.push(tx);
            rx
        };
        rx.await.unwrap_or(LoginOutcome::Abandoned)
    }

    /// Wait for every background exchange spawned so far.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }
}

impl Default for LoginSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, ServerError};
    use crate::exchange::MasterTokenExchange;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Barrier;

    #[derive(Debug, Default)]
    struct CountingExchange {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl MasterTokenExchange for CountingExchange {
        async fn exchange(&self, oauth_token: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ServerError::Internal("exchange refused".to_string()));
            }
            Ok(format!("{oauth_token}@example.com"))
        }
    }

    #[test]
    fn test_phases_only_move_forward() {
        let session = LoginSession::new();
        assert_eq!(session.phase(), LoginPhase::Idle);
        session.mark_request();
        assert_eq!(session.phase(), LoginPhase::AwaitingCapture);
        assert!(session.try_capture("tok"));
        assert_eq!(session.phase(), LoginPhase::Captured);
        session.mark_request();
        assert_eq!(session.phase(), LoginPhase::Captured);
    }

    #[test]
    fn test_empty_token_not_captured() {
        let session = LoginSession::new();
        assert!(!session.try_capture(""));
        assert!(!session.snapshot().captured);
    }

    #[test]
    fn test_second_capture_ignored() {
        let session = LoginSession::new();
        assert!(session.try_capture("first"));
        assert!(!session.try_capture("second"));
        assert_eq!(session.inner.lock().token.as_deref(), Some("first"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_capture_single_exchange() {
        let session = Arc::new(LoginSession::new());
        let exchange = Arc::new(CountingExchange::default());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = ["alpha", "beta"]
            .into_iter()
            .map(|token| {
                let session = session.clone();
                let exchange: SharedExchange = exchange.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    session.capture(token, exchange)
                })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        session.drain().await;

        assert_eq!(wins, 1);
        assert_eq!(exchange.calls.load(Ordering::SeqCst), 1);
        let snap = session.snapshot();
        assert_eq!(snap.phase, LoginPhase::Resolved);
        assert!(snap.email == "alpha@example.com" || snap.email == "beta@example.com");
    }

    #[tokio::test]
    async fn test_wait_resolved_success() {
        let session = Arc::new(LoginSession::new());
        let waiter = {
            let session = session.clone();
            tokio::spawn(async move { session.wait_resolved().await })
        };
        tokio::task::yield_now().await;

        session.capture("tok", Arc::new(CountingExchange::default()));
        let outcome = waiter.await.unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::Success {
                email: "tok@example.com".to_string()
            }
        );
        // Already resolved: returns immediately.
        assert_eq!(session.wait_resolved().await, outcome);
    }

    #[tokio::test]
    async fn test_failed_exchange_recorded() {
        let session = Arc::new(LoginSession::new());
        let exchange = Arc::new(CountingExchange {
            fail: true,
            ..CountingExchange::default()
        });
        session.capture("tok", exchange);
        session.drain().await;

        let snap = session.snapshot();
        assert_eq!(snap.phase, LoginPhase::Resolved);
        assert!(snap.email.is_empty());
        assert_eq!(snap.error, "exchange refused");
        assert!(matches!(
            session.wait_resolved().await,
            LoginOutcome::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn test_abandon_wakes_waiters() {
        let session = Arc::new(LoginSession::new());
        let waiter = {
            let session = session.clone();
            tokio::spawn(async move { session.wait_resolved().await })
        };
        tokio::task::yield_now().await;

        session.abandon();
        assert_eq!(waiter.await.unwrap(), LoginOutcome::Abandoned);
        assert!(!session.try_capture("late"));
    }

    #[test]
    fn test_phase_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&LoginPhase::AwaitingCapture).unwrap(),
            "\"awaiting_capture\""
        );
    }
}
