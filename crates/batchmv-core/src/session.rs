//! Per-user registry of authenticated drive sessions.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::storage::StorageSession;

/// Holds at most one active drive session per Telegram user.
///
/// A session enters the registry on a successful login and leaves it on
/// `/logout` or when a rename run takes ownership of it. The remote logout in
/// [`SessionRegistry::remove`] is best-effort: the backend may already have
/// expired the token, and that must not keep a stale entry alive locally.
///
/// All map access is synchronized internally; remote calls are made after the
/// lock has been released.
pub struct SessionRegistry<S> {
    sessions: Mutex<HashMap<i64, S>>,
}

impl<S: StorageSession> SessionRegistry<S> {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Stores the session for a user, silently replacing any previous one.
    ///
    /// A displaced session is logged out best-effort so its token does not
    /// linger on the backend.
    pub async fn insert(&self, user_id: i64, session: S) {
        let displaced = {
            let mut sessions = self.sessions.lock().await;
            sessions.insert(user_id, session)
        };
        if let Some(old) = displaced
            && let Err(err) = old.logout().await
        {
            eprintln!("Logout of replaced session for user {user_id} failed: {err}");
        }
    }

    /// Removes and returns the session for a user, handing the caller
    /// exclusive ownership. Used by the rename path, which consumes the
    /// session whatever the outcome.
    pub async fn take(&self, user_id: i64) -> Option<S> {
        self.sessions.lock().await.remove(&user_id)
    }

    /// Whether the user currently has an active session.
    pub async fn is_active(&self, user_id: i64) -> bool {
        self.sessions.lock().await.contains_key(&user_id)
    }

    /// Drops the user's session, logging out remotely best-effort.
    ///
    /// Idempotent: returns whether a session existed. A failed remote logout
    /// never prevents local removal and is never surfaced to the caller.
    pub async fn remove(&self, user_id: i64) -> bool {
        let Some(session) = self.take(user_id).await else {
            return false;
        };
        if let Err(err) = session.logout().await {
            eprintln!("Remote logout for user {user_id} failed: {err}");
        }
        true
    }
}

impl<S: StorageSession> Default for SessionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::mock::MockSession;

    #[tokio::test]
    async fn take_hands_out_the_stored_session_once() {
        let registry = SessionRegistry::new();
        registry.insert(7, MockSession::default()).await;

        assert!(registry.is_active(7).await);
        assert!(registry.take(7).await.is_some());
        assert!(!registry.is_active(7).await);
        assert!(registry.take(7).await.is_none());
    }

    #[tokio::test]
    async fn sessions_are_isolated_per_user() {
        let registry = SessionRegistry::new();
        registry.insert(1, MockSession::default()).await;

        assert!(registry.is_active(1).await);
        assert!(!registry.is_active(2).await);
        assert!(registry.take(2).await.is_none());
        assert!(registry.is_active(1).await);
    }

    #[tokio::test]
    async fn remove_logs_out_remotely_and_is_idempotent() {
        let registry = SessionRegistry::new();
        let session = MockSession::default();
        let calls = Arc::clone(&session.calls);
        registry.insert(7, session).await;

        assert!(registry.remove(7).await);
        assert_eq!(calls.lock().unwrap().logout, 1);

        // Second remove is a no-op.
        assert!(!registry.remove(7).await);
        assert_eq!(calls.lock().unwrap().logout, 1);
    }

    #[tokio::test]
    async fn remove_swallows_remote_logout_failure() {
        let registry = SessionRegistry::new();
        registry.insert(7, MockSession::default().failing_logout()).await;

        assert!(registry.remove(7).await);
        assert!(!registry.is_active(7).await);
    }

    #[tokio::test]
    async fn insert_replaces_and_logs_out_the_old_session() {
        let registry = SessionRegistry::new();
        let first = MockSession::default();
        let first_calls = Arc::clone(&first.calls);

        registry.insert(7, first).await;
        registry.insert(7, MockSession::default()).await;

        assert_eq!(first_calls.lock().unwrap().logout, 1);
        assert!(registry.is_active(7).await);
    }
}
