//! Remote drive capabilities.
//!
//! The bot never talks to a drive backend directly; it goes through the
//! [`StorageConnector`] / [`StorageSession`] pair. The shipped implementation
//! is the HTTP drive gateway in [`gateway`].

use std::fmt;
use std::future::Future;

pub mod gateway;

pub use gateway::{GatewayClient, GatewaySession};

/// One addressable entry (file or folder) in a drive listing.
///
/// The backend does not guarantee a display name for every node; an unnamed
/// node is still renameable through its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    /// Opaque node id assigned by the backend.
    pub id: String,
    /// Display name, if the backend recorded one.
    pub name: Option<String>,
}

/// Categories of drive errors for consistent error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// Credentials rejected or session token no longer valid
    Auth,
    /// Transport-level failure (connect, timeout, non-2xx status)
    Http,
    /// API-level error returned by the gateway
    Api,
    /// Failed to decode a gateway response body
    Decode,
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageErrorKind::Auth => write!(f, "auth"),
            StorageErrorKind::Http => write!(f, "http"),
            StorageErrorKind::Api => write!(f, "api"),
            StorageErrorKind::Decode => write!(f, "decode"),
        }
    }
}

/// Structured error from the drive layer with kind and a display-safe message.
///
/// Messages never contain credentials; they are shown to the end user as-is.
#[derive(Debug, Clone)]
pub struct StorageError {
    /// Error category
    pub kind: StorageErrorKind,
    /// One-line summary suitable for display
    pub message: String,
}

impl StorageError {
    /// Creates a new storage error.
    pub fn new(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Auth, message)
    }

    /// Creates an HTTP status error, extracting the gateway's error field
    /// from the body when present.
    pub fn http_status(status: u16, body: &str) -> Self {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(body)
            && let Some(msg) = json.get("error").and_then(|v| v.as_str())
        {
            return Self::new(StorageErrorKind::Http, format!("HTTP {status}: {msg}"));
        }
        Self::new(StorageErrorKind::Http, format!("HTTP {status}"))
    }

    /// Creates a response decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Decode, message)
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StorageError {}

/// Result type for drive operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Entry point to a drive backend: exchanges credentials for a session.
///
/// Credentials are borrowed for the duration of the call and never stored;
/// the returned session holds only the authenticated handle.
pub trait StorageConnector: Clone + Send + Sync + 'static {
    type Session: StorageSession;

    fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = StorageResult<Self::Session>> + Send;
}

/// An authenticated handle to a drive backend, scoped to one account.
pub trait StorageSession: Send + Sync + 'static {
    /// Lists every node in the account. No ordering is guaranteed.
    fn list(&self) -> impl Future<Output = StorageResult<Vec<RemoteItem>>> + Send;

    /// Renames a node addressed by its id.
    fn rename_by_id(
        &self,
        id: &str,
        new_name: &str,
    ) -> impl Future<Output = StorageResult<()>> + Send;

    /// Renames a node addressed by its current display name.
    ///
    /// Older gateway backends only support name addressing; callers use this
    /// as a fallback when [`StorageSession::rename_by_id`] is rejected.
    fn rename_by_name(
        &self,
        current_name: &str,
        new_name: &str,
    ) -> impl Future<Output = StorageResult<()>> + Send;

    /// Invalidates the session token on the backend.
    fn logout(&self) -> impl Future<Output = StorageResult<()>> + Send;
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory drive double used by the session and rename tests.

    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use super::{RemoteItem, StorageError, StorageErrorKind, StorageResult, StorageSession};

    /// Record of every call a [`MockSession`] received.
    #[derive(Debug, Default)]
    pub struct Calls {
        pub list: usize,
        pub logout: usize,
        /// (id, new_name) for every rename_by_id attempt
        pub by_id: Vec<(String, String)>,
        /// (current_name, new_name) for every rename_by_name attempt
        pub by_name: Vec<(String, String)>,
    }

    #[derive(Clone, Default)]
    pub struct MockSession {
        items: Vec<RemoteItem>,
        list_fails: bool,
        fail_ids: HashSet<String>,
        fail_names: HashSet<String>,
        logout_fails: bool,
        pub calls: Arc<Mutex<Calls>>,
    }

    impl MockSession {
        pub fn with_items(items: Vec<RemoteItem>) -> Self {
            Self {
                items,
                ..Self::default()
            }
        }

        pub fn failing_list() -> Self {
            Self {
                list_fails: true,
                ..Self::default()
            }
        }

        pub fn fail_id(mut self, id: &str) -> Self {
            self.fail_ids.insert(id.to_string());
            self
        }

        pub fn fail_name(mut self, name: &str) -> Self {
            self.fail_names.insert(name.to_string());
            self
        }

        pub fn failing_logout(mut self) -> Self {
            self.logout_fails = true;
            self
        }

        pub fn rename_calls(&self) -> usize {
            let calls = self.calls.lock().unwrap();
            calls.by_id.len() + calls.by_name.len()
        }
    }

    impl StorageSession for MockSession {
        async fn list(&self) -> StorageResult<Vec<RemoteItem>> {
            self.calls.lock().unwrap().list += 1;
            if self.list_fails {
                return Err(StorageError::new(StorageErrorKind::Http, "HTTP 503"));
            }
            Ok(self.items.clone())
        }

        async fn rename_by_id(&self, id: &str, new_name: &str) -> StorageResult<()> {
            self.calls
                .lock()
                .unwrap()
                .by_id
                .push((id.to_string(), new_name.to_string()));
            if self.fail_ids.contains(id) {
                return Err(StorageError::new(StorageErrorKind::Api, "unknown node id"));
            }
            Ok(())
        }

        async fn rename_by_name(&self, current_name: &str, new_name: &str) -> StorageResult<()> {
            self.calls
                .lock()
                .unwrap()
                .by_name
                .push((current_name.to_string(), new_name.to_string()));
            if self.fail_names.contains(current_name) {
                return Err(StorageError::new(StorageErrorKind::Api, "unknown node"));
            }
            Ok(())
        }

        async fn logout(&self) -> StorageResult<()> {
            self.calls.lock().unwrap().logout += 1;
            if self.logout_fails {
                return Err(StorageError::new(StorageErrorKind::Http, "HTTP 500"));
            }
            Ok(())
        }
    }
}
