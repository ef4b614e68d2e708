//! Per-user login conversation state.
//!
//! `/login` spans three message exchanges: the command itself, the email turn
//! and the password turn. The flow map holds the state between turns; a user
//! with no entry is idle. The pending email lives inside the
//! `AwaitingPassword` variant, so a password turn without an email cannot be
//! represented.

use std::collections::HashMap;

use tokio::sync::Mutex;

/// Stage of one user's login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LoginFlow {
    AwaitingEmail,
    AwaitingPassword { email: String },
}

/// Credentials collected by a completed flow.
///
/// Intentionally not `Debug`: the password must never end up in a log line.
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// What the engine decided for one free-text turn.
pub enum FlowStep {
    /// The user has no login flow in progress; the text is not for us.
    NotInFlow,
    /// Email stored; the password should be requested next.
    PasswordPrompt,
    /// Flow complete. The flow state is already cleared: whatever the
    /// authentication outcome, the user starts over with `/login`.
    Credentials(Credentials),
}

/// All in-flight login flows, keyed by Telegram user id.
pub struct LoginFlows {
    flows: Mutex<HashMap<i64, LoginFlow>>,
}

impl LoginFlows {
    pub fn new() -> Self {
        Self {
            flows: Mutex::new(HashMap::new()),
        }
    }

    /// Starts (or restarts) the login flow for a user. A flow already in
    /// progress is discarded along with any pending email.
    pub async fn begin(&self, user_id: i64) {
        self.flows
            .lock()
            .await
            .insert(user_id, LoginFlow::AwaitingEmail);
    }

    /// Discards the user's flow. Returns whether one was in progress.
    pub async fn cancel(&self, user_id: i64) -> bool {
        self.flows.lock().await.remove(&user_id).is_some()
    }

    /// Whether the user has a flow in progress.
    pub async fn in_flow(&self, user_id: i64) -> bool {
        self.flows.lock().await.contains_key(&user_id)
    }

    /// Feeds one free-text turn into the user's flow.
    ///
    /// The password turn removes the flow entry before returning, which
    /// bounds how long the collected secret is held: after this call the
    /// engine is idle no matter what the caller does with the credentials.
    pub async fn advance(&self, user_id: i64, text: &str) -> FlowStep {
        let mut flows = self.flows.lock().await;
        match flows.remove(&user_id) {
            None => FlowStep::NotInFlow,
            Some(LoginFlow::AwaitingEmail) => {
                flows.insert(
                    user_id,
                    LoginFlow::AwaitingPassword {
                        email: text.trim().to_string(),
                    },
                );
                FlowStep::PasswordPrompt
            }
            Some(LoginFlow::AwaitingPassword { email }) => FlowStep::Credentials(Credentials {
                email,
                password: text.trim().to_string(),
            }),
        }
    }
}

impl Default for LoginFlows {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn full_flow_collects_email_then_password() {
        let flows = LoginFlows::new();
        flows.begin(7).await;

        assert!(matches!(
            flows.advance(7, "user@example.com").await,
            FlowStep::PasswordPrompt
        ));

        match flows.advance(7, "hunter2").await {
            FlowStep::Credentials(creds) => {
                assert_eq!(creds.email, "user@example.com");
                assert_eq!(creds.password, "hunter2");
            }
            _ => panic!("expected credentials"),
        }

        // The flow is gone regardless of what the caller does next.
        assert!(!flows.in_flow(7).await);
        assert!(matches!(flows.advance(7, "again").await, FlowStep::NotInFlow));
    }

    #[tokio::test]
    async fn text_without_a_flow_is_not_consumed() {
        let flows = LoginFlows::new();
        assert!(matches!(
            flows.advance(7, "hello there").await,
            FlowStep::NotInFlow
        ));
    }

    #[tokio::test]
    async fn email_and_password_are_trimmed() {
        let flows = LoginFlows::new();
        flows.begin(7).await;
        flows.advance(7, "  user@example.com \n").await;

        match flows.advance(7, " hunter2 ").await {
            FlowStep::Credentials(creds) => {
                assert_eq!(creds.email, "user@example.com");
                assert_eq!(creds.password, "hunter2");
            }
            _ => panic!("expected credentials"),
        }
    }

    #[tokio::test]
    async fn restarting_login_discards_pending_email() {
        let flows = LoginFlows::new();
        flows.begin(7).await;
        flows.advance(7, "first@example.com").await;

        // A second /login while awaiting the password starts over.
        flows.begin(7).await;
        assert!(matches!(
            flows.advance(7, "second@example.com").await,
            FlowStep::PasswordPrompt
        ));
    }

    #[tokio::test]
    async fn cancel_reports_whether_a_flow_existed() {
        let flows = LoginFlows::new();
        assert!(!flows.cancel(7).await);

        flows.begin(7).await;
        assert!(flows.cancel(7).await);
        assert!(!flows.in_flow(7).await);
    }

    #[tokio::test]
    async fn flows_are_per_user() {
        let flows = LoginFlows::new();
        flows.begin(1).await;

        assert!(matches!(flows.advance(2, "text").await, FlowStep::NotInFlow));
        assert!(flows.in_flow(1).await);
    }
}
