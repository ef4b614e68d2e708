use std::collections::HashSet;

use batchmv_core::conversation::LoginFlows;
use batchmv_core::session::SessionRegistry;
use batchmv_core::storage::StorageConnector;

use crate::telegram::TelegramClient;

/// Everything a message handler needs, shared across all chat workers.
///
/// The session registry and login flows are owned here and injected into
/// handlers, so per-user state never lives in process-wide globals.
pub struct BotContext<C: StorageConnector> {
    client: TelegramClient,
    connector: C,
    sessions: SessionRegistry<C::Session>,
    flows: LoginFlows,
    allowlist_user_ids: HashSet<i64>,
}

impl<C: StorageConnector> BotContext<C> {
    pub fn new(client: TelegramClient, connector: C, allowlist_user_ids: HashSet<i64>) -> Self {
        Self {
            client,
            connector,
            sessions: SessionRegistry::new(),
            flows: LoginFlows::new(),
            allowlist_user_ids,
        }
    }

    pub fn client(&self) -> &TelegramClient {
        &self.client
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn sessions(&self) -> &SessionRegistry<C::Session> {
        &self.sessions
    }

    pub fn flows(&self) -> &LoginFlows {
        &self.flows
    }

    /// Whether the user may talk to the bot. An empty allowlist accepts
    /// everyone.
    pub fn allows(&self, user_id: i64) -> bool {
        self.allowlist_user_ids.is_empty() || self.allowlist_user_ids.contains(&user_id)
    }
}
