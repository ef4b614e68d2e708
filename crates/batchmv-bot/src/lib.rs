use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use batchmv_core::config::{Config, paths};
use batchmv_core::storage::{GatewayClient, StorageConnector};

use crate::bot::{BotContext, dispatch_message, new_chat_queues};
use crate::telegram::{TelegramClient, TelegramSettings};

pub mod bot;
pub mod commands;
pub mod handlers;
pub mod telegram;

pub async fn run() -> Result<()> {
    let config = Config::load().context("Failed to load batchmv config")?;
    let settings = TelegramSettings::from_config(&config)?;
    let connector = GatewayClient::from_config(&config)?;

    let config_path = paths::config_path();
    if config_path.exists() {
        eprintln!("Config file: {}", config_path.display());
    }
    if settings.allowlist_user_ids.is_empty() {
        eprintln!("Warning: telegram.allowlist_user_ids is empty, accepting every user");
    } else {
        eprintln!("Allowlist: {} user(s)", settings.allowlist_user_ids.len());
    }

    run_bot(settings, connector).await
}

async fn run_bot<C: StorageConnector>(settings: TelegramSettings, connector: C) -> Result<()> {
    let client = TelegramClient::new(settings.bot_token);
    let context = Arc::new(BotContext::new(
        client,
        connector,
        settings.allowlist_user_ids,
    ));
    let chat_queues = new_chat_queues();

    let mut offset: Option<i64> = None;
    let poll_timeout = Duration::from_secs(30);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    eprintln!("batchmv-bot started. Polling for updates...");

    loop {
        let current_offset = offset;
        tokio::select! {
            _ = &mut shutdown => {
                eprintln!("Shutting down.");
                break;
            }
            updates = context.client().get_updates(current_offset, poll_timeout) => {
                let updates = match updates {
                    Ok(updates) => updates,
                    Err(err) => {
                        eprintln!("Telegram polling error: {err}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                };

                for update in updates {
                    offset = Some(update.update_id + 1);
                    if let Some(message) = update.message {
                        dispatch_message(&chat_queues, &context, message).await;
                    }
                }
            }
        }
    }

    Ok(())
}
