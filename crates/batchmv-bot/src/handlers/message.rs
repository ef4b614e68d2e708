//! Routing of one incoming message: command dispatch, the login
//! conversation, and the rename run itself.

use anyhow::Result;
use batchmv_core::conversation::{Credentials, FlowStep};
use batchmv_core::rename::run_rename;
use batchmv_core::storage::{StorageConnector, StorageSession};

use crate::bot::context::BotContext;
use crate::commands::{self, BotCommand};
use crate::telegram::Message;

pub async fn handle_message<C: StorageConnector>(
    context: &BotContext<C>,
    message: Message,
) -> Result<()> {
    if !message.chat.is_private() {
        eprintln!("Ignoring non-DM chat {}", message.chat.id);
        return Ok(());
    }

    let chat_id = message.chat.id;
    let reply_to = Some(message.message_id);

    let Some(user) = message.from.as_ref() else {
        eprintln!("Ignoring message without sender in chat {chat_id}");
        return Ok(());
    };
    if user.is_bot {
        return Ok(());
    }
    if !context.allows(user.id) {
        eprintln!("Denied user {} for chat {}", user.id, chat_id);
        context
            .client()
            .send_message(chat_id, "Access denied.", reply_to)
            .await?;
        return Ok(());
    }

    let text = message.text.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        eprintln!("Ignoring empty message in chat {chat_id}");
        return Ok(());
    }

    if commands::is_command(text) {
        let Some(parsed) = commands::parse_command(text) else {
            context
                .client()
                .send_message(chat_id, "Unknown command. See /start for the list.", reply_to)
                .await?;
            return Ok(());
        };

        match parsed.command {
            BotCommand::Start => {
                context
                    .client()
                    .send_message(chat_id, &start_text(), reply_to)
                    .await?;
            }
            BotCommand::Login => {
                context.flows().begin(user.id).await;
                context
                    .client()
                    .send_message(chat_id, "Send your drive account email.", reply_to)
                    .await?;
            }
            BotCommand::Cancel => {
                let reply = if context.flows().cancel(user.id).await {
                    "Login cancelled."
                } else {
                    "No login in progress."
                };
                context.client().send_message(chat_id, reply, reply_to).await?;
            }
            BotCommand::Logout => {
                let reply = if context.sessions().remove(user.id).await {
                    "Logged out of your drive."
                } else {
                    "No active drive session."
                };
                context.client().send_message(chat_id, reply, reply_to).await?;
            }
            BotCommand::RenameAll => {
                return handle_rename(context, chat_id, reply_to, user.id, &parsed.args).await;
            }
        }
        return Ok(());
    }

    // Free text only means something inside a login flow. Credential turns
    // are never logged.
    match context.flows().advance(user.id, text).await {
        FlowStep::NotInFlow => {
            eprintln!("Ignoring free text from user {} in chat {}", user.id, chat_id);
        }
        FlowStep::PasswordPrompt => {
            context
                .client()
                .send_message(chat_id, "Now send your password.", reply_to)
                .await?;
        }
        FlowStep::Credentials(credentials) => {
            return handle_login_attempt(context, chat_id, reply_to, user.id, credentials).await;
        }
    }

    Ok(())
}

async fn handle_login_attempt<C: StorageConnector>(
    context: &BotContext<C>,
    chat_id: i64,
    reply_to: Option<i64>,
    user_id: i64,
    credentials: Credentials,
) -> Result<()> {
    context
        .client()
        .send_message(chat_id, "Logging in to your drive…", reply_to)
        .await?;
    eprintln!("Attempting drive login for user {user_id}");

    match context
        .connector()
        .authenticate(&credentials.email, &credentials.password)
        .await
    {
        Ok(session) => {
            context.sessions().insert(user_id, session).await;
            eprintln!("Drive login succeeded for user {user_id}");
            context
                .client()
                .send_message(
                    chat_id,
                    "Logged in. Use /rename_all <base> to rename everything.",
                    reply_to,
                )
                .await?;
        }
        Err(err) => {
            eprintln!("Drive login failed for user {user_id}: {err}");
            context
                .client()
                .send_message(
                    chat_id,
                    &format!("Login failed: {err}. Use /login to try again."),
                    reply_to,
                )
                .await?;
        }
    }

    Ok(())
}

async fn handle_rename<C: StorageConnector>(
    context: &BotContext<C>,
    chat_id: i64,
    reply_to: Option<i64>,
    user_id: i64,
    args: &[String],
) -> Result<()> {
    let Some(base_name) = args.first() else {
        context
            .client()
            .send_message(
                chat_id,
                "Usage: /rename_all <base>\nExample: /rename_all holiday",
                reply_to,
            )
            .await?;
        return Ok(());
    };

    // Taking the session out of the registry makes this run its sole owner:
    // whatever happens below, the user ends up logged out.
    let Some(session) = context.sessions().take(user_id).await else {
        context
            .client()
            .send_message(chat_id, "You must /login first.", reply_to)
            .await?;
        return Ok(());
    };

    context
        .client()
        .send_message(
            chat_id,
            &format!(
                "Renaming everything to {base_name}_1, {base_name}_2, … \
                 You will be logged out when it finishes."
            ),
            reply_to,
        )
        .await?;

    let report = run_rename(&session, base_name).await;
    if let Err(err) = session.logout().await {
        eprintln!("Drive logout after rename for user {user_id} failed: {err}");
    }
    eprintln!(
        "Rename run for user {}: renamed {}, failed {}",
        user_id, report.renamed, report.failed
    );

    context
        .client()
        .send_message(
            chat_id,
            &format!("{report}\n\nLogged out of your drive."),
            reply_to,
        )
        .await?;

    Ok(())
}

fn start_text() -> String {
    format!(
        "Welcome to the drive rename bot.\n\n{}\n\n\
         Credentials are only held in memory for the login call, and every \
         rename run ends with an automatic logout.",
        commands::command_summary()
    )
}
