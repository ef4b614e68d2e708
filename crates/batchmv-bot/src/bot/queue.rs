use std::collections::HashMap;
use std::sync::Arc;

use batchmv_core::storage::StorageConnector;
use tokio::sync::{Mutex, mpsc};

use crate::bot::context::BotContext;
use crate::handlers::message::handle_message;
use crate::telegram::Message;

/// Queue key: chat id. The bot only serves private chats, so this is also
/// the user id.
type QueueKey = i64;

pub type ChatQueueMap = Arc<Mutex<HashMap<QueueKey, mpsc::UnboundedSender<Message>>>>;

pub fn new_chat_queues() -> ChatQueueMap {
    Arc::new(Mutex::new(HashMap::new()))
}

/// Enqueues a message for its chat's worker.
///
/// Each chat gets one worker task, so a user's turns are handled strictly in
/// order while slow drive calls for one user never block another user's
/// commands — the polling loop only ever touches the queue map here.
pub async fn dispatch_message<C: StorageConnector>(
    queues: &ChatQueueMap,
    context: &Arc<BotContext<C>>,
    message: Message,
) {
    let key = message.chat.id;
    let sender = {
        let mut queues = queues.lock().await;
        if let Some(sender) = queues.get(&key) {
            sender.clone()
        } else {
            let (sender, receiver) = mpsc::unbounded_channel();
            spawn_queue_worker(key, receiver, Arc::clone(context));
            queues.insert(key, sender.clone());
            sender
        }
    };

    if let Err(err) = sender.send(message) {
        // The worker died; replace it and retry once.
        let message = err.0;
        let (sender, receiver) = mpsc::unbounded_channel();
        spawn_queue_worker(key, receiver, Arc::clone(context));
        {
            let mut queues = queues.lock().await;
            queues.insert(key, sender.clone());
        }
        let _ = sender.send(message);
    }
}

fn spawn_queue_worker<C: StorageConnector>(
    key: QueueKey,
    mut receiver: mpsc::UnboundedReceiver<Message>,
    context: Arc<BotContext<C>>,
) {
    tokio::spawn(async move {
        while let Some(message) = receiver.recv().await {
            if let Err(err) = handle_message(context.as_ref(), message).await {
                eprintln!("Message handling error for chat {key}: {err}");
            }
        }
    });
}
