pub mod context;
pub mod queue;

pub use context::BotContext;
pub use queue::{dispatch_message, new_chat_queues};
