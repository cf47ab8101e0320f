pub mod chat;
pub mod health;
pub mod summarize;

pub use chat::chat_handler;
pub use health::health_handler;
pub use summarize::summarize_handler;
