pub mod atomic;
pub mod cascade;
pub mod config;
pub mod db;
pub mod error;
pub mod history;
pub mod messaging;
pub mod models;
pub mod notify;
pub mod query;
pub mod seed;
pub mod thread;
mod migrations;

pub use atomic::{atomic, Atomic};
pub use config::StoreConfig;
pub use db::{open_in_memory, open_store, MessageStore};
pub use error::CoreError;
pub use history::list_message_history;
pub use messaging::{create_message, delete_user_cascade, update_message_content};
pub use notify::mark_notification_read;
pub use thread::{flatten_forest, get_thread, get_thread_between};
