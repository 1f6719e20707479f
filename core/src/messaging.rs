//! Write paths for messages and users.
//!
//! Each operation comes in two forms: `foo_in` works inside a caller-owned
//! [`Atomic`] so several writes can share one commit, and `foo` opens and
//! commits its own transaction. History and notifications are wired in by
//! direct calls; nothing is dispatched through a registry.

use rusqlite::Connection;
use tracing::debug;

use crate::atomic::{atomic, Atomic};
use crate::cascade::delete_user_cascade_in;
use crate::error::CoreError;
use crate::history::record_edit;
use crate::models::{CleanupStats, Message};
use crate::notify::dispatch_new_message;
use crate::query::{find_message, get_message, insert_message, now_millis, user_exists};

fn validate_content(content: &str) -> Result<(), CoreError> {
    if content.trim().is_empty() {
        return Err(CoreError::Validation("message content cannot be empty".to_string()));
    }
    Ok(())
}

pub fn create_message_in(
    tx: &mut Atomic<'_>,
    sender_id: &str,
    receiver_id: &str,
    content: &str,
    parent_message_id: Option<i64>,
) -> Result<Message, CoreError> {
    validate_content(content)?;
    let conn = tx.conn();
    for user_id in [sender_id, receiver_id] {
        if !user_exists(conn, user_id)? {
            return Err(CoreError::NotFound(format!("user {}", user_id)));
        }
    }
    if let Some(parent_id) = parent_message_id {
        if find_message(conn, parent_id)?.is_none() {
            return Err(CoreError::NotFound(format!("parent message {}", parent_id)));
        }
    }

    let message = insert_message(conn, sender_id, receiver_id, content, parent_message_id, now_millis())?;
    let notified = dispatch_new_message(tx, &message);
    debug!(message_id = message.id, notified, "message created");
    Ok(message)
}

pub fn create_message(
    conn: &Connection,
    sender_id: &str,
    receiver_id: &str,
    content: &str,
    parent_message_id: Option<i64>,
) -> Result<Message, CoreError> {
    atomic(conn, |tx| create_message_in(tx, sender_id, receiver_id, content, parent_message_id))
}

/// Replaces the content of `message_id`.
///
/// `editor`, when given, must be the original sender and is recorded on the
/// history row; `None` records an unattributed edit. Unchanged content returns
/// the stored message without touching history.
pub fn update_message_content_in(
    tx: &mut Atomic<'_>,
    message_id: i64,
    new_content: &str,
    editor: Option<&str>,
) -> Result<Message, CoreError> {
    let stored = get_message(tx.conn(), message_id)?;
    if let Some(editor_id) = editor {
        if editor_id != stored.sender_id {
            return Err(CoreError::PermissionDenied(format!(
                "only the sender may edit message {}",
                message_id
            )));
        }
    }
    validate_content(new_content)?;

    match record_edit(tx, &stored, new_content, editor)? {
        Some(updated) => Ok(updated),
        None => Ok(stored),
    }
}

pub fn update_message_content(
    conn: &Connection,
    message_id: i64,
    new_content: &str,
    editor: Option<&str>,
) -> Result<Message, CoreError> {
    atomic(conn, |tx| update_message_content_in(tx, message_id, new_content, editor))
}

pub fn delete_user_cascade(conn: &Connection, user_id: &str) -> Result<CleanupStats, CoreError> {
    atomic(conn, |tx| delete_user_cascade_in(tx, user_id))
}
