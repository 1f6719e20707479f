use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::atomic::Atomic;
use crate::error::CoreError;
use crate::models::{Message, Notification, DEFAULT_NOTIFICATION_VERB};
use crate::query::now_millis;

const NOTIFICATION_COLUMNS: &str = "id, user_id, message_id, actor_id, verb, is_read, created_at";

/// Queues the receiver's notification for a freshly created message.
///
/// Returns `false` when nothing was queued because the sender wrote to themselves.
pub fn dispatch_new_message(tx: &mut Atomic<'_>, message: &Message) -> bool {
    if message.sender_id == message.receiver_id {
        return false;
    }
    let message_id = message.id;
    let user_id = message.receiver_id.clone();
    let actor_id = message.sender_id.clone();
    tx.on_commit(move |conn| {
        let created_at = now_millis();
        // Skips messages or recipients deleted between commit and flush.
        let inserted = conn.execute(
            "INSERT INTO notifications (user_id, message_id, actor_id, verb, is_read, created_at) \
             SELECT u.id, m.id, (SELECT a.id FROM users a WHERE a.id = ?3), ?4, 0, ?5 \
             FROM messages m JOIN users u ON u.id = ?1 \
             WHERE m.id = ?2;",
            params![user_id, message_id, actor_id, DEFAULT_NOTIFICATION_VERB, created_at],
        )?;
        if inserted == 0 {
            debug!(message_id, "message or recipient gone before notification flush");
        } else {
            debug!(message_id, user_id = %user_id, "notification created");
        }
        Ok(())
    });
    true
}

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        message_id: row.get(2)?,
        actor_id: row.get(3)?,
        verb: row.get(4)?,
        is_read: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
    })
}

pub fn get_notification(conn: &Connection, notification_id: i64) -> Result<Notification, CoreError> {
    let sql = format!("SELECT {} FROM notifications WHERE id = ?1;", NOTIFICATION_COLUMNS);
    conn.query_row(&sql, params![notification_id], notification_from_row)
        .optional()?
        .ok_or_else(|| CoreError::NotFound(format!("notification {}", notification_id)))
}

/// Flips `is_read` to true. Already-read notifications are left untouched.
pub fn mark_notification_read(
    conn: &Connection,
    notification_id: i64,
) -> Result<Notification, CoreError> {
    let changed = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND is_read = 0;",
        params![notification_id],
    )?;
    let notification = get_notification(conn, notification_id)?;
    if changed > 0 {
        debug!(notification_id, "notification marked read");
    }
    Ok(notification)
}

pub fn mark_all_notifications_read(conn: &Connection, user_id: &str) -> Result<usize, CoreError> {
    let changed = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0;",
        params![user_id],
    )?;
    Ok(changed)
}

/// Newest first.
pub fn list_notifications(
    conn: &Connection,
    user_id: &str,
    unread_only: bool,
) -> Result<Vec<Notification>, CoreError> {
    let sql = format!(
        "SELECT {} FROM notifications \
         WHERE user_id = ?1 AND (?2 = 0 OR is_read = 0) \
         ORDER BY created_at DESC, id DESC;",
        NOTIFICATION_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user_id, unread_only], notification_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn unread_notification_count(conn: &Connection, user_id: &str) -> Result<i64, CoreError> {
    let count = conn.query_row(
        "SELECT COUNT(1) FROM notifications WHERE user_id = ?1 AND is_read = 0;",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}
