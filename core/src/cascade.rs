use rusqlite::params;
use tracing::info;

use crate::atomic::Atomic;
use crate::error::CoreError;
use crate::models::CleanupStats;

/// Removes the user and sweeps every row that still points at them.
///
/// The sweep and the identity delete share `tx`. The sweep also catches rows a
/// connection without `PRAGMA foreign_keys` left behind after an earlier raw
/// delete. Running it for an id that is already gone is a no-op.
pub fn delete_user_cascade_in(tx: &mut Atomic<'_>, user_id: &str) -> Result<CleanupStats, CoreError> {
    let conn = tx.conn();

    // Sweep before the identity delete, while `edited_by` still names the user.
    let histories = conn.execute(
        "DELETE FROM message_history \
         WHERE edited_by = ?1 \
            OR message_id IN (SELECT id FROM messages WHERE sender_id = ?1 OR receiver_id = ?1);",
        params![user_id],
    )?;
    let notifications = conn.execute(
        "DELETE FROM notifications \
         WHERE user_id = ?1 \
            OR message_id IN (SELECT id FROM messages WHERE sender_id = ?1 OR receiver_id = ?1);",
        params![user_id],
    )?;
    conn.execute(
        "UPDATE notifications SET actor_id = NULL WHERE actor_id = ?1;",
        params![user_id],
    )?;
    conn.execute(
        "UPDATE messages SET parent_message_id = NULL \
         WHERE parent_message_id IN (SELECT id FROM messages WHERE sender_id = ?1 OR receiver_id = ?1);",
        params![user_id],
    )?;
    let messages = conn.execute(
        "DELETE FROM messages WHERE sender_id = ?1 OR receiver_id = ?1;",
        params![user_id],
    )?;
    let users = conn.execute("DELETE FROM users WHERE id = ?1;", params![user_id])?;

    let stats = CleanupStats {
        users,
        messages,
        notifications,
        histories,
    };
    if stats != CleanupStats::default() {
        info!(
            user_id,
            users = stats.users,
            messages = stats.messages,
            notifications = stats.notifications,
            histories = stats.histories,
            "user cascade cleanup"
        );
    }
    Ok(stats)
}
