use rusqlite::{params, Connection, ErrorCode};
use tracing::debug;

use crate::atomic::Atomic;
use crate::error::CoreError;
use crate::models::{Message, MessageHistory};
use crate::query::{get_message, now_millis};

/// Applies a content edit to `stored` inside `tx` and queues its history row.
///
/// Returns `None` when the content is unchanged. Otherwise the message row is
/// updated in place (`edited`, `edited_at`, `edit_count + 1`) and a history row
/// carrying the previous content is written once `tx` commits.
///
/// The version is the message's `edit_count` right after the update, read while
/// `tx` still holds the write lock. Version `k` therefore always carries the
/// content replaced by the `k`-th edit, however the post-commit flushes of
/// concurrent editors interleave.
pub fn record_edit(
    tx: &mut Atomic<'_>,
    stored: &Message,
    new_content: &str,
    editor: Option<&str>,
) -> Result<Option<Message>, CoreError> {
    if stored.content == new_content {
        return Ok(None);
    }

    let edited_at = now_millis();
    tx.conn().execute(
        "UPDATE messages \
         SET content = ?1, edited = 1, edited_at = ?2, edit_count = edit_count + 1 \
         WHERE id = ?3;",
        params![new_content, edited_at, stored.id],
    )?;

    let updated = get_message(tx.conn(), stored.id)?;
    let message_id = updated.id;
    let version = updated.edit_count;
    let old_content = stored.content.clone();
    let edited_by = editor.map(str::to_string);
    tx.on_commit(move |conn| {
        write_history(conn, message_id, &old_content, version, edited_by.as_deref(), edited_at)
            .map(|_| ())
    });
    debug!(message_id, version, "queued edit history");

    Ok(Some(updated))
}

/// Stores `version` of `message_id`. Runs inside the post-commit flush.
///
/// An editor that no longer exists is stored as unattributed. A message that
/// was deleted before the flush gets no history at all.
pub(crate) fn write_history(
    conn: &Connection,
    message_id: i64,
    old_content: &str,
    version: i64,
    edited_by: Option<&str>,
    edited_at: i64,
) -> Result<Option<MessageHistory>, CoreError> {
    let inserted = conn.execute(
        "INSERT INTO message_history (message_id, old_content, version, edited_by, edited_at) \
         SELECT m.id, ?2, ?3, (SELECT u.id FROM users u WHERE u.id = ?4), ?5 \
         FROM messages m WHERE m.id = ?1;",
        params![message_id, old_content, version, edited_by, edited_at],
    );
    let rows = match inserted {
        Ok(rows) => rows,
        Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
            return Err(CoreError::Consistency(format!(
                "version {} already recorded for message {}",
                version, message_id
            )));
        }
        Err(err) => return Err(err.into()),
    };
    if rows == 0 {
        debug!(message_id, "message gone before history flush, skipping");
        return Ok(None);
    }

    let id = conn.last_insert_rowid();
    let edited_by: Option<String> = conn.query_row(
        "SELECT edited_by FROM message_history WHERE id = ?1;",
        params![id],
        |row| row.get(0),
    )?;
    debug!(message_id, version, "recorded edit history");
    Ok(Some(MessageHistory {
        id,
        message_id,
        old_content: old_content.to_string(),
        version,
        edited_by,
        edited_at,
    }))
}

/// History of one message, oldest version first.
pub fn list_message_history(
    conn: &Connection,
    message_id: i64,
) -> Result<Vec<MessageHistory>, CoreError> {
    get_message(conn, message_id)?;
    let mut stmt = conn.prepare(
        "SELECT id, message_id, old_content, version, edited_by, edited_at \
         FROM message_history \
         WHERE message_id = ?1 \
         ORDER BY version ASC;",
    )?;
    let rows = stmt.query_map(params![message_id], |row| {
        Ok(MessageHistory {
            id: row.get(0)?,
            message_id: row.get(1)?,
            old_content: row.get(2)?,
            version: row.get(3)?,
            edited_by: row.get(4)?,
            edited_at: row.get(5)?,
        })
    })?;
    Ok(rows.filter_map(Result::ok).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::query::{create_user, insert_message};

    fn seeded() -> (Connection, Message) {
        let conn = open_in_memory().expect("open");
        let alice = create_user(&conn, "alice@example.com", "Alice", "").expect("alice");
        let bob = create_user(&conn, "bob@example.com", "Bob", "").expect("bob");
        let message = insert_message(&conn, &alice.id, &bob.id, "hello", None, 1).expect("insert");
        (conn, message)
    }

    #[test]
    fn rows_keep_the_version_they_were_queued_with() {
        let (conn, message) = seeded();
        let second = write_history(&conn, message.id, "v1", 2, None, 11)
            .expect("second")
            .expect("row");
        let first = write_history(&conn, message.id, "v0", 1, Some(message.sender_id.as_str()), 10)
            .expect("first")
            .expect("row");

        assert_eq!(first.version, 1);
        assert_eq!(first.edited_by.as_deref(), Some(message.sender_id.as_str()));
        assert_eq!(second.version, 2);
        assert_eq!(second.edited_by, None);
        let olds: Vec<String> = list_message_history(&conn, message.id)
            .expect("history")
            .into_iter()
            .map(|h| h.old_content)
            .collect();
        assert_eq!(olds, vec!["v0", "v1"]);
    }

    #[test]
    fn duplicate_version_is_a_consistency_error() {
        let (conn, message) = seeded();
        write_history(&conn, message.id, "v0", 1, None, 10).expect("first");
        let err = write_history(&conn, message.id, "again", 1, None, 11).expect_err("duplicate");
        assert!(matches!(err, CoreError::Consistency(_)));
    }

    #[test]
    fn queued_version_is_the_edit_ordinal() {
        let (conn, message) = seeded();
        let mut tx = Atomic::begin(&conn).expect("begin");
        let updated = record_edit(&mut tx, &message, "hello again", None)
            .expect("record")
            .expect("edited");
        tx.commit().expect("commit");

        assert_eq!(updated.edit_count, 1);
        let history = list_message_history(&conn, message.id).expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].version, 1);
        assert_eq!(history[0].old_content, "hello");
    }

    #[test]
    fn unknown_editor_is_stored_unattributed() {
        let (conn, message) = seeded();
        let row = write_history(&conn, message.id, "v0", 1, Some("departed-user"), 10)
            .expect("write")
            .expect("row");
        assert_eq!(row.edited_by, None);
    }

    #[test]
    fn deleted_message_gets_no_history() {
        let (conn, message) = seeded();
        conn.execute("DELETE FROM messages WHERE id = ?1;", params![message.id])
            .expect("delete");
        let row = write_history(&conn, message.id, "v0", 1, None, 10).expect("write");
        assert!(row.is_none());
    }

    #[test]
    fn unchanged_content_is_not_an_edit() {
        let (conn, message) = seeded();
        let mut tx = Atomic::begin(&conn).expect("begin");
        let outcome = record_edit(&mut tx, &message, "hello", None).expect("record");
        assert!(outcome.is_none());
        assert_eq!(tx.pending(), 0);
        tx.commit().expect("commit");
    }

    #[test]
    fn history_listing_requires_message() {
        let (conn, _) = seeded();
        let err = list_message_history(&conn, 9_999).expect_err("missing");
        assert!(err.is_not_found());
    }
}
