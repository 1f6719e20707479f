use message_trail_core::db::apply_migrations;
use rusqlite::Connection;

fn index_count(conn: &Connection, name: &str) -> i64 {
    conn.query_row(
        "SELECT COUNT(1) FROM sqlite_master WHERE type='index' AND name=?1;",
        [name],
        |row| row.get(0),
    )
    .expect("index query")
}

#[test]
fn history_version_unique_index_exists() {
    let conn = Connection::open_in_memory().expect("memory db");
    apply_migrations(&conn).expect("migrate");
    assert_eq!(index_count(&conn, "idx_message_history_version"), 1);
}

#[test]
fn history_version_index_rejects_duplicates() {
    let conn = Connection::open_in_memory().expect("memory db");
    apply_migrations(&conn).expect("migrate");
    conn.execute_batch(
        "INSERT INTO users (id, email, created_at) VALUES ('u1', 'u1@example.com', 0); \
         INSERT INTO messages (sender_id, receiver_id, content, timestamp) VALUES ('u1', 'u1', 'x', 0); \
         INSERT INTO message_history (message_id, old_content, version, edited_at) VALUES (1, 'a', 1, 0);",
    )
    .expect("seed");
    let duplicate = conn.execute(
        "INSERT INTO message_history (message_id, old_content, version, edited_at) VALUES (1, 'b', 1, 0);",
        [],
    );
    assert!(duplicate.is_err(), "duplicate version must be rejected");
}

#[test]
fn notification_and_pair_indexes_exist() {
    let conn = Connection::open_in_memory().expect("memory db");
    apply_migrations(&conn).expect("migrate");
    assert_eq!(index_count(&conn, "idx_notifications_user_unread"), 1);
    assert_eq!(index_count(&conn, "idx_messages_pair_ts"), 1);
    assert_eq!(index_count(&conn, "idx_messages_parent"), 1);
}

#[test]
fn edit_count_cannot_go_negative() {
    let conn = Connection::open_in_memory().expect("memory db");
    apply_migrations(&conn).expect("migrate");
    conn.execute_batch(
        "INSERT INTO users (id, email, created_at) VALUES ('u1', 'u1@example.com', 0); \
         INSERT INTO messages (sender_id, receiver_id, content, timestamp) VALUES ('u1', 'u1', 'x', 0);",
    )
    .expect("seed");
    let result = conn.execute("UPDATE messages SET edit_count = -1 WHERE id = 1;", []);
    assert!(result.is_err());
}
