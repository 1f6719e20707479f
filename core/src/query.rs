use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{Message, StoreStats, User};

pub(crate) const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, timestamp, \
     parent_message_id, edited, edited_at, edit_count";

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

// ===== Users =====

/// Trims the address and lower-cases the domain part; the local part is kept as typed.
pub fn normalize_email(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("users must have an email address".to_string()));
    }
    match trimmed.rsplit_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            Ok(format!("{}@{}", local, domain.to_lowercase()))
        }
        _ => Err(CoreError::Validation(format!("invalid email address: {}", trimmed))),
    }
}

pub fn create_user(
    conn: &Connection,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> Result<User, CoreError> {
    let email = normalize_email(email)?;
    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        first_name: first_name.trim().to_string(),
        last_name: last_name.trim().to_string(),
        created_at: now_millis(),
    };
    let inserted = conn.execute(
        "INSERT INTO users (id, email, first_name, last_name, created_at) VALUES (?1, ?2, ?3, ?4, ?5);",
        params![&user.id, &user.email, &user.first_name, &user.last_name, user.created_at],
    );
    match inserted {
        Ok(_) => Ok(user),
        Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
            Err(CoreError::Validation(format!("email already registered: {}", user.email)))
        }
        Err(err) => Err(err.into()),
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn find_user(conn: &Connection, user_id: &str) -> Result<Option<User>, CoreError> {
    let user = conn
        .query_row(
            "SELECT id, email, first_name, last_name, created_at FROM users WHERE id = ?1;",
            params![user_id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn get_user(conn: &Connection, user_id: &str) -> Result<User, CoreError> {
    find_user(conn, user_id)?.ok_or_else(|| CoreError::NotFound(format!("user {}", user_id)))
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, CoreError> {
    let email = normalize_email(email)?;
    let user = conn
        .query_row(
            "SELECT id, email, first_name, last_name, created_at FROM users WHERE email = ?1;",
            params![email],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn user_exists(conn: &Connection, user_id: &str) -> Result<bool, CoreError> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM users WHERE id = ?1 LIMIT 1;",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(exists.is_some())
}

// ===== Messages =====

pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        content: row.get(3)?,
        timestamp: row.get(4)?,
        parent_message_id: row.get(5)?,
        edited: row.get::<_, i64>(6)? != 0,
        edited_at: row.get(7)?,
        edit_count: row.get(8)?,
    })
}

pub fn find_message(conn: &Connection, message_id: i64) -> Result<Option<Message>, CoreError> {
    let sql = format!("SELECT {} FROM messages WHERE id = ?1;", MESSAGE_COLUMNS);
    let message = conn
        .query_row(&sql, params![message_id], message_from_row)
        .optional()?;
    Ok(message)
}

pub fn get_message(conn: &Connection, message_id: i64) -> Result<Message, CoreError> {
    find_message(conn, message_id)?
        .ok_or_else(|| CoreError::NotFound(format!("message {}", message_id)))
}

/// Raw row insert; validation and side effects live in `messaging`.
pub(crate) fn insert_message(
    conn: &Connection,
    sender_id: &str,
    receiver_id: &str,
    content: &str,
    parent_message_id: Option<i64>,
    timestamp: i64,
) -> Result<Message, CoreError> {
    conn.execute(
        "INSERT INTO messages (sender_id, receiver_id, content, timestamp, parent_message_id) \
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![sender_id, receiver_id, content, timestamp, parent_message_id],
    )?;
    Ok(Message {
        id: conn.last_insert_rowid(),
        sender_id: sender_id.to_string(),
        receiver_id: receiver_id.to_string(),
        content: content.to_string(),
        timestamp,
        parent_message_id,
        edited: false,
        edited_at: None,
        edit_count: 0,
    })
}

pub fn list_messages_between(
    conn: &Connection,
    user_a: &str,
    user_b: &str,
) -> Result<Vec<Message>, CoreError> {
    let sql = format!(
        "SELECT {} FROM messages \
         WHERE (sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1) \
         ORDER BY timestamp ASC, id ASC;",
        MESSAGE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user_a, user_b], message_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn store_stats(conn: &Connection) -> Result<StoreStats, CoreError> {
    let users: i64 = conn.query_row("SELECT COUNT(1) FROM users;", [], |row| row.get(0))?;
    let messages: i64 = conn.query_row("SELECT COUNT(1) FROM messages;", [], |row| row.get(0))?;
    let histories: i64 =
        conn.query_row("SELECT COUNT(1) FROM message_history;", [], |row| row.get(0))?;
    let notifications: i64 =
        conn.query_row("SELECT COUNT(1) FROM notifications;", [], |row| row.get(0))?;
    let unread_notifications: i64 = conn.query_row(
        "SELECT COUNT(1) FROM notifications WHERE is_read = 0;",
        [],
        |row| row.get(0),
    )?;
    Ok(StoreStats {
        users,
        messages,
        histories,
        notifications,
        unread_notifications,
    })
}
