use rusqlite::Connection;

use crate::atomic::atomic;
use crate::error::CoreError;
use crate::messaging::{create_message_in, update_message_content_in};
use crate::models::User;
use crate::query::{create_user, get_user_by_email};

#[derive(Debug, Clone)]
pub struct DemoSeed {
    pub alice: User,
    pub bob: User,
    pub root_ids: Vec<i64>,
}

fn user_for(conn: &Connection, email: &str, first_name: &str, last_name: &str) -> Result<User, CoreError> {
    match get_user_by_email(conn, email)? {
        Some(user) => Ok(user),
        None => create_user(conn, email, first_name, last_name),
    }
}

/// Writes a small Alice/Bob conversation: one reply chain `reply_depth` deep,
/// a second root with an edited message, and a note Alice sends herself.
/// Users are reused when they already exist; messages are always appended.
pub fn seed_demo(conn: &Connection, reply_depth: usize) -> Result<DemoSeed, CoreError> {
    atomic(conn, |tx| {
        let alice = user_for(tx.conn(), "alice@example.com", "Alice", "Liddell")?;
        let bob = user_for(tx.conn(), "bob@example.com", "Bob", "Builder")?;

        let first = create_message_in(tx, &alice.id, &bob.id, "Are we still on for Friday?", None)?;
        let mut parent = first.id;
        for idx in 0..reply_depth {
            let (from, to, body) = if idx % 2 == 0 {
                (&bob.id, &alice.id, format!("Reply {}", idx + 1))
            } else {
                (&alice.id, &bob.id, format!("Reply {}", idx + 1))
            };
            parent = create_message_in(tx, from, to, &body, Some(parent))?.id;
        }

        let second = create_message_in(tx, &bob.id, &alice.id, "Pizza or tacos?", None)?;
        update_message_content_in(tx, second.id, "Pizza, tacos, or both?", Some(bob.id.as_str()))?;
        create_message_in(tx, &alice.id, &alice.id, "Remember to book the table", None)?;

        Ok(DemoSeed {
            root_ids: vec![first.id, second.id],
            alice,
            bob,
        })
    })
}
