use serde::{Deserialize, Serialize};

pub const DEFAULT_NOTIFICATION_VERB: &str = "sent you a message";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: i64,
}

impl User {
    pub fn display_name(&self) -> String {
        display_name(&self.first_name, &self.last_name, &self.email)
    }
}

pub(crate) fn display_name(first_name: &str, last_name: &str, email: &str) -> String {
    let full = format!("{} {}", first_name.trim(), last_name.trim());
    let full = full.trim();
    if full.is_empty() {
        email.to_string()
    } else {
        full.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub timestamp: i64,
    pub parent_message_id: Option<i64>,
    pub edited: bool,
    pub edited_at: Option<i64>,
    pub edit_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHistory {
    pub id: i64,
    pub message_id: i64,
    pub old_content: String,
    pub version: i64,
    pub edited_by: Option<String>,
    pub edited_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: String,
    pub message_id: i64,
    pub actor_id: Option<String>,
    pub verb: String,
    pub is_read: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    pub display_name: String,
}

/// One message in a reply tree, with every reply nested beneath it.
///
/// The derived `Serialize` recurses once per reply level. Serialize deep trees
/// through [`crate::thread::flatten_forest`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadNode {
    pub id: i64,
    pub sender: UserRef,
    pub receiver: UserRef,
    pub content: String,
    pub timestamp: i64,
    pub parent_id: Option<i64>,
    pub edited: bool,
    pub edit_count: i64,
    pub replies: Vec<ThreadNode>,
}

impl ThreadNode {
    /// Number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }
}

// Deep reply chains would otherwise unwind through one drop frame per level.
impl Drop for ThreadNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

/// One row of a flattened reply tree. `depth` is 0 for roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadEntry {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub depth: usize,
    pub sender: UserRef,
    pub receiver: UserRef,
    pub content: String,
    pub timestamp: i64,
    pub edited: bool,
    pub edit_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupStats {
    pub users: usize,
    pub messages: usize,
    pub notifications: usize,
    pub histories: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub users: i64,
    pub messages: i64,
    pub histories: i64,
    pub notifications: i64,
    pub unread_notifications: i64,
}
