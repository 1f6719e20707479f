//! Reply-tree reconstruction.
//!
//! Rows come out of SQLite flat and ordered by `(timestamp, id)`. [`build_forest`]
//! indexes children by parent, walks the trees with an explicit stack to get a
//! pre-order, then assembles nodes in reverse pre-order so every reply is
//! complete before it is moved under its parent. Nothing here recurses, so reply
//! depth is bounded only by memory.

use std::collections::HashMap;

use rusqlite::{params, Connection, Row};
use tracing::warn;

use crate::error::CoreError;
use crate::models::{display_name, ThreadEntry, ThreadNode, UserRef};
use crate::query::user_exists;

const NODE_SELECT: &str = "SELECT m.id, m.sender_id, s.first_name, s.last_name, s.email, \
            m.receiver_id, r.first_name, r.last_name, r.email, \
            m.content, m.timestamp, m.parent_message_id, m.edited, m.edit_count \
     FROM messages m \
     LEFT JOIN users s ON s.id = m.sender_id \
     LEFT JOIN users r ON r.id = m.receiver_id";

fn user_ref(row: &Row<'_>, base: usize) -> rusqlite::Result<UserRef> {
    let id: String = row.get(base)?;
    let first: Option<String> = row.get(base + 1)?;
    let last: Option<String> = row.get(base + 2)?;
    let email: Option<String> = row.get(base + 3)?;
    let display_name = match email {
        Some(email) => display_name(
            first.as_deref().unwrap_or_default(),
            last.as_deref().unwrap_or_default(),
            &email,
        ),
        None => id.clone(),
    };
    Ok(UserRef { id, display_name })
}

fn node_from_row(row: &Row<'_>) -> rusqlite::Result<ThreadNode> {
    Ok(ThreadNode {
        id: row.get(0)?,
        sender: user_ref(row, 1)?,
        receiver: user_ref(row, 5)?,
        content: row.get(9)?,
        timestamp: row.get(10)?,
        parent_id: row.get(11)?,
        edited: row.get::<_, i64>(12)? != 0,
        edit_count: row.get(13)?,
        replies: Vec::new(),
    })
}

/// The message `root_message_id` with all of its direct and transitive replies.
///
/// The requested message is the root of the result even when it is itself a
/// reply. Returns `None` when it does not exist.
pub fn get_thread(conn: &Connection, root_message_id: i64) -> Result<Option<ThreadNode>, CoreError> {
    let sql = format!(
        "WITH RECURSIVE subtree(id) AS ( \
           SELECT id FROM messages WHERE id = ?1 \
           UNION \
           SELECT c.id FROM messages c JOIN subtree st ON c.parent_message_id = st.id \
         ) \
         {} \
         JOIN subtree st ON st.id = m.id \
         ORDER BY m.timestamp ASC, m.id ASC;",
        NODE_SELECT
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![root_message_id], node_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    if rows.is_empty() {
        return Ok(None);
    }

    let mut forest = build_forest(rows);
    let position = forest.iter().position(|node| node.id == root_message_id);
    Ok(position.map(|idx| forest.swap_remove(idx)))
}

/// Every conversation tree exchanged between `user_a` and `user_b`, in either
/// direction, oldest root first.
pub fn get_thread_between(
    conn: &Connection,
    user_a: &str,
    user_b: &str,
) -> Result<Vec<ThreadNode>, CoreError> {
    for user_id in [user_a, user_b] {
        if !user_exists(conn, user_id)? {
            return Err(CoreError::NotFound(format!("user {}", user_id)));
        }
    }
    let sql = format!(
        "{} \
         WHERE (m.sender_id = ?1 AND m.receiver_id = ?2) \
            OR (m.sender_id = ?2 AND m.receiver_id = ?1) \
         ORDER BY m.timestamp ASC, m.id ASC;",
        NODE_SELECT
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user_a, user_b], node_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(build_forest(rows))
}

/// Nests flat, chronologically ordered rows into reply trees.
///
/// Roots are rows without a parent, plus rows whose parent is not among
/// `rows` (a reply to a message outside the fetched set). Siblings keep the
/// input order.
pub fn build_forest(rows: Vec<ThreadNode>) -> Vec<ThreadNode> {
    let n = rows.len();
    let index: HashMap<i64, usize> = rows.iter().enumerate().map(|(idx, node)| (node.id, idx)).collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut roots: Vec<usize> = Vec::new();
    for (idx, node) in rows.iter().enumerate() {
        match node.parent_id.and_then(|parent| index.get(&parent)) {
            Some(&parent_idx) if parent_idx != idx => children[parent_idx].push(idx),
            _ => roots.push(idx),
        }
    }

    // Pre-order walk. A node is claimed when first pushed, so a parent cycle in
    // corrupt data cannot loop; members of such a cycle are promoted to roots.
    let mut visited = vec![false; n];
    let mut tree_children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut order: Vec<usize> = Vec::with_capacity(n);
    let mut stack: Vec<usize> = Vec::new();
    let mut root_cursor = 0;
    let mut scan_cursor = 0;
    loop {
        let start = if root_cursor < roots.len() {
            roots[root_cursor]
        } else {
            while scan_cursor < n && visited[scan_cursor] {
                scan_cursor += 1;
            }
            if scan_cursor == n {
                break;
            }
            warn!(message_id = rows[scan_cursor].id, "reply cycle detected, promoting to root");
            roots.push(scan_cursor);
            scan_cursor
        };
        root_cursor += 1;
        if visited[start] {
            continue;
        }
        visited[start] = true;
        stack.push(start);
        while let Some(idx) = stack.pop() {
            order.push(idx);
            let kids: Vec<usize> = children[idx].iter().copied().filter(|&kid| !visited[kid]).collect();
            for &kid in &kids {
                visited[kid] = true;
            }
            stack.extend(kids.iter().rev());
            tree_children[idx] = kids;
        }
    }

    let mut slots: Vec<Option<ThreadNode>> = rows.into_iter().map(Some).collect();
    for &idx in order.iter().rev() {
        if tree_children[idx].is_empty() {
            continue;
        }
        let replies: Vec<ThreadNode> = tree_children[idx]
            .iter()
            .filter_map(|&kid| slots[kid].take())
            .collect();
        if let Some(node) = slots[idx].as_mut() {
            node.replies = replies;
        }
    }

    roots.iter().filter_map(|&idx| slots[idx].take()).collect()
}

/// Pre-order rows for `forest`, each carrying its depth. Replies follow their
/// parent and siblings keep their order.
pub fn flatten_forest(forest: &[ThreadNode]) -> Vec<ThreadEntry> {
    let mut entries = Vec::with_capacity(forest.iter().map(ThreadNode::size).sum());
    let mut stack: Vec<(&ThreadNode, usize)> = forest.iter().rev().map(|node| (node, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        entries.push(ThreadEntry {
            id: node.id,
            parent_id: node.parent_id,
            depth,
            sender: node.sender.clone(),
            receiver: node.receiver.clone(),
            content: node.content.clone(),
            timestamp: node.timestamp,
            edited: node.edited,
            edit_count: node.edit_count,
        });
        stack.extend(node.replies.iter().rev().map(|reply| (reply, depth + 1)));
    }
    entries
}
