//! Request-scoped write transaction with a post-commit work queue.
//!
//! Work registered through [`Atomic::on_commit`] runs once, after `COMMIT`
//! succeeds, inside its own immediate transaction. A rollback, an error inside
//! [`atomic`], or dropping the guard discards the queue without running it.
//! `commit` consumes the guard, so the queue can never be flushed twice.
//!
//! Both the request transaction and the flush take SQLite's reserved lock up
//! front (`BEGIN IMMEDIATE`), and writers on other connections wait out the
//! configured busy timeout. The lock is released between `COMMIT` and the
//! flush, so another connection may commit and flush in that gap. Queued work
//! must carry any ordering it depends on instead of reading it at flush time.

use rusqlite::Connection;
use tracing::{debug, error, warn};

use crate::error::CoreError;

type CommitHook<'c> = Box<dyn FnOnce(&Connection) -> Result<(), CoreError> + 'c>;

pub struct Atomic<'c> {
    conn: &'c Connection,
    hooks: Vec<CommitHook<'c>>,
    open: bool,
}

impl<'c> Atomic<'c> {
    pub fn begin(conn: &'c Connection) -> Result<Self, CoreError> {
        conn.execute_batch("BEGIN IMMEDIATE;")?;
        Ok(Self {
            conn,
            hooks: Vec::new(),
            open: true,
        })
    }

    pub fn conn(&self) -> &'c Connection {
        self.conn
    }

    pub fn on_commit<F>(&mut self, hook: F)
    where
        F: FnOnce(&Connection) -> Result<(), CoreError> + 'c,
    {
        self.hooks.push(Box::new(hook));
    }

    pub fn pending(&self) -> usize {
        self.hooks.len()
    }

    /// Commits, then flushes queued work. A flush failure is returned as-is:
    /// the request's own writes are already durable at that point.
    pub fn commit(mut self) -> Result<(), CoreError> {
        let hooks = std::mem::take(&mut self.hooks);
        self.conn.execute_batch("COMMIT;")?;
        self.open = false;
        flush(self.conn, hooks)
    }

    pub fn rollback(mut self) -> Result<(), CoreError> {
        let discarded = self.hooks.len();
        self.hooks.clear();
        self.open = false;
        self.conn.execute_batch("ROLLBACK;")?;
        debug!(discarded, "transaction rolled back");
        Ok(())
    }
}

impl Drop for Atomic<'_> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        let discarded = self.hooks.len();
        self.hooks.clear();
        if let Err(err) = self.conn.execute_batch("ROLLBACK;") {
            warn!(error = %err, "rollback of abandoned transaction failed");
        }
        warn!(discarded, "transaction dropped without commit, rolled back");
    }
}

fn flush(conn: &Connection, hooks: Vec<CommitHook<'_>>) -> Result<(), CoreError> {
    if hooks.is_empty() {
        return Ok(());
    }
    let count = hooks.len();
    conn.execute_batch("BEGIN IMMEDIATE;")?;
    let result = (|| -> Result<(), CoreError> {
        for hook in hooks {
            hook(conn)?;
        }
        Ok(())
    })();

    match result {
        Ok(()) => {
            conn.execute_batch("COMMIT;")?;
            debug!(count, "flushed post-commit work");
            Ok(())
        }
        Err(err) => {
            let _ = conn.execute_batch("ROLLBACK;");
            error!(error = %err, count, "post-commit work failed after commit");
            Err(err)
        }
    }
}

/// Runs `f` inside one transaction: commit on `Ok`, rollback on `Err`.
pub fn atomic<'c, T, F>(conn: &'c Connection, f: F) -> Result<T, CoreError>
where
    F: FnOnce(&mut Atomic<'c>) -> Result<T, CoreError>,
{
    let mut tx = Atomic::begin(conn)?;
    match f(&mut tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(error = %rollback_err, cause = %err, "rollback after failed transaction body failed");
            }
            Err(err)
        }
    }
}
