use std::path::PathBuf;

use rusqlite::Connection;
use tracing::info;

use crate::config::StoreConfig;
use crate::error::CoreError;
use crate::migrations::MIGRATIONS;

pub struct MessageStore {
    pub path: PathBuf,
    pub conn: Connection,
}

pub fn open_store(config: &StoreConfig) -> Result<MessageStore, CoreError> {
    let path = config.db_path.clone();
    let conn = Connection::open(&path)?;
    conn.busy_timeout(config.busy_timeout)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL; \
         PRAGMA synchronous = NORMAL; \
         PRAGMA foreign_keys = ON; \
         PRAGMA temp_store = MEMORY;",
    )?;
    apply_migrations(&conn)?;
    info!("message store opened at {}", path.display());
    Ok(MessageStore { path, conn })
}

/// Fresh in-memory store with the full schema applied.
pub fn open_in_memory() -> Result<Connection, CoreError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    apply_migrations(&conn)?;
    Ok(conn)
}

pub fn apply_migrations(conn: &Connection) -> Result<(), CoreError> {
    let current_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let mut version = current_version as usize;
    for (idx, sql) in MIGRATIONS.iter().enumerate() {
        let next_version = idx + 1;
        if next_version <= version {
            continue;
        }
        conn.execute_batch(sql)?;
        conn.execute_batch(&format!("PRAGMA user_version = {};", next_version))?;
        info!(version = next_version, "applied schema migration");
        version = next_version;
    }
    Ok(())
}
