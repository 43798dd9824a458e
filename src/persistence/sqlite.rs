//! SQLite-backed sink: latest snapshot per agent plus an append-only message log.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::{MessageRecord, PersistenceSink};
use crate::agent::{AgentSnapshot, Position};
use crate::config::get_home_dir;
use crate::error::{Error, Result};

/// Default database location (~/.dronewatch/records.db).
pub fn default_db_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("records.db"))
}

pub struct SqliteSink {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl std::fmt::Debug for SqliteSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSink").field("path", &self.path).finish()
    }
}

impl SqliteSink {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)
            .map_err(|e| Error::Persistence(format!("sqlite open: {}", e)))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS agents (
                role TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                pos_x REAL NOT NULL,
                pos_y REAL NOT NULL,
                pos_z REAL NOT NULL,
                battery REAL,
                updated_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL,
                ts INTEGER NOT NULL,
                performative TEXT NOT NULL,
                content TEXT NOT NULL,
                sender TEXT,
                receiver TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_messages_receiver ON messages(receiver, ts);
            "#,
        )
        .map_err(|e| Error::Persistence(format!("sqlite init: {}", e)))?;

        tracing::debug!("Opened record store at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Latest snapshot of every recorded agent, ordered by role.
    pub fn agents(&self) -> Result<Vec<AgentSnapshot>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT role, status, pos_x, pos_y, pos_z, battery, updated_at FROM agents ORDER BY role",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(AgentSnapshot {
                role: row.get(0)?,
                status: row.get(1)?,
                position: Position::new(row.get(2)?, row.get(3)?, row.get(4)?),
                battery: row.get(5)?,
                captured_at: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn agent(&self, role: &str) -> Result<Option<AgentSnapshot>> {
        let conn = self.conn.lock();
        let snapshot = conn
            .query_row(
                "SELECT role, status, pos_x, pos_y, pos_z, battery, updated_at FROM agents WHERE role = ?1",
                params![role],
                |row| {
                    Ok(AgentSnapshot {
                        role: row.get(0)?,
                        status: row.get(1)?,
                        position: Position::new(row.get(2)?, row.get(3)?, row.get(4)?),
                        battery: row.get(5)?,
                        captured_at: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(snapshot)
    }

    /// Most recent messages, newest first.
    pub fn recent_messages(&self, limit: usize) -> Result<Vec<MessageRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, ts, performative, content, sender, receiver FROM messages ORDER BY seq DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(MessageRecord {
                id: row.get(0)?,
                recorded_at: row.get(1)?,
                performative: row.get(2)?,
                content: row.get(3)?,
                sender: row.get(4)?,
                receiver: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn message_count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl PersistenceSink for SqliteSink {
    fn update_agent(&self, snapshot: &AgentSnapshot) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO agents (role, status, pos_x, pos_y, pos_z, battery, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(role) DO UPDATE SET
                status = excluded.status,
                pos_x = excluded.pos_x,
                pos_y = excluded.pos_y,
                pos_z = excluded.pos_z,
                battery = excluded.battery,
                updated_at = excluded.updated_at",
            params![
                snapshot.role,
                snapshot.status,
                snapshot.position.x,
                snapshot.position.y,
                snapshot.position.z,
                snapshot.battery,
                snapshot.captured_at
            ],
        )
        .map_err(|e| Error::Persistence(format!("sqlite upsert agent: {}", e)))?;
        Ok(())
    }

    fn append_message(&self, record: &MessageRecord) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO messages (id, ts, performative, content, sender, receiver) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id,
                record.recorded_at,
                record.performative,
                record.content,
                record.sender,
                record.receiver
            ],
        )
        .map_err(|e| Error::Persistence(format!("sqlite insert message: {}", e)))?;
        Ok(())
    }
}
