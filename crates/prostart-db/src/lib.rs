pub mod migrations;
pub mod models;
pub mod queries;
mod seed;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// JSON key-value store backed by a single SQLite table.
///
/// Every collection lives under one fixed key and is replaced as a whole on
/// write, so a failed write leaves the previous value intact.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the store at `path`. When `seed` is set, collections
    /// that do not exist yet are filled with the demo data set.
    pub fn open(path: &Path, seed: bool) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn, seed)?;
        info!("Store opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory(seed: bool) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, seed)
    }

    fn init(conn: Connection, seed: bool) -> Result<Self> {
        migrations::run(&conn)?;
        if seed {
            seed::apply(&conn)?;
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("Store lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Takes the same lock as [`with_conn`](Self::with_conn); only marks call sites that write.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("Store lock poisoned: {}", e))?;
        f(&conn)
    }
}
