use crate::models::{Key, KvRow};
use crate::Database;
use anyhow::{Context, Result};
use prostart_types::models::{Conversation, Task, TaskId, User, UserId};
use rusqlite::Connection;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

impl Database {
    // -- Raw values --

    pub fn get_json<T: DeserializeOwned>(&self, key: Key) -> Result<Option<T>> {
        let raw = self.with_conn(|conn| query_value(conn, key))?;
        raw.map(|json| decode(key, &json)).transpose()
    }

    /// Replace the whole value stored under `key`.
    pub fn set_json<T: Serialize + ?Sized>(&self, key: Key, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)
            .with_context(|| format!("failed to encode {}", key.as_str()))?;

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                (key.as_str(), &json),
            )?;
            Ok(())
        })?;

        debug!(key = key.as_str(), bytes = json.len(), "stored value");
        Ok(())
    }

    /// Returns true if a value was present.
    pub fn remove(&self, key: Key) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute("DELETE FROM kv WHERE key = ?1", [key.as_str()])?;
            Ok(removed > 0)
        })
    }

    /// Read a value and delete it in the same step.
    pub fn take_json<T: DeserializeOwned>(&self, key: Key) -> Result<Option<T>> {
        let raw = self.with_conn_mut(|conn| {
            let raw = query_value(conn, key)?;
            if raw.is_some() {
                conn.execute("DELETE FROM kv WHERE key = ?1", [key.as_str()])?;
            }
            Ok(raw)
        })?;
        raw.map(|json| decode(key, &json)).transpose()
    }

    pub fn contains(&self, key: Key) -> Result<bool> {
        Ok(self.with_conn(|conn| query_value(conn, key))?.is_some())
    }

    pub fn entries(&self) -> Result<Vec<KvRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key, value, updated_at FROM kv ORDER BY key")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(KvRow {
                        key: row.get(0)?,
                        value: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Collections --

    pub fn users(&self) -> Result<Vec<User>> {
        Ok(self.get_json(Key::Users)?.unwrap_or_default())
    }

    pub fn save_users(&self, users: &[User]) -> Result<()> {
        self.set_json(Key::Users, users)
    }

    pub fn user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users()?.into_iter().find(|u| u.id == id))
    }

    pub fn tasks(&self) -> Result<Vec<Task>> {
        Ok(self.get_json(Key::Tasks)?.unwrap_or_default())
    }

    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.set_json(Key::Tasks, tasks)
    }

    pub fn task_by_id(&self, id: TaskId) -> Result<Option<Task>> {
        Ok(self.tasks()?.into_iter().find(|t| t.id == id))
    }

    pub fn conversations(&self) -> Result<Vec<Conversation>> {
        Ok(self.get_json(Key::Chats)?.unwrap_or_default())
    }

    pub fn save_conversations(&self, conversations: &[Conversation]) -> Result<()> {
        self.set_json(Key::Chats, conversations)
    }

    // -- Session --

    pub fn current_user(&self) -> Result<Option<User>> {
        self.get_json(Key::CurrentUser)
    }

    pub fn set_current_user(&self, user: &User) -> Result<()> {
        self.set_json(Key::CurrentUser, user)
    }

    pub fn clear_current_user(&self) -> Result<()> {
        self.remove(Key::CurrentUser)?;
        Ok(())
    }
}

fn query_value(conn: &Connection, key: Key) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", [key.as_str()], |row| row.get(0))
        .optional()?;
    Ok(value)
}

fn decode<T: DeserializeOwned>(key: Key, json: &str) -> Result<T> {
    serde_json::from_str(json).with_context(|| format!("corrupt value under {}", key.as_str()))
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
