//! SQLite-backed persistence.
//!
//! Provides:
//! - Key-value store for goals, settings and flags
//! - A local queue of scheduled reminders, so the CLI can act as its own
//!   notification service

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::rc::Rc;

use super::{data_dir, KeyValueStore};
use crate::error::{NotificationError, StorageError};
use crate::notify::{NotificationHandle, Notifier};

const PERMISSION_KEY: &str = "notificationPermission";

/// A reminder waiting in the local queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedNotification {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub fire_in_secs: u64,
    pub scheduled_at: DateTime<Utc>,
    pub fire_at: DateTime<Utc>,
}

/// SQLite database for app state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/shamezone.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        Self::open_at(&data_dir()?.join("shamezone.db"))
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS scheduled_notifications (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                title         TEXT NOT NULL,
                body          TEXT NOT NULL,
                fire_in_secs  INTEGER NOT NULL,
                scheduled_at  TEXT NOT NULL,
                fire_at       TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_scheduled_notifications_fire_at
                ON scheduled_notifications(fire_at);",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_remove(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Queue a reminder `fire_in_secs` from now.
    pub fn enqueue_notification(
        &self,
        fire_in_secs: u64,
        title: &str,
        body: &str,
    ) -> Result<i64, rusqlite::Error> {
        let scheduled_at = Utc::now();
        let fire_at = scheduled_at + Duration::seconds(fire_in_secs.min(i64::MAX as u64) as i64);
        self.conn.execute(
            "INSERT INTO scheduled_notifications (title, body, fire_in_secs, scheduled_at, fire_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                title,
                body,
                fire_in_secs as i64,
                scheduled_at.to_rfc3339(),
                fire_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All queued reminders, soonest first.
    pub fn queued_notifications(&self) -> Result<Vec<QueuedNotification>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, body, fire_in_secs, scheduled_at, fire_at
             FROM scheduled_notifications
             ORDER BY fire_at, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, title, body, fire_in_secs, scheduled_at, fire_at) = row?;
            out.push(QueuedNotification {
                id,
                title,
                body,
                fire_in_secs: fire_in_secs.max(0) as u64,
                scheduled_at: parse_ts(&scheduled_at),
                fire_at: parse_ts(&fire_at),
            });
        }
        Ok(out)
    }

    pub fn clear_notifications(&self) -> Result<usize, rusqlite::Error> {
        self.conn.execute("DELETE FROM scheduled_notifications", [])
    }
}

fn parse_ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.kv_get(key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Ok(self.kv_set(key, value)?)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        Ok(self.kv_remove(key)?)
    }
}

// ── Local notification queue ─────────────────────────────────────

impl Database {
    fn queue_permission(&self) -> Result<bool, NotificationError> {
        self.kv_get(PERMISSION_KEY)
            .map(|v| v.as_deref() == Some("granted"))
            .map_err(|e| NotificationError::Unavailable(e.to_string()))
    }

    /// There is no platform prompt to show, so asking always grants.
    fn grant_queue_permission(&self) -> Result<bool, NotificationError> {
        self.kv_set(PERMISSION_KEY, "granted")
            .map(|_| true)
            .map_err(|e| NotificationError::Unavailable(e.to_string()))
    }

    fn cancel_queue(&self) -> Result<(), NotificationError> {
        self.clear_notifications()
            .map(|_| ())
            .map_err(|e| NotificationError::CancelFailed(e.to_string()))
    }

    fn push_queue(
        &self,
        fire_in_secs: u64,
        title: &str,
        body: &str,
    ) -> Result<NotificationHandle, NotificationError> {
        self.enqueue_notification(fire_in_secs, title, body)
            .map(|id| NotificationHandle(format!("queue-{id}")))
            .map_err(|e| NotificationError::ScheduleFailed(e.to_string()))
    }
}

impl Notifier for Database {
    fn permission_granted(&mut self) -> Result<bool, NotificationError> {
        self.queue_permission()
    }

    fn request_permission(&mut self) -> Result<bool, NotificationError> {
        self.grant_queue_permission()
    }

    fn cancel_all(&mut self) -> Result<(), NotificationError> {
        self.cancel_queue()
    }

    fn schedule_at(
        &mut self,
        fire_in_secs: u64,
        title: &str,
        body: &str,
    ) -> Result<NotificationHandle, NotificationError> {
        self.push_queue(fire_in_secs, title, body)
    }
}

/// Shared handle, so one connection can back both state and reminders.
impl Notifier for Rc<Database> {
    fn permission_granted(&mut self) -> Result<bool, NotificationError> {
        self.queue_permission()
    }

    fn request_permission(&mut self) -> Result<bool, NotificationError> {
        self.grant_queue_permission()
    }

    fn cancel_all(&mut self) -> Result<(), NotificationError> {
        self.cancel_queue()
    }

    fn schedule_at(
        &mut self,
        fire_in_secs: u64,
        title: &str,
        body: &str,
    ) -> Result<NotificationHandle, NotificationError> {
        self.push_queue(fire_in_secs, title, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_remove("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn queue_orders_by_fire_time() {
        let mut db = Database::open_memory().unwrap();
        db.schedule_at(7200, "ShameZone Reminder", "later").unwrap();
        let handle = db.schedule_at(60, "ShameZone Reminder", "sooner").unwrap();
        assert!(handle.0.starts_with("queue-"));

        let queued = db.queued_notifications().unwrap();
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0].body, "sooner");
        assert_eq!(queued[1].fire_in_secs, 7200);
        assert_eq!(queued[1].fire_at - queued[1].scheduled_at, Duration::seconds(7200));

        db.cancel_all().unwrap();
        assert!(db.queued_notifications().unwrap().is_empty());
    }

    #[test]
    fn permission_is_remembered() {
        let mut db = Database::open_memory().unwrap();
        assert!(!db.permission_granted().unwrap());
        assert!(db.request_permission().unwrap());
        assert!(db.permission_granted().unwrap());
    }

    #[test]
    fn shared_handle_queues_into_same_table() {
        let db = Rc::new(Database::open_memory().unwrap());
        let mut notifier = Rc::clone(&db);
        notifier.schedule_at(30, "ShameZone Reminder", "go").unwrap();
        assert_eq!(db.queued_notifications().unwrap().len(), 1);
        assert_eq!(KeyValueStore::get(&db, "missing").unwrap(), None);
    }

    #[test]
    fn open_at_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.kv_set("k", "v").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.kv_get("k").unwrap().as_deref(), Some("v"));
    }
}
