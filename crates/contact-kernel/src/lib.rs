use anyhow::{anyhow, Result};
use contact_core::{ContactRecord, ContactStore};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Busy timeout (default 5000ms; override with CONTACT_SQLITE_BUSY_MS)
fn busy_timeout() -> Duration {
    let busy_ms: u64 = std::env::var("CONTACT_SQLITE_BUSY_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5000);
    Duration::from_millis(busy_ms)
}

#[derive(Clone)]
pub struct Kernel {
    db_path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StoredContact {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created: String,
}

impl StoredContact {
    pub fn record(&self) -> ContactRecord {
        ContactRecord::new(self.name.clone(), self.email.clone())
    }
}

impl Kernel {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let db_path = dir.join("contacts.sqlite");
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(busy_timeout())?;
        let _ = conn.pragma_update(None, "temp_store", "MEMORY");
        Self::init_schema(&conn)?;
        debug!(target: "kernel", path = %db_path.display(), "contact store opened");
        Ok(Self { db_path })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS contacts (
              id TEXT PRIMARY KEY,
              name TEXT NOT NULL,
              email TEXT NOT NULL UNIQUE,
              created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_contacts_created ON contacts(created);
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(busy_timeout())?;
        Ok(conn)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn find_contact_by_email(&self, email: &str) -> Result<Option<StoredContact>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id,name,email,created FROM contacts WHERE email=? LIMIT 1")?;
        let row = stmt
            .query_row([email], |row| {
                Ok(StoredContact {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    created: row.get(3)?,
                })
            })
            .optional()?;
        Ok(row)
    }

    /// Insert a contact. Fails on a duplicate email (UNIQUE constraint).
    pub fn insert_contact(&self, record: &ContactRecord) -> Result<StoredContact> {
        let conn = self.conn()?;
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        conn.execute(
            "INSERT INTO contacts(id,name,email,created) VALUES(?,?,?,?)",
            params![id, record.name, record.email, now],
        )?;
        Ok(StoredContact {
            id,
            name: record.name.clone(),
            email: record.email.clone(),
            created: now,
        })
    }

    /// Most recent contacts first.
    pub fn list_contacts(&self, limit: i64) -> Result<Vec<StoredContact>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id,name,email,created FROM contacts ORDER BY created DESC, rowid DESC LIMIT ?",
        )?;
        let rows = stmt.query_map([limit], |row| {
            Ok(StoredContact {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                created: row.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn count_contacts(&self) -> Result<i64> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
        Ok(n)
    }

    // ---------------- Async wrappers (spawn_blocking) ----------------

    pub async fn find_contact_by_email_async(&self, email: &str) -> Result<Option<StoredContact>> {
        let k = self.clone();
        let email = email.to_string();
        tokio::task::spawn_blocking(move || k.find_contact_by_email(&email))
            .await
            .map_err(|e| anyhow!("join error: {}", e))?
    }

    pub async fn insert_contact_async(&self, record: &ContactRecord) -> Result<StoredContact> {
        let k = self.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || k.insert_contact(&record))
            .await
            .map_err(|e| anyhow!("join error: {}", e))?
    }

    pub async fn list_contacts_async(&self, limit: i64) -> Result<Vec<StoredContact>> {
        let k = self.clone();
        tokio::task::spawn_blocking(move || k.list_contacts(limit))
            .await
            .map_err(|e| anyhow!("join error: {}", e))?
    }

    pub async fn count_contacts_async(&self) -> Result<i64> {
        let k = self.clone();
        tokio::task::spawn_blocking(move || k.count_contacts())
            .await
            .map_err(|e| anyhow!("join error: {}", e))?
    }
}

#[async_trait::async_trait]
impl ContactStore for Kernel {
    async fn find_by_email(&self, email: &str) -> Result<Option<ContactRecord>> {
        Ok(self
            .find_contact_by_email_async(email)
            .await?
            .map(|row| row.record()))
    }

    async fn create(&self, record: &ContactRecord) -> Result<ContactRecord> {
        Ok(self.insert_contact_async(record).await?.record())
    }
}
