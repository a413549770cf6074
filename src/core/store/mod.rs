mod credentials;
#[cfg(test)]
pub mod memory;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::core::leads::types::Collection;
use crate::platform::{NativePlatform, Platform};

const COLLECTION_KEY: &str = "collection";
const SESSION_KEY: &str = "session";

/// Full-snapshot persistence for the lead collection.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    async fn read(&self) -> Result<Collection>;
    async fn write(&self, collection: &Collection) -> Result<()>;
}

pub struct SqliteStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub async fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        if !data_dir.exists() {
            tokio::fs::create_dir_all(&data_dir)
                .await
                .with_context(|| format!("Failed to create {}", data_dir.display()))?;
        }
        NativePlatform::restrict_dir_permissions(&data_dir);

        let db_path = data_dir.join("leadrelay.db");
        let db = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;
        NativePlatform::restrict_file_permissions(&db_path);
        create_tables(&db)?;
        debug!("Opened store at {}", db_path.display());

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory()?;
        create_tables(&db)?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Shared connection, used by the secrets vault.
    pub fn get_db(&self) -> Arc<Mutex<Connection>> {
        self.db.clone()
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let db = self.db.lock().await;
        let value = db
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }

    pub async fn session(&self) -> Result<Option<String>> {
        self.get_value(SESSION_KEY).await
    }

    pub async fn set_session(&self, email: &str) -> Result<()> {
        self.set_value(SESSION_KEY, email).await
    }

    pub async fn clear_session(&self) -> Result<bool> {
        let db = self.db.lock().await;
        let rows = db.execute("DELETE FROM kv_store WHERE key = ?1", params![SESSION_KEY])?;
        Ok(rows > 0)
    }

    /// Whether `install` has ever written a collection.
    pub async fn is_initialized(&self) -> Result<bool> {
        Ok(self.get_value(COLLECTION_KEY).await?.is_some())
    }
}

fn create_tables(db: &Connection) -> Result<()> {
    db.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    db.execute(
        "CREATE TABLE IF NOT EXISTS credentials (
            email TEXT PRIMARY KEY,
            salt TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

#[async_trait]
impl CollectionStore for SqliteStore {
    async fn read(&self) -> Result<Collection> {
        match self.get_value(COLLECTION_KEY).await? {
            Some(json) => {
                serde_json::from_str(&json).context("Stored collection is not valid JSON")
            }
            None => Ok(Collection::default()),
        }
    }

    async fn write(&self, collection: &Collection) -> Result<()> {
        if let Some(lead) = collection.leads.iter().find(|l| !l.is_consistent()) {
            bail!(
                "Refusing to save lead '{}': status {} does not match its sent time",
                lead.id,
                lead.status.as_str()
            );
        }
        let json = serde_json::to_string(collection)?;
        self.set_value(COLLECTION_KEY, &json).await?;
        info!(
            "Collection saved: {} profiles, {} campaigns, {} leads",
            collection.profiles.len(),
            collection.bases.len(),
            collection.leads.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::leads::types::{Lead, LeadBase, LeadStatus, Profile, Role};

    #[tokio::test]
    async fn empty_store_reads_default_collection() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.read().await.unwrap(), Collection::default());
        assert!(!store.is_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn write_replaces_the_whole_snapshot() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut collection = Collection::default();
        collection.profiles.push(Profile {
            id: "1".into(),
            name: "Admin".into(),
            email: "admin@example.com".into(),
            role: Role::Admin,
            active: true,
        });
        store.write(&collection).await.unwrap();

        collection.bases.push(LeadBase {
            id: "b1".into(),
            name: "Launch".into(),
            copy: "Hi [NOME]".into(),
            image: None,
            created_at: 1,
        });
        store.write(&collection).await.unwrap();

        assert_eq!(store.read().await.unwrap(), collection);
        assert!(store.is_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn sent_lead_without_timestamp_is_not_saved() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut collection = Collection::default();
        collection.leads.push(Lead {
            id: "l1".into(),
            base_id: "b1".into(),
            seller_id: "a".into(),
            name: "Ana".into(),
            phone: "11999990000".into(),
            status: LeadStatus::Sent,
            sent_at: None,
            created_at: 1,
        });
        assert!(store.write(&collection).await.is_err());
        assert!(!store.is_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn session_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.session().await.unwrap(), None);
        store.set_session("ana@example.com").await.unwrap();
        store.set_session("bob@example.com").await.unwrap();
        assert_eq!(
            store.session().await.unwrap().as_deref(),
            Some("bob@example.com")
        );
        assert!(store.clear_session().await.unwrap());
        assert!(!store.clear_session().await.unwrap());
    }

    #[tokio::test]
    async fn on_disk_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SqliteStore::open(dir.path()).await.unwrap();
            store.set_session("ana@example.com").await.unwrap();
        }
        let store = SqliteStore::open(dir.path()).await.unwrap();
        assert_eq!(
            store.session().await.unwrap().as_deref(),
            Some("ana@example.com")
        );
        assert!(dir.path().join("leadrelay.db").exists());
    }
}
