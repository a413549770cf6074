use anyhow::Result;
use async_trait::async_trait;
use rusqlite::{OptionalExtension, params};

use super::{CollectionStore, SqliteStore};
use crate::core::leads::auth::{AgentRepository, Credential};
use crate::core::leads::types::Profile;

#[async_trait]
impl AgentRepository for SqliteStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Profile>> {
        let collection = self.read().await?;
        Ok(collection.find_profile_by_email(email).cloned())
    }

    async fn insert_profile(&self, profile: Profile) -> Result<()> {
        let mut collection = self.read().await?;
        collection.profiles.push(profile);
        self.write(&collection).await
    }

    async fn credential(&self, email: &str) -> Result<Option<Credential>> {
        let db = self.db.lock().await;
        let credential = db
            .query_row(
                "SELECT salt, password_hash FROM credentials WHERE email = ?1",
                params![email],
                |row| {
                    Ok(Credential {
                        salt: row.get(0)?,
                        hash: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(credential)
    }

    async fn store_credential(&self, email: &str, credential: &Credential) -> Result<()> {
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO credentials (email, salt, password_hash) VALUES (?1, ?2, ?3)
             ON CONFLICT(email) DO UPDATE SET salt = excluded.salt, password_hash = excluded.password_hash",
            params![email, credential.salt, credential.hash],
        )?;
        Ok(())
    }
}
