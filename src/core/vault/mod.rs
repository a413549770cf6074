use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use anyhow::{Context, Result, anyhow};
use base64::Engine;
use hmac::Mac;
use rusqlite::{Connection, OptionalExtension, params};
use sha2::Sha256;
use std::sync::Arc;
use tokio::sync::Mutex;

type HmacSha256 = hmac::Hmac<Sha256>;

pub const GEMINI_API_KEY: &str = "gemini_api_key";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

const NONCE_LEN: usize = 12;

/// Encrypted key/value secrets stored next to the collection.
///
/// Values are sealed with AES-256-GCM under a key bound to this machine and
/// user, and persisted as base64(nonce || ciphertext).
pub struct SecretsVault {
    db: Arc<Mutex<Connection>>,
    cipher: Aes256Gcm,
}

fn machine_key() -> Result<[u8; 32]> {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string());
    let user = whoami::username();

    let mut mac = <HmacSha256 as Mac>::new_from_slice(b"leadrelay-vault-v1")
        .map_err(|e| anyhow!("Invalid vault MAC key: {}", e))?;
    mac.update(host.as_bytes());
    mac.update(b":");
    mac.update(user.as_bytes());
    let digest = mac.finalize().into_bytes();

    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    Ok(key)
}

impl SecretsVault {
    pub async fn open(db: Arc<Mutex<Connection>>) -> Result<Self> {
        let key = machine_key()?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| anyhow!("Invalid vault key length: {}", e))?;
        db.lock().await.execute(
            "CREATE TABLE IF NOT EXISTS secrets (
                name TEXT PRIMARY KEY,
                sealed TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(Self { db, cipher })
    }

    fn seal(&self, plaintext: &str) -> Result<String> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| anyhow!("Encryption failed: {}", e))?;
        let mut sealed = nonce_bytes.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(base64::engine::general_purpose::STANDARD.encode(sealed))
    }

    fn open_sealed(&self, sealed: &str) -> Result<String> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(sealed)
            .context("Sealed secret is not valid base64")?;
        if bytes.len() <= NONCE_LEN {
            return Err(anyhow!("Sealed secret is truncated"));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| anyhow!("Secret was sealed on another machine or user account"))?;
        String::from_utf8(plaintext).context("Secret is not valid UTF-8")
    }

    pub async fn set(&self, name: &str, value: &str) -> Result<()> {
        let sealed = self.seal(value)?;
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO secrets (name, sealed, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(name) DO UPDATE SET sealed = excluded.sealed, updated_at = CURRENT_TIMESTAMP",
            params![name, sealed],
        )?;
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Result<Option<String>> {
        let sealed: Option<String> = {
            let db = self.db.lock().await;
            db.query_row(
                "SELECT sealed FROM secrets WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?
        };
        sealed.map(|s| self.open_sealed(&s)).transpose()
    }

    pub async fn remove(&self, name: &str) -> Result<bool> {
        let db = self.db.lock().await;
        Ok(db.execute("DELETE FROM secrets WHERE name = ?1", params![name])? > 0)
    }

    pub async fn names(&self) -> Result<Vec<String>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare("SELECT name FROM secrets ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut names = Vec::new();
        for name in rows {
            names.push(name?);
        }
        Ok(names)
    }

    /// The copy-suggestion API key: vault first, then the environment.
    pub async fn gemini_api_key(&self) -> Result<Option<String>> {
        if let Some(key) = self.get(GEMINI_API_KEY).await?.filter(|k| !k.is_empty()) {
            return Ok(Some(key));
        }
        Ok(std::env::var(GEMINI_API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty()))
    }
}
