use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

use super::types::{Profile, Role};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("'{0}' is not a valid e-mail address")]
    InvalidEmail(String),
    #[error("a password is required")]
    MissingPassword,
    #[error("invalid e-mail or password")]
    InvalidCredentials,
    #[error(transparent)]
    Repository(#[from] anyhow::Error),
}

/// Salted password digest as stored by a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub salt: String,
    pub hash: String,
}

impl Credential {
    pub fn from_password(password: &str) -> Self {
        let salt_bytes: [u8; 16] = rand::random();
        let salt = hex::encode(salt_bytes);
        let hash = digest(&salt, password);
        Self { salt, hash }
    }

    pub fn verify(&self, password: &str) -> bool {
        let candidate = digest(&self.salt, password);
        candidate.len() == self.hash.len()
            && candidate
                .bytes()
                .zip(self.hash.bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Storage for agent profiles and their credentials.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Profile>>;
    async fn insert_profile(&self, profile: Profile) -> anyhow::Result<()>;
    async fn credential(&self, email: &str) -> anyhow::Result<Option<Credential>>;
    async fn store_credential(&self, email: &str, credential: &Credential) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// An existing profile logged in.
    Authenticated(Profile),
    /// The e-mail was unknown and a new agent profile was created for it.
    Registered(Profile),
}

impl AuthOutcome {
    pub fn profile(&self) -> &Profile {
        match self {
            AuthOutcome::Authenticated(p) | AuthOutcome::Registered(p) => p,
        }
    }

    pub fn into_profile(self) -> Profile {
        match self {
            AuthOutcome::Authenticated(p) | AuthOutcome::Registered(p) => p,
        }
    }
}

pub fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(AuthError::InvalidEmail(raw.trim().to_string())),
    }
}

pub fn new_agent_profile(email: &str) -> Profile {
    let name = email.split('@').next().unwrap_or(email).to_string();
    Profile {
        id: uuid::Uuid::new_v4().simple().to_string()[..9].to_string(),
        name,
        email: email.to_string(),
        role: Role::Agent,
        active: true,
    }
}

/// Log in with `email`, registering a new agent when the address is unknown.
///
/// A profile without a stored credential (seeded accounts) adopts the first
/// password it is logged in with.
pub async fn register_or_authenticate(
    repo: &dyn AgentRepository,
    email: &str,
    password: &str,
) -> Result<AuthOutcome, AuthError> {
    let email = normalize_email(email)?;
    if password.is_empty() {
        return Err(AuthError::MissingPassword);
    }

    match repo.find_by_email(&email).await? {
        Some(profile) => {
            match repo.credential(&email).await? {
                Some(credential) if !credential.verify(password) => {
                    return Err(AuthError::InvalidCredentials);
                }
                Some(_) => {}
                None => {
                    repo.store_credential(&email, &Credential::from_password(password))
                        .await?;
                }
            }
            info!("Authenticated {} ({})", profile.email, profile.role.as_str());
            Ok(AuthOutcome::Authenticated(profile))
        }
        None => {
            let profile = new_agent_profile(&email);
            repo.insert_profile(profile.clone()).await?;
            repo.store_credential(&email, &Credential::from_password(password))
                .await?;
            info!("Registered new agent {} ({})", profile.email, profile.id);
            Ok(AuthOutcome::Registered(profile))
        }
    }
}
