//! Store-backed lead workflow.
//!
//! Every mutating operation reads the collection once, computes the new
//! snapshot in memory and writes it back at most once. Any error returns
//! before the write, so a failed operation leaves the store untouched.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use super::cell::Cell;
use super::dispatch::{MessagingChannel, Outbound, mark_sent, prepare};
use super::distribution::{distribute, fresh_lead_id, load_per_agent};
use super::error::LeadError;
use super::export::{ExportRow, TimestampFormat, build_export};
use super::normalizer::{HeaderPolicy, NormalizedBatch, RowRejection, parse_positional, parse_sheet};
use super::queue::{AgentQueue, agent_queue};
use super::stats::{DashboardStats, dashboard};
use super::types::{Collection, Lead, LeadBase, Profile, Role, now_millis};
use crate::core::store::CollectionStore;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub placeholder: String,
    pub header_policy: HeaderPolicy,
    pub timestamps: TimestampFormat,
}

/// Raw lead input for one import.
#[derive(Debug, Clone)]
pub enum ImportSource {
    /// Pasted `name,phone` lines.
    Text(String),
    /// Decoded spreadsheet rows, header first.
    Sheet(Vec<Vec<Cell>>),
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub base: LeadBase,
    pub leads: Vec<Lead>,
    pub rejected: Vec<RowRejection>,
    /// (agent name, leads received) in rotation order.
    pub loads: Vec<(String, usize)>,
}

#[derive(Debug, Clone)]
pub struct DispatchReceipt {
    pub lead: Lead,
    pub outbound: Outbound,
}

#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub base: LeadBase,
    pub rows: Vec<ExportRow>,
}

pub struct Operations {
    store: Arc<dyn CollectionStore>,
    settings: EngineSettings,
}

/// Look a campaign up by id, falling back to a case-insensitive unique name.
pub fn resolve_base_in<'a>(collection: &'a Collection, key: &str) -> Result<&'a LeadBase, LeadError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(LeadError::MissingField("campaign"));
    }
    if let Some(base) = collection.find_base(key) {
        return Ok(base);
    }
    let mut named = collection
        .bases
        .iter()
        .filter(|b| b.name.trim().eq_ignore_ascii_case(key));
    match (named.next(), named.next()) {
        (Some(base), None) => Ok(base),
        (Some(_), Some(_)) => Err(LeadError::AmbiguousCampaign {
            name: key.to_string(),
        }),
        _ => Err(LeadError::CampaignNotFound {
            id: key.to_string(),
        }),
    }
}

fn resolve_profile_in<'a>(collection: &'a Collection, key: &str) -> Option<&'a Profile> {
    collection
        .find_profile(key)
        .or_else(|| collection.find_profile_by_email(key.trim()))
}

impl Operations {
    pub fn new(store: Arc<dyn CollectionStore>, settings: EngineSettings) -> Self {
        Self { store, settings }
    }

    pub async fn create_base(
        &self,
        name: &str,
        copy: &str,
        image: Option<String>,
    ) -> Result<LeadBase> {
        let name = name.trim();
        let copy = copy.trim();
        if name.is_empty() {
            return Err(LeadError::MissingField("campaign name").into());
        }
        if copy.is_empty() {
            return Err(LeadError::MissingField("message copy").into());
        }

        let mut collection = self.store.read().await?;
        let base = LeadBase {
            id: format!("base-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]),
            name: name.to_string(),
            copy: copy.to_string(),
            image,
            created_at: now_millis(),
        };
        if !copy
            .to_lowercase()
            .contains(&self.settings.placeholder.to_lowercase())
        {
            warn!(
                "Copy for campaign '{}' has no {} placeholder; every lead gets the same text",
                name, self.settings.placeholder
            );
        }
        collection.bases.push(base.clone());
        self.store.write(&collection).await?;
        info!("Created campaign {} ({})", base.name, base.id);
        Ok(base)
    }

    pub async fn list_bases(&self) -> Result<Vec<LeadBase>> {
        Ok(self.store.read().await?.bases)
    }

    pub async fn resolve_base(&self, key: &str) -> Result<LeadBase> {
        let collection = self.store.read().await?;
        Ok(resolve_base_in(&collection, key)?.clone())
    }

    pub async fn list_agents(&self) -> Result<Vec<Profile>> {
        Ok(self
            .store
            .read()
            .await?
            .profiles
            .into_iter()
            .filter(|p| p.role == Role::Agent)
            .collect())
    }

    /// Flip an agent's `active` flag. Inactive agents keep their leads but get no new ones.
    pub async fn toggle_agent(&self, key: &str) -> Result<Profile> {
        let mut collection = self.store.read().await?;
        let id = match resolve_profile_in(&collection, key) {
            Some(p) if p.role != Role::Agent => {
                return Err(LeadError::NotAnAgent { id: p.id.clone() }.into());
            }
            Some(p) => p.id.clone(),
            None => {
                return Err(LeadError::AgentNotFound {
                    id: key.to_string(),
                }
                .into());
            }
        };

        let Some(profile) = collection.profiles.iter_mut().find(|p| p.id == id) else {
            return Err(LeadError::AgentNotFound { id }.into());
        };
        profile.active = !profile.active;
        let toggled = profile.clone();
        self.store.write(&collection).await?;
        info!(
            "Agent {} is now {}",
            toggled.email,
            if toggled.active { "active" } else { "inactive" }
        );
        Ok(toggled)
    }

    /// Normalize `source` and spread the valid rows over the active agents.
    pub async fn import_batch(&self, base_key: &str, source: ImportSource) -> Result<ImportReport> {
        let mut collection = self.store.read().await?;
        let base = resolve_base_in(&collection, base_key)?.clone();

        let NormalizedBatch {
            candidates,
            rejected,
        } = match source {
            ImportSource::Text(text) => parse_positional(&text),
            ImportSource::Sheet(rows) => parse_sheet(&rows, self.settings.header_policy)?,
        };
        for rejection in &rejected {
            warn!("Import into {}: {}", base.name, rejection.clone().into_error());
        }
        if candidates.is_empty() {
            return Err(LeadError::EmptyBatch.into());
        }

        let agents = collection.eligible_agents();
        let leads = distribute(candidates, &base.id, &agents, now_millis(), fresh_lead_id)?;
        let loads = load_per_agent(&leads, &agents);

        collection.leads.extend(leads.iter().cloned());
        self.store.write(&collection).await?;
        info!(
            "Imported {} leads into {} ({} rejected)",
            leads.len(),
            base.name,
            rejected.len()
        );

        Ok(ImportReport {
            base,
            leads,
            rejected,
            loads,
        })
    }

    /// Hand a lead's message to `channel` and record it as sent.
    ///
    /// The lead is only marked SENT after the channel accepted the message.
    pub async fn dispatch(
        &self,
        agent: &Profile,
        lead_id: &str,
        channel: &dyn MessagingChannel,
    ) -> Result<DispatchReceipt> {
        let mut collection = self.store.read().await?;
        let lead = collection
            .find_lead(lead_id)
            .ok_or_else(|| LeadError::LeadNotFound {
                id: lead_id.to_string(),
            })?
            .clone();
        self.commit_dispatch(&mut collection, agent, lead, channel)
            .await
    }

    /// Dispatch the newest pending lead in the agent's queue, if any.
    pub async fn dispatch_next(
        &self,
        agent: &Profile,
        channel: &dyn MessagingChannel,
    ) -> Result<Option<DispatchReceipt>> {
        let mut collection = self.store.read().await?;
        let queue = agent_queue(&collection, &agent.id);
        let Some(next) = queue.next_pending() else {
            return Ok(None);
        };
        let lead = next.lead.clone();
        self.commit_dispatch(&mut collection, agent, lead, channel)
            .await
            .map(Some)
    }

    async fn commit_dispatch(
        &self,
        collection: &mut Collection,
        agent: &Profile,
        lead: Lead,
        channel: &dyn MessagingChannel,
    ) -> Result<DispatchReceipt> {
        if lead.seller_id != agent.id {
            return Err(LeadError::NotLeadOwner { lead_id: lead.id }.into());
        }
        let base = collection
            .find_base(&lead.base_id)
            .ok_or_else(|| LeadError::CampaignNotFound {
                id: lead.base_id.clone(),
            })?;

        let outbound = prepare(&lead, base, &self.settings.placeholder)?;
        let sent = mark_sent(&lead, now_millis())?;
        channel.deliver(&outbound)?;

        collection.replace_lead(sent.clone());
        self.store.write(collection).await?;
        info!("Lead {} dispatched by {}", sent.id, agent.email);
        Ok(DispatchReceipt {
            lead: sent,
            outbound,
        })
    }

    pub async fn export(&self, base_key: &str) -> Result<ExportBundle> {
        let collection = self.store.read().await?;
        let base = resolve_base_in(&collection, base_key)?.clone();
        let rows = build_export(&collection, &base.id, &self.settings.timestamps)?;
        Ok(ExportBundle { base, rows })
    }

    pub async fn stats(&self) -> Result<DashboardStats> {
        Ok(dashboard(&self.store.read().await?))
    }

    pub async fn queue(&self, agent_id: &str) -> Result<AgentQueue> {
        Ok(agent_queue(&self.store.read().await?, agent_id))
    }
}
