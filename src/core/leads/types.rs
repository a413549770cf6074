use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "AGENT", alias = "SELLER")]
    Agent,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Agent => "AGENT",
        }
    }
}

/// A user of the system. Agents receive and dispatch leads; admins operate campaigns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
}

impl Profile {
    pub fn is_eligible(&self) -> bool {
        self.role == Role::Agent && self.active
    }
}

/// A campaign ("base"): a named outreach effort with a reusable message template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadBase {
    pub id: String,
    pub name: String,
    pub copy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    Pending,
    Sent,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::Pending => "PENDING",
            LeadStatus::Sent => "SENT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub base_id: String,
    pub seller_id: String,
    pub name: String,
    pub phone: String,
    pub status: LeadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<i64>,
    pub created_at: i64,
}

impl Lead {
    /// `sent_at` is present exactly when the lead has been dispatched.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            LeadStatus::Pending => self.sent_at.is_none(),
            LeadStatus::Sent => self.sent_at.is_some(),
        }
    }
}

/// Full snapshot held by the collection store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub bases: Vec<LeadBase>,
    #[serde(default)]
    pub leads: Vec<Lead>,
}

impl Collection {
    pub fn find_profile(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn find_profile_by_email(&self, email: &str) -> Option<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.email.eq_ignore_ascii_case(email))
    }

    pub fn find_base(&self, id: &str) -> Option<&LeadBase> {
        self.bases.iter().find(|b| b.id == id)
    }

    pub fn find_lead(&self, id: &str) -> Option<&Lead> {
        self.leads.iter().find(|l| l.id == id)
    }

    /// Active agents in registration order. This order drives round-robin.
    pub fn eligible_agents(&self) -> Vec<&Profile> {
        self.profiles.iter().filter(|p| p.is_eligible()).collect()
    }

    pub fn leads_for_base<'a>(&'a self, base_id: &'a str) -> impl Iterator<Item = &'a Lead> + 'a {
        self.leads.iter().filter(move |l| l.base_id == base_id)
    }

    pub fn leads_for_agent<'a>(&'a self, agent_id: &'a str) -> impl Iterator<Item = &'a Lead> + 'a {
        self.leads.iter().filter(move |l| l.seller_id == agent_id)
    }

    /// Replace the stored lead with the same id. Returns false when it is unknown.
    pub fn replace_lead(&mut self, lead: Lead) -> bool {
        match self.leads.iter_mut().find(|l| l.id == lead.id) {
            Some(slot) => {
                *slot = lead;
                true
            }
            None => false,
        }
    }
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
