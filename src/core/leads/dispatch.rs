use anyhow::Result;
use regex::RegexBuilder;
use tracing::info;

use super::error::LeadError;
use super::types::{Lead, LeadBase, LeadStatus};

pub const DEFAULT_PLACEHOLDER: &str = "[NOME]";
pub const DEFAULT_CHANNEL_BASE_URL: &str = "https://wa.me/";

pub fn can_transition(from: LeadStatus, to: LeadStatus) -> bool {
    matches!((from, to), (LeadStatus::Pending, LeadStatus::Sent))
}

/// Replace every case-insensitive occurrence of `placeholder` with `name`.
pub fn render_message(copy: &str, placeholder: &str, name: &str) -> String {
    if placeholder.is_empty() {
        return copy.to_string();
    }
    match RegexBuilder::new(&regex::escape(placeholder))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re.replace_all(copy, regex::NoExpand(name)).into_owned(),
        Err(_) => copy.replace(placeholder, name),
    }
}

/// What the messaging channel receives for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub address: String,
    pub text: String,
}

impl Outbound {
    pub fn channel_url(&self, base_url: &str) -> String {
        format!(
            "{}{}?text={}",
            base_url,
            self.address,
            urlencoding::encode(&self.text)
        )
    }
}

/// Build the outbound message for a pending lead.
pub fn prepare(lead: &Lead, base: &LeadBase, placeholder: &str) -> Result<Outbound, LeadError> {
    if !can_transition(lead.status, LeadStatus::Sent) {
        return Err(LeadError::AlreadyDispatched {
            lead_id: lead.id.clone(),
        });
    }
    Ok(Outbound {
        address: lead.phone.clone(),
        text: render_message(&base.copy, placeholder, &lead.name),
    })
}

/// The PENDING -> SENT transition. `sent_at` is written exactly once.
pub fn mark_sent(lead: &Lead, now: i64) -> Result<Lead, LeadError> {
    if !can_transition(lead.status, LeadStatus::Sent) {
        return Err(LeadError::AlreadyDispatched {
            lead_id: lead.id.clone(),
        });
    }
    Ok(Lead {
        status: LeadStatus::Sent,
        sent_at: Some(now),
        ..lead.clone()
    })
}

/// External hand-off for a prepared message. Fire-and-forget.
pub trait MessagingChannel: Send + Sync {
    fn deliver(&self, outbound: &Outbound) -> Result<()>;
}

/// Opens the messaging link in the user's default browser.
pub struct BrowserChannel {
    pub base_url: String,
}

impl MessagingChannel for BrowserChannel {
    fn deliver(&self, outbound: &Outbound) -> Result<()> {
        let url = outbound.channel_url(&self.base_url);
        info!("Opening messaging link for {}", outbound.address);
        open::that(&url)
            .map_err(|e| anyhow::anyhow!("Could not open messaging link {}: {}", url, e))
    }
}

/// Prints the messaging link instead of opening it.
pub struct PrintChannel {
    pub base_url: String,
}

impl MessagingChannel for PrintChannel {
    fn deliver(&self, outbound: &Outbound) -> Result<()> {
        crate::core::terminal::print_link("Message link", &outbound.channel_url(&self.base_url));
        Ok(())
    }
}
