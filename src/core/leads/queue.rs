use std::cmp::Reverse;

use super::types::{Collection, Lead, LeadStatus};

pub const UNKNOWN_CAMPAIGN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub lead: Lead,
    pub campaign: String,
}

/// One agent's work list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentQueue {
    /// Newest imports first.
    pub pending: Vec<QueueEntry>,
    /// Most recently dispatched first.
    pub sent: Vec<QueueEntry>,
}

impl AgentQueue {
    pub fn next_pending(&self) -> Option<&QueueEntry> {
        self.pending.first()
    }
}

pub fn agent_queue(collection: &Collection, agent_id: &str) -> AgentQueue {
    let entry = |lead: &Lead| QueueEntry {
        lead: lead.clone(),
        campaign: collection
            .find_base(&lead.base_id)
            .map(|b| b.name.clone())
            .unwrap_or_else(|| UNKNOWN_CAMPAIGN.to_string()),
    };

    let mut queue = AgentQueue::default();
    for lead in collection.leads_for_agent(agent_id) {
        match lead.status {
            LeadStatus::Pending => queue.pending.push(entry(lead)),
            LeadStatus::Sent => queue.sent.push(entry(lead)),
        }
    }
    // Stable sorts keep import order among leads of the same batch.
    queue.pending.sort_by_key(|e| Reverse(e.lead.created_at));
    queue.sent.sort_by_key(|e| Reverse(e.lead.sent_at));
    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::leads::types::LeadBase;

    fn lead(id: &str, base: &str, created_at: i64, sent_at: Option<i64>) -> Lead {
        Lead {
            id: id.into(),
            base_id: base.into(),
            seller_id: "a".into(),
            name: id.into(),
            phone: "11999990000".into(),
            status: if sent_at.is_some() {
                LeadStatus::Sent
            } else {
                LeadStatus::Pending
            },
            sent_at,
            created_at,
        }
    }

    #[test]
    fn queue_is_sorted_and_joined_with_campaign() {
        let collection = Collection {
            profiles: vec![],
            bases: vec![LeadBase {
                id: "b1".into(),
                name: "Launch".into(),
                copy: "Hi".into(),
                image: None,
                created_at: 0,
            }],
            leads: vec![
                lead("old", "b1", 1, None),
                lead("new", "b1", 9, None),
                lead("first-sent", "b1", 1, Some(10)),
                lead("last-sent", "gone", 1, Some(20)),
                Lead {
                    seller_id: "someone-else".into(),
                    ..lead("foreign", "b1", 50, None)
                },
            ],
        };

        let queue = agent_queue(&collection, "a");
        let pending: Vec<_> = queue.pending.iter().map(|e| e.lead.id.as_str()).collect();
        let sent: Vec<_> = queue.sent.iter().map(|e| e.lead.id.as_str()).collect();
        assert_eq!(pending, vec!["new", "old"]);
        assert_eq!(sent, vec!["last-sent", "first-sent"]);
        assert_eq!(queue.pending[0].campaign, "Launch");
        assert_eq!(queue.sent[0].campaign, UNKNOWN_CAMPAIGN);
        assert_eq!(queue.next_pending().map(|e| e.lead.id.as_str()), Some("new"));
    }

    #[test]
    fn agent_without_leads_has_empty_queue() {
        let queue = agent_queue(&Collection::default(), "a");
        assert!(queue.pending.is_empty() && queue.sent.is_empty());
        assert!(queue.next_pending().is_none());
    }
}
