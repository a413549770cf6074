use serde::Serialize;

use super::types::{Collection, LeadStatus, Role};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentLoad {
    pub agent_id: String,
    pub name: String,
    pub active: bool,
    pub sent: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignCount {
    pub base_id: String,
    pub name: String,
    pub leads: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    pub sent: usize,
    pub pending: usize,
    /// Percentage of leads already dispatched, one decimal place.
    pub conversion_rate: f64,
    pub per_agent: Vec<AgentLoad>,
    pub per_campaign: Vec<CampaignCount>,
}

pub fn conversion_rate(sent: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = sent as f64 / total as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

pub fn dashboard(collection: &Collection) -> DashboardStats {
    let total = collection.leads.len();
    let sent = collection
        .leads
        .iter()
        .filter(|l| l.status == LeadStatus::Sent)
        .count();

    let per_agent = collection
        .profiles
        .iter()
        .filter(|p| p.role == Role::Agent)
        .map(|p| {
            let (sent, pending) =
                collection
                    .leads_for_agent(&p.id)
                    .fold((0, 0), |(s, q), lead| match lead.status {
                        LeadStatus::Sent => (s + 1, q),
                        LeadStatus::Pending => (s, q + 1),
                    });
            AgentLoad {
                agent_id: p.id.clone(),
                name: p.name.clone(),
                active: p.active,
                sent,
                pending,
            }
        })
        .collect();

    let per_campaign = collection
        .bases
        .iter()
        .map(|b| CampaignCount {
            base_id: b.id.clone(),
            name: b.name.clone(),
            leads: collection.leads_for_base(&b.id).count(),
        })
        .collect();

    DashboardStats {
        total,
        sent,
        pending: total - sent,
        conversion_rate: conversion_rate(sent, total),
        per_agent,
        per_campaign,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::leads::types::{Lead, LeadBase, Profile};

    fn lead(id: &str, seller: &str, status: LeadStatus) -> Lead {
        Lead {
            id: id.into(),
            base_id: "b1".into(),
            seller_id: seller.into(),
            name: id.into(),
            phone: "11999990000".into(),
            status,
            sent_at: (status == LeadStatus::Sent).then_some(5),
            created_at: 1,
        }
    }

    #[test]
    fn empty_collection_has_zero_conversion() {
        let stats = dashboard(&Collection::default());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.conversion_rate, 0.0);
    }

    #[test]
    fn conversion_is_rounded_to_one_decimal() {
        assert_eq!(conversion_rate(1, 3), 33.3);
        assert_eq!(conversion_rate(2, 3), 66.7);
        assert_eq!(conversion_rate(3, 3), 100.0);
    }

    #[test]
    fn counts_are_split_per_agent_and_campaign() {
        let collection = Collection {
            profiles: vec![
                Profile {
                    id: "admin".into(),
                    name: "Admin".into(),
                    email: "admin@example.com".into(),
                    role: Role::Admin,
                    active: true,
                },
                Profile {
                    id: "a".into(),
                    name: "Ana".into(),
                    email: "ana@example.com".into(),
                    role: Role::Agent,
                    active: false,
                },
            ],
            bases: vec![
                LeadBase {
                    id: "b1".into(),
                    name: "Launch".into(),
                    copy: "Hi".into(),
                    image: None,
                    created_at: 0,
                },
                LeadBase {
                    id: "b2".into(),
                    name: "Empty".into(),
                    copy: "Hi".into(),
                    image: None,
                    created_at: 0,
                },
            ],
            leads: vec![
                lead("l1", "a", LeadStatus::Sent),
                lead("l2", "a", LeadStatus::Pending),
                lead("l3", "a", LeadStatus::Pending),
            ],
        };

        let stats = dashboard(&collection);
        assert_eq!((stats.total, stats.sent, stats.pending), (3, 1, 2));
        assert_eq!(stats.conversion_rate, 33.3);
        assert_eq!(stats.per_agent.len(), 1);
        assert_eq!(stats.per_agent[0].sent, 1);
        assert_eq!(stats.per_agent[0].pending, 2);
        assert!(!stats.per_agent[0].active);
        assert_eq!(stats.per_campaign[0].leads, 3);
        assert_eq!(stats.per_campaign[1].leads, 0);
    }
}
