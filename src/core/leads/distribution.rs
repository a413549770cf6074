use super::error::LeadError;
use super::normalizer::Candidate;
use super::types::{Lead, LeadStatus, Profile};

/// Assign candidate `i` to `agents[i % agents.len()]`.
///
/// The rotation starts at the first agent on every call. `next_id` is asked for
/// one fresh id per produced lead, in input order. Nothing is produced when
/// `agents` is empty.
pub fn distribute<F>(
    candidates: Vec<Candidate>,
    base_id: &str,
    agents: &[&Profile],
    created_at: i64,
    mut next_id: F,
) -> Result<Vec<Lead>, LeadError>
where
    F: FnMut(usize) -> String,
{
    if agents.is_empty() {
        return Err(LeadError::NoEligibleAgents);
    }

    let leads = candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| Lead {
            id: next_id(index),
            base_id: base_id.to_string(),
            seller_id: agents[index % agents.len()].id.clone(),
            name: candidate.name,
            phone: candidate.phone,
            status: LeadStatus::Pending,
            sent_at: None,
            created_at,
        })
        .collect();
    Ok(leads)
}

pub fn fresh_lead_id(_index: usize) -> String {
    format!("lead-{}", uuid::Uuid::new_v4().simple())
}

/// How many leads each agent received, in agent order.
pub fn load_per_agent(leads: &[Lead], agents: &[&Profile]) -> Vec<(String, usize)> {
    agents
        .iter()
        .map(|a| {
            let count = leads.iter().filter(|l| l.seller_id == a.id).count();
            (a.name.clone(), count)
        })
        .collect()
}
