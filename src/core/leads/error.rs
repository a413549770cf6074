use thiserror::Error;

/// Failures raised by the lead engine. Everything except `Validation` is fatal
/// to the operation that produced it and leaves the collection untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeadError {
    #[error("row {row} skipped: {reason}")]
    Validation { row: usize, reason: String },
    #[error(
        "no recognizable header: expected a name column ({expected_name}) and a phone column ({expected_phone}); add a header row or pass --legacy-layout for the fixed name/label/phone layout"
    )]
    HeaderDetection {
        expected_name: String,
        expected_phone: String,
    },
    #[error("no active agents: activate at least one agent before importing leads")]
    NoEligibleAgents,
    #[error("campaign '{base}' has no leads to export: import leads into it first")]
    EmptyExport { base: String },
    #[error("lead '{lead_id}' was already dispatched; nothing to do")]
    AlreadyDispatched { lead_id: String },
    #[error("campaign '{id}' not found: select a campaign first (see 'leadrelay base list')")]
    CampaignNotFound { id: String },
    #[error("more than one campaign is named '{name}': select it by id instead")]
    AmbiguousCampaign { name: String },
    #[error("lead '{id}' not found: check your queue with 'leadrelay queue'")]
    LeadNotFound { id: String },
    #[error("agent '{id}' not found: see 'leadrelay agent list'")]
    AgentNotFound { id: String },
    #[error("'{id}' is not an agent profile; only agents can be activated or deactivated")]
    NotAnAgent { id: String },
    #[error("lead '{lead_id}' is assigned to another agent")]
    NotLeadOwner { lead_id: String },
    #[error("no valid leads found in the input: each row needs a name and a phone with at least 8 digits")]
    EmptyBatch,
    #[error("missing {0}: provide it and try again")]
    MissingField(&'static str),
}
