use anyhow::Result;

use super::AppContext;
use crate::core::leads::types::Role;
use crate::core::terminal::GuideSection;

pub async fn run_stats(ctx: &AppContext) -> Result<()> {
    ctx.require_role(Role::Admin).await?;
    let stats = ctx.operations(false).stats().await?;

    GuideSection::new("Overview")
        .status("Leads", &stats.total.to_string())
        .status("Sent", &stats.sent.to_string())
        .status("Pending", &stats.pending.to_string())
        .status("Conversion", &format!("{:.1}%", stats.conversion_rate))
        .print();

    let mut agents = GuideSection::new("Agents");
    for load in &stats.per_agent {
        let state = if load.active { "" } else { " (inactive)" };
        agents = agents.command(
            &format!("{}{}", load.name, state),
            &format!("{} sent, {} pending", load.sent, load.pending),
        );
    }
    if stats.per_agent.is_empty() {
        agents = agents.text("No agents yet.");
    }
    agents.print();

    let mut campaigns = GuideSection::new("Campaigns");
    for campaign in &stats.per_campaign {
        campaigns = campaigns.command(&campaign.name, &format!("{} leads", campaign.leads));
    }
    if stats.per_campaign.is_empty() {
        campaigns = campaigns.text("No campaigns yet.");
    }
    campaigns.print();
    println!();
    Ok(())
}
