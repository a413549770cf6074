use anyhow::{Result, bail};

use super::{AppContext, first_positional};
use crate::core::leads::types::Role;
use crate::core::terminal::{GuideSection, print_info, print_success};

pub async fn run_list(ctx: &AppContext) -> Result<()> {
    ctx.require_role(Role::Admin).await?;
    let agents = ctx.operations(false).list_agents().await?;
    if agents.is_empty() {
        print_info("No agents yet. Agents register by running 'leadrelay login' with their e-mail.");
        return Ok(());
    }
    let mut section = GuideSection::new("Agents");
    for agent in &agents {
        let state = if agent.active { "active" } else { "inactive" };
        section = section.command(
            &agent.id,
            &format!("{} <{}> {}", agent.name, agent.email, state),
        );
    }
    section.print();
    println!();
    Ok(())
}

pub async fn run_toggle(ctx: &AppContext, args: &[String]) -> Result<()> {
    ctx.require_role(Role::Admin).await?;
    let Some(key) = first_positional(args, 3) else {
        bail!("Usage: leadrelay agent toggle <agent-id|email>");
    };
    let agent = ctx.operations(false).toggle_agent(&key).await?;
    if agent.active {
        print_success(&format!("{} is active and will receive new leads.", agent.name));
    } else {
        print_success(&format!(
            "{} is inactive; their existing leads stay assigned.",
            agent.name
        ));
    }
    Ok(())
}
