use anyhow::{Result, bail};

use super::{AppContext, first_positional, has_flag};
use crate::core::leads::dispatch::{BrowserChannel, MessagingChannel, PrintChannel};
use crate::core::leads::operations::DispatchReceipt;
use crate::core::leads::types::Role;
use crate::core::terminal::{GuideSection, print_info, print_success};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    Lead(String),
    Next,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DispatchArgs {
    pub target: Target,
    pub open_browser: bool,
}

pub(crate) fn parse_dispatch_args(args: &[String]) -> Result<DispatchArgs> {
    let next = has_flag(args, 2, &["--next"]);
    let target = match (first_positional(args, 2), next) {
        (Some(_), true) => bail!("Pass either a lead id or --next, not both."),
        (Some(id), false) => Target::Lead(id),
        (None, true) => Target::Next,
        (None, false) => bail!("Usage: leadrelay dispatch (<lead-id> | --next) [--no-open]"),
    };
    Ok(DispatchArgs {
        target,
        open_browser: !has_flag(args, 2, &["--no-open"]),
    })
}

pub async fn run_queue(ctx: &AppContext) -> Result<()> {
    let agent = ctx.require_role(Role::Agent).await?;
    let queue = ctx.operations(false).queue(&agent.id).await?;
    if !agent.active {
        print_info("Your profile is inactive: you keep your leads but receive no new ones.");
    }

    let mut pending = GuideSection::new(&format!("Pending ({})", queue.pending.len()));
    for entry in &queue.pending {
        pending = pending.command(
            &entry.lead.id,
            &format!("{} {} [{}]", entry.lead.name, entry.lead.phone, entry.campaign),
        );
    }
    if queue.pending.is_empty() {
        pending = pending.text("Nothing to send.");
    }
    pending.print();

    let mut sent = GuideSection::new(&format!("Sent ({})", queue.sent.len()));
    for entry in &queue.sent {
        sent = sent.command(
            &entry.lead.id,
            &format!("{} {} [{}]", entry.lead.name, entry.lead.phone, entry.campaign),
        );
    }
    sent.print();

    if let Some(next) = queue.next_pending() {
        GuideSection::new("Next")
            .hint(&format!("leadrelay dispatch {}", next.lead.id), "")
            .print();
    }
    println!();
    Ok(())
}

fn report(receipt: &DispatchReceipt) {
    print_success(&format!(
        "{} ({}) marked as sent.",
        receipt.lead.name, receipt.lead.phone
    ));
}

pub async fn run_dispatch(ctx: &AppContext, args: &[String]) -> Result<()> {
    let agent = ctx.require_role(Role::Agent).await?;
    let opts = parse_dispatch_args(args)?;
    let base_url = ctx.config.channel_base_url.clone();
    let channel: Box<dyn MessagingChannel> = if opts.open_browser {
        Box::new(BrowserChannel { base_url })
    } else {
        Box::new(PrintChannel { base_url })
    };

    let ops = ctx.operations(false);
    match opts.target {
        Target::Lead(id) => report(&ops.dispatch(&agent, &id, channel.as_ref()).await?),
        Target::Next => match ops.dispatch_next(&agent, channel.as_ref()).await? {
            Some(receipt) => report(&receipt),
            None => print_info("Your queue is empty. Nothing to dispatch."),
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lead_id_or_next() {
        let opts = parse_dispatch_args(&args(&["leadrelay", "dispatch", "lead-1"])).unwrap();
        assert_eq!(opts.target, Target::Lead("lead-1".to_string()));
        assert!(opts.open_browser);

        let opts =
            parse_dispatch_args(&args(&["leadrelay", "dispatch", "--next", "--no-open"])).unwrap();
        assert_eq!(opts.target, Target::Next);
        assert!(!opts.open_browser);

        assert!(parse_dispatch_args(&args(&["leadrelay", "dispatch"])).is_err());
        assert!(parse_dispatch_args(&args(&["leadrelay", "dispatch", "l1", "--next"])).is_err());
    }
}
