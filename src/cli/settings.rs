use anyhow::{Result, bail};

use super::{AppContext, first_positional, flag_value};
use crate::core::config::CONFIG_FILE;
use crate::core::leads::types::Role;
use crate::core::terminal::{GuideSection, print_success};
use crate::core::vault::{GEMINI_API_KEY, GEMINI_API_KEY_ENV};

pub async fn run_config(ctx: &AppContext, args: &[String]) -> Result<()> {
    match args.get(2).map(String::as_str) {
        Some("set-key") => run_set_key(ctx, args).await,
        Some("show") | None => run_show(ctx).await,
        Some(other) => bail!("Unknown config command '{}'. Use 'show' or 'set-key'.", other),
    }
}

async fn run_show(ctx: &AppContext) -> Result<()> {
    let config = &ctx.config;
    let vault = ctx.vault().await?;
    let names = vault.names().await?;
    let api_key = if names.iter().any(|n| n == GEMINI_API_KEY) {
        "stored in vault"
    } else if vault.gemini_api_key().await?.is_some() {
        "from environment"
    } else {
        "not set (default copies only)"
    };

    GuideSection::new("Settings")
        .status("Data dir", &ctx.data_dir.display().to_string())
        .status("Config file", &ctx.data_dir.join(CONFIG_FILE).display().to_string())
        .status("Placeholder", &config.placeholder)
        .status("Channel URL", &config.channel_base_url)
        .status("UTC offset", &format!("{} min", config.utc_offset_minutes))
        .status("Timestamps", &config.timestamp_format)
        .status("Legacy sheets", if config.legacy_sheet_layout { "yes" } else { "no" })
        .status("Copy model", &config.copy.model)
        .status("Gemini key", api_key)
        .status(
            "Vault",
            &if names.is_empty() {
                "empty".to_string()
            } else {
                names.join(", ")
            },
        )
        .print();
    GuideSection::new("Secrets")
        .hint("leadrelay config set-key gemini_api_key", "")
        .info(&format!("{} is used when no key is stored.", GEMINI_API_KEY_ENV))
        .print();
    println!();
    Ok(())
}

async fn run_set_key(ctx: &AppContext, args: &[String]) -> Result<()> {
    ctx.require_role(Role::Admin).await?;
    let Some(name) = first_positional(args, 3) else {
        bail!("Usage: leadrelay config set-key <name> [--value <secret>]");
    };
    let value = match flag_value(args, 3, &["--value"]) {
        Some(v) => v,
        None => inquire::Password::new(&format!("Value for {}:", name))
            .without_confirmation()
            .with_help_message("Leave empty to remove the stored value")
            .prompt()?,
    };

    let vault = ctx.vault().await?;
    if value.trim().is_empty() {
        if vault.remove(&name).await? {
            print_success(&format!("Removed '{}' from the vault.", name));
        } else {
            print_success(&format!("'{}' was not stored.", name));
        }
    } else {
        vault.set(&name, value.trim()).await?;
        print_success(&format!("Stored '{}' in the vault.", name));
    }
    Ok(())
}
