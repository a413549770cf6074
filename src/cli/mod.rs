mod agents;
mod campaigns;
mod dispatch;
mod export;
mod import;
mod install;
mod session;
mod settings;
mod stats;

use anyhow::{Result, anyhow, bail};
use console::style;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::core::leads::Operations;
use crate::core::leads::types::{Profile, Role};
use crate::core::store::{CollectionStore, SqliteStore};
use crate::core::terminal::{self, GuideSection};
use crate::core::vault::SecretsVault;
use crate::platform::{NativePlatform, Platform};

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Setup")
        .command("install", "Create the data directory, admin profile and config")
        .command("login", "Log in (unknown e-mails become new agents)")
        .command("logout", "End the current session")
        .command("whoami", "Show the logged-in profile")
        .command("config", "Show settings or store an API key")
        .print();

    GuideSection::new("Campaigns (admin)")
        .command("base create", "Create a campaign with its message copy")
        .command("base list", "List campaigns")
        .command("base suggest", "Draft a message copy for a campaign name")
        .command("import", "Import leads and distribute them to active agents")
        .command("export", "Export a campaign as csv, xlsx, ods or xml")
        .command("agent list", "List agents and their status")
        .command("agent toggle", "Activate or deactivate an agent")
        .command("stats", "Show dispatch statistics")
        .print();

    GuideSection::new("Outreach (agent)")
        .command("queue", "Show your pending and sent leads")
        .command("dispatch", "Open the message for a lead and mark it as sent")
        .print();

    println!(
        "\n {} {} <command> [subcommand] [--verbose]\n",
        style("Usage:").bold(),
        style("leadrelay").green()
    );
}

/// Value following the first of `names` at or after `start`.
pub(crate) fn flag_value(args: &[String], start: usize, names: &[&str]) -> Option<String> {
    let mut i = start;
    while i < args.len() {
        if names.contains(&args[i].as_str()) {
            return args.get(i + 1).cloned();
        }
        i += 1;
    }
    None
}

pub(crate) fn has_flag(args: &[String], start: usize, names: &[&str]) -> bool {
    args.iter().skip(start).any(|a| names.contains(&a.as_str()))
}

/// First argument at or after `start` that is not a `--flag`.
pub(crate) fn first_positional(args: &[String], start: usize) -> Option<String> {
    args.iter().skip(start).find(|a| !a.starts_with('-')).cloned()
}

/// Drop global flags so subcommand parsers never see them.
pub(crate) fn split_global_flags(args: Vec<String>) -> (Vec<String>, bool) {
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    let rest = args
        .into_iter()
        .filter(|a| a != "--verbose" && a != "-v")
        .collect();
    (rest, verbose)
}

/// Everything a command needs: the opened store, settings and data directory.
pub(crate) struct AppContext {
    pub data_dir: PathBuf,
    pub store: Arc<SqliteStore>,
    pub config: AppConfig,
}

impl AppContext {
    pub async fn open(data_dir: PathBuf) -> Result<Self> {
        let store = Arc::new(SqliteStore::open(&data_dir).await?);
        let config = AppConfig::load(&data_dir).await?;
        Ok(Self {
            data_dir,
            store,
            config,
        })
    }

    /// Open an installed data directory, failing with a hint otherwise.
    pub async fn open_installed(data_dir: PathBuf) -> Result<Self> {
        let ctx = Self::open(data_dir).await?;
        if !ctx.store.is_initialized().await? {
            bail!("leadrelay is not set up yet. Run 'leadrelay install' first.");
        }
        Ok(ctx)
    }

    pub fn operations(&self, legacy_layout: bool) -> Operations {
        let store: Arc<dyn CollectionStore> = self.store.clone();
        Operations::new(store, self.config.engine_settings(legacy_layout))
    }

    pub async fn vault(&self) -> Result<SecretsVault> {
        SecretsVault::open(self.store.get_db()).await
    }

    pub async fn current_profile(&self) -> Result<Profile> {
        let Some(email) = self.store.session().await? else {
            bail!("Not logged in. Run 'leadrelay login --email <you@example.com>' first.");
        };
        let collection = self.store.read().await?;
        collection
            .find_profile_by_email(&email)
            .cloned()
            .ok_or_else(|| {
                anyhow!(
                    "The logged-in profile '{}' no longer exists. Log in again.",
                    email
                )
            })
    }

    pub async fn require_role(&self, role: Role) -> Result<Profile> {
        let profile = self.current_profile().await?;
        if profile.role != role {
            bail!(
                "This command is only available to {} profiles; you are logged in as {} ({}).",
                role.as_str(),
                profile.email,
                profile.role.as_str()
            );
        }
        Ok(profile)
    }
}

pub async fn run_main() -> Result<()> {
    let (args, verbose) = split_global_flags(std::env::args().collect());
    let data_dir = NativePlatform::data_dir();
    crate::logging::init(&data_dir, verbose)?;

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    let cmd = args[1].as_str();
    let sub_cmd = args.get(2).map(String::as_str).unwrap_or("");
    match cmd {
        "install" => install::run_install(&args, data_dir).await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        _ => {
            let ctx = AppContext::open_installed(data_dir).await?;
            match (cmd, sub_cmd) {
                ("login", _) => session::run_login(&ctx, &args).await,
                ("logout", _) => session::run_logout(&ctx).await,
                ("whoami", _) => session::run_whoami(&ctx).await,
                ("base", "create") => campaigns::run_create(&ctx, &args).await,
                ("base", "list") => campaigns::run_list(&ctx).await,
                ("base", "suggest") => campaigns::run_suggest(&ctx, &args).await,
                ("base", _) => {
                    GuideSection::new("leadrelay base")
                        .command("create", "--name <name> (--copy <text> | --suggest) [--image <path>]")
                        .command("list", "List campaigns")
                        .command("suggest", "--name <name>")
                        .print();
                    println!();
                    Ok(())
                }
                ("agent", "list") => agents::run_list(&ctx).await,
                ("agent", "toggle") => agents::run_toggle(&ctx, &args).await,
                ("agent", _) => {
                    GuideSection::new("leadrelay agent")
                        .command("list", "List agents")
                        .command("toggle", "<id|email>")
                        .print();
                    println!();
                    Ok(())
                }
                ("import", _) => import::run_import(&ctx, &args).await,
                ("export", _) => export::run_export(&ctx, &args).await,
                ("queue", _) => dispatch::run_queue(&ctx).await,
                ("dispatch", _) => dispatch::run_dispatch(&ctx, &args).await,
                ("stats", _) => stats::run_stats(&ctx).await,
                ("config", _) => settings::run_config(&ctx, &args).await,
                _ => {
                    print_help();
                    bail!("Unknown command: {}", cmd)
                }
            }
        }
    }
}
