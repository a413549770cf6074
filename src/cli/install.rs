use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use super::{AppContext, flag_value, has_flag};
use crate::core::config::{AppConfig, CONFIG_FILE};
use crate::core::leads::seed::{DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_NAME, ensure_admin, seed_demo};
use crate::core::store::CollectionStore;
use crate::core::terminal::{self, GuideSection, print_info, print_status, print_step, print_success};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InstallArgs {
    pub admin_email: String,
    pub admin_name: String,
    pub demo: bool,
}

pub(crate) fn parse_install_args(args: &[String]) -> InstallArgs {
    InstallArgs {
        admin_email: flag_value(args, 2, &["--admin-email"])
            .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
        admin_name: flag_value(args, 2, &["--admin-name"])
            .unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
        demo: has_flag(args, 2, &["--demo"]),
    }
}

pub async fn run_install(args: &[String], data_dir: PathBuf) -> Result<()> {
    let opts = parse_install_args(args);
    terminal::print_banner();
    print_step("Setting up leadrelay");

    let ctx = AppContext::open(data_dir).await?;
    let mut collection = ctx.store.read().await?;
    let admin = ensure_admin(&mut collection, &opts.admin_email, &opts.admin_name)?;
    if opts.demo {
        seed_demo(&mut collection);
        print_info("Demo agents, campaign and leads added.");
    }
    ctx.store.write(&collection).await?;
    info!("Install complete for admin {}", admin.email);

    let config_path = ctx.data_dir.join(CONFIG_FILE);
    if config_path.exists() {
        print_info(&format!("Keeping existing {}", config_path.display()));
    } else {
        AppConfig::default().save(&ctx.data_dir).await?;
        print_success(&format!("Wrote default settings to {}", config_path.display()));
    }

    print_success("leadrelay is ready.");
    print_status("Data dir", &ctx.data_dir.display().to_string());
    GuideSection::new("Next steps")
        .status("Admin", &format!("{} <{}>", admin.name, admin.email))
        .blank()
        .hint(
            &format!("leadrelay login --email {}", admin.email),
            "choose the admin password on first login",
        )
        .hint("leadrelay base create --name <campaign> --copy \"Hi [NOME]!\"", "")
        .hint("leadrelay import --base <campaign> --file leads.csv", "")
        .info("Agents register themselves by logging in with their own e-mail.")
        .print();
    println!();
    Ok(())
}
