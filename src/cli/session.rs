use anyhow::{Result, bail};

use super::{AppContext, flag_value};
use crate::core::leads::auth::{AuthOutcome, register_or_authenticate};
use crate::core::leads::types::Role;
use crate::core::terminal::{GuideSection, print_info, print_success};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoginArgs {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub(crate) fn parse_login_args(args: &[String]) -> LoginArgs {
    LoginArgs {
        email: flag_value(args, 2, &["--email", "-e"]),
        password: flag_value(args, 2, &["--password", "-p"]),
    }
}

pub async fn run_login(ctx: &AppContext, args: &[String]) -> Result<()> {
    let opts = parse_login_args(args);
    let email = match opts.email {
        Some(e) => e,
        None => inquire::Text::new("E-mail:")
            .with_help_message("Unknown addresses are registered as new agents")
            .prompt()?,
    };
    let password = match opts.password {
        Some(p) => p,
        None => inquire::Password::new("Password:")
            .without_confirmation()
            .prompt()?,
    };
    if password.is_empty() {
        bail!("A password is required to log in.");
    }

    let outcome = register_or_authenticate(ctx.store.as_ref(), &email, &password).await?;
    ctx.store.set_session(&outcome.profile().email).await?;

    match &outcome {
        AuthOutcome::Registered(p) => {
            print_success(&format!("Welcome, {}! Registered as a new agent.", p.name));
        }
        AuthOutcome::Authenticated(p) => {
            print_success(&format!("Logged in as {} ({}).", p.name, p.role.as_str()));
        }
    }
    let profile = outcome.into_profile();
    match profile.role {
        Role::Admin => print_info("Next: 'leadrelay base list' or 'leadrelay stats'."),
        Role::Agent if !profile.active => {
            print_info("Your profile is inactive; an admin must activate it before you receive leads.")
        }
        Role::Agent => print_info("Next: 'leadrelay queue' to see your leads."),
    }
    Ok(())
}

pub async fn run_logout(ctx: &AppContext) -> Result<()> {
    if ctx.store.clear_session().await? {
        print_success("Logged out.");
    } else {
        print_info("No active session.");
    }
    Ok(())
}

pub async fn run_whoami(ctx: &AppContext) -> Result<()> {
    let profile = ctx.current_profile().await?;
    GuideSection::new("Session")
        .status("Name", &profile.name)
        .status("E-mail", &profile.email)
        .status("Role", profile.role.as_str())
        .status("Id", &profile.id)
        .status("Active", if profile.active { "yes" } else { "no" })
        .print();
    println!();
    Ok(())
}
