use anyhow::{Context, Result, bail};
use std::io::Read;
use std::path::Path;

use super::{AppContext, flag_value, has_flag};
use crate::core::codec;
use crate::core::leads::ImportSource;
use crate::core::leads::types::Role;
use crate::core::terminal::{GuideSection, print_success, print_warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InputArg {
    File(String),
    Text(String),
    Stdin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportArgs {
    pub base: String,
    pub input: InputArg,
    pub legacy_layout: bool,
}

pub(crate) fn parse_import_args(args: &[String]) -> Result<ImportArgs> {
    const USAGE: &str =
        "Usage: leadrelay import --base <campaign> (--file <path> [--legacy-layout] | --text <lines> | --stdin)";
    let Some(base) = flag_value(args, 2, &["--base", "-b"]) else {
        bail!(USAGE);
    };
    let file = flag_value(args, 2, &["--file", "-f"]);
    let text = flag_value(args, 2, &["--text", "-t"]);
    let stdin = has_flag(args, 2, &["--stdin"]);
    let input = match (file, text, stdin) {
        (Some(path), None, false) => InputArg::File(path),
        (None, Some(text), false) => InputArg::Text(text),
        (None, None, true) => InputArg::Stdin,
        (None, None, false) => bail!(USAGE),
        _ => bail!("Pass only one of --file, --text or --stdin."),
    };
    Ok(ImportArgs {
        base,
        input,
        legacy_layout: has_flag(args, 2, &["--legacy-layout"]),
    })
}

fn read_source(input: &InputArg) -> Result<ImportSource> {
    Ok(match input {
        InputArg::File(path) => ImportSource::Sheet(codec::decode_path(Path::new(path))?),
        InputArg::Text(text) => ImportSource::Text(text.clone()),
        InputArg::Stdin => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read leads from stdin")?;
            ImportSource::Text(text)
        }
    })
}

pub async fn run_import(ctx: &AppContext, args: &[String]) -> Result<()> {
    ctx.require_role(Role::Admin).await?;
    let opts = parse_import_args(args)?;
    let source = read_source(&opts.input)?;
    let report = ctx
        .operations(opts.legacy_layout)
        .import_batch(&opts.base, source)
        .await?;

    print_success(&format!(
        "Imported {} leads into '{}'.",
        report.leads.len(),
        report.base.name
    ));
    let mut loads = GuideSection::new("Distribution");
    for (agent, count) in &report.loads {
        loads = loads.status(agent, &count.to_string());
    }
    loads.print();
    println!();

    if !report.rejected.is_empty() {
        print_warn(&format!("{} rows skipped:", report.rejected.len()));
        for rejection in &report.rejected {
            println!("    row {}: {}", rejection.row, rejection.reason);
        }
    }
    Ok(())
}
