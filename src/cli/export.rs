use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use super::{AppContext, flag_value};
use crate::core::codec::{self, SheetFormat};
use crate::core::leads::export::to_table;
use crate::core::leads::types::Role;
use crate::core::terminal::print_success;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExportArgs {
    pub base: String,
    pub format: Option<String>,
    pub out: Option<PathBuf>,
}

pub(crate) fn parse_export_args(args: &[String]) -> Result<ExportArgs> {
    let Some(base) = flag_value(args, 2, &["--base", "-b"]) else {
        bail!("Usage: leadrelay export --base <campaign> [--format csv|xlsx|ods|xml] [--out <path>]");
    };
    Ok(ExportArgs {
        base,
        format: flag_value(args, 2, &["--format"]),
        out: flag_value(args, 2, &["--out", "-o"]).map(PathBuf::from),
    })
}

/// `--format` wins, then the output extension, then csv.
pub(crate) fn resolve_format(format: Option<&str>, out: Option<&Path>) -> Result<SheetFormat> {
    match (format, out) {
        (Some(name), _) => SheetFormat::from_name(name),
        (None, Some(path)) if path.extension().is_some() => SheetFormat::from_path(path),
        _ => Ok(SheetFormat::Csv),
    }
}

pub(crate) fn slug(name: &str) -> String {
    let mut out = String::new();
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let out = out.trim_matches('-').to_string();
    if out.is_empty() { "campaign".to_string() } else { out }
}

pub async fn run_export(ctx: &AppContext, args: &[String]) -> Result<()> {
    ctx.require_role(Role::Admin).await?;
    let opts = parse_export_args(args)?;
    let format = resolve_format(opts.format.as_deref(), opts.out.as_deref())?;

    let bundle = ctx.operations(false).export(&opts.base).await?;
    let bytes = codec::encode(format, &to_table(&bundle.rows), &bundle.base.name)?;
    let out = opts.out.unwrap_or_else(|| {
        PathBuf::from(format!("{}-leads.{}", slug(&bundle.base.name), format.extension()))
    });
    std::fs::write(&out, bytes).with_context(|| format!("Failed to write {}", out.display()))?;

    print_success(&format!(
        "Exported {} leads from '{}' to {}",
        bundle.rows.len(),
        bundle.base.name,
        out.display()
    ));
    Ok(())
}
