use anyhow::{Context, Result, bail};
use base64::Engine;
use std::path::Path;
use std::time::Duration;

use super::{AppContext, flag_value, has_flag};
use crate::core::copywriter::{
    CopySuggester, GeminiCopywriter, OfflineCopywriter, Suggestion, SuggestionSource, suggest_copy,
};
use crate::core::leads::types::Role;
use crate::core::terminal::{GuideSection, print_info, print_success, print_warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CopyChoice {
    Text(String),
    Suggest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CreateArgs {
    pub name: String,
    pub copy: CopyChoice,
    pub image: Option<String>,
}

pub(crate) fn parse_create_args(args: &[String]) -> Result<CreateArgs> {
    let Some(name) = flag_value(args, 3, &["--name", "-n"]) else {
        bail!("Usage: leadrelay base create --name <name> (--copy <text> | --suggest) [--image <path>]");
    };
    let copy = match (flag_value(args, 3, &["--copy", "-c"]), has_flag(args, 3, &["--suggest"])) {
        (Some(_), true) => bail!("Pass either --copy or --suggest, not both."),
        (Some(text), false) => CopyChoice::Text(text),
        (None, true) => CopyChoice::Suggest,
        (None, false) => bail!("A message copy is required: pass --copy <text> or --suggest."),
    };
    Ok(CreateArgs {
        name,
        copy,
        image: flag_value(args, 3, &["--image"]),
    })
}

fn image_mime(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    Ok(match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        other => bail!("Unsupported image type '{}': use png, jpg, gif or webp.", other),
    })
}

/// Inline an image file as a `data:` URL.
pub(crate) fn image_data_url(path: &Path) -> Result<String> {
    let mime = image_mime(path)?;
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))?;
    Ok(format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    ))
}

async fn build_suggester(ctx: &AppContext) -> Result<Box<dyn CopySuggester>> {
    let key = ctx.vault().await?.gemini_api_key().await?;
    Ok(match key {
        Some(key) => Box::new(GeminiCopywriter::new(
            key,
            &ctx.config.copy,
            &ctx.config.placeholder,
        )),
        None => Box::new(OfflineCopywriter),
    })
}

async fn draft(ctx: &AppContext, name: &str) -> Result<Suggestion> {
    let suggester = build_suggester(ctx).await?;
    let suggestion = suggest_copy(
        suggester.as_ref(),
        name,
        &ctx.config.placeholder,
        Duration::from_secs(ctx.config.copy.timeout_secs),
    )
    .await;
    match suggestion.source {
        SuggestionSource::Generated => {}
        SuggestionSource::EmptyFallback => print_warn("The generator returned nothing; using a default copy."),
        SuggestionSource::ErrorFallback => {
            print_warn("Copy generation was unavailable; using a default copy (see the log for details).")
        }
    }
    Ok(suggestion)
}

pub async fn run_create(ctx: &AppContext, args: &[String]) -> Result<()> {
    ctx.require_role(Role::Admin).await?;
    let opts = parse_create_args(args)?;
    let image = opts
        .image
        .as_deref()
        .map(|p| image_data_url(Path::new(p)))
        .transpose()?;
    let copy = match opts.copy {
        CopyChoice::Text(text) => text,
        CopyChoice::Suggest => draft(ctx, &opts.name).await?.copy,
    };

    let base = ctx.operations(false).create_base(&opts.name, &copy, image).await?;
    print_success(&format!("Campaign '{}' created ({}).", base.name, base.id));
    GuideSection::new("Message copy").text(&base.copy).print();
    println!();
    Ok(())
}

pub async fn run_list(ctx: &AppContext) -> Result<()> {
    ctx.current_profile().await?;
    let ops = ctx.operations(false);
    let bases = ops.list_bases().await?;
    if bases.is_empty() {
        print_info("No campaigns yet. Create one with 'leadrelay base create'.");
        return Ok(());
    }
    let stats = ops.stats().await?;
    let mut section = GuideSection::new("Campaigns");
    for base in &bases {
        let leads = stats
            .per_campaign
            .iter()
            .find(|c| c.base_id == base.id)
            .map(|c| c.leads)
            .unwrap_or(0);
        let image = if base.image.is_some() { ", image" } else { "" };
        section = section.command(&base.id, &format!("{} ({} leads{})", base.name, leads, image));
    }
    section.print();
    println!();
    Ok(())
}

pub async fn run_suggest(ctx: &AppContext, args: &[String]) -> Result<()> {
    ctx.require_role(Role::Admin).await?;
    let Some(name) = flag_value(args, 3, &["--name", "-n"]) else {
        bail!("Usage: leadrelay base suggest --name <campaign name>");
    };
    let suggestion = draft(ctx, &name).await?;
    GuideSection::new("Suggested copy")
        .text(&suggestion.copy)
        .blank()
        .hint(
            &format!("leadrelay base create --name \"{}\" --copy \"...\"", name),
            "",
        )
        .print();
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn create_requires_exactly_one_copy_source() {
        let ok = parse_create_args(&args(&[
            "leadrelay", "base", "create", "--name", "Promo", "--copy", "Hi [NOME]",
        ]))
        .unwrap();
        assert_eq!(ok.name, "Promo");
        assert_eq!(ok.copy, CopyChoice::Text("Hi [NOME]".to_string()));
        assert_eq!(ok.image, None);

        let suggest = parse_create_args(&args(&[
            "leadrelay", "base", "create", "-n", "Promo", "--suggest", "--image", "a.png",
        ]))
        .unwrap();
        assert_eq!(suggest.copy, CopyChoice::Suggest);
        assert_eq!(suggest.image.as_deref(), Some("a.png"));

        assert!(parse_create_args(&args(&["leadrelay", "base", "create", "--name", "P"])).is_err());
        assert!(parse_create_args(&args(&["leadrelay", "base", "create", "--copy", "x"])).is_err());
        assert!(
            parse_create_args(&args(&[
                "leadrelay", "base", "create", "--name", "P", "--copy", "x", "--suggest",
            ]))
            .is_err()
        );
    }

    #[test]
    fn images_become_data_urls() {
        let mut file = tempfile::Builder::new().suffix(".PNG").tempfile().unwrap();
        file.write_all(&[1, 2, 3]).unwrap();
        let url = image_data_url(file.path()).unwrap();
        assert_eq!(url, "data:image/png;base64,AQID");

        let text = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(image_data_url(text.path()).is_err());
    }
}
