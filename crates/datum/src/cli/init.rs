use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use datum_core::OutputMode;
use datum_registry::{DataPackage, PublisherInfo, Source};
use serde_json::json;

use crate::ctx::Ctx;
use crate::output;

#[derive(Debug, Clone, Args)]
pub struct InitArg {
    /// Dataset identifier (publisher/namespace/dataset)
    #[arg(long)]
    pub id: String,

    /// Human-readable dataset title
    #[arg(long)]
    pub title: String,

    /// Initial version
    #[arg(long, default_value = "0.1.0")]
    pub version: String,

    /// Publisher display name (defaults to the publisher slug)
    #[arg(long)]
    pub publisher: Option<String>,

    /// Short description
    #[arg(long)]
    pub description: Option<String>,

    /// License identifier, e.g. CC-BY-4.0
    #[arg(long)]
    pub license: Option<String>,

    /// Source file URL (repeatable)
    #[arg(long = "source-url", value_name = "URL")]
    pub source_urls: Vec<String>,

    /// Format tag for each --source-url, in order (defaults to the URL extension)
    #[arg(long = "source-format", value_name = "FORMAT")]
    pub source_formats: Vec<String>,

    /// Where to write the file
    #[arg(long, default_value = "datapackage.json")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long, short = 'f')]
    pub force: bool,
}

/// Exit codes: 0 written, 1 invalid metadata or existing file.
pub fn cmd_init(ctx: &Ctx, arg: &InitArg) -> Result<i32> {
    if arg.path.exists() && !arg.force {
        if ctx.output == OutputMode::Json {
            output::print_json(&json!({
                "created": false,
                "error": format!("{} already exists", arg.path.display()),
            }));
        } else {
            output::error_line(&format!(
                "{} already exists.\n\n  Use {} to overwrite.",
                output::bold(&arg.path.display().to_string()),
                output::bold("datum init --force"),
            ));
        }
        return Ok(1);
    }

    let publisher_name = arg
        .publisher
        .clone()
        .unwrap_or_else(|| arg.id.split('/').next().unwrap_or("").to_string());

    let sources = if arg.source_urls.is_empty() {
        // a placeholder source keeps the file a valid starting point
        vec![Source {
            url: "https://example.com/data.csv".to_string(),
            format: "csv".to_string(),
            size: None,
            checksum: None,
        }]
    } else {
        arg.source_urls
            .iter()
            .enumerate()
            .map(|(i, url)| Source {
                url: url.clone(),
                format: arg
                    .source_formats
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format_from_url(url)),
                size: None,
                checksum: None,
            })
            .collect()
    };

    let pkg = DataPackage {
        id: arg.id.clone(),
        version: arg.version.clone(),
        title: arg.title.clone(),
        description: arg.description.clone(),
        license: arg.license.clone(),
        publisher: PublisherInfo {
            name: publisher_name,
            url: None,
        },
        sources,
        tags: None,
        created: None,
        updated: None,
    };

    let issues = pkg.validate();
    if !issues.is_empty() {
        if ctx.output == OutputMode::Json {
            output::print_json(&json!({
                "created": false,
                "errors": issues,
            }));
        } else {
            let mut message = String::from("The generated package is not valid:\n\n");
            for issue in &issues {
                message.push_str(&format!("  {:<24} {}\n", issue.field, issue.message));
            }
            output::error_line(&message);
        }
        return Ok(1);
    }

    let body = serde_json::to_vec_pretty(&pkg)?;
    datum_fs::atomic_write(&arg.path, &body)?;

    if ctx.output == OutputMode::Json {
        output::print_json(&json!({
            "created": true,
            "path": arg.path.display().to_string(),
            "id": pkg.id,
            "version": pkg.version,
        }));
    } else if !ctx.quiet {
        println!();
        output::success_line(&format!(
            "Wrote {}  {}",
            output::bold(&arg.path.display().to_string()),
            output::muted(&format!("({}@{})", pkg.id, pkg.version)),
        ));
        println!(
            "  Validate with {} and publish with {}.",
            output::bold("datum check"),
            output::bold("datum publish"),
        );
        println!();
    }
    Ok(0)
}

fn format_from_url(url: &str) -> String {
    url.rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "csv".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_url() {
        assert_eq!(format_from_url("https://x.org/a/data.CSV"), "csv");
        assert_eq!(format_from_url("https://x.org/a/data.parquet"), "parquet");
        assert_eq!(format_from_url("https://x.org/a/data"), "csv");
    }
}
