use anyhow::Result;
use clap::Args;
use datum_core::{OutputMode, runtime};
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli;
use crate::ctx::Ctx;
use crate::output;

#[derive(Debug, Clone, Args)]
pub struct ListArg {}

#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Publisher")]
    publisher: String,
    #[tabled(rename = "Sources")]
    sources: usize,
}

/// Exit 0 always; an empty registry is not an error.
pub fn cmd_list(ctx: &Ctx, _arg: &ListArg) -> Result<i32> {
    let cfg = match cli::load_config(ctx) {
        Ok(cfg) => cfg,
        Err(code) => return Ok(code),
    };
    let registry = match ctx.open_registry(&cfg) {
        Ok(registry) => registry,
        Err(err) => {
            output::error_line(&format!("{err:#}"));
            return Ok(2);
        }
    };

    let packages = match runtime::block_on(registry.list(None)) {
        Ok(packages) => packages,
        Err(err) => {
            if ctx.output == OutputMode::Json {
                output::print_json(&json!({"error": format!("{err:#}")}));
            } else {
                output::error_line(&format!("{err:#}"));
            }
            return Ok(2);
        }
    };

    if ctx.output == OutputMode::Json {
        output::print_json(&serde_json::to_value(&packages)?);
        return Ok(0);
    }

    if ctx.quiet {
        return Ok(0);
    }

    if packages.is_empty() {
        println!();
        if registry.is_remote() {
            println!("  {}", output::muted("No datasets found."));
        } else {
            println!("  {}", output::muted("No datasets in local registry."));
            println!("  Run {} to add one.", output::bold("datum publish"));
        }
        println!();
        return Ok(0);
    }

    let location = if registry.is_remote() {
        registry.location()
    } else {
        "local registry".to_string()
    };

    println!();
    println!(
        "  {} dataset(s) in {location}",
        output::bold(&packages.len().to_string()),
    );
    println!();

    let rows: Vec<ListRow> = packages
        .iter()
        .map(|pkg| ListRow {
            id: pkg.id.clone(),
            version: pkg.version.clone(),
            title: pkg.title.clone(),
            publisher: pkg.publisher.name.clone(),
            sources: pkg.sources.len(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::blank());
    println!("{table}");
    println!();

    Ok(0)
}
