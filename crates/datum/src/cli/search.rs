use anyhow::Result;
use clap::Args;
use datum_core::{OutputMode, runtime};
use datum_registry::{DataPackage, Registry};
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli;
use crate::ctx::Ctx;
use crate::output;

#[derive(Debug, Clone, Args)]
pub struct SearchArg {
    /// Keyword to search for
    pub query: String,
}

#[derive(Tabled)]
struct SearchRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Publisher")]
    publisher: String,
}

/// Case-insensitive match over id, title, description, tags, and
/// publisher name. Exit 0 always; no matches is not an error.
pub fn cmd_search(ctx: &Ctx, arg: &SearchArg) -> Result<i32> {
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

    // remote registries filter server-side via ?q=
    let listed = runtime::block_on(async {
        match &registry {
            Registry::Remote(_) => registry.list(Some(&arg.query)).await,
            Registry::Local(_) => registry.list(None).await,
        }
    });
    let matches: Vec<DataPackage> = match listed {
        Ok(packages) => {
            if registry.is_remote() {
                packages
            } else {
                packages
                    .into_iter()
                    .filter(|pkg| matches_query(pkg, &arg.query))
                    .collect()
            }
        }
        Err(err) => {
            if ctx.output == OutputMode::Json {
                output::print_json(&json!([]));
            } else {
                output::error_line(&format!("{err:#}"));
            }
            return Ok(2);
        }
    };

    if ctx.output == OutputMode::Json {
        output::print_json(&serde_json::to_value(&matches)?);
        return Ok(0);
    }

    if ctx.quiet {
        return Ok(0);
    }

    if matches.is_empty() {
        println!();
        println!(
            "  {} {}.",
            output::muted("No datasets found matching"),
            output::bold(&format!("{:?}", arg.query)),
        );
        println!();
        return Ok(0);
    }

    println!();
    println!(
        "  {} result(s) for {}",
        output::bold(&matches.len().to_string()),
        output::bold(&format!("{:?}", arg.query)),
    );
    println!();

    let rows: Vec<SearchRow> = matches
        .iter()
        .map(|pkg| SearchRow {
            id: pkg.id.clone(),
            version: pkg.version.clone(),
            title: pkg.title.clone(),
            publisher: pkg.publisher.name.clone(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::blank());
    println!("{table}");
    println!();

    Ok(0)
}

fn matches_query(pkg: &DataPackage, query: &str) -> bool {
    let q = query.to_lowercase();
    let mut fields = vec![
        pkg.id.clone(),
        pkg.title.clone(),
        pkg.publisher.name.clone(),
    ];
    if let Some(description) = &pkg.description {
        fields.push(description.clone());
    }
    if let Some(tags) = &pkg.tags {
        fields.push(tags.join(" "));
    }
    fields.iter().any(|field| field.to_lowercase().contains(&q))
}
