use anyhow::Result;
use clap::Args;
use datum_core::{OutputMode, format_size, runtime};
use datum_registry::{is_valid_id, parse_identifier};
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli;
use crate::ctx::Ctx;
use crate::output;

#[derive(Debug, Clone, Args)]
pub struct InfoArg {
    /// Dataset identifier (publisher/namespace/dataset[:version])
    pub identifier: String,
}

#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Checksum")]
    checksum: String,
}

/// Exit codes: 0 success, 1 not found or bad identifier, 2 registry
/// unreachable.
pub fn cmd_info(ctx: &Ctx, arg: &InfoArg) -> Result<i32> {
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

    let (id, version) = parse_identifier(&arg.identifier);

    if !is_valid_id(id) {
        if ctx.output == OutputMode::Json {
            output::print_json(&json!({
                "error": format!("Invalid identifier format: {id:?}"),
            }));
        } else {
            output::error_line(&format!(
                "Invalid identifier: {}\n\n  Expected {} \
                 (e.g. met.no/weather/oslo-hourly)",
                output::bold(id),
                output::bold("publisher/namespace/dataset"),
            ));
        }
        return Ok(1);
    }

    let resolved = runtime::block_on(async {
        match version {
            Some(v) if v != "latest" => registry.get(id, v).await,
            _ => registry.latest(id).await,
        }
    });

    let pkg = match resolved {
        Ok(Some(pkg)) => pkg,
        Ok(None) => {
            let label = format!("{id}:{}", version.unwrap_or("latest"));
            if ctx.output == OutputMode::Json {
                output::print_json(&json!({"error": format!("Not found: {label}")}));
            } else {
                let mut message = format!(
                    "Dataset {} not found in the registry.\n",
                    output::bold(&label)
                );
                let suggestions = runtime::block_on(registry.suggest(id));
                if !suggestions.is_empty() {
                    message.push_str("\n  Did you mean?\n");
                    for suggestion in suggestions {
                        message.push_str(&format!("    {suggestion}\n"));
                    }
                }
                output::error_line(&message);
            }
            return Ok(1);
        }
        Err(err) => {
            output::error_line(&format!("{err:#}"));
            return Ok(2);
        }
    };

    if ctx.output == OutputMode::Json {
        output::print_json(&serde_json::to_value(&pkg)?);
        return Ok(0);
    }

    if ctx.quiet {
        return Ok(0);
    }

    println!();
    println!(
        "  {}  {}",
        output::bold(&pkg.id),
        output::muted(&format!("@{}", pkg.version)),
    );
    println!("  {}", output::bold(&pkg.title));
    println!();

    let mut publisher = pkg.publisher.name.clone();
    if let Some(url) = &pkg.publisher.url {
        publisher.push_str(&format!("  {}", output::muted(url)));
    }
    print_field("Publisher", &publisher);
    if let Some(description) = &pkg.description {
        print_field("Description", description);
    }
    if let Some(license) = &pkg.license {
        print_field("License", license);
    }
    if let Some(tags) = &pkg.tags {
        print_field("Tags", &tags.join("  "));
    }
    if let Some(created) = &pkg.created {
        print_field("Created", created);
    }
    if let Some(updated) = &pkg.updated {
        print_field("Updated", updated);
    }
    println!();

    println!("  {} ({})", output::bold("Sources"), pkg.sources.len());
    println!();

    let rows: Vec<SourceRow> = pkg
        .sources
        .iter()
        .map(|source| SourceRow {
            url: source.url.clone(),
            format: source.format.clone(),
            size: source.size.map(format_size).unwrap_or_else(|| "—".to_string()),
            checksum: source.checksum.clone().unwrap_or_else(|| "—".to_string()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::blank());
    println!("{table}");
    println!();

    Ok(0)
}

fn print_field(key: &str, value: &str) {
    println!("  {:<14} {value}", output::bold(key));
}
