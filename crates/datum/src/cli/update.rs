use anyhow::Result;
use clap::Args;
use datum_core::{OutputMode, UpdateCheck, cached_dataset_ids, runtime, scan_updates};
use datum_registry::{is_valid_id, parse_identifier};
use serde_json::json;

use crate::cli;
use crate::cli::pull::pull_resolved;
use crate::ctx::Ctx;
use crate::output;

#[derive(Debug, Clone, Args)]
pub struct UpdateArg {
    /// Dataset identifier without version (omit to update all cached datasets)
    pub identifier: Option<String>,

    /// Re-download even if already at the latest version
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Show what would be updated without downloading
    #[arg(long)]
    pub check: bool,
}

/// Exit codes: 0 on a clean scan (nothing to update is not an error),
/// 1 for a bad identifier, 2 when the registry is unreachable.
pub fn cmd_update(ctx: &Ctx, arg: &UpdateArg) -> Result<i32> {
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

    let cache_root = ctx.cache_root();

    let ids: Vec<String> = match &arg.identifier {
        Some(identifier) => {
            let (id, _) = parse_identifier(identifier);
            if !is_valid_id(id) {
                if ctx.output == OutputMode::Json {
                    output::print_json(&json!({
                        "error": format!("Invalid identifier: {id:?}"),
                    }));
                } else {
                    output::error_line(&format!("Invalid identifier: {}", output::bold(id)));
                }
                return Ok(1);
            }
            vec![id.to_string()]
        }
        None => cached_dataset_ids(&cache_root),
    };

    if ids.is_empty() {
        if ctx.output == OutputMode::Json {
            output::print_json(&json!({"updated": [], "message": "Nothing cached yet."}));
        } else if !ctx.quiet {
            println!();
            println!("  {}", output::muted("Nothing cached yet."));
            println!();
        }
        return Ok(0);
    }

    let checks = match runtime::block_on(scan_updates(&registry, &cache_root, &ids, arg.force)) {
        Ok(checks) => checks,
        Err(err) => {
            output::error_line(&format!("{err:#}"));
            return Ok(2);
        }
    };

    if checks.is_empty() {
        if ctx.output == OutputMode::Json {
            output::print_json(&json!({
                "updated": [],
                "message": "No registry entries found for cached datasets.",
            }));
        } else if !ctx.quiet {
            println!();
            println!("  {}", output::muted("No registry entries found."));
            println!();
        }
        return Ok(0);
    }

    let to_update: Vec<&UpdateCheck> = checks.iter().filter(|c| c.needs_update).collect();

    if to_update.is_empty() {
        if ctx.output == OutputMode::Json {
            output::print_json(&json!({
                "updated": [],
                "already_latest": checks.iter().map(|c| c.id()).collect::<Vec<_>>(),
            }));
        } else if !ctx.quiet {
            println!();
            if checks.len() == 1 {
                output::success_line(&format!(
                    "{} is already at the latest version ({}).",
                    output::bold(checks[0].id()),
                    output::bold(checks[0].latest()),
                ));
            } else {
                output::success_line(&format!("All {} datasets are up to date.", checks.len()));
            }
            println!();
        }
        return Ok(0);
    }

    if arg.check {
        if ctx.output == OutputMode::Json {
            output::print_json(&json!({
                "would_update": to_update.iter().map(|c| json!({
                    "id": c.id(),
                    "from": &c.current,
                    "to": c.latest(),
                })).collect::<Vec<_>>(),
            }));
        } else if !ctx.quiet {
            println!();
            println!(
                "  {} dataset(s) would be updated:",
                output::bold(&to_update.len().to_string())
            );
            println!();
            for check in &to_update {
                println!("    {}  {}", check.id(), output::muted(&transition(check)));
            }
            println!();
        }
        return Ok(0);
    }

    // Per-dataset isolation: one failure does not stop the rest.
    let mut updated = Vec::new();
    for check in &to_update {
        if !ctx.quiet && ctx.output != OutputMode::Json {
            println!();
            match &check.current {
                Some(current) if current != check.latest() => println!(
                    "  Updating {}: {current} → {}",
                    output::bold(check.id()),
                    check.latest()
                ),
                _ => println!(
                    "  Pulling {}",
                    output::bold(&format!("{}:{}", check.id(), check.latest()))
                ),
            }
        }
        let (code, _) = pull_resolved(ctx, &check.package, arg.force, 1)?;
        if code == 0 {
            updated.push(json!({
                "id": check.id(),
                "from": &check.current,
                "to": check.latest(),
            }));
        }
    }

    if ctx.output == OutputMode::Json {
        output::print_json(&json!({"updated": updated}));
    }
    Ok(0)
}

fn transition(check: &UpdateCheck) -> String {
    match &check.current {
        Some(current) if current != check.latest() => {
            format!("{current} → {}", check.latest())
        }
        _ => check.latest().to_string(),
    }
}
