use anyhow::Result;
use clap::Args;
use console::Term;
use datum_core::{OutputMode, runtime};
use datum_registry::{is_valid_id, parse_identifier};
use serde_json::json;

use crate::cli;
use crate::ctx::Ctx;
use crate::output;

#[derive(Debug, Clone, Args)]
pub struct UnpublishArg {
    /// Dataset identifier (publisher/namespace/dataset:version)
    pub identifier: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Remove all versions of this dataset
    #[arg(long)]
    pub all: bool,
}

/// Exit codes: 0 removed (or aborted at the prompt), 1 not found or bad
/// identifier.
pub fn cmd_unpublish(ctx: &Ctx, arg: &UnpublishArg) -> Result<i32> {
    let cfg = match cli::load_config(ctx) {
        Ok(cfg) => cfg,
        Err(code) => return Ok(code),
    };

    let (id, version) = parse_identifier(&arg.identifier);

    if !is_valid_id(id) {
        if ctx.output == OutputMode::Json {
            output::print_json(&json!({
                "unpublished": false,
                "error": format!("Invalid identifier: {id:?}"),
            }));
        } else {
            output::error_line(&format!("Invalid identifier: {}", output::bold(id)));
        }
        return Ok(1);
    }

    if version.is_none() && !arg.all {
        output::error_line(&format!(
            "Specify a version ({}) or use {} to remove all versions.",
            output::bold("publisher/namespace/dataset:version"),
            output::bold("--all"),
        ));
        return Ok(1);
    }

    let registry = match ctx.open_registry(&cfg) {
        Ok(registry) => registry,
        Err(err) => {
            output::error_line(&format!("{err:#}"));
            return Ok(2);
        }
    };

    // Collect versions to remove
    let (versions, label) = if arg.all {
        let versions = match runtime::block_on(registry.versions(id)) {
            Ok(versions) => versions,
            Err(err) => {
                output::error_line(&format!("{err:#}"));
                return Ok(2);
            }
        };
        if versions.is_empty() {
            if ctx.output == OutputMode::Json {
                output::print_json(&json!({
                    "unpublished": false,
                    "error": format!("Not found: {id}"),
                }));
            } else {
                output::error_line(&format!(
                    "No versions of {} found.",
                    output::bold(id)
                ));
            }
            return Ok(1);
        }
        let label = format!("{id} ({} version(s))", versions.len());
        (versions, label)
    } else {
        let version = version.unwrap_or_default().to_string();
        let exists = match runtime::block_on(registry.get(id, &version)) {
            Ok(found) => found.is_some(),
            Err(err) => {
                output::error_line(&format!("{err:#}"));
                return Ok(2);
            }
        };
        if !exists {
            let label = format!("{id}:{version}");
            if ctx.output == OutputMode::Json {
                output::print_json(&json!({
                    "unpublished": false,
                    "error": format!("Not found: {label}"),
                }));
            } else {
                output::error_line(&format!(
                    "{} not found in registry.",
                    output::bold(&label)
                ));
            }
            return Ok(1);
        }
        let label = format!("{id}:{version}");
        (vec![version], label)
    };

    if !arg.yes && ctx.output != OutputMode::Json {
        let term = Term::stderr();
        eprint!("Remove {label} from the registry? [y/N] ");
        let answer = term.read_line().unwrap_or_default();
        if !matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            println!();
            println!("  Aborted.");
            println!();
            return Ok(0);
        }
    }

    let mut removed = Vec::new();
    for v in &versions {
        match runtime::block_on(registry.unpublish(id, v)) {
            Ok(true) => removed.push(v.clone()),
            Ok(false) => {}
            Err(err) => {
                output::error_line(&format!("{err:#}"));
                return Ok(if err.is_network() { 2 } else { 1 });
            }
        }
    }

    if ctx.output == OutputMode::Json {
        output::print_json(&json!({
            "unpublished": true,
            "id": id,
            "versions": removed,
        }));
    } else if !ctx.quiet {
        println!();
        for v in &removed {
            output::success_line(&format!("Unpublished {}", output::bold(&format!("{id}:{v}"))));
        }
        println!();
    }
    Ok(0)
}
