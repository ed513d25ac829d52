use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;
use datum_core::{OutputMode, runtime};
use datum_registry::{DataPackage, RegistryError};
use serde_json::json;

use crate::cli;
use crate::ctx::Ctx;
use crate::output;

#[derive(Debug, Clone, Args)]
pub struct PublishArg {
    /// Path to the datapackage.json to publish
    #[arg(default_value = "datapackage.json")]
    pub file: PathBuf,

    /// Overwrite an existing version in the registry
    #[arg(long, short = 'f')]
    pub force: bool,
}

/// Exit codes: 0 published, 1 duplicate or validation errors, 2 file or
/// parse errors.
pub fn cmd_publish(ctx: &Ctx, arg: &PublishArg) -> Result<i32> {
    let cfg = match cli::load_config(ctx) {
        Ok(cfg) => cfg,
        Err(code) => return Ok(code),
    };

    let file = &arg.file;
    if !file.exists() {
        if ctx.output == OutputMode::Json {
            output::print_json(&json!({
                "published": false,
                "error": format!("File not found: {}", file.display()),
            }));
        } else {
            output::error_line(&format!(
                "File not found: {}\n\nRun {} to create a datapackage.json, \
                 or pass a path: {}",
                output::bold(&file.display().to_string()),
                output::bold("datum init"),
                output::bold("datum publish path/to/datapackage.json"),
            ));
        }
        return Ok(2);
    }

    let raw = std::fs::read_to_string(file)?;
    let pkg: DataPackage = match serde_json::from_str(&raw) {
        Ok(pkg) => pkg,
        Err(err) => {
            if ctx.output == OutputMode::Json {
                output::print_json(&json!({
                    "published": false,
                    "error": format!("Invalid JSON: {err}"),
                }));
            } else {
                output::error_line(&format!(
                    "{} is not a valid datapackage.\n\n  {err}",
                    output::bold(&file.display().to_string()),
                ));
            }
            return Ok(2);
        }
    };

    let issues = pkg.validate();
    if !issues.is_empty() {
        if ctx.output == OutputMode::Json {
            let joined = issues
                .iter()
                .map(|i| format!("{}: {}", i.field, i.message))
                .collect::<Vec<_>>()
                .join("; ");
            output::print_json(&json!({"published": false, "error": joined}));
        } else {
            output::error_line(&format!(
                "{} has validation errors.\nRun {} for details.",
                output::bold(&file.display().to_string()),
                output::bold("datum check"),
            ));
        }
        return Ok(1);
    }

    let registry = match ctx.open_registry(&cfg) {
        Ok(registry) => registry,
        Err(err) => {
            output::error_line(&format!("{err:#}"));
            return Ok(2);
        }
    };

    match runtime::block_on(registry.publish(&pkg, arg.force)) {
        Ok(path) => {
            if ctx.output == OutputMode::Json {
                output::print_json(&json!({
                    "published": true,
                    "id": pkg.id,
                    "version": pkg.version,
                    "path": path.map(|p| p.display().to_string()),
                }));
            } else if !ctx.quiet {
                println!();
                println!(
                    "  {}  {}  {}",
                    style("✓ Published").green().bold(),
                    output::muted("·"),
                    output::bold(&format!("{}@{}", pkg.id, pkg.version)),
                );
                println!("  {:<10} {}", output::bold("Registry"), registry.location());
                if let Some(path) = path {
                    println!("  {:<10} {}", output::bold("Path"), path.display());
                }
                println!();
            }
            Ok(0)
        }
        Err(RegistryError::Conflict { id, version }) => {
            if ctx.output == OutputMode::Json {
                output::print_json(&json!({
                    "published": false,
                    "id": &id,
                    "version": &version,
                    "error": format!("{id}@{version} already exists in the registry"),
                }));
            } else {
                output::error_line(&format!(
                    "{} already exists in the registry.\n\n  Use {} to overwrite.",
                    output::bold(&format!("{id}@{version}")),
                    output::bold("datum publish --force"),
                ));
            }
            Ok(1)
        }
        Err(RegistryError::Unauthorized) => {
            if ctx.output == OutputMode::Json {
                output::print_json(&json!({
                    "published": false,
                    "error": "Not authenticated. Run `datum login`.",
                }));
            } else {
                output::error_line(&format!(
                    "Not authenticated. Run {} first.",
                    output::bold("datum login"),
                ));
            }
            Ok(1)
        }
        Err(err) => {
            if ctx.output == OutputMode::Json {
                output::print_json(&json!({
                    "published": false,
                    "error": format!("{err:#}"),
                }));
            } else {
                output::error_line(&format!("{err:#}"));
            }
            Ok(if err.is_network() { 2 } else { 1 })
        }
    }
}
