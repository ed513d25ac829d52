use anyhow::Result;
use clap::Args;
use console::style;
use datum_core::OutputMode;
use serde_json::json;

use crate::cli;
use crate::ctx::{Ctx, host_of};
use crate::output;

#[derive(Debug, Clone, Args)]
pub struct WhoamiArg {}

/// Prints the active registry, the stored username (if any), and
/// whether a token is present.
pub fn cmd_whoami(ctx: &Ctx, _arg: &WhoamiArg) -> Result<i32> {
    let cfg = match cli::load_config(ctx) {
        Ok(cfg) => cfg,
        Err(code) => return Ok(code),
    };

    let is_remote = ctx.registry_is_remote(&cfg);
    let registry = ctx
        .registry_location(&cfg)
        .unwrap_or_else(|| format!("{} (local)", ctx.default_registry_root().display()));

    let (username, has_token) = if is_remote {
        let host = host_of(&registry);
        (cfg.username(&host), cfg.token(&host).is_some())
    } else {
        (None, false)
    };

    if ctx.output == OutputMode::Json {
        output::print_json(&json!({
            "registry": registry,
            "is_remote": is_remote,
            "username": username,
            "authenticated": has_token,
        }));
        return Ok(0);
    }

    println!();
    println!("  {:<12} {registry}", output::bold("Registry:"));
    if is_remote {
        match (username, has_token) {
            (Some(username), true) => println!(
                "  {:<12} {}  {username}",
                output::bold("Logged in:"),
                style("✓").green(),
            ),
            (None, true) => println!(
                "  {:<12} {}  (username not stored)",
                output::bold("Logged in:"),
                style("✓").green(),
            ),
            _ => {
                println!(
                    "  {:<12} {}  not authenticated",
                    output::bold("Logged in:"),
                    style("✗").red(),
                );
                println!("  Run {} to authenticate.", output::bold("datum login"));
            }
        }
    } else {
        println!(
            "  {:<12} local (no authentication required)",
            output::bold("Mode:"),
        );
    }
    println!();

    Ok(0)
}
