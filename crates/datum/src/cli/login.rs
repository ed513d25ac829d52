use anyhow::Result;
use clap::Args;
use console::Term;
use datum_core::{OutputMode, runtime};
use datum_registry::RemoteRegistry;
use serde_json::json;

use crate::cli;
use crate::ctx::{Ctx, host_of};
use crate::output;

const DEFAULT_REGISTRY_URL: &str = "https://datumhub.org";

#[derive(Debug, Clone, Args)]
pub struct LoginArg {
    /// Registry URL to authenticate with
    #[arg(default_value = DEFAULT_REGISTRY_URL)]
    pub url: String,

    /// API token (skips the username/password prompt)
    #[arg(long, short = 't')]
    pub token: Option<String>,

    /// Username (prompted for when omitted)
    #[arg(long)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct LogoutArg {
    /// Registry URL to log out from
    #[arg(default_value = DEFAULT_REGISTRY_URL)]
    pub url: String,
}

/// Credentials are stored under `auth.<host>` in the config file.
pub fn cmd_login(ctx: &Ctx, arg: &LoginArg) -> Result<i32> {
    let mut cfg = match cli::load_config(ctx) {
        Ok(cfg) => cfg,
        Err(code) => return Ok(code),
    };
    let host = host_of(&arg.url);

    if !ctx.quiet && ctx.output != OutputMode::Json {
        println!();
        println!("  Logging in to {}", output::bold(&arg.url));
        println!();
    }

    let mut username = arg.username.clone();
    let token = match &arg.token {
        Some(token) => token.clone(),
        None => {
            let term = Term::stderr();
            let user = match username.clone() {
                Some(user) => user,
                None => {
                    eprint!("  Username: ");
                    term.read_line()?.trim().to_string()
                }
            };
            eprint!("  Password: ");
            let password = term.read_secure_line()?;
            username = Some(user.clone());

            let registry = match RemoteRegistry::new(&arg.url, None) {
                Ok(registry) => registry,
                Err(err) => {
                    output::error_line(&format!("{err:#}"));
                    return Ok(2);
                }
            };
            match runtime::block_on(registry.fetch_token(&user, &password)) {
                Ok(token) => token,
                Err(err) => {
                    if ctx.output == OutputMode::Json {
                        output::print_json(&json!({
                            "logged_in": false,
                            "error": format!("{err:#}"),
                        }));
                    } else {
                        output::error_line(&format!(
                            "Authentication failed: {err:#}\n  Check the registry URL and your credentials.",
                        ));
                    }
                    return Ok(1);
                }
            }
        }
    };

    cfg.set_auth(&host, token, username);
    cfg.save(&ctx.config_path())?;

    if ctx.output == OutputMode::Json {
        output::print_json(&json!({"logged_in": true, "registry": &arg.url}));
    } else if !ctx.quiet {
        println!();
        output::success_line(&format!("Logged in to {}", output::bold(&arg.url)));
        println!();
    }
    Ok(0)
}

pub fn cmd_logout(ctx: &Ctx, arg: &LogoutArg) -> Result<i32> {
    let mut cfg = match cli::load_config(ctx) {
        Ok(cfg) => cfg,
        Err(code) => return Ok(code),
    };
    let host = host_of(&arg.url);

    let was_logged_in = cfg.token(&host).is_some();
    if was_logged_in {
        cfg.clear_auth(&host);
        cfg.save(&ctx.config_path())?;
    }

    if ctx.output == OutputMode::Json {
        output::print_json(&json!({"logged_out": was_logged_in, "registry": &arg.url}));
    } else if !ctx.quiet {
        println!();
        if was_logged_in {
            output::success_line(&format!("Logged out from {}", output::bold(&arg.url)));
        } else {
            println!(
                "  {}",
                output::muted(&format!("Not logged in to {} — nothing to do.", arg.url)),
            );
        }
        println!();
    }
    Ok(0)
}
