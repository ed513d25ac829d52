use anyhow::Result;
use clap::{Args, Subcommand};
use datum_core::OutputMode;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli;
use crate::ctx::Ctx;
use crate::output;

// Keys with descriptions shown in `datum config list`
const KNOWN_KEYS: &[(&str, &str)] = &[
    ("registry", "Default registry URL or local path"),
    ("output", "Default output format  (table | json | plain)"),
];

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCmd {
    #[command(about = "Print the value of a configuration key")]
    Get(KeyArg),
    #[command(about = "Set a configuration value")]
    Set(SetArg),
    #[command(about = "Show one key or all configuration values")]
    Show(OptionalKeyArg),
    #[command(about = "List all configuration values")]
    List,
    #[command(about = "Remove a configuration key")]
    Unset(KeyArg),
}

#[derive(Debug, Clone, Args)]
pub struct KeyArg {
    /// Configuration key
    pub key: String,
}

#[derive(Debug, Clone, Args)]
pub struct OptionalKeyArg {
    /// Key to show (omit to show all)
    pub key: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct SetArg {
    /// Configuration key
    pub key: String,
    /// Configuration value
    pub value: String,
}

#[derive(Tabled)]
struct ConfigRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Description")]
    description: String,
}

pub fn cmd_config(ctx: &Ctx, cmd: &ConfigCmd) -> Result<i32> {
    match cmd {
        ConfigCmd::Get(arg) => show_one(ctx, &arg.key),
        ConfigCmd::Set(arg) => set(ctx, arg),
        ConfigCmd::Show(arg) => match &arg.key {
            Some(key) => show_one(ctx, key),
            None => show_all(ctx),
        },
        ConfigCmd::List => show_all(ctx),
        ConfigCmd::Unset(arg) => unset(ctx, &arg.key),
    }
}

fn set(ctx: &Ctx, arg: &SetArg) -> Result<i32> {
    let mut cfg = match cli::load_config(ctx) {
        Ok(cfg) => cfg,
        Err(code) => return Ok(code),
    };
    cfg.set(&arg.key, &arg.value);
    cfg.save(&ctx.config_path())?;

    if ctx.output == OutputMode::Json {
        output::print_json(&json!({"key": &arg.key, "value": &arg.value}));
    } else if !ctx.quiet {
        output::success_line(&format!("{} = {}", output::bold(&arg.key), arg.value));
    }
    Ok(0)
}

fn show_one(ctx: &Ctx, key: &str) -> Result<i32> {
    let cfg = match cli::load_config(ctx) {
        Ok(cfg) => cfg,
        Err(code) => return Ok(code),
    };

    match cfg.get(key) {
        Some(value) => {
            if ctx.output == OutputMode::Json {
                output::print_json(&json!({"key": key, "value": value}));
            } else {
                match value {
                    serde_json::Value::String(s) => println!("{s}"),
                    other => println!("{other}"),
                }
            }
            Ok(0)
        }
        None => {
            if ctx.output == OutputMode::Json {
                output::print_json(&json!({"key": key, "value": null}));
            } else {
                output::error_line(&format!("Key {} is not set.", output::bold(key)));
            }
            Ok(1)
        }
    }
}

fn show_all(ctx: &Ctx) -> Result<i32> {
    let cfg = match cli::load_config(ctx) {
        Ok(cfg) => cfg,
        Err(code) => return Ok(code),
    };

    if ctx.output == OutputMode::Json {
        output::print_json(&serde_json::to_value(&cfg)?);
        return Ok(0);
    }

    if ctx.quiet {
        return Ok(0);
    }

    println!();
    if cfg.values.is_empty() {
        println!("  {}", output::muted("No configuration set."));
        println!(
            "  {}",
            output::muted(&ctx.config_path().display().to_string())
        );
        println!();
        return Ok(0);
    }

    let rows: Vec<ConfigRow> = cfg
        .values
        .iter()
        .map(|(key, value)| ConfigRow {
            key: key.clone(),
            value: match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            description: KNOWN_KEYS
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, d)| d.to_string())
                .unwrap_or_default(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::blank());
    println!("{table}");
    println!();

    Ok(0)
}

fn unset(ctx: &Ctx, key: &str) -> Result<i32> {
    let mut cfg = match cli::load_config(ctx) {
        Ok(cfg) => cfg,
        Err(code) => return Ok(code),
    };

    if !cfg.unset(key) {
        if ctx.output == OutputMode::Json {
            output::print_json(&json!({"key": key, "removed": false}));
        } else {
            output::error_line(&format!("Key {} is not set.", output::bold(key)));
        }
        return Ok(1);
    }
    cfg.save(&ctx.config_path())?;

    if ctx.output == OutputMode::Json {
        output::print_json(&json!({"key": key, "removed": true}));
    } else if !ctx.quiet {
        output::success_line(&format!("{} removed", output::bold(key)));
    }
    Ok(0)
}
