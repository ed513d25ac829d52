use anyhow::Result;
use clap::{Args, Subcommand};
use console::Term;
use datum_core::{CacheLayout, OutputMode, format_size};
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::ctx::Ctx;
use crate::output;

#[derive(Debug, Clone, Subcommand)]
pub enum CacheCmd {
    #[command(about = "List all cached datasets")]
    List,
    #[command(about = "Show total disk usage of the local cache")]
    Size,
    #[command(about = "Remove all cached datasets")]
    Clear(ClearArg),
}

#[derive(Debug, Clone, Args)]
pub struct ClearArg {
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Tabled)]
struct CacheRow {
    #[tabled(rename = "Dataset")]
    id: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Files")]
    files: usize,
    #[tabled(rename = "Size")]
    size: String,
}

pub fn cmd_cache(ctx: &Ctx, cmd: &CacheCmd) -> Result<i32> {
    match cmd {
        CacheCmd::List => cache_list(ctx),
        CacheCmd::Size => cache_size(ctx),
        CacheCmd::Clear(arg) => cache_clear(ctx, arg),
    }
}

fn cache_list(ctx: &Ctx) -> Result<i32> {
    let layout = CacheLayout::new(ctx.cache_root());
    let entries = layout.scan();

    if ctx.output == OutputMode::Json {
        let payload: Vec<_> = entries
            .iter()
            .map(|e| {
                json!({
                    "id": &e.id,
                    "version": &e.version,
                    "files": e.files.iter().map(|f| f.display().to_string()).collect::<Vec<_>>(),
                    "size": e.size,
                })
            })
            .collect();
        output::print_json(&json!(payload));
        return Ok(0);
    }

    if ctx.quiet {
        return Ok(0);
    }

    if entries.is_empty() {
        println!();
        println!("  {}", output::muted("Cache is empty."));
        println!("  {}", output::muted(&layout.root().display().to_string()));
        println!();
        return Ok(0);
    }

    let total_size: u64 = entries.iter().map(|e| e.size).sum();

    println!();
    println!(
        "  {} cached version(s)  {}  {}  {}  {}",
        output::bold(&entries.len().to_string()),
        output::muted("·"),
        format_size(total_size),
        output::muted("·"),
        layout.root().display(),
    );
    println!();

    let rows: Vec<CacheRow> = entries
        .iter()
        .map(|e| CacheRow {
            id: e.id.clone(),
            version: e.version.clone(),
            files: e.files.len(),
            size: format_size(e.size),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::blank());
    println!("{table}");
    println!();

    Ok(0)
}

fn cache_size(ctx: &Ctx) -> Result<i32> {
    let layout = CacheLayout::new(ctx.cache_root());
    let entries = layout.scan();
    let total_size: u64 = entries.iter().map(|e| e.size).sum();
    let total_files: usize = entries.iter().map(|e| e.files.len()).sum();

    if ctx.output == OutputMode::Json {
        output::print_json(&json!({"size_bytes": total_size, "files": total_files}));
        return Ok(0);
    }

    if ctx.quiet {
        return Ok(0);
    }

    println!();
    println!("  {}  {}", output::bold("Cache:"), layout.root().display());
    println!(
        "  {}  {}  {}",
        output::bold("Total:"),
        format_size(total_size),
        output::muted(&format!("({total_files} file(s))")),
    );
    println!();

    Ok(0)
}

fn cache_clear(ctx: &Ctx, arg: &ClearArg) -> Result<i32> {
    let layout = CacheLayout::new(ctx.cache_root());
    let entries = layout.scan();

    if entries.is_empty() {
        if !ctx.quiet && ctx.output != OutputMode::Json {
            println!();
            println!("  {}", output::muted("Cache is already empty."));
            println!();
        }
        return Ok(0);
    }

    let total_size: u64 = entries.iter().map(|e| e.size).sum();
    let total_files: usize = entries.iter().map(|e| e.files.len()).sum();

    if !arg.yes && ctx.output != OutputMode::Json {
        let term = Term::stderr();
        eprint!(
            "  Clear {} ({} file(s)) from cache? [y/N] ",
            format_size(total_size),
            total_files
        );
        let answer = term.read_line().unwrap_or_default();
        if !matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            println!("  {}", output::muted("Aborted."));
            return Ok(0);
        }
    }

    layout.clear()?;

    if ctx.output == OutputMode::Json {
        output::print_json(&json!({"cleared": true, "freed_bytes": total_size}));
    } else if !ctx.quiet {
        println!();
        output::success_line(&format!(
            "Cache cleared  {}",
            output::muted(&format!("({} freed)", format_size(total_size))),
        ));
        println!();
    }

    Ok(0)
}
