use anyhow::Result;
use clap::Args;
use console::style;
use datum_core::{CacheLayout, ClientSettings, OutputMode, PullRequest, pull, runtime};
use datum_registry::{DataPackage, Registry, is_valid_id, parse_identifier};
use serde_json::json;

use crate::cli;
use crate::ctx::Ctx;
use crate::output;

#[derive(Debug, Clone, Args)]
pub struct PullArg {
    /// Dataset identifiers (publisher/namespace/dataset[:version])
    #[arg(required = true, value_name = "IDENTIFIER")]
    pub identifiers: Vec<String>,

    /// Re-download even if already cached
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Concurrent transfers per dataset (1-8)
    #[arg(long, short = 'j', default_value_t = 1, value_name = "N")]
    pub jobs: usize,
}

/// Exit codes: 0 every dataset succeeded, 1 user error (bad identifier,
/// not found, checksum mismatch), 2 network error. With multiple
/// identifiers the highest-severity code among failures wins, and JSON
/// output becomes one document keyed by identifier.
pub fn cmd_pull(ctx: &Ctx, arg: &PullArg) -> Result<i32> {
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

    let mut worst = 0;
    let mut payloads = serde_json::Map::new();
    for identifier in &arg.identifiers {
        let (code, payload) = pull_one(ctx, &registry, identifier, arg.force, arg.jobs)?;
        worst = worst.max(code);
        payloads.insert(identifier.clone(), payload);
    }

    if ctx.output == OutputMode::Json {
        if arg.identifiers.len() == 1 {
            let (_, payload) = payloads.into_iter().next().unwrap_or_default();
            output::print_json(&payload);
        } else {
            output::print_json(&serde_json::Value::Object(payloads));
        }
    }
    Ok(worst)
}

fn pull_one(
    ctx: &Ctx,
    registry: &Registry,
    identifier: &str,
    force: bool,
    jobs: usize,
) -> Result<(i32, serde_json::Value)> {
    let (id, version) = parse_identifier(identifier);

    if !is_valid_id(id) {
        if ctx.output != OutputMode::Json {
            output::error_line(&format!(
                "Invalid identifier: {}\n\n  Expected {} \
                 (slash-separated — publisher may contain dots,\n  \
                 e.g. norge.no/population/census or simkjels/samples/demo)",
                output::bold(id),
                output::bold("publisher/namespace/dataset"),
            ));
        }
        let payload = json!({
            "downloaded": false,
            "error": format!("Invalid identifier format: {id:?}"),
        });
        return Ok((1, payload));
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
            if ctx.output != OutputMode::Json {
                let mut message = format!(
                    "Dataset {} not found in the registry.\n",
                    output::bold(&label)
                );
                let suggestions = runtime::block_on(registry.suggest(id));
                if suggestions.is_empty() {
                    message.push_str(&format!(
                        "\n  Use {} to add it first.",
                        output::bold("datum publish")
                    ));
                } else {
                    message.push_str("\n  Did you mean?\n");
                    for suggestion in suggestions {
                        message.push_str(&format!("    {suggestion}\n"));
                    }
                }
                output::error_line(&message);
            }
            let payload = json!({
                "downloaded": false,
                "error": format!("Not found: {label}"),
            });
            return Ok((1, payload));
        }
        Err(err) => {
            if ctx.output != OutputMode::Json {
                output::error_line(&format!("{err:#}"));
            }
            let code = if err.is_network() { 2 } else { 1 };
            let payload = json!({
                "downloaded": false,
                "error": format!("{err:#}"),
            });
            return Ok((code, payload));
        }
    };

    pull_resolved(ctx, &pkg, force, jobs)
}

/// Run the pull pipeline over an already-resolved package and return
/// the exit code plus the JSON payload for this dataset. Shared with
/// `datum update`, which reports through its own summary instead.
pub(crate) fn pull_resolved(
    ctx: &Ctx,
    pkg: &DataPackage,
    force: bool,
    jobs: usize,
) -> Result<(i32, serde_json::Value)> {
    let dest_dir = std::env::current_dir()?.join(pkg.dataset_slug());
    let cache = CacheLayout::new(ctx.cache_root());

    let client = match ClientSettings::default().build() {
        Ok(client) => client,
        Err(err) => {
            if ctx.output != OutputMode::Json {
                output::error_line(&format!("{err:#}"));
            }
            let payload = json!({
                "downloaded": false,
                "id": pkg.id.clone(),
                "version": pkg.version.clone(),
                "error": format!("{err:#}"),
            });
            return Ok((2, payload));
        }
    };

    let reporter = ctx.reporter();
    let request = PullRequest {
        package: pkg,
        cache: &cache,
        dest_dir: &dest_dir,
        force,
        parallelism: jobs,
    };

    match runtime::block_on(pull(&client, request, &reporter)) {
        Ok(outcome) => {
            if ctx.output != OutputMode::Json && !ctx.quiet {
                println!();
                println!(
                    "  {}  {}  {}",
                    style("✓ Downloaded").green().bold(),
                    output::muted("·"),
                    output::bold(&format!("{}@{}", outcome.id, outcome.version)),
                );
                for file in &outcome.files {
                    println!("  {}", file.path.display());
                }
                println!();
            }
            let payload = json!({
                "downloaded": true,
                "id": outcome.id,
                "version": outcome.version,
                "files": outcome.files.iter()
                    .map(|f| f.path.display().to_string())
                    .collect::<Vec<_>>(),
            });
            Ok((0, payload))
        }
        Err(err) => {
            if ctx.output != OutputMode::Json {
                output::error_line(&format!("{err:#}"));
            }
            let code = if err.is_network() { 2 } else { 1 };
            let payload = json!({
                "downloaded": false,
                "id": pkg.id.clone(),
                "version": pkg.version.clone(),
                "error": format!("{err:#}"),
            });
            Ok((code, payload))
        }
    }
}
