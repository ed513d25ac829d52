use clap::{Parser, Subcommand, ValueEnum};
use datum_core::OutputMode;

use crate::config::Config;
use crate::ctx::Ctx;
use crate::output;

mod cache;
mod check;
mod completions;
mod config_cmd;
mod info;
mod init;
mod list;
mod login;
mod publish;
mod pull;
mod search;
mod unpublish;
mod update;
mod whoami;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Plain,
}

impl From<OutputFormat> for OutputMode {
    fn from(value: OutputFormat) -> Self {
        match value {
            OutputFormat::Table => OutputMode::Table,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Plain => "plain",
        }
        .fmt(f)
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "datum",
    version,
    about = "Datum — open datasets, open source.",
    long_about = "Publish and consume open datasets with a familiar, composable CLI.\n\
                  Datasets are identified as publisher/namespace/dataset:version.\n\n\
                  Global flags (--output, --quiet, --registry) apply to every subcommand.",
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct App {
    /// Registry URL or local path (overrides config)
    #[arg(long, global = true, env = "DATUM_REGISTRY")]
    pub registry: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Table, env = "DATUM_OUTPUT")]
    pub output: OutputFormat,

    /// Suppress non-essential output (useful in scripts)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Emit additional diagnostic information
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Download a dataset by identifier and verify its checksum")]
    Pull(pull::PullArg),

    #[command(alias = "up", about = "Pull the latest version of one or all cached datasets")]
    Update(update::UpdateArg),

    #[command(subcommand, about = "Manage the local dataset cache")]
    Cache(cache::CacheCmd),

    #[command(subcommand, alias = "cfg", about = "Manage local Datum configuration")]
    Config(config_cmd::ConfigCmd),

    #[command(about = "Search the registry by keyword")]
    Search(search::SearchArg),

    #[command(about = "Show dataset metadata without downloading")]
    Info(info::InfoArg),

    #[command(alias = "ls", about = "List datasets in the registry")]
    List(list::ListArg),

    #[command(about = "Create a starter datapackage.json", disable_version_flag = true)]
    Init(init::InitArg),

    #[command(about = "Validate a datapackage.json against the Datum schema")]
    Check(check::CheckArg),

    #[command(about = "Publish dataset metadata to the registry")]
    Publish(publish::PublishArg),

    #[command(about = "Remove a dataset version from the registry")]
    Unpublish(unpublish::UnpublishArg),

    #[command(about = "Authenticate with a Datum registry")]
    Login(login::LoginArg),

    #[command(about = "Remove stored credentials for a registry")]
    Logout(login::LogoutArg),

    #[command(about = "Show the active registry and login status")]
    Whoami(whoami::WhoamiArg),

    #[command(about = "Generate shell completions")]
    Completions(completions::CompletionsArg),
}

/// Dispatch the parsed command and return the process exit code.
pub fn run(app: App) -> i32 {
    let ctx = Ctx::new(app.registry, app.output.into(), app.quiet, app.verbose);

    let result = match &app.cmd {
        Commands::Pull(arg) => pull::cmd_pull(&ctx, arg),
        Commands::Update(arg) => update::cmd_update(&ctx, arg),
        Commands::Cache(cmd) => cache::cmd_cache(&ctx, cmd),
        Commands::Config(cmd) => config_cmd::cmd_config(&ctx, cmd),
        Commands::Search(arg) => search::cmd_search(&ctx, arg),
        Commands::Info(arg) => info::cmd_info(&ctx, arg),
        Commands::List(arg) => list::cmd_list(&ctx, arg),
        Commands::Init(arg) => init::cmd_init(&ctx, arg),
        Commands::Check(arg) => check::cmd_check(&ctx, arg),
        Commands::Publish(arg) => publish::cmd_publish(&ctx, arg),
        Commands::Unpublish(arg) => unpublish::cmd_unpublish(&ctx, arg),
        Commands::Login(arg) => login::cmd_login(&ctx, arg),
        Commands::Logout(arg) => login::cmd_logout(&ctx, arg),
        Commands::Whoami(arg) => whoami::cmd_whoami(&ctx, arg),
        Commands::Completions(arg) => completions::cmd_completions(arg),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            output::error_line(&format!("{err:#}"));
            2
        }
    }
}

/// Load the config or report the corruption and bail with exit code 2.
pub(crate) fn load_config(ctx: &Ctx) -> Result<Config, i32> {
    Config::load(&ctx.config_path()).map_err(|err| {
        output::error_line(&format!("{err:#}"));
        2
    })
}
