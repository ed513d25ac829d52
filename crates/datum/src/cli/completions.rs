use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::Shell;

use crate::cli::App;

#[derive(Debug, Clone, Args)]
pub struct CompletionsArg {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn cmd_completions(arg: &CompletionsArg) -> Result<i32> {
    let mut command = App::command();
    clap_complete::generate(arg.shell, &mut command, "datum", &mut std::io::stdout());
    Ok(0)
}
