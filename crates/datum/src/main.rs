use clap::Parser;

mod cli;
mod config;
mod ctx;
mod output;

fn main() {
    let app = cli::App::parse();
    std::process::exit(cli::run(app));
}
