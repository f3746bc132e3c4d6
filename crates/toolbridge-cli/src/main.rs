//! Toolbridge CLI
//!
//! Composition root: loads the configuration, builds the server registry
//! around the command-line runtime driver, and runs one of the commands.

mod args;
mod commands;
mod console;
mod logging;

use args::{Cli, Commands};
use clap::Parser;
use console::CliConsole;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        CliConsole.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = commands::load_config(&cli)?;
    logging::init(&config.logging);

    match cli.command {
        Commands::Check { json } => commands::check::run(&config, json).await,
        Commands::Serve { auto_restart } => commands::serve::run(&config, auto_restart).await,
        Commands::Invoke {
            endpoint,
            operation,
            args,
            headers,
            timeout,
        } => commands::invoke::run(&endpoint, &operation, &args, &headers, timeout).await,
        Commands::Config { json } => commands::config::show(&config, json),
    }
}
