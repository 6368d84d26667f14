//! CLI entry point.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use jarvis_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(CliError::exit_code_of(&e))
        }
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = CliConfig::resolve(cli.data_dir)?.with_config_seed(cli.config_seed);
    if let Commands::Paths = command {
        handlers::paths::execute(&config);
        return Ok(());
    }

    let mut ctx = bootstrap(config).await?;
    match command {
        Commands::Paths => {}
        Commands::History { command } => handlers::history::execute(&mut ctx, command).await?,
        Commands::Config { command } => handlers::config::execute(&mut ctx, command).await?,
        Commands::Replay { file, trace } => {
            handlers::replay::execute(&mut ctx, &file, trace).await?;
        }
    }
    Ok(())
}
