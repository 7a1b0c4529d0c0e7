mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mwdns_core::{SchemaRegistry, Session};

use crate::cli::{Cli, Command, RequestsCommand};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Offline commands
        Command::Config(ref args) => commands::config_cmd::handle(args, &cli.global),
        Command::Schema(ref args) => commands::schema::handle(args, &cli.global),
        Command::Completions(ref args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "mwdns", &mut std::io::stdout());
            Ok(())
        }

        // Everything else talks to the backend
        cmd => {
            // Only `requests watch` needs the live stream.
            let stream = matches!(
                cmd,
                Command::Requests(ref args) if matches!(args.command, RequestsCommand::Watch { .. })
            );
            let session_config = config::resolve_session_config(&cli.global, stream)?;
            let session = Session::new(session_config, Arc::new(SchemaRegistry::builtin()))?;

            tracing::debug!(command = ?cmd, domain = %session.domain(), "dispatching command");
            commands::dispatch(cmd, &session, &cli.global).await
        }
    }
}
