use std::process::ExitCode;

use clap::Parser;
use hotswap::cli::{Cli, Command};
use hotswap::lifecycle::Shutdown;
use hotswap::{client, server};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if let Some(threads) = cli.threads.filter(|t| *t > 0) {
        builder.worker_threads(threads);
    }
    let runtime = builder.enable_all().build()?;

    runtime.block_on(async move {
        let shutdown = Shutdown::new();

        let work = dispatch(cli.command, &shutdown);
        tokio::pin!(work);

        tokio::select! {
            res = &mut work => return res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                shutdown.trigger();
            }
        }

        // Let the listener, sessions and background tasks wind down.
        work.await
    })
}

async fn dispatch(command: Command, shutdown: &Shutdown) -> anyhow::Result<()> {
    match command {
        Command::Server(args) => server::run(&args.into_config()?, shutdown).await,
        Command::Client(args) => {
            client::run(&args.into_config()?, shutdown).await?;
            Ok(())
        }
    }
}
