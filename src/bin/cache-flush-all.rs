use std::{process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use cache_flush::{
    cache::{EventDispatcher, TableCacheInvalidator},
    cli::{self, Args, Mode},
    command::{Console, ExitStatus, FlushAllCommand, StdConsole},
    config,
    db::{Connection, PgDataLayer},
};
use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args = Args::parse();
    tracing::debug!(args = ?args, "parsed CLI args");

    let mode = Mode::from(&args);
    // usage needs no config and no database
    if mode == Mode::Usage {
        StdConsole.usage(&cli::usage());
        return Ok(ExitStatus::Success.into());
    }

    let settings = config::load(&args.config)?;
    let data_layer = Arc::new(
        PgDataLayer::connect_lazy(&settings.database_url)
            .context("Failed to set up database pool")?,
    );

    let mut dispatcher = EventDispatcher::new();
    for table in settings.cache_tables {
        dispatcher.register(Arc::new(TableCacheInvalidator::new(table, data_layer.clone())));
    }
    if dispatcher.invalidator_count() == 0 {
        tracing::warn!("no cache tables configured, flush signals reach no invalidator");
    }

    let mut command = FlushAllCommand::new(
        data_layer.clone(),
        data_layer.clone(),
        dispatcher,
        Box::new(StdConsole),
    );
    let status = command.run(mode).await?;

    data_layer.disconnect().await?;

    Ok(status.into())
}
