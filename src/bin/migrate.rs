use anyhow::Result;
use cache_flush::{config, db};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;

/// Apply database migrations
#[derive(Parser)]
struct Args {
    /// Path of the YAML config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, env = "CACHE_FLUSH_CONFIG")]
    config: std::path::PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args = Args::parse();
    let settings = config::load(&args.config)?;

    let pool = PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(settings.database_url.as_str())
        .await?;
    db::run_migrations(&pool).await?;
    tracing::info!("DB successfully initialized");

    Ok(())
}
