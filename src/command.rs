use std::sync::Arc;

use thiserror::Error;

use crate::{
    cache::{EventDispatcher, FlushAllCaches},
    cli::{self, Mode},
    db::{Connection, DataLayerError, TenantDirectory},
    domain::{TenantContext, TenantId},
};

#[derive(Debug, Error)]
pub enum FlushError {
    #[error("Unknown company '{0}'.")]
    UnknownTenant(String),
    #[error(transparent)]
    DataLayer(#[from] DataLayerError),
    #[error(transparent)]
    Invalidator(#[from] anyhow::Error),
}

/// Result of a completed invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    UnknownTenant,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::UnknownTenant => -1,
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        // -1 wraps to 255, as a shell reports it
        std::process::ExitCode::from(status.code() as u8)
    }
}

/// Sink for usage text and error messages
pub trait Console: Send {
    fn usage(&mut self, text: &str);

    fn error(&mut self, message: &str);
}

/// Usage to stdout, errors to stderr
pub struct StdConsole;

impl Console for StdConsole {
    fn usage(&mut self, text: &str) {
        println!("{text}");
    }

    fn error(&mut self, message: &str) {
        eprintln!("[ERROR] {message}");
    }
}

/// The `cache-flush-all` command
pub struct FlushAllCommand {
    connection: Arc<dyn Connection>,
    directory: Arc<dyn TenantDirectory>,
    dispatcher: EventDispatcher,
    console: Box<dyn Console>,
}

impl FlushAllCommand {
    pub fn new(
        connection: Arc<dyn Connection>,
        directory: Arc<dyn TenantDirectory>,
        dispatcher: EventDispatcher,
        console: Box<dyn Console>,
    ) -> Self {
        Self {
            connection,
            directory,
            dispatcher,
            console,
        }
    }

    /// Run one invocation.
    ///
    /// An unknown company is reported on the console and returned as
    /// `ExitStatus::UnknownTenant`; any other failure is returned as an error.
    #[tracing::instrument(name = "command::run", skip(self))]
    pub async fn run(&mut self, mode: Mode) -> Result<ExitStatus, FlushError> {
        match mode {
            Mode::Usage => {
                self.console.usage(&cli::usage());
                Ok(ExitStatus::Success)
            }
            Mode::All => {
                self.for_all_tenants().await?;
                Ok(ExitStatus::Success)
            }
            Mode::Single(abbreviation) => match self.for_single_tenant(&abbreviation).await {
                Ok(()) => Ok(ExitStatus::Success),
                Err(e @ FlushError::UnknownTenant(_)) => {
                    tracing::warn!(company = %abbreviation, "unknown company");
                    self.console.error(&e.to_string());
                    Ok(ExitStatus::UnknownTenant)
                }
                Err(e) => Err(e),
            },
        }
    }

    async fn ensure_connected(&self) -> Result<(), FlushError> {
        if !self.connection.is_connected().await {
            self.connection.connect().await?;
        }

        Ok(())
    }

    async fn for_all_tenants(&mut self) -> Result<(), FlushError> {
        self.ensure_connected().await?;

        let tenants = self.directory.list_all().await?;
        tracing::info!(tenant_count = tenants.len(), "Flushing caches of all companies");

        for tenant in tenants {
            tracing::debug!(company = %tenant.abbreviation, "Flushing company");
            self.for_tenant(tenant.id).await?;
        }

        Ok(())
    }

    async fn for_single_tenant(&mut self, abbreviation: &str) -> Result<(), FlushError> {
        self.ensure_connected().await?;

        let tenant = self
            .directory
            .resolve_id_by_abbreviation(abbreviation)
            .await?
            .ok_or_else(|| FlushError::UnknownTenant(abbreviation.to_string()))?;

        self.for_tenant(tenant).await
    }

    /// Publish the flush signal for one tenant, run the invalidators and commit
    #[tracing::instrument(name = "command::for_tenant", skip(self))]
    async fn for_tenant(&mut self, tenant: TenantId) -> Result<(), FlushError> {
        let context = TenantContext::new(tenant);

        self.dispatcher.notify(FlushAllCaches);
        self.dispatcher.dispatch(&context).await?;
        self.connection.commit().await?;

        tracing::info!(tenant = %tenant, "Flushed all caches");

        Ok(())
    }
}
