use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction, postgres::PgPoolOptions};
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

use crate::domain::{TableName, Tenant, TenantId};

#[derive(Debug, Error)]
pub enum DataLayerError {
    #[error("no open transaction, connect first")]
    NotConnected,
    #[error("database error {0}")]
    Database(#[from] sqlx::Error),
}

/// Transactional connection the flush runs in
#[async_trait]
pub trait Connection: Send + Sync {
    async fn is_connected(&self) -> bool;

    /// Open the connection and begin a transaction
    async fn connect(&self) -> Result<(), DataLayerError>;

    /// Commit the current transaction. The connection stays open.
    async fn commit(&self) -> Result<(), DataLayerError>;

    async fn disconnect(&self) -> Result<(), DataLayerError>;
}

/// Lookup of companies
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// All companies, ordered by abbreviation
    async fn list_all(&self) -> Result<Vec<Tenant>, DataLayerError>;

    /// Returns Ok(None) if no company has this abbreviation
    async fn resolve_id_by_abbreviation(
        &self,
        abbreviation: &str,
    ) -> Result<Option<TenantId>, DataLayerError>;
}

/// Postgres data layer holding at most one open transaction
pub struct PgDataLayer {
    pool: PgPool,
    tx: Mutex<Option<Transaction<'static, Postgres>>>,
}

impl PgDataLayer {
    /// Build the pool without touching the network; the first `connect` does that
    pub fn connect_lazy(database_url: &Url) -> Result<Self, DataLayerError> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(database_url.as_str())?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            tx: Mutex::new(None),
        }
    }

    /// Delete the rows of `table` belonging to `tenant` inside the open transaction
    #[tracing::instrument(name = "db::purge_tenant_rows", skip(self))]
    pub async fn purge_tenant_rows(
        &self,
        table: &TableName,
        tenant: TenantId,
    ) -> Result<u64, DataLayerError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(DataLayerError::NotConnected)?;

        let result = sqlx::query(&format!(
            r#"
            DELETE FROM {table}
            WHERE tenant_id = $1
            "#
        ))
        .bind(tenant)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Connection for PgDataLayer {
    async fn is_connected(&self) -> bool {
        self.tx.lock().await.is_some()
    }

    #[tracing::instrument(name = "db::connect", skip(self))]
    async fn connect(&self) -> Result<(), DataLayerError> {
        let mut guard = self.tx.lock().await;
        if guard.is_none() {
            *guard = Some(self.pool.begin().await?);
            tracing::debug!("transaction started");
        }

        Ok(())
    }

    #[tracing::instrument(name = "db::commit", skip(self))]
    async fn commit(&self) -> Result<(), DataLayerError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.take().ok_or(DataLayerError::NotConnected)?;
        tx.commit().await?;

        *guard = Some(self.pool.begin().await?);

        Ok(())
    }

    #[tracing::instrument(name = "db::disconnect", skip(self))]
    async fn disconnect(&self) -> Result<(), DataLayerError> {
        if let Some(tx) = self.tx.lock().await.take() {
            tx.rollback().await?;
        }
        self.pool.close().await;

        Ok(())
    }
}

#[async_trait]
impl TenantDirectory for PgDataLayer {
    #[tracing::instrument(name = "db::list_all", skip(self))]
    async fn list_all(&self) -> Result<Vec<Tenant>, DataLayerError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(DataLayerError::NotConnected)?;

        let tenants = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, abbreviation
            FROM companies
            ORDER BY abbreviation
            "#,
        )
        .fetch_all(&mut **tx)
        .await?;

        Ok(tenants)
    }

    #[tracing::instrument(name = "db::resolve_id_by_abbreviation", skip(self))]
    async fn resolve_id_by_abbreviation(
        &self,
        abbreviation: &str,
    ) -> Result<Option<TenantId>, DataLayerError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(DataLayerError::NotConnected)?;

        let id = sqlx::query_scalar::<_, TenantId>(
            r#"
            SELECT id
            FROM companies
            WHERE abbreviation = $1
            "#,
        )
        .bind(abbreviation)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(id)
    }
}

/// Apply the migrations under `migrations/`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!()
        .run(pool)
        .await
        .context("SQL migrations failed")
}
