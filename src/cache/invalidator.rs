use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::{
    cache::FlushAllCaches,
    db::PgDataLayer,
    domain::{TableName, TenantContext},
};

/// Listener reacting to cache flush signals.
///
/// Implementations own their cache storage; a failure aborts the flush before the
/// transaction is committed.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Name of the invalidator for logging purposes
    fn name(&self) -> &str;

    /// Invalidate every cache entry of the tenant in `context`
    async fn flush_all(&self, signal: &FlushAllCaches, context: &TenantContext) -> Result<()>;
}

/// Cache kept as rows of a table with a `tenant_id` column.
///
/// Deletes run in the data layer's open transaction and become visible on commit.
pub struct TableCacheInvalidator {
    table: TableName,
    data_layer: Arc<PgDataLayer>,
}

impl TableCacheInvalidator {
    pub fn new(table: TableName, data_layer: Arc<PgDataLayer>) -> Self {
        Self { table, data_layer }
    }
}

#[async_trait]
impl CacheInvalidator for TableCacheInvalidator {
    fn name(&self) -> &str {
        self.table.as_str()
    }

    async fn flush_all(&self, _signal: &FlushAllCaches, context: &TenantContext) -> Result<()> {
        let deleted_count = self
            .data_layer
            .purge_tenant_rows(&self.table, context.tenant())
            .await
            .with_context(|| format!("Failed to purge cache table {}", self.table))?;

        tracing::debug!(
            table = %self.table,
            tenant = %context.tenant(),
            deleted_count,
            "Purged cache table"
        );

        Ok(())
    }
}
