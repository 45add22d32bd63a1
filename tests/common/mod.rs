#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use cache_flush::{
    cache::{CacheInvalidator, FlushAllCaches},
    command::Console,
    db::{Connection, DataLayerError, TenantDirectory},
    domain::{Tenant, TenantContext, TenantId},
};

/// Every collaborator call, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    Commit,
    Disconnect,
    ListAll,
    Resolve(String),
    Flush(&'static str, TenantId),
}

pub type Journal = Arc<Mutex<Vec<Call>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn tenant(id: i64, abbreviation: &str) -> Tenant {
    Tenant {
        id: TenantId::new(id),
        abbreviation: abbreviation.to_string(),
    }
}

/// In-memory connection and company directory
pub struct MockDataLayer {
    journal: Journal,
    connected: Mutex<bool>,
    tenants: Vec<Tenant>,
}

impl MockDataLayer {
    pub fn new(journal: Journal, tenants: Vec<Tenant>) -> Self {
        Self {
            journal,
            connected: Mutex::new(false),
            tenants,
        }
    }

    pub fn connected(self) -> Self {
        *self.connected.lock().unwrap() = true;
        self
    }

    fn record(&self, call: Call) {
        self.journal.lock().unwrap().push(call);
    }

    fn ensure_connected(&self) -> Result<(), DataLayerError> {
        if *self.connected.lock().unwrap() {
            Ok(())
        } else {
            Err(DataLayerError::NotConnected)
        }
    }
}

#[async_trait]
impl Connection for MockDataLayer {
    async fn is_connected(&self) -> bool {
        *self.connected.lock().unwrap()
    }

    async fn connect(&self) -> Result<(), DataLayerError> {
        self.record(Call::Connect);
        *self.connected.lock().unwrap() = true;
        Ok(())
    }

    async fn commit(&self) -> Result<(), DataLayerError> {
        self.ensure_connected()?;
        self.record(Call::Commit);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), DataLayerError> {
        self.record(Call::Disconnect);
        *self.connected.lock().unwrap() = false;
        Ok(())
    }
}

#[async_trait]
impl TenantDirectory for MockDataLayer {
    async fn list_all(&self) -> Result<Vec<Tenant>, DataLayerError> {
        self.ensure_connected()?;
        self.record(Call::ListAll);
        Ok(self.tenants.clone())
    }

    async fn resolve_id_by_abbreviation(
        &self,
        abbreviation: &str,
    ) -> Result<Option<TenantId>, DataLayerError> {
        self.ensure_connected()?;
        self.record(Call::Resolve(abbreviation.to_string()));
        Ok(self
            .tenants
            .iter()
            .find(|t| t.abbreviation == abbreviation)
            .map(|t| t.id))
    }
}

/// Invalidator writing to the journal, optionally failing for one tenant
pub struct RecordingInvalidator {
    name: &'static str,
    journal: Journal,
    fail_for: Option<TenantId>,
}

impl RecordingInvalidator {
    pub fn new(name: &'static str, journal: Journal) -> Self {
        Self {
            name,
            journal,
            fail_for: None,
        }
    }

    pub fn failing_for(mut self, tenant: TenantId) -> Self {
        self.fail_for = Some(tenant);
        self
    }
}

#[async_trait]
impl CacheInvalidator for RecordingInvalidator {
    fn name(&self) -> &str {
        self.name
    }

    async fn flush_all(&self, _signal: &FlushAllCaches, context: &TenantContext) -> Result<()> {
        if self.fail_for == Some(context.tenant()) {
            return Err(anyhow!("{} cache unavailable", self.name));
        }
        self.journal
            .lock()
            .unwrap()
            .push(Call::Flush(self.name, context.tenant()));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ConsoleOutput {
    pub usage: Vec<String>,
    pub errors: Vec<String>,
}

/// Console capturing everything written to it
#[derive(Clone, Default)]
pub struct BufferConsole {
    pub output: Arc<Mutex<ConsoleOutput>>,
}

impl Console for BufferConsole {
    fn usage(&mut self, text: &str) {
        self.output.lock().unwrap().usage.push(text.to_string());
    }

    fn error(&mut self, message: &str) {
        self.output.lock().unwrap().errors.push(message.to_string());
    }
}
