//! Tool registry - the current catalog snapshot and its adapters
//!
//! The registry never mutates a snapshot in place. A sync builds a complete
//! new [`RegistrySnapshot`] off to the side and swaps the `Arc` pointer, so a
//! reader holding the previous snapshot keeps a consistent view until it
//! drops it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::{info, warn};

use crate::error::Result;
use crate::gateway::GatewayClient;
use crate::llm::ToolDefinition;

use super::adapter::ToolAdapter;
use super::catalog::ToolCatalog;

/// Immutable catalog plus one adapter per tool name
#[derive(Debug)]
pub struct RegistrySnapshot {
    catalog: ToolCatalog,
    adapters: HashMap<String, ToolAdapter>,
    version: u64,
}

impl RegistrySnapshot {
    fn build(catalog: ToolCatalog, version: u64) -> Self {
        let adapters = catalog
            .all()
            .map(|descriptor| (descriptor.name.clone(), ToolAdapter::new(descriptor.clone())))
            .collect();
        Self {
            catalog,
            adapters,
            version,
        }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Adapter for a tool name
    pub fn adapter(&self, name: &str) -> Option<&ToolAdapter> {
        self.adapters.get(name)
    }

    /// Number of syncs that produced this snapshot (0 = never synced)
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Tool definitions to advertise to the LLM
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.catalog.all().map(|t| t.to_llm_definition()).collect()
    }
}

/// Holder of the current snapshot
#[derive(Debug)]
pub struct ToolRegistry {
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl ToolRegistry {
    /// Create a registry with an empty snapshot
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(RegistrySnapshot::build(ToolCatalog::new(), 0))),
        }
    }

    /// Create a registry already holding the given catalog
    pub fn from_catalog(catalog: ToolCatalog) -> Self {
        let registry = Self::new();
        registry.install(catalog);
        registry
    }

    /// Current snapshot; stays valid even if a sync replaces it meanwhile
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the current snapshot with one built from `catalog`
    pub fn install(&self, catalog: ToolCatalog) -> Arc<RegistrySnapshot> {
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        // Built under the write lock so versions stay monotonic across racing syncs
        let next = Arc::new(RegistrySnapshot::build(catalog, guard.version + 1));
        *guard = Arc::clone(&next);
        next
    }

    /// Fetch the gateway catalog and swap it in
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn sync(&self, client: &GatewayClient) -> Result<Arc<RegistrySnapshot>> {
        match client.fetch_catalog().await {
            Ok(catalog) => {
                let snapshot = self.install(catalog);
                info!(
                    "Registry synced: {} tools (version {})",
                    snapshot.len(),
                    snapshot.version()
                );
                Ok(snapshot)
            }
            Err(e) => {
                warn!("Registry sync failed, keeping version {}: {}", self.snapshot().version(), e);
                Err(e)
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
