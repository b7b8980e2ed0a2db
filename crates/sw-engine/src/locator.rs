//! Tenant location strategies.
//!
//! The reconciler needs the storage project of each tenant id found in the
//! consolidated store. Locating never fails as a whole: ids that cannot be
//! placed are simply absent from the returned map.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use sw_config::SwConfig;
use sw_core::{TableRef, TenantId};
use sw_warehouse::Warehouse;

/// Maps tenant ids to storage references.
pub trait TenantLocator: Send + Sync {
    fn locate(&self, ids: &[TenantId]) -> impl Future<Output = HashMap<TenantId, String>> + Send;
}

/// Queries tenant registries in a fixed priority order.
///
/// The first registry that knows an id wins. Later registries are asked only
/// for ids still unresolved, and the walk stops once every id is placed. A
/// registry that cannot be read is logged and skipped.
#[derive(Debug)]
pub struct PriorityLocator<W> {
    warehouse: Arc<W>,
    registries: Vec<(String, TableRef)>,
}

impl<W: Warehouse> PriorityLocator<W> {
    /// `registries` pairs an environment name with its registry table, highest
    /// priority first.
    #[must_use]
    pub const fn new(warehouse: Arc<W>, registries: Vec<(String, TableRef)>) -> Self {
        Self {
            warehouse,
            registries,
        }
    }

    /// Every configured environment, in configuration order.
    #[must_use]
    pub fn from_config(warehouse: Arc<W>, config: &SwConfig) -> Self {
        let registries = config
            .environments
            .iter()
            .map(|env| (env.name.clone(), env.registry_ref()))
            .collect();
        Self::new(warehouse, registries)
    }
}

impl<W: Warehouse> TenantLocator for PriorityLocator<W> {
    async fn locate(&self, ids: &[TenantId]) -> HashMap<TenantId, String> {
        let mut found: HashMap<TenantId, String> = HashMap::with_capacity(ids.len());

        for (environment, registry) in &self.registries {
            let pending: Vec<TenantId> = ids
                .iter()
                .copied()
                .filter(|id| !found.contains_key(id))
                .collect();
            if pending.is_empty() {
                break;
            }

            match self.warehouse.tenant_locations(registry, &pending).await {
                Ok(rows) => {
                    let before = found.len();
                    for (id, storage_ref) in rows {
                        found.entry(id).or_insert(storage_ref);
                    }
                    tracing::debug!(
                        environment = environment.as_str(),
                        asked = pending.len(),
                        resolved = found.len() - before,
                        "tenant registry consulted"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        environment = environment.as_str(),
                        %registry,
                        error = %e,
                        "tenant registry unavailable, skipping"
                    );
                }
            }
        }

        found
    }
}

/// Caller-supplied id to storage map.
#[derive(Debug, Clone, Default)]
pub struct KnownLocations(HashMap<TenantId, String>);

impl KnownLocations {
    #[must_use]
    pub const fn new(map: HashMap<TenantId, String>) -> Self {
        Self(map)
    }

    #[must_use]
    pub fn get(&self, id: TenantId) -> Option<&str> {
        self.0.get(&id).map(String::as_str)
    }
}

impl FromIterator<(TenantId, String)> for KnownLocations {
    fn from_iter<I: IntoIterator<Item = (TenantId, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl TenantLocator for KnownLocations {
    async fn locate(&self, ids: &[TenantId]) -> HashMap<TenantId, String> {
        ids.iter()
            .filter_map(|id| self.0.get(id).map(|s| (*id, s.clone())))
            .collect()
    }
}

/// Known map first, fallback locator for the rest.
#[derive(Debug)]
pub struct ChainLocator<F> {
    known: KnownLocations,
    fallback: F,
}

impl<F: TenantLocator> ChainLocator<F> {
    #[must_use]
    pub const fn new(known: KnownLocations, fallback: F) -> Self {
        Self { known, fallback }
    }
}

impl<F: TenantLocator> TenantLocator for ChainLocator<F> {
    async fn locate(&self, ids: &[TenantId]) -> HashMap<TenantId, String> {
        let mut found = self.known.locate(ids).await;
        let rest: Vec<TenantId> = ids
            .iter()
            .copied()
            .filter(|id| !found.contains_key(id))
            .collect();
        if !rest.is_empty() {
            found.extend(self.fallback.locate(&rest).await);
        }
        found
    }
}
