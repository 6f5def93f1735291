//! Base mapper construction and the identity cache.

use super::{BasicMapper, Mapper};
use crate::config::MapperConfig;
use crate::definition::MapperDef;
use crate::errors::MappingError;
use crate::resolve::Resolver;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Closure building a mapper on a cache miss.
pub type MapperBuilder<'a> = dyn FnMut() -> Result<Arc<dyn Mapper>, MappingError> + 'a;

/// Builds mappers from definitions and caches them by identity.
pub trait BaseMapperFactory: Send + Sync {
    /// Builds a new, uncached mapper.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::Configuration` if the definition is invalid.
    fn new_mapper(
        &self,
        id: &str,
        def: Arc<MapperDef>,
        resolver: Option<Arc<dyn Resolver>>,
    ) -> Result<Arc<dyn Mapper>, MappingError>;

    /// Returns the mapper cached under `id`, running `build` on a miss.
    ///
    /// `def` is the definition the caller expects the cached mapper to
    /// apply, when there is one. `build` must not re-enter the cache.
    ///
    /// # Errors
    ///
    /// Returns whatever `build` returns; failures are not cached.
    fn get_or_build(
        &self,
        id: &str,
        def: Option<&Arc<MapperDef>>,
        build: &mut MapperBuilder<'_>,
    ) -> Result<Arc<dyn Mapper>, MappingError>;

    /// Returns the mapper for `id`, building it from `def` on first use.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::Configuration` if the definition is invalid.
    fn new_unique_mapper(
        &self,
        id: &str,
        def: Arc<MapperDef>,
        resolver: Option<Arc<dyn Resolver>>,
    ) -> Result<Arc<dyn Mapper>, MappingError> {
        self.get_or_build(id, Some(&def), &mut || {
            self.new_mapper(id, Arc::clone(&def), resolver.clone())
        })
    }
}

struct CacheEntry {
    mapper: Arc<dyn Mapper>,
    def: Option<Arc<MapperDef>>,
}

/// The bundled base factory, backed by a concurrent map.
///
/// Lookups of existing entries only take a shard read lock; a miss locks
/// the shard of its key while the mapper is built, so each identity is
/// built once.
pub struct CachingBaseFactory {
    entries: DashMap<String, CacheEntry>,
    cache_enabled: bool,
    strict_types: bool,
}

impl CachingBaseFactory {
    /// Creates a factory with the given settings.
    #[must_use]
    pub fn new(config: &MapperConfig) -> Self {
        Self {
            entries: DashMap::new(),
            cache_enabled: config.cache_enabled,
            strict_types: config.strict_types,
        }
    }

    /// Returns the number of cached mappers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if a mapper is cached under `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns the cached identities, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Drops the mapper cached under `id`, returning true if one existed.
    ///
    /// Running executions keep the instance they already hold.
    pub fn evict(&self, id: &str) -> bool {
        let removed = self.entries.remove(id).is_some();
        if removed {
            debug!(mapper = %id, "Evicted cached mapper");
        }
        removed
    }

    /// Drops every cached mapper.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for CachingBaseFactory {
    fn default() -> Self {
        Self::new(&MapperConfig::default())
    }
}

impl std::fmt::Debug for CachingBaseFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingBaseFactory")
            .field("entries", &self.entries.len())
            .field("cache_enabled", &self.cache_enabled)
            .field("strict_types", &self.strict_types)
            .finish()
    }
}

impl BaseMapperFactory for CachingBaseFactory {
    fn new_mapper(
        &self,
        id: &str,
        def: Arc<MapperDef>,
        resolver: Option<Arc<dyn Resolver>>,
    ) -> Result<Arc<dyn Mapper>, MappingError> {
        let mapper = BasicMapper::new(id, def, resolver)?.with_strict_types(self.strict_types);
        Ok(Arc::new(mapper))
    }

    fn get_or_build(
        &self,
        id: &str,
        def: Option<&Arc<MapperDef>>,
        build: &mut MapperBuilder<'_>,
    ) -> Result<Arc<dyn Mapper>, MappingError> {
        if !self.cache_enabled {
            return build();
        }

        if let Some(entry) = self.entries.get(id) {
            trace!(mapper = %id, "Mapper cache hit");
            warn_on_drift(id, entry.def.as_ref(), def);
            return Ok(Arc::clone(&entry.mapper));
        }

        match self.entries.entry(id.to_string()) {
            Entry::Occupied(entry) => {
                warn_on_drift(id, entry.get().def.as_ref(), def);
                Ok(Arc::clone(&entry.get().mapper))
            }
            Entry::Vacant(slot) => {
                let mapper = build()?;
                let fingerprint = def.map(|d| d.fingerprint());
                debug!(
                    mapper = %id,
                    fingerprint = fingerprint.as_deref().unwrap_or("-"),
                    "Built and cached mapper"
                );
                slot.insert(CacheEntry {
                    mapper: Arc::clone(&mapper),
                    def: def.cloned(),
                });
                Ok(mapper)
            }
        }
    }
}

/// Logs when a lookup brings a definition different from the cached one.
///
/// The cached mapper is still returned: the first definition seen for an
/// identity stays in effect until it is evicted.
fn warn_on_drift(id: &str, cached: Option<&Arc<MapperDef>>, requested: Option<&Arc<MapperDef>>) {
    if let (Some(cached), Some(requested)) = (cached, requested) {
        if !Arc::ptr_eq(cached, requested) && cached != requested {
            warn!(
                mapper = %id,
                cached = %cached.fingerprint(),
                requested = %requested.fingerprint(),
                "Mapper definition changed for cached identity; keeping cached mapper"
            );
        }
    }
}
