//! Registry tables backing the container
//!
//! Uses DashMap for lock-free concurrent access. Every accessor clones its
//! value out before returning, so no shard guard outlives the call. This is
//! what keeps re-entrant resolution (a factory calling back into the
//! container) from deadlocking.

use crate::blueprint::Blueprint;
use crate::factory::{Binding, Extender, Instance, ReboundCallback};
use ahash::RandomState;
use dashmap::{DashMap, DashSet};
use std::any::TypeId;
use std::sync::Arc;

/// All mutable state of one container.
pub(crate) struct ServiceStorage {
    /// Canonical identifier -> factory + shared flag
    bindings: DashMap<String, Binding, RandomState>,
    /// Canonical identifier -> built shared instance
    instances: DashMap<String, Instance, RandomState>,
    /// Alias name -> identifier it points at
    aliases: DashMap<String, String, RandomState>,
    /// Canonical identifier -> pending decorators, in registration order
    extenders: DashMap<String, Vec<Extender>, RandomState>,
    /// Identifiers produced at least once
    resolved: DashSet<String, RandomState>,
    /// Canonical identifier -> rebind subscribers
    rebound_callbacks: DashMap<String, Vec<ReboundCallback>, RandomState>,
    /// Blueprint name -> manifest
    blueprints: DashMap<String, Arc<Blueprint>, RandomState>,
    /// Built type -> blueprint name, for method lookup on resolved objects
    blueprint_types: DashMap<TypeId, String, RandomState>,
}

impl ServiceStorage {
    /// Create new empty storage with optimized shard count.
    ///
    /// Default DashMap uses num_cpus * 4 shards which is overkill for
    /// typical containers with <50 services.
    #[inline]
    pub fn new() -> Self {
        Self::with_shards(0, 8)
    }

    /// Create with pre-allocated capacity and a shard count scaled to it.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        let shard_amount = if capacity <= 16 {
            8
        } else if capacity <= 64 {
            16
        } else {
            32
        };
        Self::with_shards(capacity, shard_amount)
    }

    fn with_shards(capacity: usize, shards: usize) -> Self {
        Self {
            bindings: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shards,
            ),
            instances: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shards,
            ),
            aliases: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                shards,
            ),
            extenders: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                shards,
            ),
            resolved: DashSet::with_capacity_and_hasher(capacity, RandomState::new()),
            rebound_callbacks: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                shards,
            ),
            blueprints: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shards,
            ),
            blueprint_types: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shards,
            ),
        }
    }

    // =========================================================================
    // Bindings
    // =========================================================================

    #[inline]
    pub fn insert_binding(&self, id: String, binding: Binding) {
        self.bindings.insert(id, binding);
    }

    #[inline]
    pub fn binding(&self, id: &str) -> Option<Binding> {
        self.bindings.get(id).map(|b| b.value().clone())
    }

    #[inline]
    pub fn has_binding(&self, id: &str) -> bool {
        self.bindings.contains_key(id)
    }

    #[inline]
    pub fn is_shared_binding(&self, id: &str) -> bool {
        self.bindings.get(id).is_some_and(|b| b.shared)
    }

    #[inline]
    pub fn remove_binding(&self, id: &str) -> bool {
        self.bindings.remove(id).is_some()
    }

    /// All bound identifiers (unordered)
    pub fn binding_ids(&self) -> Vec<String> {
        self.bindings.iter().map(|r| r.key().clone()).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    // =========================================================================
    // Instances
    // =========================================================================

    #[inline]
    pub fn insert_instance(&self, id: String, instance: Instance) {
        self.instances.insert(id, instance);
    }

    #[inline]
    pub fn instance(&self, id: &str) -> Option<Instance> {
        self.instances.get(id).map(|i| Arc::clone(i.value()))
    }

    #[inline]
    pub fn has_instance(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }

    #[inline]
    pub fn remove_instance(&self, id: &str) -> bool {
        self.instances.remove(id).is_some()
    }

    #[inline]
    pub fn clear_instances(&self) {
        self.instances.clear();
    }

    // =========================================================================
    // Aliases
    // =========================================================================

    #[inline]
    pub fn insert_alias(&self, alias: String, target: String) {
        self.aliases.insert(alias, target);
    }

    #[inline]
    pub fn alias_target(&self, alias: &str) -> Option<String> {
        self.aliases.get(alias).map(|t| t.value().clone())
    }

    #[inline]
    pub fn has_alias(&self, alias: &str) -> bool {
        self.aliases.contains_key(alias)
    }

    #[inline]
    pub fn remove_alias(&self, alias: &str) -> bool {
        self.aliases.remove(alias).is_some()
    }

    // =========================================================================
    // Extenders
    // =========================================================================

    pub fn push_extender(&self, id: &str, extender: Extender) {
        self.extenders
            .entry(id.to_owned())
            .or_default()
            .push(extender);
    }

    /// Snapshot of the pending decorators for `id`
    pub fn extenders(&self, id: &str) -> Vec<Extender> {
        self.extenders
            .get(id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    // =========================================================================
    // Resolved flags
    // =========================================================================

    #[inline]
    pub fn mark_resolved(&self, id: &str) {
        if !self.resolved.contains(id) {
            self.resolved.insert(id.to_owned());
        }
    }

    #[inline]
    pub fn is_resolved(&self, id: &str) -> bool {
        self.resolved.contains(id)
    }

    #[inline]
    pub fn clear_resolved(&self, id: &str) {
        self.resolved.remove(id);
    }

    // =========================================================================
    // Rebound callbacks
    // =========================================================================

    pub fn push_rebound_callback(&self, id: &str, callback: ReboundCallback) {
        self.rebound_callbacks
            .entry(id.to_owned())
            .or_default()
            .push(callback);
    }

    /// Snapshot of the rebind subscribers for `id`
    pub fn rebound_callbacks(&self, id: &str) -> Vec<ReboundCallback> {
        self.rebound_callbacks
            .get(id)
            .map(|c| c.value().clone())
            .unwrap_or_default()
    }

    // =========================================================================
    // Blueprints
    // =========================================================================

    pub fn insert_blueprint(&self, blueprint: Blueprint) {
        let name = blueprint.name().to_owned();
        if let Some(type_id) = blueprint.type_id() {
            self.blueprint_types.insert(type_id, name.clone());
        }
        self.blueprints.insert(name, Arc::new(blueprint));
    }

    #[inline]
    pub fn blueprint(&self, name: &str) -> Option<Arc<Blueprint>> {
        self.blueprints.get(name).map(|b| Arc::clone(b.value()))
    }

    #[inline]
    pub fn has_blueprint(&self, name: &str) -> bool {
        self.blueprints.contains_key(name)
    }

    /// The blueprint that builds values of `type_id`, if any
    pub fn blueprint_for_type(&self, type_id: &TypeId) -> Option<Arc<Blueprint>> {
        let name = self.blueprint_types.get(type_id).map(|n| n.value().clone())?;
        self.blueprint(&name)
    }

    // =========================================================================
    // Whole-container operations
    // =========================================================================

    /// Drop every registration. Blueprints survive: they describe types, not
    /// wiring.
    pub fn clear(&self) {
        self.bindings.clear();
        self.instances.clear();
        self.aliases.clear();
        self.extenders.clear();
        self.resolved.clear();
        self.rebound_callbacks.clear();
    }
}

impl Default for ServiceStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceStorage")
            .field("bindings", &self.bindings.len())
            .field("instances", &self.instances.len())
            .field("aliases", &self.aliases.len())
            .field("blueprints", &self.blueprints.len())
            .finish()
    }
}
