//! Service container
//!
//! The `Container` is the core of the crate. It keeps the binding registry,
//! alias table, shared instances and extenders, and resolves identifiers into
//! fully constructed object graphs on demand.

use crate::factory::{Binding, Extender, ReboundCallback};
use crate::storage::ServiceStorage;
use crate::{
    Abstract, Arguments, Blueprint, Concrete, DiError, Injectable, Instance, Parameters, Result,
    ServiceProvider, normalize, resolver,
};
use std::cell::RefCell;
use std::sync::Arc;

#[cfg(feature = "logging")]
use crate::logging::TARGET;
#[cfg(feature = "logging")]
use tracing::{debug, trace};

// =============================================================================
// Thread-Local Resolution Stack
// =============================================================================

thread_local! {
    /// Identifiers currently being resolved on this thread, tagged with the
    /// storage they belong to.
    static RESOLVING: RefCell<Vec<(usize, String)>> = const { RefCell::new(Vec::new()) };
}

/// Marks an identifier as in-flight for the lifetime of the guard.
///
/// Entering an identifier that is already in-flight for the same container
/// means the resolution looped back on itself.
struct ResolutionGuard;

impl ResolutionGuard {
    fn enter(owner: usize, id: &str) -> Result<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(start) = stack.iter().position(|(o, i)| *o == owner && i == id) {
                let chain = stack[start..]
                    .iter()
                    .filter(|(o, _)| *o == owner)
                    .map(|(_, i)| i.as_str())
                    .chain(std::iter::once(id));
                return Err(DiError::circular(chain));
            }
            stack.push((owner, id.to_owned()));
            Ok(ResolutionGuard)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

// =============================================================================
// Container
// =============================================================================

/// Dependency injection container.
///
/// Cloning is cheap and yields a handle to the same registry.
///
/// # Examples
///
/// ```rust
/// use service_container::{Blueprint, Concrete, Container};
///
/// #[derive(Default)]
/// struct Mailer;
///
/// let container = Container::new();
/// container.define(Blueprint::of_default::<Mailer>("app::Mailer"));
/// container.singleton("mailer", Some(Concrete::of("app::Mailer"))).unwrap();
///
/// let a = container.make("mailer").unwrap();
/// let b = container.make("mailer").unwrap();
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// ```
#[derive(Clone)]
pub struct Container {
    storage: Arc<ServiceStorage>,
}

impl Container {
    /// Create a new empty container.
    #[inline]
    pub fn new() -> Self {
        #[cfg(feature = "logging")]
        debug!(target: TARGET, "Creating new service container");

        Self {
            storage: Arc::new(ServiceStorage::new()),
        }
    }

    /// Create a container with pre-allocated capacity.
    ///
    /// Use this when you know approximately how many services will be registered.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            capacity = capacity,
            "Creating new service container with capacity"
        );

        Self {
            storage: Arc::new(ServiceStorage::with_capacity(capacity)),
        }
    }

    #[inline]
    pub(crate) fn storage(&self) -> &ServiceStorage {
        &self.storage
    }

    /// Identity of the shared storage, used to tag the resolution stack
    #[inline]
    fn storage_id(&self) -> usize {
        Arc::as_ptr(&self.storage) as usize
    }

    // =========================================================================
    // Blueprints
    // =========================================================================

    /// Describe a constructible type so the container can build it.
    ///
    /// Redefining a name replaces the previous blueprint.
    pub fn define(&self, blueprint: Blueprint) {
        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            blueprint = blueprint.name(),
            type_name = blueprint.type_name(),
            parameters = blueprint.parameters().len(),
            instantiable = blueprint.is_instantiable(),
            "Defining blueprint"
        );

        self.storage.insert_blueprint(blueprint);
    }

    /// Check whether a blueprint exists under `name`.
    #[inline]
    pub fn has_blueprint(&self, name: &str) -> bool {
        self.storage.has_blueprint(normalize(name))
    }

    // =========================================================================
    // Aliases
    // =========================================================================

    /// Make `alias` resolve to `target`.
    ///
    /// Fails with [`DiError::SelfAlias`] when both are the same identifier and
    /// with [`DiError::CircularDependency`] when the new edge would close a loop.
    ///
    /// ```rust
    /// use service_container::Container;
    ///
    /// let container = Container::new();
    /// container.alias("app::Cache", "cache").unwrap();
    ///
    /// assert_eq!(container.get_alias("cache"), "app::Cache");
    /// assert!(container.bound("cache"));
    /// assert!(!container.bound("app::Cache"));
    /// ```
    pub fn alias(&self, target: &str, alias: &str) -> Result<()> {
        let target = normalize(target);
        let alias = normalize(alias);

        if alias == target {
            return Err(DiError::self_alias(alias));
        }

        let mut chain = vec![alias.to_owned(), target.to_owned()];
        let mut current = target.to_owned();
        while let Some(next) = self.storage.alias_target(&current) {
            chain.push(next.clone());
            if next == alias {
                return Err(DiError::circular(chain));
            }
            current = next;
        }

        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            alias = alias,
            service = target,
            "Registering alias"
        );

        self.storage.insert_alias(alias.to_owned(), target.to_owned());
        Ok(())
    }

    /// Check whether `name` is an alias.
    #[inline]
    pub fn is_alias(&self, name: &str) -> bool {
        self.storage.has_alias(normalize(name))
    }

    /// Follow the alias chain from `abstract_` to its canonical identifier.
    ///
    /// Returns the (normalized) input when it is not an alias.
    pub fn get_alias(&self, abstract_: &str) -> String {
        let mut current = normalize(abstract_).to_owned();
        while let Some(target) = self.storage.alias_target(&current) {
            current = target;
        }
        current
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Bind an identifier to a concrete.
    ///
    /// - `abstract_` is an identifier or a `(target, alias)` pair; the pair
    ///   form also registers the alias.
    /// - `concrete` of `None` binds the identifier to its own blueprint.
    /// - `shared` caches the first built instance.
    ///
    /// Rebinding drops any stored instance, and notifies rebind subscribers
    /// when the identifier had already been resolved.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_container::{Blueprint, Concrete, Container};
    ///
    /// #[derive(Default)]
    /// struct FileStore;
    ///
    /// let container = Container::new();
    /// container.define(Blueprint::of_default::<FileStore>("FileStore"));
    /// container
    ///     .bind(("Contracts::Store", "store"), Some(Concrete::of("FileStore")), true)
    ///     .unwrap();
    ///
    /// let a = container.make("Contracts::Store").unwrap();
    /// let b = container.make("store").unwrap();
    /// assert!(std::sync::Arc::ptr_eq(&a, &b));
    /// ```
    pub fn bind(
        &self,
        abstract_: impl Into<Abstract>,
        concrete: Option<Concrete>,
        shared: bool,
    ) -> Result<()> {
        let (id, alias) = abstract_.into().into_parts();

        // The identifier stops being an alias before the pair alias is checked
        self.drop_stale_instances(&id);

        if let Some(alias) = alias {
            self.alias(&id, &alias)?;
        }

        let concrete = concrete.unwrap_or_else(|| Concrete::Type(id.clone()));

        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            service = id.as_str(),
            concrete = ?concrete,
            shared = shared,
            service_count = self.storage.len() + 1,
            "Registering binding"
        );

        self.storage
            .insert_binding(id.clone(), Binding::new(&id, concrete, shared));

        if self.resolved(&id) {
            self.rebound(&id)?;
        }
        Ok(())
    }

    /// Bind only when the identifier is not bound yet.
    pub fn bind_if(
        &self,
        abstract_: impl Into<Abstract>,
        concrete: Option<Concrete>,
        shared: bool,
    ) -> Result<()> {
        let abstract_ = abstract_.into();
        if self.bound(abstract_.id()) {
            #[cfg(feature = "logging")]
            trace!(
                target: TARGET,
                service = abstract_.id(),
                "Already bound, skipping conditional binding"
            );
            return Ok(());
        }
        self.bind(abstract_, concrete, shared)
    }

    /// Register a shared binding.
    #[inline]
    pub fn singleton(&self, abstract_: impl Into<Abstract>, concrete: Option<Concrete>) -> Result<()> {
        self.bind(abstract_, concrete, true)
    }

    /// Register an existing instance.
    ///
    /// The instance short-circuits every later `make` of the identifier.
    /// Replacing the registration of a bound identifier notifies rebind
    /// subscribers.
    ///
    /// ```rust
    /// use service_container::Container;
    /// use std::sync::Arc;
    ///
    /// let container = Container::new();
    /// container.instance("config.port", Arc::new(8080u16)).unwrap();
    ///
    /// assert!(container.resolved("config.port"));
    /// assert_eq!(*container.make_as::<u16>("config.port").unwrap(), 8080);
    /// ```
    pub fn instance(&self, abstract_: impl Into<Abstract>, instance: Instance) -> Result<()> {
        let (id, alias) = abstract_.into().into_parts();

        self.storage.remove_alias(&id);

        if let Some(alias) = alias {
            self.alias(&id, &alias)?;
        }

        let bound = self.bound(&id);

        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            service = id.as_str(),
            replacing = bound,
            "Registering instance"
        );

        self.storage.insert_instance(id.clone(), instance);

        if bound {
            self.rebound(&id)?;
        }
        Ok(())
    }

    /// Decorate an identifier after construction.
    ///
    /// With a stored instance the decorator runs immediately and replaces it.
    /// Otherwise it is queued and runs on every fresh build, in registration
    /// order.
    pub fn extend<F>(&self, abstract_: &str, extender: F) -> Result<()>
    where
        F: Fn(Instance, &Container) -> Instance + Send + Sync + 'static,
    {
        let id = self.get_alias(abstract_);
        let extender: Extender = Arc::new(extender);

        if let Some(instance) = self.storage.instance(&id) {
            #[cfg(feature = "logging")]
            debug!(
                target: TARGET,
                service = id.as_str(),
                "Extending stored instance in place"
            );

            let decorated = extender(instance, self);
            self.storage.insert_instance(id.clone(), decorated);
            return self.rebound(&id);
        }

        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            service = id.as_str(),
            "Queueing extender"
        );

        self.storage.push_extender(&id, extender);
        Ok(())
    }

    /// Subscribe to rebinds of an identifier.
    ///
    /// The callback receives the freshly resolved instance each time the
    /// identifier is rebound after having been resolved.
    pub fn rebinding<F>(&self, abstract_: &str, callback: F)
    where
        F: Fn(&Container, Instance) + Send + Sync + 'static,
    {
        let id = self.get_alias(abstract_);
        let callback: ReboundCallback = Arc::new(callback);
        self.storage.push_rebound_callback(&id, callback);
    }

    /// Let a provider register its bindings.
    pub fn register<P: ServiceProvider + ?Sized>(&self, provider: &P) -> Result<()> {
        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            provider = std::any::type_name::<P>(),
            "Registering service provider"
        );

        provider.register(self)
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Resolve an identifier.
    #[inline]
    pub fn make(&self, abstract_: &str) -> Result<Instance> {
        self.make_with(abstract_, Parameters::new())
    }

    /// Resolve an identifier with explicit parameters.
    ///
    /// Explicit parameters are handed to the factory, or matched against the
    /// blueprint's declared parameters, and are ignored when a stored instance
    /// short-circuits the build.
    pub fn make_with(&self, abstract_: &str, parameters: Parameters) -> Result<Instance> {
        let id = self.get_alias(abstract_);

        if let Some(instance) = self.storage.instance(&id) {
            #[cfg(feature = "logging")]
            trace!(
                target: TARGET,
                service = id.as_str(),
                location = "instances",
                "Service resolved from stored instance"
            );
            return Ok(instance);
        }

        let _guard = ResolutionGuard::enter(self.storage_id(), &id)?;

        #[cfg(feature = "logging")]
        trace!(
            target: TARGET,
            service = id.as_str(),
            parameters = parameters.len(),
            "Resolving service"
        );

        let concrete = self.get_concrete(&id);
        let mut object = match &concrete {
            Concrete::Type(target) if !self.is_buildable(&concrete, &id) => {
                self.make_with(target, parameters)?
            }
            _ => self.build(&concrete, parameters)?,
        };

        for extender in self.storage.extenders(&id) {
            object = extender(object, self);
        }

        if self.is_shared(&id) {
            #[cfg(feature = "logging")]
            debug!(
                target: TARGET,
                service = id.as_str(),
                "Caching shared instance"
            );
            self.storage.insert_instance(id.clone(), Arc::clone(&object));
        }

        self.storage.mark_resolved(&id);
        Ok(object)
    }

    /// Resolve an identifier and downcast it.
    pub fn make_as<T: Injectable>(&self, abstract_: &str) -> Result<Arc<T>> {
        self.make(abstract_)?
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(normalize(abstract_)))
    }

    /// Instantiate a concrete: invoke a factory, or build a blueprint by
    /// resolving its declared parameters.
    pub fn build(&self, concrete: &Concrete, parameters: Parameters) -> Result<Instance> {
        match concrete {
            Concrete::Factory(factory) => factory(self, parameters),
            Concrete::Type(name) => self.build_blueprint(normalize(name), parameters),
        }
    }

    fn build_blueprint(&self, name: &str, parameters: Parameters) -> Result<Instance> {
        let blueprint = self
            .storage
            .blueprint(name)
            .ok_or_else(|| DiError::not_found(name))?;
        let constructor = blueprint
            .constructor()
            .ok_or_else(|| DiError::not_instantiable(name))?;

        if blueprint.parameters().is_empty() {
            #[cfg(feature = "logging")]
            trace!(
                target: TARGET,
                blueprint = name,
                "Building blueprint without parameters"
            );
            return constructor(Arguments::new(name, Vec::new()));
        }

        let mut parameters = resolver::key_parameters_by_argument(blueprint.parameters(), parameters);
        let values =
            resolver::resolve_dependencies(self, blueprint.parameters(), &mut parameters, name)?;

        #[cfg(feature = "logging")]
        trace!(
            target: TARGET,
            blueprint = name,
            arguments = values.len(),
            "Building blueprint"
        );

        constructor(Arguments::new(name, values))
    }

    /// Re-resolve an identifier and notify its rebind subscribers.
    fn rebound(&self, id: &str) -> Result<()> {
        let instance = self.make(id)?;
        let callbacks = self.storage.rebound_callbacks(id);

        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            service = id,
            callbacks = callbacks.len(),
            "Service rebound"
        );

        for callback in callbacks {
            callback(self, Arc::clone(&instance));
        }
        Ok(())
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Check whether an identifier has a binding, an instance or is an alias.
    #[inline]
    pub fn bound(&self, abstract_: &str) -> bool {
        let id = normalize(abstract_);
        self.storage.has_binding(id) || self.storage.has_instance(id) || self.storage.has_alias(id)
    }

    /// Alias for `bound`.
    #[inline]
    pub fn has(&self, id: &str) -> bool {
        self.bound(id)
    }

    /// Resolve a bound identifier; fails with [`DiError::NotFound`] otherwise.
    ///
    /// ```rust
    /// use service_container::Container;
    /// use std::sync::Arc;
    ///
    /// let container = Container::new();
    /// container.set("answer", Arc::new(42u8)).unwrap();
    ///
    /// assert!(container.get("answer").is_ok());
    /// assert!(container.get("question").is_err());
    /// ```
    pub fn get(&self, id: &str) -> Result<Instance> {
        if !self.has(id) {
            #[cfg(feature = "logging")]
            debug!(
                target: TARGET,
                service = id,
                "Service not bound"
            );
            return Err(DiError::not_found(normalize(id)));
        }
        self.make(id)
    }

    /// Typed `get`.
    pub fn get_as<T: Injectable>(&self, id: &str) -> Result<Arc<T>> {
        self.get(id)?
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(normalize(id)))
    }

    /// Check whether an identifier has been resolved or holds an instance.
    pub fn resolved(&self, abstract_: &str) -> bool {
        let id = self.get_alias(abstract_);
        self.storage.is_resolved(&id) || self.storage.has_instance(&id)
    }

    /// The bound factory, or the identifier itself when unbound.
    pub fn get_concrete(&self, abstract_: &str) -> Concrete {
        let id = normalize(abstract_);
        match self.storage.binding(id) {
            Some(binding) => Concrete::Factory(binding.factory),
            None => Concrete::Type(id.to_owned()),
        }
    }

    /// A concrete is built directly when it is a factory or names the
    /// identifier itself; anything else is resolved again through `make`.
    pub fn is_buildable(&self, concrete: &Concrete, abstract_: &str) -> bool {
        match concrete {
            Concrete::Factory(_) => true,
            Concrete::Type(id) => normalize(id) == normalize(abstract_),
        }
    }

    fn is_shared(&self, id: &str) -> bool {
        self.storage.has_instance(id) || self.storage.is_shared_binding(id)
    }

    /// Number of bindings.
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.len() == 0
    }

    /// Bound identifiers, sorted.
    pub fn bindings(&self) -> Vec<String> {
        let mut ids = self.storage.binding_ids();
        ids.sort();
        ids
    }

    // =========================================================================
    // Removal and Value Sugar
    // =========================================================================

    /// Bind an identifier to a fixed value (non-shared binding whose factory
    /// hands out the value).
    pub fn set(&self, id: &str, value: Instance) -> Result<()> {
        self.bind(
            id,
            Some(Concrete::factory(move |_, _| Ok(Arc::clone(&value)))),
            false,
        )
    }

    /// Drop the binding, instance and resolved flag of an identifier.
    ///
    /// Returns whether a binding or instance existed.
    pub fn remove(&self, id: &str) -> bool {
        let id = normalize(id);
        let had_binding = self.storage.remove_binding(id);
        let had_instance = self.storage.remove_instance(id);
        self.storage.clear_resolved(id);

        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            service = id,
            had_binding = had_binding,
            had_instance = had_instance,
            "Service removed"
        );

        had_binding || had_instance
    }

    /// Drop the stored instance of an identifier, keeping its binding.
    pub fn forget_instance(&self, abstract_: &str) -> bool {
        let id = self.get_alias(abstract_);
        self.storage.remove_instance(&id)
    }

    /// Drop every stored instance.
    pub fn forget_instances(&self) {
        self.storage.clear_instances();
    }

    /// Drop every binding, instance, alias, extender and subscriber.
    /// Blueprints are kept.
    pub fn flush(&self) {
        #[cfg(feature = "logging")]
        let count = self.storage.len();

        self.storage.clear();

        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            services_removed = count,
            "Container flushed"
        );
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("storage", &self.storage)
            .finish()
    }
}

impl Container {
    /// Remove any stored instance and alias keyed at `id`.
    fn drop_stale_instances(&self, id: &str) {
        self.storage.remove_instance(id);
        self.storage.remove_alias(id);
    }
}

// =============================================================================
// Tests
// =============================================================================
