//! Blueprints: explicit dependency manifests
//!
//! Rust has no runtime reflection over constructor signatures, so every type
//! the container should be able to build on its own is described up front by a
//! [`Blueprint`]: its parameters (name, class identifier or plain value, and an
//! optional default), a constructor closure, and any methods reachable through
//! `call("Class@method")`. Free functions handed to `call` are described the
//! same way by a [`Callable`].
//!
//! # Example
//!
//! ```rust
//! use service_container::{Blueprint, Parameter};
//!
//! struct Mailer { host: String, port: u16 }
//!
//! let blueprint = Blueprint::new("app::Mailer", |args| {
//!     Ok(Mailer { host: args.value::<String>(0)?, port: args.value::<u16>(1)? })
//! })
//! .param(Parameter::value("host").default(String::from("localhost")))
//! .param(Parameter::value("port").default(25u16))
//! .method("host", [], |mailer: &Mailer, _args| Ok(mailer.host.clone()));
//!
//! assert_eq!(blueprint.parameters().len(), 2);
//! assert!(blueprint.get_method("host").is_some());
//! ```

use crate::{Arguments, DiError, Injectable, Instance, Result, normalize};
use ahash::RandomState;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// Type-erased constructor
pub type Constructor = Arc<dyn Fn(Arguments) -> Result<Instance> + Send + Sync>;

/// Type-erased method: receives the resolved object and its arguments
pub type MethodFn = Arc<dyn Fn(Instance, Arguments) -> Result<Instance> + Send + Sync>;

/// Type-erased free function
pub type FunctionFn = Arc<dyn Fn(Arguments) -> Result<Instance> + Send + Sync>;

// =============================================================================
// Parameter
// =============================================================================

/// What a declared parameter expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// A service, resolved through the container by identifier
    Class(String),
    /// A plain value; only explicit parameters or defaults can satisfy it
    Value,
}

/// One declared parameter of a constructor, method or callable.
#[derive(Clone)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    default: Option<Instance>,
}

impl Parameter {
    /// A parameter resolved by making the service `id`
    pub fn class(name: impl Into<String>, id: &str) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Class(normalize(id).to_owned()),
            default: None,
        }
    }

    /// A plain value parameter
    pub fn value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Value,
            default: None,
        }
    }

    /// Set the default value
    pub fn default<T: Injectable>(self, value: T) -> Self {
        self.default_instance(Arc::new(value))
    }

    /// Set an already type-erased default value
    pub fn default_instance(mut self, value: Instance) -> Self {
        self.default = Some(value);
        self
    }

    /// Default to the `()` null marker; read it back with
    /// [`Arguments::optional`].
    pub fn nullable(self) -> Self {
        self.default_instance(Arc::new(()))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    /// The service identifier for class parameters
    #[inline]
    pub fn class_name(&self) -> Option<&str> {
        match &self.kind {
            ParameterKind::Class(id) => Some(id),
            ParameterKind::Value => None,
        }
    }

    #[inline]
    pub fn default_value(&self) -> Option<&Instance> {
        self.default.as_ref()
    }

    /// A parameter with a default may be left unresolved
    #[inline]
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("optional", &self.is_optional())
            .finish()
    }
}

// =============================================================================
// Method
// =============================================================================

/// A method callable on instances built from a blueprint
#[derive(Clone)]
pub struct Method {
    name: String,
    parameters: Vec<Parameter>,
    invoke: MethodFn,
}

impl Method {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Invoke on `target` with already resolved arguments
    #[inline]
    pub fn invoke(&self, target: Instance, args: Arguments) -> Result<Instance> {
        (self.invoke)(target, args)
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish()
    }
}

// =============================================================================
// Blueprint
// =============================================================================

/// Dependency manifest for a constructible (or explicitly abstract) type.
pub struct Blueprint {
    name: String,
    type_id: Option<TypeId>,
    type_name: &'static str,
    parameters: Vec<Parameter>,
    constructor: Option<Constructor>,
    methods: HashMap<String, Method, RandomState>,
}

impl Blueprint {
    /// Describe a type built by `constructor` from its resolved parameters.
    pub fn new<T, F>(name: impl AsRef<str>, constructor: F) -> Self
    where
        T: Injectable,
        F: Fn(Arguments) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            name: normalize(name.as_ref()).to_owned(),
            type_id: Some(TypeId::of::<T>()),
            type_name: std::any::type_name::<T>(),
            parameters: Vec::new(),
            constructor: Some(Arc::new(move |args| {
                constructor(args).map(|value| Arc::new(value) as Instance)
            })),
            methods: HashMap::default(),
        }
    }

    /// Describe a type without constructor parameters, built via `Default`.
    pub fn of_default<T: Injectable + Default>(name: impl AsRef<str>) -> Self {
        Self::new(name, |_| Ok(T::default()))
    }

    /// Describe an abstract type: known to the container, never built.
    pub fn interface(name: impl AsRef<str>) -> Self {
        Self {
            name: normalize(name.as_ref()).to_owned(),
            type_id: None,
            type_name: "interface",
            parameters: Vec::new(),
            constructor: None,
            methods: HashMap::default(),
        }
    }

    /// Append a constructor parameter
    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Add a method reachable through `call("Name@method")`.
    pub fn method<T, R, F>(
        mut self,
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = Parameter>,
        method: F,
    ) -> Self
    where
        T: Injectable,
        R: Injectable,
        F: Fn(&T, Arguments) -> Result<R> + Send + Sync + 'static,
    {
        let name = name.into();
        let owner = format!("{}@{}", self.name, name);
        let invoke: MethodFn = Arc::new(move |target: Instance, args: Arguments| {
            let target = target
                .downcast::<T>()
                .map_err(|_| DiError::type_mismatch::<T>(owner.as_str()))?;
            method(&target, args).map(|value| Arc::new(value) as Instance)
        });

        self.methods.insert(
            name.clone(),
            Method {
                name,
                parameters: parameters.into_iter().collect(),
                invoke,
            },
        );
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `TypeId` of the built type; `None` for interfaces
    #[inline]
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    #[inline]
    pub fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }

    #[inline]
    pub fn get_method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    #[inline]
    pub(crate) fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }
}

impl std::fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blueprint")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("parameters", &self.parameters)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// Callable
// =============================================================================

/// A free function with declared parameters, invoked through `call`.
///
/// ```rust
/// use service_container::{Callable, Container, Parameter, Parameters};
///
/// let add = Callable::new("add", |args| Ok(args.value::<i32>(0)? + args.value::<i32>(1)?))
///     .param(Parameter::value("a"))
///     .param(Parameter::value("b").default(1i32));
///
/// let container = Container::new();
/// let sum = container
///     .call_as::<i32>(add, Parameters::new().with("a", 1i32), None)
///     .unwrap();
/// assert_eq!(*sum, 2);
/// ```
#[derive(Clone)]
pub struct Callable {
    name: String,
    parameters: Vec<Parameter>,
    func: FunctionFn,
}

impl Callable {
    pub fn new<R, F>(name: impl Into<String>, func: F) -> Self
    where
        R: Injectable,
        F: Fn(Arguments) -> Result<R> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            func: Arc::new(move |args| func(args).map(|value| Arc::new(value) as Instance)),
        }
    }

    /// Append a parameter
    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    #[inline]
    pub fn invoke(&self, args: Arguments) -> Result<Instance> {
        (self.func)(args)
    }
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Plain;

    struct Named {
        label: String,
    }

    #[test]
    fn test_blueprint_names_are_normalized() {
        let blueprint = Blueprint::of_default::<Plain>("::app::Plain");
        assert_eq!(blueprint.name(), "app::Plain");
        assert_eq!(blueprint.type_id(), Some(TypeId::of::<Plain>()));
        assert!(blueprint.is_instantiable());
    }

    #[test]
    fn test_interface_is_not_instantiable() {
        let blueprint = Blueprint::interface("\\Contracts\\Cache");
        assert_eq!(blueprint.name(), "Contracts\\Cache");
        assert!(!blueprint.is_instantiable());
        assert!(blueprint.type_id().is_none());
    }

    #[test]
    fn test_parameter_kinds() {
        let book = Parameter::class("book", "::BookInterface");
        assert_eq!(book.class_name(), Some("BookInterface"));
        assert!(!book.is_optional());

        let retries = Parameter::value("retries").default(3u32);
        assert_eq!(retries.class_name(), None);
        assert!(retries.is_optional());

        let cache = Parameter::class("cache", "Cache").nullable();
        assert!(cache.default_value().unwrap().is::<()>());
    }

    #[test]
    fn test_constructor_and_method() {
        let blueprint = Blueprint::new("Named", |args| {
            Ok(Named {
                label: args.value::<String>(0)?,
            })
        })
        .param(Parameter::value("label"))
        .method("label", [], |named: &Named, _| Ok(named.label.clone()));

        let constructor = blueprint.constructor().unwrap();
        let object = constructor(Arguments::new(
            "Named",
            vec![Arc::new(String::from("hello")) as Instance],
        ))
        .unwrap();

        let method = blueprint.get_method("label").unwrap();
        let label = method
            .invoke(object, Arguments::new("Named@label", Vec::new()))
            .unwrap();
        assert_eq!(label.downcast_ref::<String>().unwrap(), "hello");
    }

    #[test]
    fn test_method_rejects_foreign_instance() {
        let blueprint =
            Blueprint::of_default::<Plain>("Plain").method("noop", [], |_: &Plain, _| Ok(()));

        let err = blueprint
            .get_method("noop")
            .unwrap()
            .invoke(Arc::new(5u8), Arguments::new("Plain@noop", Vec::new()))
            .unwrap_err();
        assert!(matches!(err, DiError::TypeMismatch { .. }));
    }
}
