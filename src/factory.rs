//! Factory types for creating service instances
//!
//! Every binding ends up as a type-erased [`Factory`]. Concretes given as a
//! type identifier are wrapped at bind time: the wrapper builds the type itself
//! when it names the bound identifier, and otherwise resolves the other
//! identifier through `make`.

use crate::{Container, Injectable, Parameters, Result, normalize};
use std::any::Any;
use std::sync::Arc;

/// A resolved service, type-erased
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Type-erased factory: `(container, explicit parameters) -> instance`
pub type Factory = Arc<dyn Fn(&Container, Parameters) -> Result<Instance> + Send + Sync>;

/// Post-construction decorator: `(instance, container) -> instance`
pub type Extender = Arc<dyn Fn(Instance, &Container) -> Instance + Send + Sync>;

/// Subscriber notified with the fresh instance when an identifier is rebound
pub type ReboundCallback = Arc<dyn Fn(&Container, Instance) + Send + Sync>;

// =============================================================================
// Concrete
// =============================================================================

/// What an identifier is bound to.
#[derive(Clone)]
pub enum Concrete {
    /// Invoked with the container and the explicit parameters
    Factory(Factory),
    /// Another identifier, or the blueprint name to build
    Type(String),
}

impl Concrete {
    /// Bind to another identifier or blueprint
    #[inline]
    pub fn of(id: &str) -> Self {
        Concrete::Type(normalize(id).to_owned())
    }

    /// Bind to a type-erased factory.
    ///
    /// ```rust
    /// use service_container::{Concrete, Container, Instance};
    /// use std::sync::Arc;
    ///
    /// let container = Container::new();
    /// container
    ///     .bind("answer", Some(Concrete::factory(|_, _| Ok(Arc::new(42u32) as Instance))), false)
    ///     .unwrap();
    /// assert_eq!(*container.make_as::<u32>("answer").unwrap(), 42);
    /// ```
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&Container, Parameters) -> Result<Instance> + Send + Sync + 'static,
    {
        Concrete::Factory(Arc::new(factory))
    }

    /// Bind to a factory producing a typed service.
    ///
    /// ```rust
    /// use service_container::{Concrete, Container};
    ///
    /// struct Clock { offset: i64 }
    ///
    /// let container = Container::new();
    /// container.singleton("clock", Some(Concrete::service(|_, _| Ok(Clock { offset: 0 })))).unwrap();
    /// assert_eq!(container.make_as::<Clock>("clock").unwrap().offset, 0);
    /// ```
    pub fn service<T, F>(factory: F) -> Self
    where
        T: Injectable,
        F: Fn(&Container, Parameters) -> Result<T> + Send + Sync + 'static,
    {
        Concrete::Factory(Arc::new(move |container: &Container, parameters: Parameters| {
            factory(container, parameters).map(|value| Arc::new(value) as Instance)
        }))
    }

    #[inline]
    pub fn is_factory(&self) -> bool {
        matches!(self, Concrete::Factory(_))
    }
}

impl From<&str> for Concrete {
    fn from(id: &str) -> Self {
        Concrete::of(id)
    }
}

impl From<String> for Concrete {
    fn from(id: String) -> Self {
        Concrete::of(&id)
    }
}

impl std::fmt::Debug for Concrete {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Concrete::Factory(_) => f.write_str("Factory"),
            Concrete::Type(id) => f.debug_tuple("Type").field(id).finish(),
        }
    }
}

// =============================================================================
// Binding
// =============================================================================

/// A registry entry: the factory and whether its product is shared.
#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) factory: Factory,
    pub(crate) shared: bool,
}

impl Binding {
    /// Normalize a concrete into a factory bound under `abstract_id`.
    pub(crate) fn new(abstract_id: &str, concrete: Concrete, shared: bool) -> Self {
        let factory = match concrete {
            Concrete::Factory(factory) => factory,
            Concrete::Type(id) => Self::closure(abstract_id, normalize(&id).to_owned()),
        };
        Self { factory, shared }
    }

    /// Wrap a type identifier: build it when it is the bound identifier
    /// itself, otherwise resolve it through `make`.
    fn closure(abstract_id: &str, concrete: String) -> Factory {
        if abstract_id == concrete {
            Arc::new(move |container: &Container, parameters: Parameters| {
                container.build(&Concrete::Type(concrete.clone()), parameters)
            })
        } else {
            Arc::new(move |container: &Container, parameters: Parameters| {
                container.make_with(&concrete, parameters)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Blueprint;

    #[derive(Default)]
    struct Widget;

    #[test]
    fn test_concrete_from_str_is_normalized() {
        match Concrete::from("::app::Widget") {
            Concrete::Type(id) => assert_eq!(id, "app::Widget"),
            Concrete::Factory(_) => panic!("expected a type concrete"),
        }
    }

    #[test]
    fn test_self_binding_closure_builds() {
        let container = Container::new();
        container.define(Blueprint::of_default::<Widget>("Widget"));

        let binding = Binding::new("Widget", Concrete::of("Widget"), false);
        let built = (binding.factory)(&container, Parameters::new()).unwrap();
        assert!(built.is::<Widget>());
        assert!(!binding.shared);
    }

    #[test]
    fn test_indirect_closure_makes_target() {
        let container = Container::new();
        container
            .singleton(
                "widget.shared",
                Some(Concrete::service(|_, _| Ok(Widget))),
            )
            .unwrap();

        let binding = Binding::new("widget", Concrete::of("widget.shared"), false);
        let a = (binding.factory)(&container, Parameters::new()).unwrap();
        let b = (binding.factory)(&container, Parameters::new()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_service_factory_erases_type() {
        let concrete = Concrete::service(|_, _| Ok(7u16));
        assert!(concrete.is_factory());

        let Concrete::Factory(factory) = concrete else {
            unreachable!()
        };
        let value = factory(&Container::new(), Parameters::new()).unwrap();
        assert_eq!(*value.downcast_ref::<u16>().unwrap(), 7);
    }
}
