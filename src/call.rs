//! Callable invocation
//!
//! `Container::call` invokes a free callable, a `"Class@method"` reference or
//! a method on an already built instance, resolving the target's declared
//! parameters through the container.

use crate::blueprint::Callable;
use crate::{
    Arguments, Container, DiError, Injectable, Instance, Parameters, Result, normalize, resolver,
};
use std::sync::Arc;

#[cfg(feature = "logging")]
use crate::logging::TARGET;
#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Something `Container::call` can invoke.
#[derive(Clone)]
pub enum Callback {
    /// A free callable with declared parameters
    Function(Callable),
    /// `"Class@method"`, or a bare class identifier used with a default method
    Target(String),
    /// A method on an existing instance, looked up through its blueprint
    Method { instance: Instance, method: String },
}

impl Callback {
    /// Bind a method name to an already built instance.
    pub fn method(instance: Instance, method: impl Into<String>) -> Self {
        Callback::Method {
            instance,
            method: method.into(),
        }
    }
}

impl From<Callable> for Callback {
    fn from(callable: Callable) -> Self {
        Callback::Function(callable)
    }
}

impl From<&str> for Callback {
    fn from(target: &str) -> Self {
        Callback::Target(target.to_owned())
    }
}

impl From<String> for Callback {
    fn from(target: String) -> Self {
        Callback::Target(target)
    }
}

impl std::fmt::Debug for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callback::Function(callable) => f.debug_tuple("Function").field(&callable.name()).finish(),
            Callback::Target(target) => f.debug_tuple("Target").field(target).finish(),
            Callback::Method { method, .. } => {
                f.debug_struct("Method").field("method", method).finish_non_exhaustive()
            }
        }
    }
}

impl Container {
    /// Invoke a callback, injecting its dependencies.
    ///
    /// - `"Class@method"` makes `Class` and calls `method` on it.
    /// - A bare `"Class"` uses `default_method`, failing with
    ///   [`DiError::MissingMethod`] when there is none.
    /// - Explicit parameters not matched by name are appended after the
    ///   declared ones.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_container::{Blueprint, Container, Parameter, Parameters};
    ///
    /// #[derive(Default)]
    /// struct Greeter;
    ///
    /// let container = Container::new();
    /// container.define(
    ///     Blueprint::of_default::<Greeter>("::app::Greeter").method(
    ///         "greet",
    ///         [Parameter::value("name").default("world")],
    ///         |_: &Greeter, args| Ok(format!("hello {}", args.value::<&str>(0)?)),
    ///     ),
    /// );
    ///
    /// let greeting = container
    ///     .call_as::<String>("::app::Greeter@greet", Parameters::new(), None)
    ///     .unwrap();
    /// assert_eq!(*greeting, "hello world");
    /// ```
    pub fn call(
        &self,
        callback: impl Into<Callback>,
        parameters: Parameters,
        default_method: Option<&str>,
    ) -> Result<Instance> {
        match callback.into() {
            Callback::Function(callable) => self.call_function(&callable, parameters),
            Callback::Target(target) => self.call_class(&target, parameters, default_method),
            Callback::Method { instance, method } => self.call_method(instance, &method, parameters),
        }
    }

    /// Typed `call`.
    pub fn call_as<T: Injectable>(
        &self,
        callback: impl Into<Callback>,
        parameters: Parameters,
        default_method: Option<&str>,
    ) -> Result<Arc<T>> {
        let callback = callback.into();
        let label = match &callback {
            Callback::Function(callable) => callable.name().to_owned(),
            Callback::Target(target) => normalize(target).to_owned(),
            Callback::Method { method, .. } => method.clone(),
        };

        self.call(callback, parameters, default_method)?
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(label))
    }

    fn call_function(&self, callable: &Callable, parameters: Parameters) -> Result<Instance> {
        #[cfg(feature = "logging")]
        trace!(
            target: TARGET,
            callable = callable.name(),
            parameters = parameters.len(),
            "Calling function"
        );

        let values = resolver::resolve_call_dependencies(
            self,
            callable.parameters(),
            parameters,
            callable.name(),
        )?;
        callable.invoke(Arguments::new(callable.name(), values))
    }

    /// Split a `"Class@method"` reference, make the class and call the method.
    fn call_class(
        &self,
        target: &str,
        parameters: Parameters,
        default_method: Option<&str>,
    ) -> Result<Instance> {
        let target = normalize(target);
        let segments: Vec<&str> = target.split('@').collect();

        let method = match segments.as_slice() {
            [_, method] => Some(*method),
            _ => default_method,
        };
        let Some(method) = method else {
            return Err(DiError::missing_method(target));
        };

        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            class = segments[0],
            method = method,
            "Calling class method"
        );

        let instance = self.make(segments[0])?;
        self.call_method(instance, method, parameters)
    }

    /// Call `method` on an instance built from a known blueprint.
    fn call_method(&self, instance: Instance, method: &str, parameters: Parameters) -> Result<Instance> {
        let type_id = (*instance).type_id();
        let blueprint = self
            .storage()
            .blueprint_for_type(&type_id)
            .ok_or_else(|| DiError::undefined_method("<unknown>", method))?;
        let target = blueprint
            .get_method(method)
            .ok_or_else(|| DiError::undefined_method(blueprint.name(), method))?;

        let owner = format!("{}@{}", blueprint.name(), method);
        let values =
            resolver::resolve_call_dependencies(self, target.parameters(), parameters, &owner)?;
        target.invoke(instance, Arguments::new(owner, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Blueprint, Concrete, Parameter};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        hits: AtomicUsize,
    }

    fn define_counter(container: &Container) {
        container.define(
            Blueprint::of_default::<Counter>("Namespaced\\Counter")
                .method("hit", [], |counter: &Counter, _| {
                    Ok(counter.hits.fetch_add(1, Ordering::SeqCst) + 1)
                })
                .method(
                    "add",
                    [Parameter::value("by"), Parameter::value("times").default(1usize)],
                    |counter: &Counter, args| {
                        let by = args.value::<usize>(0)? * args.value::<usize>(1)?;
                        Ok(counter.hits.fetch_add(by, Ordering::SeqCst) + by)
                    },
                ),
        );
    }

    #[test]
    fn test_call_class_at_method() {
        let container = Container::new();
        define_counter(&container);

        let hits = container
            .call_as::<usize>("\\Namespaced\\Counter@hit", Parameters::new(), None)
            .unwrap();
        assert_eq!(*hits, 1);
    }

    #[test]
    fn test_call_uses_shared_binding() {
        let container = Container::new();
        define_counter(&container);
        container.singleton("Namespaced\\Counter", None).unwrap();

        container.call("Namespaced\\Counter@hit", Parameters::new(), None).unwrap();
        let hits = container
            .call_as::<usize>("Namespaced\\Counter@hit", Parameters::new(), None)
            .unwrap();
        assert_eq!(*hits, 2);
    }

    #[test]
    fn test_call_default_method() {
        let container = Container::new();
        define_counter(&container);

        let hits = container
            .call_as::<usize>("Namespaced\\Counter", Parameters::new(), Some("hit"))
            .unwrap();
        assert_eq!(*hits, 1);
    }

    #[test]
    fn test_call_without_method_fails() {
        let container = Container::new();
        define_counter(&container);

        let err = container
            .call("Namespaced\\Counter", Parameters::new(), None)
            .unwrap_err();
        assert_eq!(err, DiError::missing_method("Namespaced\\Counter"));
    }

    #[test]
    fn test_call_undefined_method() {
        let container = Container::new();
        define_counter(&container);

        let err = container
            .call("Namespaced\\Counter@nope", Parameters::new(), None)
            .unwrap_err();
        assert_eq!(err, DiError::undefined_method("Namespaced\\Counter", "nope"));
    }

    #[test]
    fn test_call_method_with_named_and_positional_parameters() {
        let container = Container::new();
        define_counter(&container);

        let named = container
            .call_as::<usize>(
                "Namespaced\\Counter@add",
                Parameters::new().with("by", 3usize).with("times", 2usize),
                None,
            )
            .unwrap();
        assert_eq!(*named, 6);

        let err = container
            .call("Namespaced\\Counter@add", Parameters::new(), None)
            .unwrap_err();
        assert!(matches!(err, DiError::ArgumentMismatch { index: 1, .. }));
    }

    #[test]
    fn test_call_bound_instance_method() {
        let container = Container::new();
        define_counter(&container);

        let counter = container.make("Namespaced\\Counter").unwrap();
        container
            .call(Callback::method(Arc::clone(&counter), "hit"), Parameters::new(), None)
            .unwrap();

        assert_eq!(
            counter.downcast_ref::<Counter>().unwrap().hits.load(Ordering::SeqCst),
            1
        );
    }

    #[test]
    fn test_call_method_on_unknown_type() {
        let container = Container::new();
        let err = container
            .call(Callback::method(Arc::new(1u8), "hit"), Parameters::new(), None)
            .unwrap_err();
        assert!(matches!(err, DiError::UndefinedMethod { .. }));
    }

    #[test]
    fn test_call_function_injects_services() {
        let container = Container::new();
        container
            .singleton("config.port", Some(Concrete::service(|_, _| Ok(8080u16))))
            .unwrap();

        let describe = Callable::new("describe", |args| {
            Ok(format!("{}:{}", args.value::<String>(0)?, args.get::<u16>(1)?))
        })
        .param(Parameter::value("host"))
        .param(Parameter::class("port", "config.port"));

        let address = container
            .call_as::<String>(
                describe,
                Parameters::new().with("host", String::from("localhost")),
                None,
            )
            .unwrap();
        assert_eq!(*address, "localhost:8080");
    }

    #[test]
    fn test_call_function_positional_fills_scalar() {
        let container = Container::new();
        let echo = Callable::new("echo", |args| args.value::<i32>(0)).param(Parameter::value("a"));

        let value = container
            .call_as::<i32>(echo, Parameters::new().at(0, 5i32), None)
            .unwrap();
        assert_eq!(*value, 5);
    }

    #[test]
    fn test_call_function_appends_extra_parameters() {
        let container = Container::new();
        let count = Callable::new("count", |args| Ok(args.len()));

        let total = container
            .call_as::<usize>(
                count,
                Parameters::new().at(0, 1u8).with("extra", 2u8),
                None,
            )
            .unwrap();
        assert_eq!(*total, 2);
    }

    #[test]
    fn test_call_as_type_mismatch() {
        let container = Container::new();
        let unit = Callable::new("unit", |_| Ok(()));

        let err = container
            .call_as::<String>(unit, Parameters::new(), None)
            .unwrap_err();
        assert!(matches!(err, DiError::TypeMismatch { .. }));
    }
}
