//! Provider traits
//!
//! [`Injectable`] bounds what the container can store and hand out.
//! [`ServiceProvider`] groups related registrations behind one entry point.

use crate::{Container, Result};
use std::any::TypeId;

/// Marker trait for types the container can store.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`.
/// You never need to implement this manually.
pub trait Injectable: Send + Sync + 'static {
    /// Returns the TypeId of this type (for internal use)
    #[inline]
    fn type_id_of() -> TypeId
    where
        Self: Sized,
    {
        TypeId::of::<Self>()
    }

    /// Returns the type name for debugging
    #[inline]
    fn type_name_of() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }
}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: Send + Sync + 'static> Injectable for T {}

/// Bundles related `bind` / `alias` / `singleton` calls.
///
/// The container knows nothing about discovery or ordering of providers;
/// callers pass each one to [`Container::register`].
///
/// # Examples
///
/// ```rust
/// use service_container::{Concrete, Container, Result, ServiceProvider};
///
/// struct CacheProvider;
///
/// impl ServiceProvider for CacheProvider {
///     fn register(&self, container: &Container) -> Result<()> {
///         container.singleton(
///             ("Contracts::Cache", "cache"),
///             Some(Concrete::service(|_, _| Ok(std::collections::HashMap::<String, String>::new()))),
///         )
///     }
/// }
///
/// let container = Container::new();
/// container.register(&CacheProvider).unwrap();
/// assert!(container.bound("cache"));
/// ```
pub trait ServiceProvider {
    fn register(&self, container: &Container) -> Result<()>;
}

impl<F> ServiceProvider for F
where
    F: Fn(&Container) -> Result<()>,
{
    fn register(&self, container: &Container) -> Result<()> {
        self(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Blueprint, Concrete, DiError};

    #[derive(Default)]
    struct Mailer;

    struct MailProvider;

    impl ServiceProvider for MailProvider {
        fn register(&self, container: &Container) -> Result<()> {
            container.define(Blueprint::of_default::<Mailer>("Mailer"));
            container.singleton("Mailer", None)?;
            container.alias("Mailer", "mailer")
        }
    }

    #[test]
    fn test_type_name_of() {
        assert!(Mailer::type_name_of().ends_with("Mailer"));
        assert_eq!(Mailer::type_id_of(), TypeId::of::<Mailer>());
    }

    #[test]
    fn test_provider_registers_bindings() {
        let container = Container::new();
        container.register(&MailProvider).unwrap();

        let a = container.make("mailer").unwrap();
        let b = container.make("Mailer").unwrap();
        assert!(std::sync::Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_closure_provider_and_error_propagation() {
        let container = Container::new();
        let provider = |c: &Container| -> Result<()> {
            c.bind("job", Some(Concrete::service(|_, _| Ok(1u8))), false)?;
            c.alias("job", "job")
        };

        assert_eq!(
            container.register(&provider).unwrap_err(),
            DiError::self_alias("job")
        );
        assert!(container.bound("job"));
    }

    #[test]
    fn test_trait_object_provider() {
        let providers: Vec<Box<dyn ServiceProvider>> = vec![Box::new(MailProvider)];
        let container = Container::new();
        for provider in &providers {
            container.register(provider.as_ref()).unwrap();
        }
        assert!(container.is_alias("mailer"));
    }
}
