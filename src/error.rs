//! Error types for the service container

use thiserror::Error;

/// Errors that can occur while registering or resolving services
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// An alias was pointed at itself
    #[error("[{id}] is aliased to itself")]
    SelfAlias { id: String },

    /// Identifier is neither bound nor described by a blueprint
    #[error("Target [{id}] is not bound and has no blueprint")]
    NotFound { id: String },

    /// Blueprint describes an abstract type (interface) that cannot be built
    #[error("Target [{id}] is not instantiable")]
    NotInstantiable { id: String },

    /// A plain value parameter had neither an explicit value nor a default
    #[error("Unresolvable dependency resolving [{parameter}] in [{declaring}]")]
    UnresolvableDependency { parameter: String, declaring: String },

    /// `call` was given a class reference without a method name
    #[error("Method not provided for [{target}]")]
    MissingMethod { target: String },

    /// The resolved object has no method with that name
    #[error("Method [{method}] is not defined on [{class}]")]
    UndefinedMethod { class: String, method: String },

    /// Resolution or aliasing looped back on itself
    #[error("Circular dependency detected while resolving: {chain}")]
    CircularDependency { chain: String },

    /// A resolved service is not of the requested type
    #[error("Service [{id}] is not a {expected}")]
    TypeMismatch { id: String, expected: &'static str },

    /// A constructor or callable read an argument that is missing or mistyped
    #[error("Argument #{index} of [{owner}] is missing or not a {expected}")]
    ArgumentMismatch {
        owner: String,
        index: usize,
        expected: &'static str,
    },

    /// Factory failed to create service
    #[error("Failed to create service [{id}]: {reason}")]
    CreationFailed { id: String, reason: String },
}

impl DiError {
    /// Create a SelfAlias error
    #[inline]
    pub fn self_alias(id: impl Into<String>) -> Self {
        Self::SelfAlias { id: id.into() }
    }

    /// Create a NotFound error
    #[inline]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a NotInstantiable error
    #[inline]
    pub fn not_instantiable(id: impl Into<String>) -> Self {
        Self::NotInstantiable { id: id.into() }
    }

    /// Create an UnresolvableDependency error
    #[inline]
    pub fn unresolvable(parameter: impl Into<String>, declaring: impl Into<String>) -> Self {
        Self::UnresolvableDependency {
            parameter: parameter.into(),
            declaring: declaring.into(),
        }
    }

    /// Create a MissingMethod error
    #[inline]
    pub fn missing_method(target: impl Into<String>) -> Self {
        Self::MissingMethod {
            target: target.into(),
        }
    }

    /// Create an UndefinedMethod error
    #[inline]
    pub fn undefined_method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UndefinedMethod {
            class: class.into(),
            method: method.into(),
        }
    }

    /// Create a CircularDependency error from the identifiers forming the loop
    pub fn circular<I, S>(chain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let chain = chain
            .into_iter()
            .map(|id| id.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join(" -> ");
        Self::CircularDependency { chain }
    }

    /// Create a TypeMismatch error for a service that is not a `T`
    #[inline]
    pub fn type_mismatch<T: ?Sized + 'static>(id: impl Into<String>) -> Self {
        Self::TypeMismatch {
            id: id.into(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// Create an ArgumentMismatch error for an argument that is not a `T`
    #[inline]
    pub fn argument_mismatch<T: ?Sized + 'static>(owner: impl Into<String>, index: usize) -> Self {
        Self::ArgumentMismatch {
            owner: owner.into(),
            index,
            expected: std::any::type_name::<T>(),
        }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_chain_formatting() {
        let err = DiError::circular(["a", "b", "a"]);
        assert_eq!(
            err.to_string(),
            "Circular dependency detected while resolving: a -> b -> a"
        );
    }

    #[test]
    fn test_messages_name_the_identifier() {
        assert_eq!(
            DiError::self_alias("foo").to_string(),
            "[foo] is aliased to itself"
        );
        assert_eq!(
            DiError::unresolvable("a", "adder").to_string(),
            "Unresolvable dependency resolving [a] in [adder]"
        );
        assert!(DiError::type_mismatch::<u32>("n").to_string().contains("u32"));
    }
}
