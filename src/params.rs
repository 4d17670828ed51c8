//! Explicit parameters and resolved arguments
//!
//! [`Parameters`] is what callers hand to `make_with`/`call`: values keyed by
//! parameter name or by position. [`Arguments`] is what constructors, methods
//! and callables receive once the resolver has matched every declared
//! parameter.

use crate::{DiError, Injectable, Instance, Result};
use ahash::RandomState;
use indexmap::IndexMap;
use std::sync::Arc;

/// Key of an explicit parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    /// Matched against the declared parameter name
    Name(String),
    /// Re-keyed to the name of the declared parameter at this position
    Position(usize),
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Name(name.to_owned())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        ParamKey::Name(name)
    }
}

impl From<usize> for ParamKey {
    fn from(position: usize) -> Self {
        ParamKey::Position(position)
    }
}

/// Caller-supplied parameter overrides, kept in insertion order.
///
/// # Examples
///
/// ```rust
/// use service_container::Parameters;
///
/// let params = Parameters::new().with("retries", 3u32).at(0, "primary");
/// assert_eq!(params.len(), 2);
/// assert!(params.contains("retries"));
/// ```
#[derive(Clone, Default)]
pub struct Parameters {
    entries: IndexMap<ParamKey, Instance, RandomState>,
}

impl Parameters {
    /// Create an empty parameter map
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named value
    pub fn with<T: Injectable>(mut self, name: impl Into<String>, value: T) -> Self {
        self.insert(ParamKey::Name(name.into()), Arc::new(value));
        self
    }

    /// Add a positional value
    pub fn at<T: Injectable>(mut self, position: usize, value: T) -> Self {
        self.insert(ParamKey::Position(position), Arc::new(value));
        self
    }

    /// Add an already type-erased value
    pub fn with_instance(mut self, key: impl Into<ParamKey>, value: Instance) -> Self {
        self.insert(key.into(), value);
        self
    }

    /// Insert a value, returning the one it replaced
    #[inline]
    pub fn insert(&mut self, key: impl Into<ParamKey>, value: Instance) -> Option<Instance> {
        self.entries.insert(key.into(), value)
    }

    /// Remove and return the value stored under `name`, preserving the order
    /// of the remaining entries.
    #[inline]
    pub fn take(&mut self, name: &str) -> Option<Instance> {
        self.entries.shift_remove(&ParamKey::Name(name.to_owned()))
    }

    /// Check whether a named entry exists
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&ParamKey::Name(name.to_owned()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &ParamKey> {
        self.entries.keys()
    }

    /// Consume the map, yielding values in insertion order
    pub fn into_values(self) -> impl Iterator<Item = Instance> {
        self.entries.into_values()
    }

    pub(crate) fn into_entries(self) -> impl Iterator<Item = (ParamKey, Instance)> {
        self.entries.into_iter()
    }
}

impl std::fmt::Debug for Parameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

/// Positional arguments produced by the dependency resolver.
///
/// Accessors downcast on read and report an [`DiError::ArgumentMismatch`]
/// naming the owner when the slot is missing or holds another type.
#[derive(Clone)]
pub struct Arguments {
    owner: String,
    values: Vec<Instance>,
}

impl Arguments {
    /// Wrap resolved values for the construct named `owner`
    pub fn new(owner: impl Into<String>, values: Vec<Instance>) -> Self {
        Self {
            owner: owner.into(),
            values,
        }
    }

    /// Name of the blueprint, method or callable these arguments belong to
    #[inline]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw value at `index`
    #[inline]
    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.values.get(index)
    }

    /// The value at `index` as `Arc<T>`
    pub fn get<T: Injectable>(&self, index: usize) -> Result<Arc<T>> {
        self.values
            .get(index)
            .and_then(|value| Arc::clone(value).downcast::<T>().ok())
            .ok_or_else(|| DiError::argument_mismatch::<T>(&self.owner, index))
    }

    /// The value at `index`, cloned out of its `Arc`.
    ///
    /// Handy for plain values and for services stored as `Arc<dyn Trait>`.
    pub fn value<T: Injectable + Clone>(&self, index: usize) -> Result<T> {
        self.values
            .get(index)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
            .ok_or_else(|| DiError::argument_mismatch::<T>(&self.owner, index))
    }

    /// The value at `index`, or `None` when it holds the `()` null default
    /// of a nullable parameter.
    pub fn optional<T: Injectable>(&self, index: usize) -> Result<Option<Arc<T>>> {
        match self.values.get(index) {
            Some(value) if value.is::<()>() => Ok(None),
            _ => self.get::<T>(index).map(Some),
        }
    }

    /// Consume into the raw values
    #[inline]
    pub fn into_vec(self) -> Vec<Instance> {
        self.values
    }
}

impl std::fmt::Debug for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arguments")
            .field("owner", &self.owner)
            .field("len", &self.values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_consumes_once() {
        let mut params = Parameters::new().with("a", 1i32).with("b", 2i32);

        let a = params.take("a").unwrap();
        assert_eq!(*a.downcast_ref::<i32>().unwrap(), 1);
        assert!(params.take("a").is_none());
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_take_preserves_order() {
        let mut params = Parameters::new()
            .with("a", 1i32)
            .with("b", 2i32)
            .with("c", 3i32);
        params.take("b");

        let keys: Vec<_> = params.keys().cloned().collect();
        assert_eq!(keys, vec![ParamKey::from("a"), ParamKey::from("c")]);
    }

    #[test]
    fn test_positional_and_named_keys_are_distinct() {
        let params = Parameters::new().with("0", 1i32).at(0, 2i32);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_argument_accessors() {
        let args = Arguments::new(
            "demo",
            vec![
                Arc::new(7u8) as Instance,
                Arc::new(String::from("x")) as Instance,
                Arc::new(()) as Instance,
            ],
        );

        assert_eq!(*args.get::<u8>(0).unwrap(), 7);
        assert_eq!(args.value::<String>(1).unwrap(), "x");
        assert!(args.optional::<u8>(2).unwrap().is_none());
        assert_eq!(args.optional::<u8>(0).unwrap().as_deref(), Some(&7));
    }

    #[test]
    fn test_argument_mismatch_names_owner() {
        let args = Arguments::new("demo", vec![Arc::new(7u8) as Instance]);

        match args.get::<String>(0) {
            Err(DiError::ArgumentMismatch { owner, index, .. }) => {
                assert_eq!(owner, "demo");
                assert_eq!(index, 0);
            }
            _ => panic!("expected ArgumentMismatch"),
        }
        assert!(args.get::<u8>(3).is_err());
    }
}
