//! Service identifiers
//!
//! Every public entry point funnels identifiers through [`normalize`] so that
//! `"::app::Mailer"`, `"\\app\\Mailer"` style prefixes and the bare name all
//! land on the same table key.

/// Strip leading namespace separators (`\` and `::`) from an identifier.
///
/// ```rust
/// use service_container::normalize;
///
/// assert_eq!(normalize("::app::Mailer"), "app::Mailer");
/// assert_eq!(normalize("\\App\\Mailer"), "App\\Mailer");
/// assert_eq!(normalize("mailer"), "mailer");
/// ```
#[inline]
pub fn normalize(id: &str) -> &str {
    let mut rest = id;
    loop {
        if let Some(stripped) = rest.strip_prefix("::") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('\\') {
            rest = stripped;
        } else {
            return rest;
        }
    }
}

/// The abstract side of a registration.
///
/// Either a plain identifier or the one-entry `target => alias` form, which
/// registers the alias alongside the binding. Built from `&str`, `String`, or a
/// `(target, alias)` tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Abstract {
    /// A plain identifier
    Id(String),
    /// An identifier registered together with an alias pointing at it
    Aliased { target: String, alias: String },
}

impl Abstract {
    /// The identifier being registered, without normalization
    pub fn id(&self) -> &str {
        match self {
            Abstract::Id(id) => id,
            Abstract::Aliased { target, .. } => target,
        }
    }

    /// Split into the normalized identifier and the optional alias.
    pub(crate) fn into_parts(self) -> (String, Option<String>) {
        match self {
            Abstract::Id(id) => (normalize(&id).to_owned(), None),
            Abstract::Aliased { target, alias } => (
                normalize(&target).to_owned(),
                Some(normalize(&alias).to_owned()),
            ),
        }
    }
}

impl From<&str> for Abstract {
    fn from(id: &str) -> Self {
        Abstract::Id(id.to_owned())
    }
}

impl From<String> for Abstract {
    fn from(id: String) -> Self {
        Abstract::Id(id)
    }
}

impl From<&String> for Abstract {
    fn from(id: &String) -> Self {
        Abstract::Id(id.clone())
    }
}

impl<T: Into<String>, A: Into<String>> From<(T, A)> for Abstract {
    fn from((target, alias): (T, A)) -> Self {
        Abstract::Aliased {
            target: target.into(),
            alias: alias.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_repeated_separators() {
        assert_eq!(normalize("\\\\Foo\\Bar"), "Foo\\Bar");
        assert_eq!(normalize("::::foo"), "foo");
        assert_eq!(normalize("::\\foo"), "foo");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_keeps_inner_separators() {
        assert_eq!(normalize("a::b::C"), "a::b::C");
        assert_eq!(normalize("a:b"), "a:b");
    }

    #[test]
    fn test_abstract_parts() {
        let (id, alias) = Abstract::from("::app::Cache").into_parts();
        assert_eq!(id, "app::Cache");
        assert!(alias.is_none());

        let (id, alias) = Abstract::from(("\\Contracts\\Cache", "cache")).into_parts();
        assert_eq!(id, "Contracts\\Cache");
        assert_eq!(alias.as_deref(), Some("cache"));
    }
}
