//! Dependency resolution
//!
//! Turns a declared parameter list plus the caller's explicit [`Parameters`]
//! into positional arguments. Precedence per parameter is: explicit value by
//! name, then a service made through the container for class parameters, then
//! the declared default.

use crate::blueprint::{Parameter, ParameterKind};
use crate::{Container, DiError, Instance, ParamKey, Parameters, Result};
use std::sync::Arc;

#[cfg(feature = "logging")]
use crate::logging::TARGET;
#[cfg(feature = "logging")]
use tracing::trace;

/// Re-key positional parameters to the name of the declared parameter at
/// that position.
///
/// Positional entries win over a named entry for the same parameter.
/// Positions past the end of `dependencies` are kept as they are.
///
/// ```rust
/// use service_container::{key_parameters_by_argument, Parameter, Parameters};
///
/// let declared = [Parameter::value("host"), Parameter::value("port")];
/// let keyed = key_parameters_by_argument(&declared, Parameters::new().at(1, 8080u16));
/// assert!(keyed.contains("port"));
/// ```
pub fn key_parameters_by_argument(dependencies: &[Parameter], parameters: Parameters) -> Parameters {
    let mut named = Parameters::new();
    let mut positional = Vec::new();

    for (key, value) in parameters.into_entries() {
        match key {
            ParamKey::Position(index) if index < dependencies.len() => {
                positional.push((dependencies[index].name().to_owned(), value));
            }
            key => {
                named.insert(key, value);
            }
        }
    }

    for (name, value) in positional {
        named.insert(name, value);
    }
    named
}

/// Resolve constructor dependencies, in declared order.
pub(crate) fn resolve_dependencies(
    container: &Container,
    dependencies: &[Parameter],
    parameters: &mut Parameters,
    declaring: &str,
) -> Result<Vec<Instance>> {
    dependencies
        .iter()
        .map(|parameter| resolve_parameter(container, parameter, parameters, declaring))
        .collect()
}

/// Resolve callable dependencies; explicit entries left unmatched are appended
/// after the declared parameters, in their original order.
///
/// A plain value parameter with neither an explicit value nor a default is
/// skipped, leaving its slot to the appended entries.
#[cfg_attr(not(feature = "logging"), allow(unused_variables))]
pub(crate) fn resolve_call_dependencies(
    container: &Container,
    dependencies: &[Parameter],
    mut parameters: Parameters,
    declaring: &str,
) -> Result<Vec<Instance>> {
    let mut resolved = Vec::with_capacity(dependencies.len() + parameters.len());

    for parameter in dependencies {
        if let Some(value) = parameters.take(parameter.name()) {
            resolved.push(value);
            continue;
        }

        match parameter.kind() {
            ParameterKind::Class(id) => resolved.push(resolve_class(container, parameter, id)?),
            ParameterKind::Value => match parameter.default_value() {
                Some(default) => resolved.push(Arc::clone(default)),
                None => {
                    #[cfg(feature = "logging")]
                    trace!(
                        target: TARGET,
                        parameter = parameter.name(),
                        declaring = declaring,
                        "No value for call parameter, leaving slot to extra parameters"
                    );
                }
            },
        }
    }

    resolved.extend(parameters.into_values());
    Ok(resolved)
}

fn resolve_parameter(
    container: &Container,
    parameter: &Parameter,
    parameters: &mut Parameters,
    declaring: &str,
) -> Result<Instance> {
    if let Some(value) = parameters.take(parameter.name()) {
        #[cfg(feature = "logging")]
        trace!(
            target: TARGET,
            parameter = parameter.name(),
            declaring = declaring,
            "Using explicit parameter"
        );
        return Ok(value);
    }

    match parameter.kind() {
        ParameterKind::Class(id) => resolve_class(container, parameter, id),
        ParameterKind::Value => resolve_non_class(parameter, declaring),
    }
}

/// Make the parameter's service. The error is replaced by the default only
/// when the parameter has one.
#[cfg_attr(not(feature = "logging"), allow(unused_variables))]
fn resolve_class(container: &Container, parameter: &Parameter, id: &str) -> Result<Instance> {
    match container.make(id) {
        Ok(instance) => Ok(instance),
        Err(err) => match parameter.default_value() {
            Some(default) => {
                #[cfg(feature = "logging")]
                trace!(
                    target: TARGET,
                    parameter = parameter.name(),
                    service = id,
                    error = %err,
                    "Optional dependency unresolved, using default"
                );
                Ok(Arc::clone(default))
            }
            None => Err(err),
        },
    }
}

fn resolve_non_class(parameter: &Parameter, declaring: &str) -> Result<Instance> {
    parameter
        .default_value()
        .cloned()
        .ok_or_else(|| DiError::unresolvable(parameter.name(), declaring))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Blueprint, Concrete};

    fn int(value: &Instance) -> i32 {
        *value.downcast_ref::<i32>().unwrap()
    }

    #[test]
    fn test_positional_rekeyed_to_name() {
        let declared = [Parameter::value("a"), Parameter::value("b")];
        let keyed =
            key_parameters_by_argument(&declared, Parameters::new().at(0, 1i32).with("b", 2i32));

        assert!(keyed.contains("a"));
        assert!(keyed.contains("b"));
        assert_eq!(keyed.len(), 2);
    }

    #[test]
    fn test_positional_beats_named() {
        let declared = [Parameter::value("a")];
        let mut keyed =
            key_parameters_by_argument(&declared, Parameters::new().with("a", 1i32).at(0, 9i32));

        assert_eq!(keyed.len(), 1);
        assert_eq!(int(&keyed.take("a").unwrap()), 9);
    }

    #[test]
    fn test_out_of_range_position_kept() {
        let declared = [Parameter::value("a")];
        let keyed = key_parameters_by_argument(&declared, Parameters::new().at(3, 1i32));

        assert_eq!(keyed.keys().next(), Some(&ParamKey::Position(3)));
    }

    #[test]
    fn test_explicit_beats_container_and_default() {
        let container = Container::new();
        container
            .bind("Number", Some(Concrete::service(|_, _| Ok(5i32))), false)
            .unwrap();

        let declared = [Parameter::class("n", "Number").default(7i32)];
        let mut params = Parameters::new().with("n", 1i32);
        let resolved = resolve_dependencies(&container, &declared, &mut params, "demo").unwrap();

        assert_eq!(int(&resolved[0]), 1);
        assert!(params.is_empty());
    }

    #[test]
    fn test_container_beats_default() {
        let container = Container::new();
        container
            .bind("Number", Some(Concrete::service(|_, _| Ok(5i32))), false)
            .unwrap();

        let declared = [Parameter::class("n", "Number").default(7i32)];
        let resolved =
            resolve_dependencies(&container, &declared, &mut Parameters::new(), "demo").unwrap();

        assert_eq!(int(&resolved[0]), 5);
    }

    #[test]
    fn test_optional_class_falls_back_to_default() {
        let container = Container::new();
        let declared = [Parameter::class("n", "Missing").default(7i32)];
        let resolved =
            resolve_dependencies(&container, &declared, &mut Parameters::new(), "demo").unwrap();

        assert_eq!(int(&resolved[0]), 7);
    }

    #[test]
    fn test_required_class_failure_propagates() {
        let container = Container::new();
        container.define(Blueprint::interface("Contract"));

        let declared = [Parameter::class("c", "Contract")];
        let err = resolve_dependencies(&container, &declared, &mut Parameters::new(), "demo")
            .unwrap_err();

        assert_eq!(err, DiError::not_instantiable("Contract"));
    }

    #[test]
    fn test_scalar_without_default_is_unresolvable() {
        let container = Container::new();
        let declared = [Parameter::value("a"), Parameter::value("b").default(1i32)];
        let err = resolve_dependencies(&container, &declared, &mut Parameters::new(), "adder")
            .unwrap_err();

        assert_eq!(err, DiError::unresolvable("a", "adder"));
    }

    #[test]
    fn test_call_skips_unresolved_scalar() {
        let container = Container::new();
        let declared = [Parameter::value("a"), Parameter::value("b").default(2i32)];
        let params = Parameters::new().at(0, 5i32);

        let resolved = resolve_call_dependencies(&container, &declared, params, "f").unwrap();
        let values: Vec<i32> = resolved.iter().map(int).collect();
        assert_eq!(values, vec![2, 5]);
    }

    #[test]
    fn test_call_appends_leftovers_in_order() {
        let container = Container::new();
        let declared = [Parameter::value("a")];
        let params = Parameters::new()
            .with("x", 10i32)
            .with("a", 1i32)
            .with("y", 20i32);

        let resolved = resolve_call_dependencies(&container, &declared, params, "f").unwrap();
        let values: Vec<i32> = resolved.iter().map(int).collect();
        assert_eq!(values, vec![1, 10, 20]);
    }
}
