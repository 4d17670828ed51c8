#![no_main]

//! Fuzz target for container operations
//!
//! Drives random sequences of bind/alias/instance/extend/make over a small
//! identifier space, so alias chains, indirection cycles and rebinds show up
//! often. Resolution may fail; it must never panic or hang.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use service_container::{Blueprint, Concrete, Container, DiError, Instance, Parameter, Parameters};
use std::sync::Arc;

const IDS: [&str; 6] = ["svc0", "svc1", "svc2", "::svc3", "\\svc4", "Leaf"];

fn id(slot: u8) -> &'static str {
    IDS[slot as usize % IDS.len()]
}

#[derive(Debug, Arbitrary)]
enum ContainerOp {
    BindFactory { slot: u8, value: u32, shared: bool },
    BindTo { slot: u8, target: u8, shared: bool },
    BindSelf { slot: u8 },
    BindIf { slot: u8, value: u32 },
    Alias { target: u8, alias: u8 },
    Instance { slot: u8, value: u32 },
    Extend { slot: u8 },
    Rebinding { slot: u8 },
    Make { slot: u8 },
    MakeWith { slot: u8, value: u32 },
    MakeTwice { slot: u8 },
    Get { slot: u8 },
    Remove { slot: u8 },
    ForgetInstance { slot: u8 },
    Flush,
}

fn define_blueprints(container: &Container) {
    container.define(Blueprint::new("Leaf", |args| Ok(args.value::<u32>(0)?)).param(
        Parameter::value("seed").default(7u32),
    ));
    container.define(
        Blueprint::new("svc2", |args| Ok(args.len()))
            .param(Parameter::class("leaf", "Leaf"))
            .param(Parameter::class("other", "svc1").nullable()),
    );
}

fuzz_target!(|ops: Vec<ContainerOp>| {
    let container = Container::new();
    define_blueprints(&container);

    for op in ops {
        match op {
            ContainerOp::BindFactory { slot, value, shared } => {
                let _ = container.bind(
                    id(slot),
                    Some(Concrete::service(move |_, _| Ok(value))),
                    shared,
                );
            }
            ContainerOp::BindTo { slot, target, shared } => {
                let _ = container.bind(id(slot), Some(Concrete::of(id(target))), shared);
            }
            ContainerOp::BindSelf { slot } => {
                let _ = container.bind(id(slot), None, false);
            }
            ContainerOp::BindIf { slot, value } => {
                let _ = container.bind_if(
                    id(slot),
                    Some(Concrete::service(move |_, _| Ok(value))),
                    false,
                );
            }
            ContainerOp::Alias { target, alias } => {
                match container.alias(id(target), id(alias)) {
                    Ok(()) => assert!(container.is_alias(id(alias))),
                    Err(DiError::SelfAlias { .. }) | Err(DiError::CircularDependency { .. }) => {}
                    Err(other) => panic!("unexpected alias error: {other}"),
                }
            }
            ContainerOp::Instance { slot, value } => {
                let instance: Instance = Arc::new(value);
                if container.instance(id(slot), Arc::clone(&instance)).is_ok() {
                    let made = container.make(id(slot)).unwrap();
                    assert!(Arc::ptr_eq(&made, &instance));
                }
            }
            ContainerOp::Extend { slot } => {
                let _ = container.extend(id(slot), |instance, _| instance);
            }
            ContainerOp::Rebinding { slot } => {
                container.rebinding(id(slot), |_, _| {});
            }
            ContainerOp::Make { slot } => {
                let _ = container.make(id(slot));
            }
            ContainerOp::MakeWith { slot, value } => {
                let _ = container.make_with(id(slot), Parameters::new().at(0, value));
            }
            ContainerOp::MakeTwice { slot } => {
                let first = container.make(id(slot));
                let second = container.make(id(slot));
                if let (Ok(a), Ok(b)) = (&first, &second) {
                    if container.resolved(id(slot)) && container.forget_instance(id(slot)) {
                        // Stored instance: both calls handed it out
                        assert!(Arc::ptr_eq(a, b));
                    }
                }
            }
            ContainerOp::Get { slot } => {
                let result = container.get(id(slot));
                if !container.has(id(slot)) {
                    assert!(matches!(result, Err(DiError::NotFound { .. })));
                }
            }
            ContainerOp::Remove { slot } => {
                container.remove(id(slot));
            }
            ContainerOp::ForgetInstance { slot } => {
                container.forget_instance(id(slot));
            }
            ContainerOp::Flush => {
                container.flush();
                assert!(container.is_empty());
            }
        }
    }
});
