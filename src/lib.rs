//! # Service Container - Runtime Dependency Injection for Rust
//!
//! A string-keyed service container: register bindings once at bootstrap,
//! then ask for fully constructed object graphs by name.
//!
//! ## Features
//!
//! - **Bindings** - transient or shared, to a factory, another identifier or a blueprint
//! - **Aliases** - any number of names for one service, resolved transitively
//! - **Autowiring** - constructor parameters declared once in a [`Blueprint`] and
//!   resolved through the container on every build
//! - **Extenders** - decorate services after construction
//! - **Rebinding** - subscribers notified when a resolved service is replaced
//! - **Method injection** - `call("Class@method")` with resolved arguments
//! - **Lock-free** - `DashMap` tables, re-entrant resolution from inside factories
//! - **Observable** - optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use service_container::{Blueprint, Concrete, Container, Parameter};
//! use std::sync::Arc;
//!
//! trait Book: Send + Sync {
//!     fn title(&self) -> String;
//! }
//!
//! #[derive(Default)]
//! struct ThreeBody;
//!
//! impl Book for ThreeBody {
//!     fn title(&self) -> String {
//!         "Three Body".into()
//!     }
//! }
//!
//! struct Library {
//!     book: Arc<dyn Book>,
//! }
//!
//! let container = Container::new();
//!
//! // Describe how Library is built
//! container.define(
//!     Blueprint::new("Library", |args| {
//!         Ok(Library { book: args.value::<Arc<dyn Book>>(0)? })
//!     })
//!     .param(Parameter::class("book", "BookInterface")),
//! );
//!
//! // Bind the interface and alias it
//! container
//!     .singleton(
//!         ("BookInterface", "book"),
//!         Some(Concrete::service(|_, _| Ok(Arc::new(ThreeBody) as Arc<dyn Book>))),
//!     )
//!     .unwrap();
//!
//! let library = container.make_as::<Library>("Library").unwrap();
//! assert_eq!(library.book.title(), "Three Body");
//! assert!(container.resolved("book"));
//! ```
//!
//! ## Extending and Rebinding
//!
//! ```rust
//! use service_container::{Concrete, Container, Instance};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! let container = Container::new();
//! container.bind("port", Some(Concrete::service(|_, _| Ok(8080u32))), false).unwrap();
//!
//! // Decorate every fresh build
//! container
//!     .extend("port", |port, _| Arc::new(*port.downcast_ref::<u32>().unwrap() + 1) as Instance)
//!     .unwrap();
//! assert_eq!(*container.make_as::<u32>("port").unwrap(), 8081);
//!
//! // Observe rebinds of a resolved service
//! static SEEN: AtomicU32 = AtomicU32::new(0);
//! container.rebinding("port", |_, port| {
//!     SEEN.store(*port.downcast_ref::<u32>().unwrap(), Ordering::SeqCst);
//! });
//! container.bind("port", Some(Concrete::service(|_, _| Ok(9000u32))), false).unwrap();
//! assert_eq!(SEEN.load(Ordering::SeqCst), 9001);
//! ```

mod blueprint;
mod call;
mod container;
mod error;
mod factory;
mod identifier;
#[cfg(feature = "logging")]
pub mod logging;
mod params;
mod provider;
mod resolver;
mod storage;

pub use blueprint::*;
pub use call::*;
pub use container::*;
pub use error::*;
pub use factory::*;
pub use identifier::*;
pub use params::*;
pub use provider::*;
pub use resolver::key_parameters_by_argument;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Blueprint, Callable, Callback, Concrete, Container, DiError, Injectable, Instance,
        Parameter, Parameters, Result, ServiceProvider,
    };
    pub use std::sync::Arc;
}
