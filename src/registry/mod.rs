//! Method registry.
//!
//! [`MethodRegistry`] is an explicit table mapping method names to
//! [`MethodDescriptor`]s. It is built once (usually via
//! [`MethodRegistry::with_builtin`]) and passed by reference to the
//! orchestrator and the benchmarking suite; there is no global registry.
//!
//! # Examples
//!
//! ```
//! use u_qap::registry::{Family, MethodRegistry};
//!
//! let registry = MethodRegistry::with_builtin();
//! let sa = registry.lookup("simulated_annealing").unwrap();
//! assert_eq!(sa.family(), Family::Baseline);
//! assert!(registry.lookup("no_such_method").is_err());
//! ```

mod descriptor;
mod params;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use descriptor::{Family, MethodDescriptor, MethodSpec, SolverFactory};
pub use params::{ParamKind, ParamSchema, ParamSpec, ParamValue, Params};

use crate::error::{QapError, QapResult};
use crate::pipeline::SolverMethod;

/// Name-keyed table of solver methods.
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    methods: BTreeMap<String, MethodDescriptor>,
}

impl MethodRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every novel and baseline method shipped with the crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::novel::register_all(&mut registry);
        crate::baseline::register_all(&mut registry);
        registry
    }

    /// Registers a solver factory under `name`.
    ///
    /// Re-registering an existing name replaces it (last writer wins) and
    /// logs a warning.
    pub fn register<F>(&mut self, name: &str, family: Family, schema: ParamSchema, factory: F)
    where
        F: Fn(&Params) -> QapResult<Box<dyn SolverMethod>> + Send + Sync + 'static,
    {
        self.insert(MethodDescriptor::new(name, family, schema, Arc::new(factory)));
    }

    /// Registers a statically described method.
    pub fn register_method<M: MethodSpec>(&mut self) {
        self.insert(M::descriptor());
    }

    /// Registers a prebuilt descriptor.
    pub fn insert(&mut self, descriptor: MethodDescriptor) {
        let name = descriptor.name().to_string();
        if let Some(old) = self.methods.insert(name.clone(), descriptor) {
            log::warn!(
                "method '{name}' re-registered; replacing previous {} entry",
                old.family()
            );
        }
    }

    /// Resolves a method by name.
    pub fn lookup(&self, name: &str) -> QapResult<&MethodDescriptor> {
        self.methods
            .get(name)
            .ok_or_else(|| QapError::MethodNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }

    /// Names of the methods in `family`, sorted.
    pub fn by_family(&self, family: Family) -> Vec<&str> {
        self.methods
            .values()
            .filter(|d| d.family() == family)
            .map(MethodDescriptor::name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
