//! Method descriptors.

use std::fmt;
use std::sync::Arc;

use super::params::{ParamSchema, Params};
use crate::error::QapResult;
use crate::pipeline::SolverMethod;

/// Solver family classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Family {
    /// Continuous relaxation over the Birkhoff polytope, projected back to
    /// a permutation at the end.
    Novel,
    /// Classical metaheuristic operating directly on permutations.
    Baseline,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Novel => f.write_str("novel"),
            Family::Baseline => f.write_str("baseline"),
        }
    }
}

/// Builds a fresh solver instance from resolved parameters.
///
/// Called once per run, so no solver state is ever shared between runs.
pub type SolverFactory =
    Arc<dyn Fn(&Params) -> QapResult<Box<dyn SolverMethod>> + Send + Sync>;

/// A registered method: name, family, parameter schema, and factory.
#[derive(Clone)]
pub struct MethodDescriptor {
    name: String,
    family: Family,
    schema: ParamSchema,
    factory: SolverFactory,
}

impl MethodDescriptor {
    pub fn new(
        name: impl Into<String>,
        family: Family,
        schema: ParamSchema,
        factory: SolverFactory,
    ) -> Self {
        Self {
            name: name.into(),
            family,
            schema,
            factory,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    pub fn default_parameters(&self) -> Params {
        self.schema.defaults()
    }

    /// Merges `overrides` over the defaults and builds a solver.
    pub fn instantiate(&self, overrides: &Params) -> QapResult<Box<dyn SolverMethod>> {
        let params = self.schema.merge(overrides)?;
        (self.factory)(&params)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("family", &self.family)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Statically described solver, registrable with
/// [`MethodRegistry::register_method`](super::MethodRegistry::register_method).
pub trait MethodSpec: SolverMethod + Sized + 'static {
    /// Registry key.
    const NAME: &'static str;

    /// Family classification.
    const FAMILY: Family;

    /// Declared parameters with defaults.
    fn schema() -> ParamSchema;

    /// Builds an instance from merged parameters.
    fn from_params(params: &Params) -> QapResult<Self>;

    /// Descriptor wiring [`from_params`](Self::from_params) as the factory.
    fn descriptor() -> MethodDescriptor {
        MethodDescriptor::new(
            Self::NAME,
            Self::FAMILY,
            Self::schema(),
            Arc::new(|params: &Params| {
                Self::from_params(params).map(|m| Box::new(m) as Box<dyn SolverMethod>)
            }),
        )
    }
}
