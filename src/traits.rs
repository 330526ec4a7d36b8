//! Seams between the dispatch core and the outside world.
//!
//! Both are injected explicitly so tests can swap in deterministic fakes.

use crate::error::{SolverError, StoreError};
use crate::model::FleetState;
use crate::solver::{OptimizationRequest, OptimizationResponse};

/// An external route optimization service.
///
/// Implementations perform the only blocking network call in a dispatch
/// cycle. Any failure is reported as a [`SolverError`]; callers decide
/// whether it is fatal.
pub trait RouteSolver {
    fn optimize(&self, request: &OptimizationRequest) -> Result<OptimizationResponse, SolverError>;
}

impl<S: RouteSolver + ?Sized> RouteSolver for &S {
    fn optimize(&self, request: &OptimizationRequest) -> Result<OptimizationResponse, SolverError> {
        (**self).optimize(request)
    }
}

/// Where the retained fleet state lives between cycles.
pub trait StateStore {
    fn load(&self) -> Result<FleetState, StoreError>;

    fn save(&self, state: &FleetState) -> Result<(), StoreError>;
}
