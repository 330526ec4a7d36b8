//! waste-dispatch
//!
//! Incremental assignment of dustbin collection requests to a live fleet of
//! capacity-constrained vehicles. Route geometry comes from an external
//! optimization service; distance and capacity bookkeeping happen locally.

pub mod api;
pub mod batch;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod haversine;
pub mod model;
pub mod poller;
pub mod polyline;
pub mod solver;
pub mod store;
pub mod traits;

pub use config::{DispatchConfig, OrsConfig, PollerConfig};
pub use dispatch::Dispatcher;
pub use error::{DispatchError, SolverError, StoreError};
pub use model::{CollectionPoint, FleetState, LonLat, Route, Stop, StopId, Vehicle};
pub use solver::OrsClient;
pub use traits::{RouteSolver, StateStore};
