//! Whole-fleet optimization over every dustbin that needs emptying.
//!
//! Unlike the incremental dispatcher this builds a fresh plan from scratch:
//! all bins above the fill threshold go to the solver in one call, with a
//! fixed fleet starting at the depot and finishing at the treatment plant.

use tracing::info;

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::model::{CollectionPoint, FleetState, StopId, Vehicle};
use crate::solver::{PlannedJob, VehiclePlan, build_request, convert_route};
use crate::traits::RouteSolver;

/// Bins strictly above this fill percentage are scheduled.
pub const PRIORITY_FILL_PERCENTAGE: f64 = 50.0;

pub const DEFAULT_FLEET_SIZE: u32 = 2;

pub fn optimize_fleet<S: RouteSolver + ?Sized>(
    solver: &S,
    config: &DispatchConfig,
    dustbins: &[CollectionPoint],
    fleet_size: u32,
) -> Result<FleetState, DispatchError> {
    if fleet_size == 0 {
        return Err(DispatchError::validation("fleet size must be at least 1"));
    }

    let jobs: Vec<PlannedJob> = dustbins
        .iter()
        .filter(|bin| bin.fill_percentage > PRIORITY_FILL_PERCENTAGE)
        .map(|bin| PlannedJob {
            stop_id: StopId::Real(bin.id.clone()),
            location: bin.location,
            name: bin.name.clone(),
        })
        .collect();

    if jobs.is_empty() {
        return Err(DispatchError::validation("no dustbins to optimize"));
    }

    let plans: Vec<VehiclePlan> = (1..=fleet_size)
        .map(|vehicle_id| VehiclePlan {
            vehicle_id,
            start: config.depot,
            end: Some(config.treatment_plant),
        })
        .collect();

    let request = build_request(config, &jobs, &plans);
    let response = solver.optimize(&request)?;

    let mut state = FleetState::default();
    for solved in response.routes {
        let vehicle_id = solved.vehicle;
        let route = convert_route(solved, vehicle_id, &jobs, true)?;
        state.upsert_route(route);
    }

    state.vehicles = plans
        .iter()
        .map(|plan| {
            let visited = state.route_for(plan.vehicle_id).map_or(0, |route| {
                route
                    .stops
                    .iter()
                    .filter(|stop| matches!(stop.id, StopId::Real(_)))
                    .count() as u32
            });
            let load = visited
                .saturating_mul(config.load_per_stop)
                .min(config.max_capacity);
            Vehicle::new(plan.vehicle_id, load)
        })
        .collect();

    info!(
        jobs = jobs.len(),
        routes = state.routes.len(),
        "fleet optimized"
    );

    Ok(state)
}
