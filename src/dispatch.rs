//! Dispatch engine.
//!
//! One call is one cycle: `(new point?, fleet state) -> fleet state'`. The
//! engine holds no state of its own; the caller keeps the returned
//! [`FleetState`] and passes it back next time.
//!
//! Assigning a point works greedily. Vehicles with spare capacity are ranked
//! by slack, each one is asked to re-solve its route with the new point
//! added, and the candidate with the shortest resulting route wins. When no
//! existing vehicle can take the point a new one is provisioned from the
//! depot.

use std::cmp::Reverse;

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::haversine::{haversine_km, route_distance_km};
use crate::model::{CollectionPoint, FleetState, LonLat, Route, StopId, Vehicle};
use crate::solver::{PlannedJob, VehiclePlan, solve_route};
use crate::traits::RouteSolver;

/// A vehicle that managed to absorb the new point this cycle.
#[derive(Debug, Clone)]
struct Candidate {
    vehicle: Vehicle,
    route: Route,
    distance_km: f64,
}

#[derive(Debug, Clone)]
pub struct Dispatcher<S> {
    solver: S,
    config: DispatchConfig,
}

impl<S> Dispatcher<S>
where
    S: RouteSolver + Sync,
{
    pub fn new(solver: S, config: DispatchConfig) -> Self {
        Self { solver, config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Runs one cycle. With no new point this is a refresh.
    ///
    /// On error the caller's `state` is the state to keep; nothing is
    /// committed partially.
    pub fn dispatch(
        &self,
        new_point: Option<&CollectionPoint>,
        state: &FleetState,
    ) -> Result<FleetState, DispatchError> {
        match new_point {
            Some(point) => self.assign(point, state),
            None => Ok(self.refresh(state)),
        }
    }

    /// Refresh cycle: nothing is assigned and no capacity changes.
    pub fn refresh(&self, state: &FleetState) -> FleetState {
        debug!(
            routes = state.routes.len(),
            vehicles = state.vehicles.len(),
            "refresh cycle"
        );
        state.clone()
    }

    pub fn assign(
        &self,
        point: &CollectionPoint,
        state: &FleetState,
    ) -> Result<FleetState, DispatchError> {
        let candidates = self.ranked_candidates(state);
        debug!(
            dustbin = %point.id,
            candidates = candidates.len(),
            "assigning collection point"
        );

        let evaluated: Vec<Option<Candidate>> = if self.config.parallel_candidates {
            candidates
                .par_iter()
                .map(|vehicle| self.evaluate(vehicle, point, state))
                .collect()
        } else {
            candidates
                .iter()
                .map(|vehicle| self.evaluate(vehicle, point, state))
                .collect()
        };

        // Strict comparison keeps the earlier-ranked candidate on ties.
        let mut best: Option<Candidate> = None;
        for candidate in evaluated.into_iter().flatten() {
            if best
                .as_ref()
                .is_none_or(|current| candidate.distance_km < current.distance_km)
            {
                best = Some(candidate);
            }
        }

        let winner = match best {
            Some(candidate) => candidate,
            None => self.provision_vehicle(point, state)?,
        };

        Ok(self.commit(winner, state))
    }

    /// Vehicles with spare capacity, most slack first. Ties keep fleet order.
    fn ranked_candidates(&self, state: &FleetState) -> Vec<Vehicle> {
        let mut candidates: Vec<Vehicle> = state
            .vehicles
            .iter()
            .filter(|vehicle| vehicle.capacity_used < self.config.max_capacity)
            .copied()
            .collect();
        candidates.sort_by_key(|vehicle| Reverse(vehicle.remaining(self.config.max_capacity)));
        candidates
    }

    fn evaluate(
        &self,
        vehicle: &Vehicle,
        point: &CollectionPoint,
        state: &FleetState,
    ) -> Option<Candidate> {
        let existing = state.route_for(vehicle.id);
        let last_stop = existing.and_then(Route::last_stop);

        if let Some(last) = last_stop {
            let detour_km = haversine_km(last.location, point.location);
            if detour_km > self.config.max_detour_km {
                debug!(
                    vehicle_id = vehicle.id,
                    detour_km, "candidate rejected: detour too long"
                );
                return None;
            }
        }

        let mut jobs: Vec<PlannedJob> = existing
            .map(|route| route.non_plant_stops().map(PlannedJob::from_stop).collect())
            .unwrap_or_default();
        jobs.push(new_job(point));

        let plan = VehiclePlan {
            vehicle_id: vehicle.id,
            start: last_stop.map_or(self.config.depot, |stop| stop.location),
            end: self.plant_if_filled(vehicle.capacity_used),
        };

        match solve_route(&self.solver, &self.config, &jobs, &plan) {
            Ok(route) => {
                let distance_km = route_distance_km(&route.stops);
                debug!(vehicle_id = vehicle.id, distance_km, "candidate evaluated");
                Some(Candidate {
                    vehicle: *vehicle,
                    route,
                    distance_km,
                })
            }
            Err(err) => {
                warn!(vehicle_id = vehicle.id, error = %err, "candidate skipped: solver failed");
                None
            }
        }
    }

    fn provision_vehicle(
        &self,
        point: &CollectionPoint,
        state: &FleetState,
    ) -> Result<Candidate, DispatchError> {
        let vehicle = Vehicle::new(state.next_vehicle_id(), 0);
        let plan = VehiclePlan {
            vehicle_id: vehicle.id,
            start: self.config.depot,
            end: self.plant_if_filled(vehicle.capacity_used),
        };
        info!(vehicle_id = vehicle.id, dustbin = %point.id, "provisioning new vehicle");

        match solve_route(&self.solver, &self.config, &[new_job(point)], &plan) {
            Ok(route) => {
                let distance_km = route_distance_km(&route.stops);
                Ok(Candidate {
                    vehicle,
                    route,
                    distance_km,
                })
            }
            Err(source) => {
                error!(vehicle_id = vehicle.id, error = %source, "could not provision vehicle");
                Err(DispatchError::NoFeasibleVehicle {
                    vehicle_id: vehicle.id,
                    source,
                })
            }
        }
    }

    fn commit(&self, winner: Candidate, state: &FleetState) -> FleetState {
        let Candidate {
            mut vehicle,
            route,
            distance_km,
        } = winner;

        let loaded = vehicle
            .capacity_used
            .saturating_add(self.config.load_per_stop)
            .min(self.config.max_capacity);
        vehicle.capacity_used = vehicle.capacity_used.max(loaded);

        info!(
            vehicle_id = vehicle.id,
            capacity_used = vehicle.capacity_used,
            stops = route.stops.len(),
            distance_km,
            "route committed"
        );

        let mut next = state.clone();
        next.upsert_route(route);
        next.upsert_vehicle(vehicle);
        next
    }

    fn plant_if_filled(&self, capacity_used: u32) -> Option<LonLat> {
        self.config
            .fills_vehicle(capacity_used)
            .then_some(self.config.treatment_plant)
    }
}

fn new_job(point: &CollectionPoint) -> PlannedJob {
    PlannedJob {
        stop_id: StopId::Real(point.id.clone()),
        location: point.location,
        name: point.name.clone(),
    }
}
