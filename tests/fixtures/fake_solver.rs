//! Deterministic stand-in for the optimization service.
//!
//! Visits jobs in the order they were sent (spread round-robin when several
//! vehicles are requested), starts at the vehicle's start, finishes at its end
//! when one is given, and encodes the straight-line path as geometry.

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use waste_dispatch::polyline::Polyline;
use waste_dispatch::solver::{
    OptimizationRequest, OptimizationResponse, SolvedRoute, SolvedStep,
};
use waste_dispatch::{LonLat, RouteSolver, SolverError};

#[derive(Debug, Default)]
pub struct FakeSolver {
    fail_all: bool,
    failing: HashSet<u32>,
    malformed: HashSet<u32>,
    dropping: HashSet<u32>,
    delay: Option<Duration>,
    requests: Mutex<Vec<OptimizationRequest>>,
}

impl FakeSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with a transport-like error.
    pub fn offline() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn failing_for(mut self, vehicle_id: u32) -> Self {
        self.failing.insert(vehicle_id);
        self
    }

    /// Answers for this vehicle carry a non-string geometry.
    pub fn malformed_for(mut self, vehicle_id: u32) -> Self {
        self.malformed.insert(vehicle_id);
        self
    }

    /// Answers for this vehicle leave every job unassigned: only the start
    /// step comes back, with a valid geometry.
    pub fn dropping_jobs_for(mut self, vehicle_id: u32) -> Self {
        self.dropping.insert(vehicle_id);
        self
    }

    /// Each call blocks for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<OptimizationRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Vehicle ids of every request, in call order.
    pub fn requested_vehicles(&self) -> Vec<u32> {
        self.requests
            .lock()
            .iter()
            .flat_map(|req| req.vehicles.iter().map(|v| v.id))
            .collect()
    }
}

fn step(kind: &str, location: LonLat, id: Option<u32>) -> SolvedStep {
    SolvedStep {
        kind: Some(kind.to_string()),
        location: Some(location),
        id,
    }
}

impl RouteSolver for FakeSolver {
    fn optimize(&self, request: &OptimizationRequest) -> Result<OptimizationResponse, SolverError> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }

        if self.fail_all {
            return Err(SolverError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }

        let fleet = request.vehicles.len().max(1);
        let mut routes = Vec::new();

        for (slot, vehicle) in request.vehicles.iter().enumerate() {
            if self.failing.contains(&vehicle.id) {
                return Err(SolverError::Api {
                    status: 500,
                    message: format!("no solution for vehicle {}", vehicle.id),
                });
            }

            let mut steps = vec![step("start", vehicle.start, None)];
            if self.dropping.contains(&vehicle.id) {
                let start = Polyline::new(vec![(vehicle.start.lat, vehicle.start.lon)]);
                routes.push(SolvedRoute {
                    vehicle: vehicle.id,
                    steps,
                    geometry: Some(serde_json::Value::String(start.encode())),
                });
                continue;
            }
            steps.extend(
                request
                    .jobs
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| idx % fleet == slot)
                    .map(|(_, job)| step("job", job.location, Some(job.id))),
            );
            if let Some(end) = vehicle.end {
                steps.push(step("end", end, None));
            }

            let geometry = if self.malformed.contains(&vehicle.id) {
                serde_json::json!(42)
            } else {
                let points = steps
                    .iter()
                    .filter_map(|s| s.location)
                    .map(|loc| (loc.lat, loc.lon))
                    .collect();
                serde_json::Value::String(Polyline::new(points).encode())
            };

            routes.push(SolvedRoute {
                vehicle: vehicle.id,
                steps,
                geometry: Some(geometry),
            });
        }

        Ok(OptimizationResponse { routes })
    }
}
