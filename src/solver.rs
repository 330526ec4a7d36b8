//! Route solver client.
//!
//! Translates a job list and a vehicle plan into the optimization service's
//! request schema (VROOM-style, as exposed by openrouteservice), makes the
//! call and turns the answer back into a [`Route`].

use std::collections::HashSet;

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{DispatchConfig, OrsConfig};
use crate::error::SolverError;
use crate::model::{LonLat, Route, Stop, StopId};
use crate::polyline::Polyline;
use crate::traits::RouteSolver;

const PLANT_NAME: &str = "Waste Treatment Plant";
const PLACEHOLDER_NAME: &str = "Vehicle Position";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub jobs: Vec<Job>,
    pub vehicles: Vec<VehicleSpec>,
    pub options: RequestOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: u32,
    pub location: LonLat,
    /// Service duration in seconds.
    pub service: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSpec {
    pub id: u32,
    pub start: LonLat,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub end: Option<LonLat>,
    pub capacity: Vec<u32>,
    pub profile: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Ask for route geometry.
    pub g: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResponse {
    #[serde(default)]
    pub routes: Vec<SolvedRoute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvedRoute {
    pub vehicle: u32,
    #[serde(default)]
    pub steps: Vec<SolvedStep>,
    /// Expected to be an encoded polyline string; anything else is rejected.
    #[serde(default)]
    pub geometry: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvedStep {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub location: Option<LonLat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
}

/// One entry of the job list handed to the solver. Job ids are positions in
/// this list, starting at 1.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedJob {
    pub stop_id: StopId,
    pub location: LonLat,
    pub name: String,
}

impl PlannedJob {
    pub fn from_stop(stop: &Stop) -> Self {
        Self {
            stop_id: stop.id.clone(),
            location: stop.location,
            name: stop.name.clone(),
        }
    }
}

/// Start/end for the single vehicle being solved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehiclePlan {
    pub vehicle_id: u32,
    pub start: LonLat,
    /// Set only when the vehicle must finish at the treatment plant.
    pub end: Option<LonLat>,
}

pub fn build_request(
    config: &DispatchConfig,
    jobs: &[PlannedJob],
    vehicles: &[VehiclePlan],
) -> OptimizationRequest {
    OptimizationRequest {
        jobs: jobs
            .iter()
            .enumerate()
            .map(|(idx, job)| Job {
                id: idx as u32 + 1,
                location: job.location,
                service: config.service_secs,
            })
            .collect(),
        vehicles: vehicles
            .iter()
            .map(|plan| VehicleSpec {
                id: plan.vehicle_id,
                start: plan.start,
                end: plan.end,
                capacity: vec![config.max_capacity],
                profile: config.profile.clone(),
            })
            .collect(),
        options: RequestOptions { g: true },
    }
}

/// Solves one vehicle's route over `jobs`.
///
/// Every job must come back on the route. An answer that leaves a job
/// unassigned is malformed, so a pickup is never lost to a partial solution.
pub fn solve_route<S: RouteSolver + ?Sized>(
    solver: &S,
    config: &DispatchConfig,
    jobs: &[PlannedJob],
    plan: &VehiclePlan,
) -> Result<Route, SolverError> {
    let request = build_request(config, jobs, std::slice::from_ref(plan));
    let response = solver.optimize(&request)?;

    let solved = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| SolverError::malformed("response contains no route"))?;

    let visited: HashSet<u32> = solved.steps.iter().filter_map(|step| step.id).collect();
    if let Some(missing) = (1..=jobs.len() as u32).find(|id| !visited.contains(id)) {
        return Err(SolverError::malformed(format!("job {missing} left unassigned")));
    }

    convert_route(solved, plan.vehicle_id, jobs, plan.end.is_some())
}

/// Maps solver steps back onto stops.
///
/// Job steps take the id and name of the job they came from. Steps without a
/// job id become the plant when this is the terminal step of a vehicle sent
/// to the plant, and a placeholder owned by the vehicle otherwise.
pub fn convert_route(
    solved: SolvedRoute,
    vehicle_id: u32,
    jobs: &[PlannedJob],
    ends_at_plant: bool,
) -> Result<Route, SolverError> {
    let geometry = match solved.geometry {
        Some(serde_json::Value::String(encoded)) => encoded,
        Some(other) => {
            return Err(SolverError::malformed(format!(
                "geometry is not an encoded polyline string: {other}"
            )));
        }
        None => return Err(SolverError::malformed("route has no geometry")),
    };
    Polyline::decode(&geometry)
        .map_err(|err| SolverError::malformed(format!("undecodable geometry: {err}")))?;

    let last = solved.steps.len().saturating_sub(1);
    let mut stops = Vec::with_capacity(solved.steps.len());

    for (idx, step) in solved.steps.into_iter().enumerate() {
        let location = step
            .location
            .ok_or_else(|| SolverError::malformed(format!("step {idx} has no location")))?;

        let stop = match step.id {
            Some(job_id) => {
                let job = job_id
                    .checked_sub(1)
                    .and_then(|pos| jobs.get(pos as usize))
                    .ok_or_else(|| SolverError::malformed(format!("unknown job id {job_id}")))?;
                Stop::new(location, job.stop_id.clone(), job.name.clone())
            }
            None => {
                let terminal = match step.kind.as_deref() {
                    Some(kind) => kind == "end",
                    None => idx == last,
                };
                if ends_at_plant && terminal {
                    Stop::new(location, StopId::Plant, PLANT_NAME)
                } else {
                    Stop::new(location, StopId::Placeholder(vehicle_id), PLACEHOLDER_NAME)
                }
            }
        };
        stops.push(stop);
    }

    Ok(Route {
        vehicle_id,
        stops,
        geometry,
    })
}

/// HTTP client for the openrouteservice optimization endpoint.
#[derive(Debug, Clone)]
pub struct OrsClient {
    config: OrsConfig,
    client: reqwest::blocking::Client,
}

impl OrsClient {
    pub fn new(config: OrsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn url(&self) -> String {
        format!("{}/optimization", self.config.base_url.trim_end_matches('/'))
    }
}

impl RouteSolver for OrsClient {
    fn optimize(&self, request: &OptimizationRequest) -> Result<OptimizationResponse, SolverError> {
        debug!(
            jobs = request.jobs.len(),
            vehicles = request.vehicles.len(),
            "calling optimization service"
        );

        let mut builder = self.client.post(self.url()).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.header(AUTHORIZATION, key);
        }

        let response = builder.send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(SolverError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|err| SolverError::malformed(format!("undecodable response body: {err}")))
    }
}
