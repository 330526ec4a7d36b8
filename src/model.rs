//! Fleet and route state threaded through every dispatch cycle.
//!
//! Nothing here is persisted by the engine. The caller holds a [`FleetState`],
//! hands it to the dispatcher and keeps whatever comes back for the next
//! cycle. Field names on the wire follow the dashboard's JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PolylineError;
use crate::polyline::Polyline;

/// A (longitude, latitude) pair in degrees, serialized as `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<[f64; 2]> for LonLat {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<LonLat> for [f64; 2] {
    fn from(value: LonLat) -> Self {
        [value.lon, value.lat]
    }
}

/// A dustbin that can ask to be emptied. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionPoint {
    #[serde(rename = "dustbin_id")]
    pub id: String,
    pub location: LonLat,
    pub name: String,
    #[serde(default)]
    pub fill_percentage: f64,
}

impl CollectionPoint {
    pub fn new(id: impl Into<String>, location: LonLat, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location,
            name: name.into(),
            fill_percentage: 0.0,
        }
    }

    pub fn with_fill(mut self, fill_percentage: f64) -> Self {
        self.fill_percentage = fill_percentage;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u32,
    #[serde(rename = "capacityUsed", default)]
    pub capacity_used: u32,
}

impl Vehicle {
    pub const fn new(id: u32, capacity_used: u32) -> Self {
        Self { id, capacity_used }
    }

    pub fn remaining(&self, max_capacity: u32) -> u32 {
        max_capacity.saturating_sub(self.capacity_used)
    }
}

/// Identifier of a route stop.
///
/// On the wire this is a plain string: `"waste_plant"`, `"temp_<vehicleId>"`
/// or anything else for a real collection point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StopId {
    /// A committed pickup at a collection point.
    Real(String),
    /// A not-yet-finalized point owned by the given vehicle.
    Placeholder(u32),
    /// The treatment plant.
    Plant,
}

const PLANT_ID: &str = "waste_plant";
const PLACEHOLDER_PREFIX: &str = "temp_";

impl StopId {
    pub fn is_plant(&self) -> bool {
        matches!(self, StopId::Plant)
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, StopId::Placeholder(_))
    }
}

impl From<String> for StopId {
    fn from(value: String) -> Self {
        if value == PLANT_ID {
            return StopId::Plant;
        }
        match value
            .strip_prefix(PLACEHOLDER_PREFIX)
            .and_then(|rest| rest.parse::<u32>().ok())
        {
            Some(vehicle_id) => StopId::Placeholder(vehicle_id),
            None => StopId::Real(value),
        }
    }
}

impl From<StopId> for String {
    fn from(value: StopId) -> Self {
        value.to_string()
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopId::Real(id) => f.write_str(id),
            StopId::Placeholder(vehicle_id) => write!(f, "{PLACEHOLDER_PREFIX}{vehicle_id}"),
            StopId::Plant => f.write_str(PLANT_ID),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub location: LonLat,
    #[serde(rename = "dustbin_id")]
    pub id: StopId,
    pub name: String,
}

impl Stop {
    pub fn new(location: LonLat, id: StopId, name: impl Into<String>) -> Self {
        Self {
            location,
            id,
            name: name.into(),
        }
    }
}

/// A vehicle's planned path: stops in visiting order plus the encoded
/// geometry between them. Replaced wholesale on every re-solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub vehicle_id: u32,
    #[serde(rename = "steps")]
    pub stops: Vec<Stop>,
    pub geometry: String,
}

impl Route {
    pub fn last_stop(&self) -> Option<&Stop> {
        self.stops.last()
    }

    /// Stops that still have to be carried into a re-solve.
    pub fn non_plant_stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.iter().filter(|stop| !stop.id.is_plant())
    }

    pub fn ends_at_plant(&self) -> bool {
        self.last_stop().is_some_and(|stop| stop.id.is_plant())
    }

    pub fn decoded_geometry(&self) -> Result<Polyline, PolylineError> {
        Polyline::decode(&self.geometry)
    }
}

/// Routes and vehicles as held by the caller between cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetState {
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
}

impl FleetState {
    pub fn new(routes: Vec<Route>, vehicles: Vec<Vehicle>) -> Self {
        Self { routes, vehicles }
    }

    pub fn route_for(&self, vehicle_id: u32) -> Option<&Route> {
        self.routes.iter().find(|route| route.vehicle_id == vehicle_id)
    }

    pub fn vehicle(&self, vehicle_id: u32) -> Option<&Vehicle> {
        self.vehicles.iter().find(|vehicle| vehicle.id == vehicle_id)
    }

    pub fn vehicle_mut(&mut self, vehicle_id: u32) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|vehicle| vehicle.id == vehicle_id)
    }

    /// Replaces the route owned by the same vehicle, or appends it.
    pub fn upsert_route(&mut self, route: Route) {
        match self
            .routes
            .iter_mut()
            .find(|existing| existing.vehicle_id == route.vehicle_id)
        {
            Some(existing) => *existing = route,
            None => self.routes.push(route),
        }
    }

    /// Replaces the vehicle with the same id, or appends it.
    pub fn upsert_vehicle(&mut self, vehicle: Vehicle) {
        match self.vehicle_mut(vehicle.id) {
            Some(existing) => *existing = vehicle,
            None => self.vehicles.push(vehicle),
        }
    }

    /// Id for a newly provisioned vehicle: fleet size + 1, bumped past the
    /// highest existing id if that one is already taken.
    pub fn next_vehicle_id(&self) -> u32 {
        let candidate = self.vehicles.len() as u32 + 1;
        if self.vehicle(candidate).is_none() {
            return candidate;
        }
        self.vehicles.iter().map(|v| v.id).max().unwrap_or(0) + 1
    }

    pub fn total_capacity_used(&self) -> u32 {
        self.vehicles.iter().map(|v| v.capacity_used).sum()
    }
}
