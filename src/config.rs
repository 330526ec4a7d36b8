//! Tunables for the dispatcher, the solver client and the poller.

use std::env;
use std::time::Duration;

use crate::model::LonLat;

/// Where every new vehicle starts.
pub const DEPOT: LonLat = LonLat::new(75.7871, 26.9124);

/// Where a full vehicle unloads.
pub const WASTE_TREATMENT_PLANT: LonLat = LonLat::new(75.9330, 26.9660);

pub const MAX_CAPACITY: u32 = 1000;
pub const LOAD_PER_STOP: u32 = 100;
pub const MAX_DETOUR_KM: f64 = 5.0;
pub const SERVICE_SECS: u32 = 300;
pub const POLL_INTERVAL_MS: u64 = 5000;

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub depot: LonLat,
    pub treatment_plant: LonLat,
    pub max_capacity: u32,
    /// Load added to a vehicle for every stop it absorbs.
    pub load_per_stop: u32,
    /// Candidates whose last stop is farther than this from the new point are
    /// never extended.
    pub max_detour_km: f64,
    /// Fixed service duration per job, in seconds.
    pub service_secs: u32,
    /// Routing profile passed to the solver.
    pub profile: String,
    /// Evaluate candidate vehicles concurrently.
    pub parallel_candidates: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            depot: DEPOT,
            treatment_plant: WASTE_TREATMENT_PLANT,
            max_capacity: MAX_CAPACITY,
            load_per_stop: LOAD_PER_STOP,
            max_detour_km: MAX_DETOUR_KM,
            service_secs: SERVICE_SECS,
            profile: "driving-hgv".to_string(),
            parallel_candidates: false,
        }
    }
}

impl DispatchConfig {
    /// True when absorbing one more stop fills a vehicle that has already
    /// used `capacity_used`.
    pub fn fills_vehicle(&self, capacity_used: u32) -> bool {
        capacity_used.saturating_add(self.load_per_stop) >= self.max_capacity
    }
}

#[derive(Debug, Clone)]
pub struct OrsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openrouteservice.org".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl OrsConfig {
    /// Defaults overridden by `ORS_API_KEY`, `ORS_BASE_URL` and
    /// `ORS_TIMEOUT_SECS` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = env::var("ORS_API_KEY") {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }
        if let Ok(url) = env::var("ORS_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = env::var("ORS_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
        {
            config.timeout_secs = secs;
        }
        config
    }
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    /// Stop on its own after this many ticks; `None` polls until stopped.
    pub max_ticks: Option<u32>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(POLL_INTERVAL_MS),
            max_ticks: None,
        }
    }
}
