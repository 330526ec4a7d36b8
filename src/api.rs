//! JSON boundary of the dispatch engine.
//!
//! Accepts the dashboard's request body
//! `{ dustbin, currentRoutes, vehicles }` and answers with a status code and
//! `{ routes, vehicles }`, plus `error` when the cycle failed. A failed cycle
//! always echoes the state it was given.

use serde_json::{Map, Value, json};
use tracing::error;

use crate::dispatch::Dispatcher;
use crate::error::DispatchError;
use crate::model::{CollectionPoint, FleetState, Route, Vehicle};
use crate::traits::RouteSolver;

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReply {
    pub status: u16,
    pub body: Value,
}

impl DispatchReply {
    fn ok(state: &FleetState) -> Self {
        Self {
            status: 200,
            body: json!({ "routes": state.routes, "vehicles": state.vehicles }),
        }
    }

    fn failure(status: u16, message: String, routes: Value, vehicles: Value) -> Self {
        Self {
            status,
            body: json!({ "error": message, "routes": routes, "vehicles": vehicles }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A decoded request body.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    pub dustbin: Option<CollectionPoint>,
    pub state: FleetState,
}

impl DispatchRequest {
    /// Validates a raw body.
    ///
    /// `currentRoutes` defaults to no routes and `vehicles` to a single idle
    /// vehicle when absent or null.
    pub fn from_json(body: &Value) -> Result<Self, DispatchError> {
        let object = body
            .as_object()
            .ok_or_else(|| DispatchError::validation("request body must be a JSON object"))?;

        let dustbin = match object.get("dustbin") {
            None | Some(Value::Null) => None,
            Some(value @ Value::Object(_)) => Some(
                serde_json::from_value::<CollectionPoint>(value.clone())
                    .map_err(|err| DispatchError::validation(format!("invalid dustbin: {err}")))?,
            ),
            Some(_) => return Err(DispatchError::validation("dustbin must be an object")),
        };

        let routes: Vec<Route> = array_field(object, "currentRoutes")?.unwrap_or_default();
        let vehicles: Vec<Vehicle> =
            array_field(object, "vehicles")?.unwrap_or_else(|| vec![Vehicle::new(1, 0)]);

        Ok(Self {
            dustbin,
            state: FleetState::new(routes, vehicles),
        })
    }
}

fn array_field<T: serde::de::DeserializeOwned>(
    object: &Map<String, Value>,
    key: &str,
) -> Result<Option<Vec<T>>, DispatchError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Array(_)) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|err| DispatchError::validation(format!("invalid {key}: {err}"))),
        Some(_) => Err(DispatchError::validation(format!("{key} must be an array"))),
    }
}

fn echoed(body: &Value, key: &str) -> Value {
    match body.get(key) {
        Some(value @ Value::Array(_)) => value.clone(),
        _ => Value::Array(Vec::new()),
    }
}

/// Handles one HTTP-style call to the dispatch endpoint.
pub fn handle<S: RouteSolver + Sync>(
    dispatcher: &Dispatcher<S>,
    method: &str,
    body: &Value,
) -> DispatchReply {
    if !method.eq_ignore_ascii_case("POST") {
        return DispatchReply {
            status: 405,
            body: json!({ "error": "Method not allowed" }),
        };
    }

    let request = match DispatchRequest::from_json(body) {
        Ok(request) => request,
        Err(err) => {
            return DispatchReply::failure(
                400,
                err.to_string(),
                echoed(body, "currentRoutes"),
                echoed(body, "vehicles"),
            );
        }
    };

    match dispatcher.dispatch(request.dustbin.as_ref(), &request.state) {
        Ok(next) => DispatchReply::ok(&next),
        Err(err) => {
            error!(error = %err, "dispatch cycle failed");
            let state = &request.state;
            DispatchReply::failure(
                500,
                err.to_string(),
                json!(state.routes),
                json!(state.vehicles),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_state_missing() {
        let request = DispatchRequest::from_json(&json!({ "dustbin": null })).unwrap();
        assert!(request.dustbin.is_none());
        assert!(request.state.routes.is_empty());
        assert_eq!(request.state.vehicles, vec![Vehicle::new(1, 0)]);
    }

    #[test]
    fn test_rejects_non_array_routes() {
        let err = DispatchRequest::from_json(&json!({ "currentRoutes": "nope" })).unwrap_err();
        assert!(matches!(err, DispatchError::Validation(msg) if msg.contains("currentRoutes")));
    }

    #[test]
    fn test_rejects_non_object_dustbin() {
        let err = DispatchRequest::from_json(&json!({ "dustbin": 3 })).unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
    }

    #[test]
    fn test_rejects_incomplete_dustbin() {
        let err = DispatchRequest::from_json(&json!({ "dustbin": { "name": "x" } })).unwrap_err();
        assert!(matches!(err, DispatchError::Validation(msg) if msg.contains("dustbin")));
    }

    #[test]
    fn test_parses_full_body() {
        let body = json!({
            "dustbin": {
                "dustbin_id": "raja_park",
                "location": [75.8281, 26.8997],
                "name": "Raja Park",
                "fill_percentage": 75
            },
            "currentRoutes": [],
            "vehicles": [{ "id": 1, "capacityUsed": 300 }]
        });
        let request = DispatchRequest::from_json(&body).unwrap();
        assert_eq!(request.dustbin.unwrap().fill_percentage, 75.0);
        assert_eq!(request.state.vehicles, vec![Vehicle::new(1, 300)]);
    }
}
