//! Voyage planning endpoint: multi-leg routing, ETA/fuel/CO₂ outputs and
//! the piracy-corridor scan, in one request.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{AppError, ErrorResponse};
use crate::routes::{AppState, DataStore};
use crate::services::risk::{self, RiskSummary};
use crate::services::voyage::{
    self, co2_intensity_kg_per_nm, LegSummary, VoyageParameters, Waypoint,
};

/// A voyage endpoint: either a gazetteer port name or raw coordinates.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum EndpointSpec {
    /// Look the endpoint up in the loaded gazetteer.
    Named { port: String },
    /// Use coordinates directly, with an optional display name.
    Coordinates {
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        name: Option<String>,
    },
}

impl EndpointSpec {
    /// Resolve to a concrete waypoint. Named endpoints require a loaded
    /// gazetteer; coordinate endpoints are range-checked.
    pub fn resolve(&self, store: &DataStore, fallback_name: &str) -> Result<Waypoint, AppError> {
        match self {
            EndpointSpec::Named { port } => {
                let gazetteer = store
                    .gazetteer
                    .as_ref()
                    .ok_or_else(|| AppError::NotFound("no gazetteer loaded".to_string()))?;
                let found = gazetteer.get(port).ok_or_else(|| {
                    AppError::NotFound(format!("port '{}' not in gazetteer", port))
                })?;
                Ok(Waypoint {
                    name: found.name.clone(),
                    latitude: found.latitude,
                    longitude: found.longitude,
                })
            }
            EndpointSpec::Coordinates {
                latitude,
                longitude,
                name,
            } => {
                if !(-90.0..=90.0).contains(latitude) || !(-180.0..=180.0).contains(longitude) {
                    return Err(AppError::BadRequest(format!(
                        "coordinates ({}, {}) out of range",
                        latitude, longitude
                    )));
                }
                Ok(Waypoint {
                    name: name.clone().unwrap_or_else(|| fallback_name.to_string()),
                    latitude: *latitude,
                    longitude: *longitude,
                })
            }
        }
    }
}

fn default_risk_buffer_km() -> f64 {
    50.0
}

/// Request body for POST /api/v1/voyage/plan.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlanRequest {
    pub origin: EndpointSpec,
    pub destination: EndpointSpec,
    /// Intermediate stops, visited in the given order unless optimized.
    #[serde(default)]
    pub stops: Vec<EndpointSpec>,
    /// Reorder stops to minimize total distance (at most 8 stops).
    #[serde(default)]
    pub optimize_stops: bool,
    pub parameters: VoyageParameters,
    /// Piracy corridor half-width in km; 0 skips the scan.
    #[serde(default = "default_risk_buffer_km")]
    pub risk_buffer_km: f64,
}

/// Response body for POST /api/v1/voyage/plan.
#[derive(Debug, Serialize, ToSchema)]
pub struct RouteSummary {
    pub origin: String,
    pub destination: String,
    /// Stop names in visiting order (after optimization, if requested).
    pub stops: Vec<String>,
    pub distance_km: f64,
    pub distance_nm: f64,
    pub eta_hours: f64,
    pub fuel_tonnes: f64,
    pub co2_tonnes: f64,
    pub cost_usd: f64,
    /// CO₂ intensity over the whole voyage, kg per NM.
    pub co2_intensity_kg_per_nm: f64,
    pub legs: Vec<LegSummary>,
    pub risk: RiskSummary,
    /// Full polyline, (lon, lat) order.
    pub coordinates: Vec<[f64; 2]>,
}

/// Plan a voyage and evaluate it under the given parameters.
#[utoipa::path(
    post,
    path = "/api/v1/voyage/plan",
    tag = "Voyage",
    request_body = PlanRequest,
    responses(
        (status = 200, description = "Planned route with costs and risk", body = RouteSummary),
        (status = 400, description = "Invalid parameters or too many stops", body = ErrorResponse),
        (status = 404, description = "Unknown port or no gazetteer", body = ErrorResponse),
        (status = 502, description = "Sea-route oracle unavailable", body = ErrorResponse),
    )
)]
pub async fn plan_voyage(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<RouteSummary>, AppError> {
    request.parameters.validate()?;
    if !request.risk_buffer_km.is_finite() || request.risk_buffer_km < 0.0 {
        return Err(AppError::BadRequest(
            "risk_buffer_km must be a non-negative number".to_string(),
        ));
    }

    let store = state.datasets.read().await;
    let origin = request.origin.resolve(&store, "Origin")?;
    let destination = request.destination.resolve(&store, "Destination")?;
    let mut stops = Vec::with_capacity(request.stops.len());
    for (i, spec) in request.stops.iter().enumerate() {
        stops.push(spec.resolve(&store, &format!("Stop {}", i + 1))?);
    }

    if request.optimize_stops && stops.len() > 1 {
        stops = voyage::optimize_stop_order(&state.router, &origin, &stops, &destination).await?;
    }

    let mut waypoints = Vec::with_capacity(stops.len() + 2);
    waypoints.push(origin.clone());
    waypoints.extend(stops.iter().cloned());
    waypoints.push(destination.clone());

    let route = voyage::build_route(&state.router, &waypoints).await?;
    let eta_hours = request.parameters.eta_hours(route.distance_nm)?;
    let fuel = request.parameters.fuel_outputs(eta_hours)?;
    let risk = risk::scan(&route.coordinates, &store.incidents, request.risk_buffer_km);

    tracing::info!(
        "Planned voyage {} → {}: {:.0} NM, {:.1} h, {} incident hits",
        origin.name,
        destination.name,
        route.distance_nm,
        eta_hours,
        risk.hits
    );

    Ok(Json(RouteSummary {
        origin: origin.name,
        destination: destination.name,
        stops: stops.into_iter().map(|w| w.name).collect(),
        distance_km: route.distance_km,
        distance_nm: route.distance_nm,
        eta_hours,
        fuel_tonnes: fuel.fuel_tonnes,
        co2_tonnes: fuel.co2_tonnes,
        cost_usd: fuel.cost_usd,
        co2_intensity_kg_per_nm: co2_intensity_kg_per_nm(fuel.co2_tonnes, route.distance_nm),
        legs: route.legs,
        risk,
        coordinates: route.coordinates,
    }))
}
