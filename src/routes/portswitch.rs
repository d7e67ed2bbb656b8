//! Smart PortSwitch endpoint: rank alternate destination ports against the
//! baseline under one weighted cost model.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{AppError, ErrorResponse};
use crate::routes::voyage::EndpointSpec;
use crate::routes::AppState;
use crate::services::congestion::CongestionResolver;
use crate::services::portswitch::{
    self, Candidate, CandidateFilters, ScoreWeights, SkippedCandidate,
};
use crate::services::voyage::VoyageParameters;

fn default_true() -> bool {
    true
}

fn default_weights() -> ScoreWeights {
    ScoreWeights {
        time: 1.0,
        congestion: 1.0,
        cost: 1.0,
        co2: 1.0,
    }
}

fn default_fuzzy_threshold() -> f64 {
    88.0
}

fn default_geo_radius_km() -> f64 {
    50.0
}

/// Request body for POST /api/v1/voyage/portswitch.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PortSwitchRequest {
    pub origin: EndpointSpec,
    /// Baseline destination; must be a gazetteer port name.
    pub destination: String,
    pub parameters: VoyageParameters,
    /// Restrict candidates to the baseline destination's country.
    #[serde(default = "default_true")]
    pub same_country_only: bool,
    /// Great-circle prefilter around the baseline, NM. 0 disables.
    #[serde(default)]
    pub radius_nm: f64,
    #[serde(default = "default_weights")]
    pub weights: ScoreWeights,
    /// Minimum fuzzy-match score (0-100) for a congestion-name match.
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
    /// Geographic fallback radius for congestion lookup, km. 0 disables.
    #[serde(default = "default_geo_radius_km")]
    pub geo_radius_km: f64,
    /// Truncate the ranked table to the best N candidates; omit for all.
    #[serde(default)]
    pub top_n: Option<usize>,
}

/// Response body for POST /api/v1/voyage/portswitch.
#[derive(Debug, Serialize, ToSchema)]
pub struct PortSwitchResponse {
    /// The baseline destination the candidates were ranked against.
    pub baseline: String,
    /// Candidates sorted ascending by composite score.
    pub candidates: Vec<Candidate>,
    /// The lowest-score candidate; absent when the pool came up empty.
    pub recommendation: Option<Candidate>,
    /// Candidates dropped because their route could not be computed.
    pub skipped: Vec<SkippedCandidate>,
}

/// Rank alternate destination ports for a voyage.
///
/// An empty candidate table is a normal outcome of strict filters, not an
/// error; only an unknown baseline destination is a 404.
#[utoipa::path(
    post,
    path = "/api/v1/voyage/portswitch",
    tag = "PortSwitch",
    request_body = PortSwitchRequest,
    responses(
        (status = 200, description = "Ranked candidate table", body = PortSwitchResponse),
        (status = 400, description = "Invalid parameters or weights", body = ErrorResponse),
        (status = 404, description = "Unknown baseline port or no gazetteer", body = ErrorResponse),
    )
)]
pub async fn evaluate_portswitch(
    State(state): State<AppState>,
    Json(request): Json<PortSwitchRequest>,
) -> Result<Json<PortSwitchResponse>, AppError> {
    let store = state.datasets.read().await;
    let gazetteer = store
        .gazetteer
        .as_ref()
        .ok_or_else(|| AppError::NotFound("no gazetteer loaded".to_string()))?;

    let origin = request.origin.resolve(&store, "Origin")?;
    let resolver = CongestionResolver {
        table: &store.congestion,
        aliases: &store.aliases,
        scorer: &*state.scorer,
        fuzzy_threshold: request.fuzzy_threshold,
        geo_radius_km: request.geo_radius_km,
    };
    let filters = CandidateFilters {
        same_country_only: request.same_country_only,
        radius_nm: request.radius_nm,
    };

    let outcome = portswitch::evaluate(
        gazetteer,
        &state.router,
        &resolver,
        &request.parameters,
        &origin.name,
        origin.latitude,
        origin.longitude,
        &request.destination,
        &filters,
        &request.weights,
    )
    .await?;

    tracing::info!(
        "PortSwitch {} → {}: {} candidates ranked, {} skipped",
        origin.name,
        request.destination,
        outcome.candidates.len(),
        outcome.skipped.len()
    );

    let recommendation = outcome.best().cloned();
    let mut candidates = outcome.candidates;
    if let Some(n) = request.top_n {
        candidates.truncate(n);
    }

    Ok(Json(PortSwitchResponse {
        baseline: request.destination,
        candidates,
        recommendation,
        skipped: outcome.skipped,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: PortSwitchRequest = serde_json::from_value(serde_json::json!({
            "origin": {"port": "Port Klang"},
            "destination": "Rotterdam",
            "parameters": {
                "speed_kn": 18.0, "consumption_tpd": 30.0,
                "emission_factor": 3.114, "fuel_price_usd": 600.0
            }
        }))
        .unwrap();
        assert!(request.same_country_only);
        assert_eq!(request.radius_nm, 0.0);
        assert_eq!(request.weights.time, 1.0);
        assert_eq!(request.fuzzy_threshold, 88.0);
        assert_eq!(request.geo_radius_km, 50.0);
        assert!(request.top_n.is_none());
    }
}
