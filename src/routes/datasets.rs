//! Dataset upload endpoints. Each upload replaces the previous dataset of
//! its kind wholesale; there is no partial merge.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{AppError, ErrorResponse};
use crate::routes::AppState;
use crate::services::congestion::{AliasMap, CongestionTable};
use crate::services::gazetteer::Gazetteer;
use crate::services::risk::IncidentTable;

/// Load summary for a gazetteer upload.
#[derive(Debug, Serialize, ToSchema)]
pub struct GazetteerSummary {
    /// Ports loaded
    pub ports: usize,
    /// Distinct countries
    pub countries: usize,
}

/// Load summary for a congestion upload.
#[derive(Debug, Serialize, ToSchema)]
pub struct CongestionSummary {
    /// Records addressable by canonical name
    pub named_records: usize,
    /// Records that also carry usable coordinates
    pub geo_records: usize,
}

/// Load summary for an alias upload.
#[derive(Debug, Serialize, ToSchema)]
pub struct AliasSummary {
    /// Alias entries loaded
    pub entries: usize,
}

/// Load summary for an incident upload.
#[derive(Debug, Serialize, ToSchema)]
pub struct IncidentSummary {
    /// Valid, de-duplicated incident points
    pub points: usize,
}

/// Upload the port gazetteer (World Port Index CSV).
#[utoipa::path(
    post,
    path = "/api/v1/datasets/gazetteer",
    tag = "Datasets",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Gazetteer loaded", body = GazetteerSummary),
        (status = 422, description = "Malformed CSV", body = ErrorResponse),
    )
)]
pub async fn upload_gazetteer(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<GazetteerSummary>, AppError> {
    let gazetteer = Gazetteer::from_csv(&body)?;
    let summary = GazetteerSummary {
        ports: gazetteer.len(),
        countries: gazetteer.country_count(),
    };
    tracing::info!(
        "Gazetteer loaded: {} ports across {} countries",
        summary.ports,
        summary.countries
    );
    state.datasets.write().await.gazetteer = Some(gazetteer);
    Ok(Json(summary))
}

/// Upload port congestion data (tolerant headers).
#[utoipa::path(
    post,
    path = "/api/v1/datasets/congestion",
    tag = "Datasets",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Congestion data loaded", body = CongestionSummary),
        (status = 422, description = "Malformed CSV", body = ErrorResponse),
    )
)]
pub async fn upload_congestion(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<CongestionSummary>, AppError> {
    let table = CongestionTable::from_csv(&body)?;
    let summary = CongestionSummary {
        named_records: table.named_len(),
        geo_records: table.geo_len(),
    };
    tracing::info!(
        "Congestion data loaded: {} named, {} geo-capable",
        summary.named_records,
        summary.geo_records
    );
    state.datasets.write().await.congestion = table;
    Ok(Json(summary))
}

/// Upload the gazetteer-name → congestion-name alias map.
#[utoipa::path(
    post,
    path = "/api/v1/datasets/aliases",
    tag = "Datasets",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Aliases loaded", body = AliasSummary),
        (status = 422, description = "Malformed CSV", body = ErrorResponse),
    )
)]
pub async fn upload_aliases(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<AliasSummary>, AppError> {
    let aliases = AliasMap::from_csv(&body)?;
    let summary = AliasSummary {
        entries: aliases.len(),
    };
    tracing::info!("Alias map loaded: {} entries", summary.entries);
    state.datasets.write().await.aliases = aliases;
    Ok(Json(summary))
}

/// Upload historical piracy incident locations.
#[utoipa::path(
    post,
    path = "/api/v1/datasets/incidents",
    tag = "Datasets",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Incidents loaded", body = IncidentSummary),
        (status = 422, description = "Malformed CSV", body = ErrorResponse),
    )
)]
pub async fn upload_incidents(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<IncidentSummary>, AppError> {
    let incidents = IncidentTable::from_csv(&body)?;
    let summary = IncidentSummary {
        points: incidents.len(),
    };
    tracing::info!("Incident data loaded: {} points", summary.points);
    state.datasets.write().await.incidents = incidents;
    Ok(Json(summary))
}

/// Query string for GET /api/v1/ports.
#[derive(Debug, Deserialize)]
pub struct PortsQuery {
    /// Restrict to one country (normalized display name, e.g. "Netherlands")
    pub country: Option<String>,
}

/// List loaded port names, optionally filtered by country.
#[utoipa::path(
    get,
    path = "/api/v1/ports",
    tag = "Datasets",
    params(
        ("country" = Option<String>, Query, description = "Country filter"),
    ),
    responses(
        (status = 200, description = "Sorted port names", body = Vec<String>),
        (status = 404, description = "No gazetteer loaded", body = ErrorResponse),
    )
)]
pub async fn list_ports(
    State(state): State<AppState>,
    Query(query): Query<PortsQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let store = state.datasets.read().await;
    let gazetteer = store
        .gazetteer
        .as_ref()
        .ok_or_else(|| AppError::NotFound("no gazetteer loaded".to_string()))?;

    let names = match &query.country {
        Some(country) => gazetteer.ports_in_country(country).to_vec(),
        None => gazetteer.port_names(),
    };
    Ok(Json(names))
}
