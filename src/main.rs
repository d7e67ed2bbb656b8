// Smart PortSwitch API v0.1
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod helpers;
mod routes;
mod services;

use config::AppConfig;
use routes::{AppState, DataStore};
use services::congestion::TokenSortScorer;
use services::gazetteer::Gazetteer;
use services::searoute::{SeaRouteClient, SeaRouter};

/// Smart PortSwitch API — OpenAPI specification.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Smart PortSwitch API",
        version = "0.1.0",
        description = "Maritime voyage evaluation API. Plans sea routes through an \
            external sea-route oracle, evaluates ETA, fuel cost and CO₂ emissions, \
            scans route corridors against historical piracy incidents, and ranks \
            alternate destination ports by a weighted composite of transit time, \
            congestion wait, fuel cost and emissions.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Datasets", description = "Dataset uploads and port listing"),
        (name = "Voyage", description = "Voyage planning and evaluation"),
        (name = "PortSwitch", description = "Alternate-destination ranking"),
    ),
    paths(
        routes::health::health_check,
        routes::datasets::upload_gazetteer,
        routes::datasets::upload_congestion,
        routes::datasets::upload_aliases,
        routes::datasets::upload_incidents,
        routes::datasets::list_ports,
        routes::voyage::plan_voyage,
        routes::portswitch::evaluate_portswitch,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::datasets::GazetteerSummary,
            routes::datasets::CongestionSummary,
            routes::datasets::AliasSummary,
            routes::datasets::IncidentSummary,
            routes::voyage::EndpointSpec,
            routes::voyage::PlanRequest,
            routes::voyage::RouteSummary,
            routes::portswitch::PortSwitchRequest,
            routes::portswitch::PortSwitchResponse,
            services::voyage::VoyageParameters,
            services::voyage::LegSummary,
            services::risk::RiskSummary,
            services::portswitch::ScoreWeights,
            services::portswitch::Candidate,
            services::portswitch::SkippedCandidate,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portswitch_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    // Seed the gazetteer from the data directory, if present
    let mut store = DataStore::default();
    let data_dir = std::path::Path::new(&config.data_dir);
    match Gazetteer::load_seed_from_dir(data_dir) {
        Ok(Some(gazetteer)) => {
            tracing::info!(
                "Seeded gazetteer with {} ports across {} countries from {}",
                gazetteer.len(),
                gazetteer.country_count(),
                data_dir.display()
            );
            store.gazetteer = Some(gazetteer);
        }
        Ok(None) => {
            tracing::warn!(
                "No gazetteer seed found in {}; waiting for upload",
                data_dir.display()
            );
        }
        Err(e) => {
            tracing::error!(
                "Failed to load gazetteer seed from {}: {}",
                data_dir.display(),
                e
            );
        }
    }

    // Sea-route oracle client with bounded route cache
    let router = SeaRouter::new(
        SeaRouteClient::new(&config.searoute_url, config.searoute_timeout_secs),
        config.route_cache_size,
    );

    // Build shared application state
    let app_state = AppState {
        datasets: Arc::new(RwLock::new(store)),
        router: Arc::new(router),
        scorer: Arc::new(TokenSortScorer),
    };

    // CORS — browser clients upload datasets and post evaluations
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route(
            "/api/v1/datasets/gazetteer",
            post(routes::datasets::upload_gazetteer),
        )
        .route(
            "/api/v1/datasets/congestion",
            post(routes::datasets::upload_congestion),
        )
        .route(
            "/api/v1/datasets/aliases",
            post(routes::datasets::upload_aliases),
        )
        .route(
            "/api/v1/datasets/incidents",
            post(routes::datasets::upload_incidents),
        )
        .route("/api/v1/ports", get(routes::datasets::list_ports))
        .route("/api/v1/voyage/plan", post(routes::voyage::plan_voyage))
        .route(
            "/api/v1/voyage/portswitch",
            post(routes::portswitch::evaluate_portswitch),
        )
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
