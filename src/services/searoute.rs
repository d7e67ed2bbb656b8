//! Sea-route oracle client and route memoization.
//!
//! The oracle is an external HTTP service that returns a sea-lane-following
//! polyline between two coordinates as a GeoJSON Feature with a length-km
//! property. It is treated as a black box: we validate shape, convert
//! units, and cache. Caching is keyed by the exact order-sensitive
//! 4-coordinate bit pattern — A→B and B→A are distinct entries because the
//! oracle's lanes are not guaranteed symmetric.

use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::errors::AppError;
use crate::helpers::km_to_nm;

/// One routed leg between two endpoints.
#[derive(Debug, Clone)]
pub struct RouteLeg {
    /// Polyline vertices in (lon, lat) order, GeoJSON-compatible.
    pub coordinates: Vec<[f64; 2]>,
    pub distance_km: f64,
    pub distance_nm: f64,
}

// --- oracle GeoJSON response types ---

#[derive(Debug, Deserialize)]
struct OracleFeature {
    geometry: OracleGeometry,
    properties: OracleProperties,
}

#[derive(Debug, Deserialize)]
struct OracleGeometry {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct OracleProperties {
    /// Route length in the requested units (km).
    length: f64,
}

/// HTTP client for the sea-route oracle.
#[derive(Debug, Clone)]
pub struct SeaRouteClient {
    client: reqwest::Client,
    base_url: String,
}

impl SeaRouteClient {
    /// Build a client with a request timeout so one slow oracle call cannot
    /// stall a whole evaluation.
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch a route from the oracle. Endpoints are (lat, lon); the wire
    /// format is lon,lat per GeoJSON convention.
    pub async fn fetch_route(
        &self,
        a_lat: f64,
        a_lon: f64,
        b_lat: f64,
        b_lon: f64,
    ) -> Result<RouteLeg, AppError> {
        let url = format!(
            "{}/searoute?origin={},{}&destination={},{}&units=km",
            self.base_url, a_lon, a_lat, b_lon, b_lat
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            AppError::ExternalService(format!("sea-route oracle request failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "sea-route oracle returned HTTP {}",
                response.status()
            )));
        }

        let feature: OracleFeature = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("sea-route oracle JSON parse error: {}", e))
        })?;

        if feature.geometry.coordinates.len() < 2 {
            return Err(AppError::ExternalService(
                "sea-route oracle returned a degenerate polyline".to_string(),
            ));
        }
        let distance_km = feature.properties.length;
        if !distance_km.is_finite() || distance_km < 0.0 {
            return Err(AppError::ExternalService(format!(
                "sea-route oracle returned invalid length {}",
                distance_km
            )));
        }

        Ok(RouteLeg {
            coordinates: feature.geometry.coordinates,
            distance_km,
            distance_nm: km_to_nm(distance_km),
        })
    }
}

/// Exact, order-sensitive cache key for one routed pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RouteKey([u64; 4]);

impl RouteKey {
    fn new(a_lat: f64, a_lon: f64, b_lat: f64, b_lon: f64) -> Self {
        Self([
            a_lat.to_bits(),
            a_lon.to_bits(),
            b_lat.to_bits(),
            b_lon.to_bits(),
        ])
    }
}

/// Memoizing router: oracle client plus a bounded LRU of routed legs.
///
/// Explicitly constructed and owned by the app state (never a global), safe
/// for sequential reuse across evaluations. Dropping the cache at any time
/// only costs repeat oracle calls.
pub struct SeaRouter {
    client: SeaRouteClient,
    cache: Mutex<LruCache<RouteKey, RouteLeg>>,
}

impl SeaRouter {
    pub fn new(client: SeaRouteClient, cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size.max(1)).expect("cache capacity is non-zero");
        Self {
            client,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Route between two (lat, lon) endpoints, memoized.
    pub async fn route(
        &self,
        a_lat: f64,
        a_lon: f64,
        b_lat: f64,
        b_lon: f64,
    ) -> Result<RouteLeg, AppError> {
        let key = RouteKey::new(a_lat, a_lon, b_lat, b_lon);
        if let Some(leg) = self.cache.lock().await.get(&key) {
            return Ok(leg.clone());
        }

        let leg = self.client.fetch_route(a_lat, a_lon, b_lat, b_lon).await?;
        self.cache.lock().await.put(key, leg.clone());
        Ok(leg)
    }
}
