//! Piracy incident ingestion and route corridor scanning.
//!
//! The corridor test buffers the route polyline by `buffer_km` converted to
//! degrees with the flat 1° ≈ 111.32 km approximation. That is deliberately
//! not geodesically exact — it is the model historical results were
//! produced with, and it is adequate for corridor widths well under a few
//! hundred km. Do not "fix" it silently.

use std::collections::HashSet;

use geo::{coord, Contains, EuclideanDistance, LineString, Point, Rect};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::services::coords::{normalize_lon_360, parse_coordinate};

/// Kilometres per degree under the flat-earth corridor approximation.
const KM_PER_DEGREE: f64 = 111.32;

/// Exact-header aliases for the incident coordinate columns.
const LAT_ALIASES: &[&str] = &[
    "LAT", "Latitude", "latitude", "Lat", "LATITUDE", "Y", "y", "lat_dd",
];
const LON_ALIASES: &[&str] = &[
    "LON", "Longitude", "longitude", "Lon", "LONGITUDE", "X", "x", "lon_dd", "LONG", "long",
    "LNG", "lng",
];

#[derive(Debug, Error)]
pub enum IncidentError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not identify latitude/longitude columns; found: {found:?}")]
    MissingColumns { found: Vec<String> },
}

/// A historical incident location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncidentPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Cleaned incident dataset: valid, in-range, de-duplicated points.
#[derive(Debug, Clone, Default)]
pub struct IncidentTable {
    points: Vec<IncidentPoint>,
}

/// Result of scanning a route corridor against the incident table.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct RiskSummary {
    /// Incidents inside the buffered corridor.
    pub hits: usize,
    /// Total incidents considered.
    pub total: usize,
}

impl IncidentTable {
    /// Parse incident CSV text. Column detection tries exact aliases first,
    /// then falls back to header-prefix matching. Rows whose coordinates
    /// fail to parse or fall outside valid ranges are dropped, longitudes
    /// on a 0–360° scale are wrapped, and duplicate points are removed.
    pub fn from_csv(text: &str) -> Result<Self, IncidentError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let exact = |aliases: &[&str]| headers.iter().position(|h| aliases.contains(&h));
        let prefixed = |prefixes: &[&str]| {
            headers.iter().position(|h| {
                let lower = h.to_lowercase();
                prefixes.iter().any(|p| lower.starts_with(p))
            })
        };

        let lat_idx = exact(LAT_ALIASES).or_else(|| prefixed(&["lat", "y"]));
        let lon_idx = exact(LON_ALIASES).or_else(|| prefixed(&["lon", "x", "long", "lng"]));
        let (lat_idx, lon_idx) = match (lat_idx, lon_idx) {
            (Some(a), Some(o)) => (a, o),
            _ => {
                return Err(IncidentError::MissingColumns {
                    found: headers.iter().map(|h| h.to_string()).collect(),
                })
            }
        };

        let mut points = Vec::new();
        let mut seen: HashSet<(u64, u64)> = HashSet::new();

        for record in reader.records() {
            let record = record?;
            let lat = record.get(lat_idx).and_then(parse_coordinate);
            let lon = record
                .get(lon_idx)
                .and_then(parse_coordinate)
                .and_then(normalize_lon_360);
            let (Some(latitude), Some(longitude)) = (lat, lon) else {
                continue;
            };
            if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
                continue;
            }
            if seen.insert((latitude.to_bits(), longitude.to_bits())) {
                points.push(IncidentPoint {
                    latitude,
                    longitude,
                });
            }
        }

        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Count incidents within `buffer_km` of the route polyline.
///
/// Route vertices are (lon, lat). Incidents are prefiltered to the route's
/// bounding box expanded by 1.5× the buffer before the exact
/// distance-to-polyline test.
pub fn scan(route_lonlat: &[[f64; 2]], incidents: &IncidentTable, buffer_km: f64) -> RiskSummary {
    let total = incidents.len();
    if route_lonlat.len() < 2 || total == 0 || buffer_km <= 0.0 {
        return RiskSummary { hits: 0, total };
    }

    let buffer_deg = buffer_km / KM_PER_DEGREE;

    let (mut min_lon, mut max_lon) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
    for &[lon, lat] in route_lonlat {
        min_lon = min_lon.min(lon);
        max_lon = max_lon.max(lon);
        min_lat = min_lat.min(lat);
        max_lat = max_lat.max(lat);
    }
    let pad = buffer_deg * 1.5;
    let bbox = Rect::new(
        coord! { x: min_lon - pad, y: min_lat - pad },
        coord! { x: max_lon + pad, y: max_lat + pad },
    );

    let line = LineString::from(
        route_lonlat
            .iter()
            .map(|&[lon, lat]| (lon, lat))
            .collect::<Vec<_>>(),
    );

    let hits = incidents
        .points
        .iter()
        .map(|p| Point::new(p.longitude, p.latitude))
        .filter(|pt| bbox.contains(pt))
        .filter(|pt| pt.euclidean_distance(&line) <= buffer_deg)
        .count();

    RiskSummary { hits, total }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerant_headers_exact_alias() {
        let t = IncidentTable::from_csv("Latitude,LONG\n1.0,103.0\n").unwrap();
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_tolerant_headers_prefix_fallback() {
        let t = IncidentTable::from_csv("lat_deg,lng_deg\n1.0,103.0\n").unwrap();
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_missing_columns_is_error() {
        assert!(IncidentTable::from_csv("foo,bar\n1,2\n").is_err());
    }

    #[test]
    fn test_lon_360_wrapped_and_out_of_range_dropped() {
        let t = IncidentTable::from_csv("LAT,LON\n10.0,350.0\n95.0,10.0\nbad,10.0\n").unwrap();
        assert_eq!(t.len(), 1);
        assert!((t.points[0].longitude - (-10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_duplicates_removed() {
        let t = IncidentTable::from_csv("LAT,LON\n1.0,103.0\n1.0,103.0\n2.0,104.0\n").unwrap();
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_dms_incident_coordinates() {
        let t = IncidentTable::from_csv("LAT,LON\n1°16'N,103°50'E\n").unwrap();
        assert_eq!(t.len(), 1);
        assert!((t.points[0].latitude - 1.2667).abs() < 1e-3);
    }

    #[test]
    fn test_dash_and_space_form_dms_rows_kept() {
        let t = IncidentTable::from_csv("LAT,LON\n51-57N,103-50E\n51 57 30 N,4 30 E\n").unwrap();
        assert_eq!(t.len(), 2);
        assert!((t.points[0].latitude - 51.95).abs() < 1e-3);
        assert!((t.points[0].longitude - 103.8333).abs() < 1e-3);
        assert!((t.points[1].latitude - 51.9583).abs() < 1e-3);
        assert!((t.points[1].longitude - 4.5).abs() < 1e-3);
    }

    fn straight_route() -> Vec<[f64; 2]> {
        vec![[100.0, 0.0], [104.0, 0.0], [108.0, 0.0]]
    }

    #[test]
    fn test_point_on_route_is_hit() {
        let t = IncidentTable::from_csv("LAT,LON\n0.0,104.0\n").unwrap();
        let summary = scan(&straight_route(), &t, 50.0);
        assert_eq!(summary.hits, 1);
        assert_eq!(summary.total, 1);
    }

    #[test]
    fn test_point_outside_corridor_is_miss() {
        // ~2° ≈ 222 km off the route, corridor is 50 km
        let t = IncidentTable::from_csv("LAT,LON\n2.0,104.0\n").unwrap();
        let summary = scan(&straight_route(), &t, 50.0);
        assert_eq!(summary.hits, 0);
        assert_eq!(summary.total, 1);
    }

    #[test]
    fn test_point_just_inside_corridor() {
        // 0.2° ≈ 22.3 km from the line, corridor 50 km
        let t = IncidentTable::from_csv("LAT,LON\n0.2,104.0\n").unwrap();
        assert_eq!(scan(&straight_route(), &t, 50.0).hits, 1);
    }

    #[test]
    fn test_empty_inputs() {
        let t = IncidentTable::default();
        let summary = scan(&straight_route(), &t, 50.0);
        assert_eq!((summary.hits, summary.total), (0, 0));

        let t = IncidentTable::from_csv("LAT,LON\n0.0,104.0\n").unwrap();
        let summary = scan(&[], &t, 50.0);
        assert_eq!((summary.hits, summary.total), (0, 1));
    }

    #[test]
    fn test_zero_buffer_counts_nothing() {
        let t = IncidentTable::from_csv("LAT,LON\n0.0,104.0\n").unwrap();
        assert_eq!(scan(&straight_route(), &t, 0.0).hits, 0);
    }
}
