//! Port congestion table, alias map, and the wait-time resolver.
//!
//! Congestion sources name ports inconsistently, so the resolver joins a
//! gazetteer port to a wait time through an ordered chain of attempts:
//! alias hint → exact canonical key → fuzzy match → geographic nearest
//! neighbour → 0.0. Unresolved congestion is an explicit "no delay"
//! default, never an error.

use std::collections::HashMap;

use thiserror::Error;

use crate::helpers::haversine_km;
use crate::services::canon::canonicalize;

/// Accepted (lowercased) header spellings per column role.
const NAME_HEADERS: &[&str] = &["port", "name", "port_name", "portname"];
const WAIT_HEADERS: &[&str] = &[
    "waittime_hr",
    "wait_hr",
    "waithours",
    "wait_hours",
    "wait",
    "delay_hr",
    "delay_hours",
];
const LAT_HEADERS: &[&str] = &["lat", "latitude", "y"];
const LON_HEADERS: &[&str] = &["lon", "longitude", "x", "long", "lng"];

#[derive(Debug, Error)]
pub enum CongestionError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("needs a port/name column and a wait-time column (e.g. WaitTime_hr); found: {found:?}")]
    MissingColumns { found: Vec<String> },
    #[error("alias CSV needs WPI_Name and Source_Name columns; found: {found:?}")]
    AliasColumns { found: Vec<String> },
}

/// A congestion record that carries usable coordinates, for the geographic
/// nearest-neighbour fallback.
#[derive(Debug, Clone)]
pub struct GeoCongestionRecord {
    pub name: String,
    pub wait_hours: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// The loaded congestion dataset, keyed by canonical port-name.
#[derive(Debug, Clone, Default)]
pub struct CongestionTable {
    by_name: HashMap<String, f64>,
    geo: Vec<GeoCongestionRecord>,
}

/// Canonical-key alias map: gazetteer-name-key → congestion-source-key.
/// A resolver hint only; never authoritative on its own.
#[derive(Debug, Clone, Default)]
pub struct AliasMap(HashMap<String, String>);

/// Pluggable fuzzy string scorer on a 0–100 scale.
pub trait FuzzyScorer: Send + Sync {
    fn score(&self, query: &str, candidate: &str) -> f64;
}

/// Token-order-insensitive scorer: sorts whitespace tokens on both sides,
/// then takes normalized Levenshtein similarity ("token sort ratio").
#[derive(Debug, Default)]
pub struct TokenSortScorer;

/// Plain normalized Levenshtein similarity, order-sensitive. Simpler
/// fallback when token-sort behaviour is not wanted.
#[derive(Debug, Default)]
pub struct PlainScorer;

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

impl FuzzyScorer for TokenSortScorer {
    fn score(&self, query: &str, candidate: &str) -> f64 {
        strsim::normalized_levenshtein(&sort_tokens(query), &sort_tokens(candidate)) * 100.0
    }
}

impl FuzzyScorer for PlainScorer {
    fn score(&self, query: &str, candidate: &str) -> f64 {
        strsim::normalized_levenshtein(query, candidate) * 100.0
    }
}

impl CongestionTable {
    /// Parse congestion CSV text with tolerant header matching. Wait values
    /// are coerced to non-negative floats, 0.0 on parse failure. Rows with
    /// valid lat/lon also feed the geographic fallback list.
    pub fn from_csv(text: &str) -> Result<Self, CongestionError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let find = |accepted: &[&str]| {
            headers
                .iter()
                .position(|h| accepted.contains(&h.to_lowercase().as_str()))
        };
        let name_idx = find(NAME_HEADERS);
        let wait_idx = find(WAIT_HEADERS);
        let (name_idx, wait_idx) = match (name_idx, wait_idx) {
            (Some(n), Some(w)) => (n, w),
            _ => {
                return Err(CongestionError::MissingColumns {
                    found: headers.iter().map(|h| h.to_string()).collect(),
                })
            }
        };
        let lat_idx = find(LAT_HEADERS);
        let lon_idx = find(LON_HEADERS);

        let mut by_name = HashMap::new();
        let mut geo = Vec::new();

        for record in reader.records() {
            let record = record?;
            let raw_name = record.get(name_idx).unwrap_or("");
            let key = canonicalize(raw_name);
            let wait_hours = record
                .get(wait_idx)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(0.0)
                .max(0.0);

            if !key.is_empty() {
                by_name.insert(key, wait_hours);
            }

            if let (Some(lat_i), Some(lon_i)) = (lat_idx, lon_idx) {
                let lat = record.get(lat_i).and_then(|v| v.parse::<f64>().ok());
                let lon = record.get(lon_i).and_then(|v| v.parse::<f64>().ok());
                if let (Some(latitude), Some(longitude)) = (lat, lon) {
                    geo.push(GeoCongestionRecord {
                        name: raw_name.to_string(),
                        wait_hours,
                        latitude,
                        longitude,
                    });
                }
            }
        }

        Ok(Self { by_name, geo })
    }

    pub fn named_len(&self) -> usize {
        self.by_name.len()
    }

    pub fn geo_len(&self) -> usize {
        self.geo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty() && self.geo.is_empty()
    }
}

impl AliasMap {
    /// Parse the two-column alias CSV (`WPI_Name`, `Source_Name`). Both
    /// sides are canonicalized; rows where either side canonicalizes to an
    /// empty key are dropped.
    pub fn from_csv(text: &str) -> Result<Self, CongestionError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let col = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
        };
        let (wpi_idx, src_idx) = match (col("WPI_Name"), col("Source_Name")) {
            (Some(w), Some(s)) => (w, s),
            _ => {
                return Err(CongestionError::AliasColumns {
                    found: headers.iter().map(|h| h.to_string()).collect(),
                })
            }
        };

        let mut map = HashMap::new();
        for record in reader.records() {
            let record = record?;
            let wpi = canonicalize(record.get(wpi_idx).unwrap_or(""));
            let src = canonicalize(record.get(src_idx).unwrap_or(""));
            if !wpi.is_empty() && !src.is_empty() {
                map.insert(wpi, src);
            }
        }
        Ok(Self(map))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn get(&self, key: &str) -> Option<&String> {
        self.0.get(key)
    }
}

/// Wait-time resolver over one congestion dataset. Built per evaluation run;
/// the underlying tables can change between runs, so callers must not cache
/// results across runs.
pub struct CongestionResolver<'a> {
    pub table: &'a CongestionTable,
    pub aliases: &'a AliasMap,
    pub scorer: &'a dyn FuzzyScorer,
    /// Minimum fuzzy score (0–100) to accept a fuzzy match.
    pub fuzzy_threshold: f64,
    /// Maximum great-circle distance (km) for the geographic fallback;
    /// 0 disables it.
    pub geo_radius_km: f64,
}

impl<'a> CongestionResolver<'a> {
    /// Resolve the expected wait in hours for a port. Always ≥ 0; returns
    /// 0.0 when nothing in the chain matches.
    pub fn resolve_wait(&self, port_name: &str, lat: Option<f64>, lon: Option<f64>) -> f64 {
        if self.table.is_empty() {
            return 0.0;
        }
        let key = canonicalize(port_name);
        self.try_alias(&key)
            .or_else(|| self.try_exact(&key))
            .or_else(|| self.try_fuzzy(&key))
            .or_else(|| self.try_geo(lat, lon))
            .unwrap_or(0.0)
    }

    fn try_alias(&self, key: &str) -> Option<f64> {
        let src_key = self.aliases.get(key)?;
        self.table.by_name.get(src_key).copied()
    }

    fn try_exact(&self, key: &str) -> Option<f64> {
        self.table.by_name.get(key).copied()
    }

    fn try_fuzzy(&self, key: &str) -> Option<f64> {
        if key.is_empty() || self.table.by_name.is_empty() {
            return None;
        }
        // Ties on score resolve to the lexicographically first key, so the
        // pick does not depend on HashMap iteration order.
        let (best_key, best_score) = self
            .table
            .by_name
            .keys()
            .map(|candidate| (candidate, self.scorer.score(key, candidate)))
            .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(a.0)))?;
        if best_score >= self.fuzzy_threshold {
            tracing::debug!(
                "Fuzzy congestion match '{}' → '{}' (score {:.1})",
                key,
                best_key,
                best_score
            );
            self.table.by_name.get(best_key).copied()
        } else {
            None
        }
    }

    fn try_geo(&self, lat: Option<f64>, lon: Option<f64>) -> Option<f64> {
        if self.geo_radius_km <= 0.0 || self.table.geo.is_empty() {
            return None;
        }
        let (lat, lon) = (lat?, lon?);
        let nearest = self
            .table
            .geo
            .iter()
            .map(|r| (r, haversine_km(lat, lon, r.latitude, r.longitude)))
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        if nearest.1 <= self.geo_radius_km {
            tracing::debug!(
                "Geo congestion match '{}' at {:.1} km",
                nearest.0.name,
                nearest.1
            );
            Some(nearest.0.wait_hours)
        } else {
            None
        }
    }
}
