//! World Port Index gazetteer loader.
//!
//! Parses the authoritative port reference CSV (`Main Port Name`,
//! `Latitude`, `Longitude`, plus an optional country column) into an
//! immutable, name-indexed table. Coordinates are accepted as decimal
//! (comma decimal separators tolerated) or DMS text.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::services::coords::parse_gazetteer_coordinate;

/// Required gazetteer columns.
const NAME_COLUMN: &str = "Main Port Name";
const LAT_COLUMN: &str = "Latitude";
const LON_COLUMN: &str = "Longitude";

/// Errors that can occur while loading the gazetteer.
#[derive(Debug, Error)]
pub enum GazetteerError {
    #[error("IO error reading gazetteer file: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column '{0}'")]
    MissingColumn(String),
    #[error("unsupported coordinate for port '{port}': '{value}'")]
    InvalidCoordinate { port: String, value: String },
    #[error("gazetteer contains no usable rows")]
    Empty,
}

/// A single port from the gazetteer. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Port {
    /// Canonical main name, unique within the gazetteer.
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Normalized country ("Unknown" when the source has no country column).
    pub country: String,
}

/// The loaded gazetteer: ports plus lookup indexes.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    ports: Vec<Port>,
    by_name: HashMap<String, usize>,
    by_country: HashMap<String, Vec<String>>,
}

/// Normalize a free-text country value to its title-cased primary token.
/// `"NETHERLANDS (Holland)"` → `"Netherlands"`, empty → `"Unknown"`.
pub fn normalize_country(raw: &str) -> String {
    let primary = raw
        .split(['(', '/', ','])
        .next()
        .unwrap_or("")
        .split(" - ")
        .next()
        .unwrap_or("")
        .trim();
    if primary.is_empty() {
        return "Unknown".to_string();
    }
    primary
        .split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl Gazetteer {
    /// Parse gazetteer CSV text. Rows with an empty name are skipped; a
    /// malformed coordinate on a named row is a hard error so bad source
    /// data is surfaced instead of silently shrinking the port list.
    pub fn from_csv(text: &str) -> Result<Self, GazetteerError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let col = |name: &str| headers.iter().position(|h| h == name);
        let name_idx =
            col(NAME_COLUMN).ok_or_else(|| GazetteerError::MissingColumn(NAME_COLUMN.into()))?;
        let lat_idx =
            col(LAT_COLUMN).ok_or_else(|| GazetteerError::MissingColumn(LAT_COLUMN.into()))?;
        let lon_idx =
            col(LON_COLUMN).ok_or_else(|| GazetteerError::MissingColumn(LON_COLUMN.into()))?;
        let country_idx = headers
            .iter()
            .position(|h| h.to_lowercase().contains("country"));

        let mut ports: Vec<Port> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for record in reader.records() {
            let record = record?;
            let name = record.get(name_idx).unwrap_or("").trim();
            if name.is_empty() {
                continue;
            }
            // First occurrence wins; main names are unique in clean data.
            if by_name.contains_key(name) {
                tracing::warn!("Duplicate gazetteer entry '{}' ignored", name);
                continue;
            }

            let parse = |idx: usize| -> Result<f64, GazetteerError> {
                let raw = record.get(idx).unwrap_or("");
                parse_gazetteer_coordinate(raw).ok_or_else(|| GazetteerError::InvalidCoordinate {
                    port: name.to_string(),
                    value: raw.to_string(),
                })
            };
            let latitude = parse(lat_idx)?;
            let longitude = parse(lon_idx)?;

            let country = country_idx
                .map(|i| normalize_country(record.get(i).unwrap_or("")))
                .unwrap_or_else(|| "Unknown".to_string());

            by_name.insert(name.to_string(), ports.len());
            ports.push(Port {
                name: name.to_string(),
                latitude,
                longitude,
                country,
            });
        }

        if ports.is_empty() {
            return Err(GazetteerError::Empty);
        }

        let mut by_country: HashMap<String, Vec<String>> = HashMap::new();
        for port in &ports {
            by_country
                .entry(port.country.clone())
                .or_default()
                .push(port.name.clone());
        }
        for names in by_country.values_mut() {
            names.sort();
        }

        Ok(Self {
            ports,
            by_name,
            by_country,
        })
    }

    /// Load the seed gazetteer from `dir/UpdatedPub150.csv` if present.
    pub fn load_seed_from_dir(dir: &Path) -> Result<Option<Self>, GazetteerError> {
        let path = dir.join("UpdatedPub150.csv");
        if !path.exists() {
            tracing::info!("No seed gazetteer at {}", path.display());
            return Ok(None);
        }
        tracing::info!("Loading seed gazetteer from {}", path.display());
        let text = std::fs::read_to_string(&path)?;
        Self::from_csv(&text).map(Some)
    }

    pub fn get(&self, name: &str) -> Option<&Port> {
        self.by_name.get(name).map(|&i| &self.ports[i])
    }

    /// All port names, sorted.
    pub fn port_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ports.iter().map(|p| p.name.clone()).collect();
        names.sort();
        names
    }

    /// Port names for a normalized country, sorted. Empty when unknown.
    pub fn ports_in_country(&self, country: &str) -> &[String] {
        self.by_country
            .get(country)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn country_count(&self) -> usize {
        self.by_country.len()
    }
}
