//! Shared unit conversions and great-circle distance.
//!
//! The km ↔ NM factor 0.539957 is used consistently in both directions so
//! round trips stay within floating tolerance. Great-circle distances use
//! the haversine formula on a spherical earth (R = 6371 km), which is the
//! accuracy class the rest of the pipeline works at.

/// Nautical miles per kilometre.
pub const NM_PER_KM: f64 = 0.539957;

/// Mean earth radius in kilometres (spherical model).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Convert kilometres to nautical miles.
pub fn km_to_nm(km: f64) -> f64 {
    km * NM_PER_KM
}

/// Convert nautical miles to kilometres.
pub fn nm_to_km(nm: f64) -> f64 {
    nm / NM_PER_KM
}

/// Great-circle distance between two WGS84 points, in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Great-circle distance in nautical miles.
pub fn haversine_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    km_to_nm(haversine_km(lat1, lon1, lat2, lon2))
}
