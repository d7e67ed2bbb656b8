//! Voyage arithmetic: ETA, fuel burn, CO₂, cost, multi-leg assembly, and
//! optional brute-force stop-order optimization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::services::searoute::{RouteLeg, SeaRouter};

/// Brute-force stop optimization is factorial in the stop count; 8 stops
/// (40,320 orderings over at most 90 cached legs) is the documented ceiling.
pub const MAX_OPTIMIZE_STOPS: usize = 8;

/// Scenario inputs for one evaluation. Not persisted.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct VoyageParameters {
    /// Service speed in knots. Must be > 0.
    pub speed_kn: f64,
    /// Fuel consumption at this speed, tonnes/day.
    pub consumption_tpd: f64,
    /// CO₂ emission factor, tonnes CO₂ per tonne fuel (e.g. 3.114 for VLSFO).
    pub emission_factor: f64,
    /// Bunker price, USD per tonne.
    pub fuel_price_usd: f64,
}

/// Fuel, emissions and cost for a stretch of voyage time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelOutputs {
    pub fuel_tonnes: f64,
    pub co2_tonnes: f64,
    pub cost_usd: f64,
}

impl VoyageParameters {
    pub fn validate(&self) -> Result<(), AppError> {
        let finite = self.speed_kn.is_finite()
            && self.consumption_tpd.is_finite()
            && self.emission_factor.is_finite()
            && self.fuel_price_usd.is_finite();
        if !finite {
            return Err(AppError::BadRequest(
                "voyage parameters must be finite numbers".to_string(),
            ));
        }
        if self.speed_kn <= 0.0 {
            return Err(AppError::BadRequest(
                "speed_kn must be greater than zero".to_string(),
            ));
        }
        if self.consumption_tpd < 0.0 || self.emission_factor < 0.0 || self.fuel_price_usd < 0.0 {
            return Err(AppError::BadRequest(
                "consumption, emission factor and fuel price must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Transit time in hours for a distance. Errors on non-positive speed
    /// rather than dividing towards infinity.
    pub fn eta_hours(&self, distance_nm: f64) -> Result<f64, AppError> {
        if self.speed_kn <= 0.0 {
            return Err(AppError::BadRequest(
                "ETA undefined for non-positive speed".to_string(),
            ));
        }
        Ok(distance_nm / self.speed_kn)
    }

    /// Fuel burned, CO₂ emitted and fuel cost for a total voyage time.
    pub fn fuel_outputs(&self, total_hours: f64) -> Result<FuelOutputs, AppError> {
        if !total_hours.is_finite() || total_hours < 0.0 {
            return Err(AppError::BadRequest(format!(
                "voyage time must be a non-negative number of hours, got {}",
                total_hours
            )));
        }
        let days = total_hours / 24.0;
        let fuel_tonnes = self.consumption_tpd * days;
        Ok(FuelOutputs {
            fuel_tonnes,
            co2_tonnes: fuel_tonnes * self.emission_factor,
            cost_usd: fuel_tonnes * self.fuel_price_usd,
        })
    }
}

/// CO₂ intensity in kg per nautical mile, guarded against zero distance.
pub fn co2_intensity_kg_per_nm(co2_tonnes: f64, distance_nm: f64) -> f64 {
    (co2_tonnes * 1000.0) / distance_nm.max(1e-6)
}

/// A named voyage waypoint.
#[derive(Debug, Clone)]
pub struct Waypoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Per-leg distance breakdown for the route summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LegSummary {
    pub from: String,
    pub to: String,
    pub distance_km: f64,
    pub distance_nm: f64,
}

/// A fully assembled multi-leg route.
#[derive(Debug, Clone)]
pub struct MultiLegRoute {
    /// Concatenated polyline, (lon, lat) order. The shared vertex at each
    /// leg boundary appears exactly once.
    pub coordinates: Vec<[f64; 2]>,
    pub distance_km: f64,
    pub distance_nm: f64,
    pub legs: Vec<LegSummary>,
}

/// Concatenate routed legs in waypoint order into one route.
pub fn concat_legs(waypoints: &[Waypoint], legs: &[RouteLeg]) -> MultiLegRoute {
    debug_assert_eq!(legs.len() + 1, waypoints.len());

    let mut coordinates: Vec<[f64; 2]> = Vec::new();
    let mut distance_km = 0.0;
    let mut distance_nm = 0.0;
    let mut summaries = Vec::with_capacity(legs.len());

    for (i, leg) in legs.iter().enumerate() {
        // Drop the first vertex of every leg after the first: it duplicates
        // the previous leg's endpoint.
        let skip = usize::from(i > 0);
        coordinates.extend(leg.coordinates.iter().skip(skip));
        distance_km += leg.distance_km;
        distance_nm += leg.distance_nm;
        summaries.push(LegSummary {
            from: waypoints[i].name.clone(),
            to: waypoints[i + 1].name.clone(),
            distance_km: leg.distance_km,
            distance_nm: leg.distance_nm,
        });
    }

    MultiLegRoute {
        coordinates,
        distance_km,
        distance_nm,
        legs: summaries,
    }
}

/// Route every consecutive waypoint pair through the oracle and assemble
/// the multi-leg route.
pub async fn build_route(
    router: &SeaRouter,
    waypoints: &[Waypoint],
) -> Result<MultiLegRoute, AppError> {
    if waypoints.len() < 2 {
        return Err(AppError::BadRequest(
            "a route needs at least an origin and a destination".to_string(),
        ));
    }
    let mut legs = Vec::with_capacity(waypoints.len() - 1);
    for pair in waypoints.windows(2) {
        let leg = router
            .route(
                pair[0].latitude,
                pair[0].longitude,
                pair[1].latitude,
                pair[1].longitude,
            )
            .await?;
        legs.push(leg);
    }
    Ok(concat_legs(waypoints, &legs))
}

/// Find the stop ordering that minimizes total routed distance.
///
/// `leg_nm[i][j]` is the routed NM from waypoint i to waypoint j, where
/// index 0 is the origin, 1..=n are stops, and n+1 is the destination.
/// Returns the best stop ordering as indices into 1..=n.
pub fn best_stop_order(leg_nm: &[Vec<f64>], stop_count: usize) -> Vec<usize> {
    let dest = stop_count + 1;
    let mut stops: Vec<usize> = (1..=stop_count).collect();
    let mut best_order = stops.clone();
    let mut best_total = f64::INFINITY;

    permute(&mut stops, 0, &mut |perm| {
        let mut total = 0.0;
        let mut prev = 0usize;
        for &s in perm {
            total += leg_nm[prev][s];
            prev = s;
        }
        total += leg_nm[prev][dest];
        if total < best_total {
            best_total = total;
            best_order = perm.to_vec();
        }
    });

    best_order
}

/// Recursive in-place permutation visitor (Heap-style swaps).
fn permute(items: &mut [usize], k: usize, visit: &mut impl FnMut(&[usize])) {
    if k == items.len() {
        visit(items);
        return;
    }
    for i in k..items.len() {
        items.swap(k, i);
        permute(items, k + 1, visit);
        items.swap(k, i);
    }
}

/// Reorder intermediate stops to minimize total routed distance.
///
/// Routes all waypoint pairs through the (cached) oracle to build a
/// distance matrix, then brute-forces orderings. Capped at
/// [`MAX_OPTIMIZE_STOPS`] stops.
pub async fn optimize_stop_order(
    router: &SeaRouter,
    origin: &Waypoint,
    stops: &[Waypoint],
    destination: &Waypoint,
) -> Result<Vec<Waypoint>, AppError> {
    if stops.len() > MAX_OPTIMIZE_STOPS {
        return Err(AppError::BadRequest(format!(
            "stop-order optimization supports at most {} intermediate stops, got {}",
            MAX_OPTIMIZE_STOPS,
            stops.len()
        )));
    }
    if stops.is_empty() {
        return Ok(vec![origin.clone(), destination.clone()]);
    }

    let mut all: Vec<&Waypoint> = Vec::with_capacity(stops.len() + 2);
    all.push(origin);
    all.extend(stops.iter());
    all.push(destination);

    let n = all.len();
    let mut leg_nm = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let leg = router
                .route(
                    all[i].latitude,
                    all[i].longitude,
                    all[j].latitude,
                    all[j].longitude,
                )
                .await?;
            leg_nm[i][j] = leg.distance_nm;
        }
    }

    let order = best_stop_order(&leg_nm, stops.len());
    let mut sequence = Vec::with_capacity(n);
    sequence.push(origin.clone());
    for idx in order {
        sequence.push(all[idx].clone());
    }
    sequence.push(destination.clone());
    Ok(sequence)
}
