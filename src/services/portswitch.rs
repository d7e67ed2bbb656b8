//! Smart PortSwitch: re-score alternate destination ports under one model.
//!
//! Pool building and filtering are cheap and local; each surviving
//! candidate then costs one oracle route, one congestion resolution and
//! the fuel arithmetic. Metrics are min-max normalized across the
//! candidate set and combined into a single weighted score — lower is
//! better, because every metric is a cost.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::helpers::haversine_nm;
use crate::services::congestion::CongestionResolver;
use crate::services::gazetteer::Gazetteer;
use crate::services::searoute::SeaRouter;
use crate::services::voyage::VoyageParameters;

/// Non-negative weights for the four normalized cost metrics. They need
/// not sum to 1; the ranking is relative.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct ScoreWeights {
    /// Weight on transit time.
    pub time: f64,
    /// Weight on congestion wait.
    pub congestion: f64,
    /// Weight on fuel cost.
    pub cost: f64,
    /// Weight on CO₂ emissions.
    pub co2: f64,
}

impl ScoreWeights {
    pub fn validate(&self) -> Result<(), AppError> {
        let ok = [self.time, self.congestion, self.cost, self.co2]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0);
        if ok {
            Ok(())
        } else {
            Err(AppError::BadRequest(
                "score weights must be non-negative finite numbers".to_string(),
            ))
        }
    }
}

/// Candidate pool filters.
#[derive(Debug, Clone, Copy)]
pub struct CandidateFilters {
    /// Restrict the pool to the baseline destination's country.
    pub same_country_only: bool,
    /// Drop candidates farther than this from the baseline destination
    /// (great-circle NM). 0 disables the filter.
    pub radius_nm: f64,
}

/// One evaluated candidate port.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Candidate {
    pub port: String,
    pub country: String,
    pub distance_nm: f64,
    /// Transit time at service speed, hours.
    pub eta_hours: f64,
    /// Resolved congestion wait, hours.
    pub wait_hours: f64,
    /// Transit + wait, hours.
    pub adjusted_eta_hours: f64,
    pub fuel_tonnes: f64,
    pub co2_tonnes: f64,
    pub cost_usd: f64,
    /// Min-max normalized metrics in [0, 1].
    pub eta_norm: f64,
    pub wait_norm: f64,
    pub cost_norm: f64,
    pub co2_norm: f64,
    /// Weighted composite; lower is better.
    pub score: f64,
    /// Routed polyline from the voyage origin, (lon, lat) order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub coordinates: Vec<[f64; 2]>,
}

/// A candidate dropped because its route could not be computed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SkippedCandidate {
    pub port: String,
    pub reason: String,
}

/// Full evaluation outcome. An empty `candidates` list is a normal result
/// of strict filters, not an error.
#[derive(Debug, Clone, Default)]
pub struct PortSwitchOutcome {
    /// Candidates sorted ascending by composite score.
    pub candidates: Vec<Candidate>,
    pub skipped: Vec<SkippedCandidate>,
}

impl PortSwitchOutcome {
    /// The recommendation: the lowest-score candidate, if any.
    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}

/// Build the candidate pool: same-country ports (or all), always including
/// the baseline destination, never the voyage origin.
pub fn build_candidate_pool(
    gazetteer: &Gazetteer,
    baseline_dest: &str,
    origin_name: &str,
    same_country_only: bool,
) -> Vec<String> {
    let mut pool: Vec<String> = if same_country_only {
        match gazetteer.get(baseline_dest) {
            Some(port) => gazetteer.ports_in_country(&port.country).to_vec(),
            None => Vec::new(),
        }
    } else {
        gazetteer.port_names()
    };

    if !pool.iter().any(|p| p == baseline_dest) {
        pool.push(baseline_dest.to_string());
    }
    pool.retain(|p| p != origin_name);
    pool
}

/// Drop pool entries farther than `radius_nm` great-circle from the
/// baseline destination. 0 disables the filter. Entries missing from the
/// gazetteer are dropped.
pub fn apply_radius_filter(
    gazetteer: &Gazetteer,
    pool: Vec<String>,
    baseline_dest: &str,
    radius_nm: f64,
) -> Vec<String> {
    let Some(base) = gazetteer.get(baseline_dest) else {
        return pool;
    };
    let (b_lat, b_lon) = (base.latitude, base.longitude);
    pool.into_iter()
        .filter(|name| {
            gazetteer.get(name).is_some_and(|p| {
                radius_nm <= 0.0
                    || haversine_nm(b_lat, b_lon, p.latitude, p.longitude) <= radius_nm
            })
        })
        .collect()
}

/// Min-max normalize to [0, 1]. A zero-range (all-tied) metric normalizes
/// to 0 for every candidate — no division by zero, and a degenerate metric
/// cannot reward anyone.
fn normalize(values: &[f64]) -> Vec<f64> {
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().copied().fold(min, f64::max);
    let range = max - min;
    if range == 0.0 || !range.is_finite() {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / range).collect()
}

/// Fill in normalized metrics and composite scores, then sort ascending by
/// score. The sort is stable, so ties keep enumeration order.
pub fn score_and_rank(candidates: &mut Vec<Candidate>, weights: &ScoreWeights) {
    let eta_norm = normalize(&candidates.iter().map(|c| c.eta_hours).collect::<Vec<_>>());
    let wait_norm = normalize(&candidates.iter().map(|c| c.wait_hours).collect::<Vec<_>>());
    let cost_norm = normalize(&candidates.iter().map(|c| c.cost_usd).collect::<Vec<_>>());
    let co2_norm = normalize(&candidates.iter().map(|c| c.co2_tonnes).collect::<Vec<_>>());

    for (i, c) in candidates.iter_mut().enumerate() {
        c.eta_norm = eta_norm[i];
        c.wait_norm = wait_norm[i];
        c.cost_norm = cost_norm[i];
        c.co2_norm = co2_norm[i];
        c.score = c.eta_norm * weights.time
            + c.wait_norm * weights.congestion
            + c.cost_norm * weights.cost
            + c.co2_norm * weights.co2;
    }

    candidates.sort_by(|a, b| a.score.total_cmp(&b.score));
}

/// Evaluate alternate destinations for a voyage from `origin` to
/// `baseline_dest`.
///
/// Oracle failures are isolated per candidate: the candidate lands in
/// `skipped` with its reason and evaluation continues.
#[allow(clippy::too_many_arguments)]
pub async fn evaluate(
    gazetteer: &Gazetteer,
    router: &SeaRouter,
    resolver: &CongestionResolver<'_>,
    params: &VoyageParameters,
    origin_name: &str,
    origin_lat: f64,
    origin_lon: f64,
    baseline_dest: &str,
    filters: &CandidateFilters,
    weights: &ScoreWeights,
) -> Result<PortSwitchOutcome, AppError> {
    params.validate()?;
    weights.validate()?;

    if gazetteer.get(baseline_dest).is_none() {
        return Err(AppError::NotFound(format!(
            "baseline destination '{}' not in gazetteer",
            baseline_dest
        )));
    }

    let pool = build_candidate_pool(
        gazetteer,
        baseline_dest,
        origin_name,
        filters.same_country_only,
    );
    let pool = apply_radius_filter(gazetteer, pool, baseline_dest, filters.radius_nm);

    if pool.is_empty() {
        return Ok(PortSwitchOutcome::default());
    }

    let mut candidates = Vec::with_capacity(pool.len());
    let mut skipped = Vec::new();

    for name in pool {
        let Some(port) = gazetteer.get(&name) else {
            continue;
        };

        let leg = match router
            .route(origin_lat, origin_lon, port.latitude, port.longitude)
            .await
        {
            Ok(leg) => leg,
            Err(e) => {
                tracing::warn!("Skipping candidate '{}': {}", name, e);
                skipped.push(SkippedCandidate {
                    port: name,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let eta_hours = params.eta_hours(leg.distance_nm)?;
        let wait_hours =
            resolver.resolve_wait(&port.name, Some(port.latitude), Some(port.longitude));
        let adjusted_eta_hours = eta_hours + wait_hours;
        let fuel = params.fuel_outputs(adjusted_eta_hours)?;

        candidates.push(Candidate {
            port: port.name.clone(),
            country: port.country.clone(),
            distance_nm: leg.distance_nm,
            eta_hours,
            wait_hours,
            adjusted_eta_hours,
            fuel_tonnes: fuel.fuel_tonnes,
            co2_tonnes: fuel.co2_tonnes,
            cost_usd: fuel.cost_usd,
            eta_norm: 0.0,
            wait_norm: 0.0,
            cost_norm: 0.0,
            co2_norm: 0.0,
            score: 0.0,
            coordinates: leg.coordinates,
        });
    }

    score_and_rank(&mut candidates, weights);
    Ok(PortSwitchOutcome {
        candidates,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::congestion::{AliasMap, CongestionTable, TokenSortScorer};
    use crate::services::searoute::SeaRouteClient;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GAZ_CSV: &str = "\
Main Port Name,Country Code,Latitude,Longitude
Rotterdam,NETHERLANDS,51.95,4.05
Amsterdam,NETHERLANDS,52.40,4.80
Vlissingen,NETHERLANDS,51.44,3.60
Hamburg,GERMANY,53.54,9.93
Port Klang,MALAYSIA,3.00,101.40
";

    fn gazetteer() -> Gazetteer {
        Gazetteer::from_csv(GAZ_CSV).unwrap()
    }

    fn weights(time: f64, congestion: f64, cost: f64, co2: f64) -> ScoreWeights {
        ScoreWeights {
            time,
            congestion,
            cost,
            co2,
        }
    }

    fn raw_candidate(port: &str, eta: f64, wait: f64, cost: f64, co2: f64) -> Candidate {
        Candidate {
            port: port.to_string(),
            country: "Unknown".to_string(),
            distance_nm: 0.0,
            eta_hours: eta,
            wait_hours: wait,
            adjusted_eta_hours: eta + wait,
            fuel_tonnes: 0.0,
            co2_tonnes: co2,
            cost_usd: cost,
            eta_norm: 0.0,
            wait_norm: 0.0,
            cost_norm: 0.0,
            co2_norm: 0.0,
            score: 0.0,
            coordinates: Vec::new(),
        }
    }

    // --- pool building & filtering ---

    #[test]
    fn test_pool_same_country_includes_baseline_excludes_origin() {
        let gaz = gazetteer();
        let pool = build_candidate_pool(&gaz, "Rotterdam", "Port Klang", true);
        assert_eq!(pool, ["Amsterdam", "Rotterdam", "Vlissingen"]);
    }

    #[test]
    fn test_pool_all_ports_excludes_origin() {
        let gaz = gazetteer();
        let pool = build_candidate_pool(&gaz, "Rotterdam", "Port Klang", false);
        assert!(pool.contains(&"Hamburg".to_string()));
        assert!(!pool.contains(&"Port Klang".to_string()));
    }

    #[test]
    fn test_radius_zero_disables_filter() {
        let gaz = gazetteer();
        let pool = build_candidate_pool(&gaz, "Rotterdam", "Port Klang", true);
        let filtered = apply_radius_filter(&gaz, pool.clone(), "Rotterdam", 0.0);
        assert_eq!(filtered, pool);
    }

    #[test]
    fn test_small_radius_excludes_distant_ports() {
        let gaz = gazetteer();
        let pool = build_candidate_pool(&gaz, "Rotterdam", "Port Klang", false);
        // 100 NM around Rotterdam keeps the Dutch ports, drops Hamburg
        let filtered = apply_radius_filter(&gaz, pool, "Rotterdam", 100.0);
        assert!(filtered.contains(&"Rotterdam".to_string()));
        assert!(filtered.contains(&"Amsterdam".to_string()));
        assert!(!filtered.contains(&"Hamburg".to_string()));
    }

    // --- normalization & scoring ---

    #[test]
    fn test_normalize_min_zero_max_one() {
        let mut cands = vec![
            raw_candidate("A", 100.0, 0.0, 1000.0, 10.0),
            raw_candidate("B", 200.0, 5.0, 2000.0, 20.0),
            raw_candidate("C", 300.0, 10.0, 3000.0, 30.0),
        ];
        score_and_rank(&mut cands, &weights(1.0, 1.0, 1.0, 1.0));
        assert_eq!(cands[0].eta_norm, 0.0);
        assert_eq!(cands[2].eta_norm, 1.0);
        assert_eq!(cands[0].score, 0.0);
        assert_eq!(cands[2].score, 4.0);
    }

    #[test]
    fn test_single_candidate_normalizes_to_zero() {
        let mut cands = vec![raw_candidate("A", 100.0, 5.0, 1000.0, 10.0)];
        score_and_rank(&mut cands, &weights(1.0, 1.0, 1.0, 1.0));
        assert_eq!(cands[0].eta_norm, 0.0);
        assert_eq!(cands[0].wait_norm, 0.0);
        assert_eq!(cands[0].score, 0.0);
    }

    #[test]
    fn test_tied_metric_normalizes_to_zero() {
        let mut cands = vec![
            raw_candidate("A", 100.0, 3.0, 1000.0, 10.0),
            raw_candidate("B", 100.0, 7.0, 2000.0, 20.0),
        ];
        score_and_rank(&mut cands, &weights(1.0, 0.0, 0.0, 0.0));
        // ETA ties → both normalize to 0, ranking keeps enumeration order
        assert_eq!(cands[0].port, "A");
        assert_eq!(cands[0].eta_norm, 0.0);
        assert_eq!(cands[1].eta_norm, 0.0);
    }

    #[test]
    fn test_congestion_only_weight_orders_by_wait() {
        // Equal ETAs, waits [10, 0, 5] → ranking strictly by ascending wait
        let mut cands = vec![
            raw_candidate("TenHours", 100.0, 10.0, 1000.0, 10.0),
            raw_candidate("NoWait", 100.0, 0.0, 1000.0, 10.0),
            raw_candidate("FiveHours", 100.0, 5.0, 1000.0, 10.0),
        ];
        score_and_rank(&mut cands, &weights(0.0, 1.0, 0.0, 0.0));
        let order: Vec<&str> = cands.iter().map(|c| c.port.as_str()).collect();
        assert_eq!(order, ["NoWait", "FiveHours", "TenHours"]);
    }

    // --- full evaluation against a mock oracle ---

    fn oracle_body(dest_lonlat: [f64; 2], km: f64) -> serde_json::Value {
        serde_json::json!({
            "type": "Feature",
            "geometry": { "type": "LineString",
                          "coordinates": [[101.4, 3.0], dest_lonlat] },
            "properties": { "length": km }
        })
    }

    async fn mount_route(server: &MockServer, dest: &str, dest_lonlat: [f64; 2], km: f64) {
        Mock::given(method("GET"))
            .and(path("/searoute"))
            .and(query_param("destination", dest))
            .respond_with(ResponseTemplate::new(200).set_body_json(oracle_body(dest_lonlat, km)))
            .mount(server)
            .await;
    }

    fn resolver_parts() -> (CongestionTable, AliasMap, TokenSortScorer) {
        let table = CongestionTable::from_csv(
            "Port,WaitTime_hr\nRotterdam,36\nAmsterdam,0\nVlissingen,12\n",
        )
        .unwrap();
        (table, AliasMap::default(), TokenSortScorer)
    }

    fn params() -> VoyageParameters {
        VoyageParameters {
            speed_kn: 18.0,
            consumption_tpd: 30.0,
            emission_factor: 3.114,
            fuel_price_usd: 600.0,
        }
    }

    #[tokio::test]
    async fn test_evaluate_ranks_and_includes_baseline() {
        let server = MockServer::start().await;
        mount_route(&server, "4.05,51.95", [4.05, 51.95], 15000.0).await;
        mount_route(&server, "4.8,52.4", [4.8, 52.4], 15100.0).await;
        mount_route(&server, "3.6,51.44", [3.6, 51.44], 14950.0).await;

        let gaz = gazetteer();
        let router = SeaRouter::new(SeaRouteClient::new(&server.uri(), 5), 64);
        let (table, aliases, scorer) = resolver_parts();
        let resolver = CongestionResolver {
            table: &table,
            aliases: &aliases,
            scorer: &scorer,
            fuzzy_threshold: 88.0,
            geo_radius_km: 0.0,
        };
        let filters = CandidateFilters {
            same_country_only: true,
            radius_nm: 0.0,
        };

        let outcome = evaluate(
            &gaz,
            &router,
            &resolver,
            &params(),
            "Port Klang",
            3.0,
            101.4,
            "Rotterdam",
            &filters,
            &weights(0.0, 1.0, 0.0, 0.0),
        )
        .await
        .unwrap();

        assert_eq!(outcome.candidates.len(), 3);
        assert!(outcome.skipped.is_empty());
        // Congestion-only weighting: Amsterdam (0h) < Vlissingen (12h) < Rotterdam (36h)
        assert_eq!(outcome.best().unwrap().port, "Amsterdam");
        assert_eq!(outcome.candidates[2].port, "Rotterdam");
        // Baseline is present even though it lost
        assert!(outcome.candidates.iter().any(|c| c.port == "Rotterdam"));
    }

    #[tokio::test]
    async fn test_evaluate_skips_failed_candidate_and_continues() {
        let server = MockServer::start().await;
        mount_route(&server, "4.05,51.95", [4.05, 51.95], 15000.0).await;
        mount_route(&server, "3.6,51.44", [3.6, 51.44], 14950.0).await;
        Mock::given(method("GET"))
            .and(path("/searoute"))
            .and(query_param("destination", "4.8,52.4"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let gaz = gazetteer();
        let router = SeaRouter::new(SeaRouteClient::new(&server.uri(), 5), 64);
        let (table, aliases, scorer) = resolver_parts();
        let resolver = CongestionResolver {
            table: &table,
            aliases: &aliases,
            scorer: &scorer,
            fuzzy_threshold: 88.0,
            geo_radius_km: 0.0,
        };
        let filters = CandidateFilters {
            same_country_only: true,
            radius_nm: 0.0,
        };

        let outcome = evaluate(
            &gaz,
            &router,
            &resolver,
            &params(),
            "Port Klang",
            3.0,
            101.4,
            "Rotterdam",
            &filters,
            &weights(1.0, 1.0, 1.0, 1.0),
        )
        .await
        .unwrap();

        assert_eq!(outcome.candidates.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].port, "Amsterdam");
    }

    #[tokio::test]
    async fn test_evaluate_empty_pool_is_not_an_error() {
        let server = MockServer::start().await;
        let gaz = gazetteer();
        let router = SeaRouter::new(SeaRouteClient::new(&server.uri(), 5), 64);
        let (table, aliases, scorer) = resolver_parts();
        let resolver = CongestionResolver {
            table: &table,
            aliases: &aliases,
            scorer: &scorer,
            fuzzy_threshold: 88.0,
            geo_radius_km: 0.0,
        };
        // Radius so small that even the baseline survives alone, with the
        // origin equal to the baseline: pool empties out.
        let filters = CandidateFilters {
            same_country_only: true,
            radius_nm: 1e-9,
        };

        let outcome = evaluate(
            &gaz,
            &router,
            &resolver,
            &params(),
            "Rotterdam", // origin == baseline → excluded from pool
            51.95,
            4.05,
            "Rotterdam",
            &filters,
            &weights(1.0, 1.0, 1.0, 1.0),
        )
        .await
        .unwrap();

        assert!(outcome.candidates.is_empty());
        assert!(outcome.best().is_none());
    }

    #[tokio::test]
    async fn test_evaluate_unknown_baseline_is_not_found() {
        let server = MockServer::start().await;
        let gaz = gazetteer();
        let router = SeaRouter::new(SeaRouteClient::new(&server.uri(), 5), 64);
        let (table, aliases, scorer) = resolver_parts();
        let resolver = CongestionResolver {
            table: &table,
            aliases: &aliases,
            scorer: &scorer,
            fuzzy_threshold: 88.0,
            geo_radius_km: 0.0,
        };
        let filters = CandidateFilters {
            same_country_only: false,
            radius_nm: 0.0,
        };

        let err = evaluate(
            &gaz,
            &router,
            &resolver,
            &params(),
            "Port Klang",
            3.0,
            101.4,
            "Atlantis",
            &filters,
            &weights(1.0, 1.0, 1.0, 1.0),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
