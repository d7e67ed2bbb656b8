/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the external sea-route oracle.
    pub searoute_url: String,
    /// Request timeout for oracle calls, in seconds.
    pub searoute_timeout_secs: u64,
    /// Maximum number of memoized route legs.
    pub route_cache_size: usize,
    pub port: u16,
    /// Directory checked at startup for a seed gazetteer CSV.
    pub data_dir: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            searoute_url: std::env::var("SEAROUTE_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            searoute_timeout_secs: std::env::var("SEAROUTE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("SEAROUTE_TIMEOUT_SECS must be a valid integer"),
            route_cache_size: std::env::var("ROUTE_CACHE_SIZE")
                .unwrap_or_else(|_| "4096".to_string())
                .parse()
                .expect("ROUTE_CACHE_SIZE must be a valid integer"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
        }
    }
}
