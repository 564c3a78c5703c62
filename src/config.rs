use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL; the in-memory backend is used when unset
    #[serde(default)]
    pub database_url: Option<String>,

    /// JSON file loaded into the in-memory backend at startup
    #[serde(default)]
    pub seed_path: Option<String>,

    /// Maximum pooled PostgreSQL connections
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    /// Redis connection URL; recommendation caching is disabled when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Lifetime of cached recommendation lists, in seconds
    #[serde(default = "default_recommendation_cache_ttl_secs")]
    pub recommendation_cache_ttl_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_database_max_connections() -> u32 {
    5
}

fn default_recommendation_cache_ttl_secs() -> u64 {
    crate::api::state::DEFAULT_RECOMMENDATION_TTL
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables, reading `.env` first if present
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from explicit key/value pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
