use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB v3 API key. Absent means every catalog call degrades to "no results".
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Redis connection URL. Enables the response cache and Redis-backed favorites.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// TTL for cached TMDB responses, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// File used for the favorites list when Redis is not configured
    #[serde(default = "default_favorites_path")]
    pub favorites_path: String,

    /// Hosted model endpoint used for recommendations
    #[serde(default = "default_recommendation_api_url")]
    pub recommendation_api_url: String,

    /// Hosted model API key. Absent disables the recommendations endpoint.
    #[serde(default)]
    pub recommendation_api_key: Option<String>,

    #[serde(default = "default_recommendation_model")]
    pub recommendation_model: String,

    /// Seconds a list session may sit unused before it is dropped
    #[serde(default = "default_list_session_ttl_secs")]
    pub list_session_ttl_secs: u64,

    /// Upper bound on open list sessions
    #[serde(default = "default_max_list_sessions")]
    pub max_list_sessions: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_favorites_path() -> String {
    "movora-watch-later.json".to_string()
}

fn default_recommendation_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_recommendation_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_list_session_ttl_secs() -> u64 {
    1800
}

fn default_max_list_sessions() -> usize {
    1000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_unset() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.tmdb_api_key, None);
        assert_eq!(config.tmdb_api_url, "https://api.themoviedb.org/3");
        assert_eq!(config.redis_url, None);
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.list_session_ttl_secs, 1800);
        assert_eq!(config.max_list_sessions, 1000);
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_values_read_from_environment() {
        let vars = vec![
            ("TMDB_API_KEY".to_string(), "abc123".to_string()),
            ("REDIS_URL".to_string(), "redis://cache:6379".to_string()),
            ("PORT".to_string(), "8080".to_string()),
            ("MAX_LIST_SESSIONS".to_string(), "50".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.tmdb_api_key.as_deref(), Some("abc123"));
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_list_sessions, 50);
    }
}
