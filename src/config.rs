use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub base_url: String,

    // Magio account
    pub username: String,
    pub password: String,
    pub language: String,
    pub quality: String,

    // Device identity reported to upstream
    pub device_name: String,
    pub device_type: String,
    pub app_version: String,

    // Storage
    pub data_dir: String,

    // Response cache
    pub cache_ttl_seconds: u64,

    // Misc
    pub user_agent: String,
}

/// User-Agent the Magio backend expects from the GO client.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36 MagioGO/4.0.21";

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),

            // Magio account
            username: env::var("MAGIO_USERNAME").unwrap_or_default(),
            password: env::var("MAGIO_PASSWORD").unwrap_or_default(),
            language: env::var("MAGIO_LANGUAGE")
                .unwrap_or_else(|_| "cz".to_string())
                .to_lowercase(),
            quality: env::var("MAGIO_QUALITY").unwrap_or_else(|_| "p5".to_string()),

            // Device identity
            device_name: env::var("DEVICE_NAME").unwrap_or_else(|_| "ANDROID-STB".to_string()),
            device_type: env::var("DEVICE_TYPE").unwrap_or_else(|_| "OTT_STB".to_string()),
            app_version: env::var("APP_VERSION").unwrap_or_else(|_| "4.0.25-hf.0".to_string()),

            // Storage
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),

            // Response cache
            cache_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300), // 5 minutes

            // Misc
            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        }
    }

    /// Upstream base URL for the configured language region
    pub fn upstream_base_url(&self) -> String {
        format!("https://{}go.magio.tv", self.language)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
