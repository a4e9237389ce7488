use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Gemini API credential pool, comma-separated.
    ///
    /// An absent or empty value is tolerated at startup: generation calls
    /// fail with a configuration error instead of the process refusing to
    /// boot, so the place/image endpoints stay usable.
    #[serde(default)]
    pub gemini_api_keys: String,

    /// Gemini API base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Gemini model used for menu suggestions and nutrition analysis
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Unsplash access key for dish photos; empty disables image lookups
    #[serde(default)]
    pub unsplash_access_key: String,

    /// Unsplash API base URL
    #[serde(default = "default_unsplash_api_url")]
    pub unsplash_api_url: String,

    /// Overpass interpreter endpoint for nearby-venue discovery
    #[serde(default = "default_overpass_api_url")]
    pub overpass_api_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_unsplash_api_url() -> String {
    "https://api.unsplash.com".to_string()
}

fn default_overpass_api_url() -> String {
    "https://overpass.kumi.systems/api/interpreter".to_string()
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
}
