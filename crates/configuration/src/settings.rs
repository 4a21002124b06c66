use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerSettings,
    pub cache: CacheSettings,
    #[serde(default)]
    pub engine: EngineSettings,
}

/// Where the HTTP server binds.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// TTL policy for the in-process result cache. Eviction beyond expiry is the
/// cache's own concern.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub ttl_secs: u64,
}

/// Knobs for the performance computation engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Per-request deadline covering all store calls.
    pub request_timeout_secs: u64,
    /// Hard cap on every ranked result set.
    pub result_limit: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            result_limit: 50,
        }
    }
}
