use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{CacheSettings, Config, EngineSettings, ServerSettings};

/// Loads the application configuration from the `config.toml` file.
///
/// This function is the primary entry point for this crate. It reads the
/// configuration file, deserializes it into our strongly-typed `Config`
/// struct, and returns it.
pub fn load_config() -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        // Tells the builder to look for a file named `config.toml`
        .add_source(config::File::with_name("config.toml"))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    Ok(config)
}

/// Rejects settings that would deserialize cleanly but misconfigure the
/// service at runtime.
fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.server.host.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "server.host must not be empty".to_string(),
        ));
    }
    if config.engine.result_limit == 0 {
        return Err(ConfigError::ValidationError(
            "engine.result_limit must be at least 1".to_string(),
        ));
    }
    if config.engine.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "engine.request_timeout_secs must be at least 1".to_string(),
        ));
    }
    Ok(())
}
