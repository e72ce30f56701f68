use std::path::Path;

// Declare the modules that make up this crate.
#[cfg(feature = "clap")]
pub mod cli;
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{
    DateRange, TailRiskOptions, DEFAULT_CONCENTRATION_WEIGHT, DEFAULT_MIN_TRADING_DAYS,
    DEFAULT_TAIL_THRESHOLD, DEFAULT_VARIANCE_THRESHOLD,
};

/// Environment variable prefix, e.g. `TAILRISK_TAIL_THRESHOLD=0.05`.
pub const ENV_PREFIX: &str = "TAILRISK";

/// Loads the analysis options from an optional TOML file and the environment.
///
/// The file may be absent, in which case only the environment and the built-in
/// defaults apply. Environment variables take precedence over the file.
pub fn load_options(path: impl AsRef<Path>) -> Result<TailRiskOptions, ConfigError> {
    load_from(path.as_ref(), environment())
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX).try_parsing(true)
}

fn load_from(path: &Path, environment: config::Environment) -> Result<TailRiskOptions, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(environment)
        .build()?;

    let options = builder.try_deserialize::<TailRiskOptions>()?;
    validate(&options)?;

    tracing::debug!(path = %path.display(), ?options, "Loaded tail-risk options.");
    Ok(options)
}

/// Rejects option combinations that cannot be clamped into something meaningful.
pub fn validate(options: &TailRiskOptions) -> Result<(), ConfigError> {
    if let Some(DateRange { from: Some(from), to: Some(to) }) = options.date_range {
        if from > to {
            return Err(ConfigError::ValidationError {
                field: "date_range",
                reason: format!("from ({from}) is after to ({to})"),
            });
        }
    }
    Ok(())
}
