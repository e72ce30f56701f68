use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML file or a `TAILRISK_*` variable could not be read into options.
    #[error("Failed to load tail-risk options: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid {field}: {reason}")]
    ValidationError { field: &'static str, reason: String },
}
