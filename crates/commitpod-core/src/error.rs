use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
