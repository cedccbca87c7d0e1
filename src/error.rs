use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum SimError {
    #[error("{agent} has a non-finite position ({x}, {y})")]
    NonFinitePosition { agent: String, x: f32, y: f32 },

    #[error("invalid maze: {0}")]
    InvalidMaze(String),

    #[error("unknown hunter index {0}")]
    MissingHunter(usize),

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type SimResult<T> = Result<T, SimError>;
