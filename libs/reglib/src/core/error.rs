use thiserror::Error;

#[derive(Error, Debug)]
pub enum MachineError {
    #[error("Machine graph error: {0}")]
    GraphError(String),

    #[error("Invalid machine file: {0}")]
    MachineFile(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MachineError>;
