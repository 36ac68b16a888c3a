use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlazeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid experiment definition: {0}")]
    InvalidSpec(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Client resolution error: {0}")]
    ClientResolution(String),

    #[error("Container operation error: {0}")]
    ContainerOperation(String),

    #[error("context canceled")]
    Cancelled,

    #[error("Nix error: {0}")]
    Nix(#[from] nix::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BlazeError>;
