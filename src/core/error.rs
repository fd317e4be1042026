use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Root directory not found: {0}")]
    RootNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable machine-readable code for the JSON error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "validation.invalid_argument",
            Error::RootNotFound(_) => "root.not_found",
            Error::NotADirectory(_) => "validation.not_a_directory",
            Error::Io(_) => "internal.io_error",
            Error::Json(_) => "internal.json_error",
        }
    }
}
