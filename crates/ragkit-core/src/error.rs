use serde::Serialize;
use thiserror::Error;

/// Coarse classification of an [`Error`], stable across messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Io,
    NotFound,
    Build,
    Grounding,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Io => "io",
            Self::NotFound => "not_found",
            Self::Build => "build",
            Self::Grounding => "grounding",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Build error: {0}")]
    Build(String),

    #[error("Grounding error: {0}")]
    Grounding(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Io(_) => ErrorKind::Io,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Build(_) => ErrorKind::Build,
            Self::Grounding(_) => ErrorKind::Grounding,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m) | Self::Io(m) | Self::NotFound(m) | Self::Build(m) | Self::Grounding(m) => m,
        }
    }

    /// Convert an adapter-level fault into a typed error.
    ///
    /// Faults that already carry an [`Error`] keep their kind; an underlying
    /// `std::io::Error` of kind `NotFound` maps to [`Error::NotFound`];
    /// everything else becomes [`Error::Io`].
    pub fn from_fault(fault: anyhow::Error) -> Self {
        match fault.downcast::<Error>() {
            Ok(err) => err,
            Err(fault) => match fault.downcast_ref::<std::io::Error>() {
                Some(io) if io.kind() == std::io::ErrorKind::NotFound => Self::NotFound(format!("{fault:#}")),
                _ => Self::Io(format!("{fault:#}")),
            },
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound { Self::NotFound(e.to_string()) } else { Self::Io(e.to_string()) }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
