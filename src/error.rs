use thiserror::Error;

/// Failure kinds for the I/O-touching parts of the pipeline. Pure
/// transforms (accessor, normalizer, filter, reconciler, summaries)
/// are total and never produce one of these.
#[derive(Debug, Error)]
pub enum Error {
    /// A named project has no match in the tracker's project list.
    #[error("project not found in tracker: {0}")]
    ProjectNotFound(String),

    /// A schedule source is missing its sheet, data region, or headers.
    #[error("invalid schedule format: {0}")]
    InvalidFormat(String),

    /// The tracker API could not be reached or answered with an error.
    #[error("tracker unavailable: {0}")]
    Unavailable(String),

    /// Local read/write of cached state failed.
    #[error("storage error: {0}")]
    Persistence(String),

    /// The caller aborted an in-flight fetch.
    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}
