use thiserror::Error;

/// Errors reported to callers of the profiler.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested sample capacity is not a positive number.
    #[error("invalid sample capacity: {capacity} (must be positive)")]
    InvalidConfiguration { capacity: i64 },

    /// The sample buffer for the requested capacity cannot be allocated.
    #[error("sample capacity too large: {capacity}")]
    CapacityTooLarge { capacity: usize },

    /// No profiling session is active for the target context.
    #[error("memory profiler not started")]
    NotStarted,

    /// Writing a report failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
