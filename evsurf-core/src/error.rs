use thiserror::Error;

pub type Result<T> = std::result::Result<T, SurfaceError>;

/// Errors raised by the event kernels. Every kernel validates its inputs
/// before touching any event, so an error never leaves partial output behind.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("ordering is missing required field '{0}'")]
    MissingField(char),
    #[error("ordering names field '{0}' more than once")]
    DuplicateField(char),
    #[error("event records have {found} columns but the ordering describes {expected}")]
    ColumnMismatch { expected: usize, found: usize },
    #[error("unknown decay mode '{0}', expected 'lin' or 'exp'")]
    UnknownDecay(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("event {index} has {field} = {value}, outside the sensor range [0, {limit})")]
    OutOfBounds {
        index: usize,
        field: char,
        value: f64,
        limit: usize,
    },
    #[error("event {index} has non-finite timestamp {value}")]
    NonFiniteTimestamp { index: usize, value: f64 },
}

pub(crate) fn invalid(msg: impl Into<String>) -> SurfaceError {
    SurfaceError::InvalidParameter(msg.into())
}
