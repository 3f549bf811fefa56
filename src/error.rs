use thiserror::Error;

/// Errors raised while turning user input into a runnable scan.
///
/// Nothing inside the scan loop itself is fallible; every variant here is
/// produced at the input boundary before a scan starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScanError {
    #[error("invalid time of day '{0}', expected HH:MM:SS (e.g. 10:30:00)")]
    InputFormat(String),

    #[error("invalid scan duration {0} hours, minimum is 0.5")]
    InvalidDuration(f64),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

impl ScanError {
    /// Short machine-readable code used in error responses
    pub fn code(&self) -> &'static str {
        match self {
            ScanError::InputFormat(_) => "invalid_time_format",
            ScanError::InvalidDuration(_) => "invalid_duration",
            ScanError::InvalidDate(_) => "invalid_date",
            ScanError::Validation(_) => "validation_failed",
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
