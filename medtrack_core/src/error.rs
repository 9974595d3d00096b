//! Error types for the medtrack_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for medtrack_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required field was absent from a payload or request
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Frequency is not one of daily/weekly/monthly
    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    /// timeSlots is not an object or names none of the known slots
    #[error("Invalid time slots: {0}")]
    InvalidTimeSlots(String),

    /// Duration dates are unparsable or out of order
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// A query or update date could not be parsed
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// timeSlot is not morning/afternoon/dinner, or not enabled for the medicine
    #[error("Invalid time slot: {0}")]
    InvalidSlot(String),

    /// Referenced schedule or medicine does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Date falls outside the medicine's day-offset ledger
    #[error("Date out of range: {0}")]
    OutOfRange(String),

    /// Date is inside the window but the recurrence rule does not select it
    #[error("Medicine is not scheduled for this date based on frequency: {0}")]
    NotScheduled(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schedule storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Stable classification of an [`Error`], for callers mapping failures to responses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    MissingField,
    InvalidFrequency,
    InvalidTimeSlots,
    InvalidDuration,
    InvalidDate,
    InvalidSlot,
    NotFound,
    OutOfRange,
    NotScheduled,
    Io,
    Serialization,
    Config,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingField => "missing_field",
            ErrorKind::InvalidFrequency => "invalid_frequency",
            ErrorKind::InvalidTimeSlots => "invalid_time_slots",
            ErrorKind::InvalidDuration => "invalid_duration",
            ErrorKind::InvalidDate => "invalid_date",
            ErrorKind::InvalidSlot => "invalid_slot",
            ErrorKind::NotFound => "not_found",
            ErrorKind::OutOfRange => "out_of_range",
            ErrorKind::NotScheduled => "not_scheduled",
            ErrorKind::Io => "io",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Config => "config",
            ErrorKind::Storage => "storage",
        }
    }

    /// Whether the failure was caused by the caller's input rather than the environment
    pub fn is_input_error(&self) -> bool {
        !matches!(
            self,
            ErrorKind::Io | ErrorKind::Serialization | ErrorKind::Config | ErrorKind::Storage
        )
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingField(_) => ErrorKind::MissingField,
            Error::InvalidFrequency(_) => ErrorKind::InvalidFrequency,
            Error::InvalidTimeSlots(_) => ErrorKind::InvalidTimeSlots,
            Error::InvalidDuration(_) => ErrorKind::InvalidDuration,
            Error::InvalidDate(_) => ErrorKind::InvalidDate,
            Error::InvalidSlot(_) => ErrorKind::InvalidSlot,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::OutOfRange(_) => ErrorKind::OutOfRange,
            Error::NotScheduled(_) => ErrorKind::NotScheduled,
            Error::Io(_) => ErrorKind::Io,
            Error::Json(_) | Error::Csv(_) | Error::Toml(_) => ErrorKind::Serialization,
            Error::Config(_) => ErrorKind::Config,
            Error::Storage(_) => ErrorKind::Storage,
        }
    }
}
