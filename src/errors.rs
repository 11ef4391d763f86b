use thiserror::Error;

use crate::run::RunStatus;
use crate::Id;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents an SQL error.
    #[error("SQLx error")]
    Sqlx { source: sqlx::Error },

    /// Represents a latitude outside [-90, 90].
    #[error("Latitude has to be between -90.0 and 90.0 (got {0})")]
    InvalidLatitude(f64),

    /// Represents a longitude outside [-180, 180].
    #[error("Longitude has to be between -180.0 and 180.0 (got {0})")]
    InvalidLongitude(f64),

    /// Represents a coach rating outside [1, 5].
    #[error("Rating has to be between 1 and 5 (got {0})")]
    InvalidRating(i64),

    /// Represents an athlete weight outside (0, 900).
    #[error("Weight has to be between 1 and 899 (got {0})")]
    InvalidWeight(i64),

    /// Represents a collectible item value that doesn’t fit the schema.
    #[error("Value has to be between 0 and 32767 (got {0})")]
    InvalidItemValue(i64),

    /// Represents a text field that is blank or too long.
    #[error("{field} has to be between {min} and {max} characters long")]
    InvalidLength {
        field: &'static str,
        min: usize,
        max: usize,
    },

    /// Represents a picture URL that couldn’t be parsed.
    #[error("Unable to parse URL {url:?}")]
    UnableToParseUrl { url: String, source: url::ParseError },

    /// Represents a picture URL that isn’t served over HTTP(S).
    #[error("Picture URL must use http or https (got {0})")]
    UnsupportedUrlScheme(String),

    /// Represents a position submitted for a run that isn’t running.
    #[error("Run {id} is {status}; its status has to be ‘in_progress’")]
    RunNotInProgress { id: Id, status: RunStatus },

    /// Represents a position that isn’t later than the latest one.
    #[error("Position time has to be later than the latest position of run {run} (at {latest})")]
    NonChronologicalPosition { run: Id, latest: i64 },

    /// Represents a lifecycle transition from the wrong status.
    #[error("Incorrect status: run {id} is {actual}, expected {expected}")]
    InvalidRunStatus {
        id: Id,
        expected: RunStatus,
        actual: RunStatus,
    },

    /// Represents a status column the application doesn’t know.
    #[error("Unknown run status {0:?}")]
    UnknownRunStatus(String),

    #[error("Run {0} does not exist")]
    NonExistentRun(Id),

    #[error("User {0} does not exist")]
    NonExistentUser(Id),

    /// Represents an operation reserved for athletes attempted by a coach.
    #[error("User {0} is not an athlete")]
    NotAnAthlete(Id),

    /// Represents an operation on a coach that targets an athlete.
    #[error("User {0} is not a coach")]
    NotACoach(Id),

    #[error("Athlete {athlete} is already subscribed to coach {coach}")]
    AlreadySubscribed { athlete: Id, coach: Id },

    #[error("Athlete {athlete} isn’t subscribed to coach {coach}")]
    NotSubscribed { athlete: Id, coach: Id },

    /// Represents an error caused by a malformed form submission.
    #[error("Malformed form submission")]
    MalformedFormSubmission,

    /// Represents an error caused by missing parts in a form submission.
    #[error("Missing parts")]
    PartsMissing,

    /// Represents an upload that isn’t valid CSV.
    #[error("Unable to read CSV data")]
    MalformedCsv { source: csv::Error },
}

/// Broad classes of [`BackendError`], used to choose HTTP statuses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    InvalidState,
    NotFound,
    Conflict,
    Permission,
    Internal,
}

impl BackendError {
    pub fn kind(&self) -> ErrorKind {
        use BackendError::*;

        match self {
            InvalidLatitude(..)
            | InvalidLongitude(..)
            | InvalidRating(..)
            | InvalidWeight(..)
            | InvalidItemValue(..)
            | InvalidLength { .. }
            | UnableToParseUrl { .. }
            | UnsupportedUrlScheme(..)
            | RunNotInProgress { .. }
            | NonChronologicalPosition { .. }
            | MalformedFormSubmission
            | PartsMissing
            | MalformedCsv { .. } => ErrorKind::Validation,
            InvalidRunStatus { .. } => ErrorKind::InvalidState,
            NonExistentRun(..) | NonExistentUser(..) => ErrorKind::NotFound,
            AlreadySubscribed { .. } => ErrorKind::Conflict,
            NotAnAthlete(..) | NotACoach(..) | NotSubscribed { .. } => ErrorKind::Permission,
            Sqlx { .. } | UnknownRunStatus(..) => ErrorKind::Internal,
        }
    }
}
