//! Tagged results returned to the HTTP boundary.
//!
//! Business and validation failures are values, not errors: every lookup or
//! upsert ends in an [`Outcome`], serialized as
//!
//! ```json
//! { "ok": true,  "data": { ... } }
//! { "ok": false, "error": { "code": "NOT_FOUND", "message": "..." } }
//! ```

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Closed set of failure codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Lookup query missing or malformed
    InvalidQuery,
    /// Upsert payload missing required fields or malformed
    InvalidInput,
    /// Referenced id does not exist, or nothing matched
    NotFound,
    /// A lookup strategy matched more than one client
    Ambiguous,
    /// The write would violate CPF uniqueness
    Conflict,
    /// Unexpected infrastructure failure
    Unknown,
}

impl ErrorCode {
    /// Wire label of the code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidQuery => "INVALID_QUERY",
            Self::InvalidInput => "INVALID_INPUT",
            Self::NotFound => "NOT_FOUND",
            Self::Ambiguous => "AMBIGUOUS",
            Self::Conflict => "CONFLICT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure carried inside an [`Outcome`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Machine-readable code
    pub code: ErrorCode,
    /// Human-readable explanation
    pub message: String,
}

impl Failure {
    /// Build a failure from a code and message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// `INVALID_QUERY`
    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidQuery, message)
    }

    /// `INVALID_INPUT`
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// `NOT_FOUND`
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// `AMBIGUOUS`
    #[must_use]
    pub fn ambiguous(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Ambiguous, message)
    }

    /// `CONFLICT`
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// `UNKNOWN`
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unknown, message)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Result of a lookup or upsert: either data or a [`Failure`], never both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation succeeded
    Success(T),
    /// The operation was refused
    Failure(Failure),
}

impl<T> Outcome<T> {
    /// `true` for [`Outcome::Success`].
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The failure code, if any.
    #[must_use]
    pub const fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.code),
        }
    }

    /// Borrow the data, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure(_) => None,
        }
    }

    /// Convert into a plain `Result`.
    ///
    /// # Errors
    ///
    /// Returns the carried [`Failure`] for [`Outcome::Failure`].
    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Failure(failure) => Err(failure),
        }
    }
}

impl<T> From<Failure> for Outcome<T> {
    fn from(failure: Failure) -> Self {
        Self::Failure(failure)
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut body = serializer.serialize_struct("Outcome", 2)?;
        match self {
            Self::Success(data) => {
                body.serialize_field("ok", &true)?;
                body.serialize_field("data", data)?;
            },
            Self::Failure(failure) => {
                body.serialize_field("ok", &false)?;
                body.serialize_field("error", failure)?;
            },
        }
        body.end()
    }
}
