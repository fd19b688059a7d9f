//! Error aliases and the classification attached to errors that cross the store boundary.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The broad class of a failure. Nothing in this crate treats any of these as fatal; the class
/// only decides how the failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The request never produced a response.
    Network,
    /// The remote store answered with a non-success status.
    Status,
    /// The remote store answered, but the payload could not be understood.
    Decode,
    /// A required field was missing or invalid; caught before any network call.
    Validation,
    /// No authentication token is available.
    MissingAuth,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// An error tagged with its `ErrorType`. It travels inside an `anyhow::Error`; use `error_type`
/// to recover the tag.
pub struct TypedError {
    error_type: ErrorType,
    inner: Error,
}

impl TypedError {
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Debug for TypedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?}", self.error_type, self.inner)
    }
}

impl Display for TypedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:#}", self.error_type, self.inner)
    }
}

// The inner chain is already rendered by `Display`, so `source` stays `None`.
impl std::error::Error for TypedError {}

/// Attaches an `ErrorType` to the error side of a result.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| tagged(error_type, e))
    }
}

/// Wraps `e` in a `TypedError`.
pub(crate) fn tagged(error_type: ErrorType, e: impl Into<Error>) -> Error {
    Error::new(TypedError {
        error_type,
        inner: e.into(),
    })
}

/// Returns the `ErrorType` of `e`, if it was tagged anywhere in its chain.
pub fn error_type(e: &Error) -> Option<ErrorType> {
    e.chain()
        .find_map(|cause| cause.downcast_ref::<TypedError>())
        .map(TypedError::error_type)
}
