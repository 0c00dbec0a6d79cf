//! Per-item outcome of a batch call

use crate::service_error::ServiceError;

/// Outcome of one item of a batch.
///
/// Exactly one of data or error is present. [`BatchResult::data`] fails loudly
/// on a failure; use [`BatchResult::data_or_none`] to opt into a silent `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchResult<T> {
    /// The item completed and produced data.
    Success(T),
    /// The item failed; other items of the batch are unaffected.
    Failure(ServiceError),
}

impl<T> BatchResult<T> {
    /// Creates a successful result.
    pub const fn success(data: T) -> Self {
        Self::Success(data)
    }

    /// Creates a failed result.
    pub const fn failure(error: ServiceError) -> Self {
        Self::Failure(error)
    }

    /// Returns true if the item succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true if the item failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns the data, or the captured error when the item failed.
    ///
    /// # Errors
    ///
    /// Returns a clone of the captured [`ServiceError`] on a failure.
    pub fn data(&self) -> Result<&T, ServiceError> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Failure(error) => Err(error.clone()),
        }
    }

    /// Returns the data, or `None` on a failure.
    #[must_use]
    pub const fn data_or_none(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure(_) => None,
        }
    }

    /// Returns the captured error, or `None` on a success.
    #[must_use]
    pub const fn error(&self) -> Option<&ServiceError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }

    /// Converts into a standard `Result`.
    ///
    /// # Errors
    ///
    /// Returns the captured [`ServiceError`] on a failure.
    pub fn into_result(self) -> Result<T, ServiceError> {
        self.into()
    }

    /// Maps the success value, leaving a failure untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> BatchResult<U> {
        match self {
            Self::Success(data) => BatchResult::Success(f(data)),
            Self::Failure(error) => BatchResult::Failure(error),
        }
    }
}

impl<T> From<Result<T, ServiceError>> for BatchResult<T> {
    fn from(result: Result<T, ServiceError>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(error) => Self::Failure(error),
        }
    }
}

impl<T> From<BatchResult<T>> for Result<T, ServiceError> {
    fn from(result: BatchResult<T>) -> Self {
        match result {
            BatchResult::Success(data) => Ok(data),
            BatchResult::Failure(error) => Err(error),
        }
    }
}
