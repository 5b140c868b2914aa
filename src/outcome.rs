//! Tagged result of one unit of concurrent work, plus the reclassification
//! boundary between user code and the iteration machinery.

use crate::error::{StreamError, StreamResult};

/// Outcome of a single task slot: exactly one variant is populated.
///
/// The concurrent engines capture a transformation's result as an `Outcome`
/// instead of letting a failure escape on a worker, so completion order can
/// differ from input order without a failure ever jumping the queue. The
/// raising adapter ([`crate::flux::raise_outcomes`]) is the only place an
/// `Outcome` is unwrapped back into an ordinary element.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(StreamError),
}

impl<T> Outcome<T> {
    pub fn from_result(res: StreamResult<T>) -> Self {
        match res {
            Ok(value) => Outcome::Success(value),
            Err(err) => Outcome::Failure(err),
        }
    }

    pub fn into_result(self) -> StreamResult<T> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(err) => Err(err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

impl<T> From<StreamResult<T>> for Outcome<T> {
    fn from(res: StreamResult<T>) -> Self {
        Outcome::from_result(res)
    }
}

/// Rewrites the exhaustion sentinel into a distinguishable failure.
///
/// Applied wherever the machinery invokes a user callable (`transformation`,
/// `when`, `by`): an [`StreamError::Exhausted`] coming back from user code
/// would otherwise be indistinguishable from natural stream termination.
/// Errors riding through a stage as upstream elements are never passed
/// through this function.
pub fn reclassify(err: StreamError) -> StreamError {
    match err {
        StreamError::Exhausted => StreamError::ReclassifiedExhaustion,
        other => other,
    }
}

/// Invoke a fallible user callable with its error reclassified.
pub(crate) fn guarded<T, U, F>(f: &mut F, value: T) -> StreamResult<U>
where
    F: FnMut(T) -> StreamResult<U>,
{
    f(value).map_err(reclassify)
}
