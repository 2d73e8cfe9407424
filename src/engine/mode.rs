//! Failure bookkeeping for the two traversal modes.
//!
//! The descent itself is shared; a mode only decides what a failure costs.
//! [`Diagnose`] builds a message and a path, [`Check`] builds nothing.
use crate::error::{PathSegment, ValidationError};

pub(crate) trait Mode {
    type Error;

    fn fail(message: impl FnOnce() -> String) -> Self::Error;

    /// Re-raise a child failure one level up.
    fn nest(err: Self::Error, segment: impl FnOnce() -> PathSegment) -> Self::Error;

    fn reword(err: Self::Error, f: impl FnOnce(String) -> String) -> Self::Error;

    /// Every alternative of a union failed.
    fn exhausted(errors: Vec<Self::Error>) -> Self::Error;
}

// ------------------------------ Diagnose --------------------------------- //

pub(crate) struct Diagnose;

/// Path is collected innermost first and flipped once at the boundary.
#[derive(Debug)]
pub(crate) struct Failure {
    message: String,
    rev_path: Vec<PathSegment>,
}

impl Failure {
    pub(crate) fn into_error(self) -> ValidationError {
        let mut path = self.rev_path;
        path.reverse();
        ValidationError::new(self.message, path)
    }
}

impl Mode for Diagnose {
    type Error = Failure;

    fn fail(message: impl FnOnce() -> String) -> Failure {
        Failure { message: message(), rev_path: Vec::new() }
    }

    fn nest(mut err: Failure, segment: impl FnOnce() -> PathSegment) -> Failure {
        err.rev_path.push(segment());
        err
    }

    fn reword(mut err: Failure, f: impl FnOnce(String) -> String) -> Failure {
        err.message = f(err.message);
        err
    }

    fn exhausted(errors: Vec<Failure>) -> Failure {
        if errors.is_empty() {
            return Self::fail(|| "empty union does not accept any value".to_string());
        }
        let issues = errors
            .iter()
            .enumerate()
            .map(|(i, e)| format!("({}) {}", i + 1, e.message))
            .collect::<Vec<_>>()
            .join(" ");
        Self::fail(|| format!("must resolve any one of the following issues: {issues}"))
    }
}

// -------------------------------- Check ---------------------------------- //

pub(crate) struct Check;

/// Acceptance only. Closures passed to [`Mode`] are never called.
#[derive(Debug)]
pub(crate) struct Rejected;

impl Mode for Check {
    type Error = Rejected;

    fn fail(_: impl FnOnce() -> String) -> Rejected {
        Rejected
    }

    fn nest(err: Rejected, _: impl FnOnce() -> PathSegment) -> Rejected {
        err
    }

    fn reword(err: Rejected, _: impl FnOnce(String) -> String) -> Rejected {
        err
    }

    fn exhausted(_: Vec<Rejected>) -> Rejected {
        Rejected
    }
}

// ------------------------------- Tests ------------------------------------ //
