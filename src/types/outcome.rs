//! Two-valued outcome type for settled tasks.
//!
//! The outcome type represents the resolution of one task:
//!
//! - `Fulfilled(T)`: the task produced a value
//! - `Rejected(E)`: the task produced an error
//!
//! Every task settles exactly once; an outcome is always terminal. The
//! all-settle policy returns outcomes directly as data, while the other
//! policies fold them into a single result.

use core::fmt;

/// The resolution of one asynchronous task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E> {
    /// The task produced a value.
    Fulfilled(T),
    /// The task produced an error.
    Rejected(E),
}

impl<T, E> Outcome<T, E> {
    /// Returns true if this outcome is `Fulfilled`.
    #[must_use]
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled(_))
    }

    /// Returns true if this outcome is `Rejected`.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Returns the fulfilled value, discarding a rejection.
    pub fn fulfilled(self) -> Option<T> {
        match self {
            Self::Fulfilled(v) => Some(v),
            Self::Rejected(_) => None,
        }
    }

    /// Returns the rejection error, discarding a fulfilled value.
    pub fn rejected(self) -> Option<E> {
        match self {
            Self::Fulfilled(_) => None,
            Self::Rejected(e) => Some(e),
        }
    }

    /// Converts from `&Outcome<T, E>` to `Outcome<&T, &E>`.
    pub const fn as_ref(&self) -> Outcome<&T, &E> {
        match self {
            Self::Fulfilled(v) => Outcome::Fulfilled(v),
            Self::Rejected(e) => Outcome::Rejected(e),
        }
    }

    /// Maps the fulfilled value using the provided function.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U, E> {
        match self {
            Self::Fulfilled(v) => Outcome::Fulfilled(f(v)),
            Self::Rejected(e) => Outcome::Rejected(e),
        }
    }

    /// Maps the rejection error using the provided function.
    pub fn map_rejected<F2, G: FnOnce(E) -> F2>(self, g: G) -> Outcome<T, F2> {
        match self {
            Self::Fulfilled(v) => Outcome::Fulfilled(v),
            Self::Rejected(e) => Outcome::Rejected(g(e)),
        }
    }

    /// Converts this outcome to a standard `Result`.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Fulfilled(v) => Ok(v),
            Self::Rejected(e) => Err(e),
        }
    }

    /// Returns the fulfilled value or panics.
    ///
    /// # Panics
    ///
    /// Panics if the outcome is `Rejected`.
    #[track_caller]
    pub fn unwrap(self) -> T
    where
        E: fmt::Debug,
    {
        match self {
            Self::Fulfilled(v) => v,
            Self::Rejected(e) => {
                panic!("called `Outcome::unwrap()` on a `Rejected` value: {e:?}")
            }
        }
    }

    /// Returns the fulfilled value or a default.
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Self::Fulfilled(v) => v,
            Self::Rejected(_) => default,
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Self::Fulfilled(v),
            Err(e) => Self::Rejected(e),
        }
    }
}

impl<T: fmt::Display, E: fmt::Display> fmt::Display for Outcome<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fulfilled(v) => write!(f, "fulfilled: {v}"),
            Self::Rejected(e) => write!(f, "rejected: {e}"),
        }
    }
}
