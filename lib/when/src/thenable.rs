use futures_util::future::Ready;

use crate::pending::{self, Pending};

/// Anything that can be turned into a [Pending] result.
///
/// This is the static counterpart of the "has a callable `then`" check done
/// on JS values: instead of probing for a method at runtime, a type opts in
/// by implementing this trait.
pub trait Thenable {
    type Output: Clone + 'static;
    type Error: Clone + 'static;

    fn into_pending(self) -> Pending<Self::Output, Self::Error>;
}

impl<T, E> Thenable for Pending<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    type Output = T;
    type Error = E;

    #[inline]
    fn into_pending(self) -> Pending<T, E> {
        self
    }
}

/// A settled outcome.
impl<T, E> Thenable for Result<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    type Output = T;
    type Error = E;

    fn into_pending(self) -> Pending<T, E> {
        match self {
            Ok(value) => pending::resolve(value),
            Err(error) => pending::reject(error),
        }
    }
}

impl<T, E> Thenable for Ready<Result<T, E>>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    type Output = T;
    type Error = E;

    fn into_pending(self) -> Pending<T, E> {
        Pending::from_future(self)
    }
}
