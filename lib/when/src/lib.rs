//! Pending results and the `when` adapter.
//!
//! [Pending] is a single-assignment, cloneable handle to an eventual
//! `Result<T, E>`, settled through a [Resolver] or produced by a future.
//! [when] and [when_with] provide the classic callback-style entry point on
//! top of it, and [combinators] holds the operations that compose several
//! pending results.
//!
//! ```
//! use pixload_when::{combinators, resolve, when};
//!
//! let sizes = combinators::all([resolve::<u32, ()>(64), resolve(128)]);
//! let total = when(sizes).then(|sizes| Ok(sizes.iter().sum::<u32>()));
//! assert_eq!(futures_executor::block_on(total), Ok(192));
//! ```
#![deny(unsafe_code)]

pub mod combinators;
mod js;
mod pending;
mod thenable;

pub use combinators::{all, any, join, map, reduce, some, CombinatorError, Join};
pub use js::is_promise;
pub use pending::{defer, reject, resolve, Pending, Resolver};
pub use thenable::Thenable;

/// Normalises `value` into a [Pending].
///
/// Chain [Pending::then] and [Pending::otherwise] on the result to attach
/// only one of the two handlers.
pub fn when<P: Thenable>(value: P) -> Pending<P::Output, P::Error> {
    value.into_pending()
}

/// Normalises `value` and attaches both handlers.
///
/// `on_rejected` is attached after `on_fulfilled`, so it also sees a failure
/// produced by `on_fulfilled` itself.
pub fn when_with<P, F, R, G, S>(value: P, on_fulfilled: F, on_rejected: G) -> Pending<R::Output, S::Error>
where
    P: Thenable,
    F: FnOnce(P::Output) -> R + 'static,
    R: Thenable<Error = P::Error>,
    G: FnOnce(P::Error) -> S + 'static,
    S: Thenable<Output = R::Output>, {
    when(value).then(on_fulfilled).otherwise(on_rejected)
}

#[cfg(test)]
mod tests {
    use futures_executor::block_on;

    use super::*;

    #[test]
    fn when_wraps_plain_outcomes() {
        assert_eq!(block_on(when(Ok::<_, ()>(3))), Ok(3));
        assert_eq!(block_on(when(Err::<u32, _>("E"))), Err("E"));
        assert_eq!(
            block_on(when(futures_util::future::ready(Ok::<_, ()>("ready")))),
            Ok("ready")
        );
    }

    #[test]
    fn when_passes_pending_through() {
        let (pending, resolver) = defer::<u32, ()>();
        let adapted = when(pending);
        resolver.resolve(8);
        assert_eq!(block_on(adapted), Ok(8));
    }

    #[test]
    fn when_with_runs_fulfilment_handler() {
        let adapted = when_with(
            resolve::<u32, String>(2),
            |v| Ok(v * 3),
            |e: String| Err::<u32, _>(e.len()),
        );
        assert_eq!(block_on(adapted), Ok(6));
    }

    #[test]
    fn when_with_recovers_from_rejection() {
        let adapted = when_with(
            reject::<u32, String>("boom".to_string()),
            |v| Ok(v * 3),
            |e: String| Ok::<_, ()>(e.len() as u32),
        );
        assert_eq!(block_on(adapted), Ok(4));
    }

    #[test]
    fn rejection_handler_sees_fulfilment_handler_failure() {
        let adapted = when_with(
            resolve::<u32, String>(2),
            |_| Err::<u32, _>("from handler".to_string()),
            |e: String| Err::<u32, _>(format!("caught {e}")),
        );
        assert_eq!(block_on(adapted), Err("caught from handler".to_string()));
    }
}
