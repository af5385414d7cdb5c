//! Operations composing several pending results into one.
//!
//! This is the complete set the rest of the workspace relies on. Inputs are
//! anything [Thenable]. Like every [Pending], a combined result is lazy: no
//! input is driven and no handler (a `map` mapper, a `reduce` reducer) runs
//! until the combined result is polled. From then on all inputs are driven
//! concurrently. Inputs created by a backend that starts its work eagerly,
//! such as an image request, are running regardless.

use std::cell::RefCell;
use std::rc::Rc;

use futures_util::future;
use futures_util::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;

use crate::pending::{self, Pending};
use crate::thenable::Thenable;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CombinatorError<E> {
    #[error("expected at least {needed} pending results but got {available}")]
    NotEnoughInputs { needed: usize, available: usize },

    #[error("{} pending results were rejected", .0.len())]
    Aggregate(Vec<E>),
}

impl<E> CombinatorError<E> {
    /// The collected rejections, empty for [CombinatorError::NotEnoughInputs].
    pub fn errors(&self) -> &[E] {
        match self {
            CombinatorError::Aggregate(errors) => errors,
            CombinatorError::NotEnoughInputs { .. } => &[],
        }
    }
}

/// Waits for every input and fulfils with their values in input order.
/// Rejects as soon as any input rejects.
pub fn all<I, P>(values: I) -> Pending<Vec<P::Output>, P::Error>
where
    I: IntoIterator<Item = P>,
    P: Thenable, {
    let values: Vec<_> = values.into_iter().map(Thenable::into_pending).collect();
    Pending::from_future(future::try_join_all(values))
}

/// Applies `mapper` to each input as soon as it fulfils and waits for all
/// mapped results. The output keeps input order; the first rejection, from
/// an input or from a mapped result, rejects the whole.
pub fn map<I, P, F, R>(values: I, mapper: F) -> Pending<Vec<R::Output>, P::Error>
where
    I: IntoIterator<Item = P>,
    P: Thenable,
    F: FnMut(P::Output) -> R + 'static,
    R: Thenable<Error = P::Error>, {
    let mapper = Rc::new(RefCell::new(mapper));
    let mapped: Vec<_> = values
        .into_iter()
        .map(|value| {
            let value = value.into_pending();
            let mapper = Rc::clone(&mapper);
            async move {
                let value = value.await?;
                let next = (&mut *mapper.borrow_mut())(value).into_pending();
                next.await
            }
        })
        .collect();
    Pending::from_future(future::try_join_all(mapped))
}

/// Folds the inputs in order, one step at a time. Each step waits for the
/// accumulator produced by the previous one.
pub fn reduce<I, P, A, F, R>(values: I, mut reducer: F, initial: A) -> Pending<A::Output, P::Error>
where
    I: IntoIterator<Item = P>,
    P: Thenable,
    A: Thenable<Error = P::Error>,
    F: FnMut(A::Output, P::Output) -> R + 'static,
    R: Thenable<Output = A::Output, Error = P::Error>, {
    let values: Vec<_> = values.into_iter().map(Thenable::into_pending).collect();
    let initial = initial.into_pending();
    Pending::from_future(async move {
        let mut acc = initial.await?;
        for value in values {
            let value = value.await?;
            acc = reducer(acc, value).into_pending().await?;
        }
        Ok(acc)
    })
}

/// Fulfils with the first input to fulfil. Rejects only once every input
/// has rejected.
pub fn any<I, P>(values: I) -> Pending<P::Output, CombinatorError<P::Error>>
where
    I: IntoIterator<Item = P>,
    P: Thenable, {
    some(values, 1).then(|mut first| match first.pop() {
        Some(value) => Ok(value),
        None => Err(CombinatorError::Aggregate(Vec::new())),
    })
}

/// Fulfils with the first `count` values to fulfil, in settlement order.
/// Rejects as soon as so many inputs have rejected that `count` can no
/// longer be reached.
pub fn some<I, P>(values: I, count: usize) -> Pending<Vec<P::Output>, CombinatorError<P::Error>>
where
    I: IntoIterator<Item = P>,
    P: Thenable, {
    let values: Vec<_> = values.into_iter().map(Thenable::into_pending).collect();
    let available = values.len();
    if count > available {
        return pending::reject(CombinatorError::NotEnoughInputs {
            needed: count,
            available,
        });
    }
    if count == 0 {
        return pending::resolve(Vec::new());
    }

    let tolerated = available - count;
    Pending::from_future(async move {
        let mut racing: FuturesUnordered<_> = values.into_iter().collect();
        let mut fulfilled = Vec::with_capacity(count);
        let mut rejected = Vec::new();
        while let Some(outcome) = racing.next().await {
            match outcome {
                Ok(value) => {
                    fulfilled.push(value);
                    if fulfilled.len() == count {
                        return Ok(fulfilled);
                    }
                },
                Err(error) => {
                    rejected.push(error);
                    if rejected.len() > tolerated {
                        return Err(CombinatorError::Aggregate(rejected));
                    }
                },
            }
        }
        Err(CombinatorError::Aggregate(rejected))
    })
}

/// Fixed-arity combination of thenables sharing one error type.
///
/// Implemented for tuples of two to five elements.
pub trait Join {
    type Output: Clone + 'static;
    type Error: Clone + 'static;

    fn join(self) -> Pending<Self::Output, Self::Error>;
}

macro_rules! impl_join {
    ($join:ident; $($ty:ident $var:ident),+) => {
        impl<E, $($ty),+> Join for ($($ty,)+)
        where
            E: Clone + 'static,
            $($ty: Thenable<Error = E>,)+
        {
            type Output = ($($ty::Output,)+);
            type Error = E;

            fn join(self) -> Pending<Self::Output, E> {
                let ($($var,)+) = self;
                Pending::from_future(future::$join($($var.into_pending()),+))
            }
        }
    };
}

impl_join!(try_join; A a, B b);
impl_join!(try_join3; A a, B b, C c);
impl_join!(try_join4; A a, B b, C c, D d);
impl_join!(try_join5; A a, B b, C c, D d, F f);

/// Waits for every element of a tuple; see [Join].
pub fn join<J: Join>(values: J) -> Pending<J::Output, J::Error> {
    values.join()
}

#[cfg(test)]
mod tests {
    use futures_executor::block_on;

    use super::*;
    use crate::pending::{defer, reject, resolve};

    #[test]
    fn all_keeps_input_order() {
        let (a, resolve_a) = defer::<&str, ()>();
        let (b, resolve_b) = defer::<&str, ()>();
        let both = all([a, b]);

        resolve_b.resolve("b.png");
        resolve_a.resolve("a.png");
        assert_eq!(block_on(both), Ok(vec!["a.png", "b.png"]));
    }

    #[test]
    fn all_fails_fast() {
        let (slow, _keep_pending) = defer::<u32, &str>();
        let both = all([slow, reject("E")]);
        assert_eq!(block_on(both), Err("E"));
    }

    #[test]
    fn all_of_nothing_is_empty() {
        let none: Vec<Pending<u32, ()>> = Vec::new();
        assert_eq!(block_on(all(none)), Ok(Vec::new()));
    }

    #[test]
    fn map_preserves_order_and_awaits_mapped_results() {
        let (first, resolve_first) = defer::<u32, String>();
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let mapped = map(vec![first, resolve(2), resolve(3)], move |v| {
            *counter.borrow_mut() += 1;
            resolve::<_, String>(v * 10)
        });

        resolve_first.resolve(1);
        assert_eq!(block_on(mapped), Ok(vec![10, 20, 30]));
        assert_eq!(*calls.borrow(), 3);
    }

    #[test]
    fn combined_results_run_nothing_until_polled() {
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let mapped = map(vec![resolve::<u32, ()>(1), resolve(2)], move |v| {
            *counter.borrow_mut() += 1;
            Ok(v)
        });
        assert_eq!(*calls.borrow(), 0);
        assert!(!mapped.is_settled());

        assert_eq!(block_on(mapped), Ok(vec![1, 2]));
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn map_rejects_on_mapper_failure() {
        let mapped = map(vec![Ok::<u32, String>(1), Ok(2)], |v| {
            if v == 2 {
                Err(format!("bad {v}"))
            } else {
                Ok(v)
            }
        });
        assert_eq!(block_on(mapped), Err("bad 2".to_string()));
    }

    #[test]
    fn reduce_folds_sequentially() {
        let steps = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&steps);
        let folded = reduce(
            vec![resolve::<&str, ()>("a"), resolve("b"), resolve("c")],
            move |acc: String, v| {
                seen.borrow_mut().push(acc.clone());
                Ok(acc + v)
            },
            Ok::<_, ()>(String::new()),
        );

        assert_eq!(block_on(folded), Ok("abc".to_string()));
        assert_eq!(*steps.borrow(), vec!["", "a", "ab"]);
    }

    #[test]
    fn reduce_stops_at_first_rejection() {
        let folded = reduce(
            vec![Ok::<u32, &str>(1), Err("E"), Ok(3)],
            |acc: u32, v| Ok(acc + v),
            Ok(0),
        );
        assert_eq!(block_on(folded), Err("E"));
    }

    #[test]
    fn any_takes_first_fulfilment() {
        let (slow, resolve_slow) = defer::<&str, &str>();
        let first = any([reject("E1"), slow, resolve("fast")]);
        assert_eq!(block_on(first), Ok("fast"));
        assert!(resolve_slow.resolve("late"));
    }

    #[test]
    fn any_rejects_when_all_reject() {
        let first = any([reject::<u32, _>("E1"), reject("E2")]);
        let error = block_on(first).unwrap_err();
        let mut errors = error.errors().to_vec();
        errors.sort();
        assert_eq!(errors, vec!["E1", "E2"]);
    }

    #[test]
    fn any_of_nothing_rejects() {
        let none: Vec<Pending<u32, ()>> = Vec::new();
        assert_eq!(
            block_on(any(none)),
            Err(CombinatorError::NotEnoughInputs {
                needed: 1,
                available: 0
            })
        );
    }

    #[test]
    fn some_collects_in_settlement_order() {
        let (a, resolve_a) = defer::<&str, ()>();
        let (b, resolve_b) = defer::<&str, ()>();
        let (c, _c) = defer::<&str, ()>();
        let two = some([a, b, c], 2);

        resolve_b.resolve("b");
        resolve_a.resolve("a");
        let mut values = block_on(two).unwrap();
        values.sort();
        assert_eq!(values, vec!["a", "b"]);
    }

    #[test]
    fn some_rejects_once_count_is_unreachable() {
        let (pending, _keep_pending) = defer::<u32, &str>();
        let two = some([reject("E1"), reject("E2"), pending], 2);
        let error = block_on(two).unwrap_err();
        assert_eq!(error.errors().len(), 2);
    }

    #[test]
    fn some_needs_enough_inputs() {
        let two = some([resolve::<u32, ()>(1)], 2);
        assert_eq!(
            block_on(two),
            Err(CombinatorError::NotEnoughInputs {
                needed: 2,
                available: 1
            })
        );
        assert_eq!(block_on(some([resolve::<u32, ()>(1)], 0)), Ok(Vec::new()));
    }

    #[test]
    fn join_combines_mixed_types() {
        let joined = join((resolve::<u32, String>(1), Ok("two"), resolve(3.0_f64)));
        assert_eq!(block_on(joined), Ok((1, "two", 3.0)));

        let failed = join((resolve::<u32, &str>(1), reject::<u8, _>("E")));
        assert_eq!(block_on(failed), Err("E"));
    }

    #[test]
    fn combinator_error_messages() {
        let error = CombinatorError::<()>::NotEnoughInputs {
            needed: 2,
            available: 1,
        };
        assert_eq!(
            error.to_string(),
            "expected at least 2 pending results but got 1"
        );
        assert_eq!(
            CombinatorError::Aggregate(vec![(), ()]).to_string(),
            "2 pending results were rejected"
        );
    }
}
