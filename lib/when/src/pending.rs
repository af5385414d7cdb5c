use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, Waker};

use futures_channel::oneshot;
use futures_util::future::{self, LocalBoxFuture};
use futures_util::task::{self as task_util, ArcWake};
use futures_util::FutureExt;
use send_wrapper::SendWrapper;

use crate::thenable::Thenable;

/// A value or failure that is not known yet and settles exactly once.
///
/// `Pending` is a cheap, cloneable handle: every clone observes the same
/// outcome, no matter whether it was attached before or after settlement.
/// Handles are woken in the order they first started waiting, and a handle
/// that is dropped while waiting gives up its place without disturbing the
/// order of the others.
///
/// Handles are meant to stay on the thread that created them. They are
/// `Send + Sync` so they fit into APIs that demand it, but touching one from
/// another thread panics.
pub struct Pending<T, E>(SendWrapper<Handle<T, E>>);

struct Handle<T, E> {
    shared: Rc<Shared<T, E>>,
    // Assigned on the first poll, kept until the handle is dropped.
    key: Option<u64>,
}

struct Shared<T, E> {
    slot: RefCell<Slot<T, E>>,
    waiters: Arc<Waiters>,
}

enum Slot<T, E> {
    Running(LocalBoxFuture<'static, Result<T, E>>),
    Polling,
    Settled(Result<T, E>),
}

/// Wakers of the handles waiting on one result, keyed by a counter that only
/// goes up so iteration order is attachment order.
#[derive(Default)]
struct Waiters(Mutex<WaiterList>);

#[derive(Default)]
struct WaiterList {
    next_key: u64,
    wakers: BTreeMap<u64, Waker>,
}

impl Waiters {
    fn register(&self, key: &mut Option<u64>, waker: &Waker) {
        let mut list = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        let key = match *key {
            Some(key) => key,
            None => {
                let next = list.next_key;
                list.next_key += 1;
                *key = Some(next);
                next
            },
        };
        let stale = list
            .wakers
            .get(&key)
            .map_or(true, |current| !current.will_wake(waker));
        if stale {
            list.wakers.insert(key, waker.clone());
        }
    }

    fn remove(&self, key: u64) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .wakers
            .remove(&key);
    }

    fn wake_all(&self) {
        let wakers = {
            let mut list = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            mem::take(&mut list.wakers)
        };
        for waker in wakers.into_values() {
            waker.wake();
        }
    }
}

impl ArcWake for Waiters {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.wake_all();
    }
}

impl<T, E> Drop for Handle<T, E> {
    fn drop(&mut self) {
        if let Some(key) = self.key {
            self.shared.waiters.remove(key);
        }
    }
}

/// The settling half of a pending result created with [defer] or
/// [Pending::new].
///
/// Clones share the same slot: whichever clone settles first wins and every
/// later call is ignored. Dropping all clones without settling leaves the
/// pending result pending forever.
pub struct Resolver<T, E>(SendWrapper<Rc<RefCell<Option<oneshot::Sender<Result<T, E>>>>>>);

/// Creates a pending result together with the [Resolver] that settles it.
///
/// ```
/// let (image, resolver) = pixload_when::defer::<&str, ()>();
/// resolver.resolve("image1.png");
/// assert_eq!(futures_executor::block_on(image), Ok("image1.png"));
/// ```
pub fn defer<T, E>() -> (Pending<T, E>, Resolver<T, E>)
where
    T: Clone + 'static,
    E: Clone + 'static, {
    let (tx, rx) = oneshot::channel();
    let pending = Pending::from_future(async move {
        match rx.await {
            Ok(result) => result,
            Err(oneshot::Canceled) => future::pending().await,
        }
    });
    let resolver = Resolver(SendWrapper::new(Rc::new(RefCell::new(Some(tx)))));
    (pending, resolver)
}

/// An already fulfilled pending result.
pub fn resolve<T, E>(value: T) -> Pending<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static, {
    Pending::with_slot(Slot::Settled(Ok(value)))
}

/// An already rejected pending result.
pub fn reject<T, E>(error: E) -> Pending<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static, {
    Pending::with_slot(Slot::Settled(Err(error)))
}

impl<T, E> Pending<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Runs `executor` right away with the resolver of a fresh pending
    /// result, in the manner of `new Promise((resolve, reject) => ...)`.
    pub fn new<F>(executor: F) -> Self
    where
        F: FnOnce(Resolver<T, E>), {
        let (pending, resolver) = defer();
        executor(resolver);
        pending
    }

    /// Wraps a future. Nothing runs until a handle is polled; from then on
    /// the future is driven by whichever handle is polled and its output is
    /// shared by all of them.
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + 'static, {
        Self::with_slot(Slot::Running(future.boxed_local()))
    }

    fn with_slot(slot: Slot<T, E>) -> Self {
        Self(SendWrapper::new(Handle {
            shared: Rc::new(Shared {
                slot: RefCell::new(slot),
                waiters: Arc::default(),
            }),
            key: None,
        }))
    }

    /// Chains `on_fulfilled` to run with the fulfilled value. Rejections
    /// pass through untouched.
    pub fn then<U, R, F>(self, on_fulfilled: F) -> Pending<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> R + 'static,
        R: Thenable<Output = U, Error = E>, {
        Pending::from_future(async move {
            let value = self.await?;
            on_fulfilled(value).into_pending().await
        })
    }

    /// Attaches only a rejection handler. The handler either recovers by
    /// producing a value or re-raises by producing an error.
    pub fn otherwise<E2, R, F>(self, on_rejected: F) -> Pending<T, E2>
    where
        E2: Clone + 'static,
        F: FnOnce(E) -> R + 'static,
        R: Thenable<Output = T, Error = E2>, {
        Pending::from_future(async move {
            match self.await {
                Ok(value) => Ok(value),
                Err(error) => on_rejected(error).into_pending().await,
            }
        })
    }

    /// The outcome, once known. A deferred or chained result only learns it
    /// when a handle is polled.
    pub fn peek(&self) -> Option<Result<T, E>> {
        match &*self.0.shared.slot.borrow() {
            Slot::Settled(result) => Some(result.clone()),
            Slot::Running(_) | Slot::Polling => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(&*self.0.shared.slot.borrow(), Slot::Settled(_))
    }
}

impl<T, E> Future for Pending<T, E>
where
    T: Clone,
    E: Clone,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let handle = &mut *self.get_mut().0;
        let shared = Rc::clone(&handle.shared);

        let mut running = {
            let mut slot = shared.slot.borrow_mut();
            if let Slot::Settled(result) = &*slot {
                return Poll::Ready(result.clone());
            }
            shared.waiters.register(&mut handle.key, cx.waker());
            match mem::replace(&mut *slot, Slot::Polling) {
                Slot::Running(running) => running,
                // Another handle is driving the future further up the stack.
                other => {
                    *slot = other;
                    return Poll::Pending;
                },
            }
        };

        // The driven future wakes every waiter, so progress never depends on
        // the handle that happened to poll it last.
        let waker = task_util::waker(Arc::clone(&shared.waiters));
        match running.poll_unpin(&mut Context::from_waker(&waker)) {
            Poll::Ready(result) => {
                *shared.slot.borrow_mut() = Slot::Settled(result.clone());
                if let Some(key) = handle.key {
                    shared.waiters.remove(key);
                }
                shared.waiters.wake_all();
                Poll::Ready(result)
            },
            Poll::Pending => {
                *shared.slot.borrow_mut() = Slot::Running(running);
                Poll::Pending
            },
        }
    }
}

impl<T, E> Clone for Pending<T, E> {
    fn clone(&self) -> Self {
        Self(SendWrapper::new(Handle {
            shared: Rc::clone(&self.0.shared),
            key: None,
        }))
    }
}

impl<T, E> fmt::Debug for Pending<T, E>
where
    T: fmt::Debug,
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0.shared.slot.borrow() {
            Slot::Settled(Ok(value)) => f.debug_tuple("Fulfilled").field(value).finish(),
            Slot::Settled(Err(error)) => f.debug_tuple("Rejected").field(error).finish(),
            Slot::Running(_) | Slot::Polling => f.write_str("Pending"),
        }
    }
}

impl<T, E> Resolver<T, E> {
    /// Fulfils the pending result. Returns false if it was already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Rejects the pending result. Returns false if it was already settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    pub fn is_settled(&self) -> bool {
        self.0.borrow().is_none()
    }

    fn settle(&self, result: Result<T, E>) -> bool {
        let Some(sender) = self.0.borrow_mut().take() else {
            return false;
        };
        // Nobody holding the pending side is not an error.
        let _ = sender.send(result);
        true
    }
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self(SendWrapper::new(Rc::clone(&self.0)))
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("settled", &self.is_settled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use futures_executor::{block_on, LocalPool};
    use futures_util::task::{noop_waker_ref, LocalSpawnExt};
    use futures_util::FutureExt;
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Pending<u32, String>: Send, Sync, Unpin, Clone);
    assert_impl_all!(Resolver<u32, String>: Send, Sync, Clone);

    #[test]
    fn settles_only_once() {
        let (pending, resolver) = defer::<u32, String>();
        assert!(resolver.resolve(1));
        assert!(!resolver.resolve(2));
        assert!(!resolver.reject("late".to_string()));
        assert!(resolver.is_settled());

        assert_eq!(block_on(pending.clone()), Ok(1));
        assert_eq!(block_on(pending), Ok(1));
    }

    #[test]
    fn cloned_resolvers_share_the_slot() {
        let (pending, resolver) = defer::<u32, String>();
        let other = resolver.clone();
        assert!(other.reject("first".to_string()));
        assert!(!resolver.resolve(7));

        assert_eq!(block_on(pending), Err("first".to_string()));
    }

    #[test]
    fn handlers_attached_after_settlement_see_the_same_value() {
        let pending = resolve::<_, ()>(vec![1, 2, 3]);
        assert_eq!(block_on(pending.clone()), Ok(vec![1, 2, 3]));
        assert!(pending.is_settled());

        let sum = pending.clone().then(|v| Ok(v.iter().sum::<i32>()));
        let len = pending.clone().then(|v| Ok(v.len()));
        assert_eq!(block_on(sum), Ok(6));
        assert_eq!(block_on(len), Ok(3));
        assert_eq!(block_on(pending), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn waiters_run_in_attachment_order() {
        let (pending, resolver) = defer::<&'static str, ()>();
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        for id in 0..4 {
            let pending = pending.clone();
            let order = Rc::clone(&order);
            spawner
                .spawn_local(async move {
                    let value = pending.await.unwrap();
                    order.borrow_mut().push((id, value));
                })
                .unwrap();
        }

        pool.run_until_stalled();
        assert!(order.borrow().is_empty());

        resolver.resolve("done");
        pool.run_until_stalled();
        assert_eq!(
            *order.borrow(),
            vec![(0, "done"), (1, "done"), (2, "done"), (3, "done")]
        );
    }

    #[test]
    fn dropped_waiter_does_not_reorder_the_rest() {
        let (pending, resolver) = defer::<u32, ()>();
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        let spawn = |name: &'static str| {
            let pending = pending.clone();
            let order = Rc::clone(&order);
            spawner
                .spawn_local(async move {
                    pending.await.unwrap();
                    order.borrow_mut().push(name);
                })
                .unwrap();
        };

        let mut abandoned = pending.clone();
        let mut cx = Context::from_waker(noop_waker_ref());
        assert!(abandoned.poll_unpin(&mut cx).is_pending());
        spawn("B");
        spawn("C");
        pool.run_until_stalled();

        drop(abandoned);
        spawn("D");
        pool.run_until_stalled();
        assert!(order.borrow().is_empty());

        resolver.resolve(1);
        pool.run_until_stalled();
        assert_eq!(*order.borrow(), vec!["B", "C", "D"]);
    }

    #[test]
    fn settled_results_are_visible_without_polling() {
        assert_eq!(resolve::<u32, ()>(2).peek(), Some(Ok(2)));
        assert_eq!(reject::<u32, &str>("E").peek(), Some(Err("E")));

        let (pending, resolver) = defer::<u32, ()>();
        resolver.resolve(3);
        assert_eq!(pending.peek(), None);
        assert_eq!(block_on(pending.clone()), Ok(3));
        assert_eq!(pending.peek(), Some(Ok(3)));
    }

    #[test]
    fn continuations_do_not_run_before_settlement() {
        let (pending, resolver) = defer::<u32, ()>();
        let ran = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&ran);
        let mut chained = pending.then(move |v| {
            *flag.borrow_mut() = true;
            Ok(v + 1)
        });

        let mut cx = Context::from_waker(noop_waker_ref());
        assert!(chained.poll_unpin(&mut cx).is_pending());
        assert!(!*ran.borrow());

        resolver.resolve(41);
        assert!(!*ran.borrow());
        assert_eq!(chained.poll_unpin(&mut cx), Poll::Ready(Ok(42)));
        assert!(*ran.borrow());
    }

    #[test]
    fn dropped_resolver_leaves_result_pending() {
        let (mut pending, resolver) = defer::<u32, ()>();
        drop(resolver);

        let mut cx = Context::from_waker(noop_waker_ref());
        assert!(pending.poll_unpin(&mut cx).is_pending());
        assert!(!pending.is_settled());
    }

    #[test]
    fn new_runs_executor_eagerly() {
        let pending = Pending::<u32, ()>::new(|resolver| {
            resolver.resolve(5);
        });
        assert_eq!(block_on(pending), Ok(5));
    }

    #[test]
    fn then_chains_and_skips_on_rejection() {
        let doubled = resolve::<u32, String>(21).then(|v| Ok(v * 2));
        assert_eq!(block_on(doubled), Ok(42));

        let skipped = reject::<u32, String>("E".to_string()).then(|_| -> Result<u32, String> {
            panic!("fulfilment handler must not run")
        });
        assert_eq!(block_on(skipped), Err("E".to_string()));
    }

    #[test]
    fn then_waits_for_returned_pending() {
        let (inner, resolver) = defer::<u32, ()>();
        let chained = resolve::<u32, ()>(1).then(move |_| inner);
        resolver.resolve(9);
        assert_eq!(block_on(chained), Ok(9));
    }

    #[test]
    fn otherwise_recovers_or_reraises() {
        let recovered = reject::<u32, &str>("E").otherwise(|_| Ok::<_, ()>(0));
        assert_eq!(block_on(recovered), Ok(0));

        let reraised = reject::<u32, &str>("E").otherwise(|e| Err::<u32, _>(format!("wrapped {e}")));
        assert_eq!(block_on(reraised), Err("wrapped E".to_string()));

        let untouched = resolve::<u32, &str>(3).otherwise(|_| Ok::<_, ()>(0));
        assert_eq!(block_on(untouched), Ok(3));
    }

    #[test]
    fn debug_shows_settlement_state() {
        let (pending, resolver) = defer::<u32, ()>();
        assert_eq!(format!("{:?}", pending), "Pending");
        resolver.resolve(3);
        block_on(pending.clone()).unwrap();
        assert_eq!(format!("{:?}", pending), "Fulfilled(3)");
    }
}
