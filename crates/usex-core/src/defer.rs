//! Deferred promises: a future plus the handle that settles it from outside.
//!
//! ```rust
//! use usex_core::defer;
//!
//! let d = defer::<u32>();
//! let p = d.promise();
//! assert!(d.resolve(42));
//! assert!(!d.resolve(7)); // first settlement wins
//! assert_eq!(pollster::block_on(p), Ok(42));
//! ```

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::Shared;

use crate::PromiseError;

type Settled<T> = Result<T, PromiseError>;

/// Cloneable future resolved by its [`Deferred`]. All clones observe the same
/// settlement.
pub struct Promise<T: Clone> {
    inner: Shared<oneshot::Receiver<Settled<T>>>,
}

impl<T: Clone> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone> Promise<T> {
    /// True when both promises were handed out by the same deferred.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl<T: Clone> Future for Promise<T> {
    type Output = Settled<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx).map(|r| match r {
            Ok(settled) => settled,
            Err(oneshot::Canceled) => Err(PromiseError::Abandoned),
        })
    }
}

impl<T: Clone> std::fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Promise").finish_non_exhaustive()
    }
}

/// A [`Promise`] with external `resolve` / `reject`. Clones share the same
/// settlement slot; if every clone is dropped unsettled, the promise resolves
/// to [`PromiseError::Abandoned`].
pub struct Deferred<T: Clone> {
    promise: Promise<T>,
    sender: Rc<RefCell<Option<oneshot::Sender<Settled<T>>>>>,
}

impl<T: Clone> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
            sender: self.sender.clone(),
        }
    }
}

impl<T: Clone> Deferred<T> {
    pub fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            promise: Promise { inner: rx.shared() },
            sender: Rc::new(RefCell::new(Some(tx))),
        }
    }

    pub fn promise(&self) -> Promise<T> {
        self.promise.clone()
    }

    /// Returns false if the promise was already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Returns false if the promise was already settled.
    pub fn reject(&self, reason: impl Into<String>) -> bool {
        self.settle(Err(PromiseError::Rejected(reason.into())))
    }

    pub fn is_settled(&self) -> bool {
        self.sender.borrow().is_none()
    }

    fn settle(&self, outcome: Settled<T>) -> bool {
        let Some(tx) = self.sender.borrow_mut().take() else {
            return false;
        };
        // Nobody listening is fine; the outcome is simply unobserved.
        let _ = tx.send(outcome);
        true
    }
}

impl<T: Clone> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.is_settled())
            .finish()
    }
}

pub fn defer<T: Clone>() -> Deferred<T> {
    Deferred::new()
}
