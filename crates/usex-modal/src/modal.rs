use std::cell::RefCell;
use std::rc::Rc;

use usex_core::{Deferred, Promise, ReadSignal, Scope, Signal, child_of_current, watch};

use crate::ModalData;

pub type OpenCallback<T> = Rc<dyn Fn(&T)>;
pub type CloseCallback<R> = Rc<dyn Fn(Option<&R>)>;

/// Construction options for [`Modal`].
pub struct ModalOptions<T, R> {
    /// Data the modal starts with and returns to on reset.
    pub init_data: T,
    /// Restore `init_data` every time the modal closes.
    pub reset_data_after_close: bool,
    /// Called after the modal becomes visible, with the merged data.
    pub on_open: Option<OpenCallback<T>>,
    /// Called after the modal is hidden, with the return value.
    pub on_close: Option<CloseCallback<R>>,
}

impl<T: Default, R> Default for ModalOptions<T, R> {
    fn default() -> Self {
        Self {
            init_data: T::default(),
            reset_data_after_close: false,
            on_open: None,
            on_close: None,
        }
    }
}

impl<T, R> ModalOptions<T, R> {
    pub fn new(init_data: T) -> Self {
        Self {
            init_data,
            reset_data_after_close: false,
            on_open: None,
            on_close: None,
        }
    }

    pub fn init_data(mut self, init_data: T) -> Self {
        self.init_data = init_data;
        self
    }

    pub fn reset_data_after_close(mut self, reset: bool) -> Self {
        self.reset_data_after_close = reset;
        self
    }

    pub fn on_open(mut self, f: impl Fn(&T) + 'static) -> Self {
        self.on_open = Some(Rc::new(f));
        self
    }

    pub fn on_close(mut self, f: impl Fn(Option<&R>) + 'static) -> Self {
        self.on_close = Some(Rc::new(f));
        self
    }
}

enum Lifecycle<R: Clone> {
    Closed,
    /// The deferred settles the promise handed out by `open()`.
    Open(Deferred<Option<R>>),
}

/// Modal state: visibility, data, and an awaitable result.
///
/// `open()` returns a promise that `close()` resolves with the return value.
/// Visibility can also be driven through [`Modal::set_visible`] (or any write
/// to [`Modal::visible_signal`]); such writes are reconciled on the next
/// [`usex_core::flush`] by the same open/close routine, without a data patch
/// or return value.
///
/// ```rust
/// use std::collections::HashMap;
/// use usex_modal::{Modal, ModalOptions};
///
/// let modal: Modal<HashMap<String, String>, bool> = Modal::new(
///     ModalOptions::default().reset_data_after_close(true),
/// );
///
/// let answer = modal.open_with(HashMap::from([("title".into(), "Delete?".into())]));
/// assert!(modal.visible());
///
/// modal.close_with(true);
/// assert_eq!(pollster::block_on(answer), Ok(Some(true)));
/// assert!(modal.data().is_empty());
/// ```
pub struct Modal<T: ModalData, R: Clone + 'static> {
    inner: Rc<ModalInner<T, R>>,
}

struct ModalInner<T: ModalData, R: Clone + 'static> {
    visible: Signal<bool>,
    data: Signal<T>,
    return_value: Signal<Option<R>>,
    init_data: T,
    reset_data_after_close: bool,
    on_open: Option<OpenCallback<T>>,
    on_close: Option<CloseCallback<R>>,
    lifecycle: RefCell<Lifecycle<R>>,
    scope: Scope,
}

impl<T: ModalData, R: Clone + 'static> Clone for Modal<T, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: ModalData + Default, R: Clone + 'static> Default for Modal<T, R> {
    fn default() -> Self {
        Self::new(ModalOptions::default())
    }
}

impl<T: ModalData, R: Clone + 'static> Modal<T, R> {
    /// The visibility watcher lives in a child of the current scope (or a
    /// detached scope); disposing either one stops `set_visible` from being
    /// reconciled.
    pub fn new(options: ModalOptions<T, R>) -> Self {
        let inner = Rc::new(ModalInner {
            visible: Signal::new(false),
            data: Signal::new(options.init_data.clone()),
            return_value: Signal::new(None),
            init_data: options.init_data,
            reset_data_after_close: options.reset_data_after_close,
            on_open: options.on_open,
            on_close: options.on_close,
            lifecycle: RefCell::new(Lifecycle::Closed),
            scope: child_of_current(),
        });

        let weak = Rc::downgrade(&inner);
        inner.scope.run(|| {
            watch(&inner.visible, move |visible| {
                if let Some(inner) = weak.upgrade() {
                    inner.reconcile(*visible);
                }
            })
        });

        Self { inner }
    }

    /// Show the modal, merging `patch` into the data first. While already
    /// open this is a no-op returning the promise of the current cycle.
    pub fn open(&self, patch: Option<T::Patch>) -> Promise<Option<R>> {
        self.inner.open(patch)
    }

    pub fn open_with(&self, patch: T::Patch) -> Promise<Option<R>> {
        self.inner.open(Some(patch))
    }

    /// Hide the modal and resolve the pending `open()` promise with
    /// `return_value`. While already closed nothing happens and the returned
    /// thenable is a no-op (see [`Thenable::is_noop`]).
    pub fn close(&self, return_value: Option<R>) -> Thenable<R> {
        self.inner.close(return_value)
    }

    pub fn close_with(&self, return_value: R) -> Thenable<R> {
        self.inner.close(Some(return_value))
    }

    pub fn is_open(&self) -> bool {
        matches!(*self.inner.lifecycle.borrow(), Lifecycle::Open(_))
    }

    pub fn visible(&self) -> bool {
        self.inner.visible.get()
    }

    /// Two-way binding entry point. Takes effect on the next flush.
    pub fn set_visible(&self, visible: bool) {
        self.inner.visible.set(visible);
    }

    pub fn visible_signal(&self) -> Signal<bool> {
        self.inner.visible.clone()
    }

    pub fn data(&self) -> T {
        self.inner.data.get()
    }

    pub fn with_data<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        self.inner.data.with(f)
    }

    pub fn data_signal(&self) -> ReadSignal<T> {
        self.inner.data.read_only()
    }

    pub fn init_data(&self) -> &T {
        &self.inner.init_data
    }

    /// Shallow-merge `patch` into the data, open or not.
    pub fn patch_data(&self, patch: T::Patch) {
        self.inner.data.update(|d| d.merge(patch));
    }

    /// Shallow-merge the patch computed from the current data. `f` sees a
    /// snapshot, so it may itself patch or reset the modal.
    pub fn patch_data_with(&self, f: impl FnOnce(&T) -> T::Patch) {
        let current = self.inner.data.get();
        let patch = f(&current);
        self.patch_data(patch);
    }

    pub fn reset_data(&self) {
        self.inner.reset_data();
    }

    /// Value passed to the last effective `close()`.
    pub fn return_value(&self) -> Option<R> {
        self.inner.return_value.get()
    }

    pub fn return_value_signal(&self) -> ReadSignal<Option<R>> {
        self.inner.return_value.read_only()
    }

    /// Stop reconciling `set_visible`. `open()`/`close()` keep working.
    pub fn dispose(&self) {
        self.inner.scope.clone().dispose();
    }
}

impl<T: ModalData, R: Clone + 'static> ModalInner<T, R> {
    fn open(&self, patch: Option<T::Patch>) -> Promise<Option<R>> {
        if let Lifecycle::Open(pending) = &*self.lifecycle.borrow() {
            log::trace!("Modal::open: already open, reusing pending promise");
            return pending.promise();
        }

        // The deferred exists before any callback runs, so re-entrant opens
        // see the same promise.
        let pending = Deferred::new();
        let promise = pending.promise();
        *self.lifecycle.borrow_mut() = Lifecycle::Open(pending);

        if !self.visible.get() {
            self.visible.set(true);
        }
        if let Some(patch) = patch {
            self.data.update(|d| d.merge(patch));
        }
        log::debug!("Modal::open");

        if let Some(on_open) = self.on_open.clone() {
            let data = self.data.get();
            on_open(&data);
        }
        promise
    }

    fn close(&self, return_value: Option<R>) -> Thenable<R> {
        let prev = std::mem::replace(&mut *self.lifecycle.borrow_mut(), Lifecycle::Closed);
        let pending = match prev {
            Lifecycle::Open(pending) => pending,
            Lifecycle::Closed => {
                log::trace!("Modal::close: already closed");
                return Thenable::noop();
            }
        };

        if self.visible.get() {
            self.visible.set(false);
        }
        log::debug!("Modal::close");

        if let Some(on_close) = self.on_close.clone() {
            on_close(return_value.as_ref());
        }
        if self.reset_data_after_close {
            self.reset_data();
        }
        self.return_value.set(return_value.clone());
        pending.resolve(return_value.clone());

        Thenable::closed(return_value)
    }

    fn reset_data(&self) {
        self.data.set(self.init_data.clone());
    }

    /// Watcher path: bring the lifecycle in line with an external write.
    fn reconcile(&self, visible: bool) {
        let open = matches!(*self.lifecycle.borrow(), Lifecycle::Open(_));
        if visible == open {
            return;
        }
        log::trace!("Modal: visible set to {visible} externally");
        if visible {
            // Nobody holds this promise yet; a later `open()` returns it.
            let _ = self.open(None);
        } else {
            self.close(None);
        }
    }
}

impl<T: ModalData, R: Clone + 'static> Drop for ModalInner<T, R> {
    fn drop(&mut self) {
        // Releases the watcher and detaches from the owning scope.
        self.scope.clone().dispose();
    }
}

/// Result of [`Modal::close`]: runs a continuation synchronously with the
/// return value instead of scheduling it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thenable<R> {
    value: Option<R>,
    noop: bool,
}

impl<R> Thenable<R> {
    fn closed(value: Option<R>) -> Self {
        Self { value, noop: false }
    }

    fn noop() -> Self {
        Self {
            value: None,
            noop: true,
        }
    }

    /// Call `f` right away with the return value (`None` for a no-op close).
    pub fn then<U>(self, f: impl FnOnce(Option<R>) -> U) -> U {
        f(self.value)
    }

    /// True when `close()` found the modal already closed.
    pub fn is_noop(&self) -> bool {
        self.noop
    }

    pub fn value(&self) -> Option<&R> {
        self.value.as_ref()
    }
}
