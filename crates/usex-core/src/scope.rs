use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

thread_local! {
    static CURRENT_SCOPE: RefCell<Option<Weak<ScopeInner>>> = const { RefCell::new(None) };
}

type Disposers = SmallVec<[Box<dyn FnOnce()>; 4]>;

/// Effect scope: owns cleanups registered while it is current and runs them
/// when disposed (explicitly, or when the last handle is dropped).
pub struct Scope {
    inner: Rc<ScopeInner>,
}

struct ScopeInner {
    disposers: RefCell<Disposers>,
    children: RefCell<Vec<Scope>>,
    parent: RefCell<Option<Weak<ScopeInner>>>,
    disposed: Cell<bool>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                disposers: RefCell::new(SmallVec::new()),
                children: RefCell::new(Vec::new()),
                parent: RefCell::new(None),
                disposed: Cell::new(false),
            }),
        }
    }

    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        // Restores the previous scope even if `f` unwinds.
        struct Restore(Option<Weak<ScopeInner>>);
        impl Drop for Restore {
            fn drop(&mut self) {
                let prev = self.0.take();
                CURRENT_SCOPE.with(|current| *current.borrow_mut() = prev);
            }
        }

        let prev = CURRENT_SCOPE.with(|current| {
            current
                .borrow_mut()
                .replace(Rc::downgrade(&self.inner))
        });
        let _restore = Restore(prev);
        f()
    }

    pub fn add_disposer(&self, disposer: impl FnOnce() + 'static) {
        if self.inner.disposed.get() {
            log::warn!("Scope::add_disposer on a disposed scope; running cleanup now");
            disposer();
            return;
        }
        self.inner.disposers.borrow_mut().push(Box::new(disposer));
    }

    pub fn child(&self) -> Scope {
        let child = Scope::new();
        *child.inner.parent.borrow_mut() = Some(Rc::downgrade(&self.inner));
        self.inner.children.borrow_mut().push(child.clone());
        child
    }

    /// Live children. A child leaves this list once it is disposed.
    pub fn child_count(&self) -> usize {
        self.inner.children.borrow().len()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    pub fn dispose(self) {
        self.inner.dispose();
    }
}

impl ScopeInner {
    fn dispose(&self) {
        self.disposed.set(true);

        // Detach so a long-lived parent does not keep disposed children around.
        let parent = self.parent.borrow_mut().take();
        if let Some(parent) = parent.and_then(|p| p.upgrade()) {
            parent
                .children
                .borrow_mut()
                .retain(|c| !std::ptr::eq(Rc::as_ptr(&c.inner), self));
        }

        // Dispose children first
        let children = std::mem::take(&mut *self.children.borrow_mut());
        for child in children {
            child.dispose();
        }

        let disposers = std::mem::take(&mut *self.disposers.borrow_mut());
        for disposer in disposers {
            disposer();
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Scope {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub fn current_scope() -> Option<Scope> {
    CURRENT_SCOPE.with(|current| {
        current
            .borrow()
            .as_ref()
            .and_then(|weak| weak.upgrade().map(|inner| Scope { inner }))
    })
}

/// A child of the current scope, or a detached scope if none is current.
pub fn child_of_current() -> Scope {
    current_scope().map(|s| s.child()).unwrap_or_default()
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        if !self.disposed.get() {
            self.dispose();
        }
    }
}
