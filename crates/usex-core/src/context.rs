//! # Context injection
//!
//! A keyed value registry that lets nested code read a value provided by an
//! enclosing caller without threading it through every function.
//!
//! Values live in thread-local frames. `provide` pushes a frame for the
//! duration of a closure; `provide_app` installs an app-wide value that every
//! lookup falls back to:
//!
//! ```rust
//! use usex_core::*;
//!
//! let user = Context::<String>::named("user");
//!
//! user.provide("ada".to_string(), || {
//!     assert_eq!(user.inject().as_deref(), Some("ada"));
//! });
//! assert!(user.inject().is_none());
//! assert!(user.ensure_injection("no user").is_err());
//! ```

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::InjectionError;

thread_local! {
    static LOCALS_STACK: RefCell<Vec<HashMap<ContextKey, Rc<dyn Any>>>> = RefCell::new(Vec::new());
    static APP_LOCALS: RefCell<HashMap<ContextKey, Rc<dyn Any>>> = RefCell::new(HashMap::new());
    static NEXT_KEY: Cell<u64> = const { Cell::new(1) };
}

/// Identity of a context slot. Every key minted by [`ContextKey::new`] is
/// unique; the optional name only shows up in messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextKey {
    id: u64,
    name: Option<&'static str>,
}

impl ContextKey {
    pub fn new() -> Self {
        Self::mint(None)
    }

    pub fn named(name: &'static str) -> Self {
        Self::mint(Some(name))
    }

    fn mint(name: Option<&'static str>) -> Self {
        let id = NEXT_KEY.with(|n| {
            let id = n.get();
            n.set(id + 1);
            id
        });
        Self { id, name }
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }
}

impl Default for ContextKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContextKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name {
            Some(name) => write!(f, "context `{name}` (#{})", self.id),
            None => write!(f, "context #{}", self.id),
        }
    }
}

fn with_locals_frame<R>(f: impl FnOnce() -> R) -> R {
    // Non-panicking frame guard (ensures pop on unwind)
    struct Guard;
    impl Drop for Guard {
        fn drop(&mut self) {
            LOCALS_STACK.with(|st| {
                st.borrow_mut().pop();
            });
        }
    }
    LOCALS_STACK.with(|st| st.borrow_mut().push(HashMap::new()));
    let _guard = Guard;
    f()
}

fn set_local(key: ContextKey, v: Rc<dyn Any>) {
    LOCALS_STACK.with(|st| {
        if let Some(top) = st.borrow_mut().last_mut() {
            top.insert(key, v);
        }
    });
}

fn lookup(key: ContextKey) -> Option<Rc<dyn Any>> {
    let local = LOCALS_STACK.with(|st| {
        st.borrow()
            .iter()
            .rev()
            .find_map(|frame| frame.get(&key).cloned())
    });
    local.or_else(|| APP_LOCALS.with(|app| app.borrow().get(&key).cloned()))
}

/// Run `f` with `value` visible to [`inject`] under `key`.
pub fn provide<T: 'static, R>(key: ContextKey, value: T, f: impl FnOnce() -> R) -> R {
    with_locals_frame(|| {
        set_local(key, Rc::new(value));
        f()
    })
}

/// Install `value` under `key` for the whole app (this thread). Frames pushed
/// by [`provide`] still shadow it.
pub fn provide_app<T: 'static>(key: ContextKey, value: T) {
    let replaced = APP_LOCALS.with(|app| app.borrow_mut().insert(key, Rc::new(value)));
    if replaced.is_some() {
        log::debug!("provide_app: replaced existing value for {key}");
    }
}

pub fn try_inject<T: Clone + 'static>(key: ContextKey) -> Result<Option<T>, InjectionError> {
    match lookup(key) {
        None => Ok(None),
        Some(v) => v
            .downcast_ref::<T>()
            .cloned()
            .map(Some)
            .ok_or(InjectionError::TypeMismatch { key }),
    }
}

/// The nearest value provided under `key`, or `None`. A value of another type
/// is treated as absent.
pub fn inject<T: Clone + 'static>(key: ContextKey) -> Option<T> {
    try_inject(key).unwrap_or_else(|e| {
        log::warn!("inject: {e}");
        None
    })
}

/// Like [`inject`], but a missing value is an error carrying `message`.
pub fn ensure_injection<T: Clone + 'static>(
    key: ContextKey,
    message: impl Into<String>,
) -> Result<T, InjectionError> {
    try_inject(key)?.ok_or_else(|| InjectionError::Missing {
        key,
        message: message.into(),
    })
}

/// Typed handle over a [`ContextKey`].
pub struct Context<T> {
    key: ContextKey,
    _ty: PhantomData<fn() -> T>,
}

impl<T> Clone for Context<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Context<T> {}

impl<T: Clone + 'static> Context<T> {
    pub fn new() -> Self {
        Self::with_key(ContextKey::new())
    }

    pub fn named(name: &'static str) -> Self {
        Self::with_key(ContextKey::named(name))
    }

    pub fn with_key(key: ContextKey) -> Self {
        Self {
            key,
            _ty: PhantomData,
        }
    }

    pub fn key(&self) -> ContextKey {
        self.key
    }

    pub fn provide<R>(&self, value: T, f: impl FnOnce() -> R) -> R {
        provide(self.key, value, f)
    }

    pub fn provide_app(&self, value: T) {
        provide_app(self.key, value)
    }

    pub fn inject(&self) -> Option<T> {
        inject(self.key)
    }

    pub fn inject_or(&self, default: T) -> T {
        self.inject().unwrap_or(default)
    }

    pub fn ensure_injection(&self, message: impl Into<String>) -> Result<T, InjectionError> {
        ensure_injection(self.key, message)
    }
}

impl<T: Clone + 'static> Default for Context<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub fn create_context<T: Clone + 'static>() -> Context<T> {
    Context::new()
}
