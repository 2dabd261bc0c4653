//! # Signals, Flushes, and Scopes
//!
//! `usex-core` is the small reactive substrate the usex composables are built
//! on. There are a handful of pieces:
//!
//! - `Signal<T>` — observable, reactive value.
//! - `watch` / `flush` — observers deferred to the next reactive flush.
//! - `Scope` / `Dispose` — cleanups with guaranteed release.
//! - `defer` — a future plus the handle that settles it.
//! - `Context<T>` — keyed value injection.
//!
//! ## Signals
//!
//! `Signal<T>` is a cloneable handle to a piece of state:
//!
//! ```rust
//! use usex_core::*;
//!
//! let count = signal(0);
//! count.set(1);
//! count.update(|v| *v += 1);
//! assert_eq!(count.get(), 2);
//! ```
//!
//! Subscribers registered with `subscribe` run synchronously on every write.
//!
//! ## Watchers and the flush
//!
//! `watch` observes a signal the way a UI runtime does: writes only queue the
//! watcher, and it runs once on the next `flush()` with the latest value.
//!
//! ```rust
//! use std::{cell::Cell, rc::Rc};
//! use usex_core::*;
//!
//! let open = signal(false);
//! let seen = Rc::new(Cell::new(0));
//! let _w = watch(&open, {
//!     let seen = seen.clone();
//!     move |_| seen.set(seen.get() + 1)
//! });
//!
//! open.set(true);
//! open.set(false);
//! assert_eq!(seen.get(), 0);
//! flush();
//! assert_eq!(seen.get(), 1);
//! ```
//!
//! ## Scopes
//!
//! Effects and watchers created while a `Scope` is current (`scope.run(..)`)
//! register their cleanup with it; `scope.dispose()` releases all of them.

pub mod context;
pub mod defer;
pub mod effects;
pub mod error;
pub mod maybe;
pub mod prelude;
pub mod scheduler;
pub mod scope;
pub mod signal;

pub use context::*;
pub use defer::*;
pub use effects::*;
pub use error::*;
pub use maybe::*;
pub use scheduler::*;
pub use scope::*;
pub use signal::*;
