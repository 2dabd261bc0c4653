//! # Modals
//!
//! `usex-modal` manages the state of a modal or dialog: whether it is visible,
//! the data it shows, and the value it was closed with.
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use usex_modal::*;
//!
//! let modal: Modal<BTreeMap<&str, i32>, &str> = Modal::new(
//!     ModalOptions::new(BTreeMap::from([("count", 0)])).on_close(|rv| {
//!         log::info!("closed with {rv:?}");
//!     }),
//! );
//!
//! let result = modal.open(None);
//! modal.patch_data_with(|d| BTreeMap::from([("count", d["count"] + 1)]));
//! modal.close_with("ok").then(|rv| assert_eq!(rv, Some("ok")));
//!
//! assert_eq!(pollster::block_on(result), Ok(Some("ok")));
//! assert_eq!(modal.data()["count"], 1);
//! ```
//!
//! - `open()` is idempotent while open: it hands back the promise of the
//!   current cycle.
//! - `close()` is idempotent while closed: no callback runs and the returned
//!   `Thenable` reports `is_noop()`.
//! - `set_visible()` converges on the same transitions after the next
//!   `usex_core::flush()`.
//!
//! For dialogs driven through a native handle (show/close methods), build the
//! modal with [`create_ref_modal`].

pub mod data;
pub mod modal;
pub mod ref_modal;
pub mod tests;

pub use data::*;
pub use modal::*;
pub use ref_modal::*;
