pub use crate::context::{Context, ContextKey, create_context, ensure_injection, inject, provide};
pub use crate::defer::{Deferred, Promise, defer};
pub use crate::effects::{Dispose, effect};
pub use crate::error::{InjectionError, PromiseError};
pub use crate::maybe::MaybeSignal;
pub use crate::scheduler::{flush, has_pending_jobs, watch};
pub use crate::scope::{Scope, current_scope};
pub use crate::signal::{ReadSignal, Signal, signal};
