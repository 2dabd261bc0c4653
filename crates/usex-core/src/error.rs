use thiserror::Error;

use crate::ContextKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectionError {
    /// Nothing was provided under the key by any enclosing frame or the app.
    #[error("{message}")]
    Missing { key: ContextKey, message: String },
    #[error("value provided under {key} has a different type")]
    TypeMismatch { key: ContextKey },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromiseError {
    #[error("promise rejected: {0}")]
    Rejected(String),
    #[error("promise abandoned before it was settled")]
    Abandoned,
}
