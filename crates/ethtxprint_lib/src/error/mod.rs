mod bag;
mod custom;
mod wrapped;

pub use bag::ErrorBag;
pub use custom::{CustomError, TimeoutError};
pub use wrapped::TxInfoError;

/// Export macros for creating errors
mod macros;
