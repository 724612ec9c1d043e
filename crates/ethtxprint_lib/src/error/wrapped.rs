use crate::error::ErrorBag;
use std::fmt::{Debug, Display, Formatter};

/// Error returned by every fallible operation of the library.
///
/// Keeps the place where it was created, which is printed only in debug form.
pub struct TxInfoError {
    pub inner: ErrorBag,
    pub file: &'static str,
    pub line: u32,
}

impl TxInfoError {
    pub fn new(inner: ErrorBag, file: &'static str, line: u32) -> Self {
        Self { inner, file, line }
    }
}

impl Display for TxInfoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Debug for TxInfoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} at {}:{}", self.inner, self.file, self.line)
    }
}

impl std::error::Error for TxInfoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner)
    }
}
