use std::fmt::{Display, Formatter};

#[derive(Debug, Clone)]
pub struct CustomError {
    pub msg: String,
}

impl CustomError {
    pub fn new(msg: &str) -> Self {
        Self {
            msg: msg.to_string(),
        }
    }
}

impl Display for CustomError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.msg)
    }
}

impl std::error::Error for CustomError {}

/// Node did not answer a single request in time.
#[derive(Debug, Clone)]
pub struct TimeoutError {
    pub request: String,
    pub seconds: u64,
}

impl TimeoutError {
    pub fn new(request: &str, seconds: u64) -> Self {
        Self {
            request: request.to_string(),
            seconds,
        }
    }
}

impl Display for TimeoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Request {} timed out after {} seconds",
            self.request, self.seconds
        )
    }
}

impl std::error::Error for TimeoutError {}
