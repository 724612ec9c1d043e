pub mod config;
pub mod error;
pub mod eth;
pub mod model;
pub mod process;
pub mod report;
pub mod runtime;
pub mod setup;
pub mod source;
pub mod utils;

#[cfg(test)]
mod mock;
