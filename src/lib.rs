pub mod app;
pub mod cli;
pub mod clipboard;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod resolve;
pub mod signal;
pub mod transfer;

pub use error::{Error, Result};
