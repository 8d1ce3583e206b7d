//! Shared helpers
//!
//! Timing, logging setup and panic payload formatting.

pub mod logger;
pub mod timer;

pub use logger::{init_logger, LogLevel};
pub use timer::{Stopwatch, Timer};

use std::any::Any;

/// Extract a readable message from a caught panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
