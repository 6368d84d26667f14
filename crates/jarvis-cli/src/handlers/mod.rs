//! Command handlers.
//!
//! Handlers are thin: resolve CLI input, call the session coordinator, format
//! the result for the terminal. They never touch the stores directly.

pub mod config;
pub mod history;
pub mod paths;
pub mod replay;
