//! stream-saver library
//!
//! Core functionality for the stream-saver CLI.

pub mod core;
pub mod error;
pub mod storage;
pub mod types;
pub mod ui;
pub mod utils;
