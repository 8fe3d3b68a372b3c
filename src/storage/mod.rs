//! Storage modules: config, persisted key-value state

pub mod config;
pub mod kv;
