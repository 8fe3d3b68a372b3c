//! Core client behaviour: gate, health, classifier, backend, orchestration

pub mod app;
pub mod backend;
pub mod classifier;
pub mod gate;
pub mod health;
pub mod launcher;
pub mod orchestrator;
pub mod thumbnail;
