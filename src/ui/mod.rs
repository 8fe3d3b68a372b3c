//! Terminal UI: prompts and rendering

pub mod prompt;
pub mod render;
