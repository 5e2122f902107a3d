// file: src/generation/mod.rs
// description: commit message generation backends
// reference: internal module structure

pub mod client;
pub mod prompt;

pub use client::{ChatCompletionClient, MessageGenerator};
