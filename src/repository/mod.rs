// file: src/repository/mod.rs
// description: Repository operations module exports
// reference: Internal module structure

pub mod client;
pub mod git;
pub mod status;

pub use client::VersionControl;
pub use git::GitCli;
