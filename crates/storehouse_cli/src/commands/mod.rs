//! CLI command implementations.

pub mod cat;
pub mod dirs;
pub mod info;
pub mod put;
