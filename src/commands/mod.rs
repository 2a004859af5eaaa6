//! CLI commands module.

pub mod chain;
pub mod run;
pub mod validate;
