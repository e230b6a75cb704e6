// file: src/shell/mod.rs
// description: multi-shell command execution module exports
// reference: internal module structure

pub mod executor;
pub mod kind;

pub use executor::ShellExecutor;
pub use kind::ShellKind;
