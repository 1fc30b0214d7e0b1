//! Subcommands of the `zonex` binary.

pub mod batch;
pub mod config;
pub mod inspect;
pub mod process;
pub mod render;
pub mod zones;
