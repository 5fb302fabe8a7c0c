//! External transformation commands.
//!
//! This crate provides:
//! - A command descriptor (`program` plus fixed leading arguments)
//! - An async runner with combined output capture and a kill-on-timeout
//! - A registry mapping output extensions to commands

pub mod command;
pub mod error;
pub mod registry;

pub use command::{check_program, CommandOutput, TransformCommand, TransformRunner};
pub use error::{MediaError, MediaResult};
pub use registry::TransformRegistry;
