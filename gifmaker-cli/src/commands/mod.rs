//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Video to GIF conversion, from flags or interactive prompts.
pub mod convert;
pub mod info;
pub mod version;
