//! Subcommand implementations.

pub mod check;
pub mod history;
pub mod hoax;
pub mod image;
