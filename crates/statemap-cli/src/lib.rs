//! Command-line front end for the statemap generator.

pub mod cli;

pub use cli::{run, Cli};
