//! Command-line interface module.

mod args;
pub mod css;
pub mod extract;
pub mod health;
pub mod serve;

pub use args::{Cli, Commands};
