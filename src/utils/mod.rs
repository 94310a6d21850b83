//! Shared helpers.

pub mod hash;
pub mod path;
