//! Path utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: normalization and relative paths (`normalize_path`, `relative_path`, `to_slash`)

pub mod fs;

pub use fs::{normalize_path, relative_path, to_slash};
