//! Output artifacts: CSS file addressing and disk writes.
//!
//! | Module    | Purpose                                                  |
//! |-----------|----------------------------------------------------------|
//! | `address` | `devup-ui.css` / `devup-ui-<n>.css` naming and rewriting |
//! | `writer`  | Minimal write plans and their execution                  |

mod address;
mod writer;

pub use address::{BASE_CSS_FILE, chunk_file_name, relative_css_dir, rewrite_css_imports};
pub use writer::{Artifact, OutputPaths, OutputWriter, WriteError, WritePlan, WriteStats};
