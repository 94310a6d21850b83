//! `[extract]` section configuration.
//!
//! Options forwarded to the style registry on every extraction.
//!
//! # Example
//!
//! ```toml
//! [extract]
//! package = "@devup-ui/react"   # Library whose imports mark styled files
//! debug = false                 # Readable class names
//! cache = true                  # Skip unchanged sources
//! theme_file = "devup.json"     # Registered once at startup (optional)
//! import_aliases = { "@devup-ui/core" = "@devup-ui/react" }
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Extraction options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Library package name recognised in import statements.
    pub package: String,

    /// Emit readable class names (`bg-red`) instead of short ones.
    pub debug: bool,

    /// Reuse the previous result when a file's source is unchanged.
    pub cache: bool,

    /// Theme JSON registered with the registry at startup.
    pub theme_file: PathBuf,

    /// Additional packages treated as aliases of `package`.
    pub import_aliases: FxHashMap<String, String>,
}

impl ExtractConfig {
    pub const PACKAGE: FieldPath = FieldPath::new("extract.package");

    pub fn normalize(&mut self, root: &Path) {
        self.theme_file = crate::utils::path::normalize_path(&root.join(&self.theme_file));
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.package.trim().is_empty() {
            diag.error_with_hint(
                Self::PACKAGE,
                "must not be empty",
                "set it to the package your components import styles from",
            );
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            package: "@devup-ui/react".into(),
            debug: false,
            cache: true,
            theme_file: PathBuf::from("devup.json"),
            import_aliases: FxHashMap::default(),
        }
    }
}
