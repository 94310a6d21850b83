//! `[output]` section configuration.
//!
//! Where extracted CSS and registry snapshots land on disk.
//!
//! # Example
//!
//! ```toml
//! [output]
//! css_dir = "df/devup-ui"           # Directory for devup-ui.css and chunks
//! single_css = false                # true = one aggregate stylesheet only
//! sheet_file = "df/sheet.json"      # Registry snapshots (warm start)
//! class_map_file = "df/classMap.json"
//! file_map_file = "df/fileMap.json"
//! port_file = "df/coordinator.port" # Coordinator discovery handshake
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Output artifact locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory holding `devup-ui.css` and `devup-ui-<n>.css` chunks.
    pub css_dir: PathBuf,

    /// Aggregate every rule into `devup-ui.css` instead of per-file chunks.
    pub single_css: bool,

    /// JSON snapshot of the style sheet.
    pub sheet_file: PathBuf,

    /// JSON snapshot of the class-name map.
    pub class_map_file: PathBuf,

    /// JSON snapshot of the file-to-chunk map.
    pub file_map_file: PathBuf,

    /// Holds the coordinator's TCP port as decimal text while it runs.
    pub port_file: PathBuf,
}

impl OutputConfig {
    pub const CSS_DIR: FieldPath = FieldPath::new("output.css_dir");
    pub const PORT_FILE: FieldPath = FieldPath::new("output.port_file");

    /// Resolve every path against the project root.
    pub fn normalize(&mut self, root: &Path) {
        for path in [
            &mut self.css_dir,
            &mut self.sheet_file,
            &mut self.class_map_file,
            &mut self.file_map_file,
            &mut self.port_file,
        ] {
            *path = crate::utils::path::normalize_path(&root.join(&*path));
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.css_dir.as_os_str().is_empty() {
            diag.error(Self::CSS_DIR, "must not be empty");
        }
        if self.port_file.as_os_str().is_empty() {
            diag.error(Self::PORT_FILE, "must not be empty");
        }
        if self.port_file.starts_with(&self.css_dir) && !self.css_dir.as_os_str().is_empty() {
            diag.warn(
                Self::PORT_FILE,
                "lives inside css_dir; bundlers watching css_dir will see it change",
            );
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            css_dir: PathBuf::from("df/devup-ui"),
            single_css: false,
            sheet_file: PathBuf::from("df/sheet.json"),
            class_map_file: PathBuf::from("df/classMap.json"),
            file_map_file: PathBuf::from("df/fileMap.json"),
            port_file: PathBuf::from("df/coordinator.port"),
        }
    }
}
