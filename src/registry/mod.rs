//! Style registry: the engine that owns extracted CSS.
//!
//! The coordinator only talks to the registry through [`StyleRegistry`].
//! A production deployment plugs the real extraction engine in behind the
//! trait; [`SheetRegistry`] is the built-in engine used by the CLI and tests.
//!
//! ```text
//! code_extract ──► rules / class map / file map ──► get_css
//!                                                └─► export_* (JSON snapshots)
//! ```

mod error;
mod scan;
mod sheet;
mod theme;

pub use error::ExtractError;
pub use sheet::SheetRegistry;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Extraction I/O
// =============================================================================

/// Everything the registry needs to extract one source file.
#[derive(Debug, Clone, Copy)]
pub struct ExtractInput<'a> {
    /// Source file name as reported by the bundler.
    pub filename: &'a str,
    /// Source text.
    pub code: &'a str,
    /// Package whose imports mark a file as styled.
    pub lib_package: &'a str,
    /// CSS directory relative to the source file, `/`-separated.
    pub relative_css_dir: &'a str,
    /// Aggregate all rules into the base stylesheet.
    pub single_css: bool,
    /// Readable class names.
    pub debug: bool,
    /// Allow short-circuiting unchanged sources.
    pub cache: bool,
    /// Alias package -> library package.
    pub import_aliases: &'a FxHashMap<String, String>,
}

/// Result of one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractOutput {
    /// Rewritten source.
    pub code: String,
    /// Source map, when the engine produces one.
    pub map: Option<String>,
    /// Stylesheet this file contributed new or changed rules to.
    pub css_file: Option<String>,
    /// Whether the base stylesheet changed.
    pub updated_base_style: bool,
}

// =============================================================================
// Snapshots
// =============================================================================

/// The three JSON snapshots a registry can export and re-import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    Sheet,
    ClassMap,
    FileMap,
}

impl SnapshotKind {
    pub const ALL: [Self; 3] = [Self::Sheet, Self::ClassMap, Self::FileMap];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sheet => "sheet",
            Self::ClassMap => "classMap",
            Self::FileMap => "fileMap",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Registry trait
// =============================================================================

/// The extraction engine.
///
/// Every method is synchronous. Callers serialize access; implementations
/// need no interior locking.
pub trait StyleRegistry: Send {
    /// Extract styles from one source file and return the rewritten code.
    fn code_extract(&mut self, input: &ExtractInput<'_>) -> Result<ExtractOutput, ExtractError>;

    /// Render a stylesheet. `None` is the base stylesheet, `Some(n)` chunk `n`.
    fn get_css(&self, file_num: Option<u32>, import_main_css: bool) -> String;

    /// Export one snapshot as JSON text.
    fn export_snapshot(&self, kind: SnapshotKind) -> Result<String, ExtractError>;

    /// Restore one snapshot from parsed JSON.
    fn import_snapshot(
        &mut self,
        kind: SnapshotKind,
        value: serde_json::Value,
    ) -> Result<(), ExtractError>;

    /// Register theme tokens, replacing any previous theme.
    fn register_theme(&mut self, theme: serde_json::Value) -> Result<(), ExtractError>;

    fn export_sheet(&self) -> Result<String, ExtractError> {
        self.export_snapshot(SnapshotKind::Sheet)
    }

    fn export_class_map(&self) -> Result<String, ExtractError> {
        self.export_snapshot(SnapshotKind::ClassMap)
    }

    fn export_file_map(&self) -> Result<String, ExtractError> {
        self.export_snapshot(SnapshotKind::FileMap)
    }

    fn import_sheet(&mut self, value: serde_json::Value) -> Result<(), ExtractError> {
        self.import_snapshot(SnapshotKind::Sheet, value)
    }

    fn import_class_map(&mut self, value: serde_json::Value) -> Result<(), ExtractError> {
        self.import_snapshot(SnapshotKind::ClassMap, value)
    }

    fn import_file_map(&mut self, value: serde_json::Value) -> Result<(), ExtractError> {
        self.import_snapshot(SnapshotKind::FileMap, value)
    }
}
