//! Minimal artifact writes.
//!
//! An extraction result maps to a [`WritePlan`]:
//!
//! | Result                         | Writes                                      |
//! |--------------------------------|---------------------------------------------|
//! | `updatedBaseStyle`             | `devup-ui.css`                              |
//! | `cssFile = devup-ui-<n>.css`   | chunk `n` + sheet + classMap + fileMap      |
//! | `cssFile = devup-ui.css`       | `devup-ui.css` + sheet + classMap + fileMap |
//! | neither                        | nothing                                     |
//!
//! Plans are rendered while the registry is locked and executed after the
//! lock is released. All writes of one plan run in parallel and are joined
//! before [`OutputWriter::execute`] returns.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;

use thiserror::Error;

use super::address::{BASE_CSS_FILE, chunk_file_name, get_file_num_from_css_file};
use crate::config::OutputConfig;
use crate::registry::{ExtractError, ExtractOutput, SnapshotKind, StyleRegistry};

// =============================================================================
// Artifacts and paths
// =============================================================================

/// One file the coordinator maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    BaseCss,
    ChunkCss(u32),
    Snapshot(SnapshotKind),
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BaseCss => f.write_str(BASE_CSS_FILE),
            Self::ChunkCss(n) => f.write_str(&chunk_file_name(*n)),
            Self::Snapshot(kind) => write!(f, "{kind} snapshot"),
        }
    }
}

/// Resolved artifact locations.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub css_dir: PathBuf,
    pub sheet_file: PathBuf,
    pub class_map_file: PathBuf,
    pub file_map_file: PathBuf,
}

impl OutputPaths {
    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            css_dir: config.css_dir.clone(),
            sheet_file: config.sheet_file.clone(),
            class_map_file: config.class_map_file.clone(),
            file_map_file: config.file_map_file.clone(),
        }
    }

    pub fn path_of(&self, artifact: Artifact) -> PathBuf {
        match artifact {
            Artifact::BaseCss => self.css_dir.join(BASE_CSS_FILE),
            Artifact::ChunkCss(n) => self.css_dir.join(chunk_file_name(n)),
            Artifact::Snapshot(SnapshotKind::Sheet) => self.sheet_file.clone(),
            Artifact::Snapshot(SnapshotKind::ClassMap) => self.class_map_file.clone(),
            Artifact::Snapshot(SnapshotKind::FileMap) => self.file_map_file.clone(),
        }
    }

    /// Read a previously written snapshot, if there is a readable one.
    pub fn read_snapshot(&self, kind: SnapshotKind) -> Option<serde_json::Value> {
        let path = self.path_of(Artifact::Snapshot(kind));
        let text = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                crate::log!("warning"; "ignoring unreadable {} at {}: {}", kind, path.display(), e);
                None
            }
        }
    }
}

// =============================================================================
// Write plan
// =============================================================================

/// Rendered writes for one extraction.
#[derive(Debug, Default)]
pub struct WritePlan {
    writes: Vec<(Artifact, String)>,
}

impl WritePlan {
    /// Render the writes an extraction result requires.
    ///
    /// Must be called while the registry still reflects this extraction.
    pub fn for_extraction(
        output: &ExtractOutput,
        registry: &dyn StyleRegistry,
    ) -> Result<Self, ExtractError> {
        let mut plan = Self::default();

        if output.updated_base_style {
            plan.push(Artifact::BaseCss, registry.get_css(None, false));
        }

        if let Some(css_file) = &output.css_file {
            match get_file_num_from_css_file(css_file) {
                Some(n) => plan.push(Artifact::ChunkCss(n), registry.get_css(Some(n), true)),
                // The result's file is the aggregate itself.
                None if !output.updated_base_style => {
                    plan.push(Artifact::BaseCss, registry.get_css(None, true));
                }
                None => {}
            }
            for kind in SnapshotKind::ALL {
                plan.push(Artifact::Snapshot(kind), registry.export_snapshot(kind)?);
            }
        }

        Ok(plan)
    }

    pub fn push(&mut self, artifact: Artifact, contents: String) {
        self.writes.push((artifact, contents));
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn artifacts(&self) -> impl Iterator<Item = Artifact> + '_ {
        self.writes.iter().map(|(artifact, _)| *artifact)
    }
}

// =============================================================================
// Writer
// =============================================================================

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write {artifact} to `{}`", .path.display())]
    Io {
        artifact: Artifact,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Cumulative write counters.
#[derive(Debug, Default)]
pub struct WriteStats {
    base: AtomicUsize,
    chunk: AtomicUsize,
    snapshot: AtomicUsize,
}

impl WriteStats {
    fn record(&self, artifact: Artifact) {
        let counter = match artifact {
            Artifact::BaseCss => &self.base,
            Artifact::ChunkCss(_) => &self.chunk,
            Artifact::Snapshot(_) => &self.snapshot,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn base(&self) -> usize {
        self.base.load(Ordering::Relaxed)
    }

    pub fn chunk(&self) -> usize {
        self.chunk.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> usize {
        self.snapshot.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.base() + self.chunk() + self.snapshot()
    }
}

/// Executes write plans.
#[derive(Debug)]
pub struct OutputWriter {
    paths: OutputPaths,
    stats: WriteStats,
}

impl OutputWriter {
    pub fn new(paths: OutputPaths) -> Self {
        Self {
            paths,
            stats: WriteStats::default(),
        }
    }

    pub fn paths(&self) -> &OutputPaths {
        &self.paths
    }

    pub fn stats(&self) -> &WriteStats {
        &self.stats
    }

    /// Perform every write in `plan`.
    ///
    /// All writes are attempted even if one fails; the first failure is
    /// returned. Returns the artifacts written.
    pub fn execute(&self, plan: WritePlan) -> Result<Vec<Artifact>, WriteError> {
        if plan.is_empty() {
            return Ok(Vec::new());
        }

        // Not rayon: a worker blocked in a rayon join may run a queued
        // request that waits on the turn this caller holds.
        let results: Vec<Result<Artifact, WriteError>> = thread::scope(|scope| {
            let handles: Vec<_> = plan
                .writes
                .into_iter()
                .map(|(artifact, contents)| scope.spawn(move || self.write_one(artifact, &contents)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        let mut written = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(artifact) => {
                    self.stats.record(artifact);
                    written.push(artifact);
                }
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(e) => crate::debug!("write"; "{e}"),
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }

    fn write_one(&self, artifact: Artifact, contents: &str) -> Result<Artifact, WriteError> {
        let path = self.paths.path_of(artifact);
        write_atomic(&path, contents.as_bytes())
            .map(|()| artifact)
            .map_err(|source| WriteError::Io {
                artifact,
                path,
                source,
            })
    }
}

/// Write through a temporary sibling and rename into place, so readers
/// never observe a partially written file.
fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    static SEQ: AtomicU64 = AtomicU64::new(0);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    let tmp = path.with_file_name(format!(".{name}.{}.{seq}.tmp", std::process::id()));

    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SheetRegistry;
    use tempfile::TempDir;

    fn paths(root: &Path) -> OutputPaths {
        OutputPaths {
            css_dir: root.join("df/devup-ui"),
            sheet_file: root.join("df/sheet.json"),
            class_map_file: root.join("df/classMap.json"),
            file_map_file: root.join("df/fileMap.json"),
        }
    }

    fn output(css_file: Option<&str>, updated_base_style: bool) -> ExtractOutput {
        ExtractOutput {
            code: String::new(),
            map: None,
            css_file: css_file.map(str::to_string),
            updated_base_style,
        }
    }

    #[test]
    fn test_plan_chunk_only() {
        let registry = SheetRegistry::new();
        let plan = WritePlan::for_extraction(&output(Some("devup-ui-1.css"), false), &registry)
            .unwrap();

        let artifacts: Vec<_> = plan.artifacts().collect();
        assert_eq!(
            artifacts,
            vec![
                Artifact::ChunkCss(1),
                Artifact::Snapshot(SnapshotKind::Sheet),
                Artifact::Snapshot(SnapshotKind::ClassMap),
                Artifact::Snapshot(SnapshotKind::FileMap),
            ]
        );
    }

    #[test]
    fn test_plan_base_only() {
        let registry = SheetRegistry::new();
        let plan = WritePlan::for_extraction(&output(None, true), &registry).unwrap();
        assert_eq!(plan.artifacts().collect::<Vec<_>>(), vec![Artifact::BaseCss]);
    }

    #[test]
    fn test_plan_single_css_not_doubled() {
        let registry = SheetRegistry::new();
        let plan =
            WritePlan::for_extraction(&output(Some("devup-ui.css"), true), &registry).unwrap();

        let base = plan.artifacts().filter(|a| *a == Artifact::BaseCss).count();
        assert_eq!(base, 1);
        assert_eq!(plan.len(), 4);
    }

    #[test]
    fn test_plan_single_css_without_base_update() {
        let registry = SheetRegistry::new();
        let plan =
            WritePlan::for_extraction(&output(Some("devup-ui.css"), false), &registry).unwrap();

        let artifacts: Vec<_> = plan.artifacts().collect();
        assert_eq!(artifacts[0], Artifact::BaseCss);
        assert_eq!(artifacts.len(), 4);
    }

    #[test]
    fn test_plan_nothing() {
        let registry = SheetRegistry::new();
        let plan = WritePlan::for_extraction(&output(None, false), &registry).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_execute_writes_files() {
        let tmp = TempDir::new().unwrap();
        let writer = OutputWriter::new(paths(tmp.path()));

        let mut plan = WritePlan::default();
        plan.push(Artifact::BaseCss, ":root{}".into());
        plan.push(Artifact::ChunkCss(3), ".a{color:red}".into());
        plan.push(Artifact::Snapshot(SnapshotKind::FileMap), "{}".into());

        let written = writer.execute(plan).unwrap();
        assert_eq!(written.len(), 3);

        let css_dir = tmp.path().join("df/devup-ui");
        assert_eq!(fs::read_to_string(css_dir.join("devup-ui.css")).unwrap(), ":root{}");
        assert_eq!(
            fs::read_to_string(css_dir.join("devup-ui-3.css")).unwrap(),
            ".a{color:red}"
        );
        assert_eq!(fs::read_to_string(tmp.path().join("df/fileMap.json")).unwrap(), "{}");

        assert_eq!(writer.stats().base(), 1);
        assert_eq!(writer.stats().chunk(), 1);
        assert_eq!(writer.stats().snapshot(), 1);

        // no temporary files left behind
        let leftovers = fs::read_dir(&css_dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_execute_reports_failure() {
        let tmp = TempDir::new().unwrap();
        // a regular file where the css directory should be
        fs::write(tmp.path().join("blocker"), "").unwrap();
        let mut paths = paths(tmp.path());
        paths.css_dir = tmp.path().join("blocker");
        let writer = OutputWriter::new(paths);

        let mut plan = WritePlan::default();
        plan.push(Artifact::ChunkCss(1), String::new());
        plan.push(Artifact::Snapshot(SnapshotKind::Sheet), "{}".into());

        let err = writer.execute(plan).unwrap_err();
        assert!(matches!(err, WriteError::Io { artifact: Artifact::ChunkCss(1), .. }));
        // the independent write still happened
        assert_eq!(writer.stats().snapshot(), 1);
        assert_eq!(writer.stats().chunk(), 0);
    }

    #[test]
    fn test_read_snapshot() {
        let tmp = TempDir::new().unwrap();
        let paths = paths(tmp.path());
        assert!(paths.read_snapshot(SnapshotKind::ClassMap).is_none());

        fs::create_dir_all(tmp.path().join("df")).unwrap();
        fs::write(&paths.class_map_file, r#"{"background:red":"a"}"#).unwrap();
        let value = paths.read_snapshot(SnapshotKind::ClassMap).unwrap();
        assert_eq!(value["background:red"], "a");

        fs::write(&paths.file_map_file, "not json").unwrap();
        assert!(paths.read_snapshot(SnapshotKind::FileMap).is_none());
    }
}
