//! Extraction pipeline shared by the coordinator and the local fallback.
//!
//! ```text
//! ExtractRequest ─► code_extract ─► WritePlan ─► (caller executes writes)
//!                                └─► rewrite_css_imports ─► response code
//! ```

use std::fs;
use std::path::Path;

use crate::config::DevupConfig;
use crate::coordinator::ExtractRequest;
use crate::output::{OutputPaths, WritePlan, relative_css_dir, rewrite_css_imports};
use crate::registry::{ExtractError, ExtractInput, ExtractOutput, SnapshotKind, StyleRegistry};
use crate::{debug, log};

/// What [`warm_start`] restored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmStart {
    pub snapshots: usize,
    pub theme: bool,
}

/// Import snapshots left by a previous run and register the theme.
///
/// Unreadable snapshots are skipped with a warning. A theme file that
/// exists but cannot be used is an error.
pub fn warm_start(
    registry: &mut dyn StyleRegistry,
    config: &DevupConfig,
) -> Result<WarmStart, ExtractError> {
    let paths = OutputPaths::from_config(&config.output);
    let mut restored = WarmStart::default();

    for kind in SnapshotKind::ALL {
        let Some(value) = paths.read_snapshot(kind) else {
            continue;
        };
        match registry.import_snapshot(kind, value) {
            Ok(()) => restored.snapshots += 1,
            Err(e) => log!("warning"; "skipping {} snapshot: {}", kind, e),
        }
    }

    let theme_file = &config.extract.theme_file;
    if theme_file.is_file() {
        registry.register_theme(read_theme(theme_file)?)?;
        restored.theme = true;
    }

    debug!("extract"; "warm start: {} snapshot(s), theme: {}", restored.snapshots, restored.theme);
    Ok(restored)
}

fn read_theme(path: &Path) -> Result<serde_json::Value, ExtractError> {
    let text = fs::read_to_string(path)
        .map_err(|e| ExtractError::Theme(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| ExtractError::Theme(format!("{} is not valid JSON: {e}", path.display())))
}

/// Run one extraction and render the artifacts it requires.
///
/// The returned plan reflects the registry right after this mutation.
pub fn extract(
    registry: &mut dyn StyleRegistry,
    config: &DevupConfig,
    request: &ExtractRequest,
) -> Result<(ExtractOutput, WritePlan), ExtractError> {
    let resource = config.get_root().join(request.resource());
    let relative_dir = relative_css_dir(&resource, &config.output.css_dir);

    let input = ExtractInput {
        filename: &request.filename,
        code: &request.code,
        lib_package: &config.extract.package,
        relative_css_dir: &relative_dir,
        single_css: config.output.single_css,
        debug: config.extract.debug,
        cache: config.extract.cache,
        import_aliases: &config.extract.import_aliases,
    };

    let output = registry.code_extract(&input)?;
    let plan = WritePlan::for_extraction(&output, &*registry)?;
    Ok((output, plan))
}

/// Apply the response-side import rewrite.
pub fn finish(mut output: ExtractOutput, single_css: bool) -> ExtractOutput {
    output.code = rewrite_css_imports(&output.code, single_css);
    output
}
