//! `extract`: send one file to the coordinator, or extract locally.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::client::{self, Served};
use crate::config::DevupConfig;
use crate::coordinator::ExtractRequest;
use crate::debug;

pub fn extract_file(
    config: &DevupConfig,
    file: &Path,
    resource_path: Option<&Path>,
    no_fallback: bool,
) -> Result<()> {
    let code =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let cwd = std::env::current_dir().context("Failed to get current working directory")?;
    let absolute = |p: &Path| cwd.join(p).to_string_lossy().into_owned();

    let request = ExtractRequest {
        filename: absolute(file),
        code,
        resource_path: absolute(resource_path.unwrap_or(file)),
    };

    let (output, served) = client::extract(config, &request, !no_fallback)?;
    if served == Served::Local {
        debug!("extract"; "served locally");
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.code.as_bytes())?;
    if !output.code.ends_with('\n') {
        writeln!(stdout)?;
    }
    Ok(())
}
