//! Degraded local extraction.
//!
//! When no coordinator answers, a worker extracts in-process: it restores
//! the registry from the snapshots on disk, extracts, and writes the same
//! artifacts the coordinator would have. Concurrent fallbacks in several
//! processes are not coordinated with each other.

use anyhow::{Context, Result};

use super::CoordinatorClient;
use crate::config::DevupConfig;
use crate::coordinator::ExtractRequest;
use crate::output::{OutputPaths, OutputWriter};
use crate::pipeline;
use crate::registry::{ExtractOutput, SheetRegistry};
use crate::{debug, log};

/// Where an extraction ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    Coordinator,
    Local,
}

/// In-process extractor backed by the on-disk snapshots.
pub struct LocalExtractor<'a> {
    config: &'a DevupConfig,
    registry: SheetRegistry,
    writer: OutputWriter,
}

impl<'a> LocalExtractor<'a> {
    pub fn new(config: &'a DevupConfig) -> Result<Self> {
        let mut registry = SheetRegistry::new();
        pipeline::warm_start(&mut registry, config).context("Failed to restore registry")?;
        Ok(Self {
            config,
            registry,
            writer: OutputWriter::new(OutputPaths::from_config(&config.output)),
        })
    }

    pub fn extract(&mut self, request: &ExtractRequest) -> Result<ExtractOutput> {
        let (output, plan) = pipeline::extract(&mut self.registry, self.config, request)?;
        self.writer.execute(plan)?;
        Ok(pipeline::finish(output, self.config.output.single_css))
    }
}

/// Extract through the coordinator, falling back to [`LocalExtractor`]
/// when it is unavailable and `allow_fallback` is set.
pub fn extract(
    config: &DevupConfig,
    request: &ExtractRequest,
    allow_fallback: bool,
) -> Result<(ExtractOutput, Served)> {
    let remote = CoordinatorClient::from_config(config).and_then(|client| client.extract(request));

    match remote {
        Ok(output) => Ok((output, Served::Coordinator)),
        Err(e) if allow_fallback && e.is_unavailable() => {
            log!("fallback"; "{}, extracting {} locally", e, request.filename);
            let output = LocalExtractor::new(config)?.extract(request)?;
            debug!("fallback"; "{} -> {:?}", request.filename, output.css_file);
            Ok((output, Served::Local))
        }
        Err(e) => Err(e).with_context(|| format!("Failed to extract {}", request.filename)),
    }
}
