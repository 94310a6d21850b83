//! `serve`: run the coordinator until Ctrl+C.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::DevupConfig;
use crate::coordinator::Coordinator;
use crate::registry::SheetRegistry;
use crate::{log, shutdown};

pub fn serve(config: Arc<DevupConfig>) -> Result<()> {
    let shutdown_rx = shutdown::shutdown_channel();

    let mode = if config.output.single_css { "single css" } else { "split css" };
    let coordinator = Coordinator::bind(Arc::clone(&config), Box::new(SheetRegistry::new()))
        .context("Failed to start coordinator")?;
    coordinator.serve()?;
    log!("coordinator"; "ready ({}), css in {}", mode, config.root_relative(&config.output.css_dir).display());

    // Blocks until Ctrl+C; a closed channel means the same.
    let _ = shutdown_rx.recv();

    let stats = coordinator.write_stats();
    log!(
        "coordinator";
        "{} extraction(s), {} write(s) ({} base, {} chunk, {} snapshot)",
        coordinator.extractions(),
        stats.total(),
        stats.base(),
        stats.chunk(),
        stats.snapshot()
    );
    coordinator.close();
    Ok(())
}
