//! `css`: print a stylesheet from the running coordinator.

use anyhow::{Context, Result};
use std::io::Write;

use crate::client::CoordinatorClient;
use crate::config::DevupConfig;
use crate::coordinator::CssQuery;

pub fn print_css(config: &DevupConfig, query: CssQuery) -> Result<()> {
    let client = CoordinatorClient::from_config(config)?;
    let css = client.css(query).context("Failed to fetch css")?;
    std::io::stdout().lock().write_all(css.as_bytes())?;
    Ok(())
}
