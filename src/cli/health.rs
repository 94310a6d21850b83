//! `health`: report whether a coordinator answers.

use crate::client::CoordinatorClient;
use crate::config::DevupConfig;
use crate::{debug, log};

/// Returns whether the coordinator is healthy.
pub fn check(config: &DevupConfig) -> bool {
    let client = CoordinatorClient::from_config(config);
    match client.and_then(|client| client.health().map(|()| client)) {
        Ok(client) => {
            debug!("coordinator"; "healthy at {}", client.base_url());
            println!("ok");
            true
        }
        Err(e) => {
            log!("coordinator"; "{}", e);
            false
        }
    }
}
