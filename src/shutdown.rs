//! Ctrl+C handling.
//!
//! The handler is installed once at startup. Before anyone subscribes it
//! exits the process; afterwards it only signals subscribers, which close
//! the coordinator (stopping the listener and deleting the port file).

use std::sync::OnceLock;

use crossbeam::channel::{self, Receiver, Sender};

static SHUTDOWN: OnceLock<(Sender<()>, Receiver<()>)> = OnceLock::new();

/// Install the global Ctrl+C handler. Call once at program start.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| match SHUTDOWN.get() {
        Some((tx, _)) => {
            crate::log!("coordinator"; "shutting down...");
            let _ = tx.send(());
        }
        None => std::process::exit(130),
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Receiver that yields once per Ctrl+C.
pub fn shutdown_channel() -> Receiver<()> {
    SHUTDOWN.get_or_init(channel::unbounded).1.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_channel_is_shared() {
        let a = shutdown_channel();
        let b = shutdown_channel();
        SHUTDOWN.get().unwrap().0.send(()).unwrap();

        let got = a.recv_timeout(Duration::from_secs(1)).is_ok()
            || b.recv_timeout(Duration::from_secs(1)).is_ok();
        assert!(got);
    }
}
