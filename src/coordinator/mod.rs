//! Build coordinator: one long-lived process that owns the style registry.
//!
//! Bundler workers POST source files to `/extract`; the coordinator runs
//! them through the registry one at a time, in the order their bodies
//! complete, and writes
//! only the artifacts each result requires.
//!
//! ```text
//!  worker ─┐                   ┌─ extract pool ─► body ─► tickets ─► registry turn ─► write turn
//!  worker ─┼─► accept thread ──┤
//!  worker ─┘   (idle)          └─ query pool ───► /css, /health
//! ```
//!
//! Lifecycle: `bind` (snapshots restored, port bound, port file written)
//! -> `serve` -> `close`. A `Coordinator` value is never unbound.

mod error;
mod handlers;
mod idle;
mod order;
mod port_file;
mod protocol;
mod response;


pub use error::CoordinatorError;
pub use port_file::PortFile;
pub use protocol::{CssQuery, ErrorBody, ExtractRequest, Route};

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tiny_http::Server;

use crate::client::CoordinatorClient;
use crate::config::DevupConfig;
use crate::output::{OutputPaths, OutputWriter, WriteStats};
use crate::pipeline;
use crate::registry::StyleRegistry;
use crate::{debug, log};
use handlers::Tickets;
use idle::IdleTracker;
use order::Sequencer;

/// Coordinator lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Port bound and published, requests not yet accepted.
    Listening,
    Serving,
    Closing,
    Closed,
}

/// State shared with request handlers.
pub(crate) struct Shared {
    config: Arc<DevupConfig>,
    registry: Mutex<Box<dyn StyleRegistry>>,
    mutations: Arc<Sequencer>,
    writes: Arc<Sequencer>,
    issuing: Mutex<()>,
    idle: Arc<IdleTracker>,
    writer: OutputWriter,
}

pub struct Coordinator {
    shared: Arc<Shared>,
    server: Mutex<Option<Arc<Server>>>,
    addr: SocketAddr,
    port_file: PortFile,
    phase: Mutex<Phase>,
    accept: Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    /// Restore registry state, bind the loopback port and publish it.
    ///
    /// Fails with [`CoordinatorError::AlreadyRunning`] when the port file
    /// points at a coordinator that still answers `/health`.
    pub fn bind(
        config: Arc<DevupConfig>,
        mut registry: Box<dyn StyleRegistry>,
    ) -> Result<Self, CoordinatorError> {
        let port_file = PortFile::new(&config.output.port_file);
        ensure_not_running(&port_file, config.coordinator.connect_timeout())?;

        pipeline::warm_start(&mut *registry, &config)?;

        let requested = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), config.coordinator.port);
        let server = Server::http(requested).map_err(|e| CoordinatorError::Bind {
            addr: requested.to_string(),
            message: e.to_string(),
        })?;
        let addr = server.server_addr().to_ip().unwrap_or(requested);

        port_file
            .write(addr.port())
            .map_err(|e| CoordinatorError::PortFile(port_file.path().to_path_buf(), e))?;

        log!("coordinator"; "listening on http://{}", addr);
        debug!("coordinator"; "port file {}", port_file.path().display());

        let shared = Arc::new(Shared {
            writer: OutputWriter::new(OutputPaths::from_config(&config.output)),
            registry: Mutex::new(registry),
            mutations: Sequencer::new(),
            writes: Sequencer::new(),
            issuing: Mutex::new(()),
            idle: IdleTracker::new(config.coordinator.idle_grace()),
            config,
        });

        Ok(Self {
            shared,
            server: Mutex::new(Some(Arc::new(server))),
            addr,
            port_file,
            phase: Mutex::new(Phase::Listening),
            accept: Mutex::new(None),
        })
    }

    /// Start accepting requests on a background thread.
    ///
    /// Only the first call has an effect.
    pub fn serve(&self) -> Result<(), CoordinatorError> {
        let mut phase = self.phase.lock();
        if *phase != Phase::Listening {
            return Ok(());
        }
        let Some(server) = self.server.lock().clone() else {
            return Ok(());
        };

        let workers = self.shared.config.coordinator.workers;
        let pools = Pools {
            extract: worker_pool("extract", workers)?,
            query: worker_pool("query", workers)?,
        };
        let shared = Arc::clone(&self.shared);

        *self.accept.lock() = Some(thread::spawn(move || {
            accept_loop(&server, &pools, &shared);
        }));
        *phase = Phase::Serving;
        Ok(())
    }

    /// Stop accepting, release the port and delete the port file.
    ///
    /// Idempotent. Requests already being handled run to completion.
    pub fn close(&self) {
        {
            let mut phase = self.phase.lock();
            if matches!(*phase, Phase::Closing | Phase::Closed) {
                return;
            }
            *phase = Phase::Closing;
        }

        if let Some(server) = self.server.lock().take() {
            server.unblock();
        }
        if let Some(handle) = self.accept.lock().take()
            && handle.join().is_err()
        {
            log!("error"; "accept thread panicked");
        }
        self.port_file.remove();

        *self.phase.lock() = Phase::Closed;
        log!("coordinator"; "closed");
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    pub fn port_file(&self) -> &PortFile {
        &self.port_file
    }

    /// Cumulative artifact writes.
    pub fn write_stats(&self) -> &WriteStats {
        self.shared.writer.stats()
    }

    /// Completed `/extract` requests, successful or not.
    pub fn extractions(&self) -> u64 {
        self.shared.idle.counter()
    }
}

impl Shared {
    /// Take a place in both lines at once, so write order matches
    /// registry order.
    fn issue_tickets(&self) -> Tickets {
        let _issuing = self.issuing.lock();
        Tickets {
            mutation: self.mutations.issue(),
            write: self.writes.issue(),
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.close();
    }
}

/// Extraction and query work run on separate pools so that long
/// `waitForIdle` requests cannot occupy every extraction worker.
struct Pools {
    extract: ThreadPool,
    query: ThreadPool,
}

fn worker_pool(kind: &'static str, threads: usize) -> Result<ThreadPool, CoordinatorError> {
    Ok(ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |i| format!("coordinator-{kind}-{i}"))
        .build()?)
}

/// Extractions count as activity from the moment their headers arrive.
/// Tickets are taken later, by the worker, once the body has been read.
fn accept_loop(server: &Server, pools: &Pools, shared: &Arc<Shared>) {
    for request in server.incoming_requests() {
        let route = Route::classify(request.method(), request.url());
        let activity = (route == Route::Extract).then(|| shared.idle.begin());

        let pool = if route == Route::Extract {
            &pools.extract
        } else {
            &pools.query
        };
        let shared = Arc::clone(shared);
        pool.spawn_fifo(move || {
            if let Err(e) = handlers::handle_request(request, route, activity, &shared) {
                log!("coordinator"; "request error: {e}");
            }
        });
    }
    debug!("coordinator"; "accept loop stopped");
}

/// Fail if the port file names a coordinator that still answers.
fn ensure_not_running(port_file: &PortFile, timeout: Duration) -> Result<(), CoordinatorError> {
    let Some(port) = port_file.read() else {
        return Ok(());
    };
    if CoordinatorClient::probe(port, timeout).health().is_ok() {
        return Err(CoordinatorError::AlreadyRunning(port));
    }
    debug!("coordinator"; "replacing stale port file (port {})", port);
    Ok(())
}
