//! Coordinator client.
//!
//! Worker processes find the coordinator through the port file and talk to
//! it over loopback HTTP. Anything that prevents a connection is reported
//! as [`ClientError::Unavailable`], which [`extract`] turns into a local,
//! in-process extraction.

mod error;
mod fallback;

pub use error::ClientError;
pub use fallback::{LocalExtractor, Served, extract};

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::config::DevupConfig;
use crate::coordinator::{CssQuery, ExtractRequest, PortFile, Route};
use crate::registry::ExtractOutput;

pub struct CoordinatorClient {
    base: String,
    agent: ureq::Agent,
}

impl CoordinatorClient {
    pub fn for_port(port: u16, connect_timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout_connect(connect_timeout);
        Self::with_agent(port, agent)
    }

    /// Client for liveness checks: the whole request, not just the
    /// connect, must finish within `timeout`.
    pub fn probe(port: u16, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout(timeout);
        Self::with_agent(port, agent)
    }

    fn with_agent(port: u16, agent: ureq::AgentBuilder) -> Self {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
        Self {
            base: format!("http://{addr}"),
            agent: agent.build(),
        }
    }

    /// Connect to the coordinator recorded in `port_file`.
    pub fn discover(port_file: &PortFile, connect_timeout: Duration) -> Result<Self, ClientError> {
        port_file
            .read()
            .map(|port| Self::for_port(port, connect_timeout))
            .ok_or_else(|| {
                ClientError::Unavailable(format!("no port in {}", port_file.path().display()))
            })
    }

    pub fn from_config(config: &DevupConfig) -> Result<Self, ClientError> {
        Self::discover(
            &PortFile::new(&config.output.port_file),
            config.coordinator.connect_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn health(&self) -> Result<(), ClientError> {
        let body = self
            .agent
            .get(&self.url(Route::HEALTH))
            .call()?
            .into_string()
            .map_err(ClientError::Protocol)?;
        if body.trim() == "ok" {
            Ok(())
        } else {
            Err(ClientError::Unavailable(format!(
                "unexpected health response `{body}`"
            )))
        }
    }

    pub fn extract(&self, request: &ExtractRequest) -> Result<ExtractOutput, ClientError> {
        self.agent
            .post(&self.url(Route::EXTRACT))
            .send_json(request)?
            .into_json()
            .map_err(ClientError::Protocol)
    }

    pub fn css(&self, query: CssQuery) -> Result<String, ClientError> {
        let mut url = self.url(Route::CSS);
        let query = query.to_query();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        self.agent
            .get(&url)
            .call()?
            .into_string()
            .map_err(ClientError::Protocol)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use tempfile::TempDir;

    const TIMEOUT: Duration = Duration::from_millis(300);

    /// A loopback port nothing listens on.
    fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_unreachable_port_is_unavailable() {
        let client = CoordinatorClient::for_port(closed_port(), TIMEOUT);
        let err = client.health().unwrap_err();
        assert!(err.is_unavailable(), "{err}");

        let err = client.extract(&ExtractRequest::default()).unwrap_err();
        assert!(err.is_unavailable(), "{err}");
    }

    #[test]
    fn test_probe_gives_up_on_silent_listener() {
        // Accepts connections (kernel backlog) but never answers.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let started = std::time::Instant::now();
        let err = CoordinatorClient::probe(port, TIMEOUT).health().unwrap_err();
        assert!(err.is_unavailable(), "{err}");
        assert!(started.elapsed() < Duration::from_secs(3));
        drop(listener);
    }

    #[test]
    fn test_discover_without_port_file() {
        let tmp = TempDir::new().unwrap();
        let port_file = PortFile::new(tmp.path().join("coordinator.port"));
        let err = CoordinatorClient::discover(&port_file, TIMEOUT).err().unwrap();
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_discover_reads_port() {
        let tmp = TempDir::new().unwrap();
        let port_file = PortFile::new(tmp.path().join("coordinator.port"));
        port_file.write(4312).unwrap();
        let client = CoordinatorClient::discover(&port_file, TIMEOUT).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:4312");
    }
}
