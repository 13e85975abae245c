pub mod parser;
pub mod query;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::Config, process::detail::parse_attributes, utils::validate_port, Error, Result,
};
use query::{PlatformAdapter, QueryAdapter};

/// A process confirmed to hold a socket on the queried port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessBinding {
    pub pid: u32,
    pub process_name: String,
    pub port: u16,
}

/// Outcome of a single port check.
///
/// `error` is only set when the query itself failed; a free port is
/// `is_occupied == false` with no error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortCheckResult {
    pub is_occupied: bool,
    pub processes: Vec<ProcessBinding>,
    pub error: Option<String>,
}

impl PortCheckResult {
    pub fn from_bindings(processes: Vec<ProcessBinding>) -> Self {
        Self {
            is_occupied: !processes.is_empty(),
            processes,
            error: None,
        }
    }

    pub fn failed(error: &Error) -> Self {
        Self {
            is_occupied: false,
            processes: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

/// Resolves a port to the processes bound to it.
///
/// Holds no state besides the adapter; every call queries the OS again.
pub struct PortResolver<A = PlatformAdapter> {
    adapter: A,
}

impl PortResolver {
    pub fn new(config: &Config) -> Self {
        Self::with_adapter(PlatformAdapter::new(config))
    }
}

impl<A: QueryAdapter> PortResolver<A> {
    pub fn with_adapter(adapter: A) -> Self {
        Self { adapter }
    }

    /// Check `port`, folding every failure into the result's `error` field.
    ///
    /// Out-of-range ports are rejected before any external command runs.
    pub async fn resolve(&self, port: u32) -> PortCheckResult {
        let port = match validate_port(port) {
            Ok(port) => port,
            Err(e) => return PortCheckResult::failed(&e),
        };

        match self.lookup(port).await {
            Ok(processes) => PortCheckResult::from_bindings(processes),
            Err(e) => {
                warn!(port = port, error = %e, "Port query failed");
                PortCheckResult::failed(&e)
            }
        }
    }

    /// Query and parse the owners of an already validated port.
    pub async fn lookup(&self, port: u16) -> Result<Vec<ProcessBinding>> {
        let raw = self.adapter.list_socket_owners(port).await?;
        let mut bindings = self.adapter.format().parser().parse(&raw, port);

        if bindings.is_empty() && !raw.trim().is_empty() {
            // Unreadable output is reported as a free port
            debug!(port = port, "No bindings parsed from non-empty query output");
        }

        self.fill_missing_names(&mut bindings).await;
        debug!(port = port, count = bindings.len(), "Resolved port owners");

        Ok(bindings)
    }

    async fn fill_missing_names(&self, bindings: &mut [ProcessBinding]) {
        for binding in bindings.iter_mut().filter(|b| b.process_name.is_empty()) {
            binding.process_name = match self.adapter.list_process_attributes(binding.pid).await {
                Ok(raw) => parse_attributes(self.adapter.format(), binding.pid, &raw).process_name,
                Err(e) => {
                    debug!(pid = binding.pid, error = %e, "Could not look up process name");
                    UNKNOWN_NAME.to_string()
                }
            };
        }
    }
}

pub(crate) const UNKNOWN_NAME: &str = "Unknown";
