//! Request/response boundary for front ends.
//!
//! Every method takes the raw request text, runs one stateless operation and
//! returns either a result value or a display-ready error string.

use tracing::info;

use crate::{
    config::Config,
    port::{
        query::{PlatformAdapter, QueryAdapter},
        PortCheckResult, PortResolver,
    },
    process::{
        DetailFetcher, PlatformControl, ProcessControl, ProcessDetail, TerminationMode,
        TerminationOutcome, Terminator,
    },
    utils::{parse_pid, parse_port_input},
    Error,
};

pub struct PortService<A = PlatformAdapter, C = PlatformControl> {
    resolver: PortResolver<A>,
    fetcher: DetailFetcher<A>,
    terminator: Terminator<C>,
}

impl PortService {
    pub fn new(config: &Config) -> Self {
        Self::from_parts(
            PortResolver::new(config),
            DetailFetcher::new(config),
            Terminator::new(config),
        )
    }
}

impl Default for PortService {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl<A: QueryAdapter, C: ProcessControl> PortService<A, C> {
    pub fn from_parts(
        resolver: PortResolver<A>,
        fetcher: DetailFetcher<A>,
        terminator: Terminator<C>,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            terminator,
        }
    }

    pub fn resolver(&self) -> &PortResolver<A> {
        &self.resolver
    }

    pub fn fetcher(&self) -> &DetailFetcher<A> {
        &self.fetcher
    }

    pub fn terminator(&self) -> &Terminator<C> {
        &self.terminator
    }

    pub async fn check_port(&self, port: &str) -> PortCheckResult {
        match parse_port_input(port) {
            Ok(port) => self.resolver.resolve(port).await,
            Err(e) => PortCheckResult::failed(&e),
        }
    }

    /// Forceful termination.
    pub async fn kill_process(&self, pid: &str) -> Result<String, String> {
        self.terminate(pid, TerminationMode::Forceful).await
    }

    /// Graceful termination. Never escalates on its own.
    pub async fn graceful_kill_process(&self, pid: &str) -> Result<String, String> {
        self.terminate(pid, TerminationMode::Graceful).await
    }

    pub async fn get_process_detail(
        &self,
        pid: &str,
        port: Option<u16>,
    ) -> Result<ProcessDetail, String> {
        let pid = parse_pid(pid).map_err(|e| e.to_string())?;
        self.fetcher
            .fetch(pid, port)
            .await
            .map_err(|e| e.to_string())
    }

    async fn terminate(&self, pid: &str, mode: TerminationMode) -> Result<String, String> {
        let pid = parse_pid(pid).map_err(|e| e.to_string())?;
        let outcome = self.terminator.terminate(pid, mode).await;
        info!(pid = pid, mode = %mode, outcome = ?outcome, "Termination finished");
        outcome_message(pid, mode, outcome)
    }
}

/// Render a termination outcome the way front ends show it.
pub fn outcome_message(
    pid: u32,
    mode: TerminationMode,
    outcome: TerminationOutcome,
) -> Result<String, String> {
    match (outcome, mode) {
        (TerminationOutcome::Terminated, TerminationMode::Forceful) => {
            Ok(format!("Process {pid} killed successfully"))
        }
        (TerminationOutcome::Terminated, TerminationMode::Graceful) => {
            Ok(format!("Process {pid} terminated gracefully"))
        }
        (TerminationOutcome::AlreadyExited, _) => Ok(format!("Process {pid} had already exited")),
        (TerminationOutcome::PermissionDenied, _) => {
            Err(Error::PermissionDenied(format!("cannot signal process {pid}")).to_string())
        }
        (TerminationOutcome::Unsupported, _) => Err(Error::Unsupported(format!(
            "{mode} termination is not available for process {pid}; retry with force kill"
        ))
        .to_string()),
        (TerminationOutcome::Failed(reason), _) => {
            Err(format!("Failed to kill process {pid}: {reason}"))
        }
    }
}
