//! OS query adapters.
//!
//! Adapters run the platform's discovery tools and hand back their stdout
//! untouched. They only decide whether a run succeeded, found nothing, or
//! failed; reading rows is the parser's job.

use std::future::Future;
use std::process::Output;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use super::parser::OutputFormat;
use crate::{config::Config, Error, Result};

/// Source of raw socket and process text for one platform.
pub trait QueryAdapter: Send + Sync {
    /// Layout of the text returned by this adapter.
    fn format(&self) -> OutputFormat;

    /// Raw listing of sockets on `port` and the processes holding them.
    ///
    /// An empty string means nothing holds the port. Fails with
    /// `Error::IoFailure` when the tool cannot be run or exits abnormally.
    fn list_socket_owners(&self, port: u16) -> impl Future<Output = Result<String>> + Send;

    /// Raw attribute listing for a single process.
    ///
    /// Fails with `Error::ProcessNotFound` when the process no longer exists
    /// and `Error::IoFailure` for anything else.
    fn list_process_attributes(&self, pid: u32) -> impl Future<Output = Result<String>> + Send;
}

#[cfg(not(target_os = "windows"))]
pub type PlatformAdapter = LsofAdapter;

#[cfg(target_os = "windows")]
pub type PlatformAdapter = NetstatAdapter;

/// Run `program` with `args`, killing it if it outlives `timeout`.
pub(crate) async fn run_bounded(program: &str, args: &[&str], timeout: Duration) -> Result<Output> {
    debug!(program = program, args = ?args, "Running external query");

    let mut cmd = Command::new(program);
    cmd.args(args).kill_on_drop(true);

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(Error::IoFailure(format!("{program} command failed: {e}"))),
        Err(_) => {
            warn!(
                program = program,
                timeout_ms = timeout.as_millis() as u64,
                "External query timed out"
            );
            Err(Error::IoFailure(format!(
                "{program} did not finish within {}ms",
                timeout.as_millis()
            )))
        }
    }
}

fn stdout_text(program: &str, output: &Output) -> Result<String> {
    String::from_utf8(output.stdout.clone())
        .map_err(|e| Error::IoFailure(format!("{program} produced unreadable output: {e}")))
}

fn failure(program: &str, output: &Output) -> Error {
    let stderr = String::from_utf8_lossy(&output.stderr);
    Error::IoFailure(format!(
        "{program} failed ({}): {}",
        output.status,
        stderr.trim()
    ))
}

/// macOS and Linux adapter built on `lsof` and `ps`.
#[derive(Debug, Clone)]
pub struct LsofAdapter {
    lsof_program: String,
    ps_program: String,
    timeout: Duration,
}

impl LsofAdapter {
    pub fn new(config: &Config) -> Self {
        Self {
            lsof_program: config.lsof_program.clone(),
            ps_program: config.ps_program.clone(),
            timeout: config.query_timeout,
        }
    }
}

impl QueryAdapter for LsofAdapter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Lsof
    }

    async fn list_socket_owners(&self, port: u16) -> Result<String> {
        let selector = format!(":{port}");
        // -P: numeric ports, -n: no host name lookups
        let output = run_bounded(
            &self.lsof_program,
            &["-i", &selector, "-P", "-n"],
            self.timeout,
        )
        .await?;

        if output.status.success() {
            return stdout_text(&self.lsof_program, &output);
        }

        // lsof exits 1 with no output when nothing matches the selector
        if output.status.code() == Some(1) && output.stdout.is_empty() {
            debug!(port = port, "No sockets found on port");
            return Ok(String::new());
        }

        Err(failure(&self.lsof_program, &output))
    }

    async fn list_process_attributes(&self, pid: u32) -> Result<String> {
        let pid_arg = pid.to_string();
        let output = run_bounded(
            &self.ps_program,
            &[
                "-p",
                &pid_arg,
                "-o",
                "user=,pid=,pcpu=,pmem=,lstart=,command=",
            ],
            self.timeout,
        )
        .await?;

        let text = stdout_text(&self.ps_program, &output)?;
        if text.trim().is_empty() {
            if output.status.success() || output.status.code() == Some(1) {
                debug!(pid = pid, "Process not found");
                return Err(Error::ProcessNotFound(pid));
            }
            return Err(failure(&self.ps_program, &output));
        }

        Ok(text)
    }
}

/// Windows adapter built on `netstat` and `tasklist`.
#[derive(Debug, Clone)]
pub struct NetstatAdapter {
    timeout: Duration,
}

impl NetstatAdapter {
    pub fn new(config: &Config) -> Self {
        Self {
            timeout: config.query_timeout,
        }
    }
}

impl QueryAdapter for NetstatAdapter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Netstat
    }

    async fn list_socket_owners(&self, _port: u16) -> Result<String> {
        // netstat cannot filter by port; the parser drops unrelated rows
        let output = run_bounded("netstat", &["-ano"], self.timeout).await?;

        if !output.status.success() {
            return Err(failure("netstat", &output));
        }

        // Console code pages are not UTF-8 on localized systems
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn list_process_attributes(&self, pid: u32) -> Result<String> {
        let filter = format!("PID eq {pid}");
        let output = run_bounded(
            "tasklist",
            &["/FI", &filter, "/FO", "CSV", "/NH", "/V"],
            self.timeout,
        )
        .await?;

        if !output.status.success() {
            return Err(failure("tasklist", &output));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        let trimmed = text.trim_start();
        if trimmed.is_empty() || trimmed.starts_with("INFO:") {
            debug!(pid = pid, "Process not found");
            return Err(Error::ProcessNotFound(pid));
        }

        Ok(text)
    }
}
