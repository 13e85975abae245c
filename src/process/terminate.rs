//! Process termination with post-signal verification.
//!
//! A call sends exactly one signal, waits `verify_delay`, and checks once
//! whether the process is gone. Graceful requests are never escalated; the
//! caller decides whether to follow up with a forceful one.
//!
//! The PID is read twice (signal, then probe) with no atomicity between the
//! two. If the process exits and the PID is reused inside that window, the
//! probe sees the new process. The OS offers no signal-and-confirm
//! primitive, so this race is accepted.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{config::Config, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationMode {
    /// Cooperative shutdown (SIGTERM, plain `taskkill`)
    Graceful,
    /// Immediate termination (SIGKILL, `taskkill /F`)
    Forceful,
}

impl fmt::Display for TerminationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationMode::Graceful => write!(f, "graceful"),
            TerminationMode::Forceful => write!(f, "forceful"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum TerminationOutcome {
    /// Signal delivered and the process is gone
    Terminated,
    /// No such process when the signal was sent
    AlreadyExited,
    /// The OS refused to let us signal the process
    PermissionDenied,
    /// The platform cannot deliver this mode; retry with `Forceful`
    Unsupported,
    Failed(String),
}

impl TerminationOutcome {
    /// True when the process no longer holds its resources.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TerminationOutcome::Terminated | TerminationOutcome::AlreadyExited
        )
    }
}

/// Why a signal could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    NoSuchProcess,
    PermissionDenied,
    Unsupported,
    Rejected(String),
}

/// Platform hooks for signalling and probing processes.
pub trait ProcessControl: Send + Sync {
    fn send_signal(
        &self,
        pid: u32,
        mode: TerminationMode,
    ) -> impl Future<Output = std::result::Result<(), SignalError>> + Send;

    /// Whether `pid` still exists. Exited-but-unreaped processes count as gone.
    fn is_running(&self, pid: u32) -> impl Future<Output = Result<bool>> + Send;
}

#[cfg(unix)]
pub type PlatformControl = UnixProcessControl;

#[cfg(windows)]
pub type PlatformControl = WindowsProcessControl;

pub struct Terminator<C = PlatformControl> {
    control: C,
    verify_delay: Duration,
}

impl Terminator {
    pub fn new(config: &Config) -> Self {
        Self::with_control(PlatformControl::new(config), config.verify_delay)
    }
}

impl<C: ProcessControl> Terminator<C> {
    pub fn with_control(control: C, verify_delay: Duration) -> Self {
        Self {
            control,
            verify_delay,
        }
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub async fn terminate(&self, pid: u32, mode: TerminationMode) -> TerminationOutcome {
        // On Unix, 0 and negative values address process groups
        if pid == 0 || i32::try_from(pid).is_err() {
            return TerminationOutcome::Failed(format!(
                "PID {pid} does not identify a single process"
            ));
        }

        debug!(pid = pid, mode = %mode, "Sending termination signal");

        match self.control.send_signal(pid, mode).await {
            Ok(()) => {}
            Err(SignalError::NoSuchProcess) => {
                debug!(pid = pid, "Process not found, already terminated");
                return TerminationOutcome::AlreadyExited;
            }
            Err(SignalError::PermissionDenied) => {
                warn!(pid = pid, "Permission denied to signal process");
                return TerminationOutcome::PermissionDenied;
            }
            Err(SignalError::Unsupported) => {
                warn!(pid = pid, mode = %mode, "Termination mode not supported");
                return TerminationOutcome::Unsupported;
            }
            Err(SignalError::Rejected(reason)) => {
                warn!(pid = pid, reason = %reason, "Signal rejected");
                return TerminationOutcome::Failed(reason);
            }
        }

        sleep(self.verify_delay).await;

        match self.control.is_running(pid).await {
            Ok(false) => {
                debug!(pid = pid, "Process terminated");
                TerminationOutcome::Terminated
            }
            Ok(true) => {
                debug!(pid = pid, mode = %mode, "Process survived the signal");
                TerminationOutcome::Failed(format!(
                    "process {pid} is still running after {mode} termination"
                ))
            }
            Err(e) => TerminationOutcome::Failed(format!(
                "could not verify that process {pid} exited: {e}"
            )),
        }
    }
}

#[cfg(unix)]
pub use unix::UnixProcessControl;

#[cfg(unix)]
mod unix {
    use std::time::Duration;

    use nix::errno::Errno;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    use super::{ProcessControl, SignalError, TerminationMode};
    use crate::{config::Config, Error, Result};

    /// Signals through `kill(2)`; `kill(pid, 0)` is the existence probe.
    #[derive(Debug, Clone)]
    pub struct UnixProcessControl {
        #[cfg_attr(target_os = "linux", allow(dead_code))]
        ps_program: String,
        #[cfg_attr(target_os = "linux", allow(dead_code))]
        timeout: Duration,
    }

    impl UnixProcessControl {
        pub fn new(config: &Config) -> Self {
            Self {
                ps_program: config.ps_program.clone(),
                timeout: config.query_timeout,
            }
        }

        #[cfg(target_os = "linux")]
        async fn has_exited(&self, pid: u32) -> bool {
            // State is the first field after the parenthesised command name
            match tokio::fs::read_to_string(format!("/proc/{pid}/stat")).await {
                Ok(stat) => stat
                    .rsplit_once(')')
                    .and_then(|(_, rest)| rest.trim_start().chars().next())
                    .is_some_and(|state| state == 'Z' || state == 'X'),
                Err(_) => true,
            }
        }

        #[cfg(not(target_os = "linux"))]
        async fn has_exited(&self, pid: u32) -> bool {
            let pid_arg = pid.to_string();
            match crate::port::query::run_bounded(
                &self.ps_program,
                &["-o", "stat=", "-p", &pid_arg],
                self.timeout,
            )
            .await
            {
                Ok(output) => {
                    let stat = String::from_utf8_lossy(&output.stdout);
                    let stat = stat.trim();
                    stat.is_empty() || stat.starts_with('Z')
                }
                Err(_) => false,
            }
        }
    }

    fn to_pid(pid: u32) -> Option<Pid> {
        i32::try_from(pid).ok().map(Pid::from_raw)
    }

    impl ProcessControl for UnixProcessControl {
        async fn send_signal(
            &self,
            pid: u32,
            mode: TerminationMode,
        ) -> std::result::Result<(), SignalError> {
            let target = to_pid(pid)
                .ok_or_else(|| SignalError::Rejected(format!("PID {pid} is out of range")))?;
            let sig = match mode {
                TerminationMode::Graceful => Signal::SIGTERM,
                TerminationMode::Forceful => Signal::SIGKILL,
            };

            signal::kill(target, sig).map_err(|errno| match errno {
                Errno::ESRCH => SignalError::NoSuchProcess,
                Errno::EPERM => SignalError::PermissionDenied,
                Errno::EINVAL => SignalError::Unsupported,
                other => SignalError::Rejected(other.desc().to_string()),
            })
        }

        async fn is_running(&self, pid: u32) -> Result<bool> {
            let target = to_pid(pid).ok_or_else(|| Error::InvalidPid(pid.to_string()))?;

            match signal::kill(target, None) {
                Err(Errno::ESRCH) => Ok(false),
                // EPERM: it exists, we just may not signal it
                Ok(()) | Err(Errno::EPERM) => Ok(!self.has_exited(pid).await),
                Err(e) => Err(e.into()),
            }
        }
    }
}

/// Signals through `taskkill`; `tasklist` is the existence probe.
#[derive(Debug, Clone)]
pub struct WindowsProcessControl {
    timeout: Duration,
}

impl WindowsProcessControl {
    pub fn new(config: &Config) -> Self {
        Self {
            timeout: config.query_timeout,
        }
    }

    fn classify(message: &str) -> SignalError {
        let lower = message.to_lowercase();
        if lower.contains("not found") {
            SignalError::NoSuchProcess
        } else if lower.contains("access is denied") {
            SignalError::PermissionDenied
        } else if lower.contains("forcefully") {
            // "This process can only be terminated forcefully (with /F option)."
            SignalError::Unsupported
        } else {
            SignalError::Rejected(message.trim().to_string())
        }
    }
}

impl ProcessControl for WindowsProcessControl {
    async fn send_signal(
        &self,
        pid: u32,
        mode: TerminationMode,
    ) -> std::result::Result<(), SignalError> {
        let pid_arg = pid.to_string();
        let mut args = vec!["/PID", pid_arg.as_str()];
        if mode == TerminationMode::Forceful {
            args.push("/F");
        }

        let output = crate::port::query::run_bounded("taskkill", &args, self.timeout)
            .await
            .map_err(|e| SignalError::Rejected(e.to_string()))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        Err(Self::classify(&format!("{stderr}{stdout}")))
    }

    async fn is_running(&self, pid: u32) -> Result<bool> {
        let filter = format!("PID eq {pid}");
        let output = crate::port::query::run_bounded(
            "tasklist",
            &["/FI", &filter, "/FO", "CSV", "/NH"],
            self.timeout,
        )
        .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.contains(&format!("\"{pid}\"")))
    }
}
