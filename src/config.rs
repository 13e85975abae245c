use std::time::Duration;

/// Upper bound for a single external query (lsof, ps, netstat, tasklist).
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait between sending a termination signal and checking whether the process is gone.
pub const DEFAULT_VERIFY_DELAY: Duration = Duration::from_millis(500);

/// Runtime settings shared by the adapter and the terminator.
///
/// Nothing here is read from disk or the environment; the CLI maps its flags
/// onto a `Config` and library callers build one directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub query_timeout: Duration,
    pub verify_delay: Duration,
    pub lsof_program: String,
    pub ps_program: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            verify_delay: DEFAULT_VERIFY_DELAY,
            lsof_program: "lsof".to_string(),
            ps_program: "ps".to_string(),
        }
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_verify_delay(mut self, delay: Duration) -> Self {
        self.verify_delay = delay;
        self
    }

    pub fn with_lsof_program(mut self, program: impl Into<String>) -> Self {
        self.lsof_program = program.into();
        self
    }

    pub fn with_ps_program(mut self, program: impl Into<String>) -> Self {
        self.ps_program = program.into();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
