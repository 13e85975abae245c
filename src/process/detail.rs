use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::Config,
    port::{
        parser::OutputFormat,
        query::{PlatformAdapter, QueryAdapter},
        UNKNOWN_NAME,
    },
    Result,
};

/// Extended information about one process.
///
/// Every optional field may be missing: the OS can withhold it, the platform
/// may not report it, or the process may have exited mid-lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDetail {
    pub pid: u32,
    pub process_name: String,
    /// Port carried over from the binding that prompted the lookup
    pub port: Option<u16>,
    pub user: Option<String>,
    pub command: Option<String>,
    pub cpu_usage: Option<String>,
    pub memory_usage: Option<String>,
    pub start_time: Option<String>,
}

impl ProcessDetail {
    fn bare(pid: u32) -> Self {
        Self {
            pid,
            process_name: UNKNOWN_NAME.to_string(),
            port: None,
            user: None,
            command: None,
            cpu_usage: None,
            memory_usage: None,
            start_time: None,
        }
    }
}

pub struct DetailFetcher<A = PlatformAdapter> {
    adapter: A,
}

impl DetailFetcher {
    pub fn new(config: &Config) -> Self {
        Self::with_adapter(PlatformAdapter::new(config))
    }
}

impl<A: QueryAdapter> DetailFetcher<A> {
    pub fn with_adapter(adapter: A) -> Self {
        Self { adapter }
    }

    /// Look up `pid`. Fails with `Error::ProcessNotFound` if it is already gone.
    pub async fn fetch(&self, pid: u32, port: Option<u16>) -> Result<ProcessDetail> {
        let raw = self.adapter.list_process_attributes(pid).await?;
        let mut detail = parse_attributes(self.adapter.format(), pid, &raw);
        detail.port = port;

        debug!(pid = pid, name = %detail.process_name, "Fetched process detail");
        Ok(detail)
    }
}

/// Map raw attribute text onto a `ProcessDetail`, leaving unreported fields empty.
pub fn parse_attributes(format: OutputFormat, pid: u32, raw: &str) -> ProcessDetail {
    let line = raw.lines().map(str::trim).find(|line| !line.is_empty());

    match (format, line) {
        (OutputFormat::Lsof, Some(line)) => parse_ps_line(pid, line),
        (OutputFormat::Netstat, Some(line)) => parse_tasklist_line(pid, line),
        (_, None) => ProcessDetail::bare(pid),
    }
}

/// `user pid %cpu %mem <lstart: 5 words> command...`
fn parse_ps_line(pid: u32, line: &str) -> ProcessDetail {
    let mut detail = ProcessDetail::bare(pid);
    let (fields, command) = split_leading(line, 9);

    detail.user = fields.first().map(|user| user.to_string());
    detail.cpu_usage = fields.get(2).and_then(|v| percentage(v));
    detail.memory_usage = fields.get(3).and_then(|v| percentage(v));

    if fields.len() == 9 {
        detail.start_time = Some(normalize_start_time(&fields[4..9].join(" ")));
    }

    if !command.is_empty() {
        detail.process_name = executable_name(command);
        detail.command = Some(command.to_string());
    }

    detail
}

/// `"Image Name","PID","Session Name","Session#","Mem Usage","Status","User Name","CPU Time","Window Title"`
fn parse_tasklist_line(pid: u32, line: &str) -> ProcessDetail {
    let mut detail = ProcessDetail::bare(pid);
    let fields = split_csv(line);
    let field = |idx: usize| {
        fields
            .get(idx)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty() && *v != "N/A")
            .map(str::to_string)
    };

    if let Some(image) = field(0) {
        detail.process_name = executable_name(&image);
    }
    detail.memory_usage = field(4);
    detail.user = field(6);

    detail
}

/// Split off the first `count` whitespace-separated words, returning them and
/// the untouched remainder.
fn split_leading(line: &str, count: usize) -> (Vec<&str>, &str) {
    let mut fields = Vec::with_capacity(count);
    let mut rest = line.trim_start();

    while fields.len() < count && !rest.is_empty() {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }

    (fields, rest.trim_end())
}

fn split_csv(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}

fn percentage(value: &str) -> Option<String> {
    value.parse::<f64>().ok().map(|v| format!("{v:.1}%"))
}

/// `ps -o lstart` prints e.g. `Thu Jan 15 10:30:00 2026`.
fn normalize_start_time(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, "%a %b %d %H:%M:%S %Y")
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Executable name from a command line, without directories or `.exe`.
fn executable_name(command_line: &str) -> String {
    let Some(first) = command_line.split_whitespace().next() else {
        return UNKNOWN_NAME.to_string();
    };

    let name = first.rsplit(['/', '\\']).next().unwrap_or(first);
    let stem = name
        .len()
        .checked_sub(4)
        .filter(|&cut| name.is_char_boundary(cut))
        .filter(|&cut| name[cut..].eq_ignore_ascii_case(".exe"))
        .map(|cut| &name[..cut]);
    let name = stem.unwrap_or(name);

    if name.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        name.to_string()
    }
}
