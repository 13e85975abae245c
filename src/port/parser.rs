//! Line-oriented parsers for socket enumeration output.
//!
//! Each parser turns one tool's text into an ordered list of bindings that is
//! unique by PID. Rows that cannot be read are skipped; a completely
//! unreadable input yields an empty list so the port is reported as free
//! rather than blocking the caller.

use std::collections::HashSet;

use super::ProcessBinding;

/// Text layout produced by a query adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `lsof -i :PORT -P -n` rows and `ps -o` attribute lines
    Lsof,
    /// `netstat -ano` rows and `tasklist /FO CSV` attribute lines
    Netstat,
}

impl OutputFormat {
    pub fn parser(self) -> &'static dyn BindingParser {
        match self {
            OutputFormat::Lsof => &LsofParser,
            OutputFormat::Netstat => &NetstatParser,
        }
    }
}

pub trait BindingParser: Send + Sync {
    /// Parse raw output into bindings on `expected_port`.
    ///
    /// The result keeps one entry per PID, in the order each PID first
    /// appears, with the process name taken from that first row.
    fn parse(&self, raw: &str, expected_port: u16) -> Vec<ProcessBinding>;
}

/// Parser for lsof output.
///
/// ```text
/// COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
/// node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
/// ```
///
/// Abbreviated rows such as `node 1234 TCP *:3000 (LISTEN)` are accepted too:
/// only the command, the PID and the address after the protocol are read.
#[derive(Debug, Default, Clone, Copy)]
pub struct LsofParser;

impl LsofParser {
    fn parse_row(line: &str) -> Option<(u32, String, u16)> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return None;
        }

        // The header row fails here ("PID" is not a number)
        let pid = fields[1].parse::<u32>().ok()?;
        let port = Self::reported_port(&fields[2..])?;

        Some((pid, decode_escaped(fields[0]), port))
    }

    /// `fields` starts after the PID column. Full rows carry NODE and NAME at
    /// fixed positions; abbreviated rows are scanned for the protocol column,
    /// from the right so a user named `tcp` is never mistaken for it.
    fn reported_port(fields: &[&str]) -> Option<u16> {
        if fields.len() >= 7 && matches!(fields[5], "TCP" | "UDP") {
            return local_port(fields[6]);
        }

        let protocol = fields.iter().rposition(|f| matches!(*f, "TCP" | "UDP"));

        match protocol {
            Some(idx) => fields.get(idx + 1).and_then(|addr| local_port(addr)),
            None => fields.iter().find_map(|addr| local_port(addr)),
        }
    }
}

impl BindingParser for LsofParser {
    fn parse(&self, raw: &str, expected_port: u16) -> Vec<ProcessBinding> {
        let rows = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(Self::parse_row)
            .filter(|&(_, _, port)| port == expected_port);

        collect_unique(rows)
    }
}

/// Parser for Windows `netstat -ano` output.
///
/// ```text
///   Proto  Local Address          Foreign Address        State           PID
///   TCP    0.0.0.0:3000           0.0.0.0:0              LISTENING       1234
///   UDP    0.0.0.0:5353           *:*                                    2210
/// ```
///
/// netstat does not print process names; bindings come back with an empty
/// name and the resolver fills it in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetstatParser;

impl NetstatParser {
    fn parse_row(line: &str) -> Option<(u32, String, u16)> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return None;
        }

        let protocol = fields[0];
        if !protocol.eq_ignore_ascii_case("TCP") && !protocol.eq_ignore_ascii_case("UDP") {
            return None;
        }

        let pid = fields[fields.len() - 1].parse::<u32>().ok()?;
        // PID 0 owns TIME_WAIT sockets, not a real listener
        if pid == 0 {
            return None;
        }

        let port = local_port(fields[1])?;
        Some((pid, String::new(), port))
    }
}

impl BindingParser for NetstatParser {
    fn parse(&self, raw: &str, expected_port: u16) -> Vec<ProcessBinding> {
        let rows = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(Self::parse_row)
            .filter(|&(_, _, port)| port == expected_port);

        collect_unique(rows)
    }
}

fn collect_unique(rows: impl Iterator<Item = (u32, String, u16)>) -> Vec<ProcessBinding> {
    let mut seen = HashSet::new();
    let mut bindings = Vec::new();

    for (pid, process_name, port) in rows {
        if seen.insert(pid) {
            bindings.push(ProcessBinding {
                pid,
                process_name,
                port,
            });
        }
    }

    bindings
}

/// Extract the local port from an address column.
///
/// Handles `*:8080`, `127.0.0.1:3000`, `[::1]:3000` and connection names
/// like `10.0.0.1:3000->10.0.0.2:52345`, where the left side is local.
fn local_port(address: &str) -> Option<u16> {
    let local = address.split("->").next()?;
    let (_, port) = local.rsplit_once(':')?;
    port.parse::<u16>().ok()
}

/// Decode lsof's `\xNN` escapes (`Google\x20Chrome` becomes `Google Chrome`).
fn decode_escaped(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && bytes.get(i + 1) == Some(&b'x') {
            let byte = bytes
                .get(i + 2..i + 4)
                .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());

            if let Some(byte) = byte {
                decoded.push(byte);
                i += 4;
                continue;
            }
        }

        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}
