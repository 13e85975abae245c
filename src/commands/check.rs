use std::io::IsTerminal;
use std::time::Duration;

use colored::Colorize;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    port::{query::QueryAdapter, PortCheckResult},
    process::{ProcessControl, ProcessDetail},
    service::PortService,
    utils::StrExt,
    Error, Result,
};

const NAME_WIDTH: usize = 20;
const COMMAND_WIDTH: usize = 50;

pub struct CheckCommand;

impl CheckCommand {
    pub async fn execute<A: QueryAdapter, C: ProcessControl>(
        service: &PortService<A, C>,
        port: &str,
        details: bool,
        quiet: bool,
        json: bool,
    ) -> Result<()> {
        let spinner = (!quiet && !json && std::io::stdout().is_terminal())
            .then(|| Self::spinner(port));

        let result = service.check_port(port).await;
        let details = if details && result.is_occupied {
            Self::fetch_details(service, &result).await
        } else {
            Vec::new()
        };

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        if json {
            let json_output = serde_json::json!({
                "port": port.trim(),
                "checked_at": chrono::Utc::now().to_rfc3339(),
                "is_occupied": result.is_occupied,
                "processes": result.processes,
                "details": details,
                "error": result.error,
            });
            println!("{}", serde_json::to_string_pretty(&json_output)?);
        } else if !quiet && result.error.is_none() {
            Self::print_text(port.trim(), &result, &details);
        }

        match result.error {
            Some(msg) => Err(Error::Other(msg)),
            None => Ok(()),
        }
    }

    /// Detail lookups run concurrently; a process that vanished in between is skipped.
    async fn fetch_details<A: QueryAdapter, C: ProcessControl>(
        service: &PortService<A, C>,
        result: &PortCheckResult,
    ) -> Vec<ProcessDetail> {
        let lookups = result
            .processes
            .iter()
            .map(|p| service.fetcher().fetch(p.pid, Some(p.port)));

        join_all(lookups)
            .await
            .into_iter()
            .filter_map(|detail| match detail {
                Ok(detail) => Some(detail),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping process detail");
                    None
                }
            })
            .collect()
    }

    fn spinner(port: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Checking port {}...", port.trim()));
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    fn print_text(port: &str, result: &PortCheckResult, details: &[ProcessDetail]) {
        if !result.is_occupied {
            println!("{} Port {} is free", "○".blue(), port.yellow());
            return;
        }

        println!(
            "{} Port {} is in use by {} process(es)",
            "✓".green(),
            port.yellow(),
            result.processes.len().to_string().cyan()
        );

        if details.is_empty() {
            println!("  {:<8} {}", "PID".bold(), "NAME".bold());
            for process in &result.processes {
                println!(
                    "  {:<8} {}",
                    process.pid.to_string().cyan(),
                    process.process_name.truncate_with_ellipsis(NAME_WIDTH)
                );
            }
            return;
        }

        println!(
            "  {:<8} {:<20} {:<12} {:>6} {:>6}  {}",
            "PID".bold(),
            "NAME".bold(),
            "USER".bold(),
            "CPU".bold(),
            "MEM".bold(),
            "COMMAND".bold()
        );
        for detail in details {
            println!(
                "  {:<8} {:<20} {:<12} {:>6} {:>6}  {}",
                detail.pid.to_string().cyan(),
                detail.process_name.truncate_with_ellipsis(NAME_WIDTH),
                detail.user.as_deref().unwrap_or("-"),
                detail.cpu_usage.as_deref().unwrap_or("-"),
                detail.memory_usage.as_deref().unwrap_or("-"),
                detail
                    .command
                    .as_deref()
                    .unwrap_or("-")
                    .truncate_with_ellipsis(COMMAND_WIDTH)
                    .dimmed()
            );
        }
    }
}
