use colored::Colorize;
use dialoguer::Confirm;

use crate::{
    port::query::QueryAdapter,
    process::{ProcessControl, TerminationMode},
    service::{outcome_message, PortService},
    utils::parse_pid,
    Error, Result,
};

pub struct KillCommand;

impl KillCommand {
    pub async fn execute<A: QueryAdapter, C: ProcessControl>(
        service: &PortService<A, C>,
        pid: &str,
        graceful: bool,
        yes: bool,
        quiet: bool,
        json: bool,
    ) -> Result<()> {
        let pid = parse_pid(pid)?;
        let mode = if graceful {
            TerminationMode::Graceful
        } else {
            TerminationMode::Forceful
        };

        if !yes && !json {
            let name = match service.fetcher().fetch(pid, None).await {
                Ok(detail) => detail.process_name,
                Err(Error::ProcessNotFound(_)) => {
                    if !quiet {
                        println!("{} Process {} had already exited", "○".blue(), pid);
                    }
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(pid = pid, error = %e, "Could not look up process before kill");
                    crate::port::UNKNOWN_NAME.to_string()
                }
            };

            let prompt = format!(
                "Terminate process {} (PID: {}) {}?",
                name.yellow(),
                pid.to_string().cyan(),
                mode.to_string().blue()
            );

            let confirmed = Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()?;

            if !confirmed {
                if !quiet {
                    println!("{} Operation cancelled", "×".yellow());
                }
                return Ok(());
            }
        }

        let outcome = service.terminator().terminate(pid, mode).await;
        let message = outcome_message(pid, mode, outcome.clone());

        if json {
            let (Ok(text) | Err(text)) = &message;
            let json_output = serde_json::json!({
                "pid": pid,
                "mode": mode,
                "result": outcome,
                "success": message.is_ok(),
                "message": text,
            });
            println!("{}", serde_json::to_string_pretty(&json_output)?);
        } else if !quiet {
            if let Ok(msg) = &message {
                println!("{} {}", "✓".green(), msg);
            }
        }

        message.map(|_| ()).map_err(Error::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{tests::FakeAdapter, PortResolver};
    use crate::process::terminate::tests::FakeControl;
    use crate::process::{DetailFetcher, SignalError, Terminator};
    use std::time::Duration;

    fn service(
        signal: std::result::Result<(), SignalError>,
        running_after: bool,
    ) -> PortService<FakeAdapter, FakeControl> {
        PortService::from_parts(
            PortResolver::with_adapter(FakeAdapter::lsof(Ok(String::new()))),
            DetailFetcher::with_adapter(FakeAdapter::lsof(Ok(String::new()))),
            Terminator::with_control(
                FakeControl::new(signal, Ok(running_after)),
                Duration::from_millis(1),
            ),
        )
    }

    #[tokio::test]
    async fn test_kill_confirmed_by_flag() {
        let svc = service(Ok(()), false);
        assert!(KillCommand::execute(&svc, "1234", false, true, true, false)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_kill_skips_process_that_already_exited() {
        // No attributes for the PID, so the pre-kill lookup reports it gone
        let svc = service(Ok(()), false);
        assert!(KillCommand::execute(&svc, "4321", false, false, true, false)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_graceful_survivor_is_an_error() {
        let svc = service(Ok(()), true);

        let err = KillCommand::execute(&svc, "1234", true, true, true, true)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("still running after graceful termination"));
    }

    #[tokio::test]
    async fn test_invalid_pid() {
        let svc = service(Ok(()), false);

        let err = KillCommand::execute(&svc, "abc", false, true, true, false)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidPid(_)));
    }
}
