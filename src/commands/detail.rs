use colored::Colorize;

use crate::{
    port::query::QueryAdapter, process::ProcessControl, service::PortService, utils::parse_pid,
    Result,
};

pub struct DetailCommand;

impl DetailCommand {
    pub async fn execute<A: QueryAdapter, C: ProcessControl>(
        service: &PortService<A, C>,
        pid: &str,
        port: Option<u16>,
        quiet: bool,
        json: bool,
    ) -> Result<()> {
        let pid = parse_pid(pid)?;
        let detail = service.fetcher().fetch(pid, port).await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&detail)?);
            return Ok(());
        }
        if quiet {
            return Ok(());
        }

        let field = |value: &Option<String>| {
            value
                .clone()
                .unwrap_or_else(|| "-".dimmed().to_string())
        };

        println!("{} {}", "Process".bold(), detail.pid.to_string().cyan());
        println!("  Name:    {}", detail.process_name.yellow());
        if let Some(port) = detail.port {
            println!("  Port:    {}", port.to_string().yellow());
        }
        println!("  User:    {}", field(&detail.user));
        println!("  CPU:     {}", field(&detail.cpu_usage));
        println!("  Memory:  {}", field(&detail.memory_usage));
        println!("  Started: {}", field(&detail.start_time));
        println!("  Command: {}", field(&detail.command));

        Ok(())
    }
}
