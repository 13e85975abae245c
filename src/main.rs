use colored::Colorize;
use portscope::{
    cli::{Cli, Commands},
    commands::{CheckCommand, DetailCommand, KillCommand},
    PortService, Result,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "portscope=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let service = PortService::new(&cli.config());

    match cli.command {
        Commands::Check { port, details } => {
            CheckCommand::execute(&service, &port, details, cli.quiet, cli.json).await?;
        }
        Commands::Kill { pid, graceful, yes } => {
            KillCommand::execute(&service, &pid, graceful, yes, cli.quiet, cli.json).await?;
        }
        Commands::Detail { pid, port } => {
            DetailCommand::execute(&service, &pid, port, cli.quiet, cli.json).await?;
        }
    }

    Ok(())
}
