use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "portscope",
    about = "Find, inspect and terminate the processes bound to a port",
    version,
    author,
    subcommand_help_heading = "Commands",
    help_template = "{before-help}{name} {version}\n{author-with-newline}{about-with-newline}\n{usage-heading} {usage}\n\n{all-args}{after-help}"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Suppress output")]
    pub quiet: bool,

    #[arg(short, long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(short = 'v', long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "MS",
        help = "Give up on an external query after this many milliseconds"
    )]
    pub timeout_ms: Option<u64>,

    #[arg(
        long,
        global = true,
        value_name = "MS",
        help = "Wait this long after signalling before checking the process is gone"
    )]
    pub verify_delay_ms: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Check which processes are using a port")]
    Check {
        #[arg(help = "Port number to check (1-65535)")]
        port: String,

        #[arg(short, long, help = "Also fetch user, command, CPU and memory for each process")]
        details: bool,
    },

    #[command(about = "Terminate a process by PID")]
    Kill {
        #[arg(help = "PID of the process to terminate")]
        pid: String,

        #[arg(
            short,
            long,
            help = "Ask the process to shut down instead of killing it immediately"
        )]
        graceful: bool,

        #[arg(short, long, help = "Do not ask for confirmation")]
        yes: bool,
    },

    #[command(about = "Show details about a process")]
    Detail {
        #[arg(help = "PID of the process")]
        pid: String,

        #[arg(short, long, help = "Port the process was found on")]
        port: Option<u16>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn config(&self) -> Config {
        let mut config = Config::new();
        if let Some(ms) = self.timeout_ms {
            config = config.with_query_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.verify_delay_ms {
            config = config.with_verify_delay(Duration::from_millis(ms));
        }
        config
    }
}
