pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod port;
pub mod process;
pub mod service;
pub mod utils;

pub use config::Config;
pub use error::{Error, Result};
pub use port::{PortCheckResult, PortResolver, ProcessBinding};
pub use process::{DetailFetcher, ProcessDetail, TerminationMode, TerminationOutcome, Terminator};
pub use service::PortService;
