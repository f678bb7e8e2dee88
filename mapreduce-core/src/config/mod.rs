//! Shared service configuration.
//!
//! This module introduces types to facilitate the configuration of the
//! services.
//!
//! # Features:
//! - [`ServiceConfig`]: The listen address shared by every service.
//! - [`OrchestratorConfig`]: Data and output locations plus pipeline knobs.
//! - [`WorkerConfig`]: Which worker [`Role`] to serve.
//!
//! Every struct is adorned with [`clap`] attributes so that binaries can
//! flatten them into their command line, with environment variable fallbacks.
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use clap::{Args, ValueEnum};

const HELP_HEADING: &str = "MapReduce options";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_WORKER_TIMEOUT_SECS: u64 = 300;

pub const ORCHESTRATOR_PORT: u16 = 8000;

/// Where a service listens.
#[derive(Args, Clone, PartialEq, Eq, Debug)]
pub struct ServiceConfig {
    /// Address to bind the HTTP listener to.
    #[arg(
        long,
        help_heading = HELP_HEADING,
        env = "MAPREDUCE_HOST",
        default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    )]
    pub host: IpAddr,

    /// Port to bind the HTTP listener to. Defaults to the service's
    /// well-known port.
    #[arg(long, short, help_heading = HELP_HEADING, env = "MAPREDUCE_PORT")]
    pub port: Option<u16>,
}

impl ServiceConfig {
    pub fn socket_addr(&self, default_port: u16) -> SocketAddr {
        SocketAddr::new(self.host, self.port.unwrap_or(default_port))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: None,
        }
    }
}

/// Orchestrator configuration.
#[derive(Args, Clone, PartialEq, Eq, Debug)]
pub struct OrchestratorConfig {
    #[command(flatten)]
    pub service: ServiceConfig,

    /// Directory that relative `inputFile` paths are resolved against.
    #[arg(
        long,
        help_heading = HELP_HEADING,
        env = "MAPREDUCE_DATA_DIR",
        default_value = DEFAULT_DATA_DIR
    )]
    pub data_dir: PathBuf,

    /// Directory job output artifacts are written to.
    #[arg(
        long,
        help_heading = HELP_HEADING,
        env = "MAPREDUCE_OUTPUT_DIR",
        default_value = DEFAULT_OUTPUT_DIR
    )]
    pub output_dir: PathBuf,

    /// Timeout applied to every call from the orchestrator to a worker.
    #[arg(
        long,
        help_heading = HELP_HEADING,
        env = "MAPREDUCE_WORKER_TIMEOUT_SECS",
        default_value_t = DEFAULT_WORKER_TIMEOUT_SECS
    )]
    pub worker_timeout_secs: u64,

    /// Send mapped records to the partitioner in emission order instead of
    /// sorting them by key first. Reducers group consecutive keys only, so
    /// keys may then be reduced once per run.
    #[arg(long, help_heading = HELP_HEADING)]
    pub preserve_emission_order: bool,
}

impl OrchestratorConfig {
    pub fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_timeout_secs)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            service: Default::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            worker_timeout_secs: DEFAULT_WORKER_TIMEOUT_SECS,
            preserve_emission_order: false,
        }
    }
}

/// Enumerates the worker roles a worker process can serve.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
pub enum Role {
    Mapper,
    Partitioner,
    Reducer,
}

impl Role {
    pub fn default_port(self) -> u16 {
        match self {
            Self::Mapper => 8001,
            Self::Reducer => 8002,
            Self::Partitioner => 8005,
        }
    }

    pub fn service_name(self) -> &'static str {
        match self {
            Self::Mapper => "mapper",
            Self::Partitioner => "partitioner",
            Self::Reducer => "reducer",
        }
    }
}

/// Worker configuration.
#[derive(Args, Clone, PartialEq, Eq, Debug)]
pub struct WorkerConfig {
    /// The worker role to serve.
    #[arg(long, short, help_heading = HELP_HEADING, value_enum, env = "MAPREDUCE_ROLE")]
    pub role: Role,

    #[command(flatten)]
    pub service: ServiceConfig,
}

impl WorkerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        self.service.socket_addr(self.role.default_port())
    }
}

#[cfg(test)]
mod test {
    use clap::Parser;

    use super::*;

    #[derive(Parser, Debug)]
    struct OrchestratorCli {
        #[command(flatten)]
        options: OrchestratorConfig,
    }

    #[derive(Parser, Debug)]
    struct WorkerCli {
        #[command(flatten)]
        options: WorkerConfig,
    }

    #[test]
    fn it_defaults_to_well_known_ports() {
        let cli = WorkerCli::parse_from(["worker", "--role", "partitioner"]);
        assert_eq!(cli.options.role, Role::Partitioner);
        assert_eq!(cli.options.socket_addr().port(), 8005);

        let cli = WorkerCli::parse_from(["worker", "--role", "reducer", "--port", "9002"]);
        assert_eq!(cli.options.socket_addr().port(), 9002);
    }

    #[test]
    fn it_parses_orchestrator_options() {
        let cli = OrchestratorCli::parse_from([
            "orchestrator",
            "--data-dir",
            "/srv/data",
            "--worker-timeout-secs",
            "5",
            "--preserve-emission-order",
        ]);
        assert_eq!(cli.options.data_dir, PathBuf::from("/srv/data"));
        assert_eq!(cli.options.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(cli.options.worker_timeout(), Duration::from_secs(5));
        assert!(cli.options.preserve_emission_order);
        assert_eq!(
            cli.options.service.socket_addr(ORCHESTRATOR_PORT).port(),
            ORCHESTRATOR_PORT
        );
    }
}
