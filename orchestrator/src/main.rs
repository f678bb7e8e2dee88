use algorithms::Algorithms;
use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use mapreduce::{
    client::HttpWorkers,
    config::{OrchestratorConfig, ORCHESTRATOR_PORT},
    orchestrator::Orchestrator,
    service::{orchestrator::router, serve},
};
use tracing::info;
mod init;

/// Accepts MapReduce jobs and drives them across mapper, partitioner and
/// reducer services.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub options: OrchestratorConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init::tracing();

    let args = Cli::parse();
    let addr = args.options.service.socket_addr(ORCHESTRATOR_PORT);
    let orchestrator = Orchestrator::<Algorithms, HttpWorkers>::from_config(&args.options)?;
    info!(
        data_dir = %args.options.data_dir.display(),
        output_dir = %args.options.output_dir.display(),
        worker_timeout = ?args.options.worker_timeout(),
        sort_by_key = !args.options.preserve_emission_order,
        "orchestrator configured"
    );

    serve(addr, "orchestrator", router(orchestrator)).await
}
