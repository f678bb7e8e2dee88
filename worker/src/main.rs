use algorithms::Algorithms;
use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use mapreduce::{
    config::{Role, WorkerConfig},
    service::{mapper, partitioner, reducer, serve},
};

mod init;

/// Serves one MapReduce worker role over HTTP.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub options: WorkerConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init::tracing();
    let args = Cli::parse();

    let role = args.options.role;
    let router = match role {
        Role::Mapper => mapper::router::<Algorithms>(),
        Role::Partitioner => partitioner::router(),
        Role::Reducer => reducer::router::<Algorithms>(),
    };

    serve(args.options.socket_addr(), role.service_name(), router).await
}
