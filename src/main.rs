use anyhow::Result;
use clap::Parser;
use eks_report::{Cli, Commands, Config};
use tracing_log::AsTrace;

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  tracing_subscriber::fmt()
    .with_max_level(cli.verbose.log_level_filter().as_trace())
    .init();

  let config = Config::from_env();

  match &cli.commands {
    Commands::ListClusters(args) => eks_report::list_clusters(args, &config).await,
    Commands::DescribeCluster(args) => eks_report::describe_cluster(args, &config).await,
    Commands::Notify(args) => eks_report::notify(args, &config).await,
  }
}
