pub mod clients;
pub mod collect;
pub mod config;
pub mod report;
pub mod version;

use std::{env, fs::File, io::prelude::*};

use anyhow::{Context, Result};
use aws_config::meta::region::RegionProviderChain;
use aws_types::region::Region;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clients::{AwsEksApi, SesMailer};
pub use crate::config::Config;

#[derive(Parser, Debug)]
#[command(author, about, version)]
#[command(propagate_version = true)]
pub struct Cli {
  #[command(subcommand)]
  pub commands: Commands,

  #[clap(flatten)]
  pub verbose: Verbosity<InfoLevel>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
  #[command(arg_required_else_help = true)]
  ListClusters(ListClusters),
  #[command(arg_required_else_help = true)]
  DescribeCluster(DescribeCluster),
  Notify(Notify),
}

/// List the EKS clusters visible in a region, in this account and any
/// configured cross-account roles
#[derive(Args, Debug, Serialize, Deserialize)]
pub struct ListClusters {
  /// The AWS region to list clusters within
  #[arg(short, long)]
  pub region: String,

  /// Write to file instead of stdout
  #[arg(short, long)]
  pub output: Option<String>,
}

/// Describe one EKS cluster and classify its version against the end of
/// support calendar
#[derive(Args, Debug, Serialize, Deserialize)]
pub struct DescribeCluster {
  /// The name of the cluster to describe
  #[arg(short, long, alias = "cluster-name")]
  pub cluster: String,

  /// The AWS region where the cluster is provisioned
  #[arg(short, long)]
  pub region: Option<String>,

  /// Role ARN to assume before describing the cluster
  #[arg(short, long)]
  pub assume_role_arn: Option<String>,

  /// Write to file instead of stdout
  #[arg(short, long)]
  pub output: Option<String>,
}

/// Partition the collected verdicts and email the report
#[derive(Args, Debug, Serialize, Deserialize)]
pub struct Notify {
  /// Path to the collected verdicts JSON; read from stdin when omitted
  #[arg(short, long)]
  pub input: Option<String>,
}

/// List clusters across all configured scopes for the given region
pub async fn list_clusters(args: &ListClusters, config: &Config) -> Result<()> {
  info!("[INPUT] {}", serde_json::to_string(args)?);

  let aws_config = get_config(&Some(args.region.to_owned())).await?;
  let api = AwsEksApi::new(&aws_config);

  let descriptors = collect::list_clusters(&api, &args.region, &config.assume_role_arns).await?;
  let output = serde_json::to_string_pretty(&descriptors)?;
  info!("[OUTPUT] {}", serde_json::to_string(&descriptors)?);

  write_output(&output, &args.output)
}

/// Describe a single cluster and produce its version verdict
pub async fn describe_cluster(args: &DescribeCluster, config: &Config) -> Result<()> {
  info!("[INPUT] {}", serde_json::to_string(args)?);

  let aws_config = get_config(&args.region.to_owned()).await?;
  let region = aws_config.region().context("No AWS region configured")?.to_string();
  let api = AwsEksApi::new(&aws_config);

  let scope = collect::ScopeDescriptor {
    region,
    cluster: args.cluster.to_owned(),
    assume_role_arn: args.assume_role_arn.to_owned(),
  };

  let verdict = collect::describe_cluster(&api, &config.calendar, &scope, Utc::now().date_naive()).await?;
  let output = serde_json::to_string_pretty(&verdict)?;
  info!("[OUTPUT] {}", serde_json::to_string(&verdict)?);

  write_output(&output, &args.output)
}

/// Send the EKS report notification(s)
pub async fn notify(args: &Notify, config: &Config) -> Result<()> {
  let raw = match &args.input {
    Some(path) => std::fs::read_to_string(path).with_context(|| format!("Failed to read input file: {path}"))?,
    None => {
      let mut buffer = String::new();
      std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read input from stdin")?;
      buffer
    }
  };

  let batches: report::VerdictBatches = serde_json::from_str(&raw).context("Failed to parse collected verdicts")?;

  let aws_config = get_config(&None).await?;
  let mailer = SesMailer::new(&aws_config);

  report::notify(&mailer, config, batches).await
}

/// Get the configuration to authn/authz with AWS that will be used across AWS clients
async fn get_config(region: &Option<String>) -> Result<aws_config::SdkConfig> {
  let aws_region = match region {
    Some(region) => Some(Region::new(region.to_owned())),
    None => env::var("AWS_REGION").ok().map(Region::new),
  };

  let region_provider = RegionProviderChain::first_try(aws_region).or_default_provider();

  Ok(aws_config::from_env().region(region_provider).load().await)
}

fn write_output(output: &str, filename: &Option<String>) -> Result<()> {
  match filename {
    Some(filename) => {
      let mut file = File::create(filename)?;
      file.write_all(output.as_bytes())?;
    }
    None => {
      println!("{output}");
    }
  }

  Ok(())
}
