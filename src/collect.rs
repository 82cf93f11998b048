use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
  clients::{EksApi, ListClustersError},
  version::SupportCalendar,
};

/// Identifies where and under which credentials a cluster lives
///
/// Produced by the enumerator, consumed once by the classifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDescriptor {
  pub region: String,
  pub cluster: String,
  /// Role to assume before reaching the cluster; own account when absent
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub assume_role_arn: Option<String>,
}

/// Classification of a single cluster's Kubernetes version
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterVerdict {
  pub name: String,
  pub region: String,
  pub account_id: String,
  pub version: String,
  pub supported_version: bool,
  /// Days until end of support; exactly `-1` once support has ended
  #[serde(default)]
  pub days_till_eos: i64,
}

/// List clusters in the given region, in the current account and across any
/// accounts reachable through the provided assume-role ARNs
///
/// A scope that denies `eks:ListClusters` contributes zero clusters; any other
/// listing failure aborts the whole enumeration.
pub async fn list_clusters(
  api: &impl EksApi,
  region: &str,
  assume_role_arns: &[String],
) -> Result<Vec<ScopeDescriptor>> {
  let mut descriptors = Vec::new();

  let scopes = std::iter::once(None).chain(assume_role_arns.iter().map(|arn| Some(arn.as_str())));
  for assume_role_arn in scopes {
    match api.list_clusters(assume_role_arn).await {
      Ok(clusters) => descriptors.extend(clusters.into_iter().map(|cluster| ScopeDescriptor {
        region: region.to_string(),
        cluster,
        assume_role_arn: assume_role_arn.map(str::to_string),
      })),
      Err(ListClustersError::AccessDenied(message)) => {
        let scope = assume_role_arn.unwrap_or("current account");
        warn!("Access denied to list clusters in {region} for {scope}: {message}");
      }
      Err(ListClustersError::Other(err)) => return Err(err),
    }
  }

  Ok(descriptors)
}

/// Describe one cluster and classify its version against the support calendar
///
/// This is singular since the orchestrator fans out one invocation per
/// descriptor. The cluster ARN is authoritative for region and account id.
pub async fn describe_cluster(
  api: &impl EksApi,
  calendar: &SupportCalendar,
  scope: &ScopeDescriptor,
  today: NaiveDate,
) -> Result<ClusterVerdict> {
  let cluster = api.describe_cluster(&scope.cluster, scope.assume_role_arn.as_deref()).await?;
  let (region, account_id) = parse_cluster_arn(&cluster.arn)?;

  let supported_version = calendar.is_supported(&cluster.version)?;
  let days_till_eos = calendar.days_till_end_of_support(&cluster.version, today)?;

  Ok(ClusterVerdict {
    name: cluster.name,
    region,
    account_id,
    version: cluster.version,
    supported_version,
    days_till_eos,
  })
}

/// Parse the region and account id out of a cluster ARN
///
/// `arn:aws:eks:us-east-1:111111111111:cluster/example` -> (`us-east-1`, `111111111111`)
fn parse_cluster_arn(arn: &str) -> Result<(String, String)> {
  let parts: Vec<&str> = arn.splitn(6, ':').collect();
  match parts.as_slice() {
    [_arn, _partition, _service, region, account_id, _resource] => {
      Ok((region.to_string(), account_id.to_string()))
    }
    _ => bail!("Malformed cluster ARN '{arn}'"),
  }
}
