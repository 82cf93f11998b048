use std::{collections::HashMap, sync::Mutex};

use anyhow::{Result, anyhow, bail};

use eks_report::clients::{ClusterDescription, EksApi, Email, ListClustersError, Mailer};

/// Mock EKS API for testing. All fields default to empty scopes.
/// Override specific fields to simulate different account layouts.
#[derive(Default)]
pub struct MockEksApi {
  /// Cluster names per scope; `None` is the current account's credentials
  pub clusters: HashMap<Option<String>, Vec<String>>,
  /// Scopes that deny `eks:ListClusters`
  pub denied_scopes: Vec<Option<String>>,
  /// Cluster descriptions by cluster name
  pub descriptions: HashMap<String, ClusterDescription>,
}

impl EksApi for MockEksApi {
  async fn list_clusters(&self, assume_role_arn: Option<&str>) -> Result<Vec<String>, ListClustersError> {
    let scope = assume_role_arn.map(str::to_string);
    if self.denied_scopes.contains(&scope) {
      return Err(ListClustersError::AccessDenied(
        "explicit deny on eks:ListClusters".to_string(),
      ));
    }

    Ok(self.clusters.get(&scope).cloned().unwrap_or_default())
  }

  async fn describe_cluster(&self, name: &str, _assume_role_arn: Option<&str>) -> Result<ClusterDescription> {
    self
      .descriptions
      .get(name)
      .cloned()
      .ok_or_else(|| anyhow!("No mock description for cluster {name}"))
  }
}

/// Mock that returns errors for all methods - used for error path testing
pub struct MockEksApiError;

impl EksApi for MockEksApiError {
  async fn list_clusters(&self, _assume_role_arn: Option<&str>) -> Result<Vec<String>, ListClustersError> {
    Err(ListClustersError::Other(anyhow!("mock EKS error")))
  }

  async fn describe_cluster(&self, _name: &str, _assume_role_arn: Option<&str>) -> Result<ClusterDescription> {
    bail!("mock EKS error")
  }
}

/// Mailer that records every email instead of sending it
#[derive(Default)]
pub struct RecordingMailer {
  pub sent: Mutex<Vec<Email>>,
}

impl Mailer for RecordingMailer {
  async fn send_email(&self, email: &Email) -> Result<()> {
    self.sent.lock().unwrap().push(email.clone());
    Ok(())
  }
}

/// Mailer that fails every send - used for error path testing
pub struct MockMailerError;

impl Mailer for MockMailerError {
  async fn send_email(&self, _email: &Email) -> Result<()> {
    bail!("mock SES error")
  }
}
