use anyhow::{Context, Result};
use aws_sdk_eks::{Client as EksClient, config::Credentials, error::ProvideErrorMetadata};
use aws_sdk_sesv2::{
  Client as SesClient,
  types::{Body, Content, Destination, EmailContent, Message, Template},
};
use aws_sdk_sts::Client as StsClient;
use thiserror::Error;

/// Session name used when assuming a role to list clusters
pub const LIST_CLUSTERS_SESSION: &str = "EksReport-ListClusters";

/// Session name used when assuming a role to describe a cluster
pub const DESCRIBE_CLUSTER_SESSION: &str = "EksReport-DescribeCluster";

/// Failure modes for listing clusters in a scope
///
/// Access denied is expected when an account carries an explicit deny policy on
/// `eks:ListClusters`; the enumerator absorbs it as an empty scope. Everything
/// else propagates and fails the unit of work.
#[derive(Debug, Error)]
pub enum ListClustersError {
  #[error("access denied while listing clusters: {0}")]
  AccessDenied(String),
  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

/// The subset of a cluster description this tool cares about
#[derive(Clone, Debug)]
pub struct ClusterDescription {
  pub name: String,
  /// Canonical resource identifier; authoritative for region and account id
  pub arn: String,
  pub version: String,
}

/// Trait abstracting the EKS API operations used to collect cluster details
///
/// When a role ARN is provided, implementations scope the call to temporary
/// credentials obtained by assuming that role.
pub trait EksApi {
  fn list_clusters(
    &self,
    assume_role_arn: Option<&str>,
  ) -> impl std::future::Future<Output = Result<Vec<String>, ListClustersError>> + Send;
  fn describe_cluster(
    &self,
    name: &str,
    assume_role_arn: Option<&str>,
  ) -> impl std::future::Future<Output = Result<ClusterDescription>> + Send;
}

/// Email ready for dispatch; body is either a pre-rendered HTML document or a
/// reference to a template the delivery service renders
#[derive(Clone, Debug)]
pub struct Email {
  pub from: String,
  pub to: Vec<String>,
  pub body: EmailBody,
}

#[derive(Clone, Debug)]
pub enum EmailBody {
  Template {
    name: String,
    arn: Option<String>,
    /// JSON document the template is rendered with
    data: String,
  },
  Html {
    subject: String,
    body: String,
  },
}

/// Trait abstracting email delivery
pub trait Mailer {
  fn send_email(&self, email: &Email) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Issues temporary credentials scoped to an assumed role
pub struct StsCredentialBroker {
  client: StsClient,
}

impl StsCredentialBroker {
  pub fn new(config: &aws_config::SdkConfig) -> Self {
    Self {
      client: StsClient::new(config),
    }
  }

  /// Obtain temporary credentials by assuming the given role
  pub async fn assume_role(&self, role_arn: &str, session_name: &str) -> Result<Credentials> {
    let response = self
      .client
      .assume_role()
      .role_arn(role_arn)
      .role_session_name(session_name)
      .send()
      .await
      .with_context(|| format!("Failed to assume role {role_arn}"))?;

    let credentials = response
      .credentials()
      .with_context(|| format!("No credentials returned when assuming role {role_arn}"))?;

    Ok(Credentials::new(
      credentials.access_key_id(),
      credentials.secret_access_key(),
      Some(credentials.session_token().to_string()),
      None,
      "AssumeRole",
    ))
  }
}

/// Real EKS client implementation wrapping the SDK clients
pub struct AwsEksApi {
  config: aws_config::SdkConfig,
  broker: StsCredentialBroker,
}

impl AwsEksApi {
  pub fn new(config: &aws_config::SdkConfig) -> Self {
    Self {
      config: config.clone(),
      broker: StsCredentialBroker::new(config),
    }
  }

  /// EKS client for the caller's own credentials, or the assumed role's when given
  async fn client(&self, assume_role_arn: Option<&str>, session_name: &str) -> Result<EksClient> {
    match assume_role_arn {
      None => Ok(EksClient::new(&self.config)),
      Some(role_arn) => {
        let credentials = self.broker.assume_role(role_arn, session_name).await?;
        let config = aws_sdk_eks::config::Builder::from(&self.config)
          .credentials_provider(credentials)
          .build();

        Ok(EksClient::from_conf(config))
      }
    }
  }
}

impl EksApi for AwsEksApi {
  async fn list_clusters(&self, assume_role_arn: Option<&str>) -> Result<Vec<String>, ListClustersError> {
    let client = self
      .client(assume_role_arn, LIST_CLUSTERS_SESSION)
      .await
      .map_err(ListClustersError::Other)?;

    let mut clusters = Vec::new();
    let mut pages = client.list_clusters().into_paginator().send();
    while let Some(page) = pages.next().await {
      match page {
        Ok(output) => clusters.extend(output.clusters().iter().cloned()),
        Err(err) if err.code() == Some("AccessDeniedException") => {
          return Err(ListClustersError::AccessDenied(err.to_string()));
        }
        Err(err) => return Err(ListClustersError::Other(err.into())),
      }
    }

    Ok(clusters)
  }

  async fn describe_cluster(&self, name: &str, assume_role_arn: Option<&str>) -> Result<ClusterDescription> {
    let client = self.client(assume_role_arn, DESCRIBE_CLUSTER_SESSION).await?;
    let cluster = client
      .describe_cluster()
      .name(name)
      .send()
      .await
      .with_context(|| format!("Failed to describe cluster {name}"))?
      .cluster
      .with_context(|| format!("Cluster {name} not found"))?;

    Ok(ClusterDescription {
      name: cluster.name().with_context(|| format!("Cluster {name} has no name"))?.to_string(),
      arn: cluster.arn().with_context(|| format!("Cluster {name} has no ARN"))?.to_string(),
      version: cluster
        .version()
        .with_context(|| format!("Cluster {name} has no version"))?
        .to_string(),
    })
  }
}

/// Real email delivery implementation wrapping the SESv2 client
pub struct SesMailer {
  client: SesClient,
}

impl SesMailer {
  pub fn new(config: &aws_config::SdkConfig) -> Self {
    Self {
      client: SesClient::new(config),
    }
  }
}

impl Mailer for SesMailer {
  async fn send_email(&self, email: &Email) -> Result<()> {
    let content = match &email.body {
      EmailBody::Template { name, arn, data } => {
        let template = Template::builder()
          .template_name(name.as_str())
          .set_template_arn(arn.clone())
          .template_data(data.as_str())
          .build();

        EmailContent::builder().template(template).build()
      }
      EmailBody::Html { subject, body } => {
        let message = Message::builder()
          .subject(Content::builder().data(subject.as_str()).build()?)
          .body(Body::builder().html(Content::builder().data(body.as_str()).build()?).build())
          .build();

        EmailContent::builder().simple(message).build()
      }
    };

    let destination = Destination::builder().set_to_addresses(Some(email.to.clone())).build();

    self
      .client
      .send_email()
      .from_email_address(email.from.as_str())
      .destination(destination)
      .content(content)
      .send()
      .await
      .context("Failed to send report email")?;

    Ok(())
  }
}
