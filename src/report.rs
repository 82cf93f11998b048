use anyhow::Result;
use handlebars::Handlebars;
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
  clients::{Email, EmailBody, Mailer},
  collect::ClusterVerdict,
  config::Config,
};

const EMAIL_SUBJECT: &str = "EKS Report";

/// Verdicts partitioned for reporting
///
/// Every unsupported cluster lands in `reached_eos`; supported clusters within
/// the notification threshold land in `nearing_eos`. Supported clusters beyond
/// the threshold are not reported.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Report {
  pub reached_eos: Vec<ClusterVerdict>,
  pub nearing_eos: Vec<ClusterVerdict>,
}

/// Collected verdicts as delivered by the fan-out layer - one inner list per
/// classifier invocation - or an equivalent flat list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum VerdictBatches {
  Nested(Vec<Vec<ClusterVerdict>>),
  Flat(Vec<ClusterVerdict>),
}

impl VerdictBatches {
  pub fn flatten(self) -> Vec<ClusterVerdict> {
    match self {
      Self::Nested(batches) => batches.into_iter().flatten().collect(),
      Self::Flat(verdicts) => verdicts,
    }
  }
}

/// Partition verdicts into reached/nearing end of support
pub fn partition(verdicts: Vec<ClusterVerdict>, eos_within_days: i64) -> Report {
  let (mut reached_eos, supported): (Vec<_>, Vec<_>) =
    verdicts.into_iter().partition(|cluster| !cluster.supported_version);
  let mut nearing_eos: Vec<_> = supported
    .into_iter()
    .filter(|cluster| cluster.days_till_eos <= eos_within_days)
    .collect();

  sort_clusters(&mut reached_eos);
  sort_clusters(&mut nearing_eos);

  Report { reached_eos, nearing_eos }
}

/// Sort clusters by account id, region, and version for reporting purposes
fn sort_clusters(clusters: &mut [ClusterVerdict]) {
  clusters.sort_by(|a, b| {
    (a.account_id.as_str(), a.region.as_str(), a.version.as_str()).cmp(&(
      b.account_id.as_str(),
      b.region.as_str(),
      b.version.as_str(),
    ))
  });
}

/// Data handed to the report template - the SES template and the embedded HTML
/// template share this shape
#[derive(Debug, Serialize)]
struct TemplateData<'a> {
  eos_within_days: i64,
  clusters_reached_eos: &'a [ClusterVerdict],
  clusters_near_eos: &'a [ClusterVerdict],
}

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Templates;

/// Render the inline HTML report body from the embedded template
pub fn render_html(report: &Report, eos_within_days: i64) -> Result<String> {
  let mut handlebars = Handlebars::new();
  handlebars.register_embed_templates::<Templates>()?;

  let data = TemplateData {
    eos_within_days,
    clusters_reached_eos: &report.reached_eos,
    clusters_near_eos: &report.nearing_eos,
  };

  Ok(handlebars.render("report.html", &data)?)
}

/// Partition the collected verdicts and dispatch the report email
///
/// No email is sent when nothing was collected or when sender/recipients are
/// not configured - both are clean no-ops, not errors.
pub async fn notify(mailer: &impl Mailer, config: &Config, batches: VerdictBatches) -> Result<()> {
  let flattened = batches.flatten();
  let collected_any = !flattened.is_empty();

  let report = partition(flattened, config.eos_within_days);
  info!("Report: {}", serde_json::to_string(&report)?);

  if !collected_any {
    debug!("No clusters collected; skipping notification");
    return Ok(());
  }
  let Some(from) = &config.from_address else {
    debug!("No sender address configured; skipping notification");
    return Ok(());
  };
  if config.to_addresses.is_empty() {
    debug!("No recipient addresses configured; skipping notification");
    return Ok(());
  }

  let body = match &config.ses_template_name {
    Some(name) => {
      let data = TemplateData {
        eos_within_days: config.eos_within_days,
        clusters_reached_eos: &report.reached_eos,
        clusters_near_eos: &report.nearing_eos,
      };

      EmailBody::Template {
        name: name.clone(),
        arn: config.ses_template_arn.clone(),
        data: serde_json::to_string(&data)?,
      }
    }
    None => EmailBody::Html {
      subject: EMAIL_SUBJECT.to_string(),
      body: render_html(&report, config.eos_within_days)?,
    },
  };

  let email = Email {
    from: from.clone(),
    to: config.to_addresses.clone(),
    body,
  };

  mailer.send_email(&email).await
}
