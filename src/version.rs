use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;

/// Sentinel returned for versions that have already reached end of support
pub const REACHED_EOS: i64 = -1;

/// Static calendar of Kubernetes minor versions and their Amazon EKS end of
/// (standard) support dates
///
/// https://docs.aws.amazon.com/eks/latest/userguide/kubernetes-versions.html#kubernetes-release-calendar
/// If an exact date is not posted yet, the 1st day of the month is used.
/// The smallest tracked minor version is the oldest version still considered
/// supported; anything below it has reached end of support by definition.
#[derive(Clone, Debug)]
pub struct SupportCalendar {
  entries: BTreeMap<i32, NaiveDate>,
}

impl Default for SupportCalendar {
  fn default() -> Self {
    Self::new([
      // K8s minor version : end of support date
      (30, (2026, 7, 23)),
      (31, (2026, 11, 26)),
      (32, (2027, 3, 23)),
      (33, (2027, 7, 29)),
    ])
  }
}

impl SupportCalendar {
  pub fn new<const N: usize>(entries: [(i32, (i32, u32, u32)); N]) -> Self {
    let entries = entries
      .into_iter()
      .map(|(minor, (y, m, d))| {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap_or_else(|| panic!("Invalid calendar date {y}-{m}-{d}"));
        (minor, date)
      })
      .collect();

    Self { entries }
  }

  /// The oldest minor version still tracked by the calendar
  pub fn minimum_minor(&self) -> i32 {
    *self.entries.keys().next().expect("Support calendar must not be empty")
  }

  /// Check if the given version is still supported by Amazon EKS
  pub fn is_supported(&self, version: &str) -> Result<bool> {
    let minor = parse_minor(version)?;
    Ok(minor >= self.minimum_minor())
  }

  /// Number of days from `today` until the version reaches end of support
  ///
  /// Returns `-1` when the version has already reached end of support (below the
  /// oldest tracked minor). A tracked minor whose date has already passed returns
  /// the raw, negative day count instead - stale entries are the calendar
  /// maintainer's responsibility to prune.
  pub fn days_till_end_of_support(&self, version: &str, today: NaiveDate) -> Result<i64> {
    let minor = parse_minor(version)?;
    if minor < self.minimum_minor() {
      return Ok(REACHED_EOS);
    }

    let eos = self
      .entries
      .get(&minor)
      .with_context(|| format!("No end of support date tracked for Kubernetes minor version {minor}"))?;

    Ok((*eos - today).num_days())
  }
}

/// Given a version, parse the minor version
///
/// For example, the format Amazon EKS uses of 1.24.7 returns 24
/// Or the format of v1.22.7-eks-123456 returns 22
pub(crate) fn parse_minor(version: &str) -> Result<i32> {
  let parts: Vec<&str> = version.split('.').collect();
  let minor_str = parts
    .get(1)
    .with_context(|| format!("Invalid version format '{version}', expected 'X.Y[.Z]'"))?;
  let minor = minor_str
    .parse::<i32>()
    .with_context(|| format!("Invalid minor version in '{version}'"))?;

  Ok(minor)
}
