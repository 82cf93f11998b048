use std::env;

use crate::version::SupportCalendar;

/// Delimiter used for multi-valued environment variables
const LIST_DELIMITER: char = ';';

/// Notify when end of support is within this many days, unless overridden
const DEFAULT_EOS_WITHIN_DAYS: i64 = 90;

/// Process-wide, read-only configuration shared by all units of work
///
/// Constructed once at process start and passed by reference into each unit so
/// the units stay independently testable (no global state).
#[derive(Clone, Debug)]
pub struct Config {
  /// Role ARNs to assume for collecting cluster details across accounts
  pub assume_role_arns: Vec<String>,
  /// Cutoff for classifying a cluster as nearing end of support
  pub eos_within_days: i64,
  /// Report recipient addresses; dispatch requires at least one
  pub to_addresses: Vec<String>,
  /// Report sender address; dispatch requires it
  pub from_address: Option<String>,
  /// SES template to render the report with; inline HTML body when unset
  pub ses_template_name: Option<String>,
  pub ses_template_arn: Option<String>,
  /// End of support calendar used to classify cluster versions
  pub calendar: SupportCalendar,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      assume_role_arns: Vec::new(),
      eos_within_days: DEFAULT_EOS_WITHIN_DAYS,
      to_addresses: Vec::new(),
      from_address: None,
      ses_template_name: None,
      ses_template_arn: None,
      calendar: SupportCalendar::default(),
    }
  }
}

impl Config {
  /// Load configuration from the process environment
  pub fn from_env() -> Self {
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Load configuration from an arbitrary variable lookup
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
    let eos_within_days = lookup("EOS_WITHIN_DAYS")
      .and_then(|v| v.parse::<i64>().ok())
      .unwrap_or(DEFAULT_EOS_WITHIN_DAYS);

    Self {
      assume_role_arns: split_list(lookup("LAMBDA_ASSUME_ROLE_ARNS")),
      eos_within_days,
      to_addresses: split_list(lookup("TO_EMAIL_ADDRESSES")),
      from_address: lookup("FROM_EMAIL_ADDRESS").filter(|v| !v.is_empty()),
      ses_template_name: lookup("SES_TEMPLATE_NAME").filter(|v| !v.is_empty()),
      ses_template_arn: lookup("SES_TEMPLATE_ARN").filter(|v| !v.is_empty()),
      calendar: SupportCalendar::default(),
    }
  }
}

fn split_list(value: Option<String>) -> Vec<String> {
  value
    .unwrap_or_default()
    .split(LIST_DELIMITER)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| map.get(name).cloned()
  }

  #[test]
  fn config_defaults() {
    let cfg = Config::from_lookup(|_| None);
    assert!(cfg.assume_role_arns.is_empty());
    assert_eq!(cfg.eos_within_days, 90);
    assert!(cfg.to_addresses.is_empty());
    assert!(cfg.from_address.is_none());
    assert!(cfg.ses_template_name.is_none());
  }

  #[test]
  fn assume_role_arns_semicolon_delimited() {
    let cfg = Config::from_lookup(lookup_from(&[(
      "LAMBDA_ASSUME_ROLE_ARNS",
      "arn:aws:iam::111111111111:role/report;arn:aws:iam::222222222222:role/report",
    )]));
    assert_eq!(cfg.assume_role_arns.len(), 2);
    assert_eq!(cfg.assume_role_arns[0], "arn:aws:iam::111111111111:role/report");
  }

  #[test]
  fn empty_list_entries_are_dropped() {
    let cfg = Config::from_lookup(lookup_from(&[("TO_EMAIL_ADDRESSES", "a@example.com;; b@example.com;")]));
    assert_eq!(cfg.to_addresses, vec!["a@example.com", "b@example.com"]);
  }

  #[test]
  fn eos_within_days_override() {
    let cfg = Config::from_lookup(lookup_from(&[("EOS_WITHIN_DAYS", "30")]));
    assert_eq!(cfg.eos_within_days, 30);
  }

  #[test]
  fn eos_within_days_invalid_falls_back_to_default() {
    let cfg = Config::from_lookup(lookup_from(&[("EOS_WITHIN_DAYS", "soon")]));
    assert_eq!(cfg.eos_within_days, 90);
  }

  #[test]
  fn empty_strings_are_unset() {
    let cfg = Config::from_lookup(lookup_from(&[("FROM_EMAIL_ADDRESS", ""), ("SES_TEMPLATE_NAME", "")]));
    assert!(cfg.from_address.is_none());
    assert!(cfg.ses_template_name.is_none());
  }

  #[test]
  fn template_settings_carried_through() {
    let cfg = Config::from_lookup(lookup_from(&[
      ("SES_TEMPLATE_NAME", "eks-report"),
      ("SES_TEMPLATE_ARN", "arn:aws:ses:us-east-1:111111111111:template/eks-report"),
      ("FROM_EMAIL_ADDRESS", "noreply@example.com"),
    ]));
    assert_eq!(cfg.ses_template_name.as_deref(), Some("eks-report"));
    assert!(cfg.ses_template_arn.is_some());
    assert_eq!(cfg.from_address.as_deref(), Some("noreply@example.com"));
  }
}
