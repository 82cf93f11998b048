use chrono::NaiveDate;

use eks_report::{
  Config,
  clients::ClusterDescription,
  collect::ClusterVerdict,
  version::SupportCalendar,
};

/// Calendar matching the historical EKS release calendar used in the scenarios
pub fn calendar() -> SupportCalendar {
  SupportCalendar::new([
    (22, (2023, 6, 4)),
    (23, (2023, 8, 1)),
    (24, (2024, 1, 1)),
    (25, (2024, 5, 1)),
  ])
}

pub fn today() -> NaiveDate {
  NaiveDate::from_ymd_opt(2023, 10, 1).unwrap()
}

pub fn description(name: &str, account_id: &str, region: &str, version: &str) -> ClusterDescription {
  ClusterDescription {
    name: name.to_string(),
    arn: format!("arn:aws:eks:{region}:{account_id}:cluster/{name}"),
    version: version.to_string(),
  }
}

pub fn verdict(account_id: &str, region: &str, version: &str, supported: bool, days: i64) -> ClusterVerdict {
  ClusterVerdict {
    name: format!("cluster-{account_id}"),
    region: region.to_string(),
    account_id: account_id.to_string(),
    version: version.to_string(),
    supported_version: supported,
    days_till_eos: days,
  }
}

/// Config with sender and recipients set so dispatch is permitted
pub fn config_with_email() -> Config {
  Config {
    from_address: Some("noreply@example.com".to_string()),
    to_addresses: vec!["platform@example.com".to_string()],
    calendar: calendar(),
    ..Config::default()
  }
}
