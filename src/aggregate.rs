//! Relational counts over the hierarchy index

use serde::{Deserialize, Serialize};

use crate::cache::Cache;
use crate::error::Result;
use crate::kinds::{address_space_key, ADDRESS, CONNECTION};

pub const CONNECTIONS_METRIC: &str = "enmasse-connections";
pub const ADDRESSES_METRIC: &str = "enmasse-addresses";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
  #[default]
  Gauge,
  Counter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
  pub name: String,
  #[serde(rename = "type")]
  pub metric_type: MetricType,
  pub value: f64,
}

impl Metric {
  pub fn gauge(name: impl Into<String>, value: f64) -> Self {
    Self {
      name: name.into(),
      metric_type: MetricType::Gauge,
      value,
    }
  }
}

/// Connection and address gauges of one address space.
pub fn address_space_metrics(cache: &Cache, namespace: &str, name: &str) -> Result<Vec<Metric>> {
  let root = address_space_key(namespace, name);
  let connections = cache.descendants(&root, CONNECTION)?.len();
  let addresses = cache.descendants(&root, ADDRESS)?.len();
  Ok(vec![
    Metric::gauge(CONNECTIONS_METRIC, connections as f64),
    Metric::gauge(ADDRESSES_METRIC, addresses as f64),
  ])
}

/// Find a metric by name.
pub fn find_metric<'a>(metrics: &'a [Metric], name: &str) -> Option<&'a Metric> {
  metrics.iter().find(|m| m.name == name)
}
