//! Schema identifiers and validated payloads.

use crate::datasets::{BenchmarkDataset, ChartDataset};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The closed schemas a fetched document can be checked against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// Generic labelled-series chart data.
    #[default]
    Chart,
    /// Latency/bandwidth measurements for one cluster configuration.
    Benchmark,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 2] = [SchemaKind::Chart, SchemaKind::Benchmark];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Chart => "chart",
            SchemaKind::Benchmark => "benchmark",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chart" => Ok(SchemaKind::Chart),
            "benchmark" => Ok(SchemaKind::Benchmark),
            other => Err(Error::Config(format!("Unknown schema type: {}", other))),
        }
    }
}

/// Sanitized JSON that passed validation for `kind`.
///
/// Payloads are immutable once produced and are shared behind an `Arc` by
/// the loader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedPayload {
    kind: SchemaKind,
    value: Value,
}

impl ValidatedPayload {
    /// Wrap a value the validator already accepted.
    pub fn new(kind: SchemaKind, value: Value) -> Self {
        Self { kind, value }
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Typed view of a benchmark payload.
    pub fn as_benchmark(&self) -> Result<BenchmarkDataset> {
        Ok(serde_json::from_value(self.value.clone())?)
    }

    /// Typed view of a chart payload.
    pub fn as_chart(&self) -> Result<ChartDataset> {
        Ok(serde_json::from_value(self.value.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_kind_round_trip_str() {
        for kind in SchemaKind::ALL {
            assert_eq!(kind.as_str().parse::<SchemaKind>().unwrap(), kind);
        }
        assert!("graph".parse::<SchemaKind>().is_err());
    }

    #[test]
    fn test_schema_kind_default_is_chart() {
        assert_eq!(SchemaKind::default(), SchemaKind::Chart);
    }

    #[test]
    fn test_payload_typed_views() {
        let payload = ValidatedPayload::new(
            SchemaKind::Benchmark,
            json!({
                "cluster": "atlas",
                "nodes": 4096,
                "latency_us": [{ "size": "8B", "p50": 1.2, "p95": 1.6 }]
            }),
        );
        let bench = payload.as_benchmark().unwrap();
        assert_eq!(bench.cluster.as_deref(), Some("atlas"));
        assert_eq!(bench.nodes, Some(4096));
        assert_eq!(bench.latency_us.len(), 1);
    }

    #[test]
    fn test_whole_float_node_counts() {
        let payload = ValidatedPayload::new(
            SchemaKind::Benchmark,
            json!({
                "cluster": "atlas",
                "nodes": 4096.0,
                "metadata": { "hardware": { "nodes": 512.0 } }
            }),
        );
        let bench = payload.as_benchmark().unwrap();
        assert_eq!(bench.nodes, Some(4096));
        assert_eq!(bench.metadata.unwrap().hardware.unwrap().nodes, Some(512));

        let fractional = ValidatedPayload::new(SchemaKind::Benchmark, json!({ "nodes": 12.5 }));
        assert!(matches!(fractional.as_benchmark(), Err(Error::Parse(_))));
    }
}
