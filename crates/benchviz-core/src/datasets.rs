//! Typed models for the two dataset shapes.
//!
//! These mirror the closed schemas enforced by `benchviz-validate`; a value
//! that passed validation always deserializes into the matching model.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// HPC network latency/bandwidth measurements for one cluster configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkDataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_node_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub nodes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fabric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BenchmarkMetadata>,
    #[serde(default)]
    pub latency_us: Vec<LatencyPoint>,
    #[serde(default)]
    pub bandwidth_gbps: Vec<BandwidthPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// ISO date (`YYYY-MM-DD`) the measurements were taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<HardwareInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareInfo {
    #[serde(
        default,
        deserialize_with = "deserialize_node_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub nodes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<String>,
}

/// Node counts are validated as integers, which admits whole floats like `4096.0`.
fn deserialize_node_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if value.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&value) {
        Ok(Some(value as u32))
    } else {
        Err(D::Error::custom(format!("invalid node count {}", value)))
    }
}

/// Latency percentiles (microseconds) for one message size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyPoint {
    pub size: String,
    pub p50: f64,
    pub p95: f64,
}

/// Sustained bandwidth for one message size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandwidthPoint {
    pub size: String,
    pub gbps: f64,
}

/// A labelled row describing the system a benchmark ran on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub label: &'static str,
    pub value: String,
}

impl BenchmarkDataset {
    /// Rows for the "System / Nodes / Network / Topology / Measured" table.
    ///
    /// Hardware metadata wins over the top-level fields; rows without a value
    /// are left out.
    pub fn summary_rows(&self) -> Vec<SummaryRow> {
        let metadata = self.metadata.clone().unwrap_or_default();
        let hardware = metadata.hardware.unwrap_or_default();

        let rows = [
            ("System", metadata.name.or_else(|| self.cluster.clone())),
            (
                "Nodes",
                hardware.nodes.or(self.nodes).map(|n| n.to_string()),
            ),
            ("Network", hardware.network.or_else(|| self.fabric.clone())),
            (
                "Topology",
                hardware.topology.or_else(|| self.topology.clone()),
            ),
            ("Measured", metadata.date),
        ];

        rows.into_iter()
            .filter_map(|(label, value)| {
                value
                    .filter(|v| !v.is_empty())
                    .map(|value| SummaryRow { label, value })
            })
            .collect()
    }

    /// Latency points ordered by message size, smallest first.
    pub fn latency_by_size(&self) -> Vec<&LatencyPoint> {
        let mut points: Vec<_> = self.latency_us.iter().collect();
        points.sort_by(|a, b| message_size_bytes(&a.size).total_cmp(&message_size_bytes(&b.size)));
        points
    }

    /// Bandwidth points ordered by message size, smallest first.
    pub fn bandwidth_by_size(&self) -> Vec<&BandwidthPoint> {
        let mut points: Vec<_> = self.bandwidth_gbps.iter().collect();
        points.sort_by(|a, b| message_size_bytes(&a.size).total_cmp(&message_size_bytes(&b.size)));
        points
    }
}

/// Convert a size label like `64KB` into bytes.
///
/// Unparseable labels sort last, so they map to positive infinity.
pub fn message_size_bytes(label: &str) -> f64 {
    let label = label.trim();
    let digits_end = label
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(label.len());
    let (number, unit) = label.split_at(digits_end);

    let Ok(value) = number.parse::<f64>() else {
        return f64::INFINITY;
    };

    let multiplier = match unit.to_ascii_uppercase().as_str() {
        "B" => 1.0,
        "KB" => 1024.0,
        "MB" => 1024.0 * 1024.0,
        "GB" => 1024.0 * 1024.0 * 1024.0,
        _ => return f64::INFINITY,
    };

    value * multiplier
}

/// Generic labelled-series data consumed by a graphing widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub datasets: Vec<ChartSeries>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub data: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn atlas() -> BenchmarkDataset {
        BenchmarkDataset {
            cluster: Some("atlas".into()),
            nodes: Some(4096),
            fabric: Some("HDR200".into()),
            topology: Some("dragonfly".into()),
            metadata: None,
            latency_us: vec![
                LatencyPoint { size: "1KB".into(), p50: 2.1, p95: 2.8 },
                LatencyPoint { size: "8B".into(), p50: 1.2, p95: 1.6 },
            ],
            bandwidth_gbps: vec![
                BandwidthPoint { size: "1MB".into(), gbps: 128.0 },
                BandwidthPoint { size: "64KB".into(), gbps: 92.0 },
            ],
        }
    }

    #[test]
    fn test_message_size_bytes() {
        assert_eq!(message_size_bytes("8B"), 8.0);
        assert_eq!(message_size_bytes("64KB"), 65536.0);
        assert_eq!(message_size_bytes("1MB"), 1048576.0);
        assert_eq!(message_size_bytes("2gb"), 2.0 * 1024.0 * 1024.0 * 1024.0);
        assert!(message_size_bytes("huge").is_infinite());
        assert!(message_size_bytes("12TB").is_infinite());
    }

    #[test]
    fn test_points_sorted_by_size() {
        let data = atlas();
        let sizes: Vec<_> = data.latency_by_size().iter().map(|p| p.size.as_str()).collect();
        assert_eq!(sizes, vec!["8B", "1KB"]);
        let sizes: Vec<_> = data.bandwidth_by_size().iter().map(|p| p.size.as_str()).collect();
        assert_eq!(sizes, vec!["64KB", "1MB"]);
    }

    #[test]
    fn test_summary_rows_prefer_hardware_metadata() {
        let mut data = atlas();
        data.metadata = Some(BenchmarkMetadata {
            name: Some("Atlas 4096-node Benchmark".into()),
            date: Some("2024-01-15".into()),
            hardware: Some(HardwareInfo {
                nodes: None,
                network: Some("HDR 200".into()),
                topology: None,
            }),
        });

        let rows = data.summary_rows();
        let pairs: Vec<_> = rows.iter().map(|r| (r.label, r.value.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                ("System", "Atlas 4096-node Benchmark"),
                ("Nodes", "4096"),
                ("Network", "HDR 200"),
                ("Topology", "dragonfly"),
                ("Measured", "2024-01-15"),
            ]
        );
    }

    #[test]
    fn test_summary_rows_skip_missing_values() {
        let data = BenchmarkDataset {
            cluster: Some("neptune".into()),
            ..Default::default()
        };
        let rows = data.summary_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "System");
    }

    #[test]
    fn test_chart_series_uses_camel_case() {
        let series: ChartSeries = serde_json::from_value(serde_json::json!({
            "label": "Latency",
            "data": [1.2, null, 3.8],
            "backgroundColor": "#4db8cc"
        }))
        .unwrap();
        assert_eq!(series.data, vec![Some(1.2), None, Some(3.8)]);
        assert_eq!(series.background_color, Some(serde_json::json!("#4db8cc")));
    }
}
