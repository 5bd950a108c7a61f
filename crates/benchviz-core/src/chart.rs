//! Chart configuration builders.
//!
//! Produces serializable Chart.js-style configuration from palettes and
//! validated datasets.

use crate::colors::ChartPalette;
use crate::datasets::{BenchmarkDataset, ChartDataset};
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Tooltip value formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipFormat {
    Microseconds,
    Bandwidth,
    #[default]
    Raw,
}

impl TooltipFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            TooltipFormat::Microseconds => format!("{} µs", value),
            TooltipFormat::Bandwidth => format!("{} GB/s", value),
            TooltipFormat::Raw => value.to_string(),
        }
    }
}

/// Options accepted by [`build_base_chart_options`].
#[derive(Debug, Clone, Default)]
pub struct ChartOptionsConfig {
    pub title: Option<String>,
    pub tooltip: TooltipFormat,
    /// Extra plugin blocks merged into `plugins` (overrides on key clash).
    pub additional_plugins: Map<String, Value>,
}

/// Build the options shared by every chart on the site.
pub fn build_base_chart_options(palette: &ChartPalette, config: &ChartOptionsConfig) -> Value {
    let mut plugins = Map::new();
    plugins.insert(
        "legend".into(),
        json!({ "labels": { "color": palette.text } }),
    );
    plugins.insert(
        "tooltip".into(),
        json!({ "callbacks": { "label": config.tooltip } }),
    );

    if let Some(title) = &config.title {
        plugins.insert(
            "title".into(),
            json!({
                "display": true,
                "text": title,
                "color": palette.text,
                "align": "start",
                "font": { "size": 14, "weight": "600" }
            }),
        );
    }

    for (name, plugin) in &config.additional_plugins {
        plugins.insert(name.clone(), plugin.clone());
    }

    json!({
        "responsive": true,
        "maintainAspectRatio": false,
        "plugins": plugins,
        "scales": {
            "x": {
                "ticks": { "color": palette.text },
                "grid": { "color": palette.grid },
                "title": { "display": false, "text": "Categories" }
            },
            "y": {
                "ticks": { "color": palette.text },
                "grid": { "color": palette.grid },
                "title": { "display": false, "text": "Values" }
            }
        }
    })
}

/// One themed series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetConfig {
    pub label: String,
    pub data: Vec<Option<f64>>,
    pub background_color: String,
    pub border_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_dash: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Labels plus themed series, ready to hand to a chart widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<DatasetConfig>,
}

pub fn create_bar_dataset(
    data: Vec<Option<f64>>,
    label: impl Into<String>,
    palette: &ChartPalette,
) -> DatasetConfig {
    DatasetConfig {
        label: label.into(),
        data,
        background_color: palette.bar_fill.to_string(),
        border_color: palette.border.to_string(),
        border_width: Some(1),
        border_dash: None,
        tension: None,
        extra: Map::new(),
    }
}

/// Line styling switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineStyle {
    pub use_accent: bool,
    pub dashed: bool,
}

pub fn create_line_dataset(
    data: Vec<Option<f64>>,
    label: impl Into<String>,
    palette: &ChartPalette,
    style: LineStyle,
) -> DatasetConfig {
    DatasetConfig {
        label: label.into(),
        data,
        background_color: "transparent".to_string(),
        border_color: if style.use_accent {
            palette.accent
        } else {
            palette.border
        }
        .to_string(),
        border_width: None,
        border_dash: style.dashed.then_some([6, 6]),
        tension: Some(0.3),
        extra: Map::new(),
    }
}

/// p50 and p95 latency lines across message sizes.
pub fn latency_chart(dataset: &BenchmarkDataset, palette: &ChartPalette) -> ChartData {
    let points = dataset.latency_by_size();
    ChartData {
        labels: points.iter().map(|p| p.size.clone()).collect(),
        datasets: vec![
            create_line_dataset(
                points.iter().map(|p| Some(p.p50)).collect(),
                "p50 latency (µs)",
                palette,
                LineStyle::default(),
            ),
            create_line_dataset(
                points.iter().map(|p| Some(p.p95)).collect(),
                "p95 latency (µs)",
                palette,
                LineStyle {
                    use_accent: true,
                    dashed: true,
                },
            ),
        ],
    }
}

/// Sustained bandwidth bars across message sizes.
pub fn bandwidth_chart(dataset: &BenchmarkDataset, palette: &ChartPalette) -> ChartData {
    let points = dataset.bandwidth_by_size();
    ChartData {
        labels: points.iter().map(|p| p.size.clone()).collect(),
        datasets: vec![create_bar_dataset(
            points.iter().map(|p| Some(p.gbps)).collect(),
            "Sustained bandwidth (GB/s)",
            palette,
        )],
    }
}

/// Theme a generic chart dataset, keeping explicit per-series colours.
pub fn themed_chart(dataset: &ChartDataset, palette: &ChartPalette) -> ChartData {
    let datasets = dataset
        .datasets
        .iter()
        .enumerate()
        .map(|(index, series)| {
            let mut config = create_bar_dataset(
                series.data.clone(),
                series.label.clone().unwrap_or_default(),
                palette,
            );
            config.border_color = palette.series_color(index).to_string();
            if let Some(Value::String(color)) = &series.background_color {
                config.background_color = color.clone();
            }
            if let Some(Value::String(color)) = &series.border_color {
                config.border_color = color.clone();
            }
            config
        })
        .collect();

    ChartData {
        labels: dataset.labels.clone(),
        datasets,
    }
}

/// Screen-reader description of a chart.
pub fn generate_accessible_description(data: Option<&ChartData>, title: &str) -> String {
    let Some(data) = data else {
        let subject = if title.is_empty() { "data" } else { title };
        return format!("Interactive chart displaying {}", subject);
    };

    let series_labels: Vec<&str> = data
        .datasets
        .iter()
        .map(|ds| ds.label.as_str())
        .filter(|label| !label.is_empty())
        .collect();

    let mut description = String::new();
    if !title.is_empty() {
        description.push_str(&format!("Chart: {}. ", title));
    }
    description.push_str(&format!("Showing {} data points", data.labels.len()));
    if data.datasets.len() > 1 {
        description.push_str(&format!(" across {} series", data.datasets.len()));
    }
    if !series_labels.is_empty() {
        description.push_str(&format!(": {}", series_labels.join(", ")));
    }

    description
}
