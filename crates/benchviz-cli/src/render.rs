//! Output rendering for fetched payloads.

use crate::config::OutputFormat;
use benchviz_core::chart::{
    ChartData, ChartOptionsConfig, TooltipFormat, bandwidth_chart, build_base_chart_options,
    generate_accessible_description, latency_chart, themed_chart,
};
use benchviz_core::{BenchmarkDataset, ChartDataset, ColorMode, SchemaKind, ValidatedPayload, chart_colors};
use serde_json::{Value, json};
use std::fmt::Write;

pub fn render_payload(
    payload: &ValidatedPayload,
    format: OutputFormat,
    theme: ColorMode,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(payload.value())?,
        OutputFormat::Yaml => serde_yaml::to_string(payload.value())?,
        OutputFormat::Table => match payload.kind() {
            SchemaKind::Benchmark => benchmark_table(&payload.as_benchmark()?),
            SchemaKind::Chart => chart_table(&payload.as_chart()?),
        },
        OutputFormat::Chart => serde_json::to_string_pretty(&chart_config(payload, theme)?)?,
    };
    Ok(output)
}

fn benchmark_table(dataset: &BenchmarkDataset) -> String {
    let mut out = String::new();

    let rows = dataset.summary_rows();
    let width = rows.iter().map(|r| r.label.len()).max().unwrap_or(0);
    for row in &rows {
        let _ = writeln!(out, "{:<width$}  {}", row.label, row.value, width = width);
    }

    let latency = dataset.latency_by_size();
    if !latency.is_empty() {
        let _ = writeln!(out, "\nLatency");
        let _ = writeln!(out, "  {:<8} {:>14} {:>14}", "size", "p50", "p95");
        for point in latency {
            let _ = writeln!(
                out,
                "  {:<8} {:>14} {:>14}",
                point.size,
                TooltipFormat::Microseconds.format(point.p50),
                TooltipFormat::Microseconds.format(point.p95)
            );
        }
    }

    let bandwidth = dataset.bandwidth_by_size();
    if !bandwidth.is_empty() {
        let _ = writeln!(out, "\nBandwidth");
        let _ = writeln!(out, "  {:<8} {:>14}", "size", "sustained");
        for point in bandwidth {
            let _ = writeln!(
                out,
                "  {:<8} {:>14}",
                point.size,
                TooltipFormat::Bandwidth.format(point.gbps)
            );
        }
    }

    out
}

fn chart_table(dataset: &ChartDataset) -> String {
    let mut out = String::new();

    let mut header = format!("{:<12}", "label");
    for (index, series) in dataset.datasets.iter().enumerate() {
        let name = series
            .label
            .clone()
            .unwrap_or_else(|| format!("series {}", index + 1));
        let _ = write!(header, " {:>12}", name);
    }
    let _ = writeln!(out, "{}", header.trim_end());

    for (row, label) in dataset.labels.iter().enumerate() {
        let mut line = format!("{:<12}", label);
        for series in &dataset.datasets {
            let cell = match series.data.get(row).copied().flatten() {
                Some(value) => value.to_string(),
                None => "-".to_string(),
            };
            let _ = write!(line, " {:>12}", cell);
        }
        let _ = writeln!(out, "{}", line.trim_end());
    }

    out
}

fn chart_block(
    data: ChartData,
    title: &str,
    tooltip: TooltipFormat,
    theme: ColorMode,
) -> Result<Value, serde_json::Error> {
    let options = build_base_chart_options(
        chart_colors(theme),
        &ChartOptionsConfig {
            title: (!title.is_empty()).then(|| title.to_string()),
            tooltip,
            ..Default::default()
        },
    );
    let description = generate_accessible_description(Some(&data), title);
    Ok(json!({
        "description": description,
        "data": serde_json::to_value(&data)?,
        "options": options,
    }))
}

/// Themed chart configuration for every chart the payload feeds.
pub fn chart_config(
    payload: &ValidatedPayload,
    theme: ColorMode,
) -> Result<Value, Box<dyn std::error::Error>> {
    let palette = chart_colors(theme);
    let config = match payload.kind() {
        SchemaKind::Benchmark => {
            let dataset = payload.as_benchmark()?;
            json!({
                "latency": chart_block(
                    latency_chart(&dataset, palette),
                    "Latency by message size",
                    TooltipFormat::Microseconds,
                    theme,
                )?,
                "bandwidth": chart_block(
                    bandwidth_chart(&dataset, palette),
                    "Bandwidth by message size",
                    TooltipFormat::Bandwidth,
                    theme,
                )?,
            })
        }
        SchemaKind::Chart => {
            let dataset = payload.as_chart()?;
            json!({
                "chart": chart_block(themed_chart(&dataset, palette), "", TooltipFormat::Raw, theme)?,
            })
        }
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn benchmark_payload() -> ValidatedPayload {
        ValidatedPayload::new(
            SchemaKind::Benchmark,
            json!({
                "cluster": "atlas",
                "nodes": 4096,
                "fabric": "InfiniBand NDR",
                "latency_us": [
                    { "size": "1MB", "p50": 210.0, "p95": 260.5 },
                    { "size": "8B", "p50": 1.9, "p95": 2.4 }
                ],
                "bandwidth_gbps": [{ "size": "1GB", "gbps": 391.7 }]
            }),
        )
    }

    #[test]
    fn test_benchmark_table() {
        let out = render_payload(&benchmark_payload(), OutputFormat::Table, ColorMode::Light).unwrap();

        assert!(out.starts_with("System   atlas\n"));
        assert!(out.contains("Nodes    4096"));
        assert!(out.contains("Network  InfiniBand NDR"));
        assert!(out.contains("1.9 µs"));
        assert!(out.contains("391.7 GB/s"));
        // Sizes are listed smallest first.
        assert!(out.find("8B").unwrap() < out.find("1MB").unwrap());
    }

    #[test]
    fn test_chart_table() {
        let payload = ValidatedPayload::new(
            SchemaKind::Chart,
            json!({
                "labels": ["8B", "64KB"],
                "datasets": [{ "label": "p50", "data": [1.5, null] }]
            }),
        );
        let out = render_payload(&payload, OutputFormat::Table, ColorMode::Light).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("label"));
        assert!(lines[0].ends_with("p50"));
        assert!(lines[1].ends_with("1.5"));
        assert!(lines[2].ends_with("-"));
    }

    #[test]
    fn test_json_output_is_payload() {
        let payload = benchmark_payload();
        let out = render_payload(&payload, OutputFormat::Json, ColorMode::Light).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(&parsed, payload.value());
    }

    #[test]
    fn test_benchmark_chart_config() {
        let config = chart_config(&benchmark_payload(), ColorMode::Dark).unwrap();

        let latency = &config["latency"];
        assert_eq!(latency["data"]["labels"], json!(["8B", "1MB"]));
        assert_eq!(latency["data"]["datasets"][1]["borderDash"], json!([6, 6]));
        assert_eq!(latency["options"]["plugins"]["legend"]["labels"]["color"], "#e0f0f5");
        assert!(
            latency["description"]
                .as_str()
                .unwrap()
                .starts_with("Chart: Latency by message size.")
        );
        assert_eq!(config["bandwidth"]["data"]["datasets"][0]["data"], json!([391.7]));
    }

    #[test]
    fn test_chart_config_for_generic_chart() {
        let payload = ValidatedPayload::new(
            SchemaKind::Chart,
            json!({ "labels": ["a"], "datasets": [{ "label": "s", "data": [1.0] }] }),
        );
        let config = chart_config(&payload, ColorMode::Light).unwrap();
        assert_eq!(config["chart"]["data"]["labels"], json!(["a"]));
        assert!(config.get("latency").is_none());
    }
}
