//! Benchviz Core
//!
//! Shared vocabulary for the chart-data pipeline: the error taxonomy, schema
//! identifiers, typed dataset models, colour palettes and chart-option
//! builders. This crate has minimal dependencies and is used by every other
//! crate in the workspace.

pub mod chart;
pub mod colors;
pub mod datasets;
pub mod error;
pub mod payload;
pub mod ports;

pub use colors::{ChartPalette, ColorMode, chart_colors};
pub use datasets::{BandwidthPoint, BenchmarkDataset, ChartDataset, ChartSeries, LatencyPoint};
pub use error::{Error, Result};
pub use payload::{SchemaKind, ValidatedPayload};
