// =============================================================================
// Chart Export — three time-aligned panels per pair
// =============================================================================
//
// Panels:
//   1. price     close, EMA(fast), EMA(slow), buy markers
//   2. macd      macd, signal, histogram, zero line
//   3. stochrsi  stochrsi, reference lines at 80 and 20
//
// Every line has one value per timestamp (`null` where undefined), so any
// plotting frontend can draw the panels on a shared x axis. Files are written
// to `<plot_dir>/<PAIR>.json` with a tmp-then-rename so readers never see a
// partial chart.
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::analysis::AnalyzedSeries;
use crate::indicators::Column;
use crate::market_data::closes;
use crate::runtime_config::IndicatorParams;
use crate::types::Pair;

const STOCHRSI_UPPER_BAND: f64 = 80.0;
const STOCHRSI_LOWER_BAND: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Line,
    Markers,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartLine {
    pub label: String,
    pub style: LineStyle,
    pub values: Column,
}

impl ChartLine {
    fn line(label: impl Into<String>, values: Column) -> Self {
        Self {
            label: label.into(),
            style: LineStyle::Line,
            values,
        }
    }

    fn markers(label: impl Into<String>, values: Column) -> Self {
        Self {
            label: label.into(),
            style: LineStyle::Markers,
            values,
        }
    }

    fn constant(label: impl Into<String>, value: f64, len: usize) -> Self {
        Self::line(label, vec![Some(value); len])
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartPanel {
    pub title: &'static str,
    pub lines: Vec<ChartLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub pair: Pair,
    pub generated_at: DateTime<Utc>,
    pub timestamps: Vec<DateTime<Utc>>,
    pub panels: Vec<ChartPanel>,
}

/// Lay out `series` as the three chart panels.
pub fn build_chart(pair: &Pair, series: &AnalyzedSeries, params: &IndicatorParams) -> Chart {
    let len = series.len();
    let ind = &series.indicators;

    let price = ChartPanel {
        title: "price",
        lines: vec![
            ChartLine::line("close", closes(&series.candles).into_iter().map(Some).collect()),
            ChartLine::line(format!("EMA({})", params.ema_fast), ind.ema_fast.clone()),
            ChartLine::line(format!("EMA({})", params.ema_slow), ind.ema_slow.clone()),
            ChartLine::markers("buy", series.buy_price.clone()),
        ],
    };

    let macd = ChartPanel {
        title: "macd",
        lines: vec![
            ChartLine::line("MACD", ind.macd.clone()),
            ChartLine::line("MACDS", ind.macds.clone()),
            ChartLine::line("MACD Histogram", ind.macdh.clone()),
            ChartLine::constant("zero", 0.0, len),
        ],
    };

    let stochrsi = ChartPanel {
        title: "stochrsi",
        lines: vec![
            ChartLine::line("StochRSI", ind.stochrsi.clone()),
            ChartLine::constant("overbought", STOCHRSI_UPPER_BAND, len),
            ChartLine::constant("oversold", STOCHRSI_LOWER_BAND, len),
        ],
    };

    Chart {
        pair: pair.clone(),
        generated_at: Utc::now(),
        timestamps: series.candles.iter().map(|c| c.timestamp).collect(),
        panels: vec![price, macd, stochrsi],
    }
}

/// Path of the chart file for `pair` inside `dir`.
pub fn chart_path(dir: &Path, pair: &Pair) -> PathBuf {
    dir.join(format!("{}.json", pair.as_str()))
}

/// Build and write the chart for `pair`, returning the file path.
pub fn export_chart(
    dir: &Path,
    pair: &Pair,
    series: &AnalyzedSeries,
    params: &IndicatorParams,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create plot dir {}", dir.display()))?;

    let chart = build_chart(pair, series, params);
    let content = serde_json::to_string(&chart).context("failed to serialise chart to JSON")?;

    let path = chart_path(dir, pair);
    let tmp_path = path.with_extension("json.tmp");

    std::fs::write(&tmp_path, &content)
        .with_context(|| format!("failed to write tmp chart to {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, &path)
        .with_context(|| format!("failed to rename tmp chart to {}", path.display()))?;

    info!(pair = %pair, path = %path.display(), points = series.len(), "chart exported");
    Ok(path)
}
