//! Chart Renderer Module
//! Renders grouped proportion tables as static PNG charts: stacked bars
//! faceted by the leading group dimensions, and pie grids with one pie
//! per group.

use crate::tabulate::ProportionRow;
use plotters::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

const CHART_WIDTH: u32 = 1200;
const FACET_ROW_HEIGHT: u32 = 360;
const TITLE_HEIGHT: u32 = 40;
const MAX_GRID_COLS: usize = 3;

/// Color palette for outcome categories
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(52, 152, 219),  // Blue
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Nothing to chart")]
    NoData,
    #[error("Failed to render chart: {0}")]
    Backend(String),
}

impl ChartError {
    fn backend(e: impl std::fmt::Display) -> ChartError {
        ChartError::Backend(e.to_string())
    }
}

/// One facet panel of a stacked bar chart.
#[derive(Debug, PartialEq)]
struct FacetBars {
    label: String,
    bars: Vec<BarStack>,
}

/// One bar: the trailing group value and its outcome shares.
#[derive(Debug, PartialEq)]
struct BarStack {
    label: String,
    segments: Vec<(String, f64)>,
}

/// Creates static chart images from proportion rows.
pub struct ChartRenderer;

impl ChartRenderer {
    /// Render a stacked-proportion bar chart.
    ///
    /// The leading group-key elements select the facet panel, the last
    /// element is the bar on the x axis, and each outcome category is one
    /// stacked segment.
    pub fn stacked_bar_chart(
        rows: &[ProportionRow],
        title: &str,
        out_path: &Path,
    ) -> Result<(), ChartError> {
        if rows.is_empty() {
            return Err(ChartError::NoData);
        }

        let outcomes = Self::outcome_order(rows);
        let facets = Self::facet_bars(rows);
        let (grid_rows, grid_cols) = Self::grid_dims(facets.len());
        let height = TITLE_HEIGHT + grid_rows as u32 * FACET_ROW_HEIGHT;

        let root = BitMapBackend::new(out_path, (CHART_WIDTH, height)).into_drawing_area();
        root.fill(&WHITE).map_err(ChartError::backend)?;
        let body = root
            .titled(title, ("sans-serif", 24))
            .map_err(ChartError::backend)?;
        let panels = body.split_evenly((grid_rows, grid_cols));

        for (panel, facet) in panels.iter().zip(&facets) {
            let n = facet.bars.len();
            let mut chart = ChartBuilder::on(panel)
                .caption(&facet.label, ("sans-serif", 15))
                .margin(8)
                .x_label_area_size(32)
                .y_label_area_size(40)
                .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0.0f64..1.0f64)
                .map_err(ChartError::backend)?;

            let bar_labels: Vec<String> = facet.bars.iter().map(|b| b.label.clone()).collect();
            let formatter = |x: &f64| {
                let idx = x.round() as i64;
                if idx >= 0 && (idx as usize) < bar_labels.len() {
                    bar_labels[idx as usize].clone()
                } else {
                    String::new()
                }
            };
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(n)
                .x_label_formatter(&formatter)
                .y_desc("Share of group")
                .draw()
                .map_err(ChartError::backend)?;

            let mut labeled: HashSet<usize> = HashSet::new();
            for (i, bar) in facet.bars.iter().enumerate() {
                let ordered: Vec<(usize, f64)> = outcomes
                    .iter()
                    .enumerate()
                    .filter_map(|(slot, outcome)| {
                        bar.segments
                            .iter()
                            .find(|(o, _)| o == outcome)
                            .map(|(_, p)| (slot, *p))
                    })
                    .collect();
                let spans =
                    Self::stack_spans(&ordered.iter().map(|(_, p)| *p).collect::<Vec<_>>());

                for ((slot, _), (y0, y1)) in ordered.iter().zip(&spans) {
                    let color = PALETTE[slot % PALETTE.len()];
                    let series = chart
                        .draw_series(std::iter::once(Rectangle::new(
                            [(i as f64 - 0.4, *y0), (i as f64 + 0.4, *y1)],
                            color.filled(),
                        )))
                        .map_err(ChartError::backend)?;
                    if labeled.insert(*slot) {
                        series.label(outcomes[*slot].as_str()).legend(move |(x, y)| {
                            Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                        });
                    }
                }
            }

            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(ChartError::backend)?;
        }

        root.present().map_err(ChartError::backend)?;
        debug!("wrote stacked bar chart to {}", out_path.display());
        Ok(())
    }

    /// Render a pie-chart grid: one pie per full group key, slices sized
    /// by the outcome proportions.
    pub fn pie_chart_grid(
        rows: &[ProportionRow],
        title: &str,
        out_path: &Path,
    ) -> Result<(), ChartError> {
        if rows.is_empty() {
            return Err(ChartError::NoData);
        }

        let outcomes = Self::outcome_order(rows);
        let pies = Self::pie_slices(rows);
        let (grid_rows, grid_cols) = Self::grid_dims(pies.len());
        let height = TITLE_HEIGHT + grid_rows as u32 * FACET_ROW_HEIGHT;

        let root = BitMapBackend::new(out_path, (CHART_WIDTH, height)).into_drawing_area();
        root.fill(&WHITE).map_err(ChartError::backend)?;
        let body = root
            .titled(title, ("sans-serif", 24))
            .map_err(ChartError::backend)?;
        let panels = body.split_evenly((grid_rows, grid_cols));

        for (panel, (label, slices)) in panels.iter().zip(&pies) {
            let panel = panel
                .titled(label, ("sans-serif", 15))
                .map_err(ChartError::backend)?;
            let (w, h) = panel.dim_in_pixel();
            let center = (w as i32 / 2, h as i32 / 2);
            let radius = (w.min(h) as f64 / 2.0 - 40.0).max(10.0);

            let sizes: Vec<f64> = slices.iter().map(|(_, p)| *p).collect();
            let labels: Vec<String> = slices.iter().map(|(o, _)| o.clone()).collect();
            let colors: Vec<RGBColor> = slices
                .iter()
                .map(|(o, _)| {
                    let slot = outcomes.iter().position(|c| c == o).unwrap_or(0);
                    PALETTE[slot % PALETTE.len()]
                })
                .collect();

            let pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            panel.draw(&pie).map_err(ChartError::backend)?;
        }

        root.present().map_err(ChartError::backend)?;
        debug!("wrote pie chart grid to {}", out_path.display());
        Ok(())
    }

    /// Distinct outcome categories in a stable order; the index doubles
    /// as the palette slot.
    fn outcome_order(rows: &[ProportionRow]) -> Vec<String> {
        let set: BTreeSet<String> = rows.iter().map(|r| r.outcome.clone()).collect();
        set.into_iter().collect()
    }

    /// Partition rows into facet panels keyed by the group-key prefix,
    /// with one bar per trailing key element.
    fn facet_bars(rows: &[ProportionRow]) -> Vec<FacetBars> {
        let mut map: BTreeMap<String, BTreeMap<String, Vec<(String, f64)>>> = BTreeMap::new();
        for row in rows {
            let split = row.key.len().saturating_sub(1);
            let facet_label = row.key[..split].join(" / ");
            let bar_label = row.key.get(split).cloned().unwrap_or_default();
            map.entry(facet_label)
                .or_default()
                .entry(bar_label)
                .or_default()
                .push((row.outcome.clone(), row.proportion));
        }

        map.into_iter()
            .map(|(label, bars)| FacetBars {
                label,
                bars: bars
                    .into_iter()
                    .map(|(label, segments)| BarStack { label, segments })
                    .collect(),
            })
            .collect()
    }

    /// One pie per full group key.
    fn pie_slices(rows: &[ProportionRow]) -> Vec<(String, Vec<(String, f64)>)> {
        let mut map: BTreeMap<String, Vec<(String, f64)>> = BTreeMap::new();
        for row in rows {
            map.entry(row.key.join(" / "))
                .or_default()
                .push((row.outcome.clone(), row.proportion));
        }
        map.into_iter().collect()
    }

    /// Cumulative [start, end) spans for stacked segments.
    fn stack_spans(proportions: &[f64]) -> Vec<(f64, f64)> {
        let mut spans = Vec::with_capacity(proportions.len());
        let mut cursor = 0.0;
        for p in proportions {
            spans.push((cursor, cursor + p));
            cursor += p;
        }
        spans
    }

    /// Facet grid shape: up to three panels per row.
    fn grid_dims(n: usize) -> (usize, usize) {
        let cols = n.clamp(1, MAX_GRID_COLS);
        let rows = n.div_ceil(cols).max(1);
        (rows, cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &[&str], outcome: &str, proportion: f64) -> ProportionRow {
        ProportionRow {
            key: key.iter().map(|k| k.to_string()).collect(),
            outcome: outcome.to_string(),
            count: 1,
            proportion,
        }
    }

    #[test]
    fn stack_spans_are_cumulative() {
        let spans = ChartRenderer::stack_spans(&[0.5, 0.3, 0.2]);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0], (0.0, 0.5));
        assert!((spans[1].0 - 0.5).abs() < 1e-12);
        assert!((spans[1].1 - 0.8).abs() < 1e-12);
        assert!((spans[2].1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn facets_split_on_key_prefix() {
        let rows = vec![
            row(&["White", "1952"], "Voted", 0.6),
            row(&["White", "1952"], "Not Voted", 0.4),
            row(&["White", "1956"], "Voted", 1.0),
            row(&["Black", "1952"], "Voted", 1.0),
        ];
        let facets = ChartRenderer::facet_bars(&rows);

        assert_eq!(facets.len(), 2);
        assert_eq!(facets[0].label, "Black");
        assert_eq!(facets[0].bars.len(), 1);
        assert_eq!(facets[1].label, "White");
        assert_eq!(facets[1].bars.len(), 2);
        assert_eq!(facets[1].bars[0].label, "1952");
        assert_eq!(facets[1].bars[0].segments.len(), 2);
    }

    #[test]
    fn single_level_keys_make_one_unlabeled_facet() {
        let rows = vec![
            row(&["1952"], "Voted", 0.7),
            row(&["1956"], "Voted", 0.8),
        ];
        let facets = ChartRenderer::facet_bars(&rows);
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].label, "");
        assert_eq!(facets[0].bars.len(), 2);
    }

    #[test]
    fn pie_slices_key_on_the_full_group() {
        let rows = vec![
            row(&["1952", "Male"], "Democrat", 0.5),
            row(&["1952", "Male"], "Republican", 0.5),
            row(&["1952", "Female"], "Democrat", 1.0),
        ];
        let pies = ChartRenderer::pie_slices(&rows);
        assert_eq!(pies.len(), 2);
        assert_eq!(pies[0].0, "1952 / Female");
        assert_eq!(pies[1].0, "1952 / Male");
        assert_eq!(pies[1].1.len(), 2);
    }

    #[test]
    fn grid_caps_columns_at_three() {
        assert_eq!(ChartRenderer::grid_dims(1), (1, 1));
        assert_eq!(ChartRenderer::grid_dims(3), (1, 3));
        assert_eq!(ChartRenderer::grid_dims(4), (2, 3));
        assert_eq!(ChartRenderer::grid_dims(7), (3, 3));
    }

    #[test]
    fn outcome_order_is_stable_across_rows() {
        let rows = vec![
            row(&["1952"], "Voted", 0.7),
            row(&["1952"], "Not Voted", 0.3),
            row(&["1956"], "Not Voted", 0.2),
        ];
        assert_eq!(
            ChartRenderer::outcome_order(&rows),
            vec!["Not Voted".to_string(), "Voted".to_string()]
        );
    }
}
