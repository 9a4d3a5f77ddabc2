//! Analysis Module
//! The catalog of cross-tabulation charts and the loop that renders them.

use crate::charts::ChartRenderer;
use crate::tabulate::Aggregator;
use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    StackedBar,
    PieGrid,
}

/// One chart: which dimensions partition the table, which outcome is
/// counted, and how the result is drawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSpec {
    pub name: String,
    pub title: String,
    pub group_fields: Vec<String>,
    pub outcome: String,
    pub chart: ChartKind,
}

impl AnalysisSpec {
    fn new(name: &str, title: &str, group_fields: &[&str], outcome: &str, chart: ChartKind) -> Self {
        AnalysisSpec {
            name: name.to_string(),
            title: title.to_string(),
            group_fields: group_fields.iter().map(|f| f.to_string()).collect(),
            outcome: outcome.to_string(),
            chart,
        }
    }
}

/// The chart sequence: turnout, then vote choice, cut by demographic and
/// socioeconomic factors.
pub fn default_catalog() -> Vec<AnalysisSpec> {
    vec![
        AnalysisSpec::new(
            "turnout_by_race",
            "Voter turnout by election year and race",
            &["race", "year"],
            "turnout",
            ChartKind::StackedBar,
        ),
        AnalysisSpec::new(
            "turnout_by_gender",
            "Voter turnout by election year and gender",
            &["gender", "year"],
            "turnout",
            ChartKind::StackedBar,
        ),
        AnalysisSpec::new(
            "turnout_by_children",
            "Voter turnout by number of children at home",
            &["children"],
            "turnout",
            ChartKind::StackedBar,
        ),
        AnalysisSpec::new(
            "turnout_by_work_class_children",
            "Voter turnout by work status, social class and children",
            &["work_status", "social_class", "children"],
            "turnout",
            ChartKind::StackedBar,
        ),
        AnalysisSpec::new(
            "vote_choice_by_race",
            "Two-party presidential vote by election year and race",
            &["race", "year"],
            "vote_choice",
            ChartKind::StackedBar,
        ),
        AnalysisSpec::new(
            "vote_choice_by_class",
            "Two-party presidential vote by social class",
            &["social_class"],
            "vote_choice",
            ChartKind::PieGrid,
        ),
        AnalysisSpec::new(
            "vote_choice_by_gender",
            "Two-party presidential vote by gender",
            &["gender"],
            "vote_choice",
            ChartKind::PieGrid,
        ),
    ]
}

/// Aggregate and render every chart in the catalog.
pub fn run(df: &DataFrame, catalog: &[AnalysisSpec], out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)?;

    for spec in catalog {
        let group_refs: Vec<&str> = spec.group_fields.iter().map(String::as_str).collect();
        let rows = Aggregator::proportion_rows(df, &group_refs, &spec.outcome)
            .with_context(|| format!("aggregating {}", spec.name))?;
        if rows.is_empty() {
            warn!("no observations for {}, skipping chart", spec.name);
            continue;
        }

        let path = out_dir.join(format!("{}.png", spec.name));
        match spec.chart {
            ChartKind::StackedBar => ChartRenderer::stacked_bar_chart(&rows, &spec.title, &path)
                .with_context(|| format!("rendering {}", spec.name))?,
            ChartKind::PieGrid => ChartRenderer::pie_chart_grid(&rows, &spec.title, &path)
                .with_context(|| format!("rendering {}", spec.name))?,
        }
        info!("rendered {} ({} cells) → {}", spec.name, rows.len(), path.display());
    }
    Ok(())
}
