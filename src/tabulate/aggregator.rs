//! Aggregator Module
//! The single group → count → within-group proportion operation behind
//! every chart.

use polars::prelude::*;
use thiserror::Error;

pub const COUNT_COL: &str = "count";
pub const PROPORTION_COL: &str = "proportion";

#[derive(Error, Debug)]
pub enum TabulateError {
    #[error("Unknown field: {field}")]
    UnknownField { field: String },
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// One cell of a cross-tabulation: the group key, an outcome category
/// observed inside that group, and the category's within-group share.
#[derive(Debug, Clone, PartialEq)]
pub struct ProportionRow {
    pub key: Vec<String>,
    pub outcome: String,
    pub count: u32,
    pub proportion: f64,
}

/// Cross-tabulates categorical columns into within-group proportions.
pub struct Aggregator;

impl Aggregator {
    /// Count outcome categories per group and divide by the group total.
    ///
    /// Output columns: `[group_fields.., outcome_field, "count",
    /// "proportion"]`, one row per (group, outcome) pair observed in the
    /// data. Rows with a missing value in any referenced field are
    /// excluded before grouping, so they contribute to neither the counts
    /// nor the totals. Categories never observed within a group are not
    /// emitted.
    pub fn proportions(
        df: &DataFrame,
        group_fields: &[&str],
        outcome_field: &str,
    ) -> Result<DataFrame, TabulateError> {
        Self::ensure_fields(df, group_fields, outcome_field)?;

        let mut keep = col(outcome_field).is_not_null();
        for field in group_fields {
            keep = keep.and(col(*field).is_not_null());
        }

        // Group keys compare as labels whatever the source dtype
        let mut selected: Vec<Expr> = group_fields
            .iter()
            .map(|f| col(*f).cast(DataType::String))
            .collect();
        selected.push(col(outcome_field).cast(DataType::String));

        let group_exprs: Vec<Expr> = group_fields.iter().map(|f| col(*f)).collect();
        let mut key_exprs = group_exprs.clone();
        key_exprs.push(col(outcome_field));

        let group_total = if group_exprs.is_empty() {
            col(COUNT_COL).sum()
        } else {
            col(COUNT_COL).sum().over(group_exprs)
        };

        let out = df
            .clone()
            .lazy()
            .filter(keep)
            .select(selected)
            .group_by(key_exprs)
            .agg([len().alias(COUNT_COL)])
            .with_column(
                (col(COUNT_COL).cast(DataType::Float64) / group_total.cast(DataType::Float64))
                    .alias(PROPORTION_COL),
            )
            .collect()?;
        Ok(out)
    }

    /// Typed rows of [`Self::proportions`], ready for chart rendering.
    pub fn proportion_rows(
        df: &DataFrame,
        group_fields: &[&str],
        outcome_field: &str,
    ) -> Result<Vec<ProportionRow>, TabulateError> {
        let table = Self::proportions(df, group_fields, outcome_field)?;

        let mut key_cas = Vec::with_capacity(group_fields.len());
        for field in group_fields {
            key_cas.push(table.column(field)?.str()?);
        }
        let outcome_ca = table.column(outcome_field)?.str()?;
        let count_ca = table.column(COUNT_COL)?.u32()?;
        let prop_ca = table.column(PROPORTION_COL)?.f64()?;

        let mut rows = Vec::with_capacity(table.height());
        for i in 0..table.height() {
            let key: Vec<String> = key_cas
                .iter()
                .map(|ca| ca.get(i).unwrap_or("").to_string())
                .collect();
            rows.push(ProportionRow {
                key,
                outcome: outcome_ca.get(i).unwrap_or("").to_string(),
                count: count_ca.get(i).unwrap_or(0),
                proportion: prop_ca.get(i).unwrap_or(0.0),
            });
        }
        Ok(rows)
    }

    /// Reject references to columns absent from the schema before any
    /// row is scanned.
    fn ensure_fields(
        df: &DataFrame,
        group_fields: &[&str],
        outcome_field: &str,
    ) -> Result<(), TabulateError> {
        let names = df.get_column_names();
        let mut referenced: Vec<&str> = group_fields.to_vec();
        referenced.push(outcome_field);
        for field in referenced {
            if !names.iter().any(|c| c.as_str() == field) {
                return Err(TabulateError::UnknownField {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}
