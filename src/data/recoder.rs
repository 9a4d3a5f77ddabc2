//! Recoder Module
//! Turns raw integer survey codes into labeled categorical columns and
//! restricts rows to the configured survey years.

use crate::data::codebook::{FieldRecode, RecodeMap};
use polars::prelude::*;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum RecodeError {
    #[error("Recode source column not found: {field}")]
    MissingSource { field: String },
    #[error("Recoded year column not found: {field}")]
    MissingYearField { field: String },
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Applies a `RecodeMap` to a raw survey table.
pub struct Recoder;

impl Recoder {
    /// Recode every mapped variable and drop rows outside the valid years.
    ///
    /// Pure transform: the input frame is untouched and a new frame is
    /// returned. Raw source columns are carried through, so applying the
    /// same map again recomputes identical label columns.
    pub fn apply(df: &DataFrame, map: &RecodeMap) -> Result<DataFrame, RecodeError> {
        let mut out = df.clone();
        for field in &map.fields {
            let labels = Self::recode_column(&out, field)?;
            out.with_column(labels)?;
        }
        Self::filter_years(out, map)
    }

    /// Map one column of codes through its label dictionary.
    /// Codes without an entry become missing.
    fn recode_column(df: &DataFrame, field: &FieldRecode) -> Result<Column, RecodeError> {
        let source = df
            .column(&field.source)
            .map_err(|_| RecodeError::MissingSource {
                field: field.source.clone(),
            })?;

        let codes = source.cast(&DataType::Int64)?;
        let codes = codes.i64()?;
        let mapped: Vec<Option<String>> = codes
            .into_iter()
            .map(|code| code.and_then(|c| field.labels.get(&c).cloned()))
            .collect();

        Ok(Column::new(field.target.as_str().into(), mapped))
    }

    /// Keep only rows whose recoded year label is in the allow-list.
    fn filter_years(df: DataFrame, map: &RecodeMap) -> Result<DataFrame, RecodeError> {
        let has_year = df
            .get_column_names()
            .iter()
            .any(|c| c.as_str() == map.year_field);
        if !has_year {
            return Err(RecodeError::MissingYearField {
                field: map.year_field.clone(),
            });
        }

        let before = df.height();
        let mut keep = lit(false);
        for year in &map.valid_years {
            keep = keep.or(col(&map.year_field).eq(lit(year.as_str())));
        }
        let filtered = df.lazy().filter(keep).collect()?;
        info!(
            "{} of {} rows fall within the valid survey years",
            filtered.height(),
            before
        );
        Ok(filtered)
    }
}
