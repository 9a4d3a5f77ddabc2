//! Codebook Module
//! Code-to-label dictionaries for the ANES cumulative-file variables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodebookError {
    #[error("Failed to read codebook file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse codebook JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Recoding instructions for a single survey variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRecode {
    /// Raw column holding integer survey codes.
    pub source: String,
    /// Column the categorical labels are written to.
    pub target: String,
    /// Codes without an entry become missing.
    pub labels: BTreeMap<i64, String>,
}

/// Full recoding configuration: per-variable label maps plus the
/// election-year restriction applied after recoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecodeMap {
    pub fields: Vec<FieldRecode>,
    /// Name of the recoded year column.
    pub year_field: String,
    /// Survey years kept after recoding; all other rows are dropped.
    pub valid_years: Vec<String>,
}

impl RecodeMap {
    /// Load a codebook from a JSON file, replacing the built-in map.
    pub fn from_json_file(path: &Path) -> Result<RecodeMap, CodebookError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    /// Target column names produced by this map.
    pub fn targets(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.target.as_str()).collect()
    }
}

fn labels(pairs: &[(i64, &str)]) -> BTreeMap<i64, String> {
    pairs
        .iter()
        .map(|(code, label)| (*code, label.to_string()))
        .collect()
}

/// The fixed variable set of the ANES cumulative time series, with labels
/// taken from the released codebook.
pub fn anes_cumulative() -> RecodeMap {
    let presidential_years: Vec<i64> = (1948..=2020).step_by(4).collect();

    let year_labels: BTreeMap<i64, String> = presidential_years
        .iter()
        .map(|y| (*y, y.to_string()))
        .collect();

    RecodeMap {
        fields: vec![
            FieldRecode {
                source: "VCF0004".to_string(),
                target: "year".to_string(),
                labels: year_labels,
            },
            FieldRecode {
                source: "VCF0104".to_string(),
                target: "gender".to_string(),
                labels: labels(&[(1, "Male"), (2, "Female"), (3, "Other")]),
            },
            FieldRecode {
                source: "VCF0105B".to_string(),
                target: "race".to_string(),
                labels: labels(&[
                    (1, "White non-Hispanic"),
                    (2, "Black non-Hispanic"),
                    (3, "Hispanic"),
                    (4, "Other or multiple races"),
                ]),
            },
            FieldRecode {
                source: "VCF0138".to_string(),
                target: "children".to_string(),
                labels: labels(&[
                    (0, "None"),
                    (1, "One"),
                    (2, "Two"),
                    (3, "Three"),
                    (4, "Four or more"),
                ]),
            },
            FieldRecode {
                source: "VCF0148a".to_string(),
                target: "social_class".to_string(),
                labels: labels(&[
                    (1, "Lower class"),
                    (2, "Average working class"),
                    (3, "Upper working class"),
                    (4, "Average middle class"),
                    (5, "Upper middle class"),
                    (6, "Upper class"),
                ]),
            },
            FieldRecode {
                source: "VCF0116".to_string(),
                target: "work_status".to_string(),
                labels: labels(&[
                    (1, "Working now"),
                    (2, "Temporarily laid off"),
                    (4, "Unemployed"),
                    (5, "Retired"),
                    (6, "Permanently disabled"),
                    (7, "Homemaker"),
                    (8, "Student"),
                ]),
            },
            FieldRecode {
                source: "VCF0702".to_string(),
                target: "turnout".to_string(),
                labels: labels(&[(1, "No, did not vote"), (2, "Yes, voted")]),
            },
            FieldRecode {
                source: "VCF0704a".to_string(),
                target: "vote_choice".to_string(),
                labels: labels(&[(1, "Democrat"), (2, "Republican")]),
            },
        ],
        year_field: "year".to_string(),
        valid_years: presidential_years.iter().map(|y| y.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anes_map_covers_analysis_variables() {
        let map = anes_cumulative();
        let targets = map.targets();
        for expected in [
            "year",
            "gender",
            "race",
            "children",
            "social_class",
            "work_status",
            "turnout",
            "vote_choice",
        ] {
            assert!(targets.contains(&expected), "missing target {expected}");
        }
        assert_eq!(map.year_field, "year");
    }

    #[test]
    fn valid_years_match_year_labels() {
        let map = anes_cumulative();
        let year = map
            .fields
            .iter()
            .find(|f| f.target == map.year_field)
            .expect("year recode present");
        for label in year.labels.values() {
            assert!(map.valid_years.contains(label));
        }
        assert_eq!(year.labels.len(), map.valid_years.len());
    }

    #[test]
    fn json_round_trip_preserves_map() {
        let map = anes_cumulative();
        let json = serde_json::to_string(&map).unwrap();
        let back: RecodeMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back.year_field, map.year_field);
        assert_eq!(back.valid_years, map.valid_years);
        assert_eq!(back.fields.len(), map.fields.len());
        assert_eq!(back.fields[0].labels, map.fields[0].labels);
    }
}
