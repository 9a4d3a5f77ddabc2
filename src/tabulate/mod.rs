//! Tabulation module - grouped proportion tables

mod aggregator;

pub use aggregator::{Aggregator, ProportionRow, TabulateError, COUNT_COL, PROPORTION_COL};
