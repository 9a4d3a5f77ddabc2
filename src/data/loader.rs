//! Data Loader Module
//! Handles raw-export loading and recoded-table caching using Polars.

use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load data: {0}")]
    Polars(#[from] PolarsError),
    #[error("Failed to access file: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads the raw survey export and snapshots the recoded table.
pub struct DataLoader;

impl DataLoader {
    /// Load a raw CSV export using Polars.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        // Use lazy evaluation for memory efficiency, then collect
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;
        Ok(df)
    }

    /// Write the recoded table to an IPC snapshot.
    ///
    /// The snapshot is a pure cache: deleting it and recoding again
    /// reproduces a table with identical schema and contents.
    pub fn write_cache(df: &DataFrame, path: &Path) -> Result<(), LoaderError> {
        let mut snapshot = df.clone();
        let mut file = File::create(path)?;
        IpcWriter::new(&mut file).finish(&mut snapshot)?;
        Ok(())
    }

    /// Reload a previously written IPC snapshot.
    pub fn read_cache(path: &Path) -> Result<DataFrame, LoaderError> {
        let file = File::open(path)?;
        Ok(IpcReader::new(file).finish()?)
    }
}
