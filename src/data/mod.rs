//! Data module - loading, codebook and recoding

pub mod codebook;
mod loader;
mod recoder;

pub use codebook::{CodebookError, FieldRecode, RecodeMap};
pub use loader::{DataLoader, LoaderError};
pub use recoder::{RecodeError, Recoder};
