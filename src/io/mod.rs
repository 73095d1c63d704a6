//! Reading and writing graphs and multi-factors.
pub mod factor_reader;
pub mod lgf;
pub mod reader;
pub mod writer;

pub use factor_reader::MultiFactorReader;
pub use reader::WeightedGraphReader;
pub use writer::{GraphFormat, WeightedGraphWriter};

use crate::error::{HostError, Result};
use std::path::Path;

pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| HostError::Io { path: path.display().to_string(), source })
}
