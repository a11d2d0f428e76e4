//! Typed request fragments validated against provider metadata.
//!
//! A selection only exists once it has been checked: construction goes
//! through a `*Request` type whose `validate` method fetches fresh metadata
//! and fails fast on the first unsupported value.

mod dataset;
mod time_series;
mod years;

pub use dataset::{DatasetRequest, DatasetSelection};
pub use time_series::{GeogLevels, TimeSeriesRequest, TimeSeriesSelection, MACRO_KEYWORD};
pub use years::YearCoverage;

use crate::error::{ExtractError, Result};

fn check_name(field: &'static str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ExtractError::shape(field, "name must not be blank"));
    }
    Ok(())
}

fn check_names(field: &'static str, names: &[String]) -> Result<()> {
    if names.iter().any(|n| n.trim().is_empty()) {
        return Err(ExtractError::shape(field, "entries must not be blank"));
    }
    Ok(())
}
