//! Validated selection of one dataset's tables, levels, years and breakdowns.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::years::YearCoverage;
use super::{check_name, check_names};
use crate::error::{ExtractError, Result};
use crate::metadata::{DatasetMetadata, MetadataClient};

/// Unvalidated description of a dataset selection.
///
/// Build one in code or deserialize it from a request file, then call
/// [`DatasetRequest::validate`] to obtain a [`DatasetSelection`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRequest {
    pub name: String,
    #[serde(default)]
    pub data_tables: Vec<String>,
    #[serde(default)]
    pub geog_levels: Vec<String>,
    /// Empty means "not given".
    #[serde(default)]
    pub years: Vec<u16>,
    #[serde(default)]
    pub breakdowns: Vec<String>,
}

impl DatasetRequest {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_data_tables(mut self, tables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.data_tables = tables.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_geog_levels(mut self, levels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.geog_levels = levels.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_years(mut self, years: impl IntoIterator<Item = u16>) -> Self {
        self.years = years.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_breakdowns(
        mut self,
        breakdowns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.breakdowns = breakdowns.into_iter().map(Into::into).collect();
        self
    }

    /// Reject malformed arguments without touching the network.
    pub fn check_shape(&self) -> Result<()> {
        check_name("dataset", &self.name)?;
        check_names("data_tables", &self.data_tables)?;
        check_names("geog_levels", &self.geog_levels)?;
        check_names("breakdowns", &self.breakdowns)
    }

    /// Shape-check, fetch the dataset's metadata and validate against it.
    pub fn validate(self, metadata: &MetadataClient) -> Result<DatasetSelection> {
        self.check_shape()?;
        let dataset = metadata.dataset(&self.name)?;
        self.validate_against(&dataset)
    }

    /// Validate against an already fetched metadata document.
    pub fn validate_against(self, metadata: &DatasetMetadata) -> Result<DatasetSelection> {
        self.check_shape()?;
        let context = format!("dataset {}", metadata.name);

        for table in &self.data_tables {
            if !metadata.has_data_table(table) {
                return Err(ExtractError::unsupported("Data table", table, context));
            }
        }

        let mut extent_levels = Vec::new();
        for level in &self.geog_levels {
            let Some(level_metadata) = metadata.geog_level(level) else {
                return Err(ExtractError::unsupported("Geographic level", level, context));
            };
            if level_metadata.has_geog_extent_selection {
                tracing::warn!(
                    dataset = %metadata.name,
                    geog_level = %level,
                    "Geographic level requires a geographic extent selection; \
                     all extents are requested unless geographic_extents is set"
                );
                extent_levels.push(level.clone());
            }
        }

        let years = YearCoverage::infer(&metadata.name).resolve(&metadata.name, &self.years)?;

        if !self.breakdowns.is_empty() {
            if metadata.breakdowns.is_none() {
                return Err(ExtractError::unsupported(
                    "Breakdown",
                    self.breakdowns.join(", "),
                    format!("{context} (dataset has no breakdowns)"),
                ));
            }
            let supported: Vec<&str> = metadata.breakdown_value_names().collect();
            for breakdown in &self.breakdowns {
                if !supported.contains(&breakdown.as_str()) {
                    return Err(ExtractError::unsupported("Breakdown", breakdown, context));
                }
            }
        }

        Ok(DatasetSelection {
            name: self.name,
            data_tables: self.data_tables,
            geog_levels: self.geog_levels,
            years,
            breakdowns: self.breakdowns,
            extent_levels,
        })
    }
}

/// A dataset selection that passed validation.
///
/// Only obtainable through [`DatasetRequest::validate`]; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSelection {
    name: String,
    data_tables: Vec<String>,
    geog_levels: Vec<String>,
    years: Vec<u16>,
    breakdowns: Vec<String>,
    extent_levels: Vec<String>,
}

impl DatasetSelection {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn data_tables(&self) -> &[String] {
        &self.data_tables
    }

    #[must_use]
    pub fn geog_levels(&self) -> &[String] {
        &self.geog_levels
    }

    #[must_use]
    pub fn years(&self) -> &[u16] {
        &self.years
    }

    #[must_use]
    pub fn breakdowns(&self) -> &[String] {
        &self.breakdowns
    }

    /// Whether the request must carry a geographic extent.
    #[must_use]
    pub fn extent_required(&self) -> bool {
        !self.extent_levels.is_empty()
    }

    /// Selected levels that require a geographic extent.
    #[must_use]
    pub fn extent_levels(&self) -> &[String] {
        &self.extent_levels
    }

    /// The fragment stored under this dataset's name in the `datasets` map.
    ///
    /// Years go on the wire as strings.
    #[must_use]
    pub fn fragment(&self) -> Value {
        let years: Vec<String> = self.years.iter().map(ToString::to_string).collect();
        json!({
            "years": years,
            "breakdown_values": self.breakdowns,
            "data_tables": self.data_tables,
            "geog_levels": self.geog_levels,
        })
    }

    /// `{name: {years, breakdown_values, data_tables, geog_levels}}`.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        let mut payload = Map::new();
        payload.insert(self.name.clone(), self.fragment());
        Value::Object(payload)
    }
}

impl fmt::Display for DatasetSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let years: Vec<String> = self.years.iter().map(ToString::to_string).collect();
        write!(
            f,
            "Dataset({}, tables: {}, geographies: {}, breakdowns: {}, years: [{}])",
            self.name,
            self.data_tables.len(),
            self.geog_levels.len(),
            self.breakdowns.len(),
            years.join(", ")
        )
    }
}
