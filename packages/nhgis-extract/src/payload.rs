//! Composition of validated selections into the extract request document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{DEFAULT_DESCRIPTION, WILDCARD_EXTENT};
use crate::error::{ExtractError, Result};
use crate::metadata::MetadataClient;
use crate::selection::{DatasetSelection, TimeSeriesSelection};

/// Either a validated selection or a raw wire fragment.
///
/// Raw fragments are only checked structurally; nothing is compared against
/// metadata, and composing one logs a warning.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionInput<T> {
    Typed(T),
    Raw(Map<String, Value>),
}

impl<T> SelectionInput<T> {
    /// Wrap a raw `{name: fragment}` mapping.
    #[must_use]
    pub fn raw(mapping: Map<String, Value>) -> Self {
        Self::Raw(mapping)
    }
}

impl<T> From<T> for SelectionInput<T> {
    fn from(selection: T) -> Self {
        Self::Typed(selection)
    }
}

/// Output file format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    #[default]
    CsvNoHeader,
    CsvHeader,
    FixedWidth,
}

/// How breakdowns and data types are split across files.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownLayout {
    #[default]
    SeparateFiles,
    SingleFile,
}

/// Layout of time-series tables.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum TimeSeriesLayout {
    #[default]
    TimeByColumnLayout,
    TimeByRowLayout,
    TimeByFileLayout,
}

/// Everything that goes into one extract, before composition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractRequest {
    pub datasets: Vec<SelectionInput<DatasetSelection>>,
    pub time_series_tables: Vec<SelectionInput<TimeSeriesSelection>>,
    pub shapefiles: Vec<String>,
    pub data_format: DataFormat,
    pub breakdown_and_data_type_layout: BreakdownLayout,
    pub time_series_table_layout: Option<TimeSeriesLayout>,
    pub geographic_extents: Vec<String>,
    pub description: Option<String>,
}

impl ExtractRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn dataset(mut self, dataset: impl Into<SelectionInput<DatasetSelection>>) -> Self {
        self.datasets.push(dataset.into());
        self
    }

    #[must_use]
    pub fn time_series_table(
        mut self,
        table: impl Into<SelectionInput<TimeSeriesSelection>>,
    ) -> Self {
        self.time_series_tables.push(table.into());
        self
    }

    #[must_use]
    pub fn shapefiles(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.shapefiles.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn data_format(mut self, format: DataFormat) -> Self {
        self.data_format = format;
        self
    }

    #[must_use]
    pub fn breakdown_and_data_type_layout(mut self, layout: BreakdownLayout) -> Self {
        self.breakdown_and_data_type_layout = layout;
        self
    }

    #[must_use]
    pub fn time_series_table_layout(mut self, layout: TimeSeriesLayout) -> Self {
        self.time_series_table_layout = Some(layout);
        self
    }

    #[must_use]
    pub fn geographic_extents(mut self, extents: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.geographic_extents = extents.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check requested shapefiles against the provider's list, then compose.
    pub fn compose(&self, metadata: &MetadataClient) -> Result<ExtractDocument> {
        if !self.shapefiles.is_empty() {
            validate_shapefiles(metadata, &self.shapefiles)?;
        }
        self.compose_document()
    }

    /// Compose the wire document without any network access.
    ///
    /// Shapefile names are passed through unchecked; use
    /// [`ExtractRequest::compose`] to validate them.
    pub fn compose_document(&self) -> Result<ExtractDocument> {
        let mut warnings = Vec::new();
        let mut geographic_extents = self.geographic_extents.clone();

        let mut datasets = Map::new();
        for input in &self.datasets {
            match input {
                SelectionInput::Typed(selection) => {
                    if selection.extent_required() && self.geographic_extents.is_empty() {
                        let warning = format!(
                            "Dataset {} requests geographic levels ({}) that require a geographic \
                             extent; requesting all extents ('{WILDCARD_EXTENT}')",
                            selection.name(),
                            selection.extent_levels().join(", ")
                        );
                        tracing::warn!("{warning}");
                        warnings.push(warning);
                        geographic_extents = vec![WILDCARD_EXTENT.to_string()];
                    }
                    datasets.insert(selection.name().to_string(), selection.fragment());
                }
                SelectionInput::Raw(mapping) => {
                    merge_raw("datasets", mapping, &mut datasets, &mut warnings)?;
                }
            }
        }

        let mut time_series_tables = Map::new();
        for input in &self.time_series_tables {
            match input {
                SelectionInput::Typed(selection) => {
                    time_series_tables.insert(selection.name().to_string(), selection.fragment());
                }
                SelectionInput::Raw(mapping) => {
                    merge_raw(
                        "time_series_tables",
                        mapping,
                        &mut time_series_tables,
                        &mut warnings,
                    )?;
                }
            }
        }

        let time_series_table_layout = (!time_series_tables.is_empty())
            .then(|| self.time_series_table_layout.unwrap_or_default());

        let description = self
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(DEFAULT_DESCRIPTION)
            .to_string();

        Ok(ExtractDocument {
            datasets: non_empty_map(datasets),
            time_series_tables: non_empty_map(time_series_tables),
            shapefiles: non_empty_vec(self.shapefiles.clone()),
            time_series_table_layout,
            geographic_extents: non_empty_vec(geographic_extents),
            data_format: self.data_format,
            breakdown_and_data_type_layout: self.breakdown_and_data_type_layout,
            description,
            warnings,
        })
    }
}

/// Merge a raw `{name: fragment}` mapping after a structural check.
fn merge_raw(
    field: &'static str,
    mapping: &Map<String, Value>,
    target: &mut Map<String, Value>,
    warnings: &mut Vec<String>,
) -> Result<()> {
    for (name, fragment) in mapping {
        if name.trim().is_empty() {
            return Err(ExtractError::shape(field, "raw entry has a blank name"));
        }
        if !fragment.is_object() {
            return Err(ExtractError::shape(
                field,
                format!("raw entry '{name}' must map to an object"),
            ));
        }
        target.insert(name.clone(), fragment.clone());
    }

    let warning = format!(
        "Raw {field} input is not validated against metadata; prefer typed selections"
    );
    tracing::warn!("{warning}");
    warnings.push(warning);
    Ok(())
}

fn non_empty_map(map: Map<String, Value>) -> Option<Map<String, Value>> {
    (!map.is_empty()).then_some(map)
}

fn non_empty_vec(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then_some(values)
}

/// Fail on the first shapefile name the provider does not list.
pub fn validate_shapefiles(metadata: &MetadataClient, shapefiles: &[String]) -> Result<()> {
    let supported = metadata.shapefiles()?;
    for name in shapefiles {
        if !supported.iter().any(|s| &s.name == name) {
            return Err(ExtractError::unsupported(
                "Shapefile",
                name,
                "the NHGIS shapefile listing",
            ));
        }
    }
    Ok(())
}

/// The document submitted to the extracts endpoint.
///
/// Optional keys are omitted entirely when their input was empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasets: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_series_tables: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shapefiles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_series_table_layout: Option<TimeSeriesLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geographic_extents: Option<Vec<String>>,
    pub data_format: DataFormat,
    pub breakdown_and_data_type_layout: BreakdownLayout,
    pub description: String,
    #[serde(skip)]
    warnings: Vec<String>,
}

impl ExtractDocument {
    /// Advisories raised while composing.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// The document as JSON.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
