//! Read-through access to NHGIS metadata.
//!
//! Every call issues exactly one request; nothing is cached, so a selection
//! always validates against the metadata as it is at construction time.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::Result;
use crate::http::{Endpoint, HttpTransport, Transport};

/// The metadata documents the provider publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataQuery {
    /// Summary of all datasets.
    Datasets,
    /// One dataset.
    Dataset(String),
    /// One data table of a dataset.
    DataTable { dataset: String, table: String },
    /// Summary of all time-series tables.
    TimeSeriesTables,
    /// One time-series table.
    TimeSeriesTable(String),
    /// All shapefiles.
    Shapefiles,
}

impl MetadataQuery {
    /// Endpoint serving this document.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Datasets => Endpoint::metadata(["datasets"]),
            Self::Dataset(name) => Endpoint::metadata(["datasets", name.as_str()]),
            Self::DataTable { dataset, table } => Endpoint::metadata([
                "datasets",
                dataset.as_str(),
                "data_tables",
                table.as_str(),
            ]),
            Self::TimeSeriesTables => Endpoint::metadata(["time_series_tables"]),
            Self::TimeSeriesTable(name) => {
                Endpoint::metadata(["time_series_tables", name.as_str()])
            }
            Self::Shapefiles => Endpoint::metadata(["shapefiles"]),
        }
    }
}

/// Entry of the all-datasets listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Metadata for a single dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub data_tables: Vec<DataTableSummary>,
    #[serde(default)]
    pub geog_levels: Vec<GeogLevelMetadata>,
    /// Absent when the dataset cannot be broken down.
    #[serde(default)]
    pub breakdowns: Option<Vec<BreakdownMetadata>>,
}

impl DatasetMetadata {
    /// Whether `table` is one of this dataset's data tables.
    #[must_use]
    pub fn has_data_table(&self, table: &str) -> bool {
        self.data_tables.iter().any(|t| t.name == table)
    }

    /// Look up a geographic level by name.
    #[must_use]
    pub fn geog_level(&self, name: &str) -> Option<&GeogLevelMetadata> {
        self.geog_levels.iter().find(|l| l.name == name)
    }

    /// Every breakdown value name across all breakdown groups.
    pub fn breakdown_value_names(&self) -> impl Iterator<Item = &str> {
        self.breakdowns
            .iter()
            .flatten()
            .flat_map(|b| b.breakdown_values.iter())
            .map(|v| v.name.as_str())
    }
}

/// Data table entry inside a dataset document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTableSummary {
    pub name: String,
    #[serde(default)]
    pub nhgis_code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Geographic level entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeogLevelMetadata {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Set when requests at this level must carry a geographic extent.
    #[serde(default)]
    pub has_geog_extent_selection: bool,
}

/// A named group of breakdown values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownMetadata {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub breakdown_values: Vec<BreakdownValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Metadata for a single data table of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTableMetadata {
    pub name: String,
    #[serde(default)]
    pub nhgis_code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub universe: Option<String>,
    #[serde(default)]
    pub variables: Vec<VariableMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableMetadata {
    #[serde(default)]
    pub nhgis_code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Entry of the all-time-series-tables listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesSummary {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub geographic_integration: Option<String>,
}

/// Metadata for a single time-series table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesTableMetadata {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub geographic_integration: Option<String>,
    /// Ordered coarsest first.
    #[serde(default)]
    pub geog_levels: Vec<GeogLevelMetadata>,
}

/// Shapefile entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapefileMetadata {
    pub name: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub geographic_level: Option<String>,
    #[serde(default)]
    pub extent: Option<String>,
    #[serde(default)]
    pub basis: Option<String>,
}

/// Metadata accessor.
#[derive(Clone)]
pub struct MetadataClient {
    transport: Arc<dyn Transport>,
}

impl MetadataClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Build a client backed by [`HttpTransport`].
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    /// Fetch a metadata document as raw JSON.
    pub fn fetch(&self, query: &MetadataQuery) -> Result<serde_json::Value> {
        self.fetch_as(query)
    }

    fn fetch_as<T: DeserializeOwned>(&self, query: &MetadataQuery) -> Result<T> {
        let endpoint = query.endpoint();
        tracing::debug!(%endpoint, "Fetching metadata");
        self.transport.get(&endpoint)?.into_json(&endpoint)
    }

    pub fn datasets(&self) -> Result<Vec<DatasetSummary>> {
        self.fetch_as(&MetadataQuery::Datasets)
    }

    pub fn dataset(&self, name: &str) -> Result<DatasetMetadata> {
        self.fetch_as(&MetadataQuery::Dataset(name.to_string()))
    }

    pub fn data_table(&self, dataset: &str, table: &str) -> Result<DataTableMetadata> {
        self.fetch_as(&MetadataQuery::DataTable {
            dataset: dataset.to_string(),
            table: table.to_string(),
        })
    }

    pub fn time_series_tables(&self) -> Result<Vec<TimeSeriesSummary>> {
        self.fetch_as(&MetadataQuery::TimeSeriesTables)
    }

    pub fn time_series_table(&self, name: &str) -> Result<TimeSeriesTableMetadata> {
        self.fetch_as(&MetadataQuery::TimeSeriesTable(name.to_string()))
    }

    pub fn shapefiles(&self) -> Result<Vec<ShapefileMetadata>> {
        self.fetch_as(&MetadataQuery::Shapefiles)
    }
}
