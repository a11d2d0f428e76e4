//! Declarative extract requests read from YAML or JSON files.
//!
//! ```yaml
//! datasets:
//!   - name: 1990_STF1
//!     data_tables: [NP1]
//!     geog_levels: [state]
//! time_series_tables:
//!   - name: A00
//!     geog_levels: macro
//! shapefiles: [us_state_1990_tl2008]
//! data_format: csv_header
//! description: State population, 1990
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::metadata::MetadataClient;
use crate::payload::{BreakdownLayout, DataFormat, ExtractRequest, TimeSeriesLayout};
use crate::selection::{DatasetRequest, TimeSeriesRequest};

/// An extract request as written in a request file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestFile {
    #[serde(default)]
    pub datasets: Vec<DatasetRequest>,
    #[serde(default)]
    pub time_series_tables: Vec<TimeSeriesRequest>,
    #[serde(default)]
    pub shapefiles: Vec<String>,
    #[serde(default)]
    pub data_format: DataFormat,
    #[serde(default)]
    pub breakdown_and_data_type_layout: BreakdownLayout,
    #[serde(default)]
    pub time_series_table_layout: Option<TimeSeriesLayout>,
    #[serde(default)]
    pub geographic_extents: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RequestFile {
    /// Parse a request from YAML (JSON is valid YAML).
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Read and parse a request file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Validate every selection against fresh metadata.
    ///
    /// Stops at the first invalid selection. Shapefiles are checked later,
    /// when the request is composed.
    pub fn into_request(self, metadata: &MetadataClient) -> Result<ExtractRequest> {
        let mut request = ExtractRequest {
            shapefiles: self.shapefiles,
            data_format: self.data_format,
            breakdown_and_data_type_layout: self.breakdown_and_data_type_layout,
            time_series_table_layout: self.time_series_table_layout,
            geographic_extents: self.geographic_extents,
            description: self.description,
            ..ExtractRequest::default()
        };

        for dataset in self.datasets {
            request = request.dataset(dataset.validate(metadata)?);
        }
        for table in self.time_series_tables {
            request = request.time_series_table(table.validate(metadata)?);
        }
        Ok(request)
    }
}
