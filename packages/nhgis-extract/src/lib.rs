//! NHGIS Extract - Validate, compose and submit IPUMS NHGIS extract requests.
//!
//! This crate checks an extract request against the provider's published
//! metadata before anything is submitted, turns it into the document the
//! extracts endpoint expects, submits it and polls for completion.
//!
//! # Example
//!
//! ```
//! use nhgis_extract::{ExtractRequest, DataFormat};
//!
//! // An empty request still carries the default format, layout and description
//! let document = ExtractRequest::new()
//!     .data_format(DataFormat::CsvHeader)
//!     .compose_document()
//!     .unwrap();
//! assert!(document.datasets.is_none());
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants and API settings
//! - [`error`]: Error types and Result alias
//! - [`http`]: Transport trait and blocking HTTP implementation
//! - [`metadata`]: Metadata accessor and typed metadata documents
//! - [`selection`]: Dataset and time-series selections
//! - [`payload`]: Composition of selections into the extract document
//! - [`extract`]: Submission and status polling
//! - [`geography`]: Geographic extent code table
//! - [`request_file`]: Declarative requests from YAML/JSON files
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod geography;
pub mod http;
pub mod metadata;
pub mod payload;
pub mod request_file;
pub mod selection;

pub use config::ApiConfig;
pub use error::{ErrorKind, ExtractError, Result};
pub use extract::{ExtractClient, ExtractId, ExtractStatus, PollOutcome};
pub use metadata::{MetadataClient, MetadataQuery};
pub use payload::{
    BreakdownLayout, DataFormat, ExtractDocument, ExtractRequest, SelectionInput,
    TimeSeriesLayout,
};
pub use request_file::RequestFile;
pub use selection::{
    DatasetRequest, DatasetSelection, GeogLevels, TimeSeriesRequest, TimeSeriesSelection,
};
