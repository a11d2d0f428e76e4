//! Validated selection of one time-series table's geographic levels.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{check_name, check_names};
use crate::error::{ExtractError, Result};
use crate::metadata::{MetadataClient, TimeSeriesTableMetadata};

/// Keyword selecting the coarsest level a table offers.
pub const MACRO_KEYWORD: &str = "macro";

/// Geographic levels requested for a time-series table.
///
/// Deserializes from either a keyword string or a list of level names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeogLevels {
    /// Only [`MACRO_KEYWORD`] is accepted.
    Keyword(String),
    Levels(Vec<String>),
}

impl GeogLevels {
    /// The `"macro"` shorthand.
    #[must_use]
    pub fn macro_level() -> Self {
        Self::Keyword(MACRO_KEYWORD.to_string())
    }

    #[must_use]
    pub fn levels(levels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Levels(levels.into_iter().map(Into::into).collect())
    }
}

impl Default for GeogLevels {
    fn default() -> Self {
        Self::macro_level()
    }
}

/// Unvalidated description of a time-series table selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesRequest {
    pub name: String,
    #[serde(default)]
    pub geog_levels: GeogLevels,
}

impl TimeSeriesRequest {
    /// Request `name` at the macro level.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geog_levels: GeogLevels::default(),
        }
    }

    #[must_use]
    pub fn with_geog_levels(mut self, geog_levels: GeogLevels) -> Self {
        self.geog_levels = geog_levels;
        self
    }

    /// Reject malformed arguments without touching the network.
    pub fn check_shape(&self) -> Result<()> {
        check_name("data_table", &self.name)?;
        match &self.geog_levels {
            GeogLevels::Keyword(keyword) if keyword == MACRO_KEYWORD => Ok(()),
            GeogLevels::Keyword(keyword) => Err(ExtractError::shape(
                "geog_levels",
                format!("expected \"{MACRO_KEYWORD}\" or a list of levels, got \"{keyword}\""),
            )),
            GeogLevels::Levels(levels) if levels.is_empty() => Err(ExtractError::shape(
                "geog_levels",
                "at least one geographic level is required",
            )),
            GeogLevels::Levels(levels) => check_names("geog_levels", levels),
        }
    }

    /// Shape-check, fetch the table's metadata and validate against it.
    pub fn validate(self, metadata: &MetadataClient) -> Result<TimeSeriesSelection> {
        self.check_shape()?;
        let table = metadata.time_series_table(&self.name)?;
        self.validate_against(&table)
    }

    /// Validate against an already fetched metadata document.
    pub fn validate_against(self, metadata: &TimeSeriesTableMetadata) -> Result<TimeSeriesSelection> {
        self.check_shape()?;

        let geog_levels = match self.geog_levels {
            GeogLevels::Keyword(_) => {
                let coarsest = metadata.geog_levels.first().ok_or_else(|| {
                    ExtractError::InvalidResponse {
                        endpoint: format!("time series table {}", metadata.name),
                        message: "no geographic levels listed".to_string(),
                    }
                })?;
                vec![coarsest.name.clone()]
            }
            GeogLevels::Levels(levels) => {
                if let Some(level) = levels
                    .iter()
                    .find(|l| !metadata.geog_levels.iter().any(|m| &m.name == *l))
                {
                    return Err(ExtractError::unsupported(
                        "Geographic level",
                        level,
                        format!("time series table {}", metadata.name),
                    ));
                }
                levels
            }
        };

        Ok(TimeSeriesSelection {
            name: self.name,
            geog_levels,
        })
    }
}

/// A time-series table selection that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesSelection {
    name: String,
    geog_levels: Vec<String>,
}

impl TimeSeriesSelection {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn geog_levels(&self) -> &[String] {
        &self.geog_levels
    }

    #[must_use]
    pub fn fragment(&self) -> Value {
        json!({ "geog_levels": self.geog_levels })
    }

    /// `{name: {geog_levels}}`.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        let mut payload = Map::new();
        payload.insert(self.name.clone(), self.fragment());
        Value::Object(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::http::test_support::MockTransport;
    use crate::metadata::MetadataQuery;
    use std::sync::Arc;

    fn metadata() -> TimeSeriesTableMetadata {
        serde_json::from_value(json!({
            "name": "A00",
            "geog_levels": [{"name": "nation"}, {"name": "state"}, {"name": "county"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_macro_selects_first_level() {
        let selection = TimeSeriesRequest::new("A00")
            .validate_against(&metadata())
            .unwrap();
        assert_eq!(selection.geog_levels(), ["nation".to_string()]);
    }

    #[test]
    fn test_explicit_levels_validated() {
        let selection = TimeSeriesRequest::new("A00")
            .with_geog_levels(GeogLevels::levels(["state", "county"]))
            .validate_against(&metadata())
            .unwrap();
        assert_eq!(selection.geog_levels().len(), 2);

        let err = TimeSeriesRequest::new("A00")
            .with_geog_levels(GeogLevels::levels(["tract"]))
            .validate_against(&metadata())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedValue);
        assert!(err.to_string().contains("tract"));
    }

    #[test]
    fn test_unknown_keyword_is_shape_error() {
        let err = TimeSeriesRequest::new("A00")
            .with_geog_levels(GeogLevels::Keyword("micro".into()))
            .validate_against(&metadata())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
    }

    #[test]
    fn test_deserialize_keyword_or_list() {
        let keyword: TimeSeriesRequest =
            serde_json::from_value(json!({"name": "A00", "geog_levels": "macro"})).unwrap();
        assert_eq!(keyword.geog_levels, GeogLevels::macro_level());

        let list: TimeSeriesRequest =
            serde_json::from_value(json!({"name": "A00", "geog_levels": ["state"]})).unwrap();
        assert_eq!(list.geog_levels, GeogLevels::levels(["state"]));

        let default: TimeSeriesRequest = serde_json::from_value(json!({"name": "A00"})).unwrap();
        assert_eq!(default.geog_levels, GeogLevels::macro_level());
    }

    #[test]
    fn test_validate_fetches_table_metadata() {
        let transport = Arc::new(MockTransport::new().with_json(
            &MetadataQuery::TimeSeriesTable("A00".into()).endpoint(),
            serde_json::to_value(metadata()).unwrap(),
        ));
        let client = MetadataClient::new(transport.clone());

        let selection = TimeSeriesRequest::new("A00").validate(&client).unwrap();
        assert_eq!(
            selection.to_payload(),
            json!({"A00": {"geog_levels": ["nation"]}})
        );
        assert_eq!(
            transport.requests()[0].endpoint,
            "/metadata/nhgis/time_series_tables/A00?version=v1"
        );
    }
}
