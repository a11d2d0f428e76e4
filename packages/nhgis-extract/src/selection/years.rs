//! Year coverage inferred from a dataset name.
//!
//! NHGIS dataset names embed the years they cover ("1990_STF1",
//! "1990_2000_CMSA"). Every run of four digits counts as a year token.
//! A name with an unrelated four-digit number will be misread; this is a
//! known limitation of the naming convention, not something we try to guess
//! around.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ExtractError, Result};

/// Four-digit numeric token.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static YEAR_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}").expect("valid regex"));

/// Years a dataset covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearCoverage {
    /// Zero or one distinct year token; the token, if any, is the year.
    Single(Option<u16>),
    /// Two or more distinct tokens; inclusive span between min and max.
    Multi { first: u16, last: u16 },
}

impl YearCoverage {
    /// Infer coverage from a dataset name.
    ///
    /// # Examples
    /// ```
    /// use nhgis_extract::selection::YearCoverage;
    ///
    /// assert_eq!(YearCoverage::infer("1990_STF1"), YearCoverage::Single(Some(1990)));
    /// assert_eq!(
    ///     YearCoverage::infer("1990_2000_CMSA"),
    ///     YearCoverage::Multi { first: 1990, last: 2000 }
    /// );
    /// ```
    #[must_use]
    pub fn infer(name: &str) -> Self {
        let mut tokens: Vec<u16> = YEAR_TOKEN
            .find_iter(name)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        tokens.sort_unstable();
        tokens.dedup();

        match (tokens.first(), tokens.last()) {
            (Some(&first), Some(&last)) if first != last => Self::Multi { first, last },
            (first, _) => Self::Single(first.copied()),
        }
    }

    #[must_use]
    pub fn is_multi_year(&self) -> bool {
        matches!(self, Self::Multi { .. })
    }

    /// Check requested years against this coverage.
    ///
    /// An empty `years` slice means no years were requested. Returns the
    /// years to store on the selection.
    pub fn resolve(&self, dataset: &str, years: &[u16]) -> Result<Vec<u16>> {
        let years = Some(years).filter(|y| !y.is_empty());

        match (*self, years) {
            (Self::Multi { .. }, None) => Err(ExtractError::MissingRequiredValue {
                what: "explicit years",
                context: format!("Multi-year dataset {dataset}"),
            }),
            (Self::Multi { first, last }, Some(years)) => {
                if let Some(year) = years.iter().find(|y| !(first..=last).contains(*y)) {
                    return Err(ExtractError::unsupported(
                        "Year",
                        year,
                        format!("dataset {dataset} (covers {first}-{last})"),
                    ));
                }
                Ok(years.to_vec())
            }
            (Self::Single(_), None) => Ok(Vec::new()),
            (Self::Single(_), Some(years)) if years.len() > 1 => Err(ExtractError::shape(
                "years",
                format!(
                    "dataset {dataset} is not a multi-year dataset, but {} years were given",
                    years.len()
                ),
            )),
            (Self::Single(Some(supported)), Some(years)) => {
                if years[0] == supported {
                    Ok(years.to_vec())
                } else {
                    Err(ExtractError::unsupported(
                        "Year",
                        years[0],
                        format!("dataset {dataset} (supports only {supported})"),
                    ))
                }
            }
            (Self::Single(None), Some(years)) => Err(ExtractError::unsupported(
                "Year",
                years[0],
                format!("dataset {dataset} (name embeds no year)"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_infer_single_year() {
        assert_eq!(YearCoverage::infer("1990_STF1"), YearCoverage::Single(Some(1990)));
        assert_eq!(YearCoverage::infer("NT1"), YearCoverage::Single(None));
    }

    #[test]
    fn test_infer_repeated_token_is_single_year() {
        assert_eq!(
            YearCoverage::infer("2010_SF1a_2010"),
            YearCoverage::Single(Some(2010))
        );
    }

    #[test]
    fn test_infer_multi_year_uses_min_and_max() {
        assert_eq!(
            YearCoverage::infer("2015_2011_ACS5a"),
            YearCoverage::Multi {
                first: 2011,
                last: 2015
            }
        );
    }

    #[test]
    fn test_single_year_resolution() {
        let coverage = YearCoverage::infer("1990_STF1");
        assert_eq!(coverage.resolve("1990_STF1", &[1990]).unwrap(), vec![1990]);
        assert!(coverage.resolve("1990_STF1", &[]).unwrap().is_empty());
        assert_eq!(
            coverage
                .resolve("1990_STF1", &[1990, 1991])
                .unwrap_err()
                .kind(),
            ErrorKind::Shape
        );
        assert_eq!(
            coverage.resolve("1990_STF1", &[1991]).unwrap_err().kind(),
            ErrorKind::UnsupportedValue
        );
    }

    #[test]
    fn test_multi_year_resolution() {
        let coverage = YearCoverage::infer("1990_2000_CMSA");
        assert_eq!(
            coverage.resolve("1990_2000_CMSA", &[]).unwrap_err().kind(),
            ErrorKind::MissingRequiredValue
        );
        assert_eq!(
            coverage.resolve("1990_2000_CMSA", &[1995]).unwrap(),
            vec![1995]
        );
        assert_eq!(
            coverage
                .resolve("1990_2000_CMSA", &[1990, 2005])
                .unwrap_err()
                .kind(),
            ErrorKind::UnsupportedValue
        );
    }

    #[test]
    fn test_no_embedded_year_rejects_explicit_year() {
        let coverage = YearCoverage::infer("NT1");
        let err = coverage.resolve("NT1", &[1990]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedValue);
    }
}
