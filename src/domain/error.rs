//! Error taxonomy for loading and analysis

/// Errors returned by the loader and by `analyze`.
///
/// Missing demographic data is not an error; it surfaces as the
/// unavailable branch of the demographic section.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The event table contains zero data rows.
    #[error("event table is empty")]
    EmptyDataset,

    /// One or more required columns are missing.
    #[error("missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Any other failure while loading or analyzing, with a readable cause.
    #[error("analysis failed: {0}")]
    Failure(String),
}

impl AnalysisError {
    pub fn failure(cause: impl Into<String>) -> Self {
        AnalysisError::Failure(cause.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_columns() {
        let err = AnalysisError::Schema { missing: vec!["frame".to_string(), "zone_id".to_string()] };
        assert_eq!(err.to_string(), "missing required column(s): frame, zone_id");
    }

    #[test]
    fn test_failure_message() {
        let err = AnalysisError::failure("bad row");
        assert_eq!(err.to_string(), "analysis failed: bad row");
    }
}
