use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    /// Required fields absent from the payload, in canonical feature order.
    #[error("Missing fields: {}", quoted_list(.0))]
    Missing(Vec<&'static str>),

    #[error("invalid value for {field}: {value}")]
    Invalid { field: &'static str, value: String },
}

impl FeatureError {
    /// Client-side errors are recoverable at the HTTP boundary.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing(_))
    }
}

/// Render field names as `['a', 'b']`, the format API clients already parse.
fn quoted_list(names: &[&str]) -> String {
    let inner = names
        .iter()
        .map(|n| format!("'{n}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{inner}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_message_lists_quoted_names() {
        let err = FeatureError::Missing(vec!["floorAreaSqM", "tenure"]);
        assert_eq!(
            err.to_string(),
            "Missing fields: ['floorAreaSqM', 'tenure']"
        );
    }

    #[test]
    fn invalid_message_names_field() {
        let err = FeatureError::Invalid {
            field: "bedrooms",
            value: "\"three\"".into(),
        };
        assert_eq!(err.to_string(), "invalid value for bedrooms: \"three\"");
        assert!(!err.is_missing());
    }
}
