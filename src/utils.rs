use crate::error::{McpError, McpResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse JSON value into a typed parameter struct
pub fn parse_params<T: DeserializeOwned>(params: Value) -> McpResult<T> {
    serde_json::from_value(params)
        .map_err(|e| McpError::InvalidParameter(format!("Invalid parameters: {}", e)))
}

/// Extract a required, non-blank string argument
pub fn required_str(params: &Value, name: &str) -> McpResult<String> {
    params
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            McpError::InvalidParameter(format!(
                "'{}' parameter is required and must be a string",
                name
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Options {
        #[serde(default)]
        limit: Option<usize>,
    }

    #[test]
    fn test_parse_params_with_defaults() {
        let options: Options = parse_params(json!({})).unwrap();
        assert!(options.limit.is_none());

        let options: Options = parse_params(json!({"limit": 5})).unwrap();
        assert_eq!(options.limit, Some(5));
    }

    #[test]
    fn test_parse_params_rejects_wrong_type() {
        let err = parse_params::<Options>(json!({"limit": "many"})).unwrap_err();
        assert!(matches!(err, McpError::InvalidParameter(_)));
    }

    #[test]
    fn test_required_str_trims() {
        let value = required_str(&json!({"technology": "  rust "}), "technology").unwrap();
        assert_eq!(value, "rust");
    }

    #[rstest]
    #[case(json!({}))]
    #[case(json!({"technology": ""}))]
    #[case(json!({"technology": "   "}))]
    #[case(json!({"technology": 42}))]
    #[case(json!({"technology": null}))]
    #[case(json!(null))]
    fn test_required_str_rejects(#[case] params: Value) {
        let err = required_str(&params, "technology").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid parameter: 'technology' parameter is required and must be a string"
        );
    }
}
