//! Error types.
//!
//! Failures are categorized coarsely: transport and decoding errors,
//! GraphQL-level errors reported by the server, and configuration errors.
//! Dangling references inside query results are not errors; the builders
//! drop them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single entry of a GraphQL response's `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    /// Server-provided message.
    pub message: String,
    /// Response path of the failing field, if reported.
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
}

impl std::fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Main error type for client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GraphQL error: {}", join_messages(.0))]
    GraphQl(Vec<GraphQlError>),

    #[error("Response is missing `{0}`")]
    MissingData(&'static str),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

fn join_messages(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_error_display_joins_messages() {
        let err = ClientError::GraphQl(vec![
            GraphQlError {
                message: "task not found".into(),
                path: vec![],
            },
            GraphQlError {
                message: "permission denied".into(),
                path: vec![],
            },
        ]);
        assert_eq!(
            err.to_string(),
            "GraphQL error: task not found; permission denied"
        );
    }

    #[test]
    fn test_graphql_error_deserialize_without_path() {
        let e: GraphQlError = serde_json::from_str(r#"{"message":"boom"}"#).unwrap();
        assert_eq!(e.message, "boom");
        assert!(e.path.is_empty());
    }
}
