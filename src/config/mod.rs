//! Cluster and node pool configuration: parsing, inheritance and validation

pub mod cluster;
pub mod error;
pub mod inheritance;
pub mod nodepool;
pub mod settings;
pub mod validation;

pub use cluster::{ApiEndpoint, ClusterConfiguration};
pub use error::{ConfigError, Document, Rule, Violation};
pub use nodepool::NodePoolConfiguration;

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

/// Decode a YAML document in two passes
///
/// Syntax errors surface as [`ConfigError::Parse`]; a well-formed document
/// whose fields have the wrong type or shape surfaces as
/// [`ConfigError::Schema`]. An empty document decodes like an empty mapping.
pub(crate) fn decode<T: DeserializeOwned>(document: Document, bytes: &[u8]) -> Result<T, ConfigError> {
    let value: Value =
        serde_yaml::from_slice(bytes).map_err(|e| ConfigError::parse(document, e))?;

    let decoded = if value.is_null() {
        serde_yaml::from_value(Value::Mapping(Mapping::new()))
    } else {
        serde_yaml::from_slice(bytes)
    };

    decoded.map_err(|e| ConfigError::Schema {
        document,
        field: None,
        message: e.to_string(),
    })
}

/// Treat blank strings the same as an absent value
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
