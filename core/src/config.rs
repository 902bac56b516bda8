//! Instance-level defaults for a `Fetcher`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::response::DataType;

pub const DEFAULT_TIMEOUT_MILLIS: u64 = 7000;

/// Long-lived client configuration. Every field has a default, so a partial
/// JSON or TOML document deserializes into a usable config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix joined onto every request path.
    pub base_url: String,
    /// Defaults merged under each request's `{headers, method, body}`
    /// container, e.g. common headers.
    pub base_body: Map<String, Value>,
    pub data_type: DataType,
    pub timeout_millis: u64,
    pub debug: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            base_body: Map::new(),
            data_type: DataType::Json,
            timeout_millis: DEFAULT_TIMEOUT_MILLIS,
            debug: false,
        }
    }
}
