//! Request URL composition.
//!
//! Base URL and path are joined with exactly one slash, an optional path id
//! becomes an extra segment and query parameters are appended as
//! `key=value` pairs. Values are interpolated as-is and are NOT
//! percent-encoded; callers pass pre-encoded values when they need to.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::http::render_value;

/// Trailing path segment identifying a resource, e.g. the `5` in `/users/5`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathId {
    Number(i64),
    Text(String),
}

impl PathId {
    /// Zero and the empty string count as "no id".
    pub fn is_present(&self) -> bool {
        match self {
            PathId::Number(n) => *n != 0,
            PathId::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathId::Number(n) => write!(f, "{n}"),
            PathId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PathId {
    fn from(n: i64) -> Self {
        PathId::Number(n)
    }
}

impl From<i32> for PathId {
    fn from(n: i32) -> Self {
        PathId::Number(n.into())
    }
}

impl From<u32> for PathId {
    fn from(n: u32) -> Self {
        PathId::Number(n.into())
    }
}

impl From<&str> for PathId {
    fn from(s: &str) -> Self {
        PathId::Text(s.to_string())
    }
}

impl From<String> for PathId {
    fn from(s: String) -> Self {
        PathId::Text(s)
    }
}

impl From<Uuid> for PathId {
    fn from(id: Uuid) -> Self {
        PathId::Text(id.to_string())
    }
}

/// Compose the final request URL.
pub fn build_url(
    base_url: &str,
    path: &str,
    path_id: Option<&PathId>,
    query: Option<&Map<String, Value>>,
) -> String {
    let mut url = if path.is_empty() || base_url.is_empty() {
        if path.is_empty() {
            base_url.to_string()
        } else {
            path.to_string()
        }
    } else {
        join(base_url, path)
    };

    if let Some(id) = path_id.filter(|id| id.is_present()) {
        if !url.ends_with('/') {
            url.push('/');
        }
        url.push_str(&id.to_string());
    }

    let query = query.map(query_string).unwrap_or_default();
    if query.is_empty() {
        url
    } else {
        format!("{url}?{query}")
    }
}

fn join(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (true, false) | (false, true) => format!("{base}{path}"),
        (false, false) => format!("{base}/{path}"),
    }
}

fn query_string(query: &Map<String, Value>) -> String {
    query
        .iter()
        .map(|(key, value)| format!("{key}={}", render_value(value)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn query(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn joins_with_single_slash() {
        for (base, path) in [
            ("http://x/", "/y"),
            ("http://x", "/y"),
            ("http://x/", "y"),
            ("http://x", "y"),
        ] {
            assert_eq!(build_url(base, path, None, None), "http://x/y", "{base} + {path}");
        }
    }

    #[test]
    fn empty_path_keeps_base() {
        assert_eq!(build_url("http://x/", "", None, None), "http://x/");
        assert_eq!(build_url("", "", None, None), "");
    }

    #[test]
    fn empty_base_keeps_path() {
        assert_eq!(build_url("", "/y", None, None), "/y");
    }

    #[test]
    fn path_id_appends_segment() {
        assert_eq!(build_url("http://x", "/y", Some(&PathId::from(5)), None), "http://x/y/5");
        assert_eq!(build_url("http://x", "/y/", Some(&PathId::from("abc")), None), "http://x/y/abc");
    }

    #[test]
    fn falsy_path_id_appends_nothing() {
        assert_eq!(build_url("http://x", "/y", Some(&PathId::from(0)), None), "http://x/y");
        assert_eq!(build_url("http://x", "/y", Some(&PathId::from("")), None), "http://x/y");
    }

    #[test]
    fn uuid_path_id() {
        let id = Uuid::nil();
        assert_eq!(
            build_url("http://x", "todos", Some(&id.into()), None),
            "http://x/todos/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn query_appended_in_insertion_order() {
        let q = query(json!({"b": 2, "a": 1}));
        assert_eq!(build_url("http://x", "/y", None, Some(&q)), "http://x/y?b=2&a=1");
    }

    #[test]
    fn empty_query_adds_nothing() {
        assert_eq!(build_url("http://x", "/y", None, Some(&Map::new())), "http://x/y");
    }

    #[test]
    fn query_values_are_not_encoded() {
        let q = query(json!({"q": "a b&c", "ids": [1, 2]}));
        assert_eq!(build_url("http://x", "s", None, Some(&q)), "http://x/s?q=a b&c&ids=1,2");
    }
}
