//! Where a schema comes from, and loading it.

use crate::validator::SchemaError;
use schemalint_yaml::{PositionStore, parse_file};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A schema location: a local file or an `http(s)://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    Path(PathBuf),
    Url(String),
}

impl SchemaSource {
    /// Classify a command-line or configuration value.
    pub fn parse(text: &str) -> Self {
        if is_url(text) {
            SchemaSource::Url(text.to_string())
        } else {
            SchemaSource::Path(PathBuf::from(text))
        }
    }

    /// Load and parse the schema document.
    ///
    /// Files may be YAML or JSON. URLs are fetched and must return JSON.
    pub fn load(&self) -> Result<serde_json::Value, SchemaError> {
        match self {
            SchemaSource::Path(path) => load_file(path),
            SchemaSource::Url(url) => fetch(url),
        }
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaSource::Path(path) => write!(f, "{}", path.display()),
            SchemaSource::Url(url) => f.write_str(url),
        }
    }
}

pub(crate) fn is_url(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://")
}

fn load_file(path: &Path) -> Result<serde_json::Value, SchemaError> {
    let name = path.display().to_string();
    tracing::debug!(schema = %name, "loading schema file");
    let content = fs::read_to_string(path).map_err(|err| SchemaError::Read {
        path: name.clone(),
        message: err.to_string(),
    })?;
    // positions inside the schema are never reported
    let mut store = PositionStore::new();
    let value = parse_file(&content, &name, &mut store).map_err(|err| SchemaError::Parse {
        path: name.clone(),
        message: err.message(),
    })?;
    Ok(value.to_json())
}

fn fetch(url: &str) -> Result<serde_json::Value, SchemaError> {
    tracing::debug!(schema = url, "fetching schema");
    let fetch_error = |err: reqwest::Error| SchemaError::Fetch {
        url: url.to_string(),
        message: err.to_string(),
    };
    let body = reqwest::blocking::get(url)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(fetch_error)?;
    serde_json::from_str(&body).map_err(|err| SchemaError::Parse {
        path: url.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_source() {
        assert_eq!(
            SchemaSource::parse("https://example.com/s.json"),
            SchemaSource::Url("https://example.com/s.json".into())
        );
        assert_eq!(
            SchemaSource::parse("schemas/s.yaml"),
            SchemaSource::Path(PathBuf::from("schemas/s.yaml"))
        );
        assert_eq!(SchemaSource::parse("schemas/s.yaml").to_string(), "schemas/s.yaml");
    }

    #[test]
    fn test_load_yaml_schema() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "type: object\nrequired: [name]").unwrap();
        let schema = SchemaSource::Path(file.path().to_path_buf()).load().unwrap();
        assert_eq!(schema, serde_json::json!({"type": "object", "required": ["name"]}));
    }

    #[test]
    fn test_load_missing_schema() {
        let dir = tempfile::tempdir().unwrap();
        let err = SchemaSource::Path(dir.path().join("nope.json"))
            .load()
            .unwrap_err();
        assert!(matches!(err, SchemaError::Read { .. }));
    }

    #[test]
    fn test_load_malformed_schema() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{\"type\": ").unwrap();
        let err = SchemaSource::Path(file.path().to_path_buf()).load().unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
    }
}
