//! Finding the schema for a document.
//!
//! Discovery is pluggable: implement [`SchemaDiscovery`] and register it on
//! a [`DiscoveryRegistry`]. The built-in [`ConfigFileDiscovery`] reads a
//! `.schemalint.toml` file found in the document's directory or one of its
//! parents:
//!
//! ```toml
//! # default for every file below this directory
//! schema = "schemas/default.json"
//!
//! # rules are tried in order, before the default
//! [[rules]]
//! pattern = "deploy/*.yaml"
//! schema = "https://example.com/deploy.schema.json"
//! ```
//!
//! Relative schema paths and patterns are resolved against the directory
//! of the configuration file.

use crate::pointer::normalize;
use crate::schema::{SchemaSource, is_url};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up by [`ConfigFileDiscovery`].
pub const CONFIG_FILE_NAME: &str = ".schemalint.toml";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid configuration {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid pattern '{pattern}' in {}: {source}", .path.display())]
    Pattern {
        path: PathBuf,
        pattern: String,
        source: glob::PatternError,
    },
}

/// A way of finding the schema that applies to a document.
pub trait SchemaDiscovery {
    /// Short name, used in log output.
    fn name(&self) -> &str;

    /// The schema for `target`, or None when this discoverer has no opinion.
    fn resolve_schema(&self, target: &Path) -> Result<Option<SchemaSource>, DiscoveryError>;
}

/// Discoverers asked in registration order.
#[derive(Default)]
pub struct DiscoveryRegistry {
    discoverers: Vec<Box<dyn SchemaDiscovery>>,
}

impl DiscoveryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in discoverers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ConfigFileDiscovery::new()));
        registry
    }

    pub fn register(&mut self, discovery: Box<dyn SchemaDiscovery>) {
        self.discoverers.push(discovery);
    }

    pub fn len(&self) -> usize {
        self.discoverers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.discoverers.is_empty()
    }

    /// First schema found for `target`.
    pub fn resolve_schema(&self, target: &Path) -> Result<Option<SchemaSource>, DiscoveryError> {
        for discovery in &self.discoverers {
            if let Some(schema) = discovery.resolve_schema(target)? {
                tracing::debug!(discovery = discovery.name(), %schema, "schema discovered");
                return Ok(Some(schema));
            }
            tracing::trace!(discovery = discovery.name(), "no schema");
        }
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    schema: Option<String>,
    #[serde(default)]
    rules: Vec<Rule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Rule {
    pattern: String,
    schema: String,
}

/// Looks for `.schemalint.toml` from the document's directory upwards.
///
/// The nearest configuration file decides; files further up are not
/// consulted even when the nearest one has no matching entry.
#[derive(Debug, Clone)]
pub struct ConfigFileDiscovery {
    file_name: String,
}

impl Default for ConfigFileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigFileDiscovery {
    pub fn new() -> Self {
        Self::with_file_name(CONFIG_FILE_NAME)
    }

    pub fn with_file_name(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// The nearest configuration file above `target`.
    pub fn find_config(&self, target: &Path) -> Option<PathBuf> {
        let start = target.parent()?;
        start
            .ancestors()
            .map(|dir| dir.join(&self.file_name))
            .find(|candidate| candidate.is_file())
    }

    fn schema_for(
        &self,
        config_path: &Path,
        target: &Path,
    ) -> Result<Option<SchemaSource>, DiscoveryError> {
        let text = fs::read_to_string(config_path).map_err(|source| DiscoveryError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        let config: ConfigFile = toml::from_str(&text).map_err(|source| DiscoveryError::Config {
            path: config_path.to_path_buf(),
            source,
        })?;
        let base = config_path.parent().unwrap_or_else(|| Path::new(""));
        let relative = target.strip_prefix(base).unwrap_or(target);

        for rule in &config.rules {
            let pattern = glob::Pattern::new(&rule.pattern).map_err(|source| {
                DiscoveryError::Pattern {
                    path: config_path.to_path_buf(),
                    pattern: rule.pattern.clone(),
                    source,
                }
            })?;
            if pattern.matches_path(relative) {
                tracing::debug!(pattern = %rule.pattern, target = %relative.display(), "rule matched");
                return Ok(Some(schema_source(base, &rule.schema)));
            }
        }
        Ok(config.schema.as_deref().map(|schema| schema_source(base, schema)))
    }
}

impl SchemaDiscovery for ConfigFileDiscovery {
    fn name(&self) -> &str {
        "config-file"
    }

    fn resolve_schema(&self, target: &Path) -> Result<Option<SchemaSource>, DiscoveryError> {
        let target = std::path::absolute(target).unwrap_or_else(|_| target.to_path_buf());
        let target = normalize(&target);
        match self.find_config(&target) {
            Some(config_path) => {
                tracing::debug!(config = %config_path.display(), "using configuration");
                self.schema_for(&config_path, &target)
            }
            None => Ok(None),
        }
    }
}

fn schema_source(base: &Path, schema: &str) -> SchemaSource {
    if is_url(schema) {
        SchemaSource::Url(schema.to_string())
    } else {
        SchemaSource::Path(normalize(&base.join(schema)))
    }
}
