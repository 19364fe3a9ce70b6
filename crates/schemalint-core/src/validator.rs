//! JSON Schema validation of resolved documents.

use jsonschema::{Draft, Validator};
use thiserror::Error;

/// Failures while obtaining or compiling a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("cannot read schema {path}: {message}")]
    Read { path: String, message: String },

    #[error("cannot parse schema {path}: {message}")]
    Parse { path: String, message: String },

    #[error("cannot fetch schema {url}: {message}")]
    Fetch { url: String, message: String },
}

/// One violation reported by the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub message: String,
    /// The schema keyword that failed
    pub validator: String,
    /// JSON pointer to the failing instance
    pub instance_path: String,
}

/// A compiled schema.
pub struct SchemaValidator {
    inner: Validator,
}

impl SchemaValidator {
    /// Compile `schema`.
    ///
    /// Schemas without a `$schema` keyword are read as Draft 7. With
    /// `check_schema`, a schema that does not conform to its meta-schema is
    /// rejected here, before any document is checked.
    pub fn new(schema: &serde_json::Value, check_schema: bool) -> Result<Self, SchemaError> {
        let declared = schema.get("$schema").is_some();
        if check_schema {
            check_against_meta_schema(schema, declared)?;
        }
        let mut options = jsonschema::options();
        if !declared {
            options.with_draft(Draft::Draft7);
        }
        let inner = options
            .build(schema)
            .map_err(|err| SchemaError::InvalidSchema(err.to_string()))?;
        Ok(Self { inner })
    }

    /// Lazily report every violation in `instance`.
    pub fn iter_errors<'a>(
        &'a self,
        instance: &'a serde_json::Value,
    ) -> impl Iterator<Item = Violation> + 'a {
        self.inner.iter_errors(instance).map(|err| Violation {
            message: err.to_string(),
            validator: keyword(&err.schema_path.to_string()),
            instance_path: err.instance_path.to_string(),
        })
    }

}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator").finish_non_exhaustive()
    }
}

fn check_against_meta_schema(schema: &serde_json::Value, declared: bool) -> Result<(), SchemaError> {
    let checked = if declared {
        jsonschema::meta::try_validate(schema)
            .map_err(|err| SchemaError::InvalidSchema(err.to_string()))?
    } else {
        jsonschema::draft7::meta::validate(schema)
    };
    checked.map_err(|err| SchemaError::InvalidSchema(format!("{} at {}", err, err.instance_path)))
}

/// Last segment of a schema path: `/properties/count/type` is `type`.
fn keyword(schema_path: &str) -> String {
    match schema_path.rsplit('/').next() {
        Some(last) if !last.is_empty() => last.to_string(),
        _ => "schema".to_string(),
    }
}
