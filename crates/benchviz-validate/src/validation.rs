//! Validation of sanitized JSON against closed schemas.

use crate::sanitize::sanitize;
use crate::schema::{AdditionalProperties, CompiledSchema, JsonSchema, SchemaError, SchemaRegistry};
use benchviz_core::{Error, SchemaKind, ValidatedPayload};
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// JSON pointer to the offending value; empty for the document root.
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root) {}", self.message)
        } else {
            write!(f, "{} {}", self.path, self.message)
        }
    }
}

/// Result of validating one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub valid: bool,
    /// The sanitized document, present only when `valid`.
    pub data: Option<Value>,
    /// Human-readable violations in document order, empty when `valid`.
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    /// Convert into a payload, or a [`Error::Validation`] listing the violations.
    pub fn into_payload(self, kind: SchemaKind) -> benchviz_core::Result<ValidatedPayload> {
        match self.data {
            Some(data) if self.valid => Ok(ValidatedPayload::new(kind, data)),
            _ => Err(Error::Validation(self.errors)),
        }
    }
}

/// Sanitizes and validates documents against the registered schemas.
#[derive(Debug, Clone)]
pub struct Validator {
    registry: SchemaRegistry,
}

impl Validator {
    /// Create a validator with the built-in schemas.
    pub fn new() -> Result<Self, SchemaError> {
        Ok(Self {
            registry: SchemaRegistry::builtin()?,
        })
    }

    /// Create a validator over a custom registry.
    pub fn with_registry(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Sanitize `input` and validate it against the schema for `kind`.
    pub fn validate(&self, kind: SchemaKind, input: &Value) -> ValidationOutcome {
        match self.registry.get(kind) {
            Some(schema) => Self::validate_with(schema, input),
            None => ValidationOutcome {
                valid: false,
                data: None,
                errors: vec![format!("No schema registered for '{}'", kind)],
            },
        }
    }

    pub fn validate_benchmark_data(&self, input: &Value) -> ValidationOutcome {
        self.validate(SchemaKind::Benchmark, input)
    }

    pub fn validate_chart_data(&self, input: &Value) -> ValidationOutcome {
        self.validate(SchemaKind::Chart, input)
    }

    /// Sanitize `input` and validate it against an arbitrary compiled schema.
    pub fn validate_with(schema: &CompiledSchema, input: &Value) -> ValidationOutcome {
        let sanitized = sanitize(input);
        let mut errors = Vec::new();
        check(&sanitized, schema.schema(), schema, "", &mut errors);

        if errors.is_empty() {
            ValidationOutcome {
                valid: true,
                data: Some(sanitized),
                errors: vec![],
            }
        } else {
            debug!(count = errors.len(), "Document failed validation");
            ValidationOutcome {
                valid: false,
                data: None,
                errors: errors.iter().map(ToString::to_string).collect(),
            }
        }
    }
}

static DEFAULT_VALIDATOR: LazyLock<Validator> =
    LazyLock::new(|| Validator::new().expect("built-in schemas compile"));

/// Validate against the built-in benchmark schema.
pub fn validate_benchmark_data(input: &Value) -> ValidationOutcome {
    DEFAULT_VALIDATOR.validate_benchmark_data(input)
}

/// Validate against the built-in chart schema.
pub fn validate_chart_data(input: &Value) -> ValidationOutcome {
    DEFAULT_VALIDATOR.validate_chart_data(input)
}

fn push(errors: &mut Vec<ValidationError>, path: &str, message: String) {
    errors.push(ValidationError {
        path: path.to_string(),
        message,
    });
}

fn check(
    json: &Value,
    schema: &JsonSchema,
    compiled: &CompiledSchema,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(types) = &schema.schema_type
        && !types.allows(json)
    {
        push(errors, path, format!("must be {}", types.describe()));
        return;
    }

    match json {
        Value::Object(obj) => {
            if let Some(required) = &schema.required {
                for field in required {
                    if !obj.contains_key(field) {
                        push(
                            errors,
                            path,
                            format!("must have required property '{}'", field),
                        );
                    }
                }
            }

            for (key, value) in obj {
                let child = format!("{}/{}", path, key);
                match schema.properties.as_ref().and_then(|p| p.get(key)) {
                    Some(prop_schema) => check(value, prop_schema, compiled, &child, errors),
                    None => match &schema.additional_properties {
                        Some(AdditionalProperties::Allowed(false)) => push(
                            errors,
                            path,
                            format!("must NOT have additional property '{}'", key),
                        ),
                        Some(AdditionalProperties::Schema(extra)) => {
                            check(value, extra, compiled, &child, errors)
                        }
                        Some(AdditionalProperties::Allowed(true)) | None => {}
                    },
                }
            }
        }
        Value::Array(items) => {
            if let Some(max) = schema.max_items
                && items.len() as u64 > max
            {
                push(errors, path, format!("must NOT have more than {} items", max));
            }
            if let Some(min) = schema.min_items
                && (items.len() as u64) < min
            {
                push(errors, path, format!("must NOT have fewer than {} items", min));
            }
            if let Some(item_schema) = &schema.items {
                for (index, item) in items.iter().enumerate() {
                    let child = format!("{}/{}", path, index);
                    check(item, item_schema, compiled, &child, errors);
                }
            }
        }
        Value::String(s) => {
            let len = s.chars().count() as u64;
            if let Some(max) = schema.max_length
                && len > max
            {
                push(
                    errors,
                    path,
                    format!("must NOT have more than {} characters", max),
                );
            }
            if let Some(min) = schema.min_length
                && len < min
            {
                push(
                    errors,
                    path,
                    format!("must NOT have fewer than {} characters", min),
                );
            }
            if let Some(pattern) = &schema.pattern {
                let matched = compiled.pattern(pattern).is_some_and(|re| re.is_match(s));
                if !matched {
                    push(errors, path, format!("must match pattern \"{}\"", pattern));
                }
            }
            if let Some(format) = &schema.format
                && !matches_format(format, s)
            {
                push(errors, path, format!("must match format \"{}\"", format));
            }
        }
        Value::Number(n) => {
            if let Some(value) = n.as_f64() {
                if let Some(min) = schema.minimum
                    && value < min
                {
                    push(errors, path, format!("must be >= {}", min));
                }
                if let Some(max) = schema.maximum
                    && value > max
                {
                    push(errors, path, format!("must be <= {}", max));
                }
            }
        }
        Value::Null | Value::Bool(_) => {}
    }

    if let Some(allowed) = &schema.enum_values
        && !allowed.contains(json)
    {
        push(
            errors,
            path,
            "must be equal to one of the allowed values".to_string(),
        );
    }
}

/// Check a `format` keyword. Unknown formats are not enforced.
fn matches_format(format: &str, value: &str) -> bool {
    match format {
        "date" => chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        "date-time" => chrono::DateTime::parse_from_rfc3339(value).is_ok(),
        _ => true,
    }
}
