//! Schema model, built-in dataset schemas and compiled registry.
//!
//! The model covers the JSON-Schema subset the dataset schemas need. It is
//! deserializable, so the `schema.json` published next to the benchmark
//! files can be loaded and used in place of the built-in one.

use benchviz_core::SchemaKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::sanitize::MAX_ARRAY_LENGTH;

/// Pattern every latency/bandwidth `size` label must match.
pub const SIZE_PATTERN: &str = "^[0-9]+(B|KB|MB|GB)$";

/// Most series a chart dataset may carry.
pub const MAX_CHART_SERIES: u64 = 100;

/// Primitive JSON types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    Integer,
    String,
}

impl InstanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceType::Null => "null",
            InstanceType::Boolean => "boolean",
            InstanceType::Object => "object",
            InstanceType::Array => "array",
            InstanceType::Number => "number",
            InstanceType::Integer => "integer",
            InstanceType::String => "string",
        }
    }

    /// Whether `value` is an instance of this type.
    ///
    /// Numbers without a fractional part count as integers.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (InstanceType::Null, Value::Null) => true,
            (InstanceType::Boolean, Value::Bool(_)) => true,
            (InstanceType::Object, Value::Object(_)) => true,
            (InstanceType::Array, Value::Array(_)) => true,
            (InstanceType::Number, Value::Number(_)) => true,
            (InstanceType::Integer, Value::Number(n)) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            (InstanceType::String, Value::String(_)) => true,
            _ => false,
        }
    }
}

/// `type` keyword: one type or a list of alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(InstanceType),
    Many(Vec<InstanceType>),
}

impl TypeSet {
    pub fn allows(&self, value: &Value) -> bool {
        match self {
            TypeSet::Single(t) => t.matches(value),
            TypeSet::Many(ts) => ts.iter().any(|t| t.matches(value)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TypeSet::Single(t) => t.as_str().to_string(),
            TypeSet::Many(ts) => ts
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// `additionalProperties` keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<JsonSchema>),
}

/// A JSON-Schema node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, JsonSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<JsonSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl JsonSchema {
    fn typed(t: InstanceType) -> Self {
        Self {
            schema_type: Some(TypeSet::Single(t)),
            ..Default::default()
        }
    }

    pub fn object() -> Self {
        Self::typed(InstanceType::Object)
    }

    pub fn array(items: JsonSchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed(InstanceType::Array)
        }
    }

    pub fn string() -> Self {
        Self::typed(InstanceType::String)
    }

    pub fn number() -> Self {
        Self::typed(InstanceType::Number)
    }

    pub fn integer() -> Self {
        Self::typed(InstanceType::Integer)
    }

    pub fn one_of_types(types: &[InstanceType]) -> Self {
        Self {
            schema_type: Some(TypeSet::Many(types.to_vec())),
            ..Default::default()
        }
    }

    pub fn property(mut self, name: &str, schema: JsonSchema) -> Self {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_string(), schema);
        self
    }

    pub fn required(mut self, fields: &[&str]) -> Self {
        self.required = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Reject keys not listed in `properties`.
    pub fn closed(mut self) -> Self {
        self.additional_properties = Some(AdditionalProperties::Allowed(false));
        self
    }

    pub fn minimum(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }

    pub fn maximum(mut self, max: f64) -> Self {
        self.maximum = Some(max);
        self
    }

    pub fn max_length(mut self, len: u64) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn max_items(mut self, len: u64) -> Self {
        self.max_items = Some(len);
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    pub fn format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Load a schema document from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Load a schema document from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(content).map_err(|e| SchemaError::ParseError(e.to_string()))
    }

    /// Check if a field is required.
    pub fn is_required(&self, field: &str) -> bool {
        self.required
            .as_ref()
            .map(|r| r.iter().any(|f| f == field))
            .unwrap_or(false)
    }

    fn for_each_pattern<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        if let Some(pattern) = &self.pattern {
            f(pattern);
        }
        if let Some(props) = &self.properties {
            for schema in props.values() {
                schema.for_each_pattern(f);
            }
        }
        if let Some(items) = &self.items {
            items.for_each_pattern(f);
        }
        if let Some(AdditionalProperties::Schema(schema)) = &self.additional_properties {
            schema.for_each_pattern(f);
        }
    }
}

/// Closed schema for benchmark datasets.
pub fn benchmark_schema() -> JsonSchema {
    let size = || JsonSchema::string().max_length(20).pattern(SIZE_PATTERN);
    let non_negative = || JsonSchema::number().minimum(0.0);
    let node_count = || JsonSchema::integer().minimum(1.0).maximum(1_000_000.0);

    let hardware = JsonSchema::object()
        .closed()
        .property("nodes", node_count())
        .property("network", JsonSchema::string().max_length(100))
        .property("topology", JsonSchema::string().max_length(100));

    let metadata = JsonSchema::object()
        .closed()
        .property("name", JsonSchema::string().max_length(200))
        .property("date", JsonSchema::string().format("date").max_length(50))
        .property("hardware", hardware);

    let latency_point = JsonSchema::object()
        .closed()
        .required(&["size", "p50", "p95"])
        .property("size", size())
        .property("p50", non_negative())
        .property("p95", non_negative());

    let bandwidth_point = JsonSchema::object()
        .closed()
        .required(&["size", "gbps"])
        .property("size", size())
        .property("gbps", non_negative());

    JsonSchema::object()
        .closed()
        .property("cluster", JsonSchema::string().max_length(100))
        .property("nodes", node_count())
        .property("fabric", JsonSchema::string().max_length(100))
        .property("topology", JsonSchema::string().max_length(100))
        .property("metadata", metadata)
        .property(
            "latency_us",
            JsonSchema::array(latency_point).max_items(MAX_ARRAY_LENGTH as u64),
        )
        .property(
            "bandwidth_gbps",
            JsonSchema::array(bandwidth_point).max_items(MAX_ARRAY_LENGTH as u64),
        )
}

/// Closed schema for generic chart datasets.
pub fn chart_schema() -> JsonSchema {
    use InstanceType as T;

    let color = || JsonSchema::one_of_types(&[T::String, T::Null, T::Array]).max_length(100);

    let series = JsonSchema::object()
        .closed()
        .property("label", JsonSchema::string().max_length(200))
        .property(
            "data",
            JsonSchema::array(JsonSchema::one_of_types(&[T::Number, T::Null]))
                .max_items(MAX_ARRAY_LENGTH as u64),
        )
        .property("backgroundColor", color())
        .property("borderColor", color());

    JsonSchema::object()
        .closed()
        .property(
            "labels",
            JsonSchema::array(JsonSchema::string().max_length(200))
                .max_items(MAX_ARRAY_LENGTH as u64),
        )
        .property(
            "datasets",
            JsonSchema::array(series).max_items(MAX_CHART_SERIES),
        )
}

/// Schema loading/compilation errors.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// A schema with its `pattern` regexes compiled once.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    schema: JsonSchema,
    patterns: HashMap<String, Regex>,
}

impl CompiledSchema {
    pub fn compile(schema: JsonSchema) -> Result<Self, SchemaError> {
        let mut sources = Vec::new();
        schema.for_each_pattern(&mut |p| sources.push(p.to_string()));

        let mut patterns = HashMap::new();
        for source in sources {
            if patterns.contains_key(&source) {
                continue;
            }
            let regex = Regex::new(&source).map_err(|e| SchemaError::InvalidPattern {
                pattern: source.clone(),
                message: e.to_string(),
            })?;
            patterns.insert(source, regex);
        }

        Ok(Self { schema, patterns })
    }

    pub fn schema(&self) -> &JsonSchema {
        &self.schema
    }

    pub(crate) fn pattern(&self, source: &str) -> Option<&Regex> {
        self.patterns.get(source)
    }
}

/// Compiled schemas keyed by [`SchemaKind`].
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<SchemaKind, CompiledSchema>,
}

impl SchemaRegistry {
    /// Registry holding the built-in benchmark and chart schemas.
    pub fn builtin() -> Result<Self, SchemaError> {
        let mut schemas = HashMap::new();
        for kind in SchemaKind::ALL {
            let schema = match kind {
                SchemaKind::Benchmark => benchmark_schema(),
                SchemaKind::Chart => chart_schema(),
            };
            schemas.insert(kind, CompiledSchema::compile(schema)?);
        }
        Ok(Self { schemas })
    }

    /// Replace the schema used for `kind`.
    pub fn insert(&mut self, kind: SchemaKind, schema: JsonSchema) -> Result<(), SchemaError> {
        self.schemas.insert(kind, CompiledSchema::compile(schema)?);
        Ok(())
    }

    /// Get the compiled schema for a kind.
    pub fn get(&self, kind: SchemaKind) -> Option<&CompiledSchema> {
        self.schemas.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
