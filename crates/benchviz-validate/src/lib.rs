//! Dataset validation for benchviz.
//!
//! Fetched JSON is untrusted. Every document goes through two stages:
//!
//! 1. **Sanitization**: prototype-pollution keys are dropped, `<script>` blocks
//!    are stripped, and oversized strings and arrays are truncated.
//! 2. **Schema validation**: the sanitized tree is checked against a closed
//!    schema (benchmark or chart). Unknown keys are rejected.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use benchviz_validate::validate_benchmark_data;
//!
//! let outcome = validate_benchmark_data(&json);
//! if !outcome.valid {
//!     eprintln!("{}", outcome.errors.join(", "));
//! }
//! ```

pub mod sanitize;
pub mod schema;
pub mod validation;

pub use sanitize::{MAX_ARRAY_LENGTH, MAX_STRING_LENGTH, sanitize};
pub use schema::{CompiledSchema, JsonSchema, SchemaError, SchemaRegistry};
pub use validation::{
    ValidationError, ValidationOutcome, Validator, validate_benchmark_data, validate_chart_data,
};
