//! Command handlers.

use crate::config::{CliConfig, OutputFormat};
use crate::render;
use benchviz_cache::{ChartDataCache, DEFAULT_TTL, FilesystemStore};
use benchviz_core::SchemaKind;
use benchviz_fetch::{ChartDataLoader, LoadOptions, LoaderConfig};
use benchviz_validate::{CompiledSchema, JsonSchema, ValidationOutcome, Validator};
use console::style;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Files in a dataset directory that are not datasets.
const NON_DATASET_FILES: [&str; 2] = ["schema.json", "TEMPLATE.json"];

fn open_cache(config: &CliConfig) -> Result<ChartDataCache, Box<dyn std::error::Error>> {
    let store = FilesystemStore::new(config.cache_dir()?);
    Ok(ChartDataCache::new(Arc::new(store), DEFAULT_TTL))
}

/// Fetch, validate and print one document.
pub async fn fetch(
    config: &CliConfig,
    path: &str,
    schema: SchemaKind,
    no_cache: bool,
    base_url: Option<String>,
    format: Option<OutputFormat>,
) -> Result<(), Box<dyn std::error::Error>> {
    let loader_config = LoaderConfig::with_base_url(base_url.unwrap_or_else(|| config.base_url.clone()));
    let store = FilesystemStore::new(config.cache_dir()?);
    let loader = ChartDataLoader::http(loader_config, Arc::new(store))?;
    debug!(?loader, "Loader ready");

    let options = LoadOptions {
        enable_cache: !no_cache,
        schema,
    };

    match loader.load(path, options).await {
        Ok(payload) => {
            let output =
                render::render_payload(&payload, format.unwrap_or(config.output_format), config.theme)?;
            println!("{}", output.trim_end());
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", style("✗").red(), e);
            Err(e.into())
        }
    }
}

/// Validation result for one dataset file.
#[derive(Debug)]
pub struct FileReport {
    pub name: String,
    pub errors: Vec<String>,
}

impl FileReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Dataset files in `dir`, sorted by name. A missing directory has none.
fn dataset_files(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.extension().is_some_and(|ext| ext == "json") && !NON_DATASET_FILES.contains(&name)
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Check every dataset in `dir` against the schema document at
/// `schema_file`, the directory's own `schema.json`, or the built-in
/// benchmark schema, in that order.
pub fn validate_dir(
    dir: &Path,
    schema_file: Option<&Path>,
) -> Result<Vec<FileReport>, Box<dyn std::error::Error>> {
    // Without an explicit schema, a schema.json next to the datasets wins
    // over the built-in one.
    let local_schema = dir.join("schema.json");
    let schema_file =
        schema_file.or_else(|| local_schema.is_file().then_some(local_schema.as_path()));
    let custom = schema_file
        .map(|path| JsonSchema::from_json_file(path).and_then(CompiledSchema::compile))
        .transpose()?;
    let validator = Validator::new()?;
    let files = dataset_files(dir)?;
    debug!(
        dir = %dir.display(),
        files = files.len(),
        custom_schema = custom.is_some(),
        "Validating datasets"
    );

    let mut reports = Vec::new();
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let errors = match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str::<Value>(&content).map_err(|e| e.to_string()))
        {
            Ok(value) => {
                let outcome: ValidationOutcome = match &custom {
                    Some(schema) => Validator::validate_with(schema, &value),
                    None => validator.validate_benchmark_data(&value),
                };
                outcome.errors
            }
            Err(e) => vec![format!("Invalid JSON: {}", e)],
        };

        reports.push(FileReport { name, errors });
    }
    Ok(reports)
}

/// Validate benchmark datasets on disk.
pub fn validate(dir: &Path, schema_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let reports = validate_dir(dir, schema_file)?;

    if reports.is_empty() {
        println!("No benchmark datasets found.");
        return Ok(());
    }

    let mut failed = 0;
    for report in &reports {
        if report.is_valid() {
            println!("{} {}", style("✓").green(), report.name);
        } else {
            failed += 1;
            println!("{} {}", style("✗").red(), report.name);
            for error in &report.errors {
                println!("    {}", error);
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} datasets failed validation", failed, reports.len()).into());
    }

    println!("\nAll {} datasets are valid", reports.len());
    Ok(())
}

/// List cache entries.
pub fn list_cache(config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let cache = open_cache(config)?;
    let entries = cache.entries();

    if entries.is_empty() {
        println!("{} No cache entries", style("i").blue());
        return Ok(());
    }

    let now = chrono::Utc::now().timestamp_millis();
    let ttl_ms = i64::try_from(cache.ttl().as_millis()).unwrap_or(i64::MAX);
    for (path, entry) in &entries {
        let status = if entry.is_fresh(now, ttl_ms) {
            style("fresh").green()
        } else {
            style("expired").dim()
        };
        match entry.age_ms(now) {
            Some(age) => {
                let age = chrono::Duration::milliseconds(age);
                println!("  {} ({}, {}m old)", style(path).bold(), status, age.num_minutes());
            }
            None => println!("  {} ({}, bad timestamp)", style(path).bold(), status),
        }
    }
    println!("\n{} entries in {}", entries.len(), config.cache_dir()?.display());
    Ok(())
}

/// Clear cache.
pub fn clear_cache(config: &CliConfig, path: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let cache = open_cache(config)?;
    match path {
        Some(path) => {
            cache.clear(path);
            println!("{} Cleared {}", style("✓").green(), style(path).bold());
        }
        None => {
            let removed = cache.clear_all();
            println!("{} Cleared {} cache entries", style("✓").green(), removed);
        }
    }
    Ok(())
}

/// Show configuration.
pub fn show_config(config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Current configuration:");
    println!("  base_url: {}", config.base_url);
    println!("  cache_dir: {}", config.cache_dir()?.display());
    println!("  output_format: {:?}", config.output_format);
    println!("  theme: {:?}", config.theme);

    if let Ok(path) = CliConfig::config_path() {
        println!("\nConfig file: {}", path.display());
    }

    Ok(())
}

/// Set configuration.
pub fn set_config(key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CliConfig::load().unwrap_or_default();
    config.set(key, value)?;
    config.save()?;

    println!("{} Set {} = {}", style("✓").green(), key, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn write_json(dir: &Path, name: &str, value: &Value) {
        std::fs::write(dir.join(name), serde_json::to_string_pretty(value).unwrap()).unwrap();
    }

    #[test]
    fn test_validate_dir_skips_schema_and_template() {
        let dir = tempfile::tempdir().unwrap();
        write_json(
            dir.path(),
            "atlas-4096.json",
            &json!({ "cluster": "atlas", "nodes": 4096, "latency_us": [] }),
        );
        write_json(dir.path(), "schema.json", &json!({ "type": "object" }));
        write_json(dir.path(), "TEMPLATE.json", &json!({ "cluster": "" , "bogus": 1 }));
        std::fs::write(dir.path().join("README.md"), "# datasets").unwrap();

        let reports = validate_dir(dir.path(), None).unwrap();
        let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, vec!["atlas-4096.json"]);
        assert!(reports[0].is_valid());
    }

    #[test]
    fn test_validate_dir_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_json(
            dir.path(),
            "bad.json",
            &json!({ "latency_us": [{ "size": "invalid", "p50": 1.0, "p95": 2.0 }] }),
        );
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

        let reports = validate_dir(dir.path(), None).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].name, "bad.json");
        assert_eq!(
            reports[0].errors,
            vec!["/latency_us/0/size must match pattern \"^[0-9]+(B|KB|MB|GB)$\"".to_string()]
        );
        assert_eq!(reports[1].name, "broken.json");
        assert!(reports[1].errors[0].starts_with("Invalid JSON"));
    }

    #[test]
    fn test_validate_dir_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let reports = validate_dir(&dir.path().join("absent"), None).unwrap();
        assert!(reports.is_empty());
        assert!(validate(&dir.path().join("absent"), None).is_ok());
    }

    #[test]
    fn test_validate_dir_with_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        let schema_path = dir.path().join("schema.json");
        write_json(
            dir.path(),
            "schema.json",
            &json!({
                "type": "object",
                "required": ["cluster"],
                "properties": { "cluster": { "type": "string" } }
            }),
        );
        write_json(dir.path(), "a.json", &json!({ "cluster": "atlas" }));
        write_json(dir.path(), "b.json", &json!({ "nodes": 4 }));

        let reports = validate_dir(dir.path(), Some(&schema_path)).unwrap();

        assert!(reports[0].is_valid());
        assert_eq!(
            reports[1].errors,
            vec!["(root) must have required property 'cluster'".to_string()]
        );
    }

    #[test]
    fn test_validate_dir_uses_local_schema_json() {
        let dir = tempfile::tempdir().unwrap();
        write_json(
            dir.path(),
            "schema.json",
            &json!({
                "type": "object",
                "required": ["fabric"],
                "properties": { "fabric": { "type": "string" } }
            }),
        );
        write_json(dir.path(), "a.json", &json!({ "fabric": "NDR" }));
        write_json(dir.path(), "b.json", &json!({ "cluster": "atlas" }));

        let reports = validate_dir(dir.path(), None).unwrap();

        assert!(reports[0].is_valid());
        assert_eq!(
            reports[1].errors,
            vec!["(root) must have required property 'fabric'".to_string()]
        );
    }

    #[test]
    fn test_validate_fails_when_any_dataset_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_json(dir.path(), "bad.json", &json!({ "nodes": 0 }));
        assert!(validate(dir.path(), None).is_err());
    }

    #[test]
    fn test_clear_cache_with_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            cache_dir: Some(dir.path().to_path_buf()),
            ..CliConfig::default()
        };

        let cache = open_cache(&config).unwrap();
        cache.write("/charts/a.json", &json!({ "labels": [] }));
        cache.write("/charts/b.json", &json!({ "labels": [] }));

        clear_cache(&config, Some("/charts/a.json")).unwrap();
        let remaining: Vec<String> = open_cache(&config)
            .unwrap()
            .entries()
            .into_iter()
            .map(|(path, _)| path)
            .collect();
        assert_eq!(remaining, vec!["/charts/b.json".to_string()]);

        clear_cache(&config, None).unwrap();
        assert!(open_cache(&config).unwrap().entries().is_empty());
    }
}
