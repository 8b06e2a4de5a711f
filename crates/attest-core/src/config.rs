use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "attest.yaml";

/// Explicit harness configuration. Every collaborator (store, generation
/// client, judge) is built from this value; nothing reads process state later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_db")]
    pub db: PathBuf,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub judge: JudgeSettings,
    /// Citation allow-list applied to every case in addition to the case's own.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_sources: Vec<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            schema: default_schema(),
            db: default_db(),
            generation: GenerationSettings::default(),
            judge: JudgeSettings::default(),
            known_sources: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationSettings {
    #[serde(default = "default_generation_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_generation_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_generation_timeout(),
            temperature: default_generation_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JudgeSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Falls back to the generation model when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "default_judge_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub temperature: f32,
}

impl Default for JudgeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: None,
            timeout_seconds: default_judge_timeout(),
            temperature: 0.0,
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:11434/api/chat".into()
}
fn default_model() -> String {
    "llama3.1:8b".into()
}
fn default_schema() -> String {
    "main".into()
}
fn default_db() -> PathBuf {
    PathBuf::from(".attest/attest.db")
}
fn default_generation_timeout() -> u64 {
    180
}
fn default_generation_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_judge_timeout() -> u64 {
    60
}
fn default_true() -> bool {
    true
}

impl HarnessConfig {
    pub fn judge_model(&self) -> &str {
        self.judge.model.as_deref().unwrap_or(&self.model)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError("endpoint must not be empty".into()));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError("model must not be empty".into()));
        }
        if !is_valid_schema_name(&self.schema) {
            return Err(ConfigError(format!(
                "schema '{}' is not a valid identifier (letters, digits, underscore)",
                self.schema
            )));
        }
        if self.generation.timeout_seconds == 0 || self.judge.timeout_seconds == 0 {
            return Err(ConfigError("timeouts must be at least 1 second".into()));
        }
        Ok(())
    }
}

pub fn is_valid_schema_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Loads `attest.yaml`. A missing file yields defaults; unknown keys are
/// reported (or rejected in strict mode). Relative `db` paths resolve
/// against the config file's directory.
pub fn load_config(path: &Path, strict: bool) -> Result<HarnessConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(HarnessConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;

    let mut ignored_keys = Vec::new();
    let deserializer = serde_yaml::Deserializer::from_str(&raw);
    let mut cfg: HarnessConfig = serde_ignored::deserialize(deserializer, |p| {
        ignored_keys.push(p.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;

    if !ignored_keys.is_empty() {
        if strict {
            return Err(ConfigError(format!(
                "Unknown fields detected in strict mode: {:?} (file: {})",
                ignored_keys,
                path.display()
            )));
        }
        tracing::warn!(keys = ?ignored_keys, "ignored unknown config fields");
    }

    if cfg.db.is_relative() {
        let base = path.parent().unwrap_or(Path::new("."));
        cfg.db = resolve_relative(base, &cfg.db);
    }

    Ok(cfg)
}

fn resolve_relative(base: &Path, rel: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in base.join(rel).components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

pub const SAMPLE_CONFIG: &str = r#"endpoint: "http://localhost:11434/api/chat"
model: "llama3.1:8b"
schema: main
db: ".attest/attest.db"
generation:
  timeout_seconds: 180
  temperature: 0.2
  max_tokens: 2048
judge:
  enabled: true
  timeout_seconds: 60
known_sources:
  - "North American Spine Society"
  - "American College of Radiology"
"#;

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, SAMPLE_CONFIG)
        .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses_and_validates() {
        let cfg: HarnessConfig = serde_yaml::from_str(SAMPLE_CONFIG).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.schema, "main");
        assert_eq!(cfg.judge_model(), "llama3.1:8b");
        assert_eq!(cfg.known_sources.len(), 2);
    }

    #[test]
    fn test_schema_names() {
        assert!(is_valid_schema_name("main"));
        assert!(is_valid_schema_name("eval_2024"));
        assert!(!is_valid_schema_name("1eval"));
        assert!(!is_valid_schema_name("eval; DROP TABLE runs"));
        assert!(!is_valid_schema_name(""));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let cfg = load_config(Path::new("/nonexistent/attest.yaml"), true).unwrap();
        assert_eq!(cfg, HarnessConfig::default());
    }

    #[test]
    fn test_relative_db_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attest.yaml");
        std::fs::write(&path, "db: ./data/../runs.db\n").unwrap();
        let cfg = load_config(&path, false).unwrap();
        assert_eq!(cfg.db, dir.path().join("runs.db"));
    }

    #[test]
    fn test_strict_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attest.yaml");
        std::fs::write(&path, "model: m\nparallel: 4\n").unwrap();
        let err = load_config(&path, true).unwrap_err();
        assert!(err.to_string().contains("parallel"));
        assert!(load_config(&path, false).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let cfg = HarnessConfig {
            endpoint: "localhost:11434".into(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
