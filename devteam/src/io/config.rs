//! Team configuration stored in `devteam.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::io::process::ProcessLimits;

pub const DEFAULT_CONFIG_FILE: &str = "devteam.toml";

/// Team configuration (TOML).
///
/// Intended to be edited by humans. Missing tables and fields fall back to
/// defaults that talk to a local Ollama install and a `python3` interpreter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct TeamConfig {
    /// Directory for per-component log files. Unset keeps logs on stderr only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    pub generator: GeneratorConfig,
    pub sandbox: SandboxConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorBackend {
    /// Spawn `command` with the prompt on stdin.
    Command,
    /// POST to the Ollama HTTP API.
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub backend: GeneratorBackend,
    pub command: Vec<String>,
    pub ollama_url: String,
    pub model: String,
    /// Per-request wall-clock budget in seconds.
    pub timeout_secs: u64,
    pub output_limit_bytes: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            backend: GeneratorBackend::Command,
            command: vec![
                "ollama".to_string(),
                "run".to_string(),
                "llama3.1:8b".to_string(),
            ],
            ollama_url: "http://localhost:11434".to_string(),
            model: "llama3.1:8b".to_string(),
            timeout_secs: 10 * 60,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl GeneratorConfig {
    pub fn limits(&self) -> ProcessLimits {
        ProcessLimits {
            timeout: Duration::from_secs(self.timeout_secs),
            output_limit_bytes: self.output_limit_bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SandboxConfig {
    /// Interpreter argv; the runner script and its arguments are appended.
    pub interpreter: Vec<String>,
    pub timeout_secs: u64,
    /// Truncate captured stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: vec!["python3".to_string(), "-I".to_string()],
            timeout_secs: 30,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl SandboxConfig {
    pub fn limits(&self) -> ProcessLimits {
        ProcessLimits {
            timeout: Duration::from_secs(self.timeout_secs),
            output_limit_bytes: self.output_limit_bytes,
        }
    }
}

impl TeamConfig {
    pub fn validate(&self) -> Result<()> {
        let generator = &self.generator;
        if generator.timeout_secs == 0 {
            return Err(anyhow!("generator.timeout_secs must be > 0"));
        }
        if generator.output_limit_bytes == 0 {
            return Err(anyhow!("generator.output_limit_bytes must be > 0"));
        }
        match generator.backend {
            GeneratorBackend::Command => {
                if argv_is_blank(&generator.command) {
                    return Err(anyhow!("generator.command must be a non-empty array"));
                }
            }
            GeneratorBackend::Ollama => {
                if generator.ollama_url.trim().is_empty() {
                    return Err(anyhow!("generator.ollama_url must not be empty"));
                }
                if generator.model.trim().is_empty() {
                    return Err(anyhow!("generator.model must not be empty"));
                }
            }
        }
        if self.sandbox.timeout_secs == 0 {
            return Err(anyhow!("sandbox.timeout_secs must be > 0"));
        }
        if self.sandbox.output_limit_bytes == 0 {
            return Err(anyhow!("sandbox.output_limit_bytes must be > 0"));
        }
        if argv_is_blank(&self.sandbox.interpreter) {
            return Err(anyhow!("sandbox.interpreter must be a non-empty array"));
        }
        Ok(())
    }
}

fn argv_is_blank(argv: &[String]) -> bool {
    argv.first().is_none_or(|program| program.trim().is_empty())
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `TeamConfig::default()`.
pub fn load_config(path: &Path) -> Result<TeamConfig> {
    if !path.exists() {
        let cfg = TeamConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: TeamConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &TeamConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let tmp_path = path.with_extension("toml.tmp");
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, TeamConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested/devteam.toml");
        let mut cfg = TeamConfig::default();
        cfg.log_dir = Some(PathBuf::from("logs"));
        cfg.generator.backend = GeneratorBackend::Ollama;
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("devteam.toml");
        fs::write(&path, "[sandbox]\ntimeout_secs = 5\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.sandbox.timeout_secs, 5);
        assert_eq!(cfg.sandbox.interpreter, SandboxConfig::default().interpreter);
        assert_eq!(cfg.generator, GeneratorConfig::default());
    }

    #[test]
    fn rejects_zero_sandbox_timeout() {
        let mut cfg = TeamConfig::default();
        cfg.sandbox.timeout_secs = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("sandbox.timeout_secs"));
    }

    #[test]
    fn rejects_blank_interpreter() {
        let mut cfg = TeamConfig::default();
        cfg.sandbox.interpreter = vec!["  ".to_string()];
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("sandbox.interpreter"));
    }

    #[test]
    fn command_backend_requires_command() {
        let mut cfg = TeamConfig::default();
        cfg.generator.command.clear();
        assert!(cfg.validate().is_err());

        cfg.generator.backend = GeneratorBackend::Ollama;
        cfg.validate().expect("ollama backend ignores command");
    }

    #[test]
    fn unknown_backend_is_a_parse_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("devteam.toml");
        fs::write(&path, "[generator]\nbackend = \"carrier-pigeon\"\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
    }
}
