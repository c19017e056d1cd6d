//! Text-generation port and its backends.
//!
//! The [`Generator`] trait decouples agents from the model backend. The
//! command backend pipes prompts into a local CLI (`ollama run` by default);
//! the Ollama backend talks to the HTTP API. Tests use scripted generators
//! from `test_support` that return queued replies without spawning anything.

use std::process::Command;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::io::config::{GeneratorBackend, GeneratorConfig};
use crate::io::process::{ProcessLimits, run_bounded};

/// Failure to obtain a completion. Fatal for the stage that requested it.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generator could not be started: {0}")]
    Launch(String),

    #[error("generator timed out after {0:?}")]
    Timeout(Duration),

    #[error("generator exited with status {status:?}: {stderr}")]
    Exited { status: Option<i32>, stderr: String },

    #[error("generator request failed: {0}")]
    Transport(String),

    #[error("generator returned an unusable response: {0}")]
    Response(String),
}

/// Abstraction over text-generation backends: prompt in, completion out.
pub trait Generator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

impl<G: Generator + ?Sized> Generator for &G {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }
}

/// Build the backend selected in config.
pub fn generator_from_config(config: &GeneratorConfig) -> Result<Box<dyn Generator>> {
    let generator: Box<dyn Generator> = match config.backend {
        GeneratorBackend::Command => Box::new(CommandGenerator::new(
            config.command.clone(),
            config.limits(),
        )),
        GeneratorBackend::Ollama => Box::new(OllamaGenerator::new(
            &config.ollama_url,
            &config.model,
            Duration::from_secs(config.timeout_secs),
        )?),
    };
    Ok(generator)
}

/// Generator that spawns a CLI, writes the prompt to its stdin and reads the
/// completion from its stdout.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    argv: Vec<String>,
    limits: ProcessLimits,
}

impl CommandGenerator {
    pub fn new(argv: Vec<String>, limits: ProcessLimits) -> Self {
        Self { argv, limits }
    }
}

impl Generator for CommandGenerator {
    #[instrument(skip_all, fields(prompt_bytes = prompt.len()))]
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| GenerationError::Launch("empty generator command".to_string()))?;
        info!(%program, "requesting completion");

        let mut cmd = Command::new(program);
        cmd.args(args);
        let output = run_bounded(cmd, Some(prompt.as_bytes().to_vec()), self.limits)
            .map_err(|e| GenerationError::Launch(format!("{e:#}")))?;

        if output.timed_out {
            return Err(GenerationError::Timeout(self.limits.timeout));
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "generator failed");
            return Err(GenerationError::Exited {
                status: output.status.code(),
                stderr: output.stderr_text().trim().to_string(),
            });
        }
        let completion = output.stdout_text();
        debug!(completion_bytes = completion.len(), "completion received");
        Ok(completion)
    }
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// Generator backed by Ollama's non-streaming `/api/generate` endpoint.
pub struct OllamaGenerator {
    endpoint: String,
    model: String,
    http: reqwest::blocking::Client,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("build http client: {e}"))?;
        Ok(Self {
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.to_string(),
            http,
        })
    }
}

impl Generator for OllamaGenerator {
    #[instrument(skip_all, fields(model = %self.model, prompt_bytes = prompt.len()))]
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        info!(endpoint = %self.endpoint, "requesting completion");
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&OllamaRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            warn!(%status, "ollama returned an error");
            return Err(GenerationError::Transport(format!("{status}: {body}")));
        }
        let body: OllamaResponse = resp
            .json()
            .map_err(|e| GenerationError::Response(e.to_string()))?;
        debug!(completion_bytes = body.response.len(), "completion received");
        Ok(body.response)
    }
}
