//! Configuration for the orchestrator.
//!
//! # Credential handling
//!
//! - Config file permission validation on Unix systems
//! - Rejects world-readable files containing API keys
//! - Warns about API keys stored in config files

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;
use vidya_common::AgentMode;
use vidya_knowledge::KnowledgeConfig;
use vidya_llm::LlmConfig;

/// Main orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Upper bound on a single agent invocation.
    #[serde(default = "default_agent_timeout_ms")]
    pub agent_timeout_ms: u64,

    /// Agent that answers when nothing else is confident. Must be registered.
    #[serde(default = "default_fallback_agent")]
    pub fallback_agent: String,

    /// Applied to every agent at start-up when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<AgentMode>,

    /// Remote AI provider. Online paths fall back to offline without it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,

    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Candidates kept after ranking.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Secondaries must score strictly above this to enhance a response.
    #[serde(default = "default_enhancement_threshold")]
    pub enhancement_threshold: f32,

    #[serde(default = "default_max_enhancements")]
    pub max_enhancements: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Cloud speech credential. Falls back to `GOOGLE_CLOUD_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_agent_timeout_ms() -> u64 {
    30_000
}

fn default_fallback_agent() -> String {
    "offline_knowledge".into()
}

fn default_max_candidates() -> usize {
    3
}

fn default_enhancement_threshold() -> f32 {
    0.5
}

fn default_max_enhancements() -> usize {
    2
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_candidates: default_max_candidates(),
            enhancement_threshold: default_enhancement_threshold(),
            max_enhancements: default_max_enhancements(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            selection: SelectionConfig::default(),
            agent_timeout_ms: default_agent_timeout_ms(),
            fallback_agent: default_fallback_agent(),
            default_mode: None,
            llm: None,
            speech: SpeechConfig::default(),
            knowledge: KnowledgeConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration from a TOML file.
    ///
    /// On Unix systems the file must be a regular file, must not be
    /// world-writable, and must not be world-readable if it holds an API key.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        #[cfg(unix)]
        validate_config_file_permissions(path)?;

        let config = Self::from_file_unchecked(path)?;

        let stored_keys = config.llm.as_ref().is_some_and(|l| l.api_key.is_some())
            || config.speech.api_key.is_some();
        if stored_keys {
            warn!(
                "API key found in config file '{}'. Prefer environment variables \
                 (GEMINI_API_KEY, OPENAI_API_KEY, GOOGLE_CLOUD_API_KEY).",
                path.display()
            );
        }

        Ok(config)
    }

    /// Load configuration from a TOML file without permission checks.
    pub fn from_file_unchecked(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_millis(self.agent_timeout_ms)
    }
}

impl SpeechConfig {
    /// Explicit non-empty key first, then `GOOGLE_CLOUD_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("GOOGLE_CLOUD_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }
}

#[cfg(unix)]
fn validate_config_file_permissions(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::symlink_metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;

    if !metadata.is_file() {
        anyhow::bail!(
            "Config path '{}' is not a regular file. Symlinks and directories are not allowed.",
            path.display()
        );
    }

    let permission_bits = metadata.permissions().mode() & 0o777;

    if permission_bits & 0o002 != 0 {
        anyhow::bail!(
            "Config file '{}' is world-writable (mode {:04o}). Fix with: chmod o-w {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    let content = std::fs::read_to_string(path)?;
    let has_api_key = content.lines().any(|line| {
        let line = line.trim_start();
        !line.starts_with('#') && line.starts_with("api_key")
    });

    if has_api_key && permission_bits & 0o004 != 0 {
        anyhow::bail!(
            "Config file '{}' contains an API key but is world-readable (mode {:04o}). \
             Fix with: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    if has_api_key && permission_bits & 0o040 != 0 {
        warn!(
            "Config file '{}' contains an API key and is group-readable (mode {:04o}). \
             Consider: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    Ok(())
}
