//! Service configuration and guardrail rules.
//!
//! This crate defines everything the triage server reads at startup:
//!
//! - [`ServiceConfig`] — Bind address, model identifiers, backend settings
//! - [`GuardrailRule`] and [`GuardrailRules`] — Ordered keyword shortcuts
//!
//! # Loading from the environment
//!
//! ```rust,ignore
//! use triage_config::ServiceConfig;
//!
//! dotenvy::dotenv().ok();
//! let config = ServiceConfig::from_env()?;
//! ```
//!
//! # Guardrail rules
//!
//! ```rust
//! use triage_config::GuardrailRules;
//!
//! let rules = GuardrailRules::from_json(r#"[
//!     {"keyword": "rash", "disease": "Dermatitis"},
//!     {"keyword": "cold", "disease": "Common Cold"}
//! ]"#).unwrap();
//!
//! assert_eq!(rules.len(), 2);
//! assert_eq!(rules.iter().next().unwrap().keyword, "rash");
//! ```

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_HUB_API_BASE: &str = "https://api-inference.huggingface.co";
const DEFAULT_TEXT_MODEL: &str = "Iloriayomide/my-symptom-checker-biobert";
const DEFAULT_IMAGE_MODEL: &str = "Anwarkh1/Skin_Cancer-Image_Classification";
const DEFAULT_VOICE_MODEL: &str = "openai/whisper-tiny";
const DEFAULT_MAX_UPLOAD_MB: usize = 25;

/// Errors that can occur when loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse JSON configuration.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// An environment variable held an unusable value.
    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },

    /// A guardrail rule had an empty keyword.
    #[error("Guardrail rule #{0} has an empty keyword")]
    EmptyKeyword(usize),
}

impl ConfigError {
    /// Creates an IO error with path context.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Creates an invalid-value error.
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Guardrail Rules
// ============================================================================

/// A single keyword shortcut mapping to a disease name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailRule {
    /// Substring searched for (case-insensitively) in the input text.
    pub keyword: String,
    /// Disease reported when the keyword matches.
    pub disease: String,
}

impl GuardrailRule {
    pub fn new(keyword: impl Into<String>, disease: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            disease: disease.into(),
        }
    }
}

/// Ordered list of guardrail rules.
///
/// Order is significant: the matcher walks the list front to back and the
/// first rule whose keyword occurs in the input wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardrailRules {
    rules: Vec<GuardrailRule>,
}

impl Default for GuardrailRules {
    fn default() -> Self {
        Self::builtin()
    }
}

impl GuardrailRules {
    /// Built-in rule set used when no rules file is configured.
    pub fn builtin() -> Self {
        Self {
            rules: vec![
                GuardrailRule::new("cold", "Common Cold"),
                GuardrailRule::new("flu", "Influenza"),
                GuardrailRule::new("headache", "Migraine"),
                GuardrailRule::new("cough", "Bronchitis"),
                GuardrailRule::new("acne", "Acne"),
            ],
        }
    }

    /// Creates a rule set from an explicit list, rejecting empty keywords.
    pub fn new(rules: Vec<GuardrailRule>) -> Result<Self, ConfigError> {
        if let Some(idx) = rules.iter().position(|r| r.keyword.trim().is_empty()) {
            return Err(ConfigError::EmptyKeyword(idx));
        }
        Ok(Self { rules })
    }

    /// Parses a JSON array of `{keyword, disease}` objects.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let rules: Vec<GuardrailRule> = serde_json::from_str(json)?;
        Self::new(rules)
    }

    /// Loads rules from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        Self::from_json(&content)
    }

    /// Iterates rules in match order.
    pub fn iter(&self) -> impl Iterator<Item = &GuardrailRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ============================================================================
// Service Config
// ============================================================================

/// Model identifiers for the three pipelines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelIds {
    pub text: String,
    pub image: String,
    pub voice: String,
}

/// Connection settings for the hosted inference backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubSettings {
    pub api_base: String,
    pub token: Option<String>,
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub hub: HubSettings,
    pub models: ModelIds,
    /// Optional path to a JSON guardrail rules file.
    pub guardrail_rules_path: Option<PathBuf>,
    /// Maximum accepted request body in bytes.
    pub max_upload_bytes: usize,
}

impl ServiceConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let bind_raw = get_or("TRIAGE_BIND_ADDR", DEFAULT_BIND_ADDR);
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("TRIAGE_BIND_ADDR", format!("{bind_raw}: {e}")))?;

        let max_upload_mb = match get("TRIAGE_MAX_UPLOAD_MB") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|mb| *mb > 0)
                .ok_or_else(|| ConfigError::invalid("TRIAGE_MAX_UPLOAD_MB", format!("expected a positive integer, got '{raw}'")))?,
            None => DEFAULT_MAX_UPLOAD_MB,
        };
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| ConfigError::invalid("TRIAGE_MAX_UPLOAD_MB", format!("{max_upload_mb} MB does not fit in a byte count")))?;

        Ok(Self {
            bind_addr,
            hub: HubSettings {
                api_base: get_or("TRIAGE_HF_API_BASE", DEFAULT_HUB_API_BASE)
                    .trim_end_matches('/')
                    .to_string(),
                token: get("HF_TOKEN"),
            },
            models: ModelIds {
                text: get_or("TRIAGE_TEXT_MODEL", DEFAULT_TEXT_MODEL),
                image: get_or("TRIAGE_IMAGE_MODEL", DEFAULT_IMAGE_MODEL),
                voice: get_or("TRIAGE_VOICE_MODEL", DEFAULT_VOICE_MODEL),
            },
            guardrail_rules_path: get("TRIAGE_GUARDRAIL_RULES").map(PathBuf::from),
            max_upload_bytes,
        })
    }

    /// Resolves the guardrail rules: the configured file, or the built-in set.
    pub fn guardrail_rules(&self) -> Result<GuardrailRules, ConfigError> {
        match &self.guardrail_rules_path {
            Some(path) => GuardrailRules::load_from_file(path),
            None => Ok(GuardrailRules::builtin()),
        }
    }
}
