//! Configuration loaded from `rostrum.toml`.
//!
//! Every table has sensible defaults, so a missing file or a partial one
//! both work. Environment variables overlay the file for the values that
//! usually differ per machine (backend URL, generative API key).

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

use crate::error::{DebateError, Result};

const DEFAULT_CONFIG_FILE: &str = "rostrum.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub generative: GenerativeConfig,
    #[serde(default)]
    pub voices: VoicesConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Where the debate backend lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

/// The generative-language endpoint used for sparring, analysis and the
/// rebuttal trainer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerativeConfig {
    pub api_url: String,
    pub api_key: Option<String>,
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
                .to_string(),
            api_key: None,
        }
    }
}

/// Voice IDs for speech synthesis, keyed by side of the house.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoicesConfig {
    pub government: String,
    pub opposition: String,
    pub moderator: String,
}

impl Default for VoicesConfig {
    fn default() -> Self {
        Self {
            government: "bf_emma".to_string(),
            opposition: "bm_george".to_string(),
            moderator: "af_sky".to_string(),
        }
    }
}

impl VoicesConfig {
    /// Government and Proposition benches share one voice, Opposition
    /// benches another; everything else (the Moderator) gets the announcer
    /// voice.
    pub fn for_team(&self, team: &str) -> &str {
        if team.contains("Government") || team.contains("Proposition") {
            &self.government
        } else if team.contains("Opposition") {
            &self.opposition
        } else {
            &self.moderator
        }
    }
}

/// Knobs for the live session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Characters per second for the typing reveal of generated speeches.
    /// Zero shows the whole speech at once.
    pub reveal_cps: u32,
    /// Seconds allowed for a rebuttal in the trainer.
    pub rebuttal_secs: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reveal_cps: 35,
            rebuttal_secs: 60,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| DebateError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    /// Load configuration from string content.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| DebateError::Config(format!("Failed to parse config: {e}")))
    }

    /// Loads the given file, or `rostrum.toml` from the working directory if
    /// present, or the built-in defaults. The environment overlay is applied
    /// either way.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };
        config.overlay(
            env::var("ROSTRUM_BACKEND_URL").ok(),
            env::var("GENERATIVE_API_KEY")
                .or_else(|_| env::var("GEMINI_API_KEY"))
                .ok(),
        );
        Ok(config)
    }

    fn overlay(&mut self, backend_url: Option<String>, api_key: Option<String>) {
        if let Some(url) = backend_url {
            self.backend.base_url = url;
        }
        if let Some(key) = api_key {
            self.generative.api_key = Some(key);
        }
    }

    /// Full API prefix for the backend.
    pub fn api_base(&self) -> String {
        format!("{}/api/v1", self.backend.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend.base_url, "http://localhost:3000");
        assert_eq!(config.api_base(), "http://localhost:3000/api/v1");
        assert_eq!(config.session.reveal_cps, 35);
        assert_eq!(config.session.rebuttal_secs, 60);
        assert!(config.generative.api_key.is_none());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            [backend]
            base_url = "https://debate.example.org/"

            [session]
            reveal_cps = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.api_base(), "https://debate.example.org/api/v1");
        assert_eq!(config.session.reveal_cps, 0);
        assert_eq!(config.session.rebuttal_secs, 60);
        assert_eq!(config.voices.moderator, "af_sky");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml("backend = not toml").unwrap_err();
        assert!(matches!(err, DebateError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[generative]").unwrap();
        writeln!(file, "api_url = \"https://llm.example/v1:generateContent\"").unwrap();
        writeln!(file, "api_key = \"k-123\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.generative.api_key.as_deref(), Some("k-123"));
    }

    #[test]
    fn test_overlay_replaces_values() {
        let mut config = Config::default();
        config.overlay(
            Some("http://10.0.0.2:3000".to_string()),
            Some("env-key".to_string()),
        );
        assert_eq!(config.backend.base_url, "http://10.0.0.2:3000");
        assert_eq!(config.generative.api_key.as_deref(), Some("env-key"));
        config.overlay(None, None);
        assert_eq!(config.generative.api_key.as_deref(), Some("env-key"));
    }

    #[test]
    fn test_voice_for_team() {
        let voices = VoicesConfig::default();
        assert_eq!(voices.for_team("Opening Government"), "bf_emma");
        assert_eq!(voices.for_team("Proposition"), "bf_emma");
        assert_eq!(voices.for_team("Closing Opposition"), "bm_george");
        assert_eq!(voices.for_team("Moderator"), "af_sky");
    }
}
