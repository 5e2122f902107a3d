// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::models::ModelName;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub generation: GenerationConfig,
    pub pipeline: PipelineConfig,
    pub git: GitConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Base URL of an OpenAI-compatible API, without the `/chat/completions` suffix.
    pub base_url: String,
    pub api_key: Option<String>,
    pub default_model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    /// Diffs longer than this are clipped before being sent to the backend.
    pub max_diff_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub max_concurrent_files: usize,
    pub max_message_length: usize,
    pub commit_individually: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitConfig {
    pub binary: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub name: String,
}

impl Config {
    /// Layers the built-in defaults, the optional TOML file and the
    /// `GIT_AUTOCOMMIT__*` environment, later sources winning.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let file = path.unwrap_or(Path::new("config/default.toml"));

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(file).required(false))
            .add_source(
                config::Environment::with_prefix("GIT_AUTOCOMMIT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            generation: GenerationConfig {
                base_url: "http://localhost:11434/v1".to_string(),
                api_key: None,
                default_model: "llama3.2".to_string(),
                timeout_secs: 60,
                temperature: 0.2,
                max_diff_chars: 12_000,
            },
            pipeline: PipelineConfig {
                max_concurrent_files: 4,
                max_message_length: 72,
                commit_individually: true,
            },
            git: GitConfig {
                binary: "git".to_string(),
                timeout_secs: 30,
            },
            server: ServerConfig {
                name: "git_autocommit".to_string(),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.max_concurrent_files == 0 {
            return Err(PipelineError::Config(
                "max_concurrent_files must be greater than 0".to_string(),
            ));
        }

        // room for at least one character plus the ellipsis
        if self.pipeline.max_message_length < 4 {
            return Err(PipelineError::Config(
                "max_message_length must be at least 4".to_string(),
            ));
        }

        if self.git.timeout_secs == 0 || self.generation.timeout_secs == 0 {
            return Err(PipelineError::Config(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        ModelName::parse(&self.generation.default_model)
            .map_err(|e| PipelineError::Config(format!("default_model: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default_config().validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::default_config();
        config.pipeline.max_concurrent_files = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_short_message_length_rejected() {
        let mut config = Config::default_config();
        config.pipeline.max_message_length = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_default_model_rejected() {
        let mut config = Config::default_config();
        config.generation.default_model = "bad model!".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            r#"
[generation]
base_url = "https://api.groq.com/openai/v1"
default_model = "openai/gpt-oss-120b"
timeout_secs = 20
temperature = 0.0
max_diff_chars = 4000

[pipeline]
max_concurrent_files = 2
max_message_length = 50
commit_individually = false

[git]
binary = "git"
timeout_secs = 10

[server]
name = "test-server"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.pipeline.max_concurrent_files, 2);
        assert_eq!(config.generation.default_model, "openai/gpt-oss-120b");
        assert!(!config.pipeline.commit_individually);
        assert_eq!(config.server.name, "test-server");
    }

    #[test]
    fn test_missing_file_keeps_defaults_and_environment() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        // SAFETY: no other test reads or writes this variable
        unsafe { std::env::set_var("GIT_AUTOCOMMIT__GENERATION__API_KEY", "gsk-from-env") };

        let config = Config::load(Some(&path)).unwrap();

        unsafe { std::env::remove_var("GIT_AUTOCOMMIT__GENERATION__API_KEY") };
        assert_eq!(config.generation.api_key.as_deref(), Some("gsk-from-env"));
        assert_eq!(config.generation.default_model, "llama3.2");
        assert_eq!(config.pipeline.max_concurrent_files, 4);
        assert_eq!(config.git.binary, "git");
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        fs::write(&path, "[pipeline]\nmax_message_length = 50\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.pipeline.max_message_length, 50);
        assert_eq!(config.pipeline.max_concurrent_files, 4);
        assert_eq!(config.server.name, "git_autocommit");
    }
}
