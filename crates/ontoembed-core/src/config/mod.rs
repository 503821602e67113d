//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::embedding::{Algorithm, CommandEmbedder};
use crate::evaluation::CommandEvaluator;
use crate::storage::DEFAULT_STORAGE_ROOT;

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "ONTOEMBED_CONFIG_DIR";

/// Environment variable overriding `storage.root` at load time
pub const STORAGE_ROOT_ENV: &str = "ONTOEMBED_STORAGE_ROOT";

/// Ontoembed configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one subdirectory per ontology
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub default_algorithm: Algorithm,
    /// External training command, run once per cache miss
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// External evaluation command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Serialize check-and-compute per (ontology, algorithm) within a process
    pub serialize_computations: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_STORAGE_ROOT),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            default_algorithm: Algorithm::Owl2Vec,
            command: None,
        }
    }
}

impl EmbeddingConfig {
    /// Embedder for the configured command, if any
    pub fn command_embedder(&self) -> anyhow::Result<Option<CommandEmbedder>> {
        self.command
            .as_deref()
            .map(|command| CommandEmbedder::from_command_line(command).map_err(anyhow::Error::from))
            .transpose()
    }
}

impl EvaluationConfig {
    pub fn command_evaluator(&self) -> anyhow::Result<Option<CommandEvaluator>> {
        self.command
            .as_deref()
            .map(|command| CommandEvaluator::from_command_line(command).map_err(anyhow::Error::from))
            .transpose()
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV) {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("ontoembed")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration with environment overrides applied
    ///
    /// `ONTOEMBED_STORAGE_ROOT` overrides the stored root.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_stored()?;
        if let Ok(root) = env::var(STORAGE_ROOT_ENV) {
            config.storage.root = PathBuf::from(root);
        }
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file, or use defaults if it doesn't exist
    pub fn load_stored() -> anyhow::Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.root.as_os_str().is_empty() {
            return Err(anyhow!("storage.root must not be empty"));
        }
        self.embedding.command_embedder()?;
        self.evaluation.command_evaluator()?;
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "storage.root" => Ok(self.storage.root.display().to_string()),
            "embedding.default_algorithm" => Ok(self.embedding.default_algorithm.to_string()),
            "embedding.command" => Ok(self
                .embedding
                .command
                .clone()
                .unwrap_or_else(|| "(not set)".to_string())),
            "evaluation.command" => Ok(self
                .evaluation
                .command
                .clone()
                .unwrap_or_else(|| "(not set)".to_string())),
            "cache.serialize_computations" => Ok(self.cache.serialize_computations.to_string()),
            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `ontoembed config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "storage.root" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("storage.root must not be empty"));
                }
                self.storage.root = PathBuf::from(value);
            }
            "embedding.default_algorithm" => {
                self.embedding.default_algorithm = value
                    .parse()
                    .with_context(|| format!("Invalid default_algorithm value: {}", value))?;
            }
            "embedding.command" => {
                if value.trim().is_empty() {
                    self.embedding.command = None;
                } else {
                    CommandEmbedder::from_command_line(value)?;
                    self.embedding.command = Some(value.to_string());
                }
            }
            "evaluation.command" => {
                if value.trim().is_empty() {
                    self.evaluation.command = None;
                } else {
                    CommandEvaluator::from_command_line(value)?;
                    self.evaluation.command = Some(value.to_string());
                }
            }
            "cache.serialize_computations" => {
                self.cache.serialize_computations = value
                    .parse()
                    .with_context(|| format!("Invalid serialize_computations value: {}", value))?;
            }
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `ontoembed config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = [
            "storage.root",
            "embedding.default_algorithm",
            "embedding.command",
            "evaluation.command",
            "cache.serialize_computations",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.storage.root, PathBuf::from("storage"));
        assert_eq!(config.embedding.default_algorithm, Algorithm::Owl2Vec);
        assert!(config.embedding.command.is_none());
        assert!(config.evaluation.command.is_none());
        assert!(!config.cache.serialize_computations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_toml_round_trip() {
        let mut config = Config::default();
        config.set("storage.root", "/var/lib/ontoembed").unwrap();
        config.set("embedding.default_algorithm", "RDF2Vec").unwrap();
        config.set("embedding.command", "python3 train.py").unwrap();
        config.set("evaluation.command", "python3 eval.py --folds 5").unwrap();
        config.set("cache.serialize_computations", "true").unwrap();

        let serialized = toml::to_string_pretty(&config).unwrap();
        assert!(serialized.contains("default_algorithm = \"rdf2vec\""));
        assert!(serialized.contains("[evaluation]"));

        let parsed = Config::from_toml(&serialized).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml("[storage]\nroot = \"data\"\n").unwrap();
        assert_eq!(config.storage.root, PathBuf::from("data"));
        assert_eq!(config.embedding, EmbeddingConfig::default());
    }

    #[test]
    fn test_config_get_and_list() {
        let config = Config::default();
        assert_eq!(config.get("storage.root").unwrap(), "storage");
        assert_eq!(config.get("embedding.default_algorithm").unwrap(), "owl2vec");
        assert_eq!(config.get("embedding.command").unwrap(), "(not set)");
        assert_eq!(config.get("evaluation.command").unwrap(), "(not set)");
        assert!(config.get("nope").is_err());

        let listed = config.list().unwrap();
        assert_eq!(listed.len(), 5);
        assert_eq!(listed[3].0, "evaluation.command");
        assert_eq!(listed[0].0, "storage.root");
    }

    #[test]
    fn test_config_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("embedding.default_algorithm", "word2vec").is_err());
        assert!(config.set("cache.serialize_computations", "maybe").is_err());
        assert!(config.set("storage.root", "  ").is_err());
        assert!(config.set("unknown.key", "x").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_clearing_command() {
        let mut config = Config::default();
        config.set("embedding.command", "train").unwrap();
        assert!(config.embedding.command_embedder().unwrap().is_some());

        config.set("embedding.command", "").unwrap();
        assert!(config.embedding.command.is_none());
        assert!(config.embedding.command_embedder().unwrap().is_none());
    }

    #[test]
    fn test_evaluation_command_is_separate() {
        let mut config = Config::default();
        config.set("evaluation.command", "python3 eval.py").unwrap();
        assert_eq!(config.get("evaluation.command").unwrap(), "python3 eval.py");
        assert!(config.embedding.command.is_none());
        assert_eq!(
            config.evaluation.command_evaluator().unwrap().unwrap().program(),
            "python3"
        );

        let parsed = Config::from_toml("[evaluation]\ncommand = \"score\"\n").unwrap();
        assert_eq!(parsed.evaluation.command.as_deref(), Some("score"));

        config.set("evaluation.command", " ").unwrap();
        assert!(config.evaluation.command.is_none());
    }
}
