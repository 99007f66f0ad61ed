use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::composer::{ComposeError, ComposedModel, ComposerBuilder, KnnSettings, LinkDefinition};
use crate::model_manager::ModelManager;
use crate::schema::Metadata;

pub const CONFIG_ENV_VAR: &str = "MODEL_COMPOSER_CONFIG";
const CONFIG_FILE_NAME: &str = "config.toml";
const FALLBACK_CONFIG_FILE: &str = ".model-composer.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Where the linked embedding model is expected at load time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Defaults to the embedding file's stem with a `.mlmodelc` extension
    pub file_name: Option<String>,
    pub search_path: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            file_name: None,
            search_path: "$BUNDLE_MAIN/Contents/Resources/".to_string(),
        }
    }
}

/// Descriptive metadata attached to the composed pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub author: String,
    pub license: String,
    pub short_description: String,
    pub version: String,
    pub user_defined: HashMap<String, String>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            author: String::new(),
            license: String::new(),
            short_description: "Updatable nearest-neighbor classifier over a linked embedding model".to_string(),
            version: "1.0".to_string(),
            user_defined: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub embedding_path: PathBuf,
    pub output_path: PathBuf,
    pub link: LinkConfig,
    pub classifier: KnnSettings,
    pub metadata: MetadataConfig,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            embedding_path: PathBuf::from("DrawingEmbedding.mlmodel"),
            output_path: PathBuf::from("UpdatableDrawingClassifier.mlmodel"),
            link: LinkConfig::default(),
            classifier: KnnSettings::default(),
            metadata: MetadataConfig::default(),
        }
    }
}

impl ComposerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Loaded configuration from {:?}", path);
        Self::from_toml_str(&text)
    }

    /// Returns the default config file path
    pub fn default_path() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }

        // 2. Use platform-specific config directory
        if let Some(config_dir) = dirs::config_dir() {
            return config_dir.join("model-composer").join(CONFIG_FILE_NAME);
        }

        // 3. Fall back to the working directory
        PathBuf::from(FALLBACK_CONFIG_FILE)
    }

    /// Loads the default config file, or the built-in defaults when none exists
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::from_file(path)
        } else {
            log::debug!("No config file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// File name the pipeline records for the linked embedding model
    pub fn link_file_name(&self) -> String {
        if let Some(name) = &self.link.file_name {
            return name.clone();
        }
        let stem = self
            .embedding_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Embedding".to_string());
        format!("{}.mlmodelc", stem)
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            short_description: self.metadata.short_description.clone(),
            version_string: self.metadata.version.clone(),
            author: self.metadata.author.clone(),
            license: self.metadata.license.clone(),
            user_defined: self.metadata.user_defined.clone(),
        }
    }

    /// Runs the whole composition described by this config.
    ///
    /// Nothing is written; the caller saves the returned model.
    pub fn compose(&self, manager: &ModelManager, expected_sha256: Option<&str>) -> Result<ComposedModel, ComposeError> {
        let builder = ComposerBuilder::new().with_model_manager(manager.clone());
        let builder = match expected_sha256 {
            Some(hash) => builder.with_verified_embedding_model(&self.embedding_path, hash)?,
            None => builder.with_embedding_model(&self.embedding_path)?,
        };

        builder
            .with_link(LinkDefinition::new(self.link_file_name()).with_search_path(self.link.search_path.as_str()))?
            .with_classifier(self.classifier.clone())?
            .with_metadata(self.metadata())
            .build()
    }
}
