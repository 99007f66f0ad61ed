use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use prost::Message;
use sha2::{Digest, Sha256};

use crate::schema::Model;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model file not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Failed to decode model description: {0}")]
    DecodeError(#[from] prost::DecodeError),
    #[error("Model file {0} does not declare a description")]
    MissingDescription(String),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Reads and writes model descriptor files relative to a base directory.
#[derive(Debug, Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
}

impl ModelManager {
    /// Creates a new ModelManager rooted at the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("MODEL_COMPOSER_HOME") {
            return PathBuf::from(path);
        }

        // 2. Use the working directory
        env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self { models_dir })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Resolves a path against the models directory; absolute paths are kept as-is
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.models_dir.join(path)
        }
    }

    fn read_existing<P: AsRef<Path>>(&self, path: P) -> Result<(PathBuf, Vec<u8>), ModelError> {
        let path = self.resolve(path);
        if !path.exists() {
            return Err(ModelError::NotFound(path.display().to_string()));
        }
        let bytes = fs::read(&path)?;
        log::debug!("Read {} bytes from {:?}", bytes.len(), path);
        Ok((path, bytes))
    }

    fn decode_model(path: &Path, bytes: &[u8]) -> Result<Model, ModelError> {
        let model = Model::decode(bytes)?;
        if model.description.is_none() {
            return Err(ModelError::MissingDescription(path.display().to_string()));
        }
        log::info!("Loaded model (specification version {})", model.specification_version);
        Ok(model)
    }

    /// Reads and decodes a descriptor, which must declare a description
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> Result<Model, ModelError> {
        log::info!("Loading model description from {:?}", path.as_ref());
        let (path, bytes) = self.read_existing(path)?;
        Self::decode_model(&path, &bytes)
    }

    /// Reads a descriptor once, returning the decoded model together with the
    /// SHA-256 digest of the exact bytes that were decoded.
    ///
    /// When `expected_hash` is given, the digest is checked before decoding
    /// and a mismatch aborts with [`ModelError::HashMismatch`].
    pub fn load_model_with_digest<P: AsRef<Path>>(
        &self,
        path: P,
        expected_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(Model, String), ModelError> {
        log::info!("Loading {} model description from {:?}", file_type, path.as_ref());
        let (path, bytes) = self.read_existing(path)?;
        let digest = digest_bytes(&bytes);
        if let Some(expected) = expected_hash {
            check_digest(&digest, expected, file_type)?;
        }
        let model = Self::decode_model(&path, &bytes)?;
        Ok((model, digest))
    }

    /// Encodes and writes a descriptor, creating parent directories as needed
    pub fn save_model<P: AsRef<Path>>(&self, model: &Model, path: P) -> Result<PathBuf, ModelError> {
        let path = self.resolve(path);

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            log::debug!("Creating parent directory: {:?}", parent);
            fs::create_dir_all(parent)?;
        }

        let bytes = model.encode_to_vec();
        log::info!("Writing {} bytes to {:?}", bytes.len(), path);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Calculates the SHA-256 digest of a file as lowercase hex
    pub fn file_digest<P: AsRef<Path>>(&self, path: P) -> Result<String, ModelError> {
        let (path, bytes) = self.read_existing(path)?;
        let hash = digest_bytes(&bytes);
        log::debug!("Calculated hash for {:?}: {}", path, hash);
        Ok(hash)
    }

    /// Checks a file against an expected SHA-256 digest
    pub fn verify_file<P: AsRef<Path>>(&self, path: P, expected_hash: &str, file_type: &str) -> Result<(), ModelError> {
        let actual = self.file_digest(path)?;
        check_digest(&actual, expected_hash, file_type)
    }
}

fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn check_digest(actual: &str, expected: &str, file_type: &str) -> Result<(), ModelError> {
    if !actual.eq_ignore_ascii_case(expected) {
        log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, actual);
        return Err(ModelError::HashMismatch {
            file_type: file_type.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    log::info!("{} file verified successfully", file_type);
    Ok(())
}
