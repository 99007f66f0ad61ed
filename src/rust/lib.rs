//! Composes an updatable nearest-neighbor classifier pipeline around a
//! separately packaged embedding model.
//!
//! The embedding model is never copied. Its declared interface is read from
//! its descriptor file and a linked-model stage points at it by file name and
//! search path. A nearest-neighbor classifier stage with an empty example
//! store follows it. The finished two-stage pipeline is marked updatable and
//! written as a single protocol-buffer descriptor.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use model_composer::{ComposedModel, KnnSettings, LinkDefinition, ModelManager};
//!
//! let manager = ModelManager::new_default()?;
//! let composed = ComposedModel::builder()
//!     .with_model_manager(manager.clone())
//!     .with_embedding_model("DrawingEmbedding.mlmodel")?
//!     .with_link(
//!         LinkDefinition::new("DrawingEmbedding.mlmodelc")
//!             .with_search_path("$BUNDLE_MAIN/Contents/Resources/")
//!     )?
//!     .with_classifier(KnnSettings::default().with_neighbors(3))?
//!     .build()?;
//!
//! composed.save(&manager, "UpdatableDrawingClassifier.mlmodel")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Search paths
//!
//! The host runtime resolves the linked model at load time, trying each
//! colon-separated location in order. Segments may be empty (the composed
//! model's own directory), relative or absolute paths, `$BUNDLE_MAIN`, or
//! `$BUNDLE_IDENTIFIER(<id>)`, the last two optionally followed by `/subpath`.

pub mod composer;
pub mod config;
pub mod model_manager;
pub mod schema;

pub use composer::{
    ComposeError, ComposedModel, ComposerBuilder, CompositionInfo, IndexKind, KnnSettings, LinkDefinition,
    SearchLocation, SearchPath, Weighting,
};
pub use config::{ComposerConfig, ConfigError};
pub use model_manager::{ModelError, ModelManager};

pub fn init_logger() {
    env_logger::init();
}
