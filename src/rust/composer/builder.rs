use std::path::Path;

use log::{info, warn};

use super::error::ComposeError;
use super::features::find_feature;
use super::knn::{classifier_stage, KnnSettings};
use super::linked::{linked_model_stage, LinkDefinition, SearchPath};
use super::model::ComposedModel;
use crate::model_manager::ModelManager;
use crate::schema::{
    model, FeatureType, Metadata, Model, ModelDescription, Pipeline, PipelineClassifier, SPECIFICATION_VERSION,
};

pub const EMBEDDING_DIGEST_KEY: &str = "com.model-composer.embedding.sha256";
pub const LINKED_MODEL_KEY: &str = "com.model-composer.linked-model";

/// A builder for composing an updatable classifier pipeline with a fluent interface.
///
/// The pipeline always has two stages, in this order: a linked reference to
/// the embedding model, then a nearest-neighbor classifier whose example
/// store starts empty.
///
/// # Example
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use model_composer::{ComposerBuilder, KnnSettings, LinkDefinition};
///
/// let composed = ComposerBuilder::new()
///     .with_embedding_model("DrawingEmbedding.mlmodel")?
///     .with_link(
///         LinkDefinition::new("DrawingEmbedding.mlmodelc")
///             .with_search_path("$BUNDLE_MAIN/Contents/Resources/")
///     )?
///     .with_classifier(KnnSettings::default())?
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ComposerBuilder {
    manager: Option<ModelManager>,
    embedding: Option<ModelDescription>,
    embedding_digest: Option<String>,
    link: Option<(LinkDefinition, SearchPath)>,
    settings: KnnSettings,
    metadata: Metadata,
    stage_names: Option<(String, String)>,
}

impl ComposerBuilder {
    /// Creates a new empty ComposerBuilder with default classifier settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the manager used to resolve and read model files
    pub fn with_model_manager(mut self, manager: ModelManager) -> Self {
        self.manager = Some(manager);
        self
    }

    fn manager(&mut self) -> Result<&ModelManager, ComposeError> {
        if self.manager.is_none() {
            let manager = ModelManager::new_default()
                .map_err(|e| ComposeError::BuildError(format!("Failed to create model manager: {}", e)))?;
            self.manager = Some(manager);
        }
        self.manager
            .as_ref()
            .ok_or_else(|| ComposeError::BuildError("Model manager not initialized".into()))
    }

    /// Reads an embedding model file and takes its declared interface.
    ///
    /// # Returns
    /// * `Result<Self, ComposeError>` - The builder instance if successful, or an error if:
    ///   - An embedding model is already set
    ///   - The file is missing, unreadable or malformed
    ///   - The model declares no inputs or no outputs
    pub fn with_embedding_model<P: AsRef<Path>>(self, path: P) -> Result<Self, ComposeError> {
        self.read_embedding(path, None)
    }

    /// Same as [`with_embedding_model`](Self::with_embedding_model), but aborts unless the
    /// file's SHA-256 digest matches `expected_sha256`
    pub fn with_verified_embedding_model<P: AsRef<Path>>(
        self,
        path: P,
        expected_sha256: &str,
    ) -> Result<Self, ComposeError> {
        self.read_embedding(path, Some(expected_sha256))
    }

    // The file is read once; the recorded digest is that of the decoded bytes.
    fn read_embedding<P: AsRef<Path>>(mut self, path: P, expected_sha256: Option<&str>) -> Result<Self, ComposeError> {
        if self.embedding.is_some() {
            return Err(ComposeError::BuildError("Embedding model already set".to_string()));
        }

        let (source, digest) = self
            .manager()?
            .load_model_with_digest(&path, expected_sha256, "embedding")?;

        let description = source
            .description
            .ok_or_else(|| ComposeError::ModelError("Embedding model has no description".into()))?;
        self.embedding_digest = Some(digest);
        self.with_embedding_description(description)
    }

    /// Takes the interface of an embedding model that is already in memory
    pub fn with_embedding_description(mut self, description: ModelDescription) -> Result<Self, ComposeError> {
        if self.embedding.is_some() {
            return Err(ComposeError::BuildError("Embedding model already set".to_string()));
        }
        Self::validate_interface(&description)?;

        for feature in &description.input {
            info!("Embedding input '{}': {}", feature.name, feature.shape_summary());
        }
        for feature in &description.output {
            info!("Embedding output '{}': {}", feature.name, feature.shape_summary());
        }

        self.embedding = Some(description);
        Ok(self)
    }

    /// Sets where the host runtime should look for the embedding model
    ///
    /// # Returns
    /// * `Result<Self, ComposeError>` - The builder instance if successful, or an error if:
    ///   - The file name is empty
    ///   - A search path segment is not a recognized form
    pub fn with_link(mut self, link: LinkDefinition) -> Result<Self, ComposeError> {
        if link.file_name.is_empty() {
            return Err(ComposeError::ValidationError("Linked model file name cannot be empty".into()));
        }
        let search_path = SearchPath::parse(&link.search_path)?;
        self.link = Some((link, search_path));
        Ok(self)
    }

    pub fn with_classifier(mut self, settings: KnnSettings) -> Result<Self, ComposeError> {
        settings.validate()?;
        self.settings = settings;
        Ok(self)
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_stage_names(mut self, embedding: impl Into<String>, classifier: impl Into<String>) -> Self {
        self.stage_names = Some((embedding.into(), classifier.into()));
        self
    }

    fn validate_interface(description: &ModelDescription) -> Result<(), ComposeError> {
        if description.input.is_empty() {
            return Err(ComposeError::ValidationError("Embedding model declares no inputs".into()));
        }
        if description.output.is_empty() {
            return Err(ComposeError::ValidationError("Embedding model declares no outputs".into()));
        }
        if let Some(pos) = description
            .input
            .iter()
            .chain(description.output.iter())
            .position(|f| f.name.is_empty())
        {
            return Err(ComposeError::ValidationError(format!(
                "Embedding feature {} has an empty name",
                pos + 1
            )));
        }
        Ok(())
    }

    /// Picks the classifier's input name, vector length and declared type.
    ///
    /// Dimensions declared in the settings win over the embedding output's
    /// shape; a disagreement is logged but not rejected. The embedding
    /// output's type is carried over unless the dimensions were overridden
    /// to a different length.
    fn classifier_input(
        &self,
        embedding: &ModelDescription,
    ) -> Result<(String, usize, Option<FeatureType>), ComposeError> {
        let input_name = match &self.settings.input_name {
            Some(name) => name.clone(),
            None => embedding
                .output
                .first()
                .map(|f| f.name.clone())
                .ok_or_else(|| ComposeError::ValidationError("Embedding model declares no outputs".into()))?,
        };

        let source = find_feature(&embedding.output, &input_name);
        if source.is_none() {
            warn!("Classifier input '{}' is not an output of the embedding model", input_name);
        }
        let inferred = source.and_then(|feature| feature.element_count());

        let dimensions = match (self.settings.dimensions, inferred) {
            (Some(declared), Some(inferred)) => {
                if declared != inferred {
                    warn!(
                        "Declared dimensions {} differ from embedding output '{}' ({} values)",
                        declared, input_name, inferred
                    );
                }
                declared
            }
            (Some(declared), None) => declared,
            (None, Some(inferred)) => inferred,
            (None, None) => {
                return Err(ComposeError::ValidationError(format!(
                    "Cannot infer dimensions for classifier input '{}'; set them explicitly",
                    input_name
                )))
            }
        };

        let input_type = match inferred {
            Some(inferred) if inferred == dimensions => source.and_then(|feature| feature.r#type.clone()),
            _ => None,
        };

        Ok((input_name, dimensions, input_type))
    }

    /// Builds the pipeline descriptor
    ///
    /// # Returns
    /// * `Result<ComposedModel, ComposeError>` - The composed model if successful, or an error if:
    ///   - No embedding model has been set
    ///   - No link has been set
    ///   - The classifier dimensions cannot be determined
    pub fn build(self) -> Result<ComposedModel, ComposeError> {
        let embedding = self
            .embedding
            .as_ref()
            .ok_or_else(|| ComposeError::BuildError("Embedding model must be set".to_string()))?;
        let (link, search_path) = self
            .link
            .as_ref()
            .ok_or_else(|| ComposeError::BuildError("Linked model must be set".to_string()))?;

        let (input_name, dimensions, input_type) = self.classifier_input(embedding)?;

        let linked = linked_model_stage(embedding, link, search_path);
        info!(
            "Linked stage points at '{}' via {} search locations",
            link.file_name,
            search_path.locations().len()
        );

        let classifier = classifier_stage(&self.settings, &input_name, dimensions, input_type)?;
        info!(
            "Classifier stage: {} dimensions, {} neighbors, default label '{}'",
            dimensions, self.settings.neighbors, self.settings.default_label
        );

        let outputs = classifier
            .description
            .as_ref()
            .map(|d| d.output.clone())
            .unwrap_or_default();

        let mut training_input = embedding.input.clone();
        training_input.push(self.settings.label_feature());

        let mut metadata = self.metadata.clone();
        metadata
            .user_defined
            .insert(LINKED_MODEL_KEY.to_string(), link.file_name.clone());
        if let Some(digest) = &self.embedding_digest {
            metadata
                .user_defined
                .insert(EMBEDDING_DIGEST_KEY.to_string(), digest.clone());
        }

        let description = ModelDescription {
            input: embedding.input.clone(),
            output: outputs,
            predicted_feature_name: self.settings.label_name.clone(),
            predicted_probabilities_name: self.settings.probabilities_name.clone(),
            training_input,
            metadata: Some(metadata),
        };

        let (first, second) = self
            .stage_names
            .clone()
            .unwrap_or_else(|| ("embedding".to_string(), "classifier".to_string()));

        let composed = Model {
            specification_version: SPECIFICATION_VERSION,
            description: Some(description),
            is_updatable: true,
            r#type: Some(model::Type::PipelineClassifier(PipelineClassifier {
                pipeline: Some(Pipeline {
                    models: vec![linked, classifier],
                    names: vec![first, second],
                }),
            })),
        };

        info!("Pipeline composed with 2 stages");
        ComposedModel::from_model(composed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{array_feature_type::ArrayDataType, image_feature_type::ColorSpace, FeatureDescription};

    fn embedding() -> ModelDescription {
        ModelDescription {
            input: vec![FeatureDescription::image("drawing", 28, 28, ColorSpace::Grayscale)],
            output: vec![FeatureDescription::multi_array("embedding", vec![128], ArrayDataType::Float32)],
            ..Default::default()
        }
    }

    fn link() -> LinkDefinition {
        LinkDefinition::new("DrawingEmbedding.mlmodelc").with_search_path("$BUNDLE_MAIN")
    }

    #[test]
    fn test_missing_parts() {
        let result = ComposerBuilder::new().with_link(link()).and_then(|b| b.build());
        assert!(matches!(result, Err(ComposeError::BuildError(_))));

        let result = ComposerBuilder::new()
            .with_embedding_description(embedding())
            .and_then(|b| b.build());
        assert!(matches!(result, Err(ComposeError::BuildError(_))));
    }

    #[test]
    fn test_embedding_set_twice() {
        let result = ComposerBuilder::new()
            .with_embedding_description(embedding())
            .and_then(|b| b.with_embedding_description(embedding()));
        assert!(matches!(result, Err(ComposeError::BuildError(_))));
    }

    #[test]
    fn test_interface_validation() {
        let no_outputs = ModelDescription {
            output: Vec::new(),
            ..embedding()
        };
        assert!(ComposerBuilder::new().with_embedding_description(no_outputs).is_err());

        let unnamed = ModelDescription {
            input: vec![FeatureDescription::image("", 28, 28, ColorSpace::Grayscale)],
            ..embedding()
        };
        assert!(ComposerBuilder::new().with_embedding_description(unnamed).is_err());
    }

    #[test]
    fn test_empty_link_name() {
        let result = ComposerBuilder::new().with_link(LinkDefinition::new(""));
        assert!(matches!(result, Err(ComposeError::ValidationError(_))));
    }

    #[test]
    fn test_dimensions_inferred_from_embedding() -> Result<(), ComposeError> {
        let composed = ComposerBuilder::new()
            .with_embedding_description(embedding())?
            .with_link(link())?
            .build()?;
        let knn = composed.classifier().expect("classifier stage");
        assert_eq!(knn.dimensions(), 128);
        Ok(())
    }

    #[test]
    fn test_explicit_dimensions_required_for_unshaped_output() {
        let unshaped = ModelDescription {
            output: vec![FeatureDescription::string("embedding")],
            ..embedding()
        };
        let result = ComposerBuilder::new()
            .with_embedding_description(unshaped.clone())
            .and_then(|b| b.with_link(link()))
            .and_then(|b| b.build());
        assert!(matches!(result, Err(ComposeError::ValidationError(_))));

        let composed = ComposerBuilder::new()
            .with_embedding_description(unshaped)
            .and_then(|b| b.with_link(link()))
            .and_then(|b| b.with_classifier(KnnSettings::default().with_dimensions(64)))
            .and_then(|b| b.build())
            .unwrap();
        assert_eq!(composed.classifier().map(|k| k.dimensions()), Some(64));
    }

    fn classifier_input_of(composed: &ComposedModel) -> FeatureDescription {
        composed.stages()[1]
            .description
            .as_ref()
            .map(|d| d.input[0].clone())
            .expect("classifier description")
    }

    #[test]
    fn test_classifier_input_copies_embedding_output_type() -> Result<(), ComposeError> {
        for output in [
            FeatureDescription::multi_array("embedding", vec![128], ArrayDataType::Double),
            FeatureDescription::multi_array("embedding", vec![1, 128], ArrayDataType::Float32),
        ] {
            let source = ModelDescription {
                output: vec![output.clone()],
                ..embedding()
            };
            let composed = ComposerBuilder::new()
                .with_embedding_description(source)?
                .with_link(link())?
                .build()?;

            let input = classifier_input_of(&composed);
            assert_eq!(input.r#type, output.r#type);
            let training = &composed.stages()[1].description.as_ref().expect("description").training_input[0];
            assert_eq!(training.r#type, output.r#type);
            assert!(composed.chain_mismatches().is_empty(), "{:?}", composed.chain_mismatches());
            assert_eq!(composed.classifier().map(|k| k.dimensions()), Some(128));
        }
        Ok(())
    }

    #[test]
    fn test_matching_explicit_dimensions_keep_output_type() -> Result<(), ComposeError> {
        let source = ModelDescription {
            output: vec![FeatureDescription::multi_array("embedding", vec![1, 128], ArrayDataType::Double)],
            ..embedding()
        };
        let composed = ComposerBuilder::new()
            .with_embedding_description(source.clone())?
            .with_link(link())?
            .with_classifier(KnnSettings::default().with_dimensions(128))?
            .build()?;
        assert_eq!(classifier_input_of(&composed).r#type, source.output[0].r#type);
        assert!(composed.chain_mismatches().is_empty());
        Ok(())
    }

    #[test]
    fn test_dimension_override_wins_over_embedding_shape() -> Result<(), ComposeError> {
        let composed = ComposerBuilder::new()
            .with_embedding_description(embedding())?
            .with_link(link())?
            .with_classifier(KnnSettings::default().with_dimensions(64))?
            .build()?;

        assert_eq!(composed.classifier().map(|k| k.dimensions()), Some(64));
        let input = classifier_input_of(&composed);
        assert_eq!(input.name, "embedding");
        assert_eq!(input.shape_summary(), "multiarray float32[64]");
        // Disagreement is reported, not rejected
        assert_eq!(composed.chain_mismatches().len(), 1);
        Ok(())
    }

    #[test]
    fn test_metadata_records_link() -> Result<(), ComposeError> {
        let composed = ComposerBuilder::new()
            .with_embedding_description(embedding())?
            .with_link(link())?
            .with_metadata(Metadata {
                author: "Sketch Team".into(),
                ..Default::default()
            })
            .with_stage_names("features", "knn")
            .build()?;

        let metadata = composed.metadata().expect("metadata");
        assert_eq!(metadata.author, "Sketch Team");
        assert_eq!(
            metadata.user_defined.get(LINKED_MODEL_KEY).map(String::as_str),
            Some("DrawingEmbedding.mlmodelc")
        );
        assert!(!metadata.user_defined.contains_key(EMBEDDING_DIGEST_KEY));
        assert_eq!(composed.stage_names(), ["features", "knn"]);
        Ok(())
    }
}
