use std::collections::HashMap;
use std::path::{Path, PathBuf};

use prost::Message;

use super::error::ComposeError;
use super::knn::as_knn;
use super::linked::link_target;
use super::utils::chain_mismatches;
use super::{ClassifierSummary, CompositionInfo, FeatureSummary, LinkSummary, StageSummary};
use crate::model_manager::ModelManager;
use crate::schema::{
    model, FeatureDescription, KNearestNeighborsClassifier, Metadata, Model, ModelDescription, Pipeline,
};

/// A finished pipeline descriptor: a linked embedding stage followed by a
/// nearest-neighbor classifier stage.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use model_composer::{ComposedModel, ModelManager};
///
/// let manager = ModelManager::new_default()?;
/// let composed = ComposedModel::load(&manager, "UpdatableDrawingClassifier.mlmodel")?;
/// let (label, scores) = composed.predict(&[0.0; 128])?;
/// assert_eq!(label, "unknown");
/// assert!(scores.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedModel {
    model: Model,
}

fn pipeline_of(model: &Model) -> Option<&Pipeline> {
    match model.r#type.as_ref()? {
        model::Type::PipelineClassifier(classifier) => classifier.pipeline.as_ref(),
        model::Type::Pipeline(pipeline) => Some(pipeline),
        _ => None,
    }
}

fn stage_kind(model: &Model) -> &'static str {
    match model.r#type {
        Some(model::Type::PipelineClassifier(_)) => "pipeline_classifier",
        Some(model::Type::Pipeline(_)) => "pipeline",
        Some(model::Type::KNearestNeighborsClassifier(_)) => "k_nearest_neighbors_classifier",
        Some(model::Type::LinkedModel(_)) => "linked_model",
        None => "unknown",
    }
}

impl ComposedModel {
    /// Creates a new ComposerBuilder for fluent construction
    pub fn builder() -> super::builder::ComposerBuilder {
        super::builder::ComposerBuilder::new()
    }

    /// Wraps a decoded descriptor, which must be a described pipeline
    pub fn from_model(model: Model) -> Result<Self, ComposeError> {
        if model.description.is_none() {
            return Err(ComposeError::ModelError("Model has no description".into()));
        }
        if pipeline_of(&model).is_none() {
            return Err(ComposeError::ModelError(format!(
                "Expected a pipeline, found {}",
                stage_kind(&model)
            )));
        }
        Ok(Self { model })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    fn description(&self) -> Option<&ModelDescription> {
        self.model.description.as_ref()
    }

    pub fn inputs(&self) -> &[FeatureDescription] {
        self.description().map(|d| d.input.as_slice()).unwrap_or(&[])
    }

    pub fn outputs(&self) -> &[FeatureDescription] {
        self.description().map(|d| d.output.as_slice()).unwrap_or(&[])
    }

    pub fn training_inputs(&self) -> &[FeatureDescription] {
        self.description().map(|d| d.training_input.as_slice()).unwrap_or(&[])
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.description()?.metadata.as_ref()
    }

    pub fn is_updatable(&self) -> bool {
        self.model.is_updatable
    }

    pub fn stages(&self) -> &[Model] {
        pipeline_of(&self.model).map(|p| p.models.as_slice()).unwrap_or(&[])
    }

    pub fn stage_names(&self) -> &[String] {
        pipeline_of(&self.model).map(|p| p.names.as_slice()).unwrap_or(&[])
    }

    /// The first stage that references an external model
    pub fn linked_stage(&self) -> Option<&Model> {
        self.stages().iter().find(|stage| link_target(stage).is_some())
    }

    /// The first nearest-neighbor classifier stage
    pub fn classifier(&self) -> Option<&KNearestNeighborsClassifier> {
        self.stages().iter().find_map(as_knn)
    }

    /// Runs the classifier stage on an embedding vector
    pub fn predict(&self, features: &[f32]) -> Result<(String, HashMap<String, f32>), ComposeError> {
        self.classifier()
            .ok_or_else(|| ComposeError::PredictionError("Pipeline has no classifier stage".into()))?
            .predict(features)
    }

    /// Stage inputs not satisfied by the pipeline inputs or an earlier stage.
    /// Findings are informational; nothing here rejects a pipeline.
    pub fn chain_mismatches(&self) -> Vec<String> {
        chain_mismatches(self.inputs(), self.outputs(), self.stages(), self.stage_names())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.model.encode_to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ComposeError> {
        let model = Model::decode(bytes)
            .map_err(|e| ComposeError::ModelError(format!("Failed to decode model: {}", e)))?;
        Self::from_model(model)
    }

    pub fn save<P: AsRef<Path>>(&self, manager: &ModelManager, path: P) -> Result<PathBuf, ComposeError> {
        Ok(manager.save_model(&self.model, path)?)
    }

    pub fn load<P: AsRef<Path>>(manager: &ModelManager, path: P) -> Result<Self, ComposeError> {
        Self::from_model(manager.load_model(path)?)
    }

    /// Returns a serializable summary of the descriptor
    pub fn info(&self) -> CompositionInfo {
        let summarize = |features: &[FeatureDescription]| -> Vec<FeatureSummary> {
            features.iter().map(FeatureSummary::from).collect()
        };

        let names = self.stage_names();
        let stages = self
            .stages()
            .iter()
            .enumerate()
            .map(|(i, stage)| StageSummary {
                name: names.get(i).cloned().unwrap_or_default(),
                kind: stage_kind(stage).to_string(),
                updatable: stage.is_updatable,
            })
            .collect();

        let linked_model = self.linked_stage().and_then(link_target).map(|(file_name, search_path)| LinkSummary {
            file_name: file_name.to_string(),
            search_path: search_path.to_string(),
        });

        let classifier = self.classifier().map(|knn| ClassifierSummary {
            dimensions: knn.dimensions(),
            neighbors: knn.neighbors(),
            weighting: knn.weighting(),
            index: knn.index(),
            default_label: knn.default_label(),
            stored_examples: knn.stored_examples(),
        });

        let metadata = self.metadata();
        CompositionInfo {
            specification_version: self.model.specification_version,
            is_updatable: self.is_updatable(),
            inputs: summarize(self.inputs()),
            outputs: summarize(self.outputs()),
            training_inputs: summarize(self.training_inputs()),
            stages,
            linked_model,
            classifier,
            author: metadata.map(|m| m.author.clone()).unwrap_or_default(),
            license: metadata.map(|m| m.license.clone()).unwrap_or_default(),
            short_description: metadata.map(|m| m.short_description.clone()).unwrap_or_default(),
            version: metadata.map(|m| m.version_string.clone()).unwrap_or_default(),
            user_defined: metadata.map(|m| m.user_defined.clone()).unwrap_or_default(),
            chain_mismatches: self.chain_mismatches(),
        }
    }
}
