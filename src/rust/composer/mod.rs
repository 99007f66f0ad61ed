use std::collections::HashMap;

use serde::Serialize;

mod error;
mod features;
mod knn;
mod linked;
mod model;
pub mod builder;
mod utils;

pub use builder::{ComposerBuilder, EMBEDDING_DIGEST_KEY, LINKED_MODEL_KEY};
pub use error::ComposeError;
pub use features::find_feature;
pub use knn::{as_knn, IndexKind, KnnSettings, Weighting, DEFAULT_LABEL};
pub use linked::{link_target, LinkDefinition, SearchLocation, SearchPath, SEARCH_PATH_DELIMITER};
pub use model::ComposedModel;

use crate::schema::FeatureDescription;

/// Name and type of one declared feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSummary {
    pub name: String,
    pub description: String,
    pub shape: String,
}

impl From<&FeatureDescription> for FeatureSummary {
    fn from(feature: &FeatureDescription) -> Self {
        Self {
            name: feature.name.clone(),
            description: feature.short_description.clone(),
            shape: feature.shape_summary(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub name: String,
    pub kind: String,
    pub updatable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkSummary {
    pub file_name: String,
    pub search_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierSummary {
    pub dimensions: usize,
    pub neighbors: Option<i64>,
    pub weighting: Option<Weighting>,
    pub index: Option<IndexKind>,
    pub default_label: Option<String>,
    /// Labeled examples in the store; zero until an on-device update runs
    pub stored_examples: usize,
}

/// Information about a composed pipeline descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionInfo {
    pub specification_version: i32,
    pub is_updatable: bool,
    pub inputs: Vec<FeatureSummary>,
    pub outputs: Vec<FeatureSummary>,
    pub training_inputs: Vec<FeatureSummary>,
    pub stages: Vec<StageSummary>,
    pub linked_model: Option<LinkSummary>,
    pub classifier: Option<ClassifierSummary>,
    pub author: String,
    pub license: String,
    pub short_description: String,
    pub version: String,
    pub user_defined: HashMap<String, String>,
    /// Stage wiring problems found by inspection; empty for a well-formed chain
    pub chain_mismatches: Vec<String>,
}
