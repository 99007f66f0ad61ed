use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::ComposeError;
use crate::schema::{
    array_feature_type::ArrayDataType,
    int64_parameter::AllowedValues,
    k_nearest_neighbors_classifier::{ClassLabels, DefaultClassLabel, WeightingScheme},
    model,
    nearest_neighbors_index::{DistanceFunction, IndexType},
    FeatureDescription, FeatureType, Int64Parameter, Int64Range, InverseDistanceWeighting,
    KNearestNeighborsClassifier, LinearIndex, Model, ModelDescription, NearestNeighborsIndex,
    SingleKdTreeIndex, SquaredEuclideanDistance, StringVector, UniformWeighting,
    SPECIFICATION_VERSION,
};

pub const DEFAULT_LABEL: &str = "unknown";
pub const DEFAULT_NEIGHBORS: i64 = 3;
pub const DEFAULT_NEIGHBOR_RANGE: [i64; 2] = [1, 1000];

/// How neighbor votes are weighted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    Uniform,
    InverseDistance,
}

/// Search structure the host runtime builds over stored examples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexKind {
    Linear,
    KdTree { leaf_size: i32 },
}

/// Hyperparameters of the nearest-neighbor classifier stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnnSettings {
    /// Name of the vector the classifier consumes. Defaults to the
    /// embedding model's first output.
    pub input_name: Option<String>,
    /// Vector length. Defaults to the element count of the input feature.
    pub dimensions: Option<usize>,
    pub neighbors: i64,
    /// Inclusive bounds an update step may move `neighbors` within
    pub neighbor_range: [i64; 2],
    pub weighting: Weighting,
    pub index: IndexKind,
    pub default_label: String,
    pub label_name: String,
    pub probabilities_name: String,
}

impl Default for KnnSettings {
    fn default() -> Self {
        Self {
            input_name: None,
            dimensions: None,
            neighbors: DEFAULT_NEIGHBORS,
            neighbor_range: DEFAULT_NEIGHBOR_RANGE,
            weighting: Weighting::InverseDistance,
            index: IndexKind::Linear,
            default_label: DEFAULT_LABEL.to_string(),
            label_name: "label".to_string(),
            probabilities_name: "labelProbs".to_string(),
        }
    }
}

impl KnnSettings {
    pub fn with_neighbors(mut self, neighbors: i64) -> Self {
        self.neighbors = neighbors;
        self
    }

    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_index(mut self, index: IndexKind) -> Self {
        self.index = index;
        self
    }

    pub fn with_default_label(mut self, label: impl Into<String>) -> Self {
        self.default_label = label.into();
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Validates settings according to the following rules:
    /// - Neighbor range must satisfy `1 <= min <= max`
    /// - Neighbor count must lie inside the range
    /// - Output names and the default label must not be empty
    /// - Label and probability outputs must have distinct names
    /// - A kd-tree leaf size must be positive
    pub(crate) fn validate(&self) -> Result<(), ComposeError> {
        let [min, max] = self.neighbor_range;
        if min < 1 || min > max {
            return Err(ComposeError::ValidationError(format!(
                "Invalid neighbor range [{}, {}]",
                min, max
            )));
        }
        if self.neighbors < min || self.neighbors > max {
            return Err(ComposeError::ValidationError(format!(
                "Neighbor count {} is outside the allowed range [{}, {}]",
                self.neighbors, min, max
            )));
        }
        if self.label_name.is_empty() || self.probabilities_name.is_empty() {
            return Err(ComposeError::ValidationError("Output names cannot be empty".into()));
        }
        if self.label_name == self.probabilities_name {
            return Err(ComposeError::ValidationError(format!(
                "Label and probability outputs share the name '{}'",
                self.label_name
            )));
        }
        if self.default_label.is_empty() {
            return Err(ComposeError::ValidationError("Default label cannot be empty".into()));
        }
        if matches!(self.dimensions, Some(0)) {
            return Err(ComposeError::ValidationError("Dimensions must be greater than zero".into()));
        }
        if let IndexKind::KdTree { leaf_size } = self.index {
            if leaf_size < 1 {
                return Err(ComposeError::ValidationError(format!(
                    "Kd-tree leaf size must be positive, got {}",
                    leaf_size
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn label_feature(&self) -> FeatureDescription {
        FeatureDescription::string(self.label_name.as_str()).with_description("True or predicted label")
    }
}

/// Builds the classifier stage with an empty example store.
///
/// `input_type` is the embedding output's declared type, copied verbatim so
/// the two stages chain. Without it the input is declared as `float32[dimensions]`.
pub(crate) fn classifier_stage(
    settings: &KnnSettings,
    input_name: &str,
    dimensions: usize,
    input_type: Option<FeatureType>,
) -> Result<Model, ComposeError> {
    let dims = i32::try_from(dimensions).map_err(|_| {
        ComposeError::ValidationError(format!("Dimensions {} exceed the supported range", dimensions))
    })?;

    let input = match input_type {
        Some(feature_type) => FeatureDescription {
            name: input_name.to_string(),
            short_description: String::new(),
            r#type: Some(feature_type),
        },
        None => FeatureDescription::multi_array(input_name, vec![dimensions as i64], ArrayDataType::Float32),
    }
    .with_description("Embedding vector");
    let label = settings.label_feature();
    let probabilities = FeatureDescription::string_dictionary(settings.probabilities_name.as_str())
        .with_description("Score for each known label");

    let description = ModelDescription {
        input: vec![input.clone()],
        output: vec![label.clone(), probabilities],
        predicted_feature_name: settings.label_name.clone(),
        predicted_probabilities_name: settings.probabilities_name.clone(),
        training_input: vec![input, label],
        metadata: None,
    };

    let index_type = match settings.index {
        IndexKind::Linear => IndexType::LinearIndex(LinearIndex {}),
        IndexKind::KdTree { leaf_size } => IndexType::SingleKdTreeIndex(SingleKdTreeIndex { leaf_size }),
    };
    let weighting_scheme = match settings.weighting {
        Weighting::Uniform => WeightingScheme::UniformWeighting(UniformWeighting {}),
        Weighting::InverseDistance => WeightingScheme::InverseDistanceWeighting(InverseDistanceWeighting {}),
    };

    let knn = KNearestNeighborsClassifier {
        nearest_neighbors_index: Some(NearestNeighborsIndex {
            number_of_dimensions: dims,
            float_samples: Vec::new(),
            index_type: Some(index_type),
            distance_function: Some(DistanceFunction::SquaredEuclideanDistance(SquaredEuclideanDistance {})),
        }),
        number_of_neighbors: Some(Int64Parameter {
            default_value: settings.neighbors,
            allowed_values: Some(AllowedValues::Range(Int64Range {
                min_value: settings.neighbor_range[0],
                max_value: settings.neighbor_range[1],
            })),
        }),
        class_labels: Some(ClassLabels::StringClassLabels(StringVector { vector: Vec::new() })),
        default_class_label: Some(DefaultClassLabel::DefaultStringLabel(settings.default_label.clone())),
        weighting_scheme: Some(weighting_scheme),
    };

    Ok(Model {
        specification_version: SPECIFICATION_VERSION,
        description: Some(description),
        is_updatable: true,
        r#type: Some(model::Type::KNearestNeighborsClassifier(knn)),
    })
}

/// Returns the classifier parameters of a stage, if it is a nearest-neighbor classifier
pub fn as_knn(model: &Model) -> Option<&KNearestNeighborsClassifier> {
    match model.r#type.as_ref()? {
        model::Type::KNearestNeighborsClassifier(knn) => Some(knn),
        _ => None,
    }
}

impl KNearestNeighborsClassifier {
    pub fn dimensions(&self) -> usize {
        self.nearest_neighbors_index
            .as_ref()
            .map(|index| index.number_of_dimensions.max(0) as usize)
            .unwrap_or(0)
    }

    /// Number of labeled examples currently stored
    pub fn stored_examples(&self) -> usize {
        self.nearest_neighbors_index
            .as_ref()
            .map(|index| index.float_samples.len())
            .unwrap_or(0)
    }

    pub fn neighbors(&self) -> Option<i64> {
        self.number_of_neighbors.as_ref().map(|p| p.default_value)
    }

    pub fn default_label(&self) -> Option<String> {
        match self.default_class_label.as_ref()? {
            DefaultClassLabel::DefaultStringLabel(label) => Some(label.clone()),
            DefaultClassLabel::DefaultInt64Label(label) => Some(label.to_string()),
        }
    }

    pub fn weighting(&self) -> Option<Weighting> {
        match self.weighting_scheme.as_ref()? {
            WeightingScheme::UniformWeighting(_) => Some(Weighting::Uniform),
            WeightingScheme::InverseDistanceWeighting(_) => Some(Weighting::InverseDistance),
        }
    }

    pub fn index(&self) -> Option<IndexKind> {
        match self.nearest_neighbors_index.as_ref()?.index_type.as_ref()? {
            IndexType::LinearIndex(_) => Some(IndexKind::Linear),
            IndexType::SingleKdTreeIndex(tree) => Some(IndexKind::KdTree {
                leaf_size: tree.leaf_size,
            }),
        }
    }

    /// Evaluates the classifier on one embedding vector.
    ///
    /// A classifier with no stored examples answers every input with its
    /// default label and an empty score map. Searching a populated store is
    /// left to the host runtime and reported as unsupported here.
    pub fn predict(&self, features: &[f32]) -> Result<(String, HashMap<String, f32>), ComposeError> {
        let dimensions = self.dimensions();
        if features.len() != dimensions {
            return Err(ComposeError::ValidationError(format!(
                "Expected a vector of {} values, got {}",
                dimensions,
                features.len()
            )));
        }

        if self.stored_examples() > 0 {
            return Err(ComposeError::PredictionError(format!(
                "Searching {} stored examples is performed by the host runtime",
                self.stored_examples()
            )));
        }

        let label = self
            .default_label()
            .ok_or_else(|| ComposeError::PredictionError("Classifier has no default label".into()))?;
        Ok((label, HashMap::new()))
    }
}
