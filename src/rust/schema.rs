//! Protocol-buffer messages for model descriptors.
//!
//! Only the messages the composer reads or writes are declared here. Fields
//! that a source file carries but this schema does not know about (for
//! example the layer graph of an embedding network) are skipped on decode.

use std::collections::HashMap;

/// Specification version written into every composed descriptor.
///
/// Version 4 is the first one that understands linked models and
/// updatable nearest-neighbor classifiers.
pub const SPECIFICATION_VERSION: i32 = 4;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Model {
    #[prost(int32, tag = "1")]
    pub specification_version: i32,
    #[prost(message, optional, tag = "2")]
    pub description: Option<ModelDescription>,
    #[prost(bool, tag = "10")]
    pub is_updatable: bool,
    #[prost(oneof = "model::Type", tags = "200, 202, 404, 556")]
    pub r#type: Option<model::Type>,
}

pub mod model {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Type {
        #[prost(message, tag = "200")]
        PipelineClassifier(super::PipelineClassifier),
        #[prost(message, tag = "202")]
        Pipeline(super::Pipeline),
        #[prost(message, tag = "404")]
        KNearestNeighborsClassifier(super::KNearestNeighborsClassifier),
        #[prost(message, tag = "556")]
        LinkedModel(super::LinkedModel),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModelDescription {
    #[prost(message, repeated, tag = "1")]
    pub input: Vec<FeatureDescription>,
    #[prost(message, repeated, tag = "10")]
    pub output: Vec<FeatureDescription>,
    #[prost(string, tag = "11")]
    pub predicted_feature_name: String,
    #[prost(string, tag = "12")]
    pub predicted_probabilities_name: String,
    #[prost(message, repeated, tag = "50")]
    pub training_input: Vec<FeatureDescription>,
    #[prost(message, optional, tag = "100")]
    pub metadata: Option<Metadata>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Metadata {
    #[prost(string, tag = "1")]
    pub short_description: String,
    #[prost(string, tag = "2")]
    pub version_string: String,
    #[prost(string, tag = "3")]
    pub author: String,
    #[prost(string, tag = "4")]
    pub license: String,
    #[prost(map = "string, string", tag = "100")]
    pub user_defined: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FeatureDescription {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub short_description: String,
    #[prost(message, optional, tag = "3")]
    pub r#type: Option<FeatureType>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FeatureType {
    #[prost(oneof = "feature_type::Type", tags = "1, 2, 3, 4, 5, 6")]
    pub r#type: Option<feature_type::Type>,
    #[prost(bool, tag = "1000")]
    pub is_optional: bool,
}

pub mod feature_type {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Type {
        #[prost(message, tag = "1")]
        Int64Type(super::Int64FeatureType),
        #[prost(message, tag = "2")]
        DoubleType(super::DoubleFeatureType),
        #[prost(message, tag = "3")]
        StringType(super::StringFeatureType),
        #[prost(message, tag = "4")]
        ImageType(super::ImageFeatureType),
        #[prost(message, tag = "5")]
        MultiArrayType(super::ArrayFeatureType),
        #[prost(message, tag = "6")]
        DictionaryType(super::DictionaryFeatureType),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Int64FeatureType {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DoubleFeatureType {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StringFeatureType {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ImageFeatureType {
    #[prost(int64, tag = "1")]
    pub width: i64,
    #[prost(int64, tag = "2")]
    pub height: i64,
    #[prost(enumeration = "image_feature_type::ColorSpace", tag = "3")]
    pub color_space: i32,
}

pub mod image_feature_type {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum ColorSpace {
        InvalidColorSpace = 0,
        Grayscale = 10,
        Rgb = 20,
        Bgr = 30,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ArrayFeatureType {
    #[prost(int64, repeated, tag = "1")]
    pub shape: Vec<i64>,
    #[prost(enumeration = "array_feature_type::ArrayDataType", tag = "2")]
    pub data_type: i32,
}

pub mod array_feature_type {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum ArrayDataType {
        InvalidArrayDataType = 0,
        Float32 = 65568,
        Double = 65600,
        Int32 = 131104,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DictionaryFeatureType {
    #[prost(oneof = "dictionary_feature_type::KeyType", tags = "1, 2")]
    pub key_type: Option<dictionary_feature_type::KeyType>,
}

pub mod dictionary_feature_type {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum KeyType {
        #[prost(message, tag = "1")]
        Int64KeyType(super::Int64FeatureType),
        #[prost(message, tag = "2")]
        StringKeyType(super::StringFeatureType),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Pipeline {
    #[prost(message, repeated, tag = "1")]
    pub models: Vec<Model>,
    #[prost(string, repeated, tag = "2")]
    pub names: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PipelineClassifier {
    #[prost(message, optional, tag = "1")]
    pub pipeline: Option<Pipeline>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StringParameter {
    #[prost(string, tag = "1")]
    pub default_value: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Int64Parameter {
    #[prost(int64, tag = "1")]
    pub default_value: i64,
    #[prost(oneof = "int64_parameter::AllowedValues", tags = "10, 11")]
    pub allowed_values: Option<int64_parameter::AllowedValues>,
}

pub mod int64_parameter {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum AllowedValues {
        #[prost(message, tag = "10")]
        Range(super::Int64Range),
        #[prost(message, tag = "11")]
        Set(super::Int64Set),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Int64Range {
    #[prost(int64, tag = "1")]
    pub min_value: i64,
    #[prost(int64, tag = "2")]
    pub max_value: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Int64Set {
    #[prost(int64, repeated, tag = "1")]
    pub values: Vec<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LinkedModel {
    #[prost(oneof = "linked_model::LinkType", tags = "1")]
    pub link_type: Option<linked_model::LinkType>,
}

pub mod linked_model {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum LinkType {
        #[prost(message, tag = "1")]
        LinkedModelFile(super::LinkedModelFile),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LinkedModelFile {
    #[prost(message, optional, tag = "1")]
    pub linked_model_file_name: Option<StringParameter>,
    #[prost(message, optional, tag = "2")]
    pub linked_model_search_path: Option<StringParameter>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FloatVector {
    #[prost(float, repeated, tag = "1")]
    pub vector: Vec<f32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StringVector {
    #[prost(string, repeated, tag = "1")]
    pub vector: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Int64Vector {
    #[prost(int64, repeated, tag = "1")]
    pub vector: Vec<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KNearestNeighborsClassifier {
    #[prost(message, optional, tag = "1")]
    pub nearest_neighbors_index: Option<NearestNeighborsIndex>,
    #[prost(message, optional, tag = "3")]
    pub number_of_neighbors: Option<Int64Parameter>,
    #[prost(oneof = "k_nearest_neighbors_classifier::ClassLabels", tags = "100, 101")]
    pub class_labels: Option<k_nearest_neighbors_classifier::ClassLabels>,
    #[prost(oneof = "k_nearest_neighbors_classifier::DefaultClassLabel", tags = "110, 111")]
    pub default_class_label: Option<k_nearest_neighbors_classifier::DefaultClassLabel>,
    #[prost(oneof = "k_nearest_neighbors_classifier::WeightingScheme", tags = "200, 210")]
    pub weighting_scheme: Option<k_nearest_neighbors_classifier::WeightingScheme>,
}

pub mod k_nearest_neighbors_classifier {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum ClassLabels {
        #[prost(message, tag = "100")]
        StringClassLabels(super::StringVector),
        #[prost(message, tag = "101")]
        Int64ClassLabels(super::Int64Vector),
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum DefaultClassLabel {
        #[prost(string, tag = "110")]
        DefaultStringLabel(String),
        #[prost(int64, tag = "111")]
        DefaultInt64Label(i64),
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum WeightingScheme {
        #[prost(message, tag = "200")]
        UniformWeighting(super::UniformWeighting),
        #[prost(message, tag = "210")]
        InverseDistanceWeighting(super::InverseDistanceWeighting),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UniformWeighting {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InverseDistanceWeighting {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NearestNeighborsIndex {
    #[prost(int32, tag = "1")]
    pub number_of_dimensions: i32,
    #[prost(message, repeated, tag = "2")]
    pub float_samples: Vec<FloatVector>,
    #[prost(oneof = "nearest_neighbors_index::IndexType", tags = "100, 110")]
    pub index_type: Option<nearest_neighbors_index::IndexType>,
    #[prost(oneof = "nearest_neighbors_index::DistanceFunction", tags = "200")]
    pub distance_function: Option<nearest_neighbors_index::DistanceFunction>,
}

pub mod nearest_neighbors_index {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum IndexType {
        #[prost(message, tag = "100")]
        LinearIndex(super::LinearIndex),
        #[prost(message, tag = "110")]
        SingleKdTreeIndex(super::SingleKdTreeIndex),
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum DistanceFunction {
        #[prost(message, tag = "200")]
        SquaredEuclideanDistance(super::SquaredEuclideanDistance),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LinearIndex {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SingleKdTreeIndex {
    #[prost(int32, tag = "1")]
    pub leaf_size: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SquaredEuclideanDistance {}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_unknown_fields_are_skipped() {
        let model = Model {
            specification_version: SPECIFICATION_VERSION,
            description: Some(ModelDescription {
                input: vec![FeatureDescription {
                    name: "drawing".into(),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut bytes = model.encode_to_vec();
        // field 500, length-delimited, three payload bytes
        bytes.extend_from_slice(&[0xA2, 0x1F, 0x03, 0x01, 0x02, 0x03]);

        let decoded = Model::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, model);
    }

    #[test]
    fn test_enumeration_accessors() {
        let image = ImageFeatureType {
            width: 28,
            height: 28,
            color_space: image_feature_type::ColorSpace::Grayscale as i32,
        };
        assert_eq!(image.color_space(), image_feature_type::ColorSpace::Grayscale);

        let unknown = ArrayFeatureType {
            shape: vec![128],
            data_type: 7,
        };
        assert_eq!(unknown.data_type(), array_feature_type::ArrayDataType::InvalidArrayDataType);
    }
}
