use std::path::Path;

use model_composer::schema::{
    array_feature_type::ArrayDataType, image_feature_type::ColorSpace, FeatureDescription, Metadata, Model,
    ModelDescription,
};
use prost::Message;

/// Describes a drawing embedding model: 28x28 grayscale image in, 128 floats out
pub fn embedding_description() -> ModelDescription {
    ModelDescription {
        input: vec![FeatureDescription::image("drawing", 28, 28, ColorSpace::Grayscale)
            .with_description("Input sketch")],
        output: vec![FeatureDescription::multi_array("embedding", vec![128], ArrayDataType::Float32)
            .with_description("Sketch embedding")],
        metadata: Some(Metadata {
            short_description: "Drawing embedding".into(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Writes the embedding descriptor plus an opaque network body the schema does not know
pub fn write_embedding_model(path: &Path) {
    let model = Model {
        specification_version: 4,
        description: Some(embedding_description()),
        ..Default::default()
    };
    let mut bytes = model.encode_to_vec();
    // field 500, length-delimited: stand-in for the network layers
    bytes.extend_from_slice(&[0xA2, 0x1F, 0x04, 0xDE, 0xAD, 0xBE, 0xEF]);
    std::fs::write(path, bytes).expect("write embedding fixture");
}

pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).try_init();
}
