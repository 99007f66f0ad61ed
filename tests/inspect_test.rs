mod common;

use model_composer::{ComposedModel, ComposerConfig, ModelManager};
use serde_json::Value;

#[test]
fn test_info_serializes_to_json() -> Result<(), Box<dyn std::error::Error>> {
    common::init();
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path())?;
    common::write_embedding_model(&dir.path().join("DrawingEmbedding.mlmodel"));

    let config = ComposerConfig::from_toml_str(
        r#"
        [classifier]
        neighbors = 5
        weighting = "uniform"

        [metadata]
        author = "Sketch Team"
        "#,
    )?;
    config.compose(&manager, None)?.save(&manager, &config.output_path)?;

    let composed = ComposedModel::load(&manager, &config.output_path)?;
    let json: Value = serde_json::from_str(&serde_json::to_string_pretty(&composed.info())?)?;

    assert_eq!(json["is_updatable"], Value::Bool(true));
    assert_eq!(json["specification_version"], 4);
    assert_eq!(json["inputs"][0]["name"], "drawing");
    assert_eq!(json["inputs"][0]["shape"], "image 28x28 grayscale");
    assert_eq!(json["outputs"][0]["name"], "label");
    assert_eq!(json["outputs"][1]["shape"], "dictionary<string, double>");
    assert_eq!(json["stages"][0]["kind"], "linked_model");
    assert_eq!(json["linked_model"]["search_path"], "$BUNDLE_MAIN/Contents/Resources/");
    assert_eq!(json["classifier"]["neighbors"], 5);
    assert_eq!(json["classifier"]["weighting"], "uniform");
    assert_eq!(json["classifier"]["index"]["kind"], "linear");
    assert_eq!(json["classifier"]["default_label"], "unknown");
    assert_eq!(json["classifier"]["stored_examples"], 0);
    assert_eq!(json["author"], "Sketch Team");
    assert_eq!(json["chain_mismatches"].as_array().map(|a| a.len()), Some(0));
    Ok(())
}

#[test]
fn test_inspecting_a_non_pipeline_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path())?;
    common::write_embedding_model(&dir.path().join("DrawingEmbedding.mlmodel"));

    assert!(ComposedModel::load(&manager, "DrawingEmbedding.mlmodel").is_err());
    Ok(())
}
