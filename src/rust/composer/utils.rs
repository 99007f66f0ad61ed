use crate::schema::{FeatureDescription, Model};

use super::features::find_feature;

fn same_type(a: &FeatureDescription, b: &FeatureDescription) -> bool {
    a.kind() == b.kind()
}

/// Walks the stages in order and reports every input that is neither a
/// pipeline input nor an output of an earlier stage, every name match whose
/// types disagree, and every pipeline output no stage produces.
pub(crate) fn chain_mismatches(
    inputs: &[FeatureDescription],
    outputs: &[FeatureDescription],
    stages: &[Model],
    names: &[String],
) -> Vec<String> {
    let mut available: Vec<FeatureDescription> = inputs.to_vec();
    let mut findings = Vec::new();

    for (i, stage) in stages.iter().enumerate() {
        let stage_name = names.get(i).cloned().unwrap_or_else(|| format!("#{}", i));
        let Some(description) = stage.description.as_ref() else {
            findings.push(format!("Stage '{}' has no description", stage_name));
            continue;
        };

        for input in &description.input {
            match find_feature(&available, &input.name) {
                None => findings.push(format!(
                    "Stage '{}' input '{}' is not produced by the pipeline inputs or an earlier stage",
                    stage_name, input.name
                )),
                Some(provided) if !same_type(provided, input) => findings.push(format!(
                    "Stage '{}' input '{}' expects {} but receives {}",
                    stage_name,
                    input.name,
                    input.shape_summary(),
                    provided.shape_summary()
                )),
                Some(_) => {}
            }
        }
        available.extend(description.output.iter().cloned());
    }

    for output in outputs {
        if find_feature(&available, &output.name).is_none() {
            findings.push(format!("Pipeline output '{}' is not produced by any stage", output.name));
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{array_feature_type::ArrayDataType, image_feature_type::ColorSpace, ModelDescription};

    fn stage(input: Vec<FeatureDescription>, output: Vec<FeatureDescription>) -> Model {
        Model {
            description: Some(ModelDescription {
                input,
                output,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_matching_chain() {
        let image = FeatureDescription::image("drawing", 28, 28, ColorSpace::Grayscale);
        let vector = FeatureDescription::multi_array("embedding", vec![128], ArrayDataType::Float32);
        let label = FeatureDescription::string("label");
        let stages = vec![
            stage(vec![image.clone()], vec![vector.clone()]),
            stage(vec![vector], vec![label.clone()]),
        ];
        assert!(chain_mismatches(&[image], &[label], &stages, &[]).is_empty());
    }

    #[test]
    fn test_reports_shape_and_name_mismatches() {
        let image = FeatureDescription::image("drawing", 28, 28, ColorSpace::Grayscale);
        let stages = vec![
            stage(
                vec![image.clone()],
                vec![FeatureDescription::multi_array("embedding", vec![64], ArrayDataType::Float32)],
            ),
            stage(
                vec![
                    FeatureDescription::multi_array("embedding", vec![128], ArrayDataType::Float32),
                    FeatureDescription::string("context"),
                ],
                vec![],
            ),
        ];
        let names = vec!["embedding".to_string(), "classifier".to_string()];
        let findings = chain_mismatches(&[image], &[FeatureDescription::string("label")], &stages, &names);

        assert_eq!(findings.len(), 3);
        assert!(findings[0].contains("expects multiarray float32[128] but receives multiarray float32[64]"));
        assert!(findings[1].contains("'context'"));
        assert!(findings[2].contains("Pipeline output 'label'"));
    }
}
