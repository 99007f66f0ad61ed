use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use log::debug;

use super::error::ComposeError;
use crate::schema::{
    linked_model::LinkType, model, LinkedModel, LinkedModelFile, Model, ModelDescription,
    StringParameter, SPECIFICATION_VERSION,
};

pub const SEARCH_PATH_DELIMITER: char = ':';
pub const MAIN_BUNDLE_TOKEN: &str = "$BUNDLE_MAIN";
pub const BUNDLE_IDENTIFIER_TOKEN: &str = "$BUNDLE_IDENTIFIER";

/// One location the host runtime searches when resolving a linked model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchLocation {
    /// Empty segment: the directory holding the referencing descriptor
    SameLocation,
    Relative(PathBuf),
    Absolute(PathBuf),
    /// The host application's main bundle, optionally narrowed to a subpath
    MainBundle { subpath: Option<PathBuf> },
    /// A bundle looked up by identifier, optionally narrowed to a subpath
    BundleIdentifier {
        identifier: String,
        subpath: Option<PathBuf>,
    },
}

impl SearchLocation {
    fn parse(segment: &str) -> Result<Self, ComposeError> {
        if segment.is_empty() {
            return Ok(Self::SameLocation);
        }

        if let Some(rest) = segment.strip_prefix(BUNDLE_IDENTIFIER_TOKEN) {
            let inner = rest.strip_prefix('(').ok_or_else(|| {
                ComposeError::InvalidSearchPath(format!(
                    "'{}' must be followed by '(<identifier>)' in segment '{}'",
                    BUNDLE_IDENTIFIER_TOKEN, segment
                ))
            })?;
            let close = inner.find(')').ok_or_else(|| {
                ComposeError::InvalidSearchPath(format!("Unclosed bundle identifier in segment '{}'", segment))
            })?;
            let identifier = &inner[..close];
            if identifier.is_empty() {
                return Err(ComposeError::InvalidSearchPath(format!(
                    "Bundle identifier cannot be empty in segment '{}'",
                    segment
                )));
            }
            if identifier.contains('(') {
                return Err(ComposeError::InvalidSearchPath(format!(
                    "Bundle identifier cannot contain '(' in segment '{}'",
                    segment
                )));
            }
            return Ok(Self::BundleIdentifier {
                identifier: identifier.to_string(),
                subpath: Self::parse_subpath(&inner[close + 1..], segment)?,
            });
        }

        if let Some(rest) = segment.strip_prefix(MAIN_BUNDLE_TOKEN) {
            return Ok(Self::MainBundle {
                subpath: Self::parse_subpath(rest, segment)?,
            });
        }

        if segment.starts_with('$') {
            return Err(ComposeError::InvalidSearchPath(format!(
                "Unrecognized location token in segment '{}'",
                segment
            )));
        }

        if segment.starts_with('/') {
            Ok(Self::Absolute(PathBuf::from(segment)))
        } else {
            Ok(Self::Relative(PathBuf::from(segment)))
        }
    }

    fn parse_subpath(rest: &str, segment: &str) -> Result<Option<PathBuf>, ComposeError> {
        if rest.is_empty() {
            return Ok(None);
        }
        match rest.strip_prefix('/') {
            Some("") => Ok(None),
            Some(sub) => Ok(Some(PathBuf::from(sub))),
            None => Err(ComposeError::InvalidSearchPath(format!(
                "Unexpected text after location token in segment '{}'",
                segment
            ))),
        }
    }

    /// Returns true for locations defined by the host application rather than the filesystem
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Self::MainBundle { .. } | Self::BundleIdentifier { .. })
    }
}

/// An ordered, colon-delimited list of places to look for a linked model.
///
/// Parsing only checks syntax. Whether any location exists is decided by
/// the host runtime when it loads the composed model.
///
/// # Example
/// ```
/// use model_composer::{SearchPath, SearchLocation};
///
/// let path: SearchPath = "$BUNDLE_MAIN/Contents/Resources:".parse()?;
/// assert_eq!(path.locations().len(), 2);
/// assert_eq!(path.locations()[1], SearchLocation::SameLocation);
/// # Ok::<(), model_composer::ComposeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    raw: String,
    locations: Vec<SearchLocation>,
}

impl SearchPath {
    pub fn parse(raw: &str) -> Result<Self, ComposeError> {
        let locations = raw
            .split(SEARCH_PATH_DELIMITER)
            .map(SearchLocation::parse)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Parsed search path '{}' into {} locations", raw, locations.len());
        Ok(Self {
            raw: raw.to_string(),
            locations,
        })
    }

    pub fn locations(&self) -> &[SearchLocation] {
        &self.locations
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for SearchPath {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SearchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Names the separately packaged model a pipeline stage points at
#[derive(Debug, Clone)]
pub struct LinkDefinition {
    /// File name of the linked model, usually a compiled `.mlmodelc` bundle
    pub file_name: String,
    /// Raw colon-delimited search path
    pub search_path: String,
}

impl LinkDefinition {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            search_path: String::new(),
        }
    }

    pub fn with_search_path(mut self, search_path: impl Into<String>) -> Self {
        self.search_path = search_path.into();
        self
    }
}

/// Builds a linked-model stage whose interface is copied verbatim from the
/// embedding model's description.
pub(crate) fn linked_model_stage(
    embedding: &ModelDescription,
    link: &LinkDefinition,
    search_path: &SearchPath,
) -> Model {
    let description = ModelDescription {
        input: embedding.input.clone(),
        output: embedding.output.clone(),
        ..Default::default()
    };

    Model {
        specification_version: SPECIFICATION_VERSION,
        description: Some(description),
        is_updatable: false,
        r#type: Some(model::Type::LinkedModel(LinkedModel {
            link_type: Some(LinkType::LinkedModelFile(LinkedModelFile {
                linked_model_file_name: Some(StringParameter {
                    default_value: link.file_name.clone(),
                }),
                linked_model_search_path: Some(StringParameter {
                    default_value: search_path.as_str().to_string(),
                }),
            })),
        })),
    }
}

/// Reads back the file name and search path of a linked-model stage
pub fn link_target(model: &Model) -> Option<(&str, &str)> {
    match model.r#type.as_ref()? {
        model::Type::LinkedModel(linked) => match linked.link_type.as_ref()? {
            LinkType::LinkedModelFile(file) => Some((
                file.linked_model_file_name.as_ref().map(|p| p.default_value.as_str()).unwrap_or(""),
                file.linked_model_search_path.as_ref().map(|p| p.default_value.as_str()).unwrap_or(""),
            )),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{array_feature_type::ArrayDataType, image_feature_type::ColorSpace, FeatureDescription};

    #[test]
    fn test_segment_forms() {
        let path = SearchPath::parse(
            ":models:/opt/models:$BUNDLE_MAIN:$BUNDLE_MAIN/Contents/Resources:$BUNDLE_IDENTIFIER(com.example.kit)/Models",
        )
        .unwrap();

        assert_eq!(
            path.locations(),
            &[
                SearchLocation::SameLocation,
                SearchLocation::Relative(PathBuf::from("models")),
                SearchLocation::Absolute(PathBuf::from("/opt/models")),
                SearchLocation::MainBundle { subpath: None },
                SearchLocation::MainBundle {
                    subpath: Some(PathBuf::from("Contents/Resources"))
                },
                SearchLocation::BundleIdentifier {
                    identifier: "com.example.kit".into(),
                    subpath: Some(PathBuf::from("Models"))
                },
            ]
        );
    }

    #[test]
    fn test_empty_path_is_same_location() {
        let path = SearchPath::parse("").unwrap();
        assert_eq!(path.locations(), &[SearchLocation::SameLocation]);
    }

    #[test]
    fn test_invalid_tokens() {
        for raw in [
            "$HOME/models",
            "$BUNDLE_MAINX",
            "$BUNDLE_IDENTIFIER",
            "$BUNDLE_IDENTIFIER()",
            "$BUNDLE_IDENTIFIER(com.example",
            "$BUNDLE_IDENTIFIER(com.example)extra",
        ] {
            let result = SearchPath::parse(raw);
            assert!(
                matches!(result, Err(ComposeError::InvalidSearchPath(_))),
                "expected '{}' to be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_identifier_error_messages() {
        let message = |raw: &str| match SearchPath::parse(raw) {
            Err(ComposeError::InvalidSearchPath(message)) => message,
            other => panic!("expected '{}' to be rejected, got {:?}", raw, other),
        };

        assert_eq!(
            message("$BUNDLE_IDENTIFIER()"),
            "Bundle identifier cannot be empty in segment '$BUNDLE_IDENTIFIER()'"
        );
        assert_eq!(
            message("$BUNDLE_IDENTIFIER((x)"),
            "Bundle identifier cannot contain '(' in segment '$BUNDLE_IDENTIFIER((x)'"
        );
        assert_eq!(
            message("$BUNDLE_IDENTIFIER(com.(example)/lib"),
            "Bundle identifier cannot contain '(' in segment '$BUNDLE_IDENTIFIER(com.(example)/lib'"
        );
    }

    #[test]
    fn test_display_round_trips_raw_text() {
        let raw = "$BUNDLE_MAIN/Contents/Resources/::relative";
        let path: SearchPath = raw.parse().unwrap();
        assert_eq!(path.to_string(), raw);
        assert_eq!(path.locations().len(), 3);
        assert!(path.locations()[0].is_symbolic());
        assert!(!path.locations()[2].is_symbolic());
    }

    #[test]
    fn test_linked_stage_copies_interface() {
        let embedding = ModelDescription {
            input: vec![FeatureDescription::image("drawing", 28, 28, ColorSpace::Grayscale)],
            output: vec![FeatureDescription::multi_array("embedding", vec![128], ArrayDataType::Float32)],
            ..Default::default()
        };
        let link = LinkDefinition::new("DrawingEmbedding.mlmodelc").with_search_path("$BUNDLE_MAIN");
        let search_path = SearchPath::parse(&link.search_path).unwrap();

        let stage = linked_model_stage(&embedding, &link, &search_path);
        let description = stage.description.as_ref().unwrap();
        assert_eq!(description.input, embedding.input);
        assert_eq!(description.output, embedding.output);
        assert!(!stage.is_updatable);
        assert_eq!(link_target(&stage), Some(("DrawingEmbedding.mlmodelc", "$BUNDLE_MAIN")));
    }
}
