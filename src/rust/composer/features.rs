use crate::schema::{
    array_feature_type::ArrayDataType, dictionary_feature_type::KeyType, feature_type::Type,
    image_feature_type::ColorSpace, ArrayFeatureType, DictionaryFeatureType, FeatureDescription,
    FeatureType, ImageFeatureType, StringFeatureType,
};

impl FeatureDescription {
    fn typed(name: impl Into<String>, kind: Type) -> Self {
        Self {
            name: name.into(),
            short_description: String::new(),
            r#type: Some(FeatureType {
                r#type: Some(kind),
                is_optional: false,
            }),
        }
    }

    /// Creates a fixed-size image feature
    ///
    /// # Example
    /// ```
    /// use model_composer::schema::{FeatureDescription, image_feature_type::ColorSpace};
    ///
    /// let drawing = FeatureDescription::image("drawing", 28, 28, ColorSpace::Grayscale)
    ///     .with_description("Input sketch");
    /// assert_eq!(drawing.shape_summary(), "image 28x28 grayscale");
    /// ```
    pub fn image(name: impl Into<String>, width: i64, height: i64, color_space: ColorSpace) -> Self {
        Self::typed(
            name,
            Type::ImageType(ImageFeatureType {
                width,
                height,
                color_space: color_space as i32,
            }),
        )
    }

    /// Creates a fixed-shape numeric array feature
    pub fn multi_array(name: impl Into<String>, shape: Vec<i64>, data_type: ArrayDataType) -> Self {
        Self::typed(
            name,
            Type::MultiArrayType(ArrayFeatureType {
                shape,
                data_type: data_type as i32,
            }),
        )
    }

    /// Creates a string feature
    pub fn string(name: impl Into<String>) -> Self {
        Self::typed(name, Type::StringType(StringFeatureType {}))
    }

    /// Creates a string-keyed dictionary feature, used for per-label scores
    pub fn string_dictionary(name: impl Into<String>) -> Self {
        Self::typed(
            name,
            Type::DictionaryType(DictionaryFeatureType {
                key_type: Some(KeyType::StringKeyType(StringFeatureType {})),
            }),
        )
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.short_description = description.into();
        self
    }

    /// Returns the feature's kind, if one was declared
    pub fn kind(&self) -> Option<&Type> {
        self.r#type.as_ref().and_then(|t| t.r#type.as_ref())
    }

    /// Number of scalar elements in a multi-array feature.
    ///
    /// Returns `None` for non-array features and for arrays with a
    /// non-positive or empty shape.
    pub fn element_count(&self) -> Option<usize> {
        match self.kind()? {
            Type::MultiArrayType(array) if !array.shape.is_empty() => array
                .shape
                .iter()
                .try_fold(1usize, |acc, &dim| {
                    usize::try_from(dim).ok().filter(|&d| d > 0).and_then(|d| acc.checked_mul(d))
                }),
            _ => None,
        }
    }

    /// One-line human readable description of the feature's type
    pub fn shape_summary(&self) -> String {
        match self.kind() {
            None => "untyped".to_string(),
            Some(Type::Int64Type(_)) => "int64".to_string(),
            Some(Type::DoubleType(_)) => "double".to_string(),
            Some(Type::StringType(_)) => "string".to_string(),
            Some(Type::ImageType(image)) => {
                let space = match image.color_space() {
                    ColorSpace::Grayscale => "grayscale",
                    ColorSpace::Rgb => "rgb",
                    ColorSpace::Bgr => "bgr",
                    ColorSpace::InvalidColorSpace => "unknown",
                };
                format!("image {}x{} {}", image.width, image.height, space)
            }
            Some(Type::MultiArrayType(array)) => {
                let element = match array.data_type() {
                    ArrayDataType::Float32 => "float32",
                    ArrayDataType::Double => "double",
                    ArrayDataType::Int32 => "int32",
                    ArrayDataType::InvalidArrayDataType => "unknown",
                };
                let dims: Vec<String> = array.shape.iter().map(|d| d.to_string()).collect();
                format!("multiarray {}[{}]", element, dims.join("x"))
            }
            Some(Type::DictionaryType(dict)) => match dict.key_type {
                Some(KeyType::StringKeyType(_)) => "dictionary<string, double>".to_string(),
                Some(KeyType::Int64KeyType(_)) => "dictionary<int64, double>".to_string(),
                None => "dictionary".to_string(),
            },
        }
    }
}

/// Finds a feature by name
pub fn find_feature<'a>(features: &'a [FeatureDescription], name: &str) -> Option<&'a FeatureDescription> {
    features.iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_summaries() {
        assert_eq!(
            FeatureDescription::image("drawing", 28, 28, ColorSpace::Grayscale).shape_summary(),
            "image 28x28 grayscale"
        );
        assert_eq!(
            FeatureDescription::multi_array("embedding", vec![128], ArrayDataType::Float32).shape_summary(),
            "multiarray float32[128]"
        );
        assert_eq!(FeatureDescription::string("label").shape_summary(), "string");
        assert_eq!(
            FeatureDescription::string_dictionary("labelProbs").shape_summary(),
            "dictionary<string, double>"
        );
        assert_eq!(FeatureDescription::default().shape_summary(), "untyped");
    }

    #[test]
    fn test_element_count() {
        let vector = FeatureDescription::multi_array("v", vec![128], ArrayDataType::Float32);
        assert_eq!(vector.element_count(), Some(128));

        let grid = FeatureDescription::multi_array("g", vec![1, 4, 8], ArrayDataType::Double);
        assert_eq!(grid.element_count(), Some(32));

        let bad = FeatureDescription::multi_array("b", vec![4, 0], ArrayDataType::Float32);
        assert_eq!(bad.element_count(), None);

        assert_eq!(FeatureDescription::string("s").element_count(), None);
    }

    #[test]
    fn test_find_feature() {
        let features = vec![
            FeatureDescription::string("label"),
            FeatureDescription::string_dictionary("labelProbs"),
        ];
        assert!(find_feature(&features, "labelProbs").is_some());
        assert!(find_feature(&features, "missing").is_none());
    }
}
