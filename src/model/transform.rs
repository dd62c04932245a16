use serde::Serialize;

/// A per-level coordinate transformation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CoordinateTransformation {
    Scale { scale: Vec<f64> },
    Translation { translation: Vec<f64> },
}

impl CoordinateTransformation {
    pub fn scale(values: impl Into<Vec<f64>>) -> Self {
        CoordinateTransformation::Scale {
            scale: values.into(),
        }
    }

    pub fn translation(values: impl Into<Vec<f64>>) -> Self {
        CoordinateTransformation::Translation {
            translation: values.into(),
        }
    }

    pub fn values(&self) -> &[f64] {
        match self {
            CoordinateTransformation::Scale { scale } => scale,
            CoordinateTransformation::Translation { translation } => translation,
        }
    }

    /// Number of dimensions this transformation covers.
    pub fn ndim(&self) -> usize {
        self.values().len()
    }

    pub fn is_scale(&self) -> bool {
        matches!(self, CoordinateTransformation::Scale { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CoordinateTransformation::Scale { .. } => "scale",
            CoordinateTransformation::Translation { .. } => "translation",
        }
    }
}
