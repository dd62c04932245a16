use serde::Serialize;
use serde_json::{Map, Value};

use super::{Axis, AxisType, CoordinateTransformation};

/// One resolution level of a multiscale image.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dataset {
    /// Path of the level's array, relative to the image group.
    pub path: String,
    #[serde(rename = "coordinateTransformations")]
    pub coordinate_transformations: Vec<CoordinateTransformation>,
}

impl Dataset {
    /// Creates a level with a single scale transformation.
    pub fn new(path: impl Into<String>, scale: impl Into<Vec<f64>>) -> Self {
        Self {
            path: path.into(),
            coordinate_transformations: vec![CoordinateTransformation::scale(scale)],
        }
    }

    pub fn with_translation(mut self, translation: impl Into<Vec<f64>>) -> Self {
        self.coordinate_transformations
            .push(CoordinateTransformation::translation(translation));
        self
    }

    /// The scale factors of this level, if it has a scale transformation.
    pub fn scale(&self) -> Option<&[f64]> {
        self.coordinate_transformations
            .iter()
            .find(|t| t.is_scale())
            .map(|t| t.values())
    }

    /// Dimensionality implied by the first transformation.
    pub fn ndim(&self) -> Option<usize> {
        self.coordinate_transformations.first().map(|t| t.ndim())
    }
}

/// A multi-resolution pyramid with its axes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Multiscale {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Per-object version string (0.4 documents only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub axes: Vec<Axis>,
    pub datasets: Vec<Dataset>,
    #[serde(
        rename = "coordinateTransformations",
        skip_serializing_if = "Option::is_none"
    )]
    pub coordinate_transformations: Option<Vec<CoordinateTransformation>>,
    /// Downscaling method, e.g. `gaussian`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub downscaling_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Multiscale {
    pub fn new(axes: Vec<Axis>, datasets: Vec<Dataset>) -> Self {
        Self {
            name: None,
            version: None,
            axes,
            datasets,
            coordinate_transformations: None,
            downscaling_type: None,
            metadata: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    pub fn axis_names(&self) -> Vec<&str> {
        self.axes.iter().map(|a| a.name.as_str()).collect()
    }

    /// Indices of the space axes, in axis order.
    pub fn space_axis_indices(&self) -> Vec<usize> {
        self.axes
            .iter()
            .enumerate()
            .filter(|(_, a)| a.axis_type == AxisType::Space)
            .map(|(i, _)| i)
            .collect()
    }
}

/// A multi-resolution image.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Image {
    pub multiscales: Vec<Multiscale>,
    /// Display metadata, kept as supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omero: Option<Map<String, Value>>,
}

impl Image {
    pub fn new(multiscales: Vec<Multiscale>) -> Self {
        Self {
            multiscales,
            omero: None,
        }
    }

    pub fn with_omero(mut self, omero: Map<String, Value>) -> Self {
        self.omero = Some(omero);
        self
    }
}
