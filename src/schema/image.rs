//! Readers for images and their building blocks.

use serde_json::{Map, Value};

use super::checker::{optional, Checker};
use super::rules::{check_axes, check_datasets, check_transforms};
use crate::model::{Axis, AxisType, CoordinateTransformation, Dataset, Image, Multiscale};
use crate::validation::{IssueCode, Location, ValidationIssue};

pub(crate) fn read_image(
    c: &mut Checker<'_>,
    map: &Map<String, Value>,
    loc: &Location,
) -> Option<Image> {
    let multiscales_loc = loc.key("multiscales");
    let raw = c.required(map, "multiscales", loc)?;
    let multiscales = c.list(raw, &multiscales_loc, 1, read_multiscale)?;
    c.unique(raw, &multiscales_loc);

    let omero = match optional(map, "omero") {
        Some(value) => read_omero(c, value, &loc.key("omero")),
        None => None,
    };

    Some(Image { multiscales, omero })
}

/// Display metadata stays opaque; only its outline is checked.
fn read_omero(c: &mut Checker<'_>, value: &Value, loc: &Location) -> Option<Map<String, Value>> {
    let map = c.object(value, loc)?;
    let channels = c.required(map, "channels", loc)?;
    c.list(channels, &loc.key("channels"), 0, |_, _, _| Some(()))?;
    Some(map.clone())
}

fn read_multiscale(c: &mut Checker<'_>, value: &Value, loc: &Location) -> Option<Multiscale> {
    let map = c.object(value, loc)?;
    let errors_before = c.error_count();

    let name = optional(map, "name").and_then(|v| c.string(v, &loc.key("name")));
    let version = c.version_field(map, loc);
    let downscaling_type = optional(map, "type").and_then(|v| c.string(v, &loc.key("type")));
    let metadata = optional(map, "metadata")
        .and_then(|v| c.object(v, &loc.key("metadata")))
        .cloned();

    let axes_loc = loc.key("axes");
    let axes = c
        .required(map, "axes", loc)
        .and_then(|raw| c.list(raw, &axes_loc, 0, read_axis));

    let datasets_loc = loc.key("datasets");
    let raw_datasets = c.required(map, "datasets", loc);
    let datasets = raw_datasets.and_then(|raw| c.list(raw, &datasets_loc, 1, read_dataset));
    if let Some(raw) = raw_datasets {
        c.unique(raw, &datasets_loc);
    }

    let transforms_loc = loc.key("coordinateTransformations");
    let coordinate_transformations = optional(map, "coordinateTransformations")
        .and_then(|raw| c.list(raw, &transforms_loc, 1, read_transform));

    // A partially unreadable axis list cannot anchor dimension checks.
    let complete_axes = axes.as_ref().filter(|axes| {
        map.get("axes")
            .and_then(Value::as_array)
            .is_some_and(|raw| raw.len() == axes.len())
    });
    if let Some(axes) = complete_axes {
        check_axes(c, axes, &axes_loc);
    }
    let ndim = complete_axes.map(Vec::len);

    if let Some(datasets) = &datasets {
        for (i, ds) in datasets.iter().enumerate() {
            check_transforms(
                c,
                &ds.coordinate_transformations,
                ndim,
                &datasets_loc.index(i).key("coordinateTransformations"),
            );
        }
        let space_axes: Option<Vec<usize>> = complete_axes.map(|axes| {
            axes.iter()
                .enumerate()
                .filter(|(_, a)| a.axis_type == AxisType::Space)
                .map(|(i, _)| i)
                .collect()
        });
        let ordering_ready = c.error_count() == errors_before;
        check_datasets(
            c,
            datasets,
            space_axes.as_deref().filter(|_| ordering_ready),
            &datasets_loc,
        );
    }
    if let Some(transforms) = &coordinate_transformations {
        check_transforms(c, transforms, ndim, &transforms_loc);
    }

    Some(Multiscale {
        name,
        version,
        axes: axes?,
        datasets: datasets?,
        coordinate_transformations,
        downscaling_type,
        metadata,
    })
}

fn read_axis(c: &mut Checker<'_>, value: &Value, loc: &Location) -> Option<Axis> {
    let map = c.object(value, loc)?;
    let name = c
        .required(map, "name", loc)
        .and_then(|v| c.string(v, &loc.key("name")));
    let declared = match optional(map, "type") {
        Some(v) => Some(c.string(v, &loc.key("type"))?),
        None => None,
    };
    let unit = match optional(map, "unit") {
        Some(v) => Some(c.string(v, &loc.key("unit"))?),
        None => None,
    };

    let axis = Axis {
        name: name?,
        axis_type: AxisType::from_declared(declared.as_deref()),
        unit,
    };

    if let (Some(unit), Some(allowed)) = (&axis.unit, axis.allowed_units()) {
        if !allowed.contains(&unit.as_str()) {
            c.push(
                ValidationIssue::error(
                    IssueCode::InvalidUnit,
                    loc.key("unit"),
                    format!(
                        "'{}' is not a valid unit for a {} axis",
                        unit,
                        axis.axis_type.as_declared().unwrap_or("custom")
                    ),
                )
                .with("found", unit.as_str())
                .with("expected", allowed.to_vec()),
            );
        }
    }

    Some(axis)
}

fn read_dataset(c: &mut Checker<'_>, value: &Value, loc: &Location) -> Option<Dataset> {
    let map = c.object(value, loc)?;
    let path = c
        .required(map, "path", loc)
        .and_then(|v| c.string(v, &loc.key("path")));
    if let Some(path) = &path {
        c.node_path(path, &loc.key("path"));
    }

    let transforms_loc = loc.key("coordinateTransformations");
    let transforms = c
        .required(map, "coordinateTransformations", loc)
        .and_then(|raw| c.list(raw, &transforms_loc, 1, read_transform));

    Some(Dataset {
        path: path?,
        coordinate_transformations: transforms?,
    })
}

fn read_transform(
    c: &mut Checker<'_>,
    value: &Value,
    loc: &Location,
) -> Option<CoordinateTransformation> {
    let map = c.object(value, loc)?;
    let kind = c
        .required(map, "type", loc)
        .and_then(|v| c.string(v, &loc.key("type")))?;

    let read_values = |c: &mut Checker<'_>, key: &str| -> Option<Vec<f64>> {
        let raw = c.required(map, key, loc)?;
        let values_loc = loc.key(key);
        let len = raw.as_array().map(Vec::len);
        let values = c.list(raw, &values_loc, 2, |c, v, l| c.number(v, l))?;
        (Some(values.len()) == len).then_some(values)
    };

    match kind.as_str() {
        "scale" => read_values(c, "scale").map(CoordinateTransformation::scale),
        "translation" => read_values(c, "translation").map(CoordinateTransformation::translation),
        other => {
            c.push(
                ValidationIssue::error(
                    IssueCode::InvalidValue,
                    loc.key("type"),
                    format!("Unsupported transformation type '{}'", other),
                )
                .with("expected", vec!["scale", "translation"])
                .with("found", other),
            );
            None
        }
    }
}
