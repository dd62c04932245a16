use serde_json::{Map, Value};

use super::checker::{optional, Checker};
use super::image::read_image;
use crate::model::{ImageLabel, LabelColor, LabelImage, LabelProperty, LabelSource, LabelsGroup};
use crate::validation::{IssueCode, Location, ValidationIssue};

pub(crate) fn read_label_image(
    c: &mut Checker<'_>,
    map: &Map<String, Value>,
    loc: &Location,
) -> Option<LabelImage> {
    let image = read_image(c, map, loc);
    let image_label = c
        .required(map, "image-label", loc)
        .and_then(|v| read_image_label(c, v, &loc.key("image-label")));
    Some(LabelImage {
        image: image?,
        image_label: image_label?,
    })
}

fn read_image_label(c: &mut Checker<'_>, value: &Value, loc: &Location) -> Option<ImageLabel> {
    let map = c.object(value, loc)?;
    let version = c.version_field(map, loc);

    let colors = match optional(map, "colors") {
        Some(raw) => {
            let colors_loc = loc.key("colors");
            c.unique(raw, &colors_loc);
            Some(c.list(raw, &colors_loc, 1, read_color)?)
        }
        None => None,
    };
    let properties = match optional(map, "properties") {
        Some(raw) => {
            let properties_loc = loc.key("properties");
            c.unique(raw, &properties_loc);
            Some(c.list(raw, &properties_loc, 1, read_property)?)
        }
        None => None,
    };
    let source = match optional(map, "source") {
        Some(raw) => Some(read_source(c, raw, &loc.key("source"))?),
        None => None,
    };

    Some(ImageLabel {
        version,
        colors,
        properties,
        source,
    })
}

fn read_color(c: &mut Checker<'_>, value: &Value, loc: &Location) -> Option<LabelColor> {
    let map = c.object(value, loc)?;
    let label_loc = loc.key("label-value");
    let label_value = c.required(map, "label-value", loc).and_then(|v| {
        c.number(v, &label_loc)?;
        match v {
            Value::Number(n) => Some(n.clone()),
            _ => None,
        }
    });

    let rgba = match optional(map, "rgba") {
        Some(raw) => Some(read_rgba(c, raw, &loc.key("rgba"))?),
        None => None,
    };

    Some(LabelColor {
        label_value: label_value?,
        rgba,
    })
}

fn read_rgba(c: &mut Checker<'_>, value: &Value, loc: &Location) -> Option<[u8; 4]> {
    let channels = c.list(value, loc, 4, |c, v, l| {
        let n = c.integer(v, l)?;
        match u8::try_from(n) {
            Ok(byte) => Some(byte),
            Err(_) => {
                c.push(
                    ValidationIssue::error(
                        IssueCode::OutOfRange,
                        l.clone(),
                        format!("RGBA component {} is outside 0-255", n),
                    )
                    .with("expected", "0-255")
                    .with("found", n),
                );
                None
            }
        }
    })?;
    let declared = value.as_array().map_or(0, Vec::len);
    if declared > 4 {
        c.push(
            ValidationIssue::error(
                IssueCode::TooLong,
                loc.clone(),
                format!("RGBA must have exactly 4 components, found {}", declared),
            )
            .with("expected", 4)
            .with("found", declared),
        );
        return None;
    }
    channels.try_into().ok()
}

fn read_property(c: &mut Checker<'_>, value: &Value, loc: &Location) -> Option<LabelProperty> {
    let map = c.object(value, loc)?;
    let label_value = c
        .required(map, "label-value", loc)
        .and_then(|v| c.integer(v, &loc.key("label-value")))?;
    let extra = map
        .iter()
        .filter(|(key, _)| key.as_str() != "label-value")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Some(LabelProperty { label_value, extra })
}

fn read_source(c: &mut Checker<'_>, value: &Value, loc: &Location) -> Option<LabelSource> {
    let map = c.object(value, loc)?;
    let image = match optional(map, "image") {
        Some(v) => Some(c.string(v, &loc.key("image"))?),
        None => None,
    };
    Some(LabelSource { image })
}

pub(crate) fn read_labels_group(
    c: &mut Checker<'_>,
    map: &Map<String, Value>,
    loc: &Location,
) -> Option<LabelsGroup> {
    let labels_loc = loc.key("labels");
    let raw = c.required(map, "labels", loc)?;
    let labels = c.list(raw, &labels_loc, 1, |c, v, l| {
        let name = c.string(v, l)?;
        c.node_path(&name, l).then_some(name)
    })?;
    c.unique(raw, &labels_loc);
    Some(LabelsGroup { labels })
}
