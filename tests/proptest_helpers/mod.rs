#![allow(dead_code)]

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use serde_json::{json, Map, Value};

pub const MARKERS: [&str; 7] = [
    "image-label",
    "multiscales",
    "plate",
    "bioformats2raw.layout",
    "well",
    "labels",
    "series",
];

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// An axis list that satisfies every ordering and count invariant.
#[derive(Clone, Debug)]
pub struct AxesPlan {
    pub time: bool,
    pub channel: bool,
    pub space: usize,
    pub space_unit: Option<&'static str>,
}

impl AxesPlan {
    pub fn axes(&self) -> Vec<Value> {
        let mut axes = Vec::new();
        if self.time {
            axes.push(json!({"name": "t", "type": "time", "unit": "second"}));
        }
        if self.channel {
            axes.push(json!({"name": "c", "type": "channel"}));
        }
        for name in &["z", "y", "x"][3 - self.space..] {
            let mut axis = json!({"name": name, "type": "space"});
            if let Some(unit) = self.space_unit {
                axis["unit"] = json!(unit);
            }
            axes.push(axis);
        }
        axes
    }

    pub fn ndim(&self) -> usize {
        self.time as usize + self.channel as usize + self.space
    }

    /// Per-axis scale of pyramid level `level`: space axes halve in
    /// resolution each level, the others stay at 1.
    pub fn scale(&self, base: f64, level: usize) -> Vec<f64> {
        let leading = self.time as usize + self.channel as usize;
        let factor = (1u32 << level) as f64;
        (0..self.ndim())
            .map(|i| if i < leading { 1.0 } else { base * factor })
            .collect()
    }
}

pub fn arb_axes_plan() -> impl Strategy<Value = AxesPlan> {
    (
        any::<bool>(),
        any::<bool>(),
        2usize..=3,
        prop_oneof![
            Just(None),
            Just(Some("micrometer")),
            Just(Some("nanometer")),
            Just(Some("millimeter")),
        ],
    )
        .prop_map(|(time, channel, space, space_unit)| AxesPlan {
            time,
            channel,
            space,
            space_unit,
        })
}

fn arb_base_scale() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.25), Just(0.5), Just(1.0), Just(0.325), Just(2.0)]
}

/// A multiscale object (0.4 carries its own `version`).
pub fn arb_multiscale(legacy: bool) -> BoxedStrategy<Value> {
    (
        arb_axes_plan(),
        arb_base_scale(),
        1usize..=4,
        any::<bool>(),
        proptest::option::of("[a-z]{1,8}"),
    )
        .prop_map(move |(plan, base, levels, translate, name)| {
            let datasets: Vec<Value> = (0..levels)
                .map(|level| {
                    let mut transforms =
                        vec![json!({"type": "scale", "scale": plan.scale(base, level)})];
                    if translate {
                        transforms.push(json!({
                            "type": "translation",
                            "translation": vec![0.5; plan.ndim()]
                        }));
                    }
                    json!({"path": level.to_string(), "coordinateTransformations": transforms})
                })
                .collect();
            let mut multiscale = Map::new();
            if legacy {
                multiscale.insert("version".into(), json!("0.4"));
            }
            if let Some(name) = name {
                multiscale.insert("name".into(), json!(name));
            }
            multiscale.insert("axes".into(), json!(plan.axes()));
            multiscale.insert("datasets".into(), json!(datasets));
            Value::Object(multiscale)
        })
        .boxed()
}

/// A valid Image document, either 0.4 flat attributes or a 0.5 `ome` map.
pub fn arb_image_document() -> BoxedStrategy<Value> {
    prop_oneof![
        arb_multiscale(true).prop_map(|ms| json!({"multiscales": [ms]})),
        arb_multiscale(false)
            .prop_map(|ms| json!({"ome": {"version": "0.5", "multiscales": [ms]}})),
    ]
    .boxed()
}

/// An object carrying an arbitrary subset of the node kind markers.
pub fn arb_marker_document() -> impl Strategy<Value = Value> {
    proptest::collection::vec(any::<bool>(), MARKERS.len()).prop_map(|present| {
        let map: Map<String, Value> = MARKERS
            .iter()
            .zip(present)
            .filter(|(_, keep)| *keep)
            .map(|(marker, _)| (marker.to_string(), json!({})))
            .collect();
        Value::Object(map)
    })
}
