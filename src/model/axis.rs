use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// SI length units accepted on space axes.
pub const SPACE_UNITS: &[&str] = &[
    "angstrom",
    "attometer",
    "centimeter",
    "decimeter",
    "exameter",
    "femtometer",
    "foot",
    "gigameter",
    "hectometer",
    "inch",
    "kilometer",
    "megameter",
    "meter",
    "micrometer",
    "mile",
    "millimeter",
    "nanometer",
    "parsec",
    "petameter",
    "picometer",
    "terameter",
    "yard",
    "yoctometer",
    "yottameter",
    "zeptometer",
    "zettameter",
];

/// SI time units accepted on time axes.
pub const TIME_UNITS: &[&str] = &[
    "attosecond",
    "centisecond",
    "day",
    "decisecond",
    "exasecond",
    "femtosecond",
    "gigasecond",
    "hectosecond",
    "hour",
    "kilosecond",
    "megasecond",
    "microsecond",
    "millisecond",
    "minute",
    "nanosecond",
    "petasecond",
    "picosecond",
    "second",
    "terasecond",
    "yoctosecond",
    "yottasecond",
    "zeptosecond",
    "zettasecond",
];

/// The role of an axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AxisType {
    Space,
    Time,
    Channel,
    /// Any other declared type, or none at all.
    Custom(Option<String>),
}

impl AxisType {
    /// Maps a declared `type` value (or its absence) to an axis type.
    pub fn from_declared(raw: Option<&str>) -> Self {
        match raw {
            Some("space") => AxisType::Space,
            Some("time") => AxisType::Time,
            Some("channel") => AxisType::Channel,
            other => AxisType::Custom(other.map(str::to_string)),
        }
    }

    /// The declared `type` string, if any.
    pub fn as_declared(&self) -> Option<&str> {
        match self {
            AxisType::Space => Some("space"),
            AxisType::Time => Some("time"),
            AxisType::Channel => Some("channel"),
            AxisType::Custom(raw) => raw.as_deref(),
        }
    }

    /// Position class used by the ordering rule: time, then
    /// channel/custom, then space.
    pub fn order_rank(&self) -> u8 {
        match self {
            AxisType::Time => 0,
            AxisType::Channel | AxisType::Custom(_) => 1,
            AxisType::Space => 2,
        }
    }
}

/// A named dimension of an image.
#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    pub name: String,
    pub axis_type: AxisType,
    pub unit: Option<String>,
}

impl Axis {
    pub fn new(name: impl Into<String>, axis_type: AxisType) -> Self {
        Self {
            name: name.into(),
            axis_type,
            unit: None,
        }
    }

    pub fn space(name: impl Into<String>) -> Self {
        Self::new(name, AxisType::Space)
    }

    pub fn time(name: impl Into<String>) -> Self {
        Self::new(name, AxisType::Time)
    }

    pub fn channel(name: impl Into<String>) -> Self {
        Self::new(name, AxisType::Channel)
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Returns the accepted units for this axis, if its type restricts them.
    pub fn allowed_units(&self) -> Option<&'static [&'static str]> {
        match self.axis_type {
            AxisType::Space => Some(SPACE_UNITS),
            AxisType::Time => Some(TIME_UNITS),
            _ => None,
        }
    }
}

impl Serialize for Axis {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        if let Some(declared) = self.axis_type.as_declared() {
            map.serialize_entry("type", declared)?;
        }
        if let Some(unit) = &self.unit {
            map.serialize_entry("unit", unit)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_unknown_type_is_custom() {
        assert_eq!(AxisType::from_declared(None), AxisType::Custom(None));
        assert_eq!(
            AxisType::from_declared(Some("angle")),
            AxisType::Custom(Some("angle".into()))
        );
        assert_eq!(AxisType::from_declared(Some("space")), AxisType::Space);
    }

    #[test]
    fn serialization_omits_absent_type_and_unit() {
        let axis = Axis::new("c", AxisType::Custom(None));
        let value = serde_json::to_value(&axis).unwrap();
        assert_eq!(value, serde_json::json!({"name": "c"}));

        let axis = Axis::space("x").with_unit("micrometer");
        let value = serde_json::to_value(&axis).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"name": "x", "type": "space", "unit": "micrometer"})
        );
    }

    #[test]
    fn units_are_restricted_for_space_and_time_only() {
        assert!(Axis::space("x").allowed_units().unwrap().contains(&"micrometer"));
        assert!(Axis::time("t").allowed_units().unwrap().contains(&"second"));
        assert!(Axis::channel("c").allowed_units().is_none());
    }
}
