//! Isochrone request settings shared by the settings panel and the map.
//!
//! Settings are plain values. Every change goes through a `with_*` method
//! that returns a new record, so the store always receives a complete,
//! self-contained snapshot.

use serde::{Deserialize, Serialize};

/// Mode of transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Pedestrian,
    #[default]
    Car,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Pedestrian, Mode::Car];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Pedestrian => "pedestrian",
            Mode::Car => "car",
        }
    }
}

/// Live traffic usage. Only meaningful for [`Mode::Car`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Traffic {
    Enabled,
    #[default]
    Disabled,
}

impl Traffic {
    pub const ALL: [Traffic; 2] = [Traffic::Enabled, Traffic::Disabled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Traffic::Enabled => "enabled",
            Traffic::Disabled => "disabled",
        }
    }
}

/// Whether the range is a travel distance or a travel time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeType {
    Distance,
    #[default]
    Time,
}

impl RangeType {
    pub const ALL: [RangeType; 2] = [RangeType::Distance, RangeType::Time];

    pub fn as_str(&self) -> &'static str {
        match self {
            RangeType::Distance => "distance",
            RangeType::Time => "time",
        }
    }

    /// Display unit of a range value of this type.
    pub fn unit(&self) -> &'static str {
        match self {
            RangeType::Time => "minutes",
            RangeType::Distance => "kilometers",
        }
    }
}

/// Bounded range value, in minutes or kilometers depending on [`RangeType`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Range {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for Range {
    fn default() -> Self {
        Self {
            value: 10.0,
            min: 1.0,
            max: 60.0,
            step: 1.0,
        }
    }
}

impl Range {
    /// Returns a copy holding `value` clamped into `[min, max]` and snapped
    /// to the step grid anchored at `min`. Non-finite input, or bounds that
    /// do not form an interval, keep the current value.
    pub fn with_value(&self, value: f64) -> Range {
        if !value.is_finite() || !self.is_ordered() {
            return *self;
        }
        let clamped = value.clamp(self.min, self.max);
        let snapped = if self.step > 0.0 {
            self.min + ((clamped - self.min) / self.step).round() * self.step
        } else {
            clamped
        };
        Range {
            value: snapped.clamp(self.min, self.max),
            ..*self
        }
    }

    /// `min <= max`, with neither bound NaN.
    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Center of the requested isochrones. Both halves must be set before a
/// request can be made.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IsochronesCenter {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl IsochronesCenter {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
        }
    }

    /// `(lat, lng)` when both are defined.
    pub fn coordinate(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.coordinate().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: Mode,
    pub traffic: Traffic,
    pub rangetype: RangeType,
    pub range: Range,
    pub isochrones_center: IsochronesCenter,
}

impl Settings {
    pub fn with_mode(&self, mode: Mode) -> Settings {
        Settings { mode, ..*self }
    }

    pub fn with_traffic(&self, traffic: Traffic) -> Settings {
        Settings { traffic, ..*self }
    }

    pub fn with_rangetype(&self, rangetype: RangeType) -> Settings {
        Settings { rangetype, ..*self }
    }

    pub fn with_range_value(&self, value: f64) -> Settings {
        Settings {
            range: self.range.with_value(value),
            ..*self
        }
    }

    pub fn with_center(&self, isochrones_center: IsochronesCenter) -> Settings {
        Settings {
            isochrones_center,
            ..*self
        }
    }

    /// Traffic setting in effect: always `None` unless travelling by car.
    pub fn effective_traffic(&self) -> Option<Traffic> {
        match self.mode {
            Mode::Car => Some(self.traffic),
            Mode::Pedestrian => None,
        }
    }
}
