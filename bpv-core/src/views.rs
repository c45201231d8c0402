/// Fixed named viewpoints and their camera placements
use std::fmt;
use std::str::FromStr;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::error::ViewError;

/// One of the four fixed camera placements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewName {
    Top,
    #[default]
    Front,
    Right,
    Left,
}

impl ViewName {
    pub const ALL: [ViewName; 4] = [ViewName::Top, ViewName::Front, ViewName::Right, ViewName::Left];

    /// Camera position for this viewpoint, looking at the origin
    pub fn base_position(self) -> Point3<f32> {
        let [x, y, z] = match self {
            ViewName::Top => [0.0, 20.0, 0.0],
            ViewName::Front => [0.0, 0.0, 20.0],
            ViewName::Right => [20.0, 0.0, 0.0],
            ViewName::Left => [-20.0, 0.0, 0.0],
        };
        Point3::new(x, y, z)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewName::Top => "top",
            ViewName::Front => "front",
            ViewName::Right => "right",
            ViewName::Left => "left",
        }
    }

    /// Human label used by pickers
    pub fn title(self) -> &'static str {
        match self {
            ViewName::Top => "Top View",
            ViewName::Front => "Front View",
            ViewName::Right => "Right Side View",
            ViewName::Left => "Left Side View",
        }
    }

    /// Next viewpoint in picker order, wrapping around
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl FromStr for ViewName {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(ViewName::Top),
            "front" => Ok(ViewName::Front),
            "right" => Ok(ViewName::Right),
            "left" => Ok(ViewName::Left),
            other => Err(ViewError::UnknownView(other.to_string())),
        }
    }
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
