//! Per-page rotation state
//!
//! Rotations are kept as a closed set of quarter turns. Values that arrive
//! from outside (JSON maps sent to the compression endpoint, config files)
//! are clamped to [`RotationAngle::None`] when they are not a quarter turn.

use crate::error::{PageDeckError, Result};
use crate::page::PageId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use tracing::warn;

/// Rotation angle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RotationAngle {
    /// No rotation (0 degrees)
    #[default]
    None,
    /// 90 degrees clockwise
    Clockwise90,
    /// 180 degrees
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Clockwise270,
}

impl RotationAngle {
    /// All four angles, in clockwise order.
    pub const ALL: [RotationAngle; 4] = [
        RotationAngle::None,
        RotationAngle::Clockwise90,
        RotationAngle::Rotate180,
        RotationAngle::Clockwise270,
    ];

    /// Create from degrees. Negative and over-full turns are normalized.
    pub fn from_degrees(degrees: i64) -> Result<Self> {
        match degrees.rem_euclid(360) {
            0 => Ok(RotationAngle::None),
            90 => Ok(RotationAngle::Clockwise90),
            180 => Ok(RotationAngle::Rotate180),
            270 => Ok(RotationAngle::Clockwise270),
            _ => Err(PageDeckError::InvalidRotation(degrees)),
        }
    }

    /// Like [`from_degrees`](Self::from_degrees) but only accepts the exact
    /// values 0, 90, 180 and 270; anything else becomes `None`.
    pub fn clamp_degrees(degrees: i64) -> Self {
        match degrees {
            0 => RotationAngle::None,
            90 => RotationAngle::Clockwise90,
            180 => RotationAngle::Rotate180,
            270 => RotationAngle::Clockwise270,
            other => {
                warn!("Unsupported rotation angle {other}, using 0");
                RotationAngle::None
            }
        }
    }

    /// Convert to degrees
    pub fn to_degrees(self) -> i64 {
        match self {
            RotationAngle::None => 0,
            RotationAngle::Clockwise90 => 90,
            RotationAngle::Rotate180 => 180,
            RotationAngle::Clockwise270 => 270,
        }
    }

    /// Combine two rotations
    pub fn combine(self, other: RotationAngle) -> RotationAngle {
        Self::ALL[((self.quarter_turns() + other.quarter_turns()) % 4) as usize]
    }

    /// The rotation that undoes this one.
    pub fn inverse(self) -> RotationAngle {
        Self::ALL[((4 - self.quarter_turns()) % 4) as usize]
    }

    /// Apply one quarter turn in the given direction.
    pub fn turn(self, direction: RotateDirection) -> RotationAngle {
        match direction {
            RotateDirection::Right => self.combine(RotationAngle::Clockwise90),
            RotateDirection::Left => self.combine(RotationAngle::Clockwise270),
        }
    }

    /// Whether width and height trade places when this rotation is applied.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            RotationAngle::Clockwise90 | RotationAngle::Clockwise270
        )
    }

    pub fn is_none(self) -> bool {
        self == RotationAngle::None
    }

    fn quarter_turns(self) -> u8 {
        match self {
            RotationAngle::None => 0,
            RotationAngle::Clockwise90 => 1,
            RotationAngle::Rotate180 => 2,
            RotationAngle::Clockwise270 => 3,
        }
    }
}

impl Serialize for RotationAngle {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_degrees())
    }
}

impl<'de> Deserialize<'de> for RotationAngle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // Accept floats too; JSON clients frequently send `90.0`.
        let value = f64::deserialize(deserializer)?;
        if value.fract() != 0.0 {
            warn!("Unsupported rotation angle {value}, using 0");
            return Ok(RotationAngle::None);
        }
        Ok(RotationAngle::clamp_degrees(value as i64))
    }
}

/// Direction of a manual rotate action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotateDirection {
    /// Counter-clockwise (-90)
    Left,
    /// Clockwise (+90)
    Right,
}

impl std::str::FromStr for RotateDirection {
    type Err = PageDeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "ccw" => Ok(RotateDirection::Left),
            "right" | "cw" => Ok(RotateDirection::Right),
            other => Err(PageDeckError::Config(format!(
                "unknown rotate direction '{other}' (expected left or right)"
            ))),
        }
    }
}

/// Map from page id to rotation. Absent entries mean no rotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RotationMap {
    angles: HashMap<PageId, RotationAngle>,
}

impl RotationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotation of a page, `None` when the page was never rotated.
    pub fn get(&self, id: &PageId) -> RotationAngle {
        self.angles.get(id).copied().unwrap_or_default()
    }

    /// Set an absolute rotation. Storing `None` drops the entry.
    pub fn set(&mut self, id: PageId, angle: RotationAngle) {
        if angle.is_none() {
            self.angles.remove(&id);
        } else {
            self.angles.insert(id, angle);
        }
    }

    /// Rotate one quarter turn and return the new angle.
    pub fn rotate(&mut self, id: &PageId, direction: RotateDirection) -> RotationAngle {
        let angle = self.get(id).turn(direction);
        self.set(id.clone(), angle);
        angle
    }

    pub fn remove(&mut self, id: &PageId) -> Option<RotationAngle> {
        self.angles.remove(id)
    }

    pub fn contains(&self, id: &PageId) -> bool {
        self.angles.contains_key(id)
    }

    pub fn clear(&mut self) {
        self.angles.clear();
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PageId, RotationAngle)> {
        self.angles.iter().map(|(id, angle)| (id, *angle))
    }

    /// JSON object of `id -> degrees`, the wire form used by the compression endpoint.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
