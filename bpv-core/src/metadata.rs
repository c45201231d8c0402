/// Blueprint metadata as served by the blueprint API
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::ColorSpec;
use crate::error::FetchError;

/// Identity of a stored blueprint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlueprintId(pub String);

impl BlueprintId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for BlueprintId {
    fn from(id: u64) -> Self {
        BlueprintId(id.to_string())
    }
}

impl From<&str> for BlueprintId {
    fn from(id: &str) -> Self {
        BlueprintId(id.to_string())
    }
}

impl fmt::Display for BlueprintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extents of the converted model along each axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Dimensions {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Every axis is a finite, strictly positive number, also at the `f32` precision meshes use
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.z].iter().all(|v| {
            let narrowed = *v as f32;
            v.is_finite() && *v > 0.0 && narrowed.is_finite() && narrowed > 0.0
        })
    }

    /// Text shown next to the solid
    pub fn label_text(&self) -> String {
        format!("X: {} Y: {} Z: {}", self.x, self.y, self.z)
    }
}

/// Wire shape of `GET /blueprint/{id}`
///
/// `dimensions` is normally a JSON-encoded string, though an inline object is tolerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintRecord {
    #[serde(default)]
    pub dimensions: Value,
    #[serde(default)]
    pub color: Option<String>,
}

/// Metadata the scene is built from
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlueprintMetadata {
    pub dimensions: Option<Dimensions>,
    pub color: ColorSpec,
}

impl BlueprintMetadata {
    pub fn from_record(record: &BlueprintRecord) -> Result<Self, FetchError> {
        let dimensions = match &record.dimensions {
            Value::Null => None,
            Value::String(encoded) => Some(serde_json::from_str::<Dimensions>(encoded)?),
            inline @ Value::Object(_) => Some(Dimensions::deserialize(inline)?),
            other => {
                return Err(FetchError::Malformed(format!(
                    "dimensions must be an object or JSON string, got {other}"
                )))
            }
        };

        if let Some(dims) = &dimensions {
            if !dims.is_valid() {
                return Err(FetchError::Malformed(format!(
                    "dimensions must be finite and positive, got {dims:?}"
                )));
            }
        }

        let color = record
            .color
            .as_deref()
            .map(ColorSpec::parse)
            .unwrap_or_default();

        Ok(Self { dimensions, color })
    }

    /// Decode a raw response body
    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        let record: BlueprintRecord = serde_json::from_str(body)?;
        Self::from_record(&record)
    }
}
