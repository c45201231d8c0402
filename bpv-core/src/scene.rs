/// Scene graph for one blueprint render: the solid and its optional dimension label
use nalgebra::Point3;

use crate::color::{ColorSpec, Rgb};
use crate::config::ViewerConfig;
use crate::error::LabelAttachmentError;
use crate::geometry::Mesh;
use crate::metadata::Dimensions;

/// The placeholder solid standing in for the converted model
#[derive(Debug, Clone, PartialEq)]
pub struct Solid {
    pub mesh: Mesh,
    pub size: [f32; 3],
    pub color: Rgb,
}

/// What a label shows and where, before a font is available
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSpec {
    pub text: String,
    pub anchor: Point3<f32>,
    pub color: Rgb,
    pub size: f32,
}

/// Font family a host renders label text with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typeface {
    pub family: String,
}

impl Typeface {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
        }
    }
}

/// A label with its font resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub spec: LabelSpec,
    pub typeface: Typeface,
}

#[derive(Debug, Clone, PartialEq)]
enum LabelSlot {
    Empty,
    Pending(LabelSpec),
    Attached(Label),
}

pub enum FontStatus {
    Ready(Typeface),
    Pending,
    Unavailable(LabelAttachmentError),
}

/// Source of the labeling font; may become ready some frames after it is first asked for
pub trait FontSource {
    fn poll_typeface(&mut self) -> FontStatus;
}

/// A font that is always available
#[derive(Debug, Clone)]
pub struct StaticFont(pub Typeface);

impl FontSource for StaticFont {
    fn poll_typeface(&mut self) -> FontStatus {
        FontStatus::Ready(self.0.clone())
    }
}

/// Live scene content owned by one viewer
#[derive(Debug, Clone, PartialEq)]
pub struct SceneState {
    pub solid: Solid,
    label: LabelSlot,
}

impl SceneState {
    pub fn label(&self) -> Option<&Label> {
        match &self.label {
            LabelSlot::Attached(label) => Some(label),
            _ => None,
        }
    }

    pub fn pending_label(&self) -> Option<&LabelSpec> {
        match &self.label {
            LabelSlot::Pending(spec) => Some(spec),
            _ => None,
        }
    }

    /// Try to resolve a pending label's font. Returns true once a label got attached.
    ///
    /// An unavailable font drops the label; the solid keeps rendering without it.
    pub fn attach_label(&mut self, fonts: &mut dyn FontSource) -> bool {
        let LabelSlot::Pending(spec) = &self.label else {
            return false;
        };
        match fonts.poll_typeface() {
            FontStatus::Ready(typeface) => {
                self.label = LabelSlot::Attached(Label {
                    spec: spec.clone(),
                    typeface,
                });
                true
            }
            FontStatus::Pending => false,
            FontStatus::Unavailable(err) => {
                tracing::debug!(%err, "dropping dimension label");
                self.label = LabelSlot::Empty;
                false
            }
        }
    }
}

/// Builds [`SceneState`] from dimensions and a color selection
#[derive(Debug, Clone)]
pub struct SceneBuilder {
    default_color: Rgb,
    default_dimensions: Dimensions,
    label_color: Rgb,
    label_offset: [f32; 3],
    label_size: f32,
}

impl SceneBuilder {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            default_color: config.default_color,
            default_dimensions: config.default_dimensions,
            label_color: config.label_color,
            label_offset: config.label_offset,
            label_size: config.label_size,
        }
    }

    pub fn default_color(&self) -> Rgb {
        self.default_color
    }

    /// Construct a fresh scene. The label, if any, starts out pending its font.
    pub fn build(&self, dimensions: Option<&Dimensions>, color: &ColorSpec) -> SceneState {
        let dimensions = dimensions.filter(|d| d.is_valid());
        let dims = dimensions.unwrap_or(&self.default_dimensions);
        let size = [dims.x as f32, dims.y as f32, dims.z as f32];

        let solid = Solid {
            mesh: Mesh::cuboid(size[0], size[1], size[2]),
            size,
            color: color.resolve(self.default_color),
        };

        let label = match dimensions {
            Some(dims) => {
                let [x, y, z] = self.label_offset;
                LabelSlot::Pending(LabelSpec {
                    text: dims.label_text(),
                    anchor: Point3::new(x, y, z),
                    color: self.label_color,
                    size: self.label_size,
                })
            }
            None => LabelSlot::Empty,
        };

        SceneState { solid, label }
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new(&ViewerConfig::default())
    }
}
