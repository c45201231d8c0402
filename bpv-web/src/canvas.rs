/// 2D canvas surface and the DOM element it is mounted into
use bpv_core::{
    Camera, FontSource, FontStatus, Frame, Label, LabelAttachmentError, MountPoint, RenderSurface,
    ResourceAcquisitionError, Rgb, SceneState, SurfaceError, SurfaceSize, Typeface,
};
use nalgebra::{Matrix4, Vector3};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement};

/// Light that never reaches a face still leaves it visible
const AMBIENT: f32 = 0.2;

const BACKGROUND: &str = "#000000";

fn js_error(value: JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}

/// One projected face, ready for the painter's algorithm
struct ScreenFace {
    points: [(f32, f32); 3],
    depth: f32,
    color: Rgb,
}

/// A `<canvas>` drawn with the 2D context, farthest faces first
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    size: SurfaceSize,
}

impl CanvasSurface {
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn project_faces(&self, scene: &SceneState, camera: &Camera) -> Vec<ScreenFace> {
        let model = Matrix4::identity();
        let light_dir = (camera.position - camera.target).normalize();
        let base = scene.solid.color;

        let mut faces = Vec::with_capacity(scene.solid.mesh.triangles.len());
        'triangles: for triangle in &scene.solid.mesh.triangles {
            let normal = triangle.calculate_normal();
            if normal.dot(&(camera.position - triangle.vertices[0].position)) <= 0.0 {
                continue;
            }

            let mut points = [(0.0, 0.0); 3];
            let mut depth = 0.0;
            for (slot, vertex) in points.iter_mut().zip(&triangle.vertices) {
                let Some((x, y, z)) = camera.project_to_screen(
                    &vertex.position,
                    &model,
                    self.size.width,
                    self.size.height,
                ) else {
                    continue 'triangles;
                };
                *slot = (x, y);
                depth += z / 3.0;
            }

            let brightness = AMBIENT + (1.0 - AMBIENT) * normal.dot(&light_dir).max(0.0);
            faces.push(ScreenFace {
                points,
                depth,
                color: base.shade(brightness),
            });
        }

        faces.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        faces
    }

    fn fill_face(&self, face: &ScreenFace) {
        let [a, b, c] = face.points;
        let css = face.color.to_css();
        self.context.set_fill_style(&JsValue::from_str(&css));
        self.context.set_stroke_style(&JsValue::from_str(&css));
        self.context.begin_path();
        self.context.move_to(a.0 as f64, a.1 as f64);
        self.context.line_to(b.0 as f64, b.1 as f64);
        self.context.line_to(c.0 as f64, c.1 as f64);
        self.context.close_path();
        self.context.fill();
        // Hairline stroke hides the seams between adjacent faces
        self.context.stroke();
    }

    fn draw_label(&self, label: &Label, camera: &Camera) -> Result<(), SurfaceError> {
        let model = Matrix4::identity();
        let anchor = label.spec.anchor;
        let top = anchor + Vector3::y() * label.spec.size;
        let (Some((x, y, _)), Some((_, top_y, _))) = (
            camera.project_to_screen(&anchor, &model, self.size.width, self.size.height),
            camera.project_to_screen(&top, &model, self.size.width, self.size.height),
        ) else {
            return Ok(());
        };

        let pixels = (y - top_y).abs().max(1.0);
        self.context
            .set_font(&format!("{pixels:.0}px {}", label.typeface.family));
        self.context
            .set_fill_style(&JsValue::from_str(&label.spec.color.to_css()));
        self.context
            .fill_text(&label.spec.text, x as f64, y as f64)
            .map_err(|err| SurfaceError::Draw(js_error(err)))
    }
}

impl RenderSurface for CanvasSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn draw(&mut self, frame: &Frame<'_>) -> Result<(), SurfaceError> {
        let (width, height) = (self.size.width as f64, self.size.height as f64);
        self.context.set_fill_style(&JsValue::from_str(BACKGROUND));
        self.context.fill_rect(0.0, 0.0, width, height);

        for face in self.project_faces(frame.scene, frame.camera) {
            self.fill_face(&face);
        }

        match frame.scene.label() {
            Some(label) => self.draw_label(label, frame.camera),
            None => Ok(()),
        }
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
    }
}

/// A host element the viewer appends its canvas to
pub struct DomMount {
    document: Document,
    host: Element,
}

impl DomMount {
    pub fn new(document: Document, host: Element) -> Self {
        Self { document, host }
    }
}

impl MountPoint for DomMount {
    type Surface = CanvasSurface;

    fn acquire(&mut self, size: SurfaceSize) -> Result<CanvasSurface, ResourceAcquisitionError> {
        let canvas = self
            .document
            .create_element("canvas")
            .map_err(|err| ResourceAcquisitionError::NoSurface(js_error(err)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| ResourceAcquisitionError::NoSurface("not a canvas element".into()))?;
        canvas.set_width(size.width);
        canvas.set_height(size.height);

        let context = canvas
            .get_context("2d")
            .map_err(|err| ResourceAcquisitionError::NoSurface(js_error(err)))?
            .ok_or_else(|| ResourceAcquisitionError::NoSurface("2d context unavailable".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| ResourceAcquisitionError::NoSurface("unexpected context type".into()))?;

        Ok(CanvasSurface {
            canvas,
            context,
            size,
        })
    }

    fn attach(&mut self, surface: &mut CanvasSurface) -> Result<(), ResourceAcquisitionError> {
        self.host
            .append_child(&surface.canvas)
            .map(|_| ())
            .map_err(|err| ResourceAcquisitionError::Attach(js_error(err)))
    }

    fn detach(&mut self, surface: CanvasSurface) {
        surface.canvas.remove();
    }
}

/// Label font backed by the document's font set; ready once the family has loaded
pub struct DocumentFonts {
    document: Document,
    family: String,
    size_px: u32,
}

impl DocumentFonts {
    pub fn new(document: Document, family: impl Into<String>, size_px: u32) -> Self {
        Self {
            document,
            family: family.into(),
            size_px,
        }
    }
}

impl FontSource for DocumentFonts {
    fn poll_typeface(&mut self) -> FontStatus {
        let query = format!("{}px {}", self.size_px, self.family);
        match self.document.fonts().check(&query) {
            Ok(true) => FontStatus::Ready(Typeface::new(self.family.clone())),
            Ok(false) => FontStatus::Pending,
            Err(err) => FontStatus::Unavailable(LabelAttachmentError::FontUnavailable(format!(
                "{}: {}",
                self.family,
                js_error(err)
            ))),
        }
    }
}
