/// Drawable targets and the display they are attached to
use crate::config::SurfaceSize;
use crate::error::{ResourceAcquisitionError, SurfaceError};
use crate::projection::Camera;
use crate::scene::SceneState;

/// Everything one draw call needs
pub struct Frame<'a> {
    pub scene: &'a SceneState,
    pub camera: &'a Camera,
}

/// A target the scene is drawn into, e.g. a canvas or a terminal screen
pub trait RenderSurface {
    fn size(&self) -> SurfaceSize;

    fn draw(&mut self, frame: &Frame<'_>) -> Result<(), SurfaceError>;

    fn resize(&mut self, _size: SurfaceSize) {}
}

/// Where a host lets the viewer put its surface
///
/// A surface is acquired and attached once per mount. `detach` takes the surface by value, so
/// it is released exactly once.
pub trait MountPoint {
    type Surface: RenderSurface;

    fn acquire(&mut self, size: SurfaceSize) -> Result<Self::Surface, ResourceAcquisitionError>;

    fn attach(&mut self, surface: &mut Self::Surface) -> Result<(), ResourceAcquisitionError>;

    fn detach(&mut self, surface: Self::Surface);
}
