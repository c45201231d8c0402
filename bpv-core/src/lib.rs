/// Blueprint viewer core - host-agnostic scene, camera and lifecycle logic
///
/// This library owns everything about showing a converted blueprint in 3D that does not depend
/// on a particular display: the viewpoint table, color resolution, metadata loading, scene
/// construction, the orbit camera, render loop bookkeeping and the viewer lifecycle. Hosts
/// (terminal, browser) plug in a [`MountPoint`], a [`FrameScheduler`] and a fetch transport.

pub mod color;
pub mod config;
pub mod controls;
pub mod error;
pub mod export;
pub mod geometry;
pub mod loader;
pub mod metadata;
pub mod projection;
pub mod render_loop;
pub mod scene;
pub mod surface;
pub mod transform;
pub mod viewer;
pub mod views;

// Re-export commonly used types
pub use color::{ColorSpec, Rgb};
pub use config::{SurfaceSize, ViewerConfig};
pub use controls::{OrbitControls, RotationState};
pub use error::{
    ColorParseError, ConfigError, FetchError, LabelAttachmentError, ResourceAcquisitionError,
    SchedulerError, SurfaceError, ViewError, ViewerError,
};
pub use export::ExportFormat;
pub use geometry::{Mesh, Triangle, Vertex};
pub use loader::{BlueprintClient, Credential, DataLoader, FetchOutcome, FetchRequest, FetchTicket};
pub use metadata::{BlueprintId, BlueprintMetadata, BlueprintRecord, Dimensions};
pub use projection::Camera;
pub use render_loop::{FrameHandle, FrameQueue, FrameScheduler, RenderLoop};
pub use scene::{FontSource, FontStatus, Label, LabelSpec, SceneBuilder, SceneState, StaticFont, Typeface};
pub use surface::{Frame, MountPoint, RenderSurface};
pub use transform::{Spherical, Transform};
pub use viewer::{LifecycleState, Viewer};
pub use views::ViewName;
