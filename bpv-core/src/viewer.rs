/// Blueprint viewer lifecycle: mount, rebuild, per-frame work and teardown
use crate::color::ColorSpec;
use crate::config::{SurfaceSize, ViewerConfig};
use crate::controls::OrbitControls;
use crate::error::{ViewError, ViewerError};
use crate::loader::{Credential, DataLoader, FetchOutcome, FetchRequest};
use crate::metadata::{BlueprintId, BlueprintMetadata};
use crate::projection::Camera;
use crate::render_loop::{FrameHandle, FrameQueue, FrameScheduler, RenderLoop};
use crate::scene::{FontSource, SceneBuilder, SceneState};
use crate::surface::{Frame, MountPoint, RenderSurface};
use crate::views::ViewName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unmounted,
    Mounting,
    Active,
    Rebuilding,
    Unmounting,
}

/// One interactive viewer instance
///
/// Owns the render surface, the scene, the camera and the render loop. All methods run on the
/// thread that owns the display; the only suspension points are the metadata fetch (driven by
/// the host through [`Viewer::take_fetch_request`] / [`Viewer::complete_fetch`]) and the wait for
/// the next frame (driven through [`Viewer::frame`]).
pub struct Viewer<M: MountPoint, S: FrameScheduler> {
    state: LifecycleState,
    mount_point: Option<M>,
    surface: Option<M::Surface>,
    scheduler: S,
    render_loop: RenderLoop,
    camera: Camera,
    controls: OrbitControls,
    builder: SceneBuilder,
    fonts: Box<dyn FontSource>,
    loader: DataLoader,
    surface_size: SurfaceSize,
    blueprint_id: Option<BlueprintId>,
    view: ViewName,
    color: ColorSpec,
    metadata: Option<BlueprintMetadata>,
    scene: Option<SceneState>,
    scene_generation: u64,
    pending_fetch: Option<FetchRequest>,
}

impl<M: MountPoint, S: FrameScheduler> Viewer<M, S> {
    pub fn new(config: &ViewerConfig, scheduler: S, fonts: impl FontSource + 'static) -> Self {
        Self {
            state: LifecycleState::Unmounted,
            mount_point: None,
            surface: None,
            scheduler,
            render_loop: RenderLoop::new(),
            camera: Camera::from_config(config),
            controls: OrbitControls::new(config),
            builder: SceneBuilder::new(config),
            fonts: Box::new(fonts),
            loader: DataLoader::new(config.api_base_url.clone(), None),
            surface_size: config.surface,
            blueprint_id: None,
            view: config.initial_view,
            color: ColorSpec::None,
            metadata: None,
            scene: None,
            scene_generation: 0,
            pending_fetch: None,
        }
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.loader.set_credential(Some(credential));
        self
    }

    pub fn with_blueprint(mut self, id: impl Into<BlueprintId>) -> Self {
        self.blueprint_id = Some(id.into());
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_mounted(&self) -> bool {
        matches!(
            self.state,
            LifecycleState::Active | LifecycleState::Rebuilding
        )
    }

    pub fn scene(&self) -> Option<&SceneState> {
        self.scene.as_ref()
    }

    /// Bumped every time the scene is rebuilt
    pub fn scene_generation(&self) -> u64 {
        self.scene_generation
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn metadata(&self) -> Option<&BlueprintMetadata> {
        self.metadata.as_ref()
    }

    pub fn blueprint_id(&self) -> Option<&BlueprintId> {
        self.blueprint_id.as_ref()
    }

    pub fn view(&self) -> ViewName {
        self.view
    }

    pub fn color(&self) -> &ColorSpec {
        &self.color
    }

    pub fn surface(&self) -> Option<&M::Surface> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut M::Surface> {
        self.surface.as_mut()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn is_loop_running(&self) -> bool {
        self.render_loop.is_running()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.render_loop.iterations()
    }

    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.loader.set_credential(credential);
    }

    /// Attach to the display: acquire and attach a surface, build the first scene, start the loop.
    ///
    /// Surface acquisition failure leaves the viewer unmounted and is returned as
    /// [`ViewerError::Initialization`]. If the scheduler refuses the first frame the viewer is
    /// still mounted, with [`Viewer::is_loop_running`] false.
    pub fn mount(&mut self, mut mount_point: M) -> Result<(), ViewerError> {
        if self.state != LifecycleState::Unmounted {
            return Err(ViewerError::InvalidState {
                expected: LifecycleState::Unmounted,
                actual: self.state,
            });
        }
        self.transition(LifecycleState::Mounting);

        let mut surface = match mount_point.acquire(self.surface_size) {
            Ok(surface) => surface,
            Err(err) => {
                self.transition(LifecycleState::Unmounted);
                return Err(err.into());
            }
        };
        if let Err(err) = mount_point.attach(&mut surface) {
            drop(surface);
            self.transition(LifecycleState::Unmounted);
            return Err(err.into());
        }

        let size = surface.size();
        self.camera.set_aspect(size.width, size.height);
        self.surface_size = size;
        self.surface = Some(surface);
        self.mount_point = Some(mount_point);

        self.controls.seat(&mut self.camera, self.view);
        self.metadata = None;
        if let Some(id) = &self.blueprint_id {
            self.pending_fetch = Some(self.loader.request(id));
        }
        self.replace_scene();

        self.render_loop.start(&mut self.scheduler);
        self.transition(LifecycleState::Active);
        tracing::info!(blueprint = ?self.blueprint_id.as_ref().map(BlueprintId::as_str), "viewer mounted");
        Ok(())
    }

    /// Tear down: cancel the loop first, then detach and release the surface.
    ///
    /// Returns the mount point so the host can revoke it. `None` if the viewer was not mounted.
    pub fn unmount(&mut self) -> Option<M> {
        if !self.is_mounted() {
            return None;
        }
        self.transition(LifecycleState::Unmounting);

        self.render_loop.cancel(&mut self.scheduler);
        self.loader.invalidate();
        self.pending_fetch = None;

        let mut mount_point = self.mount_point.take();
        if let (Some(mount), Some(surface)) = (mount_point.as_mut(), self.surface.take()) {
            mount.detach(surface);
        }

        self.scene = None;
        self.metadata = None;
        self.transition(LifecycleState::Unmounted);
        tracing::info!("viewer unmounted");
        mount_point
    }

    /// Switch to another blueprint. Issues exactly one new fetch when mounted.
    pub fn set_blueprint(&mut self, id: impl Into<BlueprintId>) {
        let id = id.into();
        if self.blueprint_id.as_ref() == Some(&id) {
            return;
        }
        self.blueprint_id = Some(id);
        self.metadata = None;
        self.color = ColorSpec::None;

        if self.is_mounted() {
            if let Some(id) = &self.blueprint_id {
                self.pending_fetch = Some(self.loader.request(id));
            }
            self.rebuild();
        }
    }

    /// Re-seat the camera at `view`. The scene and the running rotation are kept.
    pub fn set_view(&mut self, view: ViewName) {
        self.view = view;
        if self.is_mounted() {
            self.transition(LifecycleState::Rebuilding);
            self.controls.seat(&mut self.camera, view);
            self.transition(LifecycleState::Active);
        }
    }

    /// Like [`Viewer::set_view`] for a picker value; unknown names are rejected
    pub fn select_view(&mut self, name: &str) -> Result<(), ViewError> {
        let view = name.parse()?;
        self.set_view(view);
        Ok(())
    }

    pub fn set_color(&mut self, color: impl Into<ColorSpec>) {
        self.color = color.into();
        if self.is_mounted() {
            self.rebuild();
        }
    }

    /// Nudge the orbit by `azimuth` / `polar` radians; damping spreads it over the next frames
    pub fn orbit(&mut self, azimuth: f32, polar: f32) {
        self.controls.rotate_left(azimuth);
        self.controls.rotate_up(polar);
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.controls.auto_rotate = enabled;
    }

    /// The fetch issued by the last mount or blueprint change, for the host to execute
    pub fn take_fetch_request(&mut self) -> Option<FetchRequest> {
        self.pending_fetch.take()
    }

    /// Apply a finished fetch. Returns false if it was stale and got discarded.
    ///
    /// A failed fetch is logged and the default scene stays in place.
    pub fn complete_fetch(&mut self, outcome: FetchOutcome) -> bool {
        if !self.is_mounted() || !self.loader.accept(&outcome.ticket) {
            tracing::debug!(
                blueprint = %outcome.ticket.id,
                generation = outcome.ticket.generation,
                "discarding stale metadata fetch"
            );
            return false;
        }

        match outcome.result {
            Ok(metadata) => {
                tracing::debug!(blueprint = %outcome.ticket.id, ?metadata, "metadata loaded");
                self.color = metadata.color.clone();
                self.metadata = Some(metadata);
                self.rebuild();
            }
            Err(err) => {
                tracing::warn!(blueprint = %outcome.ticket.id, %err, "failed to load blueprint, keeping default scene");
                self.metadata = None;
            }
        }
        true
    }

    /// Run one loop iteration for a fired frame callback: advance the camera, then draw.
    ///
    /// Returns false for callbacks that do not belong to the running loop.
    pub fn frame(&mut self, handle: FrameHandle) -> bool {
        if !self.is_mounted() || !self.render_loop.begin(handle) {
            return false;
        }

        if let Some(scene) = self.scene.as_mut() {
            if scene.attach_label(self.fonts.as_mut()) {
                tracing::debug!("dimension label attached");
            }
        }

        self.controls.update(&mut self.camera);

        if let (Some(surface), Some(scene)) = (self.surface.as_mut(), self.scene.as_ref()) {
            let frame = Frame {
                scene,
                camera: &self.camera,
            };
            if let Err(err) = surface.draw(&frame) {
                tracing::warn!(%err, "frame draw failed");
            }
        }

        self.render_loop.end(&mut self.scheduler);
        true
    }

    pub fn resize(&mut self, size: SurfaceSize) {
        self.surface_size = size;
        self.camera.set_aspect(size.width, size.height);
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(size);
        }
    }

    fn rebuild(&mut self) {
        self.transition(LifecycleState::Rebuilding);
        self.replace_scene();
        self.controls.seat(&mut self.camera, self.view);
        self.transition(LifecycleState::Active);
    }

    /// Build a complete new scene and swap it in; the old one is dropped whole
    fn replace_scene(&mut self) {
        let dimensions = self.metadata.as_ref().and_then(|m| m.dimensions.as_ref());
        let scene = self.builder.build(dimensions, &self.color);
        self.scene = Some(scene);
        self.scene_generation += 1;
    }

    fn transition(&mut self, next: LifecycleState) {
        tracing::debug!(from = ?self.state, to = ?next, "viewer lifecycle");
        self.state = next;
    }
}

impl<M: MountPoint> Viewer<M, FrameQueue> {
    /// Deliver one display refresh: run every frame callback that is due
    pub fn pump(&mut self) -> usize {
        self.scheduler
            .take_due()
            .into_iter()
            .filter(|handle| self.frame(*handle))
            .count()
    }
}

impl<M: MountPoint, S: FrameScheduler> Drop for Viewer<M, S> {
    fn drop(&mut self) {
        self.unmount();
    }
}
