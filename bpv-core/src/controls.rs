/// Orbit camera controller: viewpoint seating, damping and auto-rotation
use std::f32::consts::PI;

use nalgebra::Point3;

use crate::config::ViewerConfig;
use crate::projection::Camera;
use crate::transform::Spherical;
use crate::views::ViewName;

/// Motion below this is treated as settled
const SETTLE_EPSILON: f32 = 1e-6;

/// Accumulated orbital motion since mount
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationState {
    /// Total azimuth applied, in radians
    pub angle: f32,
    pub frames: u64,
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    target: Point3<f32>,
    base_position: Point3<f32>,
    view: ViewName,
    pending: Spherical,
    rotation: RotationState,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
}

impl OrbitControls {
    pub fn new(config: &ViewerConfig) -> Self {
        let view = config.initial_view;
        Self {
            target: Point3::origin(),
            base_position: view.base_position(),
            view,
            pending: Spherical::zero(),
            rotation: RotationState::default(),
            enable_damping: config.damping_factor > 0.0,
            damping_factor: config.damping_factor.clamp(0.0, 1.0),
            auto_rotate: config.auto_rotate,
            auto_rotate_speed: config.auto_rotate_speed,
        }
    }

    pub fn view(&self) -> ViewName {
        self.view
    }

    pub fn base_position(&self) -> Point3<f32> {
        self.base_position
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn rotation(&self) -> RotationState {
        self.rotation
    }

    /// Put the camera at the base position of `view`, looking at the target.
    ///
    /// Pending orbital motion and the accumulated rotation carry over.
    pub fn seat(&mut self, camera: &mut Camera, view: ViewName) {
        self.view = view;
        self.base_position = view.base_position();
        camera.position = self.base_position;
        camera.look_at(self.target);
    }

    /// Azimuth added per frame while auto-rotating
    pub fn auto_rotation_angle(&self) -> f32 {
        2.0 * PI / 60.0 / 60.0 * self.auto_rotate_speed
    }

    /// Rotate around the vertical axis by `angle` radians, applied over the next frames
    pub fn rotate_left(&mut self, angle: f32) {
        self.pending.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.pending.phi -= angle;
    }

    /// Advance one frame. Returns true when the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_offset(&offset);

        if self.auto_rotate {
            self.rotate_left(self.auto_rotation_angle());
        }

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        let d_theta = self.pending.theta * step;
        let d_phi = self.pending.phi * step;

        spherical.theta += d_theta;
        spherical.phi += d_phi;
        spherical.make_safe();

        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            self.pending.theta *= 1.0 - self.damping_factor;
            self.pending.phi *= 1.0 - self.damping_factor;
        } else {
            self.pending = Spherical::zero();
        }

        self.rotation.angle += d_theta;
        self.rotation.frames += 1;

        (camera.position - (self.target + offset)).norm_squared() > SETTLE_EPSILON
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(&ViewerConfig::default())
    }
}
