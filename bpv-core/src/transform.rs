/// Spherical coordinates and transformation matrices
use nalgebra::{Matrix4, Vector3};

/// Smallest polar angle kept away from the poles so `look_at` stays defined
const POLE_EPSILON: f32 = 1e-3;

/// Spherical coordinates around the +Y axis
///
/// `theta` is the azimuth measured from +Z towards +X, `phi` the polar angle from +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl Spherical {
    pub fn new(radius: f32, theta: f32, phi: f32) -> Self {
        Self { radius, theta, phi }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn from_offset(offset: &Vector3<f32>) -> Self {
        let radius = offset.norm();
        if radius == 0.0 {
            return Self::zero();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(&self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keep `phi` strictly inside (0, pi)
    pub fn make_safe(&mut self) {
        self.phi = self
            .phi
            .clamp(POLE_EPSILON, std::f32::consts::PI - POLE_EPSILON);
    }
}

impl Default for Spherical {
    fn default() -> Self {
        Self::zero()
    }
}

/// Matrix composition helpers
pub struct Transform;

impl Transform {
    pub fn mvp_matrix(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_front_offset() {
        let s = Spherical::from_offset(&Vector3::new(0.0, 0.0, 20.0));
        assert_relative_eq!(s.radius, 20.0);
        assert_relative_eq!(s.theta, 0.0);
        assert_relative_eq!(s.phi, std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn test_offset_round_trip() {
        let offset = Vector3::new(-20.0, 5.0, 3.0);
        let back = Spherical::from_offset(&offset).to_offset();
        assert_relative_eq!(back, offset, epsilon = 1e-4);
    }

    #[test]
    fn test_make_safe_moves_off_pole() {
        let mut s = Spherical::from_offset(&Vector3::new(0.0, 20.0, 0.0));
        assert_eq!(s.phi, 0.0);
        s.make_safe();
        assert!(s.phi > 0.0);
        assert_relative_eq!(s.to_offset(), Vector3::new(0.0, 20.0, 0.0), epsilon = 0.05);
    }

    #[test]
    fn test_zero_offset() {
        assert_eq!(Spherical::from_offset(&Vector3::zeros()), Spherical::zero());
    }

    #[test]
    fn test_mvp_applies_model_first() {
        let id = Matrix4::identity();
        assert_relative_eq!(Transform::mvp_matrix(&id, &id, &id), id);
        let model = Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0));
        let mvp = Transform::mvp_matrix(&model, &id, &id);
        assert_relative_eq!(
            mvp.transform_point(&nalgebra::Point3::origin()).coords,
            Vector3::new(1.0, 2.0, 3.0)
        );
    }
}
