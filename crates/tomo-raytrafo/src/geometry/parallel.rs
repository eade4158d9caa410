//! Parallel-beam geometries

use super::{rotation_from_z, unit_vector, AcquisitionGeometry, Ray};
use crate::error::{RayTrafoError, Result};
use crate::space::RectPartition;
use nalgebra::{Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

fn check_ndim(name: &str, part: &RectPartition, expected: usize) -> Result<()> {
    if part.ndim() != expected {
        return Err(RayTrafoError::invalid_geometry(format!(
            "`{name}` must be {expected}-dimensional, got ndim {}",
            part.ndim()
        )));
    }
    Ok(())
}

/// 2-D parallel beam geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parallel2dGeometry {
    apart: RectPartition,
    dpart: RectPartition,
}

impl Parallel2dGeometry {
    /// Geometry from a 1-D angle partition and a 1-D detector partition.
    pub fn new(apart: RectPartition, dpart: RectPartition) -> Result<Self> {
        check_ndim("apart", &apart, 1)?;
        check_ndim("dpart", &dpart, 1)?;
        Ok(Self { apart, dpart })
    }

    /// `num_angles` angles in `[0, π)` and `det_shape` pixels on `[det_min, det_max]`.
    pub fn uniform(num_angles: usize, det_min: f64, det_max: f64, det_shape: usize) -> Result<Self> {
        Self::new(
            RectPartition::uniform([0.0], [PI], [num_angles])?,
            RectPartition::uniform([det_min], [det_max], [det_shape])?,
        )
    }
}

impl AcquisitionGeometry for Parallel2dGeometry {
    fn ndim(&self) -> usize {
        2
    }

    fn motion_partition(&self) -> &RectPartition {
        &self.apart
    }

    fn det_partition(&self) -> &RectPartition {
        &self.dpart
    }

    fn ray(&self, motion_param: &[f64], det_param: &[f64]) -> Ray {
        let (sin, cos) = motion_param[0].sin_cos();
        let s = det_param[0];
        Ray::planar([s * cos, s * sin], [-sin, cos])
    }
}

/// 3-D parallel beam geometry rotating around a single axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parallel3dAxisGeometry {
    apart: RectPartition,
    dpart: RectPartition,
    axis: Unit<Vector3<f64>>,
    det_pos_init: Unit<Vector3<f64>>,
    det_axes_init: [Unit<Vector3<f64>>; 2],
}

impl Parallel3dAxisGeometry {
    /// Geometry rotating around `axis`, with the default detector frame
    /// rotated along with the axis.
    pub fn new(apart: RectPartition, dpart: RectPartition, axis: impl Into<Vector3<f64>>) -> Result<Self> {
        let axis = unit_vector("axis", axis.into())?;
        let to_axis = rotation_from_z(&axis);
        Self::with_frame(
            apart,
            dpart,
            axis.into_inner(),
            to_axis * Vector3::y(),
            [to_axis * Vector3::x(), to_axis * Vector3::z()],
        )
    }

    /// Geometry with an explicit initial detector frame.
    pub fn with_frame(
        apart: RectPartition,
        dpart: RectPartition,
        axis: impl Into<Vector3<f64>>,
        det_pos_init: impl Into<Vector3<f64>>,
        det_axes_init: [Vector3<f64>; 2],
    ) -> Result<Self> {
        check_ndim("apart", &apart, 1)?;
        check_ndim("dpart", &dpart, 2)?;
        Ok(Self {
            apart,
            dpart,
            axis: unit_vector("axis", axis.into())?,
            det_pos_init: unit_vector("det_pos_init", det_pos_init.into())?,
            det_axes_init: [
                unit_vector("det_axes_init[0]", det_axes_init[0])?,
                unit_vector("det_axes_init[1]", det_axes_init[1])?,
            ],
        })
    }

    /// Angles in `[0, π)` around `e_z`, detector `[u_min, u_max] × [v_min, v_max]`.
    pub fn uniform(num_angles: usize, det_min: [f64; 2], det_max: [f64; 2], det_shape: [usize; 2]) -> Result<Self> {
        Self::new(
            RectPartition::uniform([0.0], [PI], [num_angles])?,
            RectPartition::uniform(det_min, det_max, det_shape)?,
            Vector3::z(),
        )
    }

    pub fn axis(&self) -> Vector3<f64> {
        self.axis.into_inner()
    }

    pub fn det_pos_init(&self) -> Vector3<f64> {
        self.det_pos_init.into_inner()
    }

    pub fn det_axes_init(&self) -> [Vector3<f64>; 2] {
        self.det_axes_init.map(Unit::into_inner)
    }

    /// Centre of the detector parameter domain.
    pub fn det_mid_pt(&self) -> Vec<f64> {
        self.dpart.domain().mid_pt()
    }

    fn rotation(&self, angle: f64) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&self.axis, angle)
    }

    /// Unit vector from the detector towards the source at `angle`.
    ///
    /// The same for every detector point of a parallel geometry.
    pub fn det_to_src(&self, angle: f64, _det_param: &[f64]) -> Vector3<f64> {
        -(self.rotation(angle) * self.det_pos_init.into_inner())
    }

    fn det_point(&self, angle: f64, det_param: &[f64]) -> Vector3<f64> {
        let [u, v] = self.det_axes_init;
        self.rotation(angle) * (u.into_inner() * det_param[0] + v.into_inner() * det_param[1])
    }
}

impl AcquisitionGeometry for Parallel3dAxisGeometry {
    fn ndim(&self) -> usize {
        3
    }

    fn motion_partition(&self) -> &RectPartition {
        &self.apart
    }

    fn det_partition(&self) -> &RectPartition {
        &self.dpart
    }

    fn ray(&self, motion_param: &[f64], det_param: &[f64]) -> Ray {
        let angle = motion_param[0];
        Ray {
            origin: self.det_point(angle, det_param).into(),
            direction: self.det_to_src(angle, det_param).into(),
        }
    }
}

/// 3-D parallel beam geometry parametrized by two Euler angles
///
/// The detector frame at `(φ, θ)` is the reference frame rotated by
/// `Rz(φ)·Rx(θ)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parallel3dEulerGeometry {
    apart: RectPartition,
    dpart: RectPartition,
}

impl Parallel3dEulerGeometry {
    pub fn new(apart: RectPartition, dpart: RectPartition) -> Result<Self> {
        check_ndim("apart", &apart, 2)?;
        check_ndim("dpart", &dpart, 2)?;
        Ok(Self { apart, dpart })
    }

    fn frame(&self, motion_param: &[f64]) -> Rotation3<f64> {
        Rotation3::from_euler_angles(motion_param[1], 0.0, motion_param[0])
    }
}

impl AcquisitionGeometry for Parallel3dEulerGeometry {
    fn ndim(&self) -> usize {
        3
    }

    fn motion_partition(&self) -> &RectPartition {
        &self.apart
    }

    fn det_partition(&self) -> &RectPartition {
        &self.dpart
    }

    fn ray(&self, motion_param: &[f64], det_param: &[f64]) -> Ray {
        let rot = self.frame(motion_param);
        Ray {
            origin: (rot * Vector3::new(det_param[0], 0.0, det_param[1])).into(),
            direction: (-(rot * Vector3::y())).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parallel_2d_ray_convention() {
        let geom = Parallel2dGeometry::uniform(2, -1.0, 1.0, 2).unwrap();
        let ray = geom.ray(&[0.0], &[0.5]);
        assert_eq!(ray.origin, [0.5, 0.0, 0.0]);
        assert_eq!(ray.direction, [-0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_parallel_2d_rejects_wrong_partition_ndim() {
        let apart = RectPartition::uniform([0.0, 0.0], [1.0, 1.0], [2, 2]).unwrap();
        let dpart = RectPartition::uniform([-1.0], [1.0], [4]).unwrap();
        assert!(Parallel2dGeometry::new(apart, dpart).is_err());
    }

    #[test]
    fn test_axis_default_frame() {
        let geom = Parallel3dAxisGeometry::uniform(4, [-1.0, -1.0], [1.0, 1.0], [4, 4]).unwrap();
        assert_eq!(geom.axis(), Vector3::z());
        let d = geom.det_to_src(0.0, &geom.det_mid_pt());
        assert_relative_eq!(d, -Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(d.dot(&geom.axis()), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tilted_axis_frame_is_rotated() {
        let apart = RectPartition::uniform([0.0], [PI], [4]).unwrap();
        let dpart = RectPartition::uniform([-1.0, -1.0], [1.0, 1.0], [2, 2]).unwrap();
        let geom = Parallel3dAxisGeometry::new(apart, dpart, [1.0, 0.0, 0.0]).unwrap();
        let axis = geom.axis();
        assert_relative_eq!(geom.det_axes_init()[1].dot(&axis), 1.0, epsilon = 1e-12);
        assert_relative_eq!(geom.det_pos_init().dot(&axis), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_axis_rejects_zero_vector() {
        let apart = RectPartition::uniform([0.0], [PI], [4]).unwrap();
        let dpart = RectPartition::uniform([-1.0, -1.0], [1.0, 1.0], [2, 2]).unwrap();
        assert!(Parallel3dAxisGeometry::new(apart, dpart, [0.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn test_euler_rays_are_unit() {
        let apart = RectPartition::uniform([0.0, 0.0], [PI, PI / 2.0], [3, 2]).unwrap();
        let dpart = RectPartition::uniform([-1.0, -1.0], [1.0, 1.0], [2, 2]).unwrap();
        let geom = Parallel3dEulerGeometry::new(apart, dpart).unwrap();
        assert_eq!(geom.partition().shape(), &[3, 2, 2, 2]);
        for ray in geom.rays() {
            assert_relative_eq!(Vector3::from(ray.direction).norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_euler_frame_turns_about_z_then_x() {
        let apart = RectPartition::uniform([0.0, 0.0], [PI, PI / 2.0], [3, 2]).unwrap();
        let dpart = RectPartition::uniform([-1.0, -1.0], [1.0, 1.0], [2, 2]).unwrap();
        let geom = Parallel3dEulerGeometry::new(apart, dpart).unwrap();

        let ray = geom.ray(&[PI / 2.0, 0.0], &[0.0, 0.0]);
        assert_relative_eq!(Vector3::from(ray.direction), Vector3::x(), epsilon = 1e-12);

        // Rx(π/2) tips the detector's v axis from e_z onto -e_y
        let ray = geom.ray(&[0.0, PI / 2.0], &[0.0, 1.0]);
        assert_relative_eq!(Vector3::from(ray.origin), -Vector3::y(), epsilon = 1e-12);
    }
}
