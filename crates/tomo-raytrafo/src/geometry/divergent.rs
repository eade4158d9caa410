//! Divergent-beam geometries with a point source on a circle

use super::{rotation_from_z, unit_vector, AcquisitionGeometry, Ray};
use crate::error::{RayTrafoError, Result};
use crate::space::RectPartition;
use nalgebra::{Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

fn check_radius(name: &str, r: f64) -> Result<()> {
    if !(r.is_finite() && r > 0.0) {
        return Err(RayTrafoError::invalid_geometry(format!(
            "`{name}` must be positive and finite, got {r}"
        )));
    }
    Ok(())
}

fn check_partitions(apart: &RectPartition, dpart: &RectPartition, det_ndim: usize) -> Result<()> {
    if apart.ndim() != 1 {
        return Err(RayTrafoError::invalid_geometry(format!(
            "`apart` must be 1-dimensional, got ndim {}",
            apart.ndim()
        )));
    }
    if dpart.ndim() != det_ndim {
        return Err(RayTrafoError::invalid_geometry(format!(
            "`dpart` must be {det_ndim}-dimensional, got ndim {}",
            dpart.ndim()
        )));
    }
    Ok(())
}

/// 2-D fan beam geometry with a flat detector
///
/// At angle `θ` the source sits at `-src_radius·d(θ)` and the detector line
/// passes through `det_radius·d(θ)` along `a(θ)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanBeamGeometry {
    apart: RectPartition,
    dpart: RectPartition,
    src_radius: f64,
    det_radius: f64,
}

impl FanBeamGeometry {
    pub fn new(apart: RectPartition, dpart: RectPartition, src_radius: f64, det_radius: f64) -> Result<Self> {
        check_partitions(&apart, &dpart, 1)?;
        check_radius("src_radius", src_radius)?;
        check_radius("det_radius", det_radius)?;
        Ok(Self {
            apart,
            dpart,
            src_radius,
            det_radius,
        })
    }

    /// Full circle of `num_angles` source positions.
    pub fn uniform(
        num_angles: usize,
        det_min: f64,
        det_max: f64,
        det_shape: usize,
        src_radius: f64,
        det_radius: f64,
    ) -> Result<Self> {
        Self::new(
            RectPartition::uniform([0.0], [2.0 * PI], [num_angles])?,
            RectPartition::uniform([det_min], [det_max], [det_shape])?,
            src_radius,
            det_radius,
        )
    }

    pub fn src_radius(&self) -> f64 {
        self.src_radius
    }

    pub fn det_radius(&self) -> f64 {
        self.det_radius
    }
}

impl AcquisitionGeometry for FanBeamGeometry {
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
        let d = [-sin, cos];
        let a = [cos, sin];
        let u = det_param[0];
        let src = [-self.src_radius * d[0], -self.src_radius * d[1]];
        let det = [
            self.det_radius * d[0] + u * a[0],
            self.det_radius * d[1] + u * a[1],
        ];
        let (dx, dy) = (det[0] - src[0], det[1] - src[1]);
        let len = dx.hypot(dy);
        Ray::planar(src, [dx / len, dy / len])
    }
}

/// 3-D circular cone beam geometry with a flat detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConeBeamGeometry {
    apart: RectPartition,
    dpart: RectPartition,
    src_radius: f64,
    det_radius: f64,
    axis: Unit<Vector3<f64>>,
    src_to_det_init: Vector3<f64>,
    det_axes_init: [Vector3<f64>; 2],
}

impl ConeBeamGeometry {
    /// Source circle around `axis`, default frame rotated along with the axis.
    pub fn new(
        apart: RectPartition,
        dpart: RectPartition,
        src_radius: f64,
        det_radius: f64,
        axis: impl Into<Vector3<f64>>,
    ) -> Result<Self> {
        check_partitions(&apart, &dpart, 2)?;
        check_radius("src_radius", src_radius)?;
        check_radius("det_radius", det_radius)?;
        let axis = unit_vector("axis", axis.into())?;
        let to_axis = rotation_from_z(&axis);
        Ok(Self {
            apart,
            dpart,
            src_radius,
            det_radius,
            axis,
            src_to_det_init: to_axis * Vector3::y(),
            det_axes_init: [to_axis * Vector3::x(), to_axis * Vector3::z()],
        })
    }

    pub fn axis(&self) -> Vector3<f64> {
        self.axis.into_inner()
    }

    pub fn src_radius(&self) -> f64 {
        self.src_radius
    }

    pub fn det_radius(&self) -> f64 {
        self.det_radius
    }

    fn rotation(&self, angle: f64) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&self.axis, angle)
    }

    pub fn src_position(&self, angle: f64) -> Vector3<f64> {
        self.rotation(angle) * self.src_to_det_init * -self.src_radius
    }
}

impl AcquisitionGeometry for ConeBeamGeometry {
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
        let local = self.src_to_det_init * self.det_radius
            + self.det_axes_init[0] * det_param[0]
            + self.det_axes_init[1] * det_param[1];
        let src = self.src_position(angle);
        let det = self.rotation(angle) * local;
        Ray {
            origin: src.into(),
            direction: (det - src).normalize().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fan_central_ray_passes_origin() {
        let geom = FanBeamGeometry::uniform(8, -2.0, 2.0, 5, 10.0, 5.0).unwrap();
        let ray = geom.ray(&[0.3], &[0.0]);
        let t = -(ray.origin[0] * ray.direction[0] + ray.origin[1] * ray.direction[1]);
        let closest = ray.at(t);
        assert_relative_eq!(closest[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(closest[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fan_rejects_bad_radius() {
        assert!(FanBeamGeometry::uniform(8, -2.0, 2.0, 5, 0.0, 5.0).is_err());
        assert!(FanBeamGeometry::uniform(8, -2.0, 2.0, 5, 10.0, f64::NAN).is_err());
    }

    #[test]
    fn test_cone_source_on_circle() {
        let apart = RectPartition::uniform([0.0], [2.0 * PI], [6]).unwrap();
        let dpart = RectPartition::uniform([-1.0, -1.0], [1.0, 1.0], [3, 3]).unwrap();
        let geom = ConeBeamGeometry::new(apart, dpart, 4.0, 2.0, Vector3::z()).unwrap();
        let src = geom.src_position(1.0);
        assert_relative_eq!(src.norm(), 4.0, epsilon = 1e-12);
        assert_relative_eq!(src[2], 0.0, epsilon = 1e-12);
        assert_eq!(geom.rays().len(), 6 * 9);
    }
}
