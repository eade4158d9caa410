//! Tomographic acquisition geometries
//!
//! A geometry describes how projection data is sampled: a *motion*
//! partition (rotation angles) times a *detector* partition. Its
//! [`partition`](AcquisitionGeometry::partition) is the sampling grid of the
//! projection space, and every sample of that grid corresponds to one
//! [`Ray`] through the reconstruction volume.
//!
//! # Conventions
//!
//! ```text
//! 2-D, angle θ:  detector axis  a(θ) = ( cos θ, sin θ)
//!                ray direction  d(θ) = (-sin θ, cos θ)
//! parallel ray for detector parameter s:  { s·a(θ) + t·d(θ) : t ∈ ℝ }
//! ```
//!
//! 3-D geometries rotate a reference detector frame around the rotation
//! axis (or by Euler angles). Default frames put the rotation axis along
//! `e_z`, the detector reference point along `e_y` and the detector axes
//! along `(e_x, e_z)`.

mod divergent;
mod parallel;

pub use divergent::{ConeBeamGeometry, FanBeamGeometry};
pub use parallel::{Parallel2dGeometry, Parallel3dAxisGeometry, Parallel3dEulerGeometry};

use crate::error::{RayTrafoError, Result};
use crate::space::{IntervalProd, RectPartition};
use nalgebra::{Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A line through the reconstruction volume
///
/// Only the first `ndim` components are meaningful; the rest are zero.
/// `direction` has unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: [f64; 3],
    pub direction: [f64; 3],
}

impl Ray {
    pub(crate) fn planar(origin: [f64; 2], direction: [f64; 2]) -> Self {
        Self {
            origin: [origin[0], origin[1], 0.0],
            direction: [direction[0], direction[1], 0.0],
        }
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f64) -> [f64; 3] {
        [
            self.origin[0] + t * self.direction[0],
            self.origin[1] + t * self.direction[1],
            self.origin[2] + t * self.direction[2],
        ]
    }
}

/// Common interface of acquisition geometries
pub trait AcquisitionGeometry {
    /// Dimension of the reconstruction volume.
    fn ndim(&self) -> usize;

    /// Partition of the motion parameters (angles).
    fn motion_partition(&self) -> &RectPartition;

    /// Partition of the detector parameters.
    fn det_partition(&self) -> &RectPartition;

    /// Ray hitting the detector at `det_param` for motion parameters `motion_param`.
    fn ray(&self, motion_param: &[f64], det_param: &[f64]) -> Ray;

    /// Sampling grid of the projection data: `motion × detector`.
    fn partition(&self) -> RectPartition {
        self.motion_partition().append(self.det_partition())
    }

    /// Domain of the projection data parameters.
    fn params(&self) -> IntervalProd {
        self.motion_partition().domain().append(self.det_partition().domain())
    }

    /// Domain of the detector parameters.
    fn det_params(&self) -> &IntervalProd {
        self.det_partition().domain()
    }

    /// Motion midpoints, for geometries with a single rotation angle.
    fn angles(&self) -> Option<Vec<f64>> {
        let motion = self.motion_partition();
        (motion.ndim() == 1).then(|| motion.points(0))
    }

    /// One ray per projection sample, row-major over `partition().shape()`.
    fn rays(&self) -> Vec<Ray> {
        let motion = grid_points(self.motion_partition());
        let det = grid_points(self.det_partition());
        motion
            .iter()
            .flat_map(|m| det.iter().map(move |d| self.ray(m, d)))
            .collect()
    }
}

/// Closed set of supported acquisition geometries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Geometry {
    #[serde(rename = "parallel_2d")]
    Parallel2d(Parallel2dGeometry),
    #[serde(rename = "fan_beam")]
    FanBeam(FanBeamGeometry),
    #[serde(rename = "parallel_3d_axis")]
    Parallel3dAxis(Parallel3dAxisGeometry),
    #[serde(rename = "cone_beam")]
    ConeBeam(ConeBeamGeometry),
    #[serde(rename = "parallel_3d_euler")]
    Parallel3dEuler(Parallel3dEulerGeometry),
}

impl Geometry {
    fn inner(&self) -> &dyn AcquisitionGeometry {
        match self {
            Geometry::Parallel2d(g) => g,
            Geometry::FanBeam(g) => g,
            Geometry::Parallel3dAxis(g) => g,
            Geometry::ConeBeam(g) => g,
            Geometry::Parallel3dEuler(g) => g,
        }
    }

    /// Short name of the geometry kind, as used in serialized form.
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Parallel2d(_) => "parallel_2d",
            Geometry::FanBeam(_) => "fan_beam",
            Geometry::Parallel3dAxis(_) => "parallel_3d_axis",
            Geometry::ConeBeam(_) => "cone_beam",
            Geometry::Parallel3dEuler(_) => "parallel_3d_euler",
        }
    }

    pub fn as_parallel_2d(&self) -> Option<&Parallel2dGeometry> {
        match self {
            Geometry::Parallel2d(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_parallel_3d_axis(&self) -> Option<&Parallel3dAxisGeometry> {
        match self {
            Geometry::Parallel3dAxis(g) => Some(g),
            _ => None,
        }
    }
}

impl AcquisitionGeometry for Geometry {
    fn ndim(&self) -> usize {
        self.inner().ndim()
    }

    fn motion_partition(&self) -> &RectPartition {
        self.inner().motion_partition()
    }

    fn det_partition(&self) -> &RectPartition {
        self.inner().det_partition()
    }

    fn ray(&self, motion_param: &[f64], det_param: &[f64]) -> Ray {
        self.inner().ray(motion_param, det_param)
    }
}

macro_rules! impl_from_geometry {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Geometry {
                fn from(g: $ty) -> Self {
                    Geometry::$variant(g)
                }
            }

            impl From<$ty> for std::sync::Arc<Geometry> {
                fn from(g: $ty) -> Self {
                    std::sync::Arc::new(Geometry::$variant(g))
                }
            }
        )*
    };
}

impl_from_geometry! {
    Parallel2d => Parallel2dGeometry,
    FanBeam => FanBeamGeometry,
    Parallel3dAxis => Parallel3dAxisGeometry,
    ConeBeam => ConeBeamGeometry,
    Parallel3dEuler => Parallel3dEulerGeometry,
}

/// Unit vector along `v`; zero and non-finite vectors are rejected.
pub(crate) fn unit_vector(name: &str, v: Vector3<f64>) -> Result<Unit<Vector3<f64>>> {
    v.iter()
        .all(|c| c.is_finite())
        .then(|| Unit::try_new(v, 1e-12))
        .flatten()
        .ok_or_else(|| RayTrafoError::invalid_geometry(format!("`{name}` must be a nonzero vector, got {v:?}")))
}

/// Rotation carrying `e_z` onto `axis` along the shortest arc.
pub(crate) fn rotation_from_z(axis: &Unit<Vector3<f64>>) -> Rotation3<f64> {
    // antiparallel: half turn around e_x
    Rotation3::rotation_between(&Vector3::z(), &axis.into_inner())
        .unwrap_or_else(|| Rotation3::from_axis_angle(&Vector3::x_axis(), PI))
}

/// Midpoints of all cells of `part`, row-major.
fn grid_points(part: &RectPartition) -> Vec<Vec<f64>> {
    let axes: Vec<Vec<f64>> = (0..part.ndim()).map(|axis| part.points(axis)).collect();
    let mut out = vec![Vec::with_capacity(part.ndim())];
    for pts in &axes {
        out = out
            .into_iter()
            .flat_map(|prefix| {
                pts.iter().map(move |&p| {
                    let mut next = prefix.clone();
                    next.push(p);
                    next
                })
            })
            .collect();
    }
    out
}
