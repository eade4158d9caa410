//! # tomo-raytrafo - Backend-dispatching ray transforms
//!
//! Forward projection and back-projection of discretized volumes for
//! computed tomography, executed by interchangeable compute back-ends.
//!
//! ## Architecture
//!
//! - [`space`] - uniformly discretized function spaces and their elements
//! - [`geometry`] - parallel, fan and cone beam acquisition geometries
//! - [`backend`] - backend identifiers, kernel traits and the [`BackendRegistry`]
//! - [`backends`] - the concrete kernels (`raycast_cpu`, `raycast_cuda`, `radon`)
//! - [`inference`] - projection space inference from a reconstruction space
//! - [`transform`] - the [`RayTransform`] / [`RayBackProjection`] operator pair
//!
//! A transform validates its configuration once at construction. The
//! adjoint is built lazily, cached, and points back at the transform it came
//! from. Device engines are cached per instance and per GPU index.
//!
//! ## Example
//!
//! ```no_run
//! use tomo_raytrafo::{DiscretizedSpace, Dtype, Operator, Parallel2dGeometry, RayTransform};
//!
//! let reco = DiscretizedSpace::uniform([-32.0, -32.0], [32.0, 32.0], [64, 64], Dtype::Float32)?;
//! let geometry = Parallel2dGeometry::uniform(180, -32.0, 32.0, 64)?;
//! let op = RayTransform::builder(reco, geometry).backend("radon").build()?;
//!
//! let x = op.domain().element_from_fn(|p| if p[0] * p[0] + p[1] * p[1] < 100.0 { 1.0 } else { 0.0 })?;
//! let sinogram = op.apply(&x)?;
//! let back = op.adjoint().apply(&sinogram)?;
//! assert_eq!(back.shape(), &[64, 64]);
//! # Ok::<(), tomo_raytrafo::RayTrafoError>(())
//! ```
//!
//! ## Features
//!
//! - `raycast-cpu` (default) - sampling ray-caster for 2-D geometries
//! - `radon` (default) - interpolating 2-D parallel-beam kernel
//! - `cuda` - `raycast_cuda` engine through NVRTC; requires a CUDA toolkit

pub mod backend;
pub mod backends;
pub mod error;
pub mod geometry;
pub mod inference;
pub mod space;
pub mod transform;

// Re-export primary types
pub use backend::{
    Advisory, BackendId, BackendOptions, BackendRegistry, Capability, LibraryVersion, OptionValue, RegistryConfig,
};
pub use error::{RayTrafoError, Result};
pub use geometry::{
    AcquisitionGeometry, ConeBeamGeometry, FanBeamGeometry, Geometry, Parallel2dGeometry, Parallel3dAxisGeometry,
    Parallel3dEulerGeometry,
};
pub use inference::infer_projection_space;
pub use space::{DiscretizedSpace, Dtype, Element, Weighting};
pub use transform::{
    Direction, Operator, RayBackProjection, RayTransform, RayTransformBase, TransformBuilder, TransformSettings,
};
