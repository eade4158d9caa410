//! Kernel interfaces implemented by projection backends
//!
//! Backends come in two shapes:
//!
//! ```text
//! StatelessProjector   called directly with every argument on each call
//!                      (raycast_cpu, radon)
//!
//! EngineFactory ──build──► ProjectionEngine
//!                      device state prepared once per (geometry, spaces,
//!                      gpu index), then reused across calls (raycast_cuda)
//! ```
//!
//! All kernels operate on real-valued, row-major `f64` buffers. Complex
//! data is split into parts by the transform layer before it gets here.

use super::options::BackendOptions;
use crate::error::Result;
use crate::geometry::Geometry;
use crate::space::DiscretizedSpace;
use std::fmt;
use std::sync::Arc;

/// Everything a stateless kernel needs besides the data buffers
#[derive(Debug, Clone, Copy)]
pub struct KernelArgs<'a> {
    pub geometry: &'a Geometry,
    /// Real-valued reconstruction space
    pub reco_space: &'a DiscretizedSpace,
    /// Real-valued projection space
    pub proj_space: &'a DiscretizedSpace,
    pub options: &'a BackendOptions,
}

/// Backend called afresh on every evaluation
pub trait StatelessProjector: Send + Sync + fmt::Debug {
    /// Project `x` (reco samples) into `out` (projection samples).
    fn forward(&self, args: &KernelArgs<'_>, x: &[f64], out: &mut [f64]) -> Result<()>;

    /// Back-project `y` (projection samples) into `out` (reco samples).
    fn backward(&self, args: &KernelArgs<'_>, y: &[f64], out: &mut [f64]) -> Result<()>;
}

/// Prepared projector bound to one geometry, pair of spaces and device
pub trait ProjectionEngine: Send + Sync + fmt::Debug {
    /// Device the engine was built for.
    fn gpu_index(&self) -> usize;

    fn forward(&self, x: &[f64], out: &mut [f64], options: &BackendOptions) -> Result<()>;

    fn backward(&self, y: &[f64], out: &mut [f64], options: &BackendOptions) -> Result<()>;
}

/// Builds [`ProjectionEngine`]s
pub trait EngineFactory: Send + Sync + fmt::Debug {
    /// Whether engines can be built in this process (device present,
    /// driver loaded).
    fn is_available(&self) -> bool;

    fn build(
        &self,
        geometry: &Arc<Geometry>,
        reco_space: &DiscretizedSpace,
        proj_space: &DiscretizedSpace,
        gpu_index: usize,
    ) -> Result<Arc<dyn ProjectionEngine>>;
}

/// Resolved kernel handle of a backend
#[derive(Debug, Clone)]
pub enum BackendProvider {
    Stateless(Arc<dyn StatelessProjector>),
    Engine(Arc<dyn EngineFactory>),
}

impl BackendProvider {
    pub fn is_engine(&self) -> bool {
        matches!(self, BackendProvider::Engine(_))
    }
}
