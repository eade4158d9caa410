//! Projection kernels
//!
//! | Backend        | Kind                     | Feature       |
//! |----------------|--------------------------|---------------|
//! | `raycast_cpu`  | [`StatelessProjector`]   | `raycast-cpu` |
//! | `raycast_cuda` | [`EngineFactory`]        | `cuda`        |
//! | `radon`        | [`StatelessProjector`]   | `radon`       |
//!
//! [`StatelessProjector`]: crate::backend::StatelessProjector
//! [`EngineFactory`]: crate::backend::EngineFactory

pub(crate) mod common;
#[cfg(feature = "raycast-cpu")]
mod cpu;
mod cuda;
#[cfg(feature = "radon")]
mod radon;

pub use common::{DEFAULT_SAMPLES_PER_CELL, SAMPLES_PER_CELL};
#[cfg(feature = "raycast-cpu")]
pub use cpu::RaycastCpuProjector;
#[cfg(feature = "cuda")]
pub use cuda::RaycastCudaEngine;
pub use cuda::RaycastCudaFactory;
#[cfg(feature = "radon")]
pub use radon::{RadonProjector, INTERPOLATION};
