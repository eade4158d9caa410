//! Ray-driven projector on the host
//!
//! Forward projection evaluates one line integral per ray in parallel.
//! Back-projection scatters the same interpolation weights into per-thread
//! images which are summed afterwards, then rescales so that
//!
//! ```text
//! <A x, y>_proj = <x, B y>_reco,   B = W_reco⁻¹ · Aᵀ · W_proj
//! ```
//!
//! holds exactly for the weighted inner products of both spaces.

use super::common::{check_buffers, samples_per_cell, VolumeGrid};
use crate::backend::{KernelArgs, StatelessProjector};
use crate::error::Result;
use crate::geometry::AcquisitionGeometry;
use rayon::prelude::*;
use std::time::Instant;
use tomo_tracing::performance;

/// Host raycaster for 2-D geometries
#[derive(Debug, Clone, Copy, Default)]
pub struct RaycastCpuProjector;

impl RaycastCpuProjector {
    pub fn new() -> Self {
        Self
    }
}

impl StatelessProjector for RaycastCpuProjector {
    fn forward(&self, args: &KernelArgs<'_>, x: &[f64], out: &mut [f64]) -> Result<()> {
        let start = Instant::now();
        let grid = VolumeGrid::from_space(args.reco_space)?;
        let spc = samples_per_cell(args.options)?;
        let rays = args.geometry.rays();
        check_buffers(x.len(), grid.size(), out.len(), rays.len())?;

        out.par_iter_mut().zip(rays.par_iter()).for_each(|(value, ray)| {
            let mut acc = 0.0;
            grid.trace(ray, spc, |i, w| acc += w * x[i]);
            *value = acc;
        });

        performance::record_projection("forward", "raycast_cpu", x.len(), out.len(), start.elapsed().as_micros() as u64);
        Ok(())
    }

    fn backward(&self, args: &KernelArgs<'_>, y: &[f64], out: &mut [f64]) -> Result<()> {
        let start = Instant::now();
        let grid = VolumeGrid::from_space(args.reco_space)?;
        let spc = samples_per_cell(args.options)?;
        let rays = args.geometry.rays();
        check_buffers(y.len(), rays.len(), out.len(), grid.size())?;

        let mut weighted = y.to_vec();
        args.proj_space.weighting().apply(&mut weighted);

        let size = grid.size();
        let image = rays
            .par_iter()
            .zip(weighted.par_iter())
            .fold(
                || vec![0.0; size],
                |mut image, (ray, &value)| {
                    if value != 0.0 {
                        grid.trace(ray, spc, |i, w| image[i] += w * value);
                    }
                    image
                },
            )
            .reduce(
                || vec![0.0; size],
                |mut a, b| {
                    a.iter_mut().zip(&b).for_each(|(a, b)| *a += b);
                    a
                },
            );

        out.copy_from_slice(&image);
        args.reco_space.weighting().apply_inverse(out);

        performance::record_projection("backward", "raycast_cpu", y.len(), out.len(), start.elapsed().as_micros() as u64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendOptions;
    use crate::geometry::{FanBeamGeometry, Geometry, Parallel2dGeometry};
    use crate::space::{DiscretizedSpace, Dtype};

    fn pseudo_random(len: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5
            })
            .collect()
    }

    fn check_adjoint(geometry: Geometry) {
        let reco = DiscretizedSpace::uniform([-1.0, -1.0], [1.0, 1.0], [12, 12], Dtype::Float64).unwrap();
        let proj = crate::inference::infer_projection_space(&reco, &geometry).unwrap();
        let options = BackendOptions::new();
        let args = KernelArgs {
            geometry: &geometry,
            reco_space: &reco,
            proj_space: &proj,
            options: &options,
        };

        let x = reco.element_from_real(pseudo_random(reco.size(), 1)).unwrap();
        let y = proj.element_from_real(pseudo_random(proj.size(), 2)).unwrap();
        let mut ax = vec![0.0; proj.size()];
        let mut aty = vec![0.0; reco.size()];
        RaycastCpuProjector.forward(&args, x.as_real().unwrap(), &mut ax).unwrap();
        RaycastCpuProjector.backward(&args, y.as_real().unwrap(), &mut aty).unwrap();

        let ax = proj.element_from_real(ax).unwrap();
        let aty = reco.element_from_real(aty).unwrap();
        let lhs = proj.inner(&ax, &y).unwrap().re;
        let rhs = reco.inner(&x, &aty).unwrap().re;
        assert!((lhs - rhs).abs() <= 1e-9 * lhs.abs().max(1.0), "{lhs} != {rhs}");
    }

    #[test]
    fn test_parallel_adjointness() {
        check_adjoint(Parallel2dGeometry::uniform(10, -1.5, 1.5, 16).unwrap().into());
    }

    #[test]
    fn test_fan_adjointness() {
        check_adjoint(FanBeamGeometry::uniform(10, -3.0, 3.0, 16, 4.0, 2.0).unwrap().into());
    }

    #[test]
    fn test_forward_of_constant_is_chord_length() {
        let reco = DiscretizedSpace::uniform([-1.0, -1.0], [1.0, 1.0], [32, 32], Dtype::Float64).unwrap();
        let geometry: Geometry = Parallel2dGeometry::uniform(1, -0.5, 0.5, 1).unwrap().into();
        let proj = crate::inference::infer_projection_space(&reco, &geometry).unwrap();
        let options = BackendOptions::new();
        let args = KernelArgs {
            geometry: &geometry,
            reco_space: &reco,
            proj_space: &proj,
            options: &options,
        };
        let mut out = vec![0.0; 1];
        RaycastCpuProjector.forward(&args, &vec![1.0; reco.size()], &mut out).unwrap();
        // horizontal central ray, chord length 2 minus the interpolation falloff at both ends
        assert!((out[0] - 2.0).abs() < 0.05, "{}", out[0]);
    }

    #[test]
    fn test_buffer_mismatch_is_kernel_error() {
        let reco = DiscretizedSpace::uniform([-1.0, -1.0], [1.0, 1.0], [4, 4], Dtype::Float64).unwrap();
        let geometry: Geometry = Parallel2dGeometry::uniform(2, -1.0, 1.0, 4).unwrap().into();
        let proj = crate::inference::infer_projection_space(&reco, &geometry).unwrap();
        let options = BackendOptions::new();
        let args = KernelArgs {
            geometry: &geometry,
            reco_space: &reco,
            proj_space: &proj,
            options: &options,
        };
        let mut out = vec![0.0; 3];
        assert!(matches!(
            RaycastCpuProjector.forward(&args, &[0.0; 16], &mut out),
            Err(crate::error::RayTrafoError::Kernel(_))
        ));
    }
}
