//! Raycast projector on NVIDIA GPUs
//!
//! Runs the same midpoint-rule multilinear raycaster as the host backend,
//! one CUDA thread per ray. Kernels are compiled with NVRTC when an engine
//! is built; the ray table and grid description are uploaded once per
//! engine, so only the data buffers move on each call.
//!
//! # Architecture
//!
//! ```text
//! RaycastCudaFactory ──build(geometry, spaces, gpu_index)──► RaycastCudaEngine
//!                                                            ├── CudaDevice   (gpu_index)
//!                                                            ├── grid buffer  [ndim, shape, min_pt, cell, h]
//!                                                            ├── ray table    [origin, direction] × rays
//!                                                            └── forward / backward kernels
//! ```
//!
//! Without the `cuda` feature the factory reports itself unavailable.

use crate::backend::{EngineFactory, ProjectionEngine};
use crate::error::Result;
use crate::geometry::Geometry;
use crate::space::DiscretizedSpace;
use std::sync::Arc;

#[cfg(feature = "cuda")]
use super::common::{samples_per_cell, VolumeGrid};
#[cfg(feature = "cuda")]
use crate::backend::BackendOptions;
#[cfg(feature = "cuda")]
use crate::error::RayTrafoError;
#[cfg(feature = "cuda")]
use crate::geometry::AcquisitionGeometry;
#[cfg(feature = "cuda")]
use crate::space::Weighting;
#[cfg(feature = "cuda")]
use cudarc::driver::{CudaDevice, CudaFunction, CudaSlice, LaunchAsync, LaunchConfig};
#[cfg(feature = "cuda")]
use std::sync::OnceLock;
#[cfg(feature = "cuda")]
use std::time::Instant;
#[cfg(feature = "cuda")]
use tomo_tracing::performance;

#[cfg(feature = "cuda")]
const MODULE: &str = "tomo_raycast";

#[cfg(feature = "cuda")]
const KERNELS: [&str; 2] = ["raycast_forward", "raycast_backward"];

#[cfg(feature = "cuda")]
const RAYCAST_SRC: &str = r#"
// grid: [ndim, n0, n1, n2, min0, min1, min2, max0, max1, max2, c0, c1, c2]
__device__ void trace(const double* g, const double* ray, int spc,
                      const double* x, double* img, double value, double* acc)
{
    int ndim = (int)g[0];
    double t0 = -1e300, t1 = 1e300;
    for (int a = 0; a < ndim; ++a) {
        double o = ray[a], d = ray[3 + a];
        double lo = g[4 + a], hi = g[7 + a];
        if (fabs(d) < 1e-12) {
            if (o < lo || o > hi) return;
            continue;
        }
        double ta = (lo - o) / d, tb = (hi - o) / d;
        t0 = fmax(t0, fmin(ta, tb));
        t1 = fmin(t1, fmax(ta, tb));
    }
    if (!(t1 > t0)) return;

    double cmin = g[10];
    for (int a = 1; a < ndim; ++a) cmin = fmin(cmin, g[10 + a]);
    double hmax = cmin / spc;
    int steps = (int)ceil((t1 - t0) / hmax);
    if (steps < 1) steps = 1;
    double h = (t1 - t0) / steps;

    int corners = 1 << ndim;
    for (int k = 0; k < steps; ++k) {
        double t = t0 + (k + 0.5) * h;
        long base[3];
        double frac[3];
        for (int a = 0; a < ndim; ++a) {
            double p = ray[a] + t * ray[3 + a];
            double q = (p - g[4 + a]) / g[10 + a] - 0.5;
            double f = floor(q);
            base[a] = (long)f;
            frac[a] = q - f;
        }
        for (int c = 0; c < corners; ++c) {
            double w = h;
            long flat = 0;
            int inside = 1;
            for (int a = 0; a < ndim; ++a) {
                int upper = (c >> a) & 1;
                long idx = base[a] + upper;
                long n = (long)g[1 + a];
                if (idx < 0 || idx >= n) { inside = 0; break; }
                w *= upper ? frac[a] : 1.0 - frac[a];
                flat = flat * n + idx;
            }
            if (!inside || w == 0.0) continue;
            if (img) atomicAdd(&img[flat], w * value);
            else *acc += w * x[flat];
        }
    }
}

extern "C" __global__ void raycast_forward(const double* g, const double* rays,
                                           const double* x, double* out,
                                           int n_rays, int spc)
{
    int r = blockIdx.x * blockDim.x + threadIdx.x;
    if (r >= n_rays) return;
    double acc = 0.0;
    trace(g, rays + 6 * r, spc, x, 0, 0.0, &acc);
    out[r] = acc;
}

extern "C" __global__ void raycast_backward(const double* g, const double* rays,
                                            const double* y, double* out,
                                            int n_rays, int spc)
{
    int r = blockIdx.x * blockDim.x + threadIdx.x;
    if (r >= n_rays) return;
    double v = y[r];
    if (v == 0.0) return;
    trace(g, rays + 6 * r, spc, 0, out, v, 0);
}
"#;

/// Builds [`RaycastCudaEngine`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct RaycastCudaFactory;

impl RaycastCudaFactory {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "cuda")]
fn driver_error(context: &str, err: impl std::fmt::Debug) -> RayTrafoError {
    RayTrafoError::kernel(format!("{context}: {err:?}"))
}

#[cfg(feature = "cuda")]
impl EngineFactory for RaycastCudaFactory {
    fn is_available(&self) -> bool {
        static PROBE: OnceLock<bool> = OnceLock::new();
        *PROBE.get_or_init(|| CudaDevice::new(0).is_ok())
    }

    fn build(
        &self,
        geometry: &Arc<Geometry>,
        reco_space: &DiscretizedSpace,
        proj_space: &DiscretizedSpace,
        gpu_index: usize,
    ) -> Result<Arc<dyn ProjectionEngine>> {
        Ok(Arc::new(RaycastCudaEngine::new(geometry, reco_space, proj_space, gpu_index)?))
    }
}

#[cfg(not(feature = "cuda"))]
impl EngineFactory for RaycastCudaFactory {
    fn is_available(&self) -> bool {
        false
    }

    fn build(
        &self,
        _geometry: &Arc<Geometry>,
        _reco_space: &DiscretizedSpace,
        _proj_space: &DiscretizedSpace,
        _gpu_index: usize,
    ) -> Result<Arc<dyn ProjectionEngine>> {
        Err(crate::error::RayTrafoError::BackendNotAvailable(
            crate::backend::BackendId::RaycastCuda,
        ))
    }
}

/// Raycaster bound to one device, geometry and pair of spaces
#[cfg(feature = "cuda")]
pub struct RaycastCudaEngine {
    device: Arc<CudaDevice>,
    gpu_index: usize,
    forward_fn: CudaFunction,
    backward_fn: CudaFunction,
    grid: CudaSlice<f64>,
    rays: CudaSlice<f64>,
    n_rays: usize,
    volume_size: usize,
    reco_weighting: Weighting,
    proj_weighting: Weighting,
}

#[cfg(feature = "cuda")]
impl std::fmt::Debug for RaycastCudaEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaycastCudaEngine")
            .field("gpu_index", &self.gpu_index)
            .field("n_rays", &self.n_rays)
            .field("volume_size", &self.volume_size)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "cuda")]
impl RaycastCudaEngine {
    pub fn new(
        geometry: &Geometry,
        reco_space: &DiscretizedSpace,
        proj_space: &DiscretizedSpace,
        gpu_index: usize,
    ) -> Result<Self> {
        let start = Instant::now();
        let volume = VolumeGrid::from_space(reco_space)?;

        let device = CudaDevice::new(gpu_index).map_err(|e| driver_error("failed to open CUDA device", e))?;
        let ptx = cudarc::nvrtc::compile_ptx_with_opts(
            RAYCAST_SRC,
            cudarc::nvrtc::CompileOptions {
                // double-precision atomicAdd
                arch: Some("compute_60"),
                ..Default::default()
            },
        )
        .map_err(|e| driver_error("failed to compile raycast kernels", e))?;
        device
            .load_ptx(ptx, MODULE, &KERNELS)
            .map_err(|e| driver_error("failed to load raycast kernels", e))?;
        let forward_fn = device
            .get_func(MODULE, KERNELS[0])
            .ok_or_else(|| RayTrafoError::kernel("raycast_forward kernel missing after load"))?;
        let backward_fn = device
            .get_func(MODULE, KERNELS[1])
            .ok_or_else(|| RayTrafoError::kernel("raycast_backward kernel missing after load"))?;

        let mut grid_host = vec![volume.ndim as f64];
        grid_host.extend(volume.shape.iter().map(|&n| n as f64));
        grid_host.extend_from_slice(&volume.min_pt);
        grid_host.extend_from_slice(&volume.max_pt);
        grid_host.extend_from_slice(&volume.cell);
        let grid = device
            .htod_sync_copy(&grid_host)
            .map_err(|e| driver_error("failed to upload grid", e))?;

        let ray_list = geometry.rays();
        let ray_host: Vec<f64> = ray_list
            .iter()
            .flat_map(|r| r.origin.into_iter().chain(r.direction))
            .collect();
        let rays = device
            .htod_sync_copy(&ray_host)
            .map_err(|e| driver_error("failed to upload ray table", e))?;

        performance::record_engine_build("raycast_cuda", gpu_index, ray_list.len(), start.elapsed().as_micros() as u64);
        Ok(Self {
            device,
            gpu_index,
            forward_fn,
            backward_fn,
            grid,
            rays,
            n_rays: ray_list.len(),
            volume_size: volume.size(),
            reco_weighting: reco_space.weighting().clone(),
            proj_weighting: proj_space.weighting().clone(),
        })
    }

    fn launch(
        &self,
        func: &CudaFunction,
        input: &[f64],
        output_len: usize,
        options: &BackendOptions,
    ) -> Result<Vec<f64>> {
        let spc = samples_per_cell(options)? as i32;
        let input_dev = self
            .device
            .htod_sync_copy(input)
            .map_err(|e| driver_error("failed to upload input", e))?;
        let mut output_dev = self
            .device
            .alloc_zeros::<f64>(output_len)
            .map_err(|e| driver_error("failed to allocate output", e))?;
        let cfg = LaunchConfig::for_num_elems(self.n_rays as u32);
        // SAFETY: argument order and types match the kernel signatures in
        // RAYCAST_SRC; buffer lengths were checked by the caller.
        unsafe {
            func.clone().launch(
                cfg,
                (&self.grid, &self.rays, &input_dev, &mut output_dev, self.n_rays as i32, spc),
            )
        }
        .map_err(|e| driver_error("kernel launch failed", e))?;
        self.device
            .dtoh_sync_copy(&output_dev)
            .map_err(|e| driver_error("failed to download output", e))
    }
}

#[cfg(feature = "cuda")]
impl ProjectionEngine for RaycastCudaEngine {
    fn gpu_index(&self) -> usize {
        self.gpu_index
    }

    fn forward(&self, x: &[f64], out: &mut [f64], options: &BackendOptions) -> Result<()> {
        let start = Instant::now();
        super::common::check_buffers(x.len(), self.volume_size, out.len(), self.n_rays)?;
        let result = self.launch(&self.forward_fn, x, self.n_rays, options)?;
        out.copy_from_slice(&result);
        performance::record_projection("forward", "raycast_cuda", x.len(), out.len(), start.elapsed().as_micros() as u64);
        Ok(())
    }

    fn backward(&self, y: &[f64], out: &mut [f64], options: &BackendOptions) -> Result<()> {
        let start = Instant::now();
        super::common::check_buffers(y.len(), self.n_rays, out.len(), self.volume_size)?;
        let mut weighted = y.to_vec();
        self.proj_weighting.apply(&mut weighted);
        let result = self.launch(&self.backward_fn, &weighted, self.volume_size, options)?;
        out.copy_from_slice(&result);
        self.reco_weighting.apply_inverse(out);
        performance::record_projection("backward", "raycast_cuda", y.len(), out.len(), start.elapsed().as_micros() as u64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_availability_matches_feature() {
        let factory = RaycastCudaFactory::new();
        if !cfg!(feature = "cuda") {
            assert!(!factory.is_available());
        }
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn test_stub_build_reports_unavailable() {
        use crate::geometry::Parallel2dGeometry;
        use crate::space::Dtype;

        let space = DiscretizedSpace::uniform([-1.0, -1.0], [1.0, 1.0], [4, 4], Dtype::Float32).unwrap();
        let geometry: Arc<Geometry> = Arc::new(Parallel2dGeometry::uniform(4, -1.0, 1.0, 4).unwrap().into());
        let proj = crate::inference::infer_projection_space(&space, &geometry).unwrap();
        assert!(matches!(
            RaycastCudaFactory::new().build(&geometry, &space, &proj, 0),
            Err(crate::error::RayTrafoError::BackendNotAvailable(_))
        ));
    }

    #[cfg(feature = "cuda")]
    #[test]
    fn test_engine_matches_host_forward() {
        use crate::backend::{BackendOptions, KernelArgs, StatelessProjector};
        use crate::backends::RaycastCpuProjector;
        use crate::geometry::Parallel2dGeometry;
        use crate::space::Dtype;

        if !RaycastCudaFactory::new().is_available() {
            return;
        }
        let space = DiscretizedSpace::uniform([-1.0, -1.0], [1.0, 1.0], [16, 16], Dtype::Float64).unwrap();
        let geometry: Arc<Geometry> = Arc::new(Parallel2dGeometry::uniform(8, -1.5, 1.5, 20).unwrap().into());
        let proj = crate::inference::infer_projection_space(&space, &geometry).unwrap();
        let engine = RaycastCudaFactory::new().build(&geometry, &space, &proj, 0).unwrap();
        let x: Vec<f64> = (0..space.size()).map(|i| (i % 7) as f64).collect();
        let options = BackendOptions::new();

        let mut gpu = vec![0.0; proj.size()];
        engine.forward(&x, &mut gpu, &options).unwrap();
        let mut cpu = vec![0.0; proj.size()];
        let args = KernelArgs {
            geometry: &geometry,
            reco_space: &space,
            proj_space: &proj,
            options: &options,
        };
        RaycastCpuProjector.forward(&args, &x, &mut cpu).unwrap();
        for (a, b) in gpu.iter().zip(&cpu) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
