//! Software radon transform for 2-D parallel beam data
//!
//! Works on a square, origin-centred reconstruction grid of `N × N` pixels
//! with pixel size `p`. Forward projection splats every pixel onto an
//! internal detector of `ceil(√2·N)` bins of width `p` (wide enough for the
//! image diagonal), then resamples each internal row onto the geometry's
//! detector points. Back-projection is pixel-driven: every pixel sums the
//! sinogram sampled at `s = x·cos θ + y·sin θ`, times the angle cell size.

use super::common::check_buffers;
use crate::backend::{get_str, BackendOptions, KernelArgs, StatelessProjector};
use crate::error::{RayTrafoError, Result};
use crate::geometry::AcquisitionGeometry;
use rayon::prelude::*;
use std::time::Instant;
use tomo_tracing::performance;

/// Option key: `"linear"` (default) or `"nearest"` detector interpolation
pub const INTERPOLATION: &str = "interpolation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interpolation {
    Linear,
    Nearest,
}

impl Interpolation {
    fn from_options(options: &BackendOptions) -> Result<Self> {
        match get_str(options, INTERPOLATION)? {
            None => Ok(Interpolation::Linear),
            Some(s) if s.eq_ignore_ascii_case("linear") => Ok(Interpolation::Linear),
            Some(s) if s.eq_ignore_ascii_case("nearest") => Ok(Interpolation::Nearest),
            Some(s) => Err(RayTrafoError::invalid_value(
                INTERPOLATION,
                format!("expected 'linear' or 'nearest', got {s:?}"),
            )),
        }
    }
}

/// Uniformly sampled 1-D signal, zero outside its cells
struct Samples<'a> {
    values: &'a [f64],
    first: f64,
    step: f64,
}

impl Samples<'_> {
    fn at(&self, s: f64, interp: Interpolation) -> f64 {
        let n = self.values.len() as isize;
        let q = (s - self.first) / self.step;
        match interp {
            Interpolation::Nearest => {
                let i = q.round() as isize;
                if (0..n).contains(&i) {
                    self.values[i as usize]
                } else {
                    0.0
                }
            }
            Interpolation::Linear => {
                let f = q.floor();
                let (i, t) = (f as isize, q - f);
                let get = |k: isize| if (0..n).contains(&k) { self.values[k as usize] } else { 0.0 };
                (1.0 - t) * get(i) + t * get(i + 1)
            }
        }
    }
}

/// Square grid parameters extracted from the reconstruction space
struct PixelGrid {
    n: usize,
    pixel: f64,
    points: Vec<f64>,
}

impl PixelGrid {
    fn from_args(args: &KernelArgs<'_>) -> Result<Self> {
        let space = args.reco_space;
        if space.ndim() != 2 || space.shape()[0] != space.shape()[1] {
            return Err(RayTrafoError::kernel(format!(
                "radon kernel needs a square 2-D grid, got shape {:?}",
                space.shape()
            )));
        }
        let sides = space.cell_sides();
        Ok(Self {
            n: space.shape()[0],
            pixel: sides[0],
            points: space.partition().points(0),
        })
    }
}

fn angles_and_detector(args: &KernelArgs<'_>) -> Result<(Vec<f64>, f64, Vec<f64>)> {
    let geometry = args
        .geometry
        .as_parallel_2d()
        .ok_or_else(|| RayTrafoError::kernel(format!("radon kernel needs a parallel_2d geometry, got {}", args.geometry.kind())))?;
    let angles = geometry.motion_partition().points(0);
    let dtheta = geometry.motion_partition().cell_sides()[0];
    Ok((angles, dtheta, geometry.det_partition().points(0)))
}

/// Software radon projector
#[derive(Debug, Clone, Copy, Default)]
pub struct RadonProjector;

impl RadonProjector {
    pub fn new() -> Self {
        Self
    }
}

impl StatelessProjector for RadonProjector {
    fn forward(&self, args: &KernelArgs<'_>, x: &[f64], out: &mut [f64]) -> Result<()> {
        let start = Instant::now();
        let grid = PixelGrid::from_args(args)?;
        let (angles, _, det_points) = angles_and_detector(args)?;
        let interp = Interpolation::from_options(args.options)?;
        check_buffers(x.len(), grid.n * grid.n, out.len(), angles.len() * det_points.len())?;

        let bins = (std::f64::consts::SQRT_2 * grid.n as f64).ceil() as usize;
        let first_bin = -0.5 * (bins as f64 - 1.0) * grid.pixel;

        out.par_chunks_mut(det_points.len())
            .zip(angles.par_iter())
            .for_each(|(row, &theta)| {
                let (sin, cos) = theta.sin_cos();
                let mut internal = vec![0.0; bins];
                for (i, &px) in grid.points.iter().enumerate() {
                    for (k, &py) in grid.points.iter().enumerate() {
                        let value = x[i * grid.n + k];
                        if value == 0.0 {
                            continue;
                        }
                        let q = (px * cos + py * sin - first_bin) / grid.pixel;
                        let f = q.floor();
                        let (j, t) = (f as isize, q - f);
                        let mass = value * grid.pixel;
                        if (0..bins as isize).contains(&j) {
                            internal[j as usize] += (1.0 - t) * mass;
                        }
                        if (0..bins as isize).contains(&(j + 1)) {
                            internal[(j + 1) as usize] += t * mass;
                        }
                    }
                }
                let samples = Samples {
                    values: &internal,
                    first: first_bin,
                    step: grid.pixel,
                };
                for (value, &s) in row.iter_mut().zip(&det_points) {
                    *value = samples.at(s, interp);
                }
            });

        performance::record_projection("forward", "radon", x.len(), out.len(), start.elapsed().as_micros() as u64);
        Ok(())
    }

    fn backward(&self, args: &KernelArgs<'_>, y: &[f64], out: &mut [f64]) -> Result<()> {
        let start = Instant::now();
        let grid = PixelGrid::from_args(args)?;
        let (angles, dtheta, det_points) = angles_and_detector(args)?;
        let interp = Interpolation::from_options(args.options)?;
        check_buffers(y.len(), angles.len() * det_points.len(), out.len(), grid.n * grid.n)?;

        let det_first = det_points.first().copied().unwrap_or(0.0);
        let det_step = args.geometry.det_partition().cell_sides()[0];
        let trig: Vec<(f64, f64)> = angles.iter().map(|a| a.sin_cos()).collect();

        out.par_iter_mut().enumerate().for_each(|(flat, value)| {
            let px = grid.points[flat / grid.n];
            let py = grid.points[flat % grid.n];
            let sum: f64 = y
                .chunks(det_points.len())
                .zip(&trig)
                .map(|(row, &(sin, cos))| {
                    let samples = Samples {
                        values: row,
                        first: det_first,
                        step: det_step,
                    };
                    samples.at(px * cos + py * sin, interp)
                })
                .sum();
            *value = sum * dtheta;
        });

        performance::record_projection("backward", "radon", y.len(), out.len(), start.elapsed().as_micros() as u64);
        Ok(())
    }
}
