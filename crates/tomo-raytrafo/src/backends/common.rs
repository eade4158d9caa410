//! Ray tracing through a cell-centred volume grid, shared by the raycast
//! kernels

use crate::backend::{get_usize, BackendOptions};
use crate::error::{RayTrafoError, Result};
use crate::geometry::Ray;
use crate::space::DiscretizedSpace;

/// Option key: interpolation samples per (smallest) cell side
pub const SAMPLES_PER_CELL: &str = "samples_per_cell";

pub const DEFAULT_SAMPLES_PER_CELL: usize = 2;

pub(crate) fn samples_per_cell(options: &BackendOptions) -> Result<usize> {
    match get_usize(options, SAMPLES_PER_CELL)? {
        None => Ok(DEFAULT_SAMPLES_PER_CELL),
        Some(0) => Err(RayTrafoError::invalid_value(SAMPLES_PER_CELL, "must be at least 1")),
        Some(n) => Ok(n),
    }
}

/// Flattened description of a 2-D or 3-D reconstruction grid
///
/// Unused trailing axes have one cell of unit size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VolumeGrid {
    pub ndim: usize,
    pub shape: [usize; 3],
    pub min_pt: [f64; 3],
    pub max_pt: [f64; 3],
    pub cell: [f64; 3],
}

impl VolumeGrid {
    pub fn from_space(space: &DiscretizedSpace) -> Result<Self> {
        let ndim = space.ndim();
        if !(2..=3).contains(&ndim) {
            return Err(RayTrafoError::kernel(format!(
                "raycast kernels need a 2- or 3-dimensional volume, got ndim {ndim}"
            )));
        }
        let mut grid = Self {
            ndim,
            shape: [1; 3],
            min_pt: [0.0; 3],
            max_pt: [1.0; 3],
            cell: [1.0; 3],
        };
        let sides = space.cell_sides();
        for axis in 0..ndim {
            grid.shape[axis] = space.shape()[axis];
            grid.min_pt[axis] = space.domain().min_pt()[axis];
            grid.max_pt[axis] = space.domain().max_pt()[axis];
            grid.cell[axis] = sides[axis];
        }
        Ok(grid)
    }

    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn min_cell_side(&self) -> f64 {
        self.cell[..self.ndim].iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Parameter interval of `ray` inside the grid box (slab method).
    pub fn clip(&self, ray: &Ray) -> Option<(f64, f64)> {
        let mut t0 = f64::NEG_INFINITY;
        let mut t1 = f64::INFINITY;
        for axis in 0..self.ndim {
            let (o, d) = (ray.origin[axis], ray.direction[axis]);
            let (lo, hi) = (self.min_pt[axis], self.max_pt[axis]);
            if d.abs() < 1e-12 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let (a, b) = ((lo - o) / d, (hi - o) / d);
            t0 = t0.max(a.min(b));
            t1 = t1.min(a.max(b));
        }
        (t1 > t0).then_some((t0, t1))
    }

    /// Visit the interpolation weights of `ray`.
    ///
    /// The line integral is approximated with the midpoint rule, sampling a
    /// multilinear interpolant of the cell values; `visit(index, weight)`
    /// receives every (flat cell index, weight × step) pair.
    pub fn trace(&self, ray: &Ray, samples_per_cell: usize, mut visit: impl FnMut(usize, f64)) {
        let Some((t0, t1)) = self.clip(ray) else {
            return;
        };
        let h_max = self.min_cell_side() / samples_per_cell as f64;
        let steps = ((t1 - t0) / h_max).ceil().max(1.0) as usize;
        let h = (t1 - t0) / steps as f64;

        let corners = 1usize << self.ndim;
        let mut base = [0isize; 3];
        let mut frac = [0.0f64; 3];
        for k in 0..steps {
            let p = ray.at(t0 + (k as f64 + 0.5) * h);
            for axis in 0..self.ndim {
                let q = (p[axis] - self.min_pt[axis]) / self.cell[axis] - 0.5;
                let f = q.floor();
                base[axis] = f as isize;
                frac[axis] = q - f;
            }
            'corner: for corner in 0..corners {
                let mut weight = h;
                let mut flat = 0usize;
                for axis in 0..self.ndim {
                    let upper = (corner >> axis) & 1 == 1;
                    let idx = base[axis] + upper as isize;
                    if idx < 0 || idx >= self.shape[axis] as isize {
                        continue 'corner;
                    }
                    weight *= if upper { frac[axis] } else { 1.0 - frac[axis] };
                    flat = flat * self.shape[axis] + idx as usize;
                }
                if weight != 0.0 {
                    visit(flat, weight);
                }
            }
        }
    }
}

/// Check kernel buffer lengths against the expected sizes.
pub(crate) fn check_buffers(input: usize, input_expected: usize, output: usize, output_expected: usize) -> Result<()> {
    if input != input_expected || output != output_expected {
        return Err(RayTrafoError::kernel(format!(
            "buffer size mismatch: input {input} (expected {input_expected}), \
             output {output} (expected {output_expected})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::Dtype;
    use approx::assert_relative_eq;

    fn grid(n: usize) -> VolumeGrid {
        let space = DiscretizedSpace::uniform([-1.0, -1.0], [1.0, 1.0], [n, n], Dtype::Float64).unwrap();
        VolumeGrid::from_space(&space).unwrap()
    }

    #[test]
    fn test_clip_axis_aligned() {
        let g = grid(4);
        let ray = Ray::planar([0.25, -5.0], [0.0, 1.0]);
        let (t0, t1) = g.clip(&ray).unwrap();
        assert_relative_eq!(t0, 4.0, epsilon = 1e-12);
        assert_relative_eq!(t1, 6.0, epsilon = 1e-12);
        assert!(g.clip(&Ray::planar([3.0, 0.0], [0.0, 1.0])).is_none());
    }

    #[test]
    fn test_trace_constant_volume_gives_chord_length() {
        let g = grid(8);
        let ray = Ray::planar([0.1, 0.0], [0.0, 1.0]);
        let mut total = 0.0;
        g.trace(&ray, 2, |_, w| total += w);
        // linear interpolation falls off in the outer half cells
        assert!(total > 2.0 - 2.0 * 0.25 / 2.0 - 1e-9);
        assert!(total <= 2.0 + 1e-12);
    }

    #[test]
    fn test_trace_indices_in_bounds() {
        let g = grid(5);
        let ray = Ray::planar([0.0, 0.0], [std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2]);
        g.trace(&ray, 3, |i, w| {
            assert!(i < g.size());
            assert!(w > 0.0);
        });
    }

    #[test]
    fn test_samples_per_cell_option() {
        let mut options = BackendOptions::new();
        assert_eq!(samples_per_cell(&options).unwrap(), DEFAULT_SAMPLES_PER_CELL);
        options.insert(SAMPLES_PER_CELL.into(), 0i64.into());
        assert!(samples_per_cell(&options).is_err());
    }

    #[test]
    fn test_rejects_1d_space() {
        let space = DiscretizedSpace::uniform([0.0], [1.0], [4], Dtype::Float32).unwrap();
        assert!(VolumeGrid::from_space(&space).is_err());
    }
}
