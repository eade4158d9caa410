//! Interval products and uniform rectangular partitions

use crate::error::{RayTrafoError, Result};
use serde::{Deserialize, Serialize};

/// Axis-aligned box `[min_pt, max_pt]` in `ndim` dimensions
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntervalProd {
    min_pt: Vec<f64>,
    max_pt: Vec<f64>,
}

impl IntervalProd {
    /// Create a box, checking that both corners have the same length and
    /// `min_pt <= max_pt` componentwise.
    pub fn new(min_pt: impl Into<Vec<f64>>, max_pt: impl Into<Vec<f64>>) -> Result<Self> {
        let min_pt = min_pt.into();
        let max_pt = max_pt.into();
        if min_pt.len() != max_pt.len() {
            return Err(RayTrafoError::invalid_geometry(format!(
                "`min_pt` and `max_pt` have different lengths: {} != {}",
                min_pt.len(),
                max_pt.len()
            )));
        }
        for (axis, (lo, hi)) in min_pt.iter().zip(&max_pt).enumerate() {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(RayTrafoError::invalid_geometry(format!(
                    "interval bounds must be finite, got [{lo}, {hi}] in axis {axis}"
                )));
            }
            if lo > hi {
                return Err(RayTrafoError::invalid_geometry(format!(
                    "`min_pt[{axis}]` > `max_pt[{axis}]`: {lo} > {hi}"
                )));
            }
        }
        Ok(Self { min_pt, max_pt })
    }

    pub fn ndim(&self) -> usize {
        self.min_pt.len()
    }

    pub fn min_pt(&self) -> &[f64] {
        &self.min_pt
    }

    pub fn max_pt(&self) -> &[f64] {
        &self.max_pt
    }

    /// Side lengths of the box.
    pub fn extent(&self) -> Vec<f64> {
        self.min_pt.iter().zip(&self.max_pt).map(|(lo, hi)| hi - lo).collect()
    }

    /// Centre of the box.
    pub fn mid_pt(&self) -> Vec<f64> {
        self.min_pt
            .iter()
            .zip(&self.max_pt)
            .map(|(lo, hi)| 0.5 * (lo + hi))
            .collect()
    }

    /// Product of the side lengths.
    pub fn volume(&self) -> f64 {
        self.extent().iter().product()
    }

    /// Cartesian product `self × other`.
    pub fn append(&self, other: &IntervalProd) -> IntervalProd {
        let mut min_pt = self.min_pt.clone();
        let mut max_pt = self.max_pt.clone();
        min_pt.extend_from_slice(&other.min_pt);
        max_pt.extend_from_slice(&other.max_pt);
        IntervalProd { min_pt, max_pt }
    }
}

/// Uniform partition of an [`IntervalProd`] into `shape` cells
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectPartition {
    domain: IntervalProd,
    shape: Vec<usize>,
}

impl RectPartition {
    /// Partition `domain` into `shape` equally sized cells.
    ///
    /// Every axis must have at least one cell and a positive extent.
    pub fn new(domain: IntervalProd, shape: impl Into<Vec<usize>>) -> Result<Self> {
        let shape = shape.into();
        if shape.len() != domain.ndim() {
            return Err(RayTrafoError::invalid_geometry(format!(
                "partition shape {shape:?} does not match domain dimension {}",
                domain.ndim()
            )));
        }
        if let Some(axis) = shape.iter().position(|&n| n == 0) {
            return Err(RayTrafoError::invalid_geometry(format!(
                "partition shape {shape:?} has no cells in axis {axis}"
            )));
        }
        if let Some(axis) = domain.extent().iter().position(|&e| e <= 0.0) {
            return Err(RayTrafoError::invalid_geometry(format!(
                "partition domain is degenerate in axis {axis}"
            )));
        }
        Ok(Self { domain, shape })
    }

    /// Uniform partition of `[min_pt, max_pt]`.
    pub fn uniform(
        min_pt: impl Into<Vec<f64>>,
        max_pt: impl Into<Vec<f64>>,
        shape: impl Into<Vec<usize>>,
    ) -> Result<Self> {
        Self::new(IntervalProd::new(min_pt, max_pt)?, shape)
    }

    pub fn domain(&self) -> &IntervalProd {
        &self.domain
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of cells.
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn min_pt(&self) -> &[f64] {
        self.domain.min_pt()
    }

    pub fn max_pt(&self) -> &[f64] {
        self.domain.max_pt()
    }

    pub fn extent(&self) -> Vec<f64> {
        self.domain.extent()
    }

    /// Cell side length per axis.
    pub fn cell_sides(&self) -> Vec<f64> {
        self.extent()
            .iter()
            .zip(&self.shape)
            .map(|(extent, &n)| extent / n as f64)
            .collect()
    }

    /// Volume of a single cell.
    pub fn cell_volume(&self) -> f64 {
        self.cell_sides().iter().product()
    }

    /// Cell midpoints along `axis`.
    pub fn points(&self, axis: usize) -> Vec<f64> {
        let n = self.shape[axis];
        let lo = self.domain.min_pt()[axis];
        let side = self.cell_sides()[axis];
        (0..n).map(|i| lo + (i as f64 + 0.5) * side).collect()
    }

    /// Cartesian product `self × other`, axes of `self` first.
    pub fn append(&self, other: &RectPartition) -> RectPartition {
        let mut shape = self.shape.clone();
        shape.extend_from_slice(&other.shape);
        RectPartition {
            domain: self.domain.append(&other.domain),
            shape,
        }
    }
}

/// `np.isclose` semantics: `|a - b| <= atol + rtol * |b|`.
pub(crate) fn is_close(a: f64, b: f64, rtol: f64, atol: f64) -> bool {
    (a - b).abs() <= atol + rtol * b.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_prod_geometry() {
        let ip = IntervalProd::new([-1.0, 0.0], [1.0, 4.0]).unwrap();
        assert_eq!(ip.ndim(), 2);
        assert_eq!(ip.extent(), vec![2.0, 4.0]);
        assert_eq!(ip.mid_pt(), vec![0.0, 2.0]);
        assert_eq!(ip.volume(), 8.0);
    }

    #[test]
    fn test_interval_prod_rejects_inverted_bounds() {
        assert!(IntervalProd::new([1.0], [0.0]).is_err());
        assert!(IntervalProd::new([0.0, 0.0], [1.0]).is_err());
        assert!(IntervalProd::new([f64::NAN], [1.0]).is_err());
    }

    #[test]
    fn test_partition_cells() {
        let part = RectPartition::uniform([-2.0, -1.0], [2.0, 1.0], [4, 2]).unwrap();
        assert_eq!(part.size(), 8);
        assert_eq!(part.cell_sides(), vec![1.0, 1.0]);
        assert_eq!(part.cell_volume(), 1.0);
        assert_eq!(part.points(0), vec![-1.5, -0.5, 0.5, 1.5]);
        assert_eq!(part.points(1), vec![-0.5, 0.5]);
    }

    #[test]
    fn test_partition_append() {
        let angles = RectPartition::uniform([0.0], [std::f64::consts::PI], [180]).unwrap();
        let det = RectPartition::uniform([-32.0], [32.0], [64]).unwrap();
        let joined = angles.append(&det);
        assert_eq!(joined.shape(), &[180, 64]);
        assert_eq!(joined.ndim(), 2);
        assert!((joined.domain().volume() - std::f64::consts::PI * 64.0).abs() < 1e-12);
    }

    #[test]
    fn test_partition_rejects_empty_axis() {
        assert!(RectPartition::uniform([0.0], [1.0], [0]).is_err());
        assert!(RectPartition::uniform([0.0], [0.0], [3]).is_err());
    }

    #[test]
    fn test_is_close() {
        assert!(is_close(1.0, 1.0 + 1e-9, 1e-5, 1e-8));
        assert!(!is_close(1.0, 1.1, 1e-5, 1e-8));
    }
}
