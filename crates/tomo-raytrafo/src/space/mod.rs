//! Discretized function spaces
//!
//! A [`DiscretizedSpace`] samples functions on a uniform [`RectPartition`]
//! with a declared [`Dtype`] and an inner-product [`Weighting`]. Ray
//! transforms map between a reconstruction space (the imaged volume) and a
//! projection space (the sinogram), both of this type.

mod dtype;
mod element;
mod partition;

pub use dtype::{Dtype, ScalarField, Weighting};
pub use element::{Element, ElementData};
pub use partition::{IntervalProd, RectPartition};

pub(crate) use partition::is_close;

use crate::error::{RayTrafoError, Result};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Discretized function space over a uniform partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscretizedSpace {
    partition: RectPartition,
    dtype: Dtype,
    weighting: Weighting,
    axis_labels: Option<Vec<String>>,
}

impl DiscretizedSpace {
    /// Space over `partition`, weighted by the cell volume.
    ///
    /// The cell-volume weighting makes inner products approximate the L²
    /// integral over the partition domain.
    pub fn new(partition: RectPartition, dtype: Dtype) -> Self {
        let weighting = Weighting::Const(partition.cell_volume());
        Self {
            partition,
            dtype,
            weighting,
            axis_labels: None,
        }
    }

    /// Cell-volume weighted space over `[min_pt, max_pt]` with `shape` cells.
    pub fn uniform(
        min_pt: impl Into<Vec<f64>>,
        max_pt: impl Into<Vec<f64>>,
        shape: impl Into<Vec<usize>>,
        dtype: Dtype,
    ) -> Result<Self> {
        Ok(Self::new(RectPartition::uniform(min_pt, max_pt, shape)?, dtype))
    }

    /// Replace the weighting.
    pub fn with_weighting(mut self, weighting: Weighting) -> Result<Self> {
        weighting.validate(self.size())?;
        self.weighting = weighting;
        Ok(self)
    }

    /// Replace the axis labels. Label count must match `ndim` when given.
    pub fn with_axis_labels(mut self, labels: Option<Vec<String>>) -> Result<Self> {
        if let Some(labels) = &labels {
            if labels.len() != self.ndim() {
                return Err(RayTrafoError::invalid_value(
                    "axis_labels",
                    format!("expected {} labels, got {}", self.ndim(), labels.len()),
                ));
            }
        }
        self.axis_labels = labels;
        Ok(self)
    }

    pub fn partition(&self) -> &RectPartition {
        &self.partition
    }

    pub fn domain(&self) -> &IntervalProd {
        self.partition.domain()
    }

    pub fn shape(&self) -> &[usize] {
        self.partition.shape()
    }

    pub fn ndim(&self) -> usize {
        self.partition.ndim()
    }

    pub fn size(&self) -> usize {
        self.partition.size()
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn weighting(&self) -> &Weighting {
        &self.weighting
    }

    pub fn axis_labels(&self) -> Option<&[String]> {
        self.axis_labels.as_deref()
    }

    pub fn cell_volume(&self) -> f64 {
        self.partition.cell_volume()
    }

    pub fn cell_sides(&self) -> Vec<f64> {
        self.partition.cell_sides()
    }

    pub fn is_weighted(&self) -> bool {
        self.weighting.is_weighted()
    }

    pub fn is_real(&self) -> bool {
        self.dtype.is_real()
    }

    pub fn is_complex(&self) -> bool {
        self.dtype.is_complex()
    }

    /// Same space with the real counterpart of its dtype.
    pub fn real_space(&self) -> DiscretizedSpace {
        DiscretizedSpace {
            dtype: self.dtype.real_dtype(),
            ..self.clone()
        }
    }

    /// Same space with the complex counterpart of its dtype.
    pub fn complex_space(&self) -> DiscretizedSpace {
        DiscretizedSpace {
            dtype: self.dtype.complex_dtype(),
            ..self.clone()
        }
    }

    /// The zero element.
    pub fn zero(&self) -> Element {
        if self.is_complex() {
            Element::zeros_complex(self.shape())
        } else {
            Element::zeros_real(self.shape())
        }
    }

    /// Element from real samples; promoted to complex in complex spaces.
    pub fn element_from_real(&self, data: Vec<f64>) -> Result<Element> {
        let el = Element::real(self.shape(), data)?;
        if self.is_complex() {
            Element::from_parts(&el, &Element::zeros_real(self.shape()))
        } else {
            Ok(el)
        }
    }

    /// Element from complex samples. Fails in real spaces.
    pub fn element_from_complex(&self, data: Vec<Complex64>) -> Result<Element> {
        if self.is_real() {
            return Err(RayTrafoError::DtypeMismatch {
                name: "element",
                expected: self.dtype,
                actual: self.dtype.complex_dtype(),
            });
        }
        Element::complex(self.shape(), data)
    }

    /// Sample `f` at the cell midpoints.
    pub fn element_from_fn(&self, f: impl Fn(&[f64]) -> f64) -> Result<Element> {
        let points: Vec<Vec<f64>> = (0..self.ndim()).map(|axis| self.partition.points(axis)).collect();
        let mut coords = vec![0.0; self.ndim()];
        let data = (0..self.size())
            .map(|flat| {
                let mut rem = flat;
                for axis in (0..self.ndim()).rev() {
                    let n = self.shape()[axis];
                    coords[axis] = points[axis][rem % n];
                    rem /= n;
                }
                f(&coords)
            })
            .collect();
        self.element_from_real(data)
    }

    /// Whether `x` has this space's shape and scalar field.
    pub fn contains(&self, x: &Element) -> bool {
        x.shape() == self.shape() && x.is_complex() == self.is_complex()
    }

    /// Check membership, naming the argument in the error.
    pub fn check_element(&self, x: &Element, name: &'static str) -> Result<()> {
        if x.shape() != self.shape() {
            return Err(RayTrafoError::ShapeMismatch {
                name,
                expected: self.shape().to_vec(),
                actual: x.shape().to_vec(),
            });
        }
        if x.is_complex() != self.is_complex() {
            let actual = if x.is_complex() {
                self.dtype.complex_dtype()
            } else {
                self.dtype.real_dtype()
            };
            return Err(RayTrafoError::DtypeMismatch {
                name,
                expected: self.dtype,
                actual,
            });
        }
        Ok(())
    }

    /// Weighted inner product `Σ w_i x_i conj(y_i)`.
    pub fn inner(&self, x: &Element, y: &Element) -> Result<Complex64> {
        self.check_element(x, "x")?;
        self.check_element(y, "y")?;
        let sum = match (x.data(), y.data()) {
            (ElementData::Real(a), ElementData::Real(b)) => Complex64::new(
                a.iter()
                    .zip(b)
                    .enumerate()
                    .map(|(i, (a, b))| self.weighting.weight(i) * a * b)
                    .sum(),
                0.0,
            ),
            (ElementData::Complex(a), ElementData::Complex(b)) => a
                .iter()
                .zip(b)
                .enumerate()
                .map(|(i, (a, b))| a * b.conj() * self.weighting.weight(i))
                .sum(),
            _ => return Err(RayTrafoError::internal("inner product of mixed real/complex elements")),
        };
        Ok(sum)
    }

    /// Norm induced by [`DiscretizedSpace::inner`].
    pub fn norm(&self, x: &Element) -> Result<f64> {
        Ok(self.inner(x, x)?.re.max(0.0).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(n: usize, dtype: Dtype) -> DiscretizedSpace {
        DiscretizedSpace::uniform([-1.0, -1.0], [1.0, 1.0], [n, n], dtype).unwrap()
    }

    #[test]
    fn test_default_weighting_is_cell_volume() {
        let space = square(4, Dtype::Float32);
        assert_eq!(space.weighting(), &Weighting::Const(0.25));
        assert!(space.is_weighted());
        assert_eq!(space.size(), 16);
    }

    #[test]
    fn test_real_and_complex_counterparts() {
        let space = square(2, Dtype::Complex64);
        assert_eq!(space.real_space().dtype(), Dtype::Float32);
        assert_eq!(space.real_space().complex_space(), space);
        assert!(space.zero().is_complex());
    }

    #[test]
    fn test_element_from_fn_samples_midpoints() {
        let space = DiscretizedSpace::uniform([0.0, 0.0], [2.0, 4.0], [2, 2], Dtype::Float64).unwrap();
        let x = space.element_from_fn(|p| p[0] * 10.0 + p[1]).unwrap();
        assert_eq!(x.as_real().unwrap(), &[6.0, 8.0, 16.0, 18.0]);
    }

    #[test]
    fn test_inner_uses_weighting() {
        let space = square(2, Dtype::Float64);
        let one = space.element_from_real(vec![1.0; 4]).unwrap();
        let inner = space.inner(&one, &one).unwrap();
        assert!((inner.re - 4.0).abs() < 1e-12);
        assert!((space.norm(&one).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_check_element_errors() {
        let space = square(2, Dtype::Float32);
        let wrong_shape = Element::zeros_real(&[3, 2]);
        assert!(matches!(
            space.check_element(&wrong_shape, "x"),
            Err(RayTrafoError::ShapeMismatch { .. })
        ));
        let complex = Element::zeros_complex(&[2, 2]);
        assert!(matches!(
            space.check_element(&complex, "x"),
            Err(RayTrafoError::DtypeMismatch { .. })
        ));
    }

    #[test]
    fn test_axis_label_count_checked() {
        let space = square(2, Dtype::Float32);
        assert!(space.clone().with_axis_labels(Some(vec!["x".into()])).is_err());
        let labelled = space.with_axis_labels(Some(vec!["x".into(), "y".into()])).unwrap();
        assert_eq!(labelled.axis_labels().unwrap()[1], "y");
    }
}
