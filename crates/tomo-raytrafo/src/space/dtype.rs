//! Scalar data types and weightings of discretized spaces

use crate::error::{RayTrafoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scalar field of a space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarField {
    Real,
    Complex,
}

/// Declared scalar type of a space
///
/// Element storage is always `f64` or `Complex<f64>`; the dtype records the
/// precision a caller asked for and drives real/complex dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Float32,
    Float64,
    Complex64,
    Complex128,
}

impl Dtype {
    pub fn field(self) -> ScalarField {
        match self {
            Dtype::Float32 | Dtype::Float64 => ScalarField::Real,
            Dtype::Complex64 | Dtype::Complex128 => ScalarField::Complex,
        }
    }

    pub fn is_real(self) -> bool {
        self.field() == ScalarField::Real
    }

    pub fn is_complex(self) -> bool {
        self.field() == ScalarField::Complex
    }

    /// Real counterpart of the same precision (`complex64 -> float32`).
    pub fn real_dtype(self) -> Dtype {
        match self {
            Dtype::Float32 | Dtype::Complex64 => Dtype::Float32,
            Dtype::Float64 | Dtype::Complex128 => Dtype::Float64,
        }
    }

    /// Complex counterpart of the same precision (`float64 -> complex128`).
    pub fn complex_dtype(self) -> Dtype {
        match self {
            Dtype::Float32 | Dtype::Complex64 => Dtype::Complex64,
            Dtype::Float64 | Dtype::Complex128 => Dtype::Complex128,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dtype::Float32 => "float32",
            Dtype::Float64 => "float64",
            Dtype::Complex64 => "complex64",
            Dtype::Complex128 => "complex128",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dtype {
    type Err = RayTrafoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "float32" | "f32" => Ok(Dtype::Float32),
            "float64" | "f64" | "float" => Ok(Dtype::Float64),
            "complex64" | "c64" => Ok(Dtype::Complex64),
            "complex128" | "c128" | "complex" => Ok(Dtype::Complex128),
            _ => Err(RayTrafoError::invalid_value("dtype", format!("{s:?} is not a supported dtype"))),
        }
    }
}

/// Weighting of the inner product of a discretized space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Weighting {
    /// Plain Euclidean inner product
    None,
    /// Every sample weighted by the same constant
    Const(f64),
    /// One weight per sample, row-major
    Array(Vec<f64>),
}

impl Weighting {
    pub fn is_weighted(&self) -> bool {
        !matches!(self, Weighting::None)
    }

    /// The constant for [`Weighting::Const`].
    pub fn constant(&self) -> Option<f64> {
        match self {
            Weighting::Const(c) => Some(*c),
            _ => None,
        }
    }

    /// Weight of sample `index`.
    pub fn weight(&self, index: usize) -> f64 {
        match self {
            Weighting::None => 1.0,
            Weighting::Const(c) => *c,
            Weighting::Array(w) => w[index],
        }
    }

    /// Multiply `data` by the weights in place.
    pub fn apply(&self, data: &mut [f64]) {
        match self {
            Weighting::None => {}
            Weighting::Const(c) => data.iter_mut().for_each(|v| *v *= c),
            Weighting::Array(w) => data.iter_mut().zip(w).for_each(|(v, w)| *v *= w),
        }
    }

    /// Divide `data` by the weights in place.
    pub fn apply_inverse(&self, data: &mut [f64]) {
        match self {
            Weighting::None => {}
            Weighting::Const(c) => data.iter_mut().for_each(|v| *v /= c),
            Weighting::Array(w) => data.iter_mut().zip(w).for_each(|(v, w)| *v /= w),
        }
    }

    pub(crate) fn validate(&self, size: usize) -> Result<()> {
        match self {
            Weighting::None => Ok(()),
            Weighting::Const(c) if c.is_finite() && *c > 0.0 => Ok(()),
            Weighting::Const(c) => Err(RayTrafoError::invalid_value(
                "weighting",
                format!("constant must be positive and finite, got {c}"),
            )),
            Weighting::Array(w) if w.len() != size => Err(RayTrafoError::invalid_value(
                "weighting",
                format!("expected {size} weights, got {}", w.len()),
            )),
            Weighting::Array(w) if w.iter().any(|v| !v.is_finite() || *v <= 0.0) => Err(
                RayTrafoError::invalid_value("weighting", "array weights must be positive and finite"),
            ),
            Weighting::Array(_) => Ok(()),
        }
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weighting::None => f.write_str("none"),
            Weighting::Const(c) => write!(f, "const({c})"),
            Weighting::Array(w) => write!(f, "array(len={})", w.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_counterparts() {
        assert_eq!(Dtype::Complex64.real_dtype(), Dtype::Float32);
        assert_eq!(Dtype::Float64.complex_dtype(), Dtype::Complex128);
        assert!(Dtype::Float32.is_real());
        assert!(Dtype::Complex128.is_complex());
    }

    #[test]
    fn test_dtype_parse() {
        assert_eq!("Float32".parse::<Dtype>().unwrap(), Dtype::Float32);
        assert_eq!("complex".parse::<Dtype>().unwrap(), Dtype::Complex128);
        assert!("int8".parse::<Dtype>().is_err());
    }

    #[test]
    fn test_weighting_apply_roundtrip() {
        let w = Weighting::Array(vec![2.0, 4.0]);
        let mut data = vec![1.0, 1.0];
        w.apply(&mut data);
        assert_eq!(data, vec![2.0, 4.0]);
        w.apply_inverse(&mut data);
        assert_eq!(data, vec![1.0, 1.0]);
    }

    #[test]
    fn test_weighting_validation() {
        assert!(Weighting::Const(0.0).validate(4).is_err());
        assert!(Weighting::Array(vec![1.0; 3]).validate(4).is_err());
        assert!(Weighting::Const(0.5).validate(4).is_ok());
    }
}
