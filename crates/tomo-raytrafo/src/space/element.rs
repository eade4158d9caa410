//! Elements of discretized spaces

use crate::error::{RayTrafoError, Result};
use num_complex::Complex64;
use num_traits::Zero;

/// Sample storage of an [`Element`], row-major
#[derive(Debug, Clone, PartialEq)]
pub enum ElementData {
    Real(Vec<f64>),
    Complex(Vec<Complex64>),
}

/// A sampled function: shape plus real or complex samples
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    shape: Vec<usize>,
    data: ElementData,
}

impl Element {
    /// Real element from row-major samples.
    pub fn real(shape: impl Into<Vec<usize>>, data: Vec<f64>) -> Result<Self> {
        let shape = shape.into();
        check_len(&shape, data.len())?;
        Ok(Self {
            shape,
            data: ElementData::Real(data),
        })
    }

    /// Complex element from row-major samples.
    pub fn complex(shape: impl Into<Vec<usize>>, data: Vec<Complex64>) -> Result<Self> {
        let shape = shape.into();
        check_len(&shape, data.len())?;
        Ok(Self {
            shape,
            data: ElementData::Complex(data),
        })
    }

    pub fn zeros_real(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            data: ElementData::Real(vec![0.0; shape.iter().product()]),
        }
    }

    pub fn zeros_complex(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            data: ElementData::Complex(vec![Complex64::zero(); shape.iter().product()]),
        }
    }

    /// Combine real and imaginary parts of equal shape.
    pub fn from_parts(re: &Element, im: &Element) -> Result<Self> {
        if re.shape != im.shape {
            return Err(RayTrafoError::ShapeMismatch {
                name: "imag",
                expected: re.shape.clone(),
                actual: im.shape.clone(),
            });
        }
        let (re_data, im_data) = match (&re.data, &im.data) {
            (ElementData::Real(re_data), ElementData::Real(im_data)) => (re_data, im_data),
            _ => return Err(RayTrafoError::internal("complex parts must be real elements")),
        };
        let data = re_data
            .iter()
            .zip(im_data)
            .map(|(&a, &b)| Complex64::new(a, b))
            .collect();
        Ok(Self {
            shape: re.shape.clone(),
            data: ElementData::Complex(data),
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ElementData::Real(d) => d.len(),
            ElementData::Complex(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.data, ElementData::Complex(_))
    }

    pub fn data(&self) -> &ElementData {
        &self.data
    }

    pub fn as_real(&self) -> Option<&[f64]> {
        match &self.data {
            ElementData::Real(d) => Some(d),
            ElementData::Complex(_) => None,
        }
    }

    pub fn as_real_mut(&mut self) -> Option<&mut [f64]> {
        match &mut self.data {
            ElementData::Real(d) => Some(d),
            ElementData::Complex(_) => None,
        }
    }

    pub fn as_complex(&self) -> Option<&[Complex64]> {
        match &self.data {
            ElementData::Complex(d) => Some(d),
            ElementData::Real(_) => None,
        }
    }

    pub fn as_complex_mut(&mut self) -> Option<&mut [Complex64]> {
        match &mut self.data {
            ElementData::Complex(d) => Some(d),
            ElementData::Real(_) => None,
        }
    }

    /// Real part as a real element.
    pub fn real_part(&self) -> Element {
        let data = match &self.data {
            ElementData::Real(d) => d.clone(),
            ElementData::Complex(d) => d.iter().map(|z| z.re).collect(),
        };
        Element {
            shape: self.shape.clone(),
            data: ElementData::Real(data),
        }
    }

    /// Imaginary part as a real element (zeros for real elements).
    pub fn imag_part(&self) -> Element {
        let data = match &self.data {
            ElementData::Real(d) => vec![0.0; d.len()],
            ElementData::Complex(d) => d.iter().map(|z| z.im).collect(),
        };
        Element {
            shape: self.shape.clone(),
            data: ElementData::Real(data),
        }
    }

    /// Overwrite the real part with a real element of the same shape.
    pub fn set_real(&mut self, part: &Element) -> Result<()> {
        let src = self.part_source(part)?;
        match &mut self.data {
            ElementData::Real(d) => d.copy_from_slice(src),
            ElementData::Complex(d) => d.iter_mut().zip(src).for_each(|(z, &v)| z.re = v),
        }
        Ok(())
    }

    /// Overwrite the imaginary part. Fails for real elements.
    pub fn set_imag(&mut self, part: &Element) -> Result<()> {
        let src = self.part_source(part)?;
        match &mut self.data {
            ElementData::Complex(d) => {
                d.iter_mut().zip(src).for_each(|(z, &v)| z.im = v);
                Ok(())
            }
            ElementData::Real(_) => Err(RayTrafoError::internal("cannot set imaginary part of a real element")),
        }
    }

    /// Euclidean norm of the samples (no space weighting).
    pub fn norm(&self) -> f64 {
        match &self.data {
            ElementData::Real(d) => d.iter().map(|v| v * v).sum::<f64>().sqrt(),
            ElementData::Complex(d) => d.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt(),
        }
    }

    /// Largest absolute sample value.
    pub fn max_abs(&self) -> f64 {
        match &self.data {
            ElementData::Real(d) => d.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())),
            ElementData::Complex(d) => d.iter().fold(0.0_f64, |acc, z| acc.max(z.norm())),
        }
    }

    fn part_source<'a>(&self, part: &'a Element) -> Result<&'a [f64]> {
        if part.shape != self.shape {
            return Err(RayTrafoError::ShapeMismatch {
                name: "out",
                expected: self.shape.clone(),
                actual: part.shape.clone(),
            });
        }
        part.as_real()
            .ok_or_else(|| RayTrafoError::internal("element part must be real"))
    }
}

fn check_len(shape: &[usize], len: usize) -> Result<()> {
    let expected: usize = shape.iter().product();
    if expected != len {
        return Err(RayTrafoError::invalid_value(
            "data",
            format!("shape {shape:?} needs {expected} samples, got {len}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts_recombine() {
        let re = Element::real([2], vec![1.0, 2.0]).unwrap();
        let im = Element::real([2], vec![-1.0, 0.5]).unwrap();
        let z = Element::from_parts(&re, &im).unwrap();
        assert!(z.is_complex());
        assert_eq!(z.real_part(), re);
        assert_eq!(z.imag_part(), im);
    }

    #[test]
    fn test_set_parts() {
        let mut z = Element::zeros_complex(&[3]);
        z.set_real(&Element::real([3], vec![1.0, 2.0, 3.0]).unwrap()).unwrap();
        z.set_imag(&Element::real([3], vec![4.0, 5.0, 6.0]).unwrap()).unwrap();
        assert_eq!(z.as_complex().unwrap()[1], Complex64::new(2.0, 5.0));

        let mut x = Element::zeros_real(&[3]);
        assert!(x.set_imag(&Element::zeros_real(&[3])).is_err());
        assert!(x.set_real(&Element::zeros_real(&[4])).is_err());
    }

    #[test]
    fn test_length_checked() {
        assert!(Element::real([2, 2], vec![0.0; 3]).is_err());
        assert_eq!(Element::zeros_real(&[2, 3]).len(), 6);
    }

    #[test]
    fn test_norms() {
        let x = Element::real([2], vec![3.0, -4.0]).unwrap();
        assert_eq!(x.norm(), 5.0);
        assert_eq!(x.max_abs(), 4.0);
    }
}
