//! Error types for ray transform construction and evaluation

use crate::backend::BackendId;
use crate::space::Dtype;
use std::fmt;

/// Result type for ray transform operations
pub type Result<T> = std::result::Result<T, RayTrafoError>;

/// Errors raised while building or evaluating a ray transform
///
/// Everything except [`RayTrafoError::Kernel`] is raised synchronously at
/// construction time or when an argument does not belong to the operator's
/// domain/range.
#[derive(Debug, thiserror::Error)]
pub enum RayTrafoError {
    /// Direction tag outside {forward, backward}
    #[error("variant {0:?} not understood, expected 'forward' or 'backward'")]
    InvalidDirection(String),

    /// Dynamically supplied argument has the wrong kind
    #[error("`{name}` must be {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// Argument has the right kind but an unusable value
    #[error("invalid value for `{name}`: {reason}")]
    InvalidValue { name: String, reason: String },

    /// Requested backend tag is not a known backend
    #[error("`impl` {0:?} not understood")]
    InvalidBackend(String),

    /// Requested backend is known but not usable in this process
    #[error("{0} back-end not available")]
    BackendNotAvailable(BackendId),

    /// No backend at all is usable in this process
    #[error("no ray transform back-end available; enable one of the `raycast-cpu`, `radon` or `cuda` features")]
    NoBackendAvailable,

    /// Geometry/space combination violates a backend's structural constraints
    #[error("{backend} back-end: {reason}")]
    UnsupportedGeometryForBackend { backend: BackendId, reason: String },

    /// Space dimensionality differs from geometry dimensionality
    #[error("`{name}.ndim` not equal to `geometry.ndim`: {space_ndim} != {geometry_ndim}")]
    DimensionMismatch {
        name: &'static str,
        space_ndim: usize,
        geometry_ndim: usize,
    },

    /// Shapes of two spaces or of an element and its space differ
    #[error("`{name}.shape` mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        name: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Data types of two spaces or of an element and its space differ
    #[error("`{name}.dtype` mismatch: expected {expected}, got {actual}")]
    DtypeMismatch {
        name: &'static str,
        expected: Dtype,
        actual: Dtype,
    },

    /// Reconstruction weighting cannot be carried over to the projection space
    #[error("unsupported weighting: {0}")]
    UnsupportedWeighting(String),

    /// Malformed partition or geometry parameters
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Failure reported by a projection kernel or device engine
    #[error("kernel error: {0}")]
    Kernel(String),

    /// A state construction-time validation should have excluded
    #[error("internal error: {0}")]
    Internal(String),
}

impl RayTrafoError {
    /// Create a type mismatch error
    pub fn type_mismatch(name: impl Into<String>, expected: impl fmt::Display, actual: impl fmt::Display) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported geometry error for `backend`
    pub fn unsupported_geometry(backend: BackendId, reason: impl Into<String>) -> Self {
        Self::UnsupportedGeometryForBackend {
            backend,
            reason: reason.into(),
        }
    }

    /// Create an invalid geometry error
    pub fn invalid_geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    /// Create a kernel error
    pub fn kernel(msg: impl Into<String>) -> Self {
        Self::Kernel(msg.into())
    }

    /// Create an internal consistency error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
