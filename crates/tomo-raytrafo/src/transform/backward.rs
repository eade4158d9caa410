use super::builder::TransformBuilder;
use super::settings::TransformSettings;
use super::{RayTransform, RayTransformBase};
use crate::error::Result;
use crate::geometry::Geometry;
use crate::space::DiscretizedSpace;
use std::sync::Arc;

/// Back-projection from a projection space to a reconstruction space
///
/// The reconstruction space is the *range* here. Construction validates it
/// exactly like [`RayTransform`] validates its domain.
#[derive(Debug, Clone)]
pub struct RayBackProjection {
    base: Arc<RayTransformBase>,
}

impl RayBackProjection {
    /// Back-projection onto `range` with the default backend and an inferred
    /// domain.
    pub fn new(range: DiscretizedSpace, geometry: impl Into<Arc<Geometry>>) -> Result<Self> {
        Self::builder(range, geometry).build()
    }

    pub fn builder(range: DiscretizedSpace, geometry: impl Into<Arc<Geometry>>) -> TransformBuilder<RayBackProjection> {
        TransformBuilder::new(range, geometry.into())
    }

    pub fn with_settings(
        range: DiscretizedSpace,
        geometry: impl Into<Arc<Geometry>>,
        settings: TransformSettings,
    ) -> Result<Self> {
        let base = RayTransformBase::new(range, geometry.into(), "backward", settings)?;
        Ok(Self::from_base(base))
    }
}

delegate_to_base!(RayBackProjection, adjoint = RayTransform);
