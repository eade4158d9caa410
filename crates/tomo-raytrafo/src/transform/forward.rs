use super::builder::TransformBuilder;
use super::settings::TransformSettings;
use super::{RayBackProjection, RayTransformBase};
use crate::error::Result;
use crate::geometry::Geometry;
use crate::space::DiscretizedSpace;
use std::sync::Arc;

/// Forward projection from a reconstruction space to a projection space
///
/// Clones share one instance, including its cached engine and adjoint. Use
/// [`replicate`](Self::replicate) for an independent copy.
#[derive(Debug, Clone)]
pub struct RayTransform {
    base: Arc<RayTransformBase>,
}

impl RayTransform {
    /// Forward transform with the default backend and an inferred range.
    pub fn new(domain: DiscretizedSpace, geometry: impl Into<Arc<Geometry>>) -> Result<Self> {
        Self::builder(domain, geometry).build()
    }

    pub fn builder(domain: DiscretizedSpace, geometry: impl Into<Arc<Geometry>>) -> TransformBuilder<RayTransform> {
        TransformBuilder::new(domain, geometry.into())
    }

    pub fn with_settings(
        domain: DiscretizedSpace,
        geometry: impl Into<Arc<Geometry>>,
        settings: TransformSettings,
    ) -> Result<Self> {
        let base = RayTransformBase::new(domain, geometry.into(), "forward", settings)?;
        Ok(Self::from_base(base))
    }
}

delegate_to_base!(RayTransform, adjoint = RayBackProjection);
