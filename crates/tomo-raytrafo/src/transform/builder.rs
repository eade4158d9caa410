use super::base::RayTransformBase;
use super::direction::Direction;
use super::settings::TransformSettings;
use super::{RayBackProjection, RayTransform};
use crate::backend::{BackendOptions, BackendRegistry, OptionValue};
use crate::error::Result;
use crate::geometry::Geometry;
use crate::space::DiscretizedSpace;
use std::marker::PhantomData;
use std::sync::Arc;

mod sealed {
    pub trait Sealed {}
}

/// Transform handle a [`TransformBuilder`] produces
pub trait TransformKind: sealed::Sealed + Sized {
    const DIRECTION: Direction;

    #[doc(hidden)]
    fn from_base(base: Arc<RayTransformBase>) -> Self;
}

impl sealed::Sealed for RayTransform {}
impl sealed::Sealed for RayBackProjection {}

impl TransformKind for RayTransform {
    const DIRECTION: Direction = Direction::Forward;

    fn from_base(base: Arc<RayTransformBase>) -> Self {
        RayTransform::from_base(base)
    }
}

impl TransformKind for RayBackProjection {
    const DIRECTION: Direction = Direction::Backward;

    fn from_base(base: Arc<RayTransformBase>) -> Self {
        RayBackProjection::from_base(base)
    }
}

/// Builder for [`RayTransform`] and [`RayBackProjection`]
///
/// ```no_run
/// use tomo_raytrafo::{DiscretizedSpace, Dtype, Parallel2dGeometry, RayTransform};
///
/// let reco = DiscretizedSpace::uniform([-1.0, -1.0], [1.0, 1.0], [64, 64], Dtype::Float32)?;
/// let geometry = Parallel2dGeometry::uniform(180, -1.5, 1.5, 96)?;
/// let op = RayTransform::builder(reco, geometry)
///     .backend("raycast_cpu")
///     .option("samples_per_cell", 4i64)
///     .build()?;
/// # Ok::<(), tomo_raytrafo::RayTrafoError>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct TransformBuilder<T> {
    reco_space: DiscretizedSpace,
    geometry: Arc<Geometry>,
    settings: TransformSettings,
    _kind: PhantomData<fn() -> T>,
}

impl<T: TransformKind> TransformBuilder<T> {
    pub(crate) fn new(reco_space: DiscretizedSpace, geometry: Arc<Geometry>) -> Self {
        Self {
            reco_space,
            geometry,
            settings: TransformSettings::default(),
            _kind: PhantomData,
        }
    }

    /// Backend tag, e.g. `"radon"`.
    pub fn backend(mut self, tag: impl Into<String>) -> Self {
        self.settings.backend = Some(tag.into());
        self
    }

    /// Projection space to use instead of the inferred one.
    pub fn opposite_space(mut self, space: DiscretizedSpace) -> Self {
        self.settings.opposite_space = Some(space);
        self
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.settings.use_cache = use_cache;
        self
    }

    pub fn gpu_index(mut self, gpu_index: usize) -> Self {
        self.settings.gpu_index = gpu_index;
        self
    }

    /// Extra kernel option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.settings.options.insert(key.into(), value.into());
        self
    }

    /// Merge a dynamic option map, interpreting `impl`, `use_cache` and
    /// `gpu_index`.
    pub fn options(mut self, options: BackendOptions) -> Result<Self> {
        self.settings.absorb(options)?;
        Ok(self)
    }

    /// Resolve backends in `registry` instead of the process-wide one.
    pub fn registry(mut self, registry: Arc<BackendRegistry>) -> Self {
        self.settings.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<T> {
        let base = RayTransformBase::new(self.reco_space, self.geometry, T::DIRECTION.as_str(), self.settings)?;
        Ok(T::from_base(base))
    }
}

impl TransformBuilder<RayTransform> {
    /// Alias of [`opposite_space`](Self::opposite_space).
    pub fn range(self, space: DiscretizedSpace) -> Self {
        self.opposite_space(space)
    }
}

impl TransformBuilder<RayBackProjection> {
    /// Alias of [`opposite_space`](Self::opposite_space).
    pub fn domain(self, space: DiscretizedSpace) -> Self {
        self.opposite_space(space)
    }
}
