//! Ray transform operators
//!
//! [`RayTransform`] projects a reconstruction volume to a sinogram and
//! [`RayBackProjection`] maps back; each is the other's adjoint. Both are
//! cheap handles onto a shared [`RayTransformBase`].

use crate::error::Result;
use crate::space::{DiscretizedSpace, Element};

/// Linear operator between discretized spaces
pub trait Operator {
    type Adjoint: Operator;

    fn domain(&self) -> &DiscretizedSpace;

    fn range(&self) -> &DiscretizedSpace;

    /// Evaluate into a new element of the range.
    fn apply(&self, x: &Element) -> Result<Element>;

    /// Evaluate into an existing element of the range.
    fn apply_into(&self, x: &Element, out: &mut Element) -> Result<()>;

    fn adjoint(&self) -> Self::Adjoint;
}

/// Accessors and [`Operator`] impl shared by both transform handles.
macro_rules! delegate_to_base {
    ($handle:ident, adjoint = $adjoint:ident) => {
        impl $handle {
            pub(crate) fn from_base(base: std::sync::Arc<$crate::transform::RayTransformBase>) -> Self {
                Self { base }
            }

            /// Underlying direction-agnostic transform.
            pub fn base(&self) -> &std::sync::Arc<$crate::transform::RayTransformBase> {
                &self.base
            }

            pub fn geometry(&self) -> &std::sync::Arc<$crate::geometry::Geometry> {
                self.base.geometry()
            }

            pub fn backend(&self) -> $crate::backend::BackendId {
                self.base.backend()
            }

            pub fn use_cache(&self) -> bool {
                self.base.use_cache()
            }

            pub fn options(&self) -> &$crate::backend::BackendOptions {
                self.base.options()
            }

            pub fn advisories(&self) -> &[$crate::backend::Advisory] {
                self.base.advisories()
            }

            pub fn reco_space(&self) -> &$crate::space::DiscretizedSpace {
                self.base.reco_space()
            }

            pub fn proj_space(&self) -> &$crate::space::DiscretizedSpace {
                self.base.proj_space()
            }

            pub fn gpu_index(&self) -> usize {
                self.base.gpu_index()
            }

            /// Retarget to another device, dropping the cached engine and
            /// adjoint when the index changes.
            pub fn set_gpu_index(&self, gpu_index: usize) {
                self.base.set_gpu_index(gpu_index)
            }

            pub fn set_gpu_index_value(&self, value: &$crate::backend::OptionValue) -> $crate::error::Result<()> {
                self.base.set_gpu_index_value(value)
            }

            pub fn has_cached_adjoint(&self) -> bool {
                self.base.has_cached_adjoint()
            }

            pub fn has_cached_engine(&self) -> bool {
                self.base.has_cached_engine()
            }

            /// Same configuration, independent caches.
            pub fn replicate(&self) -> Self {
                Self::from_base(self.base.replicate())
            }

            /// Whether both handles refer to the same instance.
            pub fn is_same_instance(&self, other: &Self) -> bool {
                std::sync::Arc::ptr_eq(&self.base, &other.base)
            }
        }

        impl $crate::transform::Operator for $handle {
            type Adjoint = $adjoint;

            fn domain(&self) -> &$crate::space::DiscretizedSpace {
                self.base.domain()
            }

            fn range(&self) -> &$crate::space::DiscretizedSpace {
                self.base.range()
            }

            fn apply(&self, x: &$crate::space::Element) -> $crate::error::Result<$crate::space::Element> {
                self.base.apply(x)
            }

            fn apply_into(
                &self,
                x: &$crate::space::Element,
                out: &mut $crate::space::Element,
            ) -> $crate::error::Result<()> {
                self.base.apply_into(x, out)
            }

            fn adjoint(&self) -> Self::Adjoint {
                $adjoint::from_base(self.base.adjoint())
            }
        }
    };
}

mod backward;
mod base;
mod builder;
mod direction;
mod engine_cache;
mod forward;
mod settings;

pub use backward::RayBackProjection;
pub use base::RayTransformBase;
pub use builder::{TransformBuilder, TransformKind};
pub use direction::Direction;
pub use forward::RayTransform;
pub use settings::{TransformSettings, RESERVED_OPTIONS};

