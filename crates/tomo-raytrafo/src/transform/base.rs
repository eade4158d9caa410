//! Shared construction, validation and dispatch of ray transforms
//!
//! ```text
//! new(reco_space, geometry, variant, settings)
//!   ├── parse direction                 InvalidDirection
//!   ├── resolve backend in registry     InvalidBackend / BackendNotAvailable / NoBackendAvailable
//!   ├── backend sanity checks           UnsupportedGeometryForBackend (+ advisories)
//!   ├── reco ndim == geometry ndim      DimensionMismatch
//!   ├── infer or validate proj space    UnsupportedWeighting / ShapeMismatch / DtypeMismatch
//!   └── ready: Arc<TransformConfig> shared with every adjoint and replica
//! ```
//!
//! After construction only the GPU index changes. Changing it clears the
//! cached engine and unpairs the transform from its adjoint, so neither side
//! hands out a partner on another device.

use super::direction::Direction;
use super::engine_cache::EngineCell;
use super::settings::{gpu_index_from, TransformSettings};
use crate::backend::{
    Advisory, BackendId, BackendOptions, BackendProvider, BackendRegistry, Capability, KernelArgs, OptionValue,
    ProjectionEngine,
};
use crate::error::{RayTrafoError, Result};
use crate::geometry::{AcquisitionGeometry, Geometry, Parallel3dAxisGeometry};
use crate::inference::{infer_projection_space, validate_projection_space};
use crate::space::{is_close, DiscretizedSpace, Element};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

/// Tolerance for a detector midpoint line of sight counting as
/// perpendicular to the rotation axis
const PERPENDICULAR_TOL: f64 = 1e-4;

/// Validated, immutable configuration shared by a transform, its adjoint and
/// its replicas
#[derive(Debug)]
pub(crate) struct TransformConfig {
    geometry: Arc<Geometry>,
    backend: BackendId,
    provider: BackendProvider,
    reco_space: DiscretizedSpace,
    proj_space: DiscretizedSpace,
    reco_real: DiscretizedSpace,
    proj_real: DiscretizedSpace,
    use_cache: bool,
    options: BackendOptions,
    registry: Arc<BackendRegistry>,
    advisories: Vec<Advisory>,
}

/// Link from a transform to its adjoint
///
/// A lazily built adjoint is owned by the transform that built it and
/// points back weakly, so `F.adjoint().adjoint()` is `F` without a cycle.
#[derive(Debug)]
enum AdjointLink {
    Empty,
    Owned(Arc<RayTransformBase>),
    Parent(Weak<RayTransformBase>),
}

impl AdjointLink {
    fn upgrade(&self) -> Option<Arc<RayTransformBase>> {
        match self {
            AdjointLink::Empty => None,
            AdjointLink::Owned(adjoint) => Some(Arc::clone(adjoint)),
            AdjointLink::Parent(parent) => parent.upgrade(),
        }
    }

    fn points_to(&self, target: &RayTransformBase) -> bool {
        match self {
            AdjointLink::Empty => false,
            AdjointLink::Owned(adjoint) => std::ptr::eq(Arc::as_ptr(adjoint), target),
            AdjointLink::Parent(parent) => std::ptr::eq(parent.as_ptr(), target),
        }
    }
}

#[derive(Debug)]
struct InstanceState {
    gpu_index: usize,
    engine: EngineCell,
    adjoint: AdjointLink,
}

/// Direction-agnostic ray transform
///
/// [`RayTransform`](super::RayTransform) and
/// [`RayBackProjection`](super::RayBackProjection) are thin handles around
/// an `Arc<RayTransformBase>`.
pub struct RayTransformBase {
    direction: Direction,
    config: Arc<TransformConfig>,
    state: Mutex<InstanceState>,
}

impl fmt::Debug for RayTransformBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RayTransformBase")
            .field("direction", &self.direction)
            .field("backend", &self.config.backend)
            .field("geometry", &self.config.geometry.kind())
            .field("reco_shape", &self.config.reco_space.shape())
            .field("proj_shape", &self.config.proj_space.shape())
            .field("gpu_index", &self.gpu_index())
            .finish()
    }
}

impl RayTransformBase {
    /// Validate and build a transform.
    ///
    /// `reco_space` is always the reconstruction side; `variant` is
    /// `"forward"` or `"backward"` (case-insensitive).
    pub fn new(
        reco_space: DiscretizedSpace,
        geometry: Arc<Geometry>,
        variant: &str,
        settings: TransformSettings,
    ) -> Result<Arc<Self>> {
        let direction: Direction = variant.parse()?;
        let (reco_name, proj_name) = direction.space_names();

        let registry = settings.registry.unwrap_or_else(BackendRegistry::global);
        let (backend, provider, mut advisories) =
            registry.resolve(settings.backend.as_deref(), &reco_space, &geometry)?;

        advisories.extend(check_backend_constraints(backend, &registry, &reco_space, &geometry, reco_name)?);

        if reco_space.ndim() != geometry.ndim() {
            return Err(RayTrafoError::DimensionMismatch {
                name: reco_name,
                space_ndim: reco_space.ndim(),
                geometry_ndim: geometry.ndim(),
            });
        }

        let proj_space = match settings.opposite_space {
            Some(space) => {
                validate_projection_space(&space, &reco_space, &geometry, proj_name)?;
                space
            }
            None => infer_projection_space(&reco_space, &geometry)?,
        };

        for advisory in &advisories {
            tracing::warn!(backend = %backend, "{advisory}");
        }
        tracing::debug!(
            direction = %direction,
            backend = %backend,
            geometry = geometry.kind(),
            reco_shape = ?reco_space.shape(),
            proj_shape = ?proj_space.shape(),
            use_cache = settings.use_cache,
            gpu_index = settings.gpu_index,
            "ray transform constructed"
        );

        let config = TransformConfig {
            reco_real: reco_space.real_space(),
            proj_real: proj_space.real_space(),
            geometry,
            backend,
            provider,
            reco_space,
            proj_space,
            use_cache: settings.use_cache,
            options: settings.options,
            registry,
            advisories,
        };
        Ok(Arc::new(Self::from_config(direction, Arc::new(config), settings.gpu_index, AdjointLink::Empty)))
    }

    fn from_config(direction: Direction, config: Arc<TransformConfig>, gpu_index: usize, adjoint: AdjointLink) -> Self {
        Self {
            direction,
            config,
            state: Mutex::new(InstanceState {
                gpu_index,
                engine: EngineCell::default(),
                adjoint,
            }),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn geometry(&self) -> &Arc<Geometry> {
        &self.config.geometry
    }

    pub fn backend(&self) -> BackendId {
        self.config.backend
    }

    pub fn use_cache(&self) -> bool {
        self.config.use_cache
    }

    /// Extra kernel options retained from construction.
    pub fn options(&self) -> &BackendOptions {
        &self.config.options
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.config.registry
    }

    /// Advisories raised during construction.
    pub fn advisories(&self) -> &[Advisory] {
        &self.config.advisories
    }

    pub fn reco_space(&self) -> &DiscretizedSpace {
        &self.config.reco_space
    }

    pub fn proj_space(&self) -> &DiscretizedSpace {
        &self.config.proj_space
    }

    pub fn domain(&self) -> &DiscretizedSpace {
        match self.direction {
            Direction::Forward => &self.config.reco_space,
            Direction::Backward => &self.config.proj_space,
        }
    }

    pub fn range(&self) -> &DiscretizedSpace {
        match self.direction {
            Direction::Forward => &self.config.proj_space,
            Direction::Backward => &self.config.reco_space,
        }
    }

    pub fn gpu_index(&self) -> usize {
        self.state.lock().gpu_index
    }

    /// Change the target device.
    ///
    /// A different index drops the cached engine and unpairs this instance
    /// from its adjoint on both sides; the same index is a no-op.
    pub fn set_gpu_index(&self, gpu_index: usize) {
        let previous = {
            let mut state = self.state.lock();
            if state.gpu_index == gpu_index {
                return;
            }
            tracing::debug!(
                direction = %self.direction,
                old = state.gpu_index,
                new = gpu_index,
                "gpu index changed, dropping cached engine and adjoint"
            );
            state.gpu_index = gpu_index;
            state.engine.clear();
            std::mem::replace(&mut state.adjoint, AdjointLink::Empty)
        };
        // Never hold both instance locks at once.
        if let Some(counterpart) = previous.upgrade() {
            counterpart.unlink(self);
        }
    }

    /// Forget the adjoint link if it refers to `counterpart`.
    fn unlink(&self, counterpart: &RayTransformBase) {
        let mut state = self.state.lock();
        if state.adjoint.points_to(counterpart) {
            state.adjoint = AdjointLink::Empty;
        }
    }

    /// [`set_gpu_index`](Self::set_gpu_index) from a dynamically typed value.
    pub fn set_gpu_index_value(&self, value: &OptionValue) -> Result<()> {
        self.set_gpu_index(gpu_index_from(value)?);
        Ok(())
    }

    pub fn has_cached_adjoint(&self) -> bool {
        self.state.lock().adjoint.upgrade().is_some()
    }

    pub fn has_cached_engine(&self) -> bool {
        self.state.lock().engine.is_populated()
    }

    /// Opposite-direction transform over the same configuration, built on
    /// first access and cached until the GPU index changes.
    pub fn adjoint(self: &Arc<Self>) -> Arc<RayTransformBase> {
        let mut state = self.state.lock();
        if let Some(adjoint) = state.adjoint.upgrade() {
            return adjoint;
        }

        let adjoint = Arc::new(Self::from_config(
            self.direction.opposite(),
            Arc::clone(&self.config),
            state.gpu_index,
            AdjointLink::Parent(Arc::downgrade(self)),
        ));
        tracing::debug!(
            direction = %adjoint.direction,
            backend = %self.config.backend,
            gpu_index = state.gpu_index,
            "adjoint built"
        );
        state.adjoint = AdjointLink::Owned(Arc::clone(&adjoint));
        adjoint
    }

    /// Independent instance with the same configuration and empty caches.
    pub fn replicate(&self) -> Arc<RayTransformBase> {
        Arc::new(Self::from_config(
            self.direction,
            Arc::clone(&self.config),
            self.gpu_index(),
            AdjointLink::Empty,
        ))
    }

    /// Evaluate into a new element of [`range`](Self::range).
    pub fn apply(&self, x: &Element) -> Result<Element> {
        let mut out = self.range().zero();
        self.apply_into(x, &mut out)?;
        Ok(out)
    }

    /// Evaluate into `out`.
    ///
    /// Complex data is projected part by part with the real kernel.
    pub fn apply_into(&self, x: &Element, out: &mut Element) -> Result<()> {
        self.domain().check_element(x, "x")?;
        self.range().check_element(out, "out")?;

        let _span = tomo_tracing::perf_span!(
            "ray_transform_apply",
            direction = self.direction.as_str(),
            backend = self.config.backend.as_str()
        );

        if self.domain().is_real() {
            let input = x
                .as_real()
                .ok_or_else(|| RayTrafoError::internal("complex element in a real domain"))?;
            let output = out
                .as_real_mut()
                .ok_or_else(|| RayTrafoError::internal("complex element in a real range"))?;
            return self.call_real(input, output);
        }

        let range_shape = self.range().shape().to_vec();
        let mut parts = Vec::with_capacity(2);
        for part in [x.real_part(), x.imag_part()] {
            let mut result = Element::zeros_real(&range_shape);
            let input = part
                .as_real()
                .ok_or_else(|| RayTrafoError::internal("element part is not real"))?;
            let output = result
                .as_real_mut()
                .ok_or_else(|| RayTrafoError::internal("element part is not real"))?;
            self.call_real(input, output)?;
            parts.push(result);
        }
        out.set_real(&parts[0])?;
        out.set_imag(&parts[1])?;
        Ok(())
    }

    /// Real-valued kernel dispatch on the provider resolved at construction.
    fn call_real(&self, input: &[f64], out: &mut [f64]) -> Result<()> {
        let config = &self.config;
        match &config.provider {
            BackendProvider::Stateless(kernel) => {
                let args = KernelArgs {
                    geometry: &config.geometry,
                    reco_space: &config.reco_real,
                    proj_space: &config.proj_real,
                    options: &config.options,
                };
                match self.direction {
                    Direction::Forward => kernel.forward(&args, input, out),
                    Direction::Backward => kernel.backward(&args, input, out),
                }
            }
            BackendProvider::Engine(_) => {
                let engine = self.engine()?;
                match self.direction {
                    Direction::Forward => engine.forward(input, out, &config.options),
                    Direction::Backward => engine.backward(input, out, &config.options),
                }
            }
        }
    }

    /// Engine for the current GPU index.
    ///
    /// A cached engine is built once under the instance lock; uncached
    /// engines are built without it so concurrent calls do not queue on
    /// device setup.
    fn engine(&self) -> Result<Arc<dyn ProjectionEngine>> {
        if !self.config.use_cache {
            return self.build_engine(self.gpu_index());
        }
        let mut state = self.state.lock();
        let gpu_index = state.gpu_index;
        state.engine.get_or_build(|| self.build_engine(gpu_index))
    }

    fn build_engine(&self, gpu_index: usize) -> Result<Arc<dyn ProjectionEngine>> {
        let config = &self.config;
        let BackendProvider::Engine(factory) = &config.provider else {
            return Err(RayTrafoError::internal(format!("{} back-end has no engine", config.backend)));
        };
        let _span = tomo_tracing::perf_span!("engine_build", backend = config.backend.as_str(), gpu_index = gpu_index);
        tracing::debug!(backend = %config.backend, gpu_index, cached = config.use_cache, "building projection engine");
        factory.build(&config.geometry, &config.reco_real, &config.proj_real, gpu_index)
    }
}

/// Structural constraints of each backend; returns non-fatal advisories.
fn check_backend_constraints(
    backend: BackendId,
    registry: &BackendRegistry,
    reco_space: &DiscretizedSpace,
    geometry: &Geometry,
    reco_name: &str,
) -> Result<Vec<Advisory>> {
    let mut advisories = Vec::new();
    match backend {
        BackendId::RaycastCpu | BackendId::RaycastCuda => {
            if backend == BackendId::RaycastCpu && geometry.ndim() > 2 {
                return Err(RayTrafoError::unsupported_geometry(
                    backend,
                    format!("only works for 2d geometries, got ndim {}", geometry.ndim()),
                ));
            }
            if let Some(axis_geometry) = geometry.as_parallel_3d_axis() {
                if !registry.supports(Capability::Par3dDetMidPtPerpToAxis) {
                    advisories.extend(perpendicular_midpoint_advisory(axis_geometry, registry));
                }
            }
        }
        BackendId::Radon => check_radon(reco_space, geometry, reco_name)?,
    }
    Ok(advisories)
}

/// First angle whose detector midpoint line of sight is perpendicular to the
/// rotation axis.
fn perpendicular_midpoint_advisory(geometry: &Parallel3dAxisGeometry, registry: &BackendRegistry) -> Option<Advisory> {
    let axis = geometry.axis();
    let mid_pt = geometry.det_mid_pt();
    geometry.angles()?.into_iter().enumerate().find_map(|(angle_index, angle)| {
        let det_to_src = geometry.det_to_src(angle, &mid_pt);
        (axis.dot(&det_to_src).abs() < PERPENDICULAR_TOL).then(|| {
            Advisory::PerpendicularDetectorMidpoint {
                angle_index,
                det_to_src: det_to_src.into(),
                axis: axis.into(),
                library_version: registry.library_version(),
                required: BackendRegistry::versions_supporting(Capability::Par3dDetMidPtPerpToAxis),
            }
        })
    })
}

fn check_radon(reco_space: &DiscretizedSpace, geometry: &Geometry, reco_name: &str) -> Result<()> {
    let backend = BackendId::Radon;
    if geometry.as_parallel_2d().is_none() {
        return Err(RayTrafoError::unsupported_geometry(
            backend,
            format!("only supports 2d parallel geometries, got {}", geometry.kind()),
        ));
    }

    let mid_pt = reco_space.domain().mid_pt();
    if !mid_pt.iter().all(|&m| is_close(m, 0.0, 1e-5, 1e-8)) {
        return Err(RayTrafoError::unsupported_geometry(
            backend,
            format!("`{reco_name}` must be centered at (0, 0), got midpoint {mid_pt:?}"),
        ));
    }

    if let [n0, n1] = reco_space.shape() {
        if n0 != n1 {
            return Err(RayTrafoError::unsupported_geometry(
                backend,
                format!("`{reco_name}.shape` must have equal entries, got {:?}", reco_space.shape()),
            ));
        }
        let extent = reco_space.domain().extent();
        if extent[0] != extent[1] {
            return Err(RayTrafoError::unsupported_geometry(
                backend,
                format!("`{reco_name}.extent` must have equal entries, got {extent:?}"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{KernelArgs, LibraryVersion, StatelessProjector};
    use crate::geometry::{Parallel2dGeometry, Parallel3dAxisGeometry};
    use crate::space::Dtype;

    #[derive(Debug)]
    struct SumProjector;

    impl StatelessProjector for SumProjector {
        fn forward(&self, _args: &KernelArgs<'_>, x: &[f64], out: &mut [f64]) -> Result<()> {
            let total: f64 = x.iter().sum();
            out.fill(total);
            Ok(())
        }

        fn backward(&self, _args: &KernelArgs<'_>, y: &[f64], out: &mut [f64]) -> Result<()> {
            let total: f64 = y.iter().sum();
            out.fill(total);
            Ok(())
        }
    }

    fn registry() -> Arc<BackendRegistry> {
        Arc::new(
            BackendRegistry::empty()
                .with_stateless(BackendId::RaycastCpu, Arc::new(SumProjector))
                .with_stateless(BackendId::RaycastCuda, Arc::new(SumProjector))
                .with_stateless(BackendId::Radon, Arc::new(SumProjector)),
        )
    }

    fn settings(backend: &str) -> TransformSettings {
        TransformSettings {
            backend: Some(backend.to_string()),
            registry: Some(registry()),
            ..Default::default()
        }
    }

    fn space_2d(min: [f64; 2], max: [f64; 2], shape: [usize; 2]) -> DiscretizedSpace {
        DiscretizedSpace::uniform(min, max, shape, Dtype::Float64).unwrap()
    }

    fn parallel_2d() -> Arc<Geometry> {
        Arc::new(Parallel2dGeometry::uniform(6, -2.0, 2.0, 8).unwrap().into())
    }

    fn parallel_3d() -> Arc<Geometry> {
        Arc::new(
            Parallel3dAxisGeometry::uniform(5, [-2.0, -2.0], [2.0, 2.0], [4, 4])
                .unwrap()
                .into(),
        )
    }

    #[test]
    fn test_invalid_direction() {
        let result = RayTransformBase::new(space_2d([-1.0; 2], [1.0; 2], [4, 4]), parallel_2d(), "up", settings("radon"));
        assert!(matches!(result, Err(RayTrafoError::InvalidDirection(_))));
    }

    #[test]
    fn test_raycast_cpu_rejects_3d() {
        let space = DiscretizedSpace::uniform([-1.0; 3], [1.0; 3], [4, 4, 4], Dtype::Float32).unwrap();
        let result = RayTransformBase::new(space, parallel_3d(), "forward", settings("raycast_cpu"));
        assert!(matches!(
            result,
            Err(RayTrafoError::UnsupportedGeometryForBackend {
                backend: BackendId::RaycastCpu,
                ..
            })
        ));
    }

    #[test]
    fn test_radon_constraints() {
        let cases = [
            (space_2d([0.0, 0.0], [2.0, 2.0], [4, 4]), "centered"),
            (space_2d([-1.0, -1.0], [1.0, 1.0], [4, 6]), "shape"),
            (space_2d([-1.0, -2.0], [1.0, 2.0], [4, 4]), "extent"),
        ];
        for (space, needle) in cases {
            let err = RayTransformBase::new(space, parallel_2d(), "forward", settings("radon")).unwrap_err();
            assert!(matches!(err, RayTrafoError::UnsupportedGeometryForBackend { .. }));
            assert!(err.to_string().contains(needle), "{err}");
        }
        let space = DiscretizedSpace::uniform([-1.0; 3], [1.0; 3], [4, 4, 4], Dtype::Float32).unwrap();
        let err = RayTransformBase::new(space, parallel_3d(), "forward", settings("radon")).unwrap_err();
        assert!(err.to_string().contains("2d parallel"));
    }

    #[test]
    fn test_dimension_mismatch_after_backend_checks() {
        let space = DiscretizedSpace::uniform([-1.0; 3], [1.0; 3], [4, 4, 4], Dtype::Float32).unwrap();
        let result = RayTransformBase::new(space, parallel_2d(), "backward", settings("raycast_cuda"));
        assert!(matches!(
            result,
            Err(RayTrafoError::DimensionMismatch {
                name: "range",
                space_ndim: 3,
                geometry_ndim: 2
            })
        ));
    }

    #[test]
    fn test_perpendicular_advisory_on_old_library() {
        let old = Arc::new(
            BackendRegistry::empty()
                .with_stateless(BackendId::RaycastCuda, Arc::new(SumProjector))
                .with_library_version(LibraryVersion::new(1, 8, 3)),
        );
        let space = DiscretizedSpace::uniform([-1.0; 3], [1.0; 3], [4, 4, 4], Dtype::Float32).unwrap();
        let settings = TransformSettings {
            registry: Some(old),
            ..Default::default()
        };
        let op = RayTransformBase::new(space.clone(), parallel_3d(), "forward", settings).unwrap();
        assert!(matches!(
            op.advisories(),
            [Advisory::PerpendicularDetectorMidpoint { angle_index: 0, .. }]
        ));

        let current = RayTransformBase::new(space, parallel_3d(), "forward", settings_for_cuda()).unwrap();
        assert!(current.advisories().is_empty());
    }

    fn settings_for_cuda() -> TransformSettings {
        settings("raycast_cuda")
    }

    #[test]
    fn test_supplied_space_checked_with_direction_name() {
        let space = space_2d([-1.0; 2], [1.0; 2], [4, 4]);
        let wrong = space_2d([-1.0; 2], [1.0; 2], [6, 9]);
        let mut s = settings("radon");
        s.opposite_space = Some(wrong);
        let err = RayTransformBase::new(space, parallel_2d(), "backward", s).unwrap_err();
        assert!(matches!(err, RayTrafoError::ShapeMismatch { name: "domain", .. }));
    }

    #[test]
    fn test_adjoint_cycle_and_invalidation() {
        let op = RayTransformBase::new(space_2d([-1.0; 2], [1.0; 2], [4, 4]), parallel_2d(), "forward", settings("radon"))
            .unwrap();
        let adj = op.adjoint();
        assert_eq!(adj.direction(), Direction::Backward);
        assert!(Arc::ptr_eq(&adj.adjoint(), &op));
        assert!(Arc::ptr_eq(&op.adjoint(), &adj));

        op.set_gpu_index(0);
        assert!(Arc::ptr_eq(&op.adjoint(), &adj));

        op.set_gpu_index(1);
        assert!(!op.has_cached_adjoint());
        let adj2 = op.adjoint();
        assert!(!Arc::ptr_eq(&adj2, &adj));
        assert_eq!(adj2.gpu_index(), 1);
    }

    #[test]
    fn test_gpu_change_unlinks_both_sides() {
        let op = RayTransformBase::new(space_2d([-1.0; 2], [1.0; 2], [4, 4]), parallel_2d(), "forward", settings("radon"))
            .unwrap();
        let adj = op.adjoint();
        op.set_gpu_index(1);
        assert!(!adj.has_cached_adjoint());
        let fresh = adj.adjoint();
        assert!(!Arc::ptr_eq(&fresh, &op));
        assert_eq!(fresh.gpu_index(), adj.gpu_index());

        let op = RayTransformBase::new(space_2d([-1.0; 2], [1.0; 2], [4, 4]), parallel_2d(), "forward", settings("radon"))
            .unwrap();
        let adj = op.adjoint();
        adj.set_gpu_index(2);
        assert!(!op.has_cached_adjoint());
        assert_eq!(op.adjoint().gpu_index(), 0);
        assert_eq!(adj.adjoint().gpu_index(), 2);
    }

    #[test]
    fn test_set_gpu_index_value() {
        let op = RayTransformBase::new(space_2d([-1.0; 2], [1.0; 2], [4, 4]), parallel_2d(), "forward", settings("radon"))
            .unwrap();
        op.set_gpu_index_value(&OptionValue::Int(2)).unwrap();
        assert_eq!(op.gpu_index(), 2);
        assert!(op.set_gpu_index_value(&OptionValue::Str("1".into())).is_err());
        assert!(op.set_gpu_index_value(&OptionValue::Int(-1)).is_err());
        assert_eq!(op.gpu_index(), 2);
    }

    #[test]
    fn test_apply_checks_arguments() {
        let op = RayTransformBase::new(space_2d([-1.0; 2], [1.0; 2], [4, 4]), parallel_2d(), "forward", settings("radon"))
            .unwrap();
        let wrong = Element::zeros_real(&[3, 3]);
        assert!(matches!(op.apply(&wrong), Err(RayTrafoError::ShapeMismatch { name: "x", .. })));

        let x = op.domain().element_from_real(vec![1.0; 16]).unwrap();
        let mut out = Element::zeros_complex(op.range().shape());
        assert!(matches!(
            op.apply_into(&x, &mut out),
            Err(RayTrafoError::DtypeMismatch { name: "out", .. })
        ));
        let y = op.apply(&x).unwrap();
        assert!(y.as_real().unwrap().iter().all(|v| *v == 16.0));
    }
}
