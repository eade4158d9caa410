//! Backend registry: which backends exist, which are usable, and which one
//! to pick by default

use super::traits::{BackendProvider, EngineFactory, StatelessProjector};
use super::types::{Advisory, BackendId, Capability, LibraryVersion};
use crate::error::{RayTrafoError, Result};
use crate::geometry::Geometry;
use crate::space::DiscretizedSpace;
use std::collections::BTreeMap;
use std::env;
use std::sync::{Arc, OnceLock};

/// Sample count from which the CPU raycaster is flagged as slow
pub const RAYCAST_CPU_SLOW_SIZE: usize = 512 * 512;

/// Sample count from which the radon backend is flagged as slow
pub const RADON_SLOW_SIZE: usize = 256 * 256;

/// Environment variable listing backends to leave out of detection
pub const DISABLE_ENV: &str = "TOMO_RAYTRAFO_DISABLE";

/// Detection settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Backends never registered, even when compiled in and usable
    pub disabled: Vec<BackendId>,
}

impl RegistryConfig {
    /// Read `TOMO_RAYTRAFO_DISABLE` (comma-separated backend tags).
    ///
    /// Unknown tags are logged and skipped.
    pub fn from_env() -> Self {
        match env::var(DISABLE_ENV) {
            Ok(value) => Self::parse_disabled(&value),
            Err(_) => Self::default(),
        }
    }

    pub fn parse_disabled(value: &str) -> Self {
        let disabled = value
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .filter_map(|tag| match tag.parse::<BackendId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    tracing::warn!(tag, env = DISABLE_ENV, "ignoring unknown back-end tag");
                    None
                }
            })
            .collect();
        Self { disabled }
    }
}

/// Registered projection backends of a process
///
/// The detected registry is shared process-wide via
/// [`BackendRegistry::global`]; tests and embedders can assemble their own
/// with [`BackendRegistry::empty`] and the `with_*` builders.
#[derive(Debug, Clone)]
pub struct BackendRegistry {
    providers: BTreeMap<BackendId, BackendProvider>,
    library_version: LibraryVersion,
}

static GLOBAL: OnceLock<Arc<BackendRegistry>> = OnceLock::new();

impl BackendRegistry {
    /// Registry without any backend.
    pub fn empty() -> Self {
        Self {
            providers: BTreeMap::new(),
            library_version: LibraryVersion::CURRENT,
        }
    }

    /// Register a stateless kernel under `id`, replacing any previous one.
    pub fn with_stateless(mut self, id: BackendId, kernel: Arc<dyn StatelessProjector>) -> Self {
        self.providers.insert(id, BackendProvider::Stateless(kernel));
        self
    }

    /// Register an engine factory under `id`, replacing any previous one.
    pub fn with_engine(mut self, id: BackendId, factory: Arc<dyn EngineFactory>) -> Self {
        self.providers.insert(id, BackendProvider::Engine(factory));
        self
    }

    /// Override the reported raycast library version.
    pub fn with_library_version(mut self, version: LibraryVersion) -> Self {
        self.library_version = version;
        self
    }

    pub fn without(mut self, id: BackendId) -> Self {
        self.providers.remove(&id);
        self
    }

    /// Register every compiled-in backend usable in this process, honouring
    /// `TOMO_RAYTRAFO_DISABLE`.
    pub fn detect() -> Self {
        Self::detect_with(&RegistryConfig::from_env())
    }

    pub fn detect_with(config: &RegistryConfig) -> Self {
        let mut registry = Self::empty();

        #[cfg(feature = "raycast-cpu")]
        {
            registry = registry.with_stateless(
                BackendId::RaycastCpu,
                Arc::new(crate::backends::RaycastCpuProjector::new()),
            );
        }

        #[cfg(feature = "radon")]
        {
            registry = registry.with_stateless(BackendId::Radon, Arc::new(crate::backends::RadonProjector::new()));
        }

        let cuda = crate::backends::RaycastCudaFactory::new();
        if cuda.is_available() {
            registry = registry.with_engine(BackendId::RaycastCuda, Arc::new(cuda));
        } else {
            tracing::debug!("raycast_cuda back-end not available (feature disabled or no device)");
        }

        for id in &config.disabled {
            if registry.providers.remove(id).is_some() {
                tracing::debug!(backend = %id, "back-end disabled by configuration");
            }
        }

        tracing::debug!(
            available = ?registry.available(),
            library_version = %registry.library_version,
            "detected ray transform back-ends"
        );
        registry
    }

    /// Process-wide detected registry, built on first use.
    pub fn global() -> Arc<BackendRegistry> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::detect())))
    }

    /// Whether `tag` names a known backend (case-insensitive).
    pub fn is_supported(tag: &str) -> bool {
        tag.parse::<BackendId>().is_ok()
    }

    pub fn is_available(&self, id: BackendId) -> bool {
        self.providers.contains_key(&id)
    }

    /// Available backends in default-selection preference order.
    pub fn available(&self) -> Vec<BackendId> {
        BackendId::ALL
            .into_iter()
            .filter(|id| self.is_available(*id))
            .collect()
    }

    pub fn provider(&self, id: BackendId) -> Option<&BackendProvider> {
        self.providers.get(&id)
    }

    pub fn library_version(&self) -> LibraryVersion {
        self.library_version
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.library_version >= capability.min_version()
    }

    /// Version requirement string for `capability`, e.g. `">=1.9.0"`.
    pub fn versions_supporting(capability: Capability) -> String {
        format!(">={}", capability.min_version())
    }

    /// Backend used when none is requested.
    ///
    /// Preference: `raycast_cuda`, then `raycast_cpu`, then `radon`. The
    /// slower choices come with a [`Advisory::SlowBackend`] for large spaces.
    pub fn default_backend(
        &self,
        reco_space: &DiscretizedSpace,
        _geometry: &Geometry,
    ) -> Result<(BackendId, Vec<Advisory>)> {
        let size = reco_space.size();
        let slow = |backend: BackendId, threshold: usize| {
            if size >= threshold {
                vec![Advisory::SlowBackend {
                    backend,
                    size,
                    threshold,
                }]
            } else {
                Vec::new()
            }
        };

        if self.is_available(BackendId::RaycastCuda) {
            Ok((BackendId::RaycastCuda, Vec::new()))
        } else if self.is_available(BackendId::RaycastCpu) {
            Ok((BackendId::RaycastCpu, slow(BackendId::RaycastCpu, RAYCAST_CPU_SLOW_SIZE)))
        } else if self.is_available(BackendId::Radon) {
            Ok((BackendId::Radon, slow(BackendId::Radon, RADON_SLOW_SIZE)))
        } else {
            Err(RayTrafoError::NoBackendAvailable)
        }
    }

    /// Resolve the requested backend tag (or the default) to a provider.
    ///
    /// An empty registry fails with [`RayTrafoError::NoBackendAvailable`]
    /// even when a backend is requested explicitly.
    pub fn resolve(
        &self,
        requested: Option<&str>,
        reco_space: &DiscretizedSpace,
        geometry: &Geometry,
    ) -> Result<(BackendId, BackendProvider, Vec<Advisory>)> {
        if self.providers.is_empty() {
            return Err(RayTrafoError::NoBackendAvailable);
        }

        let (id, advisories) = match requested {
            None => self.default_backend(reco_space, geometry)?,
            Some(tag) => {
                let id: BackendId = tag.parse()?;
                if !self.is_available(id) {
                    return Err(RayTrafoError::BackendNotAvailable(id));
                }
                (id, Vec::new())
            }
        };

        let provider = self
            .provider(id)
            .cloned()
            .ok_or(RayTrafoError::BackendNotAvailable(id))?;
        Ok((id, provider, advisories))
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::detect()
    }
}
