//! Per-instance cell for a lazily built projection engine

use crate::backend::ProjectionEngine;
use crate::error::Result;
use std::sync::Arc;

/// Holds at most one engine
///
/// Callers get an `Arc` clone, so a cached engine can be used without
/// keeping the owning instance locked.
#[derive(Debug, Default)]
pub(crate) struct EngineCell {
    engine: Option<Arc<dyn ProjectionEngine>>,
}

impl EngineCell {
    /// Cached engine, or a freshly built one that is kept for later calls.
    pub fn get_or_build(
        &mut self,
        build: impl FnOnce() -> Result<Arc<dyn ProjectionEngine>>,
    ) -> Result<Arc<dyn ProjectionEngine>> {
        if let Some(engine) = &self.engine {
            return Ok(Arc::clone(engine));
        }
        let engine = build()?;
        self.engine = Some(Arc::clone(&engine));
        Ok(engine)
    }

    pub fn clear(&mut self) {
        self.engine = None;
    }

    pub fn is_populated(&self) -> bool {
        self.engine.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendOptions;

    #[derive(Debug)]
    struct Dummy;

    impl ProjectionEngine for Dummy {
        fn gpu_index(&self) -> usize {
            0
        }

        fn forward(&self, _x: &[f64], _out: &mut [f64], _options: &BackendOptions) -> Result<()> {
            Ok(())
        }

        fn backward(&self, _y: &[f64], _out: &mut [f64], _options: &BackendOptions) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_cached_engine_reused() {
        let mut cell = EngineCell::default();
        let mut builds = 0;
        for _ in 0..3 {
            cell.get_or_build(|| {
                builds += 1;
                Ok(Arc::new(Dummy))
            })
            .unwrap();
        }
        assert_eq!(builds, 1);
        assert!(cell.is_populated());
        cell.clear();
        assert!(!cell.is_populated());
    }

    #[test]
    fn test_cleared_cell_builds_again() {
        let mut cell = EngineCell::default();
        let mut builds = 0;
        for _ in 0..2 {
            cell.get_or_build(|| {
                builds += 1;
                Ok(Arc::new(Dummy))
            })
            .unwrap();
            cell.clear();
        }
        assert_eq!(builds, 2);
        assert!(!cell.is_populated());
    }

    #[test]
    fn test_failed_build_leaves_cell_empty() {
        let mut cell = EngineCell::default();
        let result = cell.get_or_build(|| Err(crate::error::RayTrafoError::kernel("no device")));
        assert!(result.is_err());
        assert!(!cell.is_populated());
    }
}
