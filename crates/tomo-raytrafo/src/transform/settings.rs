//! Construction settings shared by both transform directions

use crate::backend::{get_bool, get_str, get_usize, BackendOptions, BackendRegistry, OptionValue};
use crate::error::{RayTrafoError, Result};
use crate::space::DiscretizedSpace;
use std::sync::Arc;

/// Option keys interpreted by the transform layer instead of the kernels
pub const RESERVED_OPTIONS: [&str; 3] = ["impl", "use_cache", "gpu_index"];

/// Optional construction parameters of a ray transform
#[derive(Debug, Clone)]
pub struct TransformSettings {
    /// Backend tag; the registry default when `None`
    pub backend: Option<String>,
    /// Explicit projection space; inferred when `None`
    pub opposite_space: Option<DiscretizedSpace>,
    /// Reuse device engines across calls
    pub use_cache: bool,
    pub gpu_index: usize,
    /// Extra options forwarded to the kernels
    pub options: BackendOptions,
    /// Registry to resolve backends in; the process-wide one when `None`
    pub registry: Option<Arc<BackendRegistry>>,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            backend: None,
            opposite_space: None,
            use_cache: true,
            gpu_index: 0,
            options: BackendOptions::new(),
            registry: None,
        }
    }
}

impl TransformSettings {
    /// Merge a dynamic option map.
    ///
    /// The reserved keys `impl`, `use_cache` and `gpu_index` are type-checked
    /// and moved into their typed fields; every other entry is kept for the
    /// kernels.
    pub fn absorb(&mut self, mut options: BackendOptions) -> Result<()> {
        if let Some(tag) = get_str(&options, "impl")? {
            self.backend = Some(tag.to_string());
        }
        if let Some(use_cache) = get_bool(&options, "use_cache")? {
            self.use_cache = use_cache;
        }
        if let Some(gpu_index) = get_usize(&options, "gpu_index")? {
            self.gpu_index = gpu_index;
        }
        for key in RESERVED_OPTIONS {
            options.remove(key);
        }
        self.options.extend(options);
        Ok(())
    }
}

/// Interpret a dynamically typed GPU index.
pub(crate) fn gpu_index_from(value: &OptionValue) -> Result<usize> {
    let index = value
        .as_int()
        .ok_or_else(|| RayTrafoError::type_mismatch("gpu_index", "an int", value.kind()))?;
    usize::try_from(index).map_err(|_| RayTrafoError::invalid_value("gpu_index", format!("must be >= 0, got {index}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_extracts_reserved_keys() {
        let mut settings = TransformSettings::default();
        let mut options = BackendOptions::new();
        options.insert("impl".into(), "radon".into());
        options.insert("use_cache".into(), false.into());
        options.insert("gpu_index".into(), 2i64.into());
        options.insert("samples_per_cell".into(), 4i64.into());
        settings.absorb(options).unwrap();

        assert_eq!(settings.backend.as_deref(), Some("radon"));
        assert!(!settings.use_cache);
        assert_eq!(settings.gpu_index, 2);
        assert_eq!(settings.options.len(), 1);
        assert!(settings.options.contains_key("samples_per_cell"));
    }

    #[test]
    fn test_absorb_type_errors() {
        let mut options = BackendOptions::new();
        options.insert("gpu_index".into(), "zero".into());
        assert!(matches!(
            TransformSettings::default().absorb(options),
            Err(RayTrafoError::TypeMismatch { .. })
        ));

        let mut options = BackendOptions::new();
        options.insert("gpu_index".into(), (-1i64).into());
        assert!(matches!(
            TransformSettings::default().absorb(options),
            Err(RayTrafoError::InvalidValue { .. })
        ));

        let mut options = BackendOptions::new();
        options.insert("impl".into(), 3i64.into());
        assert!(matches!(
            TransformSettings::default().absorb(options),
            Err(RayTrafoError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_gpu_index_from() {
        assert_eq!(gpu_index_from(&OptionValue::Int(3)).unwrap(), 3);
        assert!(matches!(gpu_index_from(&OptionValue::Float(1.0)), Err(RayTrafoError::TypeMismatch { .. })));
        assert!(matches!(gpu_index_from(&OptionValue::Int(-2)), Err(RayTrafoError::InvalidValue { .. })));
    }
}
