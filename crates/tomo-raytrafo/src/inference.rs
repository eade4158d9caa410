//! Projection space inference and validation

use crate::error::{RayTrafoError, Result};
use crate::geometry::{AcquisitionGeometry, Geometry};
use crate::space::{is_close, DiscretizedSpace, Weighting};

const WEIGHT_RTOL: f64 = 1e-5;
const WEIGHT_ATOL: f64 = 1e-8;

/// Derive the projection space matching `reco_space` for `geometry`.
///
/// The projection space samples the geometry partition with the dtype of
/// `reco_space`. Its weighting follows the reconstruction side:
///
/// - unweighted stays unweighted;
/// - a constant weight equal to the reco cell volume becomes the cell volume
///   of the geometry partition, `extent.prod() / size`;
/// - anything else is rejected with [`RayTrafoError::UnsupportedWeighting`].
pub fn infer_projection_space(reco_space: &DiscretizedSpace, geometry: &Geometry) -> Result<DiscretizedSpace> {
    let partition = geometry.partition();

    let weighting = match reco_space.weighting() {
        Weighting::None => Weighting::None,
        Weighting::Const(w) if is_close(*w, reco_space.cell_volume(), WEIGHT_RTOL, WEIGHT_ATOL) => {
            let extent: f64 = geometry.params().extent().iter().product();
            Weighting::Const(extent / partition.size() as f64)
        }
        other => {
            return Err(RayTrafoError::UnsupportedWeighting(format!(
                "reco space weighting {other} cannot be carried over to the projection space"
            )))
        }
    };

    DiscretizedSpace::new(partition, reco_space.dtype())
        .with_weighting(weighting)?
        .with_axis_labels(projection_axis_labels(geometry))
}

/// Axis labels of the projection space: angle symbols for the motion axes
/// followed by detector symbols.
///
/// Returns `None` for dimension combinations without conventional names.
pub fn projection_axis_labels(geometry: &Geometry) -> Option<Vec<String>> {
    let motion: &[&str] = match geometry.motion_partition().ndim() {
        0 => &[],
        1 => &["$\\varphi$"],
        2 => &["$\\vartheta$", "$\\varphi$"],
        3 => &["$\\vartheta$", "$\\varphi$", "$\\psi$"],
        _ => return None,
    };
    let det: &[&str] = match geometry.det_partition().ndim() {
        1 => &["$s$"],
        2 => &["$u$", "$v$"],
        _ => return None,
    };
    Some(motion.iter().chain(det).map(|s| s.to_string()).collect())
}

/// Check that an explicitly supplied projection space fits `geometry` and
/// `reco_space`.
pub fn validate_projection_space(
    proj_space: &DiscretizedSpace,
    reco_space: &DiscretizedSpace,
    geometry: &Geometry,
    name: &'static str,
) -> Result<()> {
    let partition = geometry.partition();
    if proj_space.shape() != partition.shape() {
        return Err(RayTrafoError::ShapeMismatch {
            name,
            expected: partition.shape().to_vec(),
            actual: proj_space.shape().to_vec(),
        });
    }
    if proj_space.dtype() != reco_space.dtype() {
        return Err(RayTrafoError::DtypeMismatch {
            name,
            expected: reco_space.dtype(),
            actual: proj_space.dtype(),
        });
    }
    Ok(())
}
