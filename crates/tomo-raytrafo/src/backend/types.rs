//! Backend identifiers, library versions and advisories

use crate::error::{RayTrafoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Projection backend
///
/// Parsed case-insensitively from its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendId {
    /// Ray-driven projector on the host, parallel over rays
    RaycastCpu,
    /// Ray-driven projector on an NVIDIA device
    RaycastCuda,
    /// Software radon transform for 2-D parallel beam data
    Radon,
}

/// Backend family: which projection algorithm a backend runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Raycast,
    Radon,
}

/// Execution target within a family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Cpu,
    Cuda,
}

impl BackendId {
    /// Every supported backend, in default-selection preference order.
    pub const ALL: [BackendId; 3] = [BackendId::RaycastCuda, BackendId::RaycastCpu, BackendId::Radon];

    pub fn as_str(self) -> &'static str {
        match self {
            BackendId::RaycastCpu => "raycast_cpu",
            BackendId::RaycastCuda => "raycast_cuda",
            BackendId::Radon => "radon",
        }
    }

    pub fn family(self) -> Family {
        match self {
            BackendId::RaycastCpu | BackendId::RaycastCuda => Family::Raycast,
            BackendId::Radon => Family::Radon,
        }
    }

    /// Target device, `None` for the radon family.
    pub fn target(self) -> Option<Target> {
        match self {
            BackendId::RaycastCpu => Some(Target::Cpu),
            BackendId::RaycastCuda => Some(Target::Cuda),
            BackendId::Radon => None,
        }
    }

    pub fn is_raycast(self) -> bool {
        self.family() == Family::Raycast
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendId {
    type Err = RayTrafoError;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_ascii_lowercase();
        BackendId::ALL
            .into_iter()
            .find(|id| id.as_str() == tag)
            .ok_or_else(|| RayTrafoError::InvalidBackend(s.to_string()))
    }
}

/// Version of the raycast projection library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LibraryVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl LibraryVersion {
    /// Version of the raycast kernels shipped with this crate.
    pub const CURRENT: LibraryVersion = LibraryVersion::new(1, 9, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for LibraryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for LibraryVersion {
    type Err = RayTrafoError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || RayTrafoError::invalid_value("library_version", format!("{s:?} is not `major.minor[.patch]`"));
        let mut parts = s.trim().split('.').map(|p| p.parse::<u32>().map_err(|_| invalid()));
        let major = parts.next().ok_or_else(invalid)??;
        let minor = parts.next().ok_or_else(invalid)??;
        let patch = parts.next().transpose()?.unwrap_or(0);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self::new(major, minor, patch))
    }
}

/// Library capabilities that depend on the raycast library version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Correct handling of 3-D axis parallel geometries whose detector
    /// midpoint line of sight is perpendicular to the rotation axis
    Par3dDetMidPtPerpToAxis,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Capability::Par3dDetMidPtPerpToAxis => "par3d_det_mid_pt_perp_to_axis",
        }
    }

    /// First library version with this capability.
    pub fn min_version(self) -> LibraryVersion {
        match self {
            Capability::Par3dDetMidPtPerpToAxis => LibraryVersion::new(1, 9, 0),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Non-fatal finding raised while constructing a transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Advisory {
    /// The default backend was chosen but is slow for spaces this large
    SlowBackend {
        backend: BackendId,
        size: usize,
        threshold: usize,
    },
    /// Detector midpoint line of sight is perpendicular to the rotation axis
    /// on a library version that mishandles it
    PerpendicularDetectorMidpoint {
        angle_index: usize,
        det_to_src: [f64; 3],
        axis: [f64; 3],
        library_version: LibraryVersion,
        required: String,
    },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::SlowBackend {
                backend,
                size,
                threshold,
            } => write!(
                f,
                "{backend} back-end may be slow for {size} samples (>= {threshold}); \
                 consider enabling the `cuda` feature"
            ),
            Advisory::PerpendicularDetectorMidpoint {
                angle_index,
                det_to_src,
                axis,
                library_version,
                required,
            } => write!(
                f,
                "angle {angle_index}: detector midpoint normal {det_to_src:?} is perpendicular to the \
                 geometry axis {axis:?}; this is broken in raycast {library_version}, please upgrade to raycast {required}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_id_parse_case_insensitive() {
        assert_eq!("RAYCAST_CPU".parse::<BackendId>().unwrap(), BackendId::RaycastCpu);
        assert_eq!(" radon ".parse::<BackendId>().unwrap(), BackendId::Radon);
        assert!(matches!(
            "astra_cuda".parse::<BackendId>(),
            Err(RayTrafoError::InvalidBackend(tag)) if tag == "astra_cuda"
        ));
    }

    #[test]
    fn test_backend_family_and_target() {
        assert_eq!(BackendId::RaycastCuda.family(), Family::Raycast);
        assert_eq!(BackendId::RaycastCuda.target(), Some(Target::Cuda));
        assert_eq!(BackendId::Radon.target(), None);
    }

    #[test]
    fn test_library_version_order_and_parse() {
        let old: LibraryVersion = "1.8.3".parse().unwrap();
        assert!(old < Capability::Par3dDetMidPtPerpToAxis.min_version());
        assert_eq!("2.0".parse::<LibraryVersion>().unwrap(), LibraryVersion::new(2, 0, 0));
        assert!("1.x".parse::<LibraryVersion>().is_err());
        assert!("1.2.3.4".parse::<LibraryVersion>().is_err());
    }

    #[test]
    fn test_advisory_message_names_angle() {
        let advisory = Advisory::PerpendicularDetectorMidpoint {
            angle_index: 3,
            det_to_src: [0.0, -1.0, 0.0],
            axis: [0.0, 0.0, 1.0],
            library_version: LibraryVersion::new(1, 8, 3),
            required: ">=1.9.0".into(),
        };
        let msg = advisory.to_string();
        assert!(msg.starts_with("angle 3:"));
        assert!(msg.contains("1.8.3"));
        assert!(msg.contains(">=1.9.0"));
    }
}
