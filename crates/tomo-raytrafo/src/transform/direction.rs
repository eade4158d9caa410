use crate::error::{RayTrafoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a ray transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Reconstruction space → projection space
    Forward,
    /// Projection space → reconstruction space
    Backward,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    /// Argument names of the (reconstruction, projection) spaces in this
    /// direction's operator signature.
    pub(crate) fn space_names(self) -> (&'static str, &'static str) {
        match self {
            Direction::Forward => ("domain", "range"),
            Direction::Backward => ("range", "domain"),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = RayTrafoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            _ => Err(RayTrafoError::InvalidDirection(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("Forward".parse::<Direction>().unwrap(), Direction::Forward);
        assert_eq!("BACKWARD".parse::<Direction>().unwrap(), Direction::Backward);
        assert!(matches!(
            "sideways".parse::<Direction>(),
            Err(RayTrafoError::InvalidDirection(v)) if v == "sideways"
        ));
    }

    #[test]
    fn test_opposite_is_involution() {
        for d in [Direction::Forward, Direction::Backward] {
            assert_eq!(d.opposite().opposite(), d);
            assert_ne!(d.opposite(), d);
        }
    }
}
