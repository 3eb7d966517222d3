//! Discrete actuation modes.
//!
//! An [`ActuationMode`] is an index into the fixed set of actuation options a
//! controller was configured with (typically gear ratios). What the index
//! *means* to the outside world depends on the system shape, captured once at
//! construction by [`RatioKind`].

use serde::{Deserialize, Serialize};

/// Index of one discrete actuation option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActuationMode(pub usize);

impl ActuationMode {
    /// Zero-based position in the mode table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for ActuationMode {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl std::fmt::Display for ActuationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mode#{}", self.0)
    }
}

/// How a mode is exposed to the feasibility gate and in the control output.
///
/// Single-DOF systems publish the scalar ratio itself; multi-DOF systems
/// publish the mode index and keep their matrix ratios internal.
#[derive(Debug, Clone, PartialEq)]
pub enum RatioKind {
    /// One scalar ratio per mode, indexed by mode.
    Scalar(Vec<f64>),
    /// Matrix ratios owned by the model; modes are published by index.
    Matrix,
}

impl RatioKind {
    /// Selector value published alongside the torque for `mode`.
    ///
    /// Scalar tables return the ratio (NaN if `mode` is outside the table);
    /// matrix tables return the index as a float.
    #[inline]
    pub fn selector(&self, mode: ActuationMode) -> f64 {
        match self {
            Self::Scalar(ratios) => ratios.get(mode.index()).copied().unwrap_or(f64::NAN),
            Self::Matrix => mode.index() as f64,
        }
    }

    /// Returns true for the single-DOF scalar convention.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
