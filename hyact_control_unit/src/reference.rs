//! Reference sources for trajectory following.
//!
//! A [`ReferenceSource`] answers `(q_d, dq_d, ddq_d)` for any time. The crate
//! ships [`SampledTrajectory`], a table of time-stamped samples read from TOML
//! or built in code, looked up by nearest sample or by linear interpolation.
//! Queries before the first or after the last sample clamp to that sample.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::control::tracking::JointReference;
use crate::error::ControllerError;

/// Time-indexed joint reference.
pub trait ReferenceSource {
    /// Reference at `time` [s].
    fn reference_at(&self, time: f64) -> JointReference;

    /// Degrees of freedom of the produced reference.
    fn dof(&self) -> usize;
}

/// How samples are looked up between time stamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lookup {
    /// Nearest sample; ties go to the earlier one.
    #[default]
    Closest,
    /// Linear interpolation between neighbours.
    Interpolate,
}

/// Raw sample table as written in TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrajectoryTable {
    #[serde(default)]
    pub lookup: Lookup,
    /// Strictly increasing time stamps [s].
    pub times: Vec<f64>,
    pub positions: Vec<Vec<f64>>,
    pub velocities: Vec<Vec<f64>>,
    pub accelerations: Vec<Vec<f64>>,
}

/// Validated, time-stamped joint samples.
#[derive(Debug, Clone)]
pub struct SampledTrajectory {
    lookup: Lookup,
    times: Vec<f64>,
    samples: Vec<JointReference>,
}

impl SampledTrajectory {
    /// Build from a table, checking shape and time ordering.
    pub fn from_table(table: TrajectoryTable) -> Result<Self, ControllerError> {
        let n = table.times.len();
        if n == 0 {
            return Err(ControllerError::InvalidTrajectory("no samples".into()));
        }
        if table.positions.len() != n
            || table.velocities.len() != n
            || table.accelerations.len() != n
        {
            return Err(ControllerError::InvalidTrajectory(format!(
                "{} time stamps but {}/{}/{} position/velocity/acceleration rows",
                n,
                table.positions.len(),
                table.velocities.len(),
                table.accelerations.len()
            )));
        }
        if table.times.iter().any(|t| !t.is_finite()) {
            return Err(ControllerError::InvalidTrajectory(
                "non-finite time stamp".into(),
            ));
        }
        if let Some(w) = table.times.windows(2).find(|w| w[1] <= w[0]) {
            return Err(ControllerError::InvalidTrajectory(format!(
                "time stamps not strictly increasing at {} -> {}",
                w[0], w[1]
            )));
        }

        let dof = table.positions[0].len();
        if dof == 0 {
            return Err(ControllerError::InvalidTrajectory("zero-length samples".into()));
        }
        let mut samples = Vec::with_capacity(n);
        for i in 0..n {
            let rows = [
                &table.positions[i],
                &table.velocities[i],
                &table.accelerations[i],
            ];
            if rows.iter().any(|r| r.len() != dof) {
                return Err(ControllerError::InvalidTrajectory(format!(
                    "sample {i} does not have {dof} entries per row"
                )));
            }
            samples.push(JointReference {
                position: DVector::from_column_slice(rows[0]),
                velocity: DVector::from_column_slice(rows[1]),
                acceleration: DVector::from_column_slice(rows[2]),
            });
        }

        Ok(Self {
            lookup: table.lookup,
            times: table.times,
            samples,
        })
    }

    /// Parse a trajectory table from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, ControllerError> {
        let table: TrajectoryTable = toml::from_str(content)
            .map_err(|e| ControllerError::InvalidTrajectory(e.to_string()))?;
        Self::from_table(table)
    }

    #[inline]
    pub fn lookup(&self) -> Lookup {
        self.lookup
    }

    pub fn with_lookup(mut self, lookup: Lookup) -> Self {
        self.lookup = lookup;
        self
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// `(first, last)` time stamp.
    pub fn time_span(&self) -> (f64, f64) {
        (self.times[0], self.times[self.times.len() - 1])
    }

    /// Index of the last sample at or before `time` (clamped).
    fn segment(&self, time: f64) -> usize {
        match self.times.partition_point(|&t| t <= time) {
            0 => 0,
            k => k - 1,
        }
    }
}

impl ReferenceSource for SampledTrajectory {
    fn reference_at(&self, time: f64) -> JointReference {
        let last = self.samples.len() - 1;
        let (first_t, last_t) = self.time_span();
        if time <= first_t {
            return self.samples[0].clone();
        }
        if time >= last_t {
            return self.samples[last].clone();
        }

        let i = self.segment(time);
        let (t0, t1) = (self.times[i], self.times[i + 1]);
        let (a, b) = (&self.samples[i], &self.samples[i + 1]);
        match self.lookup {
            Lookup::Closest => {
                if time - t0 <= t1 - time {
                    a.clone()
                } else {
                    b.clone()
                }
            }
            Lookup::Interpolate => {
                let s = (time - t0) / (t1 - t0);
                JointReference {
                    position: a.position.lerp(&b.position, s),
                    velocity: a.velocity.lerp(&b.velocity, s),
                    acceleration: a.acceleration.lerp(&b.acceleration, s),
                }
            }
        }
    }

    fn dof(&self) -> usize {
        self.samples[0].dof()
    }
}

/// Constant reference: hold a fixed joint position.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldReference(pub JointReference);

impl ReferenceSource for HoldReference {
    fn reference_at(&self, _time: f64) -> JointReference {
        self.0.clone()
    }

    fn dof(&self) -> usize {
        self.0.dof()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
