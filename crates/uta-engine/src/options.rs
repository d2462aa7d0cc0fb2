use crate::error::UtaError;

/// Tuning knobs of a [`crate::UtaSolver`]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    /// Minimum utility gap between consecutive distinct ranks; gaps below it
    /// count as ties
    pub delta_threshold: f64,
    /// Whether post-optimality ranges must keep the Kendall tau unchanged
    pub preserve_kendall_coefficient: bool,
    /// Pivot budget of the simplex
    pub max_iterations: usize,
    /// Smallest criterion range considered non-degenerate
    pub precision: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            delta_threshold: 1e-7,
            preserve_kendall_coefficient: true,
            max_iterations: 250,
            precision: 1e-14,
        }
    }
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delta_threshold(mut self, delta: f64) -> Self {
        self.delta_threshold = delta;
        self
    }

    pub fn with_preserve_kendall_coefficient(mut self, preserve: bool) -> Self {
        self.preserve_kendall_coefficient = preserve;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    pub fn validate(&self) -> Result<(), UtaError> {
        if !(0.0..=1.0).contains(&self.delta_threshold) {
            return Err(UtaError::InvalidDeltaThreshold(self.delta_threshold));
        }
        Ok(())
    }
}

/// Partial options read from an instance file; unset fields keep the
/// defaults or whatever the command line provides.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Settings {
    pub delta_threshold: Option<f64>,
    pub preserve_kendall_coefficient: Option<bool>,
    pub max_iterations: Option<usize>,
    pub precision: Option<f64>,
}

impl Settings {
    /// Layer these settings over `base`
    pub fn apply(&self, base: SolverOptions) -> SolverOptions {
        SolverOptions {
            delta_threshold: self.delta_threshold.unwrap_or(base.delta_threshold),
            preserve_kendall_coefficient: self
                .preserve_kendall_coefficient
                .unwrap_or(base.preserve_kendall_coefficient),
            max_iterations: self.max_iterations.unwrap_or(base.max_iterations),
            precision: self.precision.unwrap_or(base.precision),
        }
    }
}
