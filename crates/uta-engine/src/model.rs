use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::UtaError;
use crate::numeric::{round_to, UTILITY_DIGITS};

pub const MIN_SEGMENTS: usize = 1;
pub const MAX_SEGMENTS: usize = 99;

/// Whether larger raw values are better (`Gain`) or worse (`Cost`)
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionDirection {
    Gain,
    Cost,
}

impl FromStr for CriterionDirection {
    type Err = UtaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Gain" => Ok(Self::Gain),
            "Cost" => Ok(Self::Cost),
            other => Err(UtaError::InvalidDirection(other.to_string())),
        }
    }
}

impl TryFrom<String> for CriterionDirection {
    type Error = UtaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CriterionDirection> for String {
    fn from(direction: CriterionDirection) -> Self {
        direction.to_string()
    }
}

impl fmt::Display for CriterionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gain => f.write_str("Gain"),
            Self::Cost => f.write_str("Cost"),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
    pub direction: CriterionDirection,
    /// Number of linear pieces of the marginal utility function
    pub segments: usize,
    /// Smallest observed value, rounded to 14 digits
    #[cfg_attr(feature = "serde", serde(default = "unobserved_min"))]
    pub min_value: f64,
    /// Largest observed value, rounded to 14 digits
    #[cfg_attr(feature = "serde", serde(default = "unobserved_max"))]
    pub max_value: f64,
}

#[cfg(feature = "serde")]
fn unobserved_min() -> f64 {
    f64::MAX
}

#[cfg(feature = "serde")]
fn unobserved_max() -> f64 {
    f64::MIN
}

impl Criterion {
    /// A criterion with no observed values yet
    pub fn new(name: impl Into<String>, direction: CriterionDirection, segments: usize) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            description: None,
            direction,
            segments,
            min_value: f64::MAX,
            max_value: f64::MIN,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.set_range(min, max);
        self
    }

    pub fn set_range(&mut self, min: f64, max: f64) {
        self.min_value = round_to(min, UTILITY_DIGITS);
        self.max_value = round_to(max, UTILITY_DIGITS);
    }

    /// Widen the range to include `value`
    pub fn observe(&mut self, value: f64) {
        let min = self.min_value.min(value);
        let max = self.max_value.max(value);
        self.set_range(min, max);
    }

    /// Check segment count and range before any matrix is built
    pub fn validate(&self, precision: f64) -> Result<(), UtaError> {
        if !(MIN_SEGMENTS..=MAX_SEGMENTS).contains(&self.segments) {
            return Err(UtaError::InvalidSegments {
                criterion: self.name.clone(),
                segments: self.segments,
            });
        }
        let span = self.max_value - self.min_value;
        if !self.min_value.is_finite() || !self.max_value.is_finite() || !span.is_finite() || span < precision {
            return Err(UtaError::DegenerateCriterion {
                criterion: self.name.clone(),
                min: self.min_value,
                max: self.max_value,
            });
        }
        Ok(())
    }

    /// Raw value with utility 0
    pub fn worst_value(&self) -> f64 {
        match self.direction {
            CriterionDirection::Gain => self.min_value,
            CriterionDirection::Cost => self.max_value,
        }
    }

    /// Raw value where the marginal utility reaches its maximum
    pub fn best_value(&self) -> f64 {
        match self.direction {
            CriterionDirection::Gain => self.max_value,
            CriterionDirection::Cost => self.min_value,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: String,
    pub name: String,
    /// Raw value per criterion name; `None` until filled
    #[cfg_attr(feature = "serde", serde(default))]
    pub values: HashMap<String, Option<f64>>,
    /// Position in the reference ranking; equal ranks are ties, `None` means
    /// the alternative only receives an inferred position
    #[cfg_attr(feature = "serde", serde(default))]
    pub reference_rank: Option<usize>,
}

impl Alternative {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            values: HashMap::new(),
            reference_rank: None,
        }
    }

    pub fn with_value(mut self, criterion: impl Into<String>, value: f64) -> Self {
        self.values.insert(criterion.into(), Some(value));
        self
    }

    pub fn with_rank(mut self, rank: usize) -> Self {
        self.reference_rank = Some(rank);
        self
    }

    pub fn value(&self, criterion: &str) -> Option<f64> {
        self.values.get(criterion).copied().flatten()
    }

    pub fn require_value(&self, criterion: &str) -> Result<f64, UtaError> {
        self.value(criterion).ok_or_else(|| UtaError::MissingValue {
            alternative: self.name.clone(),
            criterion: criterion.to_string(),
        })
    }
}

/// One breakpoint of a marginal utility function
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtilityPoint {
    /// Raw criterion value
    pub abscissa: f64,
    /// Cumulative utility at `abscissa`
    pub ordinate: f64,
    /// Lowest ordinate the point may be moved to
    pub min_value: f64,
    /// Highest ordinate the point may be moved to
    pub max_value: f64,
}

impl UtilityPoint {
    pub fn new(abscissa: f64, ordinate: f64) -> Self {
        Self {
            abscissa,
            ordinate,
            min_value: ordinate,
            max_value: ordinate,
        }
    }
}

/// Piecewise-linear marginal utility of one criterion, ordered from the
/// worst abscissa to the best
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct UtilityFunction {
    pub criterion: String,
    pub points: Vec<UtilityPoint>,
}

impl UtilityFunction {
    /// Ordinate of the best point, i.e. the criterion's weight
    pub fn weight(&self) -> f64 {
        self.points.last().map(|p| p.ordinate).unwrap_or(0.0)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RankingEntry {
    pub alternative: String,
    /// Global utility rounded to 14 digits
    pub utility: f64,
    /// 1-based position after the global descending sort
    pub position: usize,
    pub reference_rank: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parsing() {
        assert_eq!("Gain".parse::<CriterionDirection>().unwrap(), CriterionDirection::Gain);
        assert_eq!("Cost".parse::<CriterionDirection>().unwrap(), CriterionDirection::Cost);
        assert_eq!(
            "gain".parse::<CriterionDirection>(),
            Err(UtaError::InvalidDirection("gain".to_string()))
        );
    }

    #[test]
    fn test_observe_rounds_bounds() {
        let mut c = Criterion::new("price", CriterionDirection::Cost, 2);
        c.observe(0.1 + 0.2);
        c.observe(7.0);
        assert_eq!(c.min_value, 0.3);
        assert_eq!(c.max_value, 7.0);
        assert_eq!(c.best_value(), 0.3);
        assert_eq!(c.worst_value(), 7.0);
    }

    #[test]
    fn test_validate_segments() {
        let c = Criterion::new("x", CriterionDirection::Gain, 0).with_range(0.0, 1.0);
        assert!(matches!(c.validate(1e-14), Err(UtaError::InvalidSegments { segments: 0, .. })));

        let c = Criterion::new("x", CriterionDirection::Gain, 100).with_range(0.0, 1.0);
        assert!(matches!(c.validate(1e-14), Err(UtaError::InvalidSegments { segments: 100, .. })));

        let c = Criterion::new("x", CriterionDirection::Gain, 99).with_range(0.0, 1.0);
        assert!(c.validate(1e-14).is_ok());
    }

    #[test]
    fn test_validate_degenerate_range() {
        let c = Criterion::new("x", CriterionDirection::Gain, 1).with_range(3.0, 3.0);
        assert!(matches!(c.validate(1e-14), Err(UtaError::DegenerateCriterion { .. })));

        // never observed
        let c = Criterion::new("x", CriterionDirection::Gain, 1);
        assert!(matches!(c.validate(1e-14), Err(UtaError::DegenerateCriterion { .. })));
    }

    #[test]
    fn test_missing_value() {
        let mut a = Alternative::new("a").with_value("x", 1.0);
        a.values.insert("y".to_string(), None);
        assert_eq!(a.require_value("x").unwrap(), 1.0);
        assert!(matches!(a.require_value("y"), Err(UtaError::MissingValue { .. })));
        assert!(matches!(a.require_value("z"), Err(UtaError::MissingValue { .. })));
    }
}
