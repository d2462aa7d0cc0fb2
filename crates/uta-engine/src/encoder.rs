//! Piecewise-linear encoding of raw criterion values.
//!
//! Each criterion's `[min, max]` range is cut into `segments` equal pieces,
//! ordered from the worst end to the best. An alternative's value becomes one
//! field per piece: `1` for pieces it has fully passed, `0` for pieces it has
//! not reached and the fractional position for the piece containing it. The
//! global utility is then the dot product of the encoded row with the
//! per-segment coefficients.

use crate::error::UtaError;
use crate::model::{Alternative, Criterion, CriterionDirection};
use crate::numeric::{round_to, UTILITY_DIGITS};

/// Total number of fields over all criteria
pub fn field_count(criteria: &[Criterion]) -> usize {
    criteria.iter().map(|c| c.segments).sum()
}

/// Encode one raw value of `criterion` into its segment fields
pub fn encode_value(criterion: &Criterion, value: f64) -> Vec<f64> {
    let segments = criterion.segments;
    let width = (criterion.max_value - criterion.min_value) / segments as f64;
    let mut fields = vec![0.0; segments];

    match criterion.direction {
        CriterionDirection::Gain => {
            let mut lower = criterion.min_value;
            for s in 0..segments {
                let upper = criterion.min_value + (s + 1) as f64 * width;
                if value < upper {
                    if value > lower {
                        fields[s] = round_to((value - lower) / (upper - lower), UTILITY_DIGITS);
                        // A value on a boundary never counts twice
                        if s > 0 {
                            fields[s - 1] = 1.0;
                        }
                    }
                } else {
                    fields[s] = 1.0;
                }
                lower = upper;
            }
        }
        CriterionDirection::Cost => {
            let mut lower = criterion.max_value;
            for s in 0..segments {
                let upper = criterion.max_value - (s + 1) as f64 * width;
                if value > upper {
                    if value < lower {
                        fields[s] = round_to((lower - value) / (lower - upper), UTILITY_DIGITS);
                        if s > 0 {
                            fields[s - 1] = 1.0;
                        }
                    }
                } else {
                    fields[s] = 1.0;
                }
                lower = upper;
            }
        }
    }

    fields
}

/// Abscissas of the `segments + 1` breakpoints, from worst to best
pub fn breakpoints(criterion: &Criterion) -> Vec<f64> {
    let segments = criterion.segments;
    let width = round_to((criterion.max_value - criterion.min_value) / segments as f64, UTILITY_DIGITS);
    let mut points = Vec::with_capacity(segments + 1);
    points.push(criterion.worst_value());
    for s in 0..segments {
        let point = if s + 1 == segments {
            criterion.best_value()
        } else {
            match criterion.direction {
                CriterionDirection::Gain => criterion.min_value + (s + 1) as f64 * width,
                CriterionDirection::Cost => criterion.max_value - (s + 1) as f64 * width,
            }
        };
        points.push(point);
    }
    points
}

/// Encodes whole alternatives against a fixed list of criteria
pub struct Encoder<'a> {
    criteria: &'a [Criterion],
    fields: usize,
}

impl<'a> Encoder<'a> {
    pub fn new(criteria: &'a [Criterion]) -> Self {
        Self {
            criteria,
            fields: field_count(criteria),
        }
    }

    pub fn fields(&self) -> usize {
        self.fields
    }

    /// One row of `fields()` values, criteria in order
    pub fn encode(&self, alternative: &Alternative) -> Result<Vec<f64>, UtaError> {
        let mut row = Vec::with_capacity(self.fields);
        for criterion in self.criteria {
            let value = alternative.require_value(&criterion.name)?;
            row.extend(encode_value(criterion, value));
        }
        Ok(row)
    }

    pub fn encode_all(&self, alternatives: &[Alternative]) -> Result<Vec<Vec<f64>>, UtaError> {
        alternatives.iter().map(|a| self.encode(a)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gain(segments: usize, min: f64, max: f64) -> Criterion {
        Criterion::new("g", CriterionDirection::Gain, segments).with_range(min, max)
    }

    fn cost(segments: usize, min: f64, max: f64) -> Criterion {
        Criterion::new("c", CriterionDirection::Cost, segments).with_range(min, max)
    }

    #[test]
    fn test_gain_fields() {
        let c = gain(2, 0.0, 10.0);
        assert_eq!(encode_value(&c, 0.0), vec![0.0, 0.0]);
        assert_eq!(encode_value(&c, 2.5), vec![0.5, 0.0]);
        assert_eq!(encode_value(&c, 5.0), vec![1.0, 0.0]);
        assert_eq!(encode_value(&c, 7.5), vec![1.0, 0.5]);
        assert_eq!(encode_value(&c, 10.0), vec![1.0, 1.0]);
    }

    #[test]
    fn test_cost_fields_mirror_gain() {
        let c = cost(2, 0.0, 10.0);
        assert_eq!(encode_value(&c, 10.0), vec![0.0, 0.0]);
        assert_eq!(encode_value(&c, 7.5), vec![0.5, 0.0]);
        assert_eq!(encode_value(&c, 5.0), vec![1.0, 0.0]);
        assert_eq!(encode_value(&c, 2.5), vec![1.0, 0.5]);
        assert_eq!(encode_value(&c, 0.0), vec![1.0, 1.0]);
    }

    #[test]
    fn test_single_segment() {
        let c = cost(1, 1.0, 5.0);
        assert_eq!(encode_value(&c, 1.0), vec![1.0]);
        assert_eq!(encode_value(&c, 3.0), vec![0.5]);
        assert_eq!(encode_value(&c, 5.0), vec![0.0]);
    }

    #[test]
    fn test_breakpoints_run_worst_to_best() {
        assert_eq!(breakpoints(&gain(4, 0.0, 1.0)), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(breakpoints(&cost(2, 2.0, 6.0)), vec![6.0, 4.0, 2.0]);
    }

    #[test]
    fn test_encode_alternative_concatenates_criteria() {
        let criteria = vec![gain(2, 0.0, 10.0), cost(1, 1.0, 5.0)];
        let encoder = Encoder::new(&criteria);
        assert_eq!(encoder.fields(), 3);

        let a = Alternative::new("a").with_value("g", 7.5).with_value("c", 3.0);
        assert_eq!(encoder.encode(&a).unwrap(), vec![1.0, 0.5, 0.5]);

        let missing = Alternative::new("b").with_value("g", 1.0);
        assert!(matches!(encoder.encode(&missing), Err(UtaError::MissingValue { .. })));
    }
}
