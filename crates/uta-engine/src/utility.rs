//! Per-segment coefficients and their view as marginal utility functions.
//!
//! Coefficient `k` is the utility gained across one segment, so a
//! breakpoint's ordinate is the running sum of its criterion's coefficients
//! and a criterion's weight is the sum of all of them.

use uta_simplex::SparseValues;

use crate::encoder::breakpoints;
use crate::error::UtaError;
use crate::model::{Criterion, UtilityFunction, UtilityPoint};
use crate::post_optimality::Interval;

#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients {
    values: Vec<f64>,
    /// First coefficient index of each criterion, plus the total at the end
    offsets: Vec<usize>,
}

impl Coefficients {
    pub fn new(criteria: &[Criterion], values: Vec<f64>) -> Self {
        let mut offsets = Vec::with_capacity(criteria.len() + 1);
        let mut offset = 0;
        offsets.push(0);
        for criterion in criteria {
            offset += criterion.segments;
            offsets.push(offset);
        }
        debug_assert_eq!(offset, values.len());
        Self { values, offsets }
    }

    /// Read the field columns of a simplex solution
    pub fn from_solution(criteria: &[Criterion], solution: &SparseValues) -> Self {
        let fields = criteria.iter().map(|c| c.segments).sum();
        // Basic values can come back as -0.0 or tiny negatives after pivoting
        let values = solution.to_dense(fields).into_iter().map(|v| v.max(0.0)).collect();
        Self::new(criteria, values)
    }

    /// Recover coefficients from saved utility functions, matched to
    /// `criteria` by name
    pub fn from_functions(criteria: &[Criterion], functions: &[UtilityFunction]) -> Result<Self, UtaError> {
        for function in functions {
            if !criteria.iter().any(|c| c.name == function.criterion) {
                return Err(UtaError::UnknownCriterion(function.criterion.clone()));
            }
        }

        let mut values = Vec::new();
        for criterion in criteria {
            let function = functions
                .iter()
                .find(|f| f.criterion == criterion.name)
                .ok_or_else(|| UtaError::MissingUtilityFunction(criterion.name.clone()))?;
            if function.points.len() != criterion.segments + 1 {
                return Err(UtaError::MalformedUtilityFunction {
                    criterion: criterion.name.clone(),
                    expected: criterion.segments + 1,
                    found: function.points.len(),
                });
            }

            let mut sum = 0.0;
            for point in &function.points[1..] {
                let value = point.ordinate - sum;
                values.push(value);
                sum += value;
            }
        }

        Ok(Self::new(criteria, values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn num_criteria(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Index of the first coefficient of `criterion`
    pub fn offset(&self, criterion: usize) -> usize {
        self.offsets[criterion]
    }

    pub fn segments(&self, criterion: usize) -> usize {
        self.offsets[criterion + 1] - self.offsets[criterion]
    }

    /// Index of the coefficient of the criterion's best segment
    pub fn last_index(&self, criterion: usize) -> usize {
        self.offsets[criterion + 1] - 1
    }

    /// `last_index` of every criterion
    pub fn end_indices(&self) -> Vec<usize> {
        (0..self.num_criteria()).map(|c| self.last_index(c)).collect()
    }

    pub fn criterion_values(&self, criterion: usize) -> &[f64] {
        &self.values[self.offsets[criterion]..self.offsets[criterion + 1]]
    }

    /// Criterion weights; they sum to 1 for a normalized model
    pub fn weights(&self) -> Vec<f64> {
        (0..self.num_criteria())
            .map(|c| self.criterion_values(c).iter().sum())
            .collect()
    }

    /// Utility functions with breakpoint ranges taken from `ranges`, which
    /// holds one interval per coefficient for the point that ends its segment.
    /// The first point of every function is pinned at 0.
    pub fn to_functions(&self, criteria: &[Criterion], ranges: &[Interval]) -> Vec<UtilityFunction> {
        criteria
            .iter()
            .enumerate()
            .map(|(c, criterion)| {
                let abscissas = breakpoints(criterion);
                let offset = self.offset(c);
                let mut points = Vec::with_capacity(abscissas.len());
                points.push(UtilityPoint::new(abscissas[0], 0.0));

                let mut ordinate = 0.0;
                for (s, &value) in self.criterion_values(c).iter().enumerate() {
                    ordinate += value;
                    let range = ranges
                        .get(offset + s)
                        .copied()
                        .unwrap_or(Interval::point(ordinate));
                    points.push(UtilityPoint {
                        abscissa: abscissas[s + 1],
                        ordinate,
                        min_value: range.min,
                        max_value: range.max,
                    });
                }

                UtilityFunction {
                    criterion: criterion.name.clone(),
                    points,
                }
            })
            .collect()
    }
}
