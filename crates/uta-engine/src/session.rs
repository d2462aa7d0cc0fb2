//! The interactive solver session: a validated [`SolveContext`] plus the
//! current coefficients, refreshed by solve, load, adjust and policy changes.

use std::collections::HashSet;

use tracing::{debug, info, warn};
use uta_simplex::{ConstraintViolation, SolutionStatus, Solver};

use crate::encoder::Encoder;
use crate::error::UtaError;
use crate::kendall::kendall_tau;
use crate::matrix::{pairwise_restrictions, ConstraintMatrix, Restriction};
use crate::model::{Alternative, Criterion, RankingEntry, UtilityFunction};
use crate::numeric::{round_to, UTILITY_DIGITS};
use crate::options::SolverOptions;
use crate::post_optimality::feasible_ranges;
use crate::ranking::{inferred_order, merge, rank, utilities};
use crate::rebalance::shift_point;
use crate::utility::Coefficients;

/// How the current utility functions were obtained
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// The simplex reached optimality
    Optimal,
    /// The simplex stopped at its iteration cap; the model may not minimise
    /// the ranking violation
    IterationLimit,
    /// Loaded from saved utility functions without solving
    Restored,
}

/// Summary of the linear program behind a full solve
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LpReport {
    pub iterations: usize,
    /// Sum of all over- and under-estimation errors
    pub total_violation: f64,
    pub violations: Vec<ConstraintViolation>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub utility_functions: Vec<UtilityFunction>,
    /// Ranked and unranked alternatives, best first
    pub ranking: Vec<RankingEntry>,
    pub kendall_tau: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub lp: Option<LpReport>,
}

impl SolveResult {
    pub fn utility_function(&self, criterion: &str) -> Option<&UtilityFunction> {
        self.utility_functions.iter().find(|f| f.criterion == criterion)
    }

    pub fn weights(&self) -> Vec<(String, f64)> {
        self.utility_functions
            .iter()
            .map(|f| (f.criterion.clone(), f.weight()))
            .collect()
    }
}

/// Validated, encoded input of a session. Owns copies of everything it was
/// given; later edits by the caller do not reach it.
#[derive(Debug, Clone)]
pub struct SolveContext {
    criteria: Vec<Criterion>,
    /// Ranked alternatives in reference order
    ranked: Vec<Alternative>,
    /// Reference rank of each ranked alternative; the index of its group
    ranks: Vec<usize>,
    rows: Vec<Vec<f64>>,
    unranked: Vec<Alternative>,
    unranked_rows: Vec<Vec<f64>>,
    options: SolverOptions,
}

impl SolveContext {
    pub fn new(
        reference: Vec<Vec<Alternative>>,
        criteria: Vec<Criterion>,
        unranked: Vec<Alternative>,
        options: SolverOptions,
    ) -> Result<Self, UtaError> {
        options.validate()?;
        if criteria.is_empty() {
            return Err(UtaError::NoCriteria);
        }

        let mut names = HashSet::new();
        for criterion in &criteria {
            if !names.insert(criterion.name.as_str()) {
                return Err(UtaError::DuplicateCriterion(criterion.name.clone()));
            }
        }
        for criterion in &criteria {
            criterion.validate(options.precision)?;
        }

        if reference.len() < 2 {
            return Err(UtaError::TooFewRankGroups(reference.len()));
        }
        if let Some(empty) = reference.iter().position(|group| group.is_empty()) {
            return Err(UtaError::EmptyRankGroup(empty));
        }

        let mut ranked = Vec::new();
        let mut ranks = Vec::new();
        for (rank, group) in reference.into_iter().enumerate() {
            for mut alternative in group {
                alternative.reference_rank = Some(rank);
                ranked.push(alternative);
                ranks.push(rank);
            }
        }
        let unranked: Vec<Alternative> = unranked
            .into_iter()
            .map(|mut a| {
                a.reference_rank = None;
                a
            })
            .collect();

        let mut names = HashSet::new();
        for alternative in ranked.iter().chain(&unranked) {
            if !names.insert(alternative.name.as_str()) {
                return Err(UtaError::DuplicateAlternative(alternative.name.clone()));
            }
        }

        let encoder = Encoder::new(&criteria);
        let rows = encoder.encode_all(&ranked)?;
        let unranked_rows = encoder.encode_all(&unranked)?;

        debug!(
            criteria = criteria.len(),
            fields = encoder.fields(),
            ranked = ranked.len(),
            unranked = unranked.len(),
            "encoded alternatives"
        );

        Ok(Self {
            criteria,
            ranked,
            ranks,
            rows,
            unranked,
            unranked_rows,
            options,
        })
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn ranked(&self) -> &[Alternative] {
        &self.ranked
    }

    pub fn ranks(&self) -> &[usize] {
        &self.ranks
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn unranked(&self) -> &[Alternative] {
        &self.unranked
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn fields(&self) -> usize {
        self.criteria.iter().map(|c| c.segments).sum()
    }

    /// Number of reference rank groups
    pub fn rank_groups(&self) -> usize {
        self.ranks.last().map_or(0, |r| r + 1)
    }

    pub fn constraint_matrix(&self) -> ConstraintMatrix {
        ConstraintMatrix::build(
            &self.criteria,
            &self.ranked,
            &self.rows,
            &self.ranks,
            self.options.delta_threshold,
        )
    }

    /// Pairwise restrictions of the ranked alternatives in the order
    /// `coefficients` induce
    fn restrictions(&self, coefficients: &Coefficients) -> Vec<Restriction> {
        let utilities = utilities(coefficients.as_slice(), &self.rows);
        let order = inferred_order(&utilities);
        pairwise_restrictions(&self.rows, &utilities, &order, self.options.delta_threshold)
    }

    /// Ranges, utility functions, ranking and tau for `coefficients`
    fn evaluate(
        &self,
        coefficients: &Coefficients,
        restrictions: &[Restriction],
        status: SolveStatus,
        lp: Option<LpReport>,
    ) -> SolveResult {
        let delta = self.options.delta_threshold;
        let values = coefficients.as_slice();

        let ranges = feasible_ranges(
            coefficients,
            restrictions,
            delta,
            self.options.preserve_kendall_coefficient,
        );
        let utility_functions = coefficients.to_functions(&self.criteria, &ranges);

        let kendall_tau = kendall_tau(&self.ranks, &utilities(values, &self.rows), delta);
        let ranking = merge(
            rank(values, &self.rows, &self.ranked),
            rank(values, &self.unranked_rows, &self.unranked),
        );

        SolveResult {
            status,
            utility_functions,
            ranking,
            kendall_tau,
            lp,
        }
    }
}

#[derive(Debug, Clone)]
struct SessionState {
    coefficients: Coefficients,
    /// Restrictions of the ranking at the last solve, load or policy change;
    /// adjustments are checked against these
    restrictions: Vec<Restriction>,
    result: SolveResult,
}

/// A UTA session over one reference ranking
#[derive(Debug, Clone)]
pub struct UtaSolver {
    context: SolveContext,
    state: Option<SessionState>,
}

impl UtaSolver {
    pub fn new(
        reference: Vec<Vec<Alternative>>,
        criteria: Vec<Criterion>,
        unranked: Vec<Alternative>,
        options: SolverOptions,
    ) -> Result<Self, UtaError> {
        Ok(Self::from_context(SolveContext::new(reference, criteria, unranked, options)?))
    }

    pub fn from_context(context: SolveContext) -> Self {
        Self { context, state: None }
    }

    pub fn context(&self) -> &SolveContext {
        &self.context
    }

    pub fn result(&self) -> Option<&SolveResult> {
        self.state.as_ref().map(|s| &s.result)
    }

    pub fn coefficients(&self) -> Option<&Coefficients> {
        self.state.as_ref().map(|s| &s.coefficients)
    }

    /// Fit the utility functions with the simplex and evaluate them
    pub fn solve(&mut self) -> Result<&SolveResult, UtaError> {
        let context = &self.context;
        let matrix = context.constraint_matrix();
        let solver = Solver::new().with_max_iterations(context.options.max_iterations);
        let solution = solver.solve(&matrix.problem)?;

        let status = match solution.status {
            SolutionStatus::Optimal => SolveStatus::Optimal,
            SolutionStatus::IterationLimit => {
                warn!(
                    iterations = solution.iterations,
                    max_iterations = solver.max_iterations(),
                    "simplex hit its iteration cap; utilities may not be optimal"
                );
                SolveStatus::IterationLimit
            }
            status => return Err(UtaError::SolverFailure(status)),
        };

        let coefficients = Coefficients::from_solution(&context.criteria, &solution.values);
        let restrictions = context.restrictions(&coefficients);
        let lp = LpReport {
            iterations: solution.iterations,
            total_violation: solution.objective_value,
            violations: solution.violations,
        };
        let result = context.evaluate(&coefficients, &restrictions, status, Some(lp));

        info!(
            ?status,
            iterations = solution.iterations,
            total_violation = solution.objective_value,
            kendall_tau = result.kendall_tau,
            "solved"
        );

        let state = self.state.insert(SessionState {
            coefficients,
            restrictions,
            result,
        });
        Ok(&state.result)
    }

    /// Resume from saved utility functions without solving. The criteria and
    /// options of the session are kept; the rankings are replaced.
    pub fn load_state(
        &mut self,
        functions: &[UtilityFunction],
        reference: Vec<Vec<Alternative>>,
        unranked: Vec<Alternative>,
    ) -> Result<&SolveResult, UtaError> {
        let context = SolveContext::new(reference, self.context.criteria.clone(), unranked, self.context.options)?;
        let coefficients = Coefficients::from_functions(&context.criteria, functions)?;
        let restrictions = context.restrictions(&coefficients);
        let result = context.evaluate(&coefficients, &restrictions, SolveStatus::Restored, None);

        info!(kendall_tau = result.kendall_tau, "restored utility functions");

        self.context = context;
        let state = self.state.insert(SessionState {
            coefficients,
            restrictions,
            result,
        });
        Ok(&state.result)
    }

    /// Move point `index` of `criterion` to `value`.
    ///
    /// Fails without touching the session when `value` is outside the point's
    /// feasible range. Moving a point to where it already is does nothing.
    pub fn adjust_point(&mut self, criterion: &str, index: usize, value: f64) -> Result<&SolveResult, UtaError> {
        let state = self.state.as_mut().ok_or(UtaError::NotSolved)?;
        let c = self
            .context
            .criteria
            .iter()
            .position(|cr| cr.name == criterion)
            .ok_or_else(|| UtaError::UnknownCriterion(criterion.to_string()))?;

        let points = &state.result.utility_functions[c].points;
        let point = *points.get(index).ok_or_else(|| UtaError::PointIndexOutOfRange {
            criterion: criterion.to_string(),
            index,
            len: points.len(),
        })?;

        let delta = round_to(point.ordinate - value, UTILITY_DIGITS);
        if delta != 0.0 {
            let target = round_to(value, UTILITY_DIGITS);
            if target < round_to(point.min_value, UTILITY_DIGITS) || target > round_to(point.max_value, UTILITY_DIGITS)
            {
                return Err(UtaError::ValueOutOfRange {
                    criterion: criterion.to_string(),
                    index,
                    value,
                    min: point.min_value,
                    max: point.max_value,
                });
            }

            shift_point(&mut state.coefficients, c, index, delta);
            state.result = self.context.evaluate(
                &state.coefficients,
                &state.restrictions,
                state.result.status,
                state.result.lp.take(),
            );
            debug!(criterion, index, value, kendall_tau = state.result.kendall_tau, "adjusted point");
        }

        Ok(&state.result)
    }

    /// Switch the post-optimality policy and re-evaluate the current model,
    /// if any, without solving again
    pub fn set_preserve_kendall_coefficient(&mut self, preserve: bool) -> Option<&SolveResult> {
        self.context.options.preserve_kendall_coefficient = preserve;
        let state = self.state.as_mut()?;

        state.restrictions = self.context.restrictions(&state.coefficients);
        state.result = self.context.evaluate(
            &state.coefficients,
            &state.restrictions,
            state.result.status,
            state.result.lp.take(),
        );

        debug!(preserve, "changed post-optimality policy");
        Some(&state.result)
    }
}
