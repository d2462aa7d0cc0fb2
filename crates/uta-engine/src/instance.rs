use crate::error::UtaError;
use crate::model::{Alternative, Criterion};
use crate::options::{Settings, SolverOptions};
use crate::session::{SolveContext, UtaSolver};

/// Criteria and alternatives as supplied by a loader, with optional solver
/// settings
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instance {
    pub criteria: Vec<Criterion>,
    pub alternatives: Vec<Alternative>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub settings: Settings,
}

impl Instance {
    /// Reset every criterion's range to the extremes of the values given for
    /// it, skipping missing values
    pub fn update_criteria_ranges(&mut self) {
        for criterion in &mut self.criteria {
            criterion.min_value = f64::MAX;
            criterion.max_value = f64::MIN;
            for alternative in &self.alternatives {
                if let Some(value) = alternative.value(&criterion.name) {
                    criterion.observe(value);
                }
            }
        }
    }

    /// Ranked alternatives grouped by rank `0..=max`; missing ranks give
    /// empty groups
    pub fn reference_ranking(&self) -> Vec<Vec<Alternative>> {
        let Some(max) = self.alternatives.iter().filter_map(|a| a.reference_rank).max() else {
            return Vec::new();
        };
        let mut groups = vec![Vec::new(); max + 1];
        for alternative in &self.alternatives {
            if let Some(rank) = alternative.reference_rank {
                groups[rank].push(alternative.clone());
            }
        }
        groups
    }

    /// Alternatives without a reference rank
    pub fn unranked(&self) -> Vec<Alternative> {
        self.alternatives
            .iter()
            .filter(|a| a.reference_rank.is_none())
            .cloned()
            .collect()
    }

    /// `base` overridden by the instance settings
    pub fn options(&self, base: SolverOptions) -> SolverOptions {
        self.settings.apply(base)
    }

    pub fn context(&self, options: SolverOptions) -> Result<SolveContext, UtaError> {
        SolveContext::new(self.reference_ranking(), self.criteria.clone(), self.unranked(), options)
    }

    pub fn solver(&self, options: SolverOptions) -> Result<UtaSolver, UtaError> {
        Ok(UtaSolver::from_context(self.context(options)?))
    }
}
