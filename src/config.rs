use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{Aggregation, Reduction},
    allocation::FactorOptions,
    error::{AllocationError, Result},
    factors::DeltaOptions,
    matrix::PerObjective,
    num::Normalized,
};

/// Serializable description of [`FactorOptions`], limited to the built-in reductions. Missing
/// fields take the pipeline defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactorConfig {
    pub delta_method: Reduction,
    /// One reduction per objective, overriding `delta_method`.
    pub delta_methods: Option<Vec<Reduction>>,
    pub absolute: bool,
    /// One scale factor per objective.
    pub scale: Option<Vec<f64>>,
    pub round_digits: Option<u32>,
    pub appreciate: bool,
    pub appreciate_index: usize,
    pub appreciate_method: Reduction,
    pub round_to: f64,
    /// Tukey fence multiplier for outlier trimming; no trimming when unset.
    pub trim_outliers: Option<f64>,
}

impl Default for FactorConfig {
    fn default() -> Self {
        Self {
            delta_method: Reduction::Mean,
            delta_methods: None,
            absolute: true,
            scale: None,
            round_digits: None,
            appreciate: true,
            appreciate_index: 0,
            appreciate_method: Reduction::Mean,
            round_to: 0.05,
            trim_outliers: None,
        }
    }
}

impl FactorConfig {
    pub fn options(&self) -> Result<FactorOptions> {
        let round_to = Normalized::new(self.round_to)
            .filter(|grid| !grid.is_zero())
            .ok_or(AllocationError::InvalidGrid(self.round_to))?;
        let aggregation: Aggregation = match &self.delta_methods {
            Some(methods) => methods.clone().into(),
            None => self.delta_method.into(),
        };
        let scale = match &self.scale {
            Some(scale) => PerObjective::Each(scale.clone()),
            None => PerObjective::All(1.0),
        };
        Ok(FactorOptions {
            delta: DeltaOptions {
                aggregation,
                absolute: self.absolute,
                scale,
            },
            round_digits: self.round_digits,
            appreciate: self.appreciate,
            appreciate_index: self.appreciate_index,
            appreciate_method: Arc::new(self.appreciate_method),
            round_to,
        })
    }
}
