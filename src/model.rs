//! Interchangeable allocation models over the same [`Problem`]. Each is a parameterization of the
//! factor stages, so callers can swap formulations without touching their data.

use ndarray::{Array1, Array2};

use crate::{
    allocation::{factor, normalize, FactorOptions, FactorResult},
    error::Result,
    factors::{self, nonlinear::NonlinearOptions},
    matrix::Problem,
};

pub trait Allocator {
    fn name(&self) -> &str;
    /// Unnormalized weight per candidate. Excluded candidates weigh 0.
    fn fit(&self, problem: &Problem) -> Result<Array1<f64>>;
    /// Share per candidate, summing to 1.
    fn predict(&self, problem: &Problem) -> Result<Array1<f64>> {
        normalize(self.fit(problem)?.view())
    }
}

/// The full delta → beta → epsilon pipeline.
#[derive(Clone, Debug, Default)]
pub struct LinearNdAllocation {
    pub options: FactorOptions,
    name: Option<String>,
}

impl LinearNdAllocation {
    pub fn new(options: FactorOptions) -> Self {
        Self {
            options,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn delta(&self, problem: &Problem) -> Result<Array2<f64>> {
        factors::delta(problem, &self.options.delta)
    }

    pub fn beta(&self, problem: &Problem) -> Result<Array1<f64>> {
        let delta = self.delta(problem)?;
        factors::beta(problem, delta.view(), self.options.round_digits)
    }

    pub fn factor(&self, problem: &Problem) -> Result<FactorResult> {
        factor(problem, &self.options)
    }
}

impl Allocator for LinearNdAllocation {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("LinearNdAllocation")
    }

    fn fit(&self, problem: &Problem) -> Result<Array1<f64>> {
        Ok(self.factor(problem)?.raw)
    }

    fn predict(&self, problem: &Problem) -> Result<Array1<f64>> {
        Ok(self.factor(problem)?.share)
    }
}

/// Shares proportional to [`alpha`](factors::alpha): no baseline, no deviation.
#[derive(Clone, Debug, Default)]
pub struct SimpleLinearOptimizer {
    name: Option<String>,
}

impl SimpleLinearOptimizer {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Allocator for SimpleLinearOptimizer {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("SimpleLinearOptimizer")
    }

    fn fit(&self, problem: &Problem) -> Result<Array1<f64>> {
        Ok(problem.mask(factors::alpha(problem)))
    }
}

/// Shares proportional to the [nonlinear delta](factors::nonlinear::delta).
#[derive(Clone, Debug, Default)]
pub struct DeltaNonLinearOptimizer {
    pub options: NonlinearOptions,
    name: Option<String>,
}

impl DeltaNonLinearOptimizer {
    pub fn new(options: NonlinearOptions) -> Self {
        Self {
            options,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Allocator for DeltaNonLinearOptimizer {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("DeltaNonLinearOptimizer")
    }

    fn fit(&self, problem: &Problem) -> Result<Array1<f64>> {
        Ok(problem.mask(factors::nonlinear::delta(problem, &self.options)?))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{construct, test::assert_within, AllocationError, Senses};

    fn capacity_and_cost() -> Problem {
        construct(
            [[10.0, 20.0, 30.0], [5.0, 4.0, 2.0]],
            Senses::from_ints(&[1, -1]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn models_are_interchangeable() {
        let problem = capacity_and_cost();
        let models: Vec<Box<dyn Allocator>> = vec![
            Box::new(LinearNdAllocation::default()),
            Box::new(SimpleLinearOptimizer::default()),
            Box::new(DeltaNonLinearOptimizer::default()),
        ];
        for model in &models {
            let share = model.predict(&problem).unwrap();
            assert_eq!(share.len(), 3, "{}", model.name());
            assert_within(share.sum(), 1.0, 1e-9);
        }
    }

    #[test]
    fn simple_linear_share() {
        // alpha = [10/5, 20/4, 30/2] = [2, 5, 15]
        let share = SimpleLinearOptimizer::default()
            .predict(&capacity_and_cost())
            .unwrap();
        assert_within(share[0], 2.0 / 22.0, 1e-12);
        assert_within(share[1], 5.0 / 22.0, 1e-12);
        assert_within(share[2], 15.0 / 22.0, 1e-12);
    }

    #[test]
    fn names_default_to_type() {
        assert_eq!(LinearNdAllocation::default().name(), "LinearNdAllocation");
        assert_eq!(
            DeltaNonLinearOptimizer::default().with_name("vendors").name(),
            "vendors"
        );
    }

    #[test]
    fn linear_nd_exposes_stages() {
        let problem = capacity_and_cost();
        let model = LinearNdAllocation::default();
        assert_eq!(model.delta(&problem).unwrap().dim(), (2, 3));
        assert_eq!(model.beta(&problem).unwrap().len(), 3);
        assert_eq!(
            model.fit(&problem).unwrap(),
            model.factor(&problem).unwrap().raw
        );
    }

    #[test]
    fn exclusions_apply_to_every_model() {
        let problem = capacity_and_cost().exclude([2]).unwrap();
        let models: Vec<Box<dyn Allocator>> = vec![
            Box::new(LinearNdAllocation::default()),
            Box::new(SimpleLinearOptimizer::default()),
            Box::new(DeltaNonLinearOptimizer::default()),
        ];
        for model in &models {
            assert_eq!(model.fit(&problem).unwrap()[2], 0.0, "{}", model.name());
        }
    }

    #[test]
    fn all_zero_weights_are_degenerate() {
        let problem = construct([[0.0, 0.0]], Senses::from_ints(&[-1]).unwrap()).unwrap();
        let err = SimpleLinearOptimizer::default().predict(&problem).unwrap_err();
        assert_eq!(err, AllocationError::DegenerateAllocation);
    }
}
