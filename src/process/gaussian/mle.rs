//! Second-order training through argmin's L-BFGS
use argmin::core::{CostFunction, Error, Executor, Gradient, State};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use log::info;

use super::{GaussianProcess, GaussianProcessError, Hyperparameters};

/// History length of the L-BFGS approximation
const LBFGS_MEMORY: usize = 7;

/// Training loss, `-ln_m / n`, as an argmin problem
struct NegLnM<'a> {
    gp: &'a GaussianProcess,
}

impl NegLnM<'_> {
    fn n(&self) -> f64 {
        self.gp.n_train() as f64
    }

    fn hyperparameters(params: &[f64]) -> Result<Hyperparameters, Error> {
        match params {
            [l, s, c] => Ok(Hyperparameters::new(*l, *s, *c)),
            _ => Err(Error::msg(format!(
                "expected {} parameters, given {}",
                Hyperparameters::N_PARAMETERS,
                params.len()
            ))),
        }
    }
}

impl CostFunction for NegLnM<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, Error> {
        let h = Self::hyperparameters(param)?;
        let (ln_m, _) = self.gp.ln_m_with_parameters(&h)?;
        Ok(-ln_m / self.n())
    }
}

impl Gradient for NegLnM<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, param: &Self::Param) -> Result<Self::Gradient, Error> {
        let h = Self::hyperparameters(param)?;
        let (_, grad) = self.gp.ln_m_with_parameters(&h)?;
        let n = self.n();
        Ok(grad.iter().map(|g| -g / n).collect())
    }
}

impl GaussianProcess {
    /// Maximize the log marginal likelihood with L-BFGS, starting from the
    /// current hyperparameters.
    ///
    /// On success the model holds the optimized hyperparameters and is ready
    /// to predict. On failure it is left as it was, minus any fitted state.
    pub fn optimize_lbfgs(
        &mut self,
        max_iters: u64,
    ) -> Result<Hyperparameters, GaussianProcessError> {
        self.fitted = None;

        let best = {
            let problem = NegLnM { gp: &*self };
            let linesearch = MoreThuenteLineSearch::new();
            let solver = LBFGS::new(linesearch, LBFGS_MEMORY);
            let init = self.hyperparameters.to_array().to_vec();

            let res = Executor::new(problem, solver)
                .configure(|state| state.param(init).max_iters(max_iters))
                .run()
                .map_err(|e| GaussianProcessError::Optimization(e.to_string()))?;

            info!(
                "L-BFGS finished after {} iterations: {:?}",
                res.state().get_iter(),
                res.state().get_termination_status()
            );

            res.state()
                .get_best_param()
                .map(|p| NegLnM::hyperparameters(p))
                .transpose()
                .map_err(|e| GaussianProcessError::Optimization(e.to_string()))?
                .ok_or_else(|| {
                    GaussianProcessError::Optimization(
                        "no parameters were evaluated".to_string(),
                    )
                })?
        };

        let eval = self.evaluate(&best, None)?;
        self.hyperparameters = best;
        self.fitted = Some(eval.fitted);
        Ok(best)
    }
}
