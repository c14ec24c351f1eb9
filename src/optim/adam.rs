use itertools::izip;
use log::trace;

use super::Optimizer;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Adam: per-parameter step sizes from running estimates of the first and
/// second moments of the gradient.
///
/// ```math
/// m_t = β_1 m_{t-1} + (1 - β_1) g_t
/// v_t = β_2 v_{t-1} + (1 - β_2) g_t^2
/// θ_t = θ_{t-1} - η \hat{m}_t / (\sqrt{\hat{v}_t} + ε)
/// ```
///
/// where the hats denote bias-corrected moments. Moment buffers are sized on
/// the first step and reset if the parameter count changes.
///
/// # Example
///
/// ```
/// use gpreg::optim::{Adam, Optimizer};
///
/// let mut adam = Adam::new(0.1);
/// let mut x = [5.0];
/// for _ in 0..500 {
///     let grad = [2.0 * x[0]];
///     adam.step(&mut x, &grad);
/// }
/// assert!(x[0].abs() < 1E-2);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    /// Number of steps taken
    t: i32,
    /// First moment estimate
    m: Vec<f64>,
    /// Second moment estimate
    v: Vec<f64>,
}

impl Adam {
    /// Adam with the given step size and `β1 = 0.9`, `β2 = 0.999`,
    /// `ε = 1e-8`.
    #[must_use]
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1E-8,
            t: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_betas(self, beta1: f64, beta2: f64) -> Self {
        Self {
            beta1,
            beta2,
            ..self
        }
    }

    #[must_use]
    pub fn with_epsilon(self, epsilon: f64) -> Self {
        Self { epsilon, ..self }
    }

    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Number of steps taken since creation or the last reset
    #[must_use]
    pub fn steps(&self) -> i32 {
        self.t
    }

    /// Forget the moment estimates
    pub fn reset(&mut self) {
        self.t = 0;
        self.m.clear();
        self.v.clear();
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(1E-3)
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [f64], grad: &[f64]) {
        if self.m.len() != params.len() {
            self.reset();
            self.m.resize(params.len(), 0.0);
            self.v.resize(params.len(), 0.0);
        }

        let Self {
            learning_rate: lr,
            beta1: b1,
            beta2: b2,
            epsilon: eps,
            ..
        } = *self;

        self.t = self.t.saturating_add(1);
        let bc1 = 1.0 - b1.powi(self.t);
        let bc2 = 1.0 - b2.powi(self.t);

        for (p, g, m, v) in
            izip!(params.iter_mut(), grad, self.m.iter_mut(), self.v.iter_mut())
        {
            *m = b1 * *m + (1.0 - b1) * g;
            *v = b2 * *v + (1.0 - b2) * g * g;
            let m_hat = *m / bc1;
            let v_hat = *v / bc2;
            *p -= lr * m_hat / (v_hat.sqrt() + eps);
        }

        trace!("adam: t = {}, params = {:?}", self.t, params);
    }
}
