use super::Optimizer;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Plain gradient descent with a fixed step size
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct GradientDescent {
    learning_rate: f64,
}

impl GradientDescent {
    #[must_use]
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }

    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}

impl Optimizer for GradientDescent {
    fn step(&mut self, params: &mut [f64], grad: &[f64]) {
        let lr = self.learning_rate;
        params.iter_mut().zip(grad).for_each(|(p, g)| *p -= lr * g);
    }
}
