//! First-order update rules used to train hyperparameters
//!
//! An [`Optimizer`] moves a parameter vector one step *against* a gradient,
//! i.e. it minimizes. Callers maximizing an objective hand it the negated
//! gradient.

mod adam;
mod gradient_descent;

pub use adam::Adam;
pub use gradient_descent::GradientDescent;

/// Update rule turning `(parameters, gradient)` into new parameters.
pub trait Optimizer {
    /// Take one minimizing step, updating `params` in place.
    ///
    /// # Arguments
    /// * `params` - Current parameter values.
    /// * `grad` - Gradient of the objective at `params`, same length.
    fn step(&mut self, params: &mut [f64], grad: &[f64]);
}

impl<O: Optimizer + ?Sized> Optimizer for &mut O {
    fn step(&mut self, params: &mut [f64], grad: &[f64]) {
        (**self).step(params, grad);
    }
}

impl<O: Optimizer + ?Sized> Optimizer for Box<O> {
    fn step(&mut self, params: &mut [f64], grad: &[f64]) {
        (**self).step(params, grad);
    }
}
