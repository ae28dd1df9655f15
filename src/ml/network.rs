//! Dense feed-forward regression network
//!
//! Fully connected layers with ReLU hidden activations and a single linear
//! output unit. Weights are Glorot-uniform initialised, biases start at zero.
//! Inputs are row-major batches: one sample per row.

use ndarray::{aview1, Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    #[error("input dimension mismatch: expected {expected}, got {actual}")]
    InputDimension { expected: usize, actual: usize },

    #[error("network produced a non-finite output")]
    NonFinite,
}

/// Layer activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    Linear,
}

impl Activation {
    fn apply(self, z: f64) -> f64 {
        match self {
            Activation::Relu => z.max(0.0),
            Activation::Linear => z,
        }
    }

    /// Derivative expressed in terms of the activated output
    fn derivative(self, a: f64) -> f64 {
        match self {
            Activation::Relu => {
                if a > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Linear => 1.0,
        }
    }
}

/// One fully connected layer; `weights` is `(outputs, inputs)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub(crate) weights: Array2<f64>,
    pub(crate) biases: Array1<f64>,
    pub(crate) activation: Activation,
}

impl DenseLayer {
    fn new<R: Rng>(inputs: usize, outputs: usize, activation: Activation, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + outputs).max(1) as f64).sqrt();
        let glorot = Uniform::new_inclusive(-limit, limit);

        Self {
            weights: Array2::from_shape_simple_fn((outputs, inputs), || glorot.sample(rng)),
            biases: Array1::zeros(outputs),
            activation,
        }
    }

    pub fn inputs(&self) -> usize {
        self.weights.ncols()
    }

    pub fn outputs(&self) -> usize {
        self.weights.nrows()
    }

    /// `(n, inputs)` to `(n, outputs)`
    fn forward(&self, input: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut z = input.dot(&self.weights.t()) + &self.biases;
        z.mapv_inplace(|v| self.activation.apply(v));
        z
    }

    fn zeros_like(&self) -> Self {
        Self {
            weights: Array2::zeros(self.weights.raw_dim()),
            biases: Array1::zeros(self.biases.len()),
            activation: self.activation,
        }
    }
}

/// Gradients share the shape of the network they were computed for
pub type Gradients = Vec<DenseLayer>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseNetwork {
    layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    /// Build a network with the given hidden layer sizes and one linear output
    pub fn new<R: Rng>(input_dim: usize, hidden: &[usize], rng: &mut R) -> Self {
        let mut layers = Vec::with_capacity(hidden.len() + 1);
        let mut prev = input_dim;

        for &units in hidden {
            layers.push(DenseLayer::new(prev, units, Activation::Relu, rng));
            prev = units;
        }
        layers.push(DenseLayer::new(prev, 1, Activation::Linear, rng));

        Self { layers }
    }

    pub fn input_dim(&self) -> usize {
        self.layers.first().map(DenseLayer::inputs).unwrap_or(0)
    }

    /// Layer widths from input to output, e.g. `[7, 10, 1]`
    pub fn layout(&self) -> Vec<usize> {
        let mut layout = vec![self.input_dim()];
        layout.extend(self.layers.iter().map(DenseLayer::outputs));
        layout
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [DenseLayer] {
        &mut self.layers
    }

    fn check_width(&self, width: usize) -> Result<(), NetworkError> {
        if width != self.input_dim() {
            return Err(NetworkError::InputDimension {
                expected: self.input_dim(),
                actual: width,
            });
        }
        Ok(())
    }

    /// Input of every layer, plus the final `(n, 1)` output
    fn trace(&self, inputs: ArrayView2<'_, f64>) -> (Vec<Array2<f64>>, Array2<f64>) {
        let mut layer_inputs = Vec::with_capacity(self.layers.len());
        let mut current = inputs.to_owned();
        for layer in &self.layers {
            let next = layer.forward(current.view());
            layer_inputs.push(std::mem::replace(&mut current, next));
        }
        (layer_inputs, current)
    }

    /// One output per input row
    pub fn predict_batch(&self, inputs: ArrayView2<'_, f64>) -> Result<Array1<f64>, NetworkError> {
        self.check_width(inputs.ncols())?;
        let output = self
            .layers
            .iter()
            .fold(inputs.to_owned(), |a, layer| layer.forward(a.view()))
            .index_axis_move(Axis(1), 0);

        if output.iter().all(|v| v.is_finite()) {
            Ok(output)
        } else {
            Err(NetworkError::NonFinite)
        }
    }

    pub fn predict(&self, input: &[f64]) -> Result<f64, NetworkError> {
        self.predict_batch(aview1(input).insert_axis(Axis(0)))?
            .iter()
            .next()
            .copied()
            .ok_or(NetworkError::NonFinite)
    }

    pub(crate) fn zero_gradients(&self) -> Gradients {
        self.layers.iter().map(DenseLayer::zeros_like).collect()
    }

    /// Accumulate the gradient of `scale * sum((y_hat - y)^2)` over a batch into
    /// `grads`. Returns the batch's summed squared error.
    pub(crate) fn accumulate_gradients(
        &self,
        inputs: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
        scale: f64,
        grads: &mut Gradients,
    ) -> Result<f64, NetworkError> {
        self.check_width(inputs.ncols())?;
        let (layer_inputs, output) = self.trace(inputs);

        let errors = &output.column(0) - &targets;
        if !errors.iter().all(|e| e.is_finite()) {
            return Err(NetworkError::NonFinite);
        }

        let mut delta = errors.mapv(|e| 2.0 * scale * e).insert_axis(Axis(1));

        for (l, layer) in self.layers.iter().enumerate().rev() {
            let prev = &layer_inputs[l];
            grads[l].weights += &delta.t().dot(prev);
            grads[l].biases += &delta.sum_axis(Axis(0));

            if l == 0 {
                break;
            }

            let below = self.layers[l - 1].activation;
            let mut back = delta.dot(&layer.weights);
            Zip::from(&mut back)
                .and(prev)
                .for_each(|d, &a| *d *= below.derivative(a));
            delta = back;
        }

        Ok(errors.mapv(|e| e * e).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_layout() {
        let mut rng = StdRng::seed_from_u64(7);
        let net = DenseNetwork::new(7, &[16, 8], &mut rng);
        assert_eq!(net.layout(), vec![7, 16, 8, 1]);
        assert_eq!(net.input_dim(), 7);

        let net = DenseNetwork::new(7, &[10], &mut rng);
        assert_eq!(net.layout(), vec![7, 10, 1]);
    }

    #[test]
    fn test_input_dimension_checked() {
        let mut rng = StdRng::seed_from_u64(7);
        let net = DenseNetwork::new(3, &[4], &mut rng);
        assert_eq!(
            net.predict(&[1.0, 2.0]),
            Err(NetworkError::InputDimension { expected: 3, actual: 2 })
        );
    }

    #[test]
    fn test_batch_matches_single_rows() {
        let net = DenseNetwork::new(2, &[4], &mut StdRng::seed_from_u64(5));
        let batch = array![[0.1, 0.9], [0.5, 0.5], [1.0, 0.0]];

        let out = net.predict_batch(batch.view()).unwrap();
        assert_eq!(out.len(), 3);
        for (row, y) in batch.rows().into_iter().zip(out.iter()) {
            let single = net.predict(row.as_slice().unwrap()).unwrap();
            assert!((single - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_seeded_init_is_reproducible() {
        let a = DenseNetwork::new(7, &[10], &mut StdRng::seed_from_u64(1));
        let b = DenseNetwork::new(7, &[10], &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let mut rng = StdRng::seed_from_u64(3);
        let net = DenseNetwork::new(2, &[3], &mut rng);
        let x = [0.3, 0.8];
        let target = 0.5;

        let mut grads = net.zero_gradients();
        let inputs = array![[0.3, 0.8]];
        let targets = array![0.5];
        net.accumulate_gradients(inputs.view(), targets.view(), 1.0, &mut grads)
            .unwrap();

        let eps = 1e-6;
        let loss = |n: &DenseNetwork| (n.predict(&x).unwrap() - target).powi(2);

        // Output bias
        let mut plus = net.clone();
        plus.layers_mut()[1].biases[0] += eps;
        let mut minus = net.clone();
        minus.layers_mut()[1].biases[0] -= eps;
        let numeric = (loss(&plus) - loss(&minus)) / (2.0 * eps);
        assert!((numeric - grads[1].biases[0]).abs() < 1e-5);

        // A first-layer weight
        let mut plus = net.clone();
        plus.layers_mut()[0].weights[[1, 0]] += eps;
        let mut minus = net.clone();
        minus.layers_mut()[0].weights[[1, 0]] -= eps;
        let numeric = (loss(&plus) - loss(&minus)) / (2.0 * eps);
        assert!((numeric - grads[0].weights[[1, 0]]).abs() < 1e-5);
    }
}
