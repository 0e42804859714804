//! Multilayer perceptron over `ndarray` with a built-in SGD step.
//!
//! Q-learning only needs `predict` and `train_on_batch`, so the network
//! carries its own optimizer state and exposes nothing else. The loss is
//! the Huber (delta-clipped quadratic) loss, which keeps a single large
//! temporal-difference error from dominating the gradient of the batch.
use anyhow::Result;
use coinop_core::Approximator;
use ndarray::{Array1, Array2, Axis};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Configuration of [`Mlp`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct MlpConfig {
    /// Flattened input dimension (window length times frame length).
    pub in_dim: usize,

    /// Width of the single hidden layer.
    pub hidden_dim: usize,

    /// Number of actions.
    pub out_dim: usize,

    /// SGD learning rate.
    pub learning_rate: f32,

    /// Huber loss transition point; errors beyond it contribute linearly.
    pub huber_delta: f32,

    /// Splits the output into value and advantage streams when `true`.
    pub dueling: bool,

    /// Random seed of the weight initialization.
    pub seed: u64,
}

impl MlpConfig {
    /// Constructs a config with the given layer sizes and common defaults.
    pub fn new(in_dim: usize, hidden_dim: usize, out_dim: usize) -> Self {
        Self {
            in_dim,
            hidden_dim,
            out_dim,
            learning_rate: 0.01,
            huber_delta: 1.0,
            dueling: false,
            seed: 42,
        }
    }

    /// Sets the learning rate.
    pub fn learning_rate(mut self, v: f32) -> Self {
        self.learning_rate = v;
        self
    }

    /// Sets the Huber loss transition point.
    pub fn huber_delta(mut self, v: f32) -> Self {
        self.huber_delta = v;
        self
    }

    /// Enables or disables the dueling head.
    pub fn dueling(mut self, v: bool) -> Self {
        self.dueling = v;
        self
    }

    /// Sets the initialization seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`MlpConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`MlpConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Output layer of [`Mlp`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
enum Head {
    /// Plain linear layer producing one Q-value per action.
    Single { w2: Array2<f32>, b2: Array1<f32> },

    /// Dueling head: `Q(s, a) = V(s) + A(s, a) - mean_a A(s, a)`.
    ///
    /// Centering the advantages pins down the otherwise unidentifiable
    /// split between the two streams.
    Dueling {
        wv: Array2<f32>,
        bv: Array1<f32>,
        wa: Array2<f32>,
        ba: Array1<f32>,
    },
}

/// One-hidden-layer perceptron with ReLU and an SGD trainer.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Mlp {
    w1: Array2<f32>,
    b1: Array1<f32>,
    head: Head,
    learning_rate: f32,
    huber_delta: f32,
    out_dim: usize,
}

fn uniform(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<f32> {
    // He-style scale for ReLU layers.
    let s = (2. / rows as f32).sqrt();
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-s..s))
}

impl Mlp {
    /// Builds a network with seeded uniform weights.
    pub fn build(config: &MlpConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let w1 = uniform(&mut rng, config.in_dim, config.hidden_dim);
        let b1 = Array1::zeros(config.hidden_dim);
        let head = if config.dueling {
            Head::Dueling {
                wv: uniform(&mut rng, config.hidden_dim, 1),
                bv: Array1::zeros(1),
                wa: uniform(&mut rng, config.hidden_dim, config.out_dim),
                ba: Array1::zeros(config.out_dim),
            }
        } else {
            Head::Single {
                w2: uniform(&mut rng, config.hidden_dim, config.out_dim),
                b2: Array1::zeros(config.out_dim),
            }
        };
        Self {
            w1,
            b1,
            head,
            learning_rate: config.learning_rate,
            huber_delta: config.huber_delta,
            out_dim: config.out_dim,
        }
    }

    /// Hidden activations and Q-values for a batch of inputs.
    fn forward(&self, input: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
        let h = (input.dot(&self.w1) + &self.b1).mapv(|v| v.max(0.));
        let q = match &self.head {
            Head::Single { w2, b2 } => h.dot(w2) + b2,
            Head::Dueling { wv, bv, wa, ba } => {
                let v = h.dot(wv) + bv;
                let a = h.dot(wa) + ba;
                let a_mean = a.mean_axis(Axis(1)).unwrap().insert_axis(Axis(1));
                &a - &a_mean + &v
            }
        };
        (h, q)
    }
}

impl Approximator for Mlp {
    fn predict(&self, input: &Array2<f32>) -> Result<Array2<f32>> {
        Ok(self.forward(input).1)
    }

    fn train_on_batch(&mut self, input: &Array2<f32>, targets: &Array2<f32>) -> Result<f32> {
        let n = input.nrows() as f32;
        let delta = self.huber_delta;
        let (h, q) = self.forward(input);
        let err = &q - targets;

        let loss = err
            .iter()
            .map(|&e| {
                let a = e.abs();
                if a <= delta {
                    0.5 * e * e
                } else {
                    delta * (a - 0.5 * delta)
                }
            })
            .sum::<f32>()
            / n;

        // The Huber gradient is the error clipped to [-delta, delta].
        let grad_q = err.mapv(|e| e.clamp(-delta, delta) / n);

        let grad_h = match &mut self.head {
            Head::Single { w2, b2 } => {
                let grad_h = grad_q.dot(&w2.t());
                let gw2 = h.t().dot(&grad_q);
                let gb2 = grad_q.sum_axis(Axis(0));
                *w2 -= &(gw2 * self.learning_rate);
                *b2 -= &(gb2 * self.learning_rate);
                grad_h
            }
            Head::Dueling { wv, bv, wa, ba } => {
                let grad_mean = grad_q.mean_axis(Axis(1)).unwrap().insert_axis(Axis(1));
                let grad_a = &grad_q - &grad_mean;
                let grad_v = grad_q.sum_axis(Axis(1)).insert_axis(Axis(1));
                let grad_h = grad_a.dot(&wa.t()) + grad_v.dot(&wv.t());
                let gwa = h.t().dot(&grad_a);
                let gba = grad_a.sum_axis(Axis(0));
                let gwv = h.t().dot(&grad_v);
                let gbv = grad_v.sum_axis(Axis(0));
                *wa -= &(gwa * self.learning_rate);
                *ba -= &(gba * self.learning_rate);
                *wv -= &(gwv * self.learning_rate);
                *bv -= &(gbv * self.learning_rate);
                grad_h
            }
        };

        // ReLU passes gradient only where the activation fired.
        let grad_pre = &grad_h * &h.mapv(|v| if v > 0. { 1. } else { 0. });
        let gw1 = input.t().dot(&grad_pre);
        let gb1 = grad_pre.sum_axis(Axis(0));
        self.w1 -= &(gw1 * self.learning_rate);
        self.b1 -= &(gb1 * self.learning_rate);

        Ok(loss)
    }

    fn out_dim(&self) -> usize {
        self.out_dim
    }

    fn track(&mut self, src: &Self, tau: f32) {
        fn blend1(dst: &mut Array1<f32>, src: &Array1<f32>, tau: f32) {
            dst.zip_mut_with(src, |d, s| *d = (1. - tau) * *d + tau * *s);
        }
        fn blend2(dst: &mut Array2<f32>, src: &Array2<f32>, tau: f32) {
            dst.zip_mut_with(src, |d, s| *d = (1. - tau) * *d + tau * *s);
        }
        blend2(&mut self.w1, &src.w1, tau);
        blend1(&mut self.b1, &src.b1, tau);
        match (&mut self.head, &src.head) {
            (Head::Single { w2, b2 }, Head::Single { w2: sw2, b2: sb2 }) => {
                blend2(w2, sw2, tau);
                blend1(b2, sb2, tau);
            }
            (
                Head::Dueling { wv, bv, wa, ba },
                Head::Dueling {
                    wv: swv,
                    bv: sbv,
                    wa: swa,
                    ba: sba,
                },
            ) => {
                blend2(wv, swv, tau);
                blend1(bv, sbv, tau);
                blend2(wa, swa, tau);
                blend1(ba, sba, tau);
            }
            _ => unreachable!("mismatched network heads"),
        }
    }

    fn save(&self, path: &Path) -> Result<()> {
        let file = BufWriter::new(File::create(path)?);
        bincode::serialize_into(file, self)?;
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let file = BufReader::new(File::open(path)?);
        *self = bincode::deserialize_from(file)?;
        Ok(())
    }
}
