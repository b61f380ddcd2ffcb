use std::f64::consts::PI;
use std::ops::Range;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Shape of a [`NoisySine`] signal.
#[derive(Debug, Clone, PartialEq)]
pub struct NoisySineConfig {
    pub num: usize,
    pub period: usize,
    pub amplitude: f64,
    /// Uniform noise in `[-noise, noise)`, relative to the amplitude.
    pub noise: f64,
    pub offset: f64,
    /// Indices whose values are multiplied by `anomaly_factor`.
    pub anomaly: Range<usize>,
    pub anomaly_factor: f64,
}

impl Default for NoisySineConfig {
    fn default() -> Self {
        NoisySineConfig {
            num: 800,
            period: 100,
            amplitude: 50.0,
            noise: 0.2,
            offset: 100.0,
            anomaly: 301..320,
            anomaly_factor: 1.35,
        }
    }
}

/// A noisy sine wave with one scaled segment.
///
/// Value `i` is `amplitude * (sin(2 pi i / period) + u) + offset` with `u`
/// uniform noise, multiplied by the anomaly factor inside the anomalous
/// range.
///
/// ```
/// use rrcflib::NoisySine;
///
/// let signal = NoisySine::new(0);
/// assert_eq!(signal.data.len(), 800);
/// assert_eq!(signal.anomalous_indices, (301..320).collect::<Vec<_>>());
/// ```
#[derive(Debug, Clone)]
pub struct NoisySine {
    pub data: Vec<f64>,
    pub anomalous_indices: Vec<usize>,
}

impl NoisySine {
    pub fn new(seed: u64) -> Self {
        Self::from_config(&NoisySineConfig::default(), seed)
    }

    pub fn from_config(config: &NoisySineConfig, seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let period = config.period.max(1) as f64;

        let mut data = Vec::with_capacity(config.num);
        let mut anomalous_indices = Vec::new();
        for i in 0..config.num {
            let noise = config.noise * (2.0 * rng.gen::<f64>() - 1.0);
            let wave = (2.0 * PI * i as f64 / period).sin();
            let mut value = config.amplitude * (wave + noise) + config.offset;
            if config.anomaly.contains(&i) {
                value *= config.anomaly_factor;
                anomalous_indices.push(i);
            }
            data.push(value);
        }

        NoisySine {
            data,
            anomalous_indices,
        }
    }
}
