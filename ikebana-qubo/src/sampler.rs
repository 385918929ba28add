use crate::error::{ArrangementError, Result};
use crate::qubo::Qubo;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

/// Reads per solve used by the arrangement passes unless told otherwise.
pub const DEFAULT_NUM_READS: usize = 20;

/// Binary assignment returned by a sampler. Indices past the end read as 0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sample {
    bits: Vec<u8>,
}

impl Sample {
    pub fn from_bits(bits: Vec<u8>) -> Self {
        Self { bits }
    }

    /// Builds a sample of `width` zeros with the listed indices set.
    pub fn with_ones(width: usize, ones: impl IntoIterator<Item = usize>) -> Self {
        let mut bits = vec![0u8; width];
        for i in ones {
            if i >= bits.len() {
                bits.resize(i + 1, 0);
            }
            bits[i] = 1;
        }
        Self { bits }
    }

    pub fn get(&self, index: usize) -> u8 {
        self.bits.get(index).copied().unwrap_or(0)
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }
}

/// Lowest-energy sample found by one solve.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleResult {
    pub sample: Sample,
    pub energy: f64,
}

/// Stochastic QUBO minimizer. Must return a sample even when no assignment
/// satisfies every encoded constraint.
pub trait Sampler {
    fn sample_qubo(&mut self, qubo: &Qubo, num_reads: usize) -> Result<SampleResult>;
}

impl<S: Sampler + ?Sized> Sampler for &mut S {
    fn sample_qubo(&mut self, qubo: &Qubo, num_reads: usize) -> Result<SampleResult> {
        (**self).sample_qubo(qubo, num_reads)
    }
}

impl<S: Sampler + ?Sized> Sampler for Box<S> {
    fn sample_qubo(&mut self, qubo: &Qubo, num_reads: usize) -> Result<SampleResult> {
        (**self).sample_qubo(qubo, num_reads)
    }
}

// 線形項と隣接リスト
struct Couplings {
    linear: Vec<f64>,
    neighbors: Vec<Vec<(usize, f64)>>,
}

impl Couplings {
    fn from_qubo(qubo: &Qubo) -> Self {
        let n = qubo.num_variables();
        let mut linear = vec![0.0; n];
        let mut neighbors = vec![Vec::new(); n];
        for ((i, j), v) in qubo.iter() {
            if i == j {
                linear[i] += v;
            } else {
                neighbors[i].push((j, v));
                neighbors[j].push((i, v));
            }
        }
        Self { linear, neighbors }
    }

    fn len(&self) -> usize {
        self.linear.len()
    }

    // x[i] を反転したときのエネルギー変化
    fn flip_delta(&self, x: &[u8], i: usize) -> f64 {
        let local = self.neighbors[i]
            .iter()
            .filter(|(j, _)| x[*j] == 1)
            .fold(self.linear[i], |acc, (_, w)| acc + w);
        if x[i] == 1 { -local } else { local }
    }

    // 最大の反転幅が確率 1/2、最小の係数が確率 1/100 で受理される温度域
    fn temperature_range(&self) -> (f64, f64) {
        let mut max_delta: f64 = 0.0;
        let mut min_coef = f64::INFINITY;
        for i in 0..self.len() {
            let reach = self.linear[i].abs()
                + self.neighbors[i].iter().map(|(_, w)| w.abs()).sum::<f64>();
            max_delta = max_delta.max(reach);
            let weights = self.neighbors[i].iter().map(|(_, w)| *w);
            for v in std::iter::once(self.linear[i]).chain(weights) {
                if v != 0.0 {
                    min_coef = min_coef.min(v.abs());
                }
            }
        }
        if !min_coef.is_finite() {
            return (1.0, 1.0);
        }
        let hot = (max_delta / std::f64::consts::LN_2).max(f64::MIN_POSITIVE);
        let cold = (min_coef / 100f64.ln()).clamp(f64::MIN_POSITIVE, hot);
        (hot, cold)
    }
}

/// Single-flip Metropolis annealer with a geometric cooling schedule.
///
/// Each read starts from a fresh random assignment, anneals for `sweeps`
/// sweeps, then descends greedily to a local minimum.
pub struct SimulatedAnnealer {
    rng: StdRng,
    sweeps: usize,
}

impl SimulatedAnnealer {
    pub const DEFAULT_SWEEPS: usize = 1000;

    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sweeps: Self::DEFAULT_SWEEPS,
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            sweeps: Self::DEFAULT_SWEEPS,
        }
    }

    pub fn with_sweeps(mut self, sweeps: usize) -> Self {
        self.sweeps = sweeps.max(1);
        self
    }

    fn anneal_once(&mut self, couplings: &Couplings, hot: f64, cold: f64) -> Vec<u8> {
        let n = couplings.len();
        let mut x: Vec<u8> = (0..n).map(|_| self.rng.gen_range(0..2u8)).collect();

        let steps = self.sweeps.max(2) - 1;
        for sweep in 0..self.sweeps {
            let tau = (sweep as f64 / steps as f64).clamp(0.0, 1.0);
            let t = hot.powf(1.0 - tau) * cold.powf(tau);
            for i in 0..n {
                let delta = couplings.flip_delta(&x, i);
                let accept = if delta <= 0.0 {
                    true
                } else {
                    let p = (-delta / t).exp();
                    self.rng.gen_bool(p.clamp(0.0, 1.0))
                };
                if accept {
                    x[i] ^= 1;
                }
            }
        }

        // 仕上げ: 改善がなくなるまで貪欲に反転
        for _ in 0..n.max(1) {
            let mut improved = false;
            for i in 0..n {
                if couplings.flip_delta(&x, i) < -1e-9 {
                    x[i] ^= 1;
                    improved = true;
                }
            }
            if !improved {
                break;
            }
        }
        x
    }
}

impl Sampler for SimulatedAnnealer {
    fn sample_qubo(&mut self, qubo: &Qubo, num_reads: usize) -> Result<SampleResult> {
        if num_reads == 0 {
            return Err(ArrangementError::InvalidReadCount);
        }
        let couplings = Couplings::from_qubo(qubo);
        let (hot, cold) = couplings.temperature_range();
        debug!(
            variables = couplings.len(),
            terms = qubo.len(),
            hot,
            cold,
            sweeps = self.sweeps,
            num_reads,
            "annealing"
        );

        let mut best: Option<SampleResult> = None;
        for read in 0..num_reads {
            let sample = Sample::from_bits(self.anneal_once(&couplings, hot, cold));
            let energy = qubo.energy(&sample);
            debug!(read, energy, "read finished");
            if best.as_ref().is_none_or(|b| energy < b.energy) {
                best = Some(SampleResult { sample, energy });
            }
        }
        best.ok_or_else(|| ArrangementError::Sampler("no sample produced".into()))
    }
}
