use crate::sampler::Sample;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// Sparse upper-triangular QUBO coefficients.
///
/// Keys are canonical `(i, j)` pairs with `i <= j`; `(i, i)` holds the linear
/// term of variable `i`. Every contribution is summed into the existing
/// coefficient.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Qubo {
    terms: HashMap<(usize, usize), f64>,
}

impl Qubo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, i: usize, j: usize, value: f64) {
        let key = if i > j { (j, i) } else { (i, j) };
        *self.terms.entry(key).or_insert(0.0) += value;
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        let key = if i > j { (j, i) } else { (i, j) };
        self.terms.get(&key).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.terms.iter().map(|(&k, &v)| (k, v))
    }

    /// One past the largest index that carries a term.
    pub fn num_variables(&self) -> usize {
        self.terms.keys().map(|&(_, j)| j + 1).max().unwrap_or(0)
    }

    /// `xᵀQx` for the given assignment.
    pub fn energy(&self, sample: &Sample) -> f64 {
        self.terms
            .iter()
            .filter(|((i, j), _)| sample.get(*i) == 1 && sample.get(*j) == 1)
            .map(|(_, &v)| v)
            .sum()
    }

    /// Coefficients keyed by `"(i, j)"`, the diagnostic wire shape.
    pub fn to_keyed_map(&self) -> BTreeMap<String, f64> {
        self.terms
            .iter()
            .map(|(&(i, j), &v)| (format!("({i}, {j})"), v))
            .collect()
    }
}

impl Serialize for Qubo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.to_keyed_map())
    }
}
