use crate::error::{ArrangementError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One flower species with its display weight and allowed stem lengths.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowerSpec {
    pub name: String,
    /// Passed through for display; never enters the objective.
    pub weight: f64,
    pub lengths: Vec<f64>,
}

impl FlowerSpec {
    pub fn new(name: impl Into<String>, weight: f64, lengths: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            weight,
            lengths,
        }
    }
}

/// Ordered flower catalog. Iteration order fixes the domain order and with it
/// the variable layout of every model built from the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FlowerSpec>", into = "Vec<FlowerSpec>")]
pub struct FlowerCatalog {
    flowers: Vec<FlowerSpec>,
}

impl TryFrom<Vec<FlowerSpec>> for FlowerCatalog {
    type Error = ArrangementError;

    fn try_from(flowers: Vec<FlowerSpec>) -> Result<Self> {
        Self::new(flowers)
    }
}

impl From<FlowerCatalog> for Vec<FlowerSpec> {
    fn from(catalog: FlowerCatalog) -> Self {
        catalog.flowers
    }
}

impl FlowerCatalog {
    pub fn new(flowers: Vec<FlowerSpec>) -> Result<Self> {
        if flowers.is_empty() {
            return Err(ArrangementError::EmptyCatalog);
        }
        let mut seen = HashSet::new();
        let flowers = flowers
            .into_iter()
            .filter(|f| seen.insert(f.name.clone()))
            .collect();
        Ok(Self { flowers })
    }

    // 重複のない非空リテラル専用
    pub(crate) fn from_literal(flowers: Vec<FlowerSpec>) -> Self {
        debug_assert!(!flowers.is_empty());
        Self { flowers }
    }

    /// Joins a flower→weight sequence with a flower→lengths mapping.
    ///
    /// Both must name exactly the same flowers; the weight sequence decides
    /// the order.
    pub fn from_maps<I>(weights: I, lengths: &HashMap<String, Vec<f64>>) -> Result<Self>
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut flowers = Vec::new();
        let mut seen = HashSet::new();
        for (name, weight) in weights {
            if !seen.insert(name.clone()) {
                continue;
            }
            let Some(candidates) = lengths.get(&name) else {
                return Err(ArrangementError::MissingLengths { flower: name });
            };
            flowers.push(FlowerSpec::new(name, weight, candidates.clone()));
        }

        let mut orphans: Vec<&String> = lengths.keys().filter(|k| !seen.contains(*k)).collect();
        orphans.sort();
        if let Some(flower) = orphans.first() {
            return Err(ArrangementError::MissingWeight {
                flower: (*flower).clone(),
            });
        }

        Self::new(flowers)
    }

    pub fn flowers(&self) -> &[FlowerSpec] {
        &self.flowers
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flowers.iter().any(|f| f.name == name)
    }

    pub fn weights(&self) -> Vec<(String, f64)> {
        self.flowers
            .iter()
            .map(|f| (f.name.clone(), f.weight))
            .collect()
    }

    pub fn domain(&self) -> Vec<DomainEntry> {
        build_domain(self)
    }
}

/// A candidate (flower, length) assignment for one branch role.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DomainEntry {
    pub flower: String,
    /// Position of `length` within the flower's own length list.
    pub candidate: usize,
    pub length: f64,
}

/// Flattens the catalog into one entry per (flower, length candidate),
/// flower order first, then candidate order.
pub fn build_domain(catalog: &FlowerCatalog) -> Vec<DomainEntry> {
    catalog
        .flowers
        .iter()
        .flat_map(|flower| {
            flower
                .lengths
                .iter()
                .enumerate()
                .map(move |(candidate, &length)| DomainEntry {
                    flower: flower.name.clone(),
                    candidate,
                    length,
                })
        })
        .collect()
}
