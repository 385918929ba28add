//! Second pass: two extra middle branches around a fixed base arrangement.

use crate::arrangement::BaseSolution;
use crate::decoder::BranchChoice;
use crate::domain::{FlowerCatalog, FlowerSpec};
use crate::encoder;
use crate::error::{ArrangementError, Result};
use crate::qubo::Qubo;
use crate::registry::{AngleGroups, BranchGroups, VariableRegistry};
use crate::role::{Role, Side};
use crate::sampler::Sampler;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One already decided base branch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseBranch {
    pub flower: Option<String>,
    pub length: Option<f64>,
    pub azimuth: f64,
    pub elevation: f64,
}

/// The four base branches the extension is anchored to. Treated as fixed
/// input; nothing here is re-optimized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseArrangement {
    pub main: BaseBranch,
    pub guest: BaseBranch,
    pub middle1: BaseBranch,
    pub middle2: BaseBranch,
}

impl BaseArrangement {
    pub fn branch(&self, role: Role) -> Option<&BaseBranch> {
        match role {
            Role::Main => Some(&self.main),
            Role::Guest => Some(&self.guest),
            Role::Middle1 => Some(&self.middle1),
            Role::Middle2 => Some(&self.middle2),
            _ => None,
        }
    }

    pub fn main_length(&self) -> Result<f64> {
        self.main.length.ok_or(ArrangementError::MissingBaseValue {
            role: Role::Main,
            field: "length",
        })
    }

    fn angles(&self) -> (Vec<f64>, Vec<f64>) {
        Role::BASE
            .iter()
            .filter_map(|r| self.branch(*r))
            .map(|b| (b.azimuth, b.elevation))
            .unzip()
    }

    /// Builds the fixed base from decoded (or client supplied) choices.
    ///
    /// Every base role needs both angles, and main needs a length; flowers
    /// and the other lengths may be missing.
    pub fn from_choices(mut choice: impl FnMut(Role) -> Option<BranchChoice>) -> Result<Self> {
        let mut branch = |role: Role| -> Result<BaseBranch> {
            let c = choice(role).unwrap_or_default();
            let azimuth = c
                .azimuth
                .ok_or(ArrangementError::MissingBaseValue { role, field: "azimuth" })?;
            let elevation = c
                .elevation
                .ok_or(ArrangementError::MissingBaseValue { role, field: "elevation" })?;
            Ok(BaseBranch {
                flower: c.flower,
                length: c.length,
                azimuth,
                elevation,
            })
        };
        let base = Self {
            main: branch(Role::Main)?,
            guest: branch(Role::Guest)?,
            middle1: branch(Role::Middle1)?,
            middle2: branch(Role::Middle2)?,
        };
        base.main_length()?;
        Ok(base)
    }
}

impl TryFrom<&BaseSolution> for BaseArrangement {
    type Error = ArrangementError;

    fn try_from(solution: &BaseSolution) -> Result<Self> {
        Self::from_choices(|role| solution.branch(role).cloned())
    }
}

/// Candidate flowers and angles offered to the extension roles.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtensionCandidates {
    pub catalog: FlowerCatalog,
    pub azimuths: Vec<f64>,
    pub elevations: Vec<f64>,
}

impl Default for ExtensionCandidates {
    fn default() -> Self {
        let catalog = FlowerCatalog::from_literal(vec![
            FlowerSpec::new("kobai", 0.4, vec![40.0, 35.0, 30.0]),
            FlowerSpec::new("keio-zakura", 0.4, vec![40.0, 35.0, 20.0]),
            FlowerSpec::new("liatris", 0.4, vec![40.0, 35.0, 30.0]),
        ]);
        Self {
            catalog,
            azimuths: vec![-70.0, -60.0, -50.0, 50.0, 60.0, 70.0],
            elevations: vec![15.0, 20.0, 21.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtensionWeights {
    pub one_hot: f64,
    pub length_cap: f64,
    pub angle: f64,
    pub azimuth_gap: f64,
    pub elevation_gap: f64,
    pub sign: f64,
    pub same_angle: f64,
    pub same_length: f64,
}

impl Default for ExtensionWeights {
    fn default() -> Self {
        Self {
            one_hot: 300.0,
            length_cap: 10.0,
            angle: 1.0,
            azimuth_gap: 30.0,
            elevation_gap: 15.0,
            sign: 50.0,
            same_angle: 100.0,
            same_length: 80.0,
        }
    }
}

#[derive(Debug)]
pub struct ExtensionModel {
    pub qubo: Qubo,
    pub side: Side,
    pub middle3: BranchGroups,
    pub middle4: BranchGroups,
    width: usize,
}

impl ExtensionModel {
    pub fn build(
        base: &BaseArrangement,
        candidates: &ExtensionCandidates,
        weights: &ExtensionWeights,
        side: Side,
    ) -> Result<Self> {
        let cap = base.main_length()?;
        let (base_azimuths, base_elevations) = base.angles();
        let domain = candidates.catalog.domain();

        // middle3 の角度・ドメイン、続いて middle4
        let mut registry = VariableRegistry::new();
        let middle3 = AngleGroups::register(
            &mut registry,
            Role::Middle3,
            candidates.azimuths.clone(),
            candidates.elevations.clone(),
        )
        .with_domain(&mut registry, domain.clone());
        let middle4 = AngleGroups::register(
            &mut registry,
            Role::Middle4,
            candidates.azimuths.clone(),
            candidates.elevations.clone(),
        )
        .with_domain(&mut registry, domain);

        let w = weights;
        let mut qubo = Qubo::new();
        for branch in [&middle3, &middle4] {
            encoder::one_hot(&mut qubo, &branch.azimuth, w.one_hot);
            encoder::one_hot(&mut qubo, &branch.elevation, w.one_hot);
            encoder::one_hot(&mut qubo, &branch.domain, w.one_hot);
        }

        for branch in [&middle3, &middle4] {
            encoder::length_limit(&mut qubo, &branch.domain, cap, w.length_cap);
        }

        for branch in [&middle3, &middle4] {
            let (azimuth, elevation) = (&branch.azimuth, &branch.elevation);
            encoder::separation(&mut qubo, azimuth, &base_azimuths, w.azimuth_gap, w.angle);
            encoder::separation(&mut qubo, elevation, &base_elevations, w.elevation_gap, w.angle);
        }

        encoder::side_bias(&mut qubo, &middle3.azimuth, side, w.sign);
        encoder::side_bias(&mut qubo, &middle4.azimuth, side.opposite(), w.sign);

        encoder::same_choice(&mut qubo, &middle3.azimuth, &middle4.azimuth, w.same_angle);
        encoder::same_choice(&mut qubo, &middle3.elevation, &middle4.elevation, w.same_angle);

        encoder::equal_length(&mut qubo, &middle3.domain, &middle4.domain, w.same_length);

        debug!(
            variables = registry.width(),
            terms = qubo.len(),
            cap,
            ?side,
            "extension model built"
        );

        Ok(Self {
            qubo,
            side,
            middle3,
            middle4,
            width: registry.width(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn solve<S: Sampler + ?Sized>(
        self,
        sampler: &mut S,
        num_reads: usize,
    ) -> Result<ExtensionSolution> {
        let result = sampler.sample_qubo(&self.qubo, num_reads)?;
        let middle3 = self.middle3.decode(&result.sample);
        let middle4 = self.middle4.decode(&result.sample);
        info!(
            energy = result.energy,
            middle3 = ?middle3.flower,
            middle4 = ?middle4.flower,
            "extension solved"
        );
        Ok(ExtensionSolution {
            energy: result.energy,
            side: self.side,
            middle3,
            middle4,
            qubo: self.qubo,
        })
    }
}

#[derive(Clone, Debug)]
pub struct ExtensionSolution {
    pub energy: f64,
    pub side: Side,
    pub middle3: BranchChoice,
    pub middle4: BranchChoice,
    pub qubo: Qubo,
}

impl ExtensionSolution {
    pub fn branch(&self, role: Role) -> Option<&BranchChoice> {
        match role {
            Role::Middle3 => Some(&self.middle3),
            Role::Middle4 => Some(&self.middle4),
            _ => None,
        }
    }
}

pub fn optimize_extension<S, R>(
    base: &BaseArrangement,
    candidates: &ExtensionCandidates,
    sampler: &mut S,
    rng: &mut R,
    num_reads: usize,
) -> Result<ExtensionSolution>
where
    S: Sampler + ?Sized,
    R: Rng + ?Sized,
{
    let side = Side::random(rng);
    ExtensionModel::build(base, candidates, &ExtensionWeights::default(), side)?
        .solve(sampler, num_reads)
}
