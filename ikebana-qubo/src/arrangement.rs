use crate::decoder::BranchChoice;
use crate::domain::{DomainEntry, FlowerCatalog};
use crate::encoder::{self, SILVER_RATIO};
use crate::error::{ArrangementError, Result};
use crate::qubo::Qubo;
use crate::registry::{AngleGroups, BranchGroups, VariableGroup, VariableRegistry};
use crate::role::{Role, Side};
use crate::sampler::Sampler;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Vessel footprint; bounds the main branch length.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    pub width: f64,
    pub height: f64,
}

impl Vessel {
    pub fn new(width: f64, height: f64) -> Result<Self> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if !ok(width) || !ok(height) {
            return Err(ArrangementError::InvalidVessel { width, height });
        }
        Ok(Self { width, height })
    }

    /// `2·(width + height)`
    pub fn length_limit(&self) -> f64 {
        2.0 * (self.width + self.height)
    }
}

/// Viewing direction in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub azimuth: f64,
    pub elevation: f64,
}

/// Angle candidate lists for the base roles.
#[derive(Clone, Debug, PartialEq)]
pub struct AngleCandidates {
    pub main_azimuth: Vec<f64>,
    pub main_elevation: Vec<f64>,
    pub guest_azimuth: Vec<f64>,
    pub guest_elevation: Vec<f64>,
    pub middle_azimuth: Vec<f64>,
    pub middle_elevation: Vec<f64>,
}

impl AngleCandidates {
    pub fn around(front: Orientation) -> Self {
        let shift =
            |base: f64, deltas: &[f64]| -> Vec<f64> { deltas.iter().map(|d| base + d).collect() };
        Self {
            main_azimuth: shift(front.azimuth, &[-20.0, -10.0, 0.0, 10.0, 20.0]),
            main_elevation: shift(front.elevation, &[-10.0, 0.0, 10.0]),
            guest_azimuth: vec![front.azimuth],
            guest_elevation: vec![front.elevation + 45.0],
            middle_azimuth: shift(front.azimuth, &[-50.0, -40.0, 40.0, 50.0]),
            middle_elevation: shift(front.elevation, &[30.0, 40.0, 50.0, 60.0, 70.0]),
        }
    }
}

/// Penalty and reward weights of the base pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseWeights {
    pub main_angle_one_hot: f64,
    pub one_hot: f64,
    pub same_flower: f64,
    pub forced_flower: f64,
    pub main_length_limit: f64,
    pub guest_length: f64,
    pub guest_divisor: f64,
    pub main_angle: f64,
    pub triangle: f64,
    pub triangle_threshold: f64,
    pub side_elevation: f64,
    pub side_elevation_bound: f64,
    pub middle_length: f64,
    pub main_reward: f64,
    pub sign: f64,
    pub equal_length: f64,
    pub silver: f64,
}

impl Default for BaseWeights {
    fn default() -> Self {
        Self {
            main_angle_one_hot: 60.0,
            one_hot: 50.0,
            same_flower: 50.0,
            forced_flower: 50.0,
            main_length_limit: 1.0,
            guest_length: 1.0,
            guest_divisor: 3.0,
            main_angle: 0.5,
            triangle: 10.0,
            triangle_threshold: 45.0,
            side_elevation: 10.0,
            side_elevation_bound: 45.0,
            middle_length: 10.0,
            main_reward: 0.01,
            sign: 45.0,
            equal_length: 45.0,
            silver: 5.0,
        }
    }
}

/// Inputs of one base optimization.
#[derive(Clone, Debug)]
pub struct ArrangementRequest {
    pub vessel: Vessel,
    pub catalog: FlowerCatalog,
    pub forced_flower: Option<String>,
    pub front: Orientation,
}

/// Fully encoded base model, ready to hand to a sampler.
#[derive(Debug)]
pub struct BaseModel {
    pub qubo: Qubo,
    pub side: Side,
    pub main: BranchGroups,
    pub guest: BranchGroups,
    pub middle1: BranchGroups,
    pub middle2: BranchGroups,
    width: usize,
    flowers: Vec<(String, f64)>,
}

impl BaseModel {
    pub fn build(request: &ArrangementRequest, weights: &BaseWeights, side: Side) -> Result<Self> {
        let vessel = Vessel::new(request.vessel.width, request.vessel.height)?;
        let limit = vessel.length_limit();
        let angles = AngleCandidates::around(request.front);
        let domain = request.catalog.domain();

        let mut registry = VariableRegistry::new();
        let main = AngleGroups::register(
            &mut registry,
            Role::Main,
            angles.main_azimuth,
            angles.main_elevation,
        );
        let guest = AngleGroups::register(
            &mut registry,
            Role::Guest,
            angles.guest_azimuth,
            angles.guest_elevation,
        );
        let middle1 = AngleGroups::register(
            &mut registry,
            Role::Middle1,
            angles.middle_azimuth.clone(),
            angles.middle_elevation.clone(),
        );
        let middle2 = AngleGroups::register(
            &mut registry,
            Role::Middle2,
            angles.middle_azimuth,
            angles.middle_elevation,
        );
        let main = main.with_domain(&mut registry, domain.clone());
        let guest = guest.with_domain(&mut registry, domain.clone());
        let middle1 = middle1.with_domain(&mut registry, domain.clone());
        let middle2 = middle2.with_domain(&mut registry, domain);

        let mut qubo = Qubo::new();
        let w = weights;

        encoder::one_hot(&mut qubo, &main.azimuth, w.main_angle_one_hot);
        encoder::one_hot(&mut qubo, &main.elevation, w.main_angle_one_hot);
        for branch in [&guest, &middle1, &middle2] {
            encoder::one_hot(&mut qubo, &branch.azimuth, w.one_hot);
            encoder::one_hot(&mut qubo, &branch.elevation, w.one_hot);
        }
        for branch in [&main, &guest, &middle1, &middle2] {
            encoder::one_hot(&mut qubo, &branch.domain, w.one_hot);
        }

        let same_flower = 2.0 * w.same_flower;
        encoder::no_duplicate_flower(&mut qubo, &main.domain, &guest.domain, same_flower);
        encoder::no_duplicate_flower(&mut qubo, &main.domain, &middle1.domain, same_flower);
        encoder::no_duplicate_flower(&mut qubo, &guest.domain, &middle1.domain, same_flower);

        match request.forced_flower.as_deref().filter(|f| !f.is_empty()) {
            Some(flower) if request.catalog.contains(flower) => {
                for branch in [&main, &guest, &middle1, &middle2] {
                    let bonus = w.forced_flower;
                    encoder::forced_flower_bonus(&mut qubo, &branch.domain, flower, bonus);
                }
            }
            Some(flower) => warn!(flower, "forced flower not in catalog; ignoring"),
            None => {}
        }

        encoder::length_limit(&mut qubo, &main.domain, limit, w.main_length_limit);
        encoder::proportional_length(
            &mut qubo,
            &main.domain,
            &guest.domain,
            w.guest_divisor,
            w.guest_length,
        );

        encoder::angle_centering(&mut qubo, &main.azimuth, w.main_angle);
        encoder::angle_centering(&mut qubo, &main.elevation, w.main_angle);

        for middle in [&middle1, &middle2] {
            let threshold = w.triangle_threshold;
            encoder::spread_limit(&mut qubo, &main.azimuth, &middle.azimuth, threshold, w.triangle);
        }
        for middle in [&middle1, &middle2] {
            let bound = w.side_elevation_bound;
            encoder::elevation_clamp(&mut qubo, &middle.elevation, bound, w.side_elevation);
        }
        for middle in [&middle1, &middle2] {
            encoder::shorter_than(&mut qubo, &main.domain, &middle.domain, w.middle_length);
        }

        encoder::near_limit_reward(&mut qubo, &main.domain, limit, w.main_reward);

        encoder::side_bias(&mut qubo, &middle1.azimuth, side, w.sign);
        encoder::side_bias(&mut qubo, &middle2.azimuth, side.opposite(), w.sign);

        let domains: [&VariableGroup<DomainEntry>; 4] =
            [&main.domain, &guest.domain, &middle1.domain, &middle2.domain];
        for (k, a) in domains.iter().enumerate() {
            for b in &domains[k + 1..] {
                encoder::equal_length(&mut qubo, a, b, w.equal_length);
            }
        }

        let (m1, m2) = (&middle1.domain, &middle2.domain);
        encoder::ratio_coupling(&mut qubo, m1, m2, SILVER_RATIO, w.silver);

        debug!(
            variables = registry.width(),
            terms = qubo.len(),
            ?side,
            limit,
            "base model built"
        );

        Ok(Self {
            qubo,
            side,
            main,
            guest,
            middle1,
            middle2,
            width: registry.width(),
            flowers: request.catalog.weights(),
        })
    }

    /// Number of binary variables in the model.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn solve<S: Sampler + ?Sized>(
        self,
        sampler: &mut S,
        num_reads: usize,
    ) -> Result<BaseSolution> {
        let result = sampler.sample_qubo(&self.qubo, num_reads)?;
        let sample = &result.sample;

        let solution = BaseSolution {
            energy: result.energy,
            side: self.side,
            main: self.main.decode(sample),
            guest: self.guest.decode(sample),
            middle1: self.middle1.decode(sample),
            middle2: self.middle2.decode(sample),
            flowers: self.flowers,
            qubo: self.qubo,
        };
        info!(
            energy = solution.energy,
            main = ?solution.main.flower,
            main_len = ?solution.main.length,
            "base arrangement solved"
        );
        Ok(solution)
    }
}

/// Decoded base pass result.
#[derive(Clone, Debug)]
pub struct BaseSolution {
    pub energy: f64,
    pub side: Side,
    pub main: BranchChoice,
    pub guest: BranchChoice,
    pub middle1: BranchChoice,
    pub middle2: BranchChoice,
    /// Catalog weights echoed back in catalog order.
    pub flowers: Vec<(String, f64)>,
    pub qubo: Qubo,
}

impl BaseSolution {
    pub fn branch(&self, role: Role) -> Option<&BranchChoice> {
        match role {
            Role::Main => Some(&self.main),
            Role::Guest => Some(&self.guest),
            Role::Middle1 => Some(&self.middle1),
            Role::Middle2 => Some(&self.middle2),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        Role::BASE
            .iter()
            .filter_map(|r| self.branch(*r))
            .all(BranchChoice::is_resolved)
    }
}

/// Draws the side preference from `rng`, then builds and solves the base
/// model with default weights.
pub fn optimize_base<S, R>(
    request: &ArrangementRequest,
    sampler: &mut S,
    rng: &mut R,
    num_reads: usize,
) -> Result<BaseSolution>
where
    S: Sampler + ?Sized,
    R: Rng + ?Sized,
{
    let side = Side::random(rng);
    BaseModel::build(request, &BaseWeights::default(), side)?.solve(sampler, num_reads)
}
