//! QUBO model builder and decoder for ikebana arrangements.
//!
//! The base pass picks flower, stem length and angles for the main, guest
//! and two middle branches; the extension pass adds two more middle
//! branches around a fixed base. Both encode their constraints as one
//! upper-triangular [`Qubo`], hand it to a [`Sampler`] and decode the best
//! sample back into per-branch choices.

pub mod arrangement;
pub mod decoder;
pub mod domain;
pub mod encoder;
pub mod error;
pub mod extension;
pub mod qubo;
pub mod registry;
pub mod report;
pub mod role;
pub mod sampler;

pub use arrangement::{
    ArrangementRequest, BaseModel, BaseSolution, BaseWeights, Orientation, Vessel, optimize_base,
};
pub use decoder::BranchChoice;
pub use domain::{DomainEntry, FlowerCatalog, FlowerSpec};
pub use error::{ArrangementError, Result};
pub use extension::{
    BaseArrangement, BaseBranch, ExtensionCandidates, ExtensionModel, ExtensionSolution,
    ExtensionWeights, optimize_extension,
};
pub use qubo::Qubo;
pub use report::{BaseInputs, BaseReport, ExtensionReport};
pub use role::{Role, Side};
pub use sampler::{DEFAULT_NUM_READS, Sample, SampleResult, Sampler, SimulatedAnnealer};
