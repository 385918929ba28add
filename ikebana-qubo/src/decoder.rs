use crate::registry::{BranchGroups, GroupRange, VariableGroup};
use crate::role::Role;
use crate::sampler::Sample;
use serde::Serialize;

/// Local index of the first set bit in `range`, or `None` when the sampler
/// left the whole group at zero.
pub fn decode_choice(sample: &Sample, range: GroupRange) -> Option<usize> {
    range.indices().position(|i| sample.get(i) == 1)
}

impl<T> VariableGroup<T> {
    pub fn decode(&self, sample: &Sample) -> Option<&T> {
        decode_choice(sample, self.range()).map(|local| &self.values()[local])
    }
}

/// Decoded attributes of one branch. Each field is independent: an
/// unresolved group leaves only its own attributes empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BranchChoice {
    pub flower: Option<String>,
    pub length: Option<f64>,
    pub azimuth: Option<f64>,
    pub elevation: Option<f64>,
}

impl BranchChoice {
    pub fn is_resolved(&self) -> bool {
        self.flower.is_some()
            && self.length.is_some()
            && self.azimuth.is_some()
            && self.elevation.is_some()
    }
}

impl BranchGroups {
    pub fn decode(&self, sample: &Sample) -> BranchChoice {
        let entry = self.domain.decode(sample);
        let choice = BranchChoice {
            flower: entry.map(|e| e.flower.clone()),
            length: entry.map(|e| e.length),
            azimuth: self.azimuth.decode(sample).copied(),
            elevation: self.elevation.decode(sample).copied(),
        };
        if !choice.is_resolved() {
            warn_unresolved(self.role, &choice);
        }
        choice
    }
}

fn warn_unresolved(role: Role, choice: &BranchChoice) {
    tracing::warn!(
        %role,
        domain = choice.flower.is_some(),
        azimuth = choice.azimuth.is_some(),
        elevation = choice.elevation.is_some(),
        "one-hot group left unresolved by sampler"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainEntry;
    use crate::registry::{AngleGroups, VariableRegistry};

    fn groups() -> (BranchGroups, usize) {
        let mut registry = VariableRegistry::new();
        let angles = AngleGroups::register(
            &mut registry,
            Role::Middle1,
            vec![-50.0, -40.0, 40.0, 50.0],
            vec![30.0, 40.0],
        );
        let domain = [(60.0, "sakura"), (23.0, "rose")]
            .iter()
            .map(|&(length, flower)| DomainEntry {
                flower: flower.into(),
                candidate: 0,
                length,
            })
            .collect();
        let groups = angles.with_domain(&mut registry, domain);
        (groups, registry.width())
    }

    #[test]
    fn decodes_first_set_bit() {
        let (g, width) = groups();
        // azimuth local 2, elevation local 0, domain local 1
        let sample = Sample::with_ones(width, [2, 4, 7]);
        let choice = g.decode(&sample);
        assert_eq!(choice.azimuth, Some(40.0));
        assert_eq!(choice.elevation, Some(30.0));
        assert_eq!(choice.flower.as_deref(), Some("rose"));
        assert_eq!(choice.length, Some(23.0));
        assert!(choice.is_resolved());
    }

    #[test]
    fn violated_group_picks_lowest_index() {
        let (g, width) = groups();
        let sample = Sample::with_ones(width, [1, 3]);
        assert_eq!(g.azimuth.decode(&sample), Some(&-40.0));
    }

    #[test]
    fn empty_group_is_unresolved_not_fatal() {
        let (g, width) = groups();
        let sample = Sample::with_ones(width, [0, 6]);
        let first = g.decode(&sample);
        assert_eq!(first.azimuth, Some(-50.0));
        assert_eq!(first.elevation, None);
        assert_eq!(first.flower.as_deref(), Some("sakura"));
        assert!(!first.is_resolved());

        let second = g.decode(&sample);
        assert_eq!(first, second);
    }

    #[test]
    fn short_sample_decodes_as_unresolved() {
        let (g, _) = groups();
        let choice = g.decode(&Sample::from_bits(vec![1]));
        assert_eq!(choice.azimuth, Some(-50.0));
        assert_eq!(choice.flower, None);
        assert_eq!(choice.length, None);
    }
}
