use crate::domain::DomainEntry;
use crate::role::Role;
use std::ops::Range;

/// Reserved `[offset, offset + count)` slice of the global variable space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupRange {
    pub offset: usize,
    pub count: usize,
}

impl GroupRange {
    pub fn end(&self) -> usize {
        self.offset + self.count
    }

    pub fn indices(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Global index of the `local`-th choice.
    pub fn index(&self, local: usize) -> usize {
        debug_assert!(local < self.count, "local index {} out of {}", local, self.count);
        self.offset + local
    }
}

/// Hands out disjoint, contiguous index ranges in request order.
#[derive(Debug, Default)]
pub struct VariableRegistry {
    width: usize,
    groups: Vec<(String, GroupRange)>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, name: impl Into<String>, count: usize) -> GroupRange {
        let range = GroupRange {
            offset: self.width,
            count,
        };
        self.width += count;
        self.groups.push((name.into(), range));
        range
    }

    /// Total number of allocated variables.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn groups(&self) -> &[(String, GroupRange)] {
        &self.groups
    }
}

/// A one-of-many decision: an allocated range plus the value each local
/// index stands for.
#[derive(Clone, Debug)]
pub struct VariableGroup<T> {
    range: GroupRange,
    values: Vec<T>,
}

impl<T> VariableGroup<T> {
    pub fn register(
        registry: &mut VariableRegistry,
        name: impl Into<String>,
        values: Vec<T>,
    ) -> Self {
        let range = registry.allocate(name, values.len());
        Self { range, values }
    }

    pub fn range(&self) -> GroupRange {
        self.range
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn index(&self, local: usize) -> usize {
        self.range.index(local)
    }

    /// `(global index, value)` pairs in local order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        let offset = self.range.offset;
        self.values
            .iter()
            .enumerate()
            .map(move |(local, value)| (offset + local, value))
    }
}

/// The three decision groups owned by one branch role.
#[derive(Clone, Debug)]
pub struct BranchGroups {
    pub role: Role,
    pub azimuth: VariableGroup<f64>,
    pub elevation: VariableGroup<f64>,
    pub domain: VariableGroup<DomainEntry>,
}

/// Angle groups allocated ahead of the role's domain group.
#[derive(Debug)]
pub struct AngleGroups {
    role: Role,
    azimuth: VariableGroup<f64>,
    elevation: VariableGroup<f64>,
}

impl AngleGroups {
    pub fn register(
        registry: &mut VariableRegistry,
        role: Role,
        azimuths: Vec<f64>,
        elevations: Vec<f64>,
    ) -> Self {
        Self {
            role,
            azimuth: VariableGroup::register(registry, format!("{role} azimuth"), azimuths),
            elevation: VariableGroup::register(registry, format!("{role} elevation"), elevations),
        }
    }

    pub fn with_domain(
        self,
        registry: &mut VariableRegistry,
        domain: Vec<DomainEntry>,
    ) -> BranchGroups {
        let domain = VariableGroup::register(registry, format!("{} domain", self.role), domain);
        BranchGroups {
            role: self.role,
            azimuth: self.azimuth,
            elevation: self.elevation,
            domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact_cover(registry: &VariableRegistry) {
        let mut covered = vec![0u32; registry.width()];
        for (_, range) in registry.groups() {
            for i in range.indices() {
                covered[i] += 1;
            }
        }
        assert!(covered.iter().all(|&c| c == 1), "cover = {:?}", covered);
    }

    #[test]
    fn allocation_covers_width_without_overlap() {
        let requests: [&[usize]; 4] = [
            &[5, 3, 1, 1, 4, 5, 4, 5, 21, 21, 21, 21],
            &[0, 0, 3],
            &[1],
            &[],
        ];
        for counts in requests {
            let mut registry = VariableRegistry::new();
            let mut expected_offset = 0;
            for (k, &count) in counts.iter().enumerate() {
                let range = registry.allocate(format!("g{k}"), count);
                assert_eq!(range.offset, expected_offset);
                expected_offset += count;
            }
            assert_eq!(registry.width(), counts.iter().sum::<usize>());
            assert_exact_cover(&registry);
        }
    }

    #[test]
    fn group_iter_yields_global_indices() {
        let mut registry = VariableRegistry::new();
        registry.allocate("padding", 7);
        let group = VariableGroup::register(&mut registry, "main azimuth", vec![-10.0, 0.0, 10.0]);
        let pairs: Vec<_> = group.iter().map(|(i, v)| (i, *v)).collect();
        assert_eq!(pairs, vec![(7, -10.0), (8, 0.0), (9, 10.0)]);
        assert_eq!(group.range().end(), 10);
        assert_eq!(registry.width(), 10);
    }

    #[test]
    fn angle_groups_precede_domain_groups() {
        let mut registry = VariableRegistry::new();
        let main = AngleGroups::register(&mut registry, Role::Main, vec![0.0; 5], vec![0.0; 3]);
        let guest = AngleGroups::register(&mut registry, Role::Guest, vec![0.0], vec![45.0]);
        let entry = DomainEntry {
            flower: "dill".into(),
            candidate: 0,
            length: 60.0,
        };
        let main = main.with_domain(&mut registry, vec![entry.clone(), entry.clone()]);
        let guest = guest.with_domain(&mut registry, vec![entry]);

        assert_eq!(main.azimuth.range().offset, 0);
        assert_eq!(guest.elevation.range().offset, 9);
        assert_eq!(main.domain.range().offset, 10);
        assert_eq!(guest.domain.range().offset, 12);
        assert_eq!(registry.groups()[4].0, "main domain");
        assert_exact_cover(&registry);
    }
}
