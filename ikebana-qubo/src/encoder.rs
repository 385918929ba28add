//! Constraint families. Each function adds its terms into the accumulator
//! it is handed; none of them read or overwrite existing coefficients.

use crate::domain::DomainEntry;
use crate::qubo::Qubo;
use crate::registry::VariableGroup;
use crate::role::Side;

/// Target ratio between the two base middle branches.
pub const SILVER_RATIO: f64 = 1.414;

/// `A·(Σx − 1)²` without the constant: `−A` per variable, `+2A` per pair.
pub fn one_hot<T>(qubo: &mut Qubo, group: &VariableGroup<T>, weight: f64) {
    let range = group.range();
    for i in range.indices() {
        qubo.add(i, i, -weight);
        for j in (i + 1)..range.end() {
            qubo.add(i, j, 2.0 * weight);
        }
    }
}

/// Penalises picking the same flower in both groups.
pub fn no_duplicate_flower(
    qubo: &mut Qubo,
    a: &VariableGroup<DomainEntry>,
    b: &VariableGroup<DomainEntry>,
    penalty: f64,
) {
    for (i, ea) in a.iter() {
        for (j, eb) in b.iter() {
            if ea.flower == eb.flower {
                qubo.add(i, j, penalty);
            }
        }
    }
}

/// Linear bonus on every candidate of `flower`.
pub fn forced_flower_bonus(
    qubo: &mut Qubo,
    group: &VariableGroup<DomainEntry>,
    flower: &str,
    bonus: f64,
) {
    for (i, entry) in group.iter() {
        if entry.flower == flower {
            qubo.add(i, i, -bonus);
        }
    }
}

/// `weight·(length − limit)²` for candidates longer than `limit`.
pub fn length_limit(qubo: &mut Qubo, group: &VariableGroup<DomainEntry>, limit: f64, weight: f64) {
    for (i, entry) in group.iter() {
        if entry.length > limit {
            qubo.add(i, i, (entry.length - limit).powi(2) * weight);
        }
    }
}

/// `weight·(limit − length)²` for candidates within `limit`; pulls the
/// choice up towards the limit.
pub fn near_limit_reward(
    qubo: &mut Qubo,
    group: &VariableGroup<DomainEntry>,
    limit: f64,
    weight: f64,
) {
    for (i, entry) in group.iter() {
        if entry.length <= limit {
            qubo.add(i, i, (limit - entry.length).powi(2) * weight);
        }
    }
}

/// `weight·(child − parent/divisor)²` for every length pair.
pub fn proportional_length(
    qubo: &mut Qubo,
    parent: &VariableGroup<DomainEntry>,
    child: &VariableGroup<DomainEntry>,
    divisor: f64,
    weight: f64,
) {
    for (i, p) in parent.iter() {
        for (j, c) in child.iter() {
            let cost = (c.length - p.length / divisor).powi(2);
            qubo.add(i, j, cost * weight);
        }
    }
}

/// `weight·angle²` on each candidate.
pub fn angle_centering(qubo: &mut Qubo, group: &VariableGroup<f64>, weight: f64) {
    for (i, &angle) in group.iter() {
        qubo.add(i, i, angle.powi(2) * weight);
    }
}

/// Couples two angle groups with `weight·(|a − b| − threshold)²` whenever
/// the spread exceeds `threshold`.
pub fn spread_limit(
    qubo: &mut Qubo,
    anchor: &VariableGroup<f64>,
    other: &VariableGroup<f64>,
    threshold: f64,
    weight: f64,
) {
    for (i, &a) in anchor.iter() {
        for (j, &b) in other.iter() {
            let diff = (b - a).abs();
            if diff > threshold {
                qubo.add(i, j, (diff - threshold).powi(2) * weight);
            }
        }
    }
}

/// `weight·(|angle| − bound)²` for candidates outside `±bound`.
pub fn elevation_clamp(qubo: &mut Qubo, group: &VariableGroup<f64>, bound: f64, weight: f64) {
    for (i, &el) in group.iter() {
        if el.abs() > bound {
            qubo.add(i, i, (el.abs() - bound).powi(2) * weight);
        }
    }
}

/// `weight·(short − long)²` whenever the `short` candidate is not shorter.
pub fn shorter_than(
    qubo: &mut Qubo,
    long: &VariableGroup<DomainEntry>,
    short: &VariableGroup<DomainEntry>,
    weight: f64,
) {
    for (i, l) in long.iter() {
        for (j, s) in short.iter() {
            if s.length >= l.length {
                qubo.add(i, j, (s.length - l.length).powi(2) * weight);
            }
        }
    }
}

/// Linear reward on every azimuth strictly inside `side`'s half-plane.
pub fn side_bias(qubo: &mut Qubo, group: &VariableGroup<f64>, side: Side, reward: f64) {
    for (i, &az) in group.iter() {
        if side.prefers(az) {
            qubo.add(i, i, -reward);
        }
    }
}

/// Fixed penalty on every cross pair with numerically equal lengths.
pub fn equal_length(
    qubo: &mut Qubo,
    a: &VariableGroup<DomainEntry>,
    b: &VariableGroup<DomainEntry>,
    penalty: f64,
) {
    for (i, ea) in a.iter() {
        for (j, eb) in b.iter() {
            if ea.length == eb.length {
                qubo.add(i, j, penalty);
            }
        }
    }
}

/// `weight·(b − ratio·a)²` for every length pair.
pub fn ratio_coupling(
    qubo: &mut Qubo,
    a: &VariableGroup<DomainEntry>,
    b: &VariableGroup<DomainEntry>,
    ratio: f64,
    weight: f64,
) {
    for (i, ea) in a.iter() {
        for (j, eb) in b.iter() {
            qubo.add(i, j, (eb.length - ratio * ea.length).powi(2) * weight);
        }
    }
}

/// Linear `weight·(gap − |angle − fixed|)²` for each fixed angle closer
/// than `gap`.
pub fn separation(
    qubo: &mut Qubo,
    group: &VariableGroup<f64>,
    fixed: &[f64],
    gap: f64,
    weight: f64,
) {
    for (i, &angle) in group.iter() {
        for &other in fixed {
            let diff = (angle - other).abs();
            if diff < gap {
                qubo.add(i, i, (gap - diff).powi(2) * weight);
            }
        }
    }
}

/// Penalises two groups picking the same local index.
pub fn same_choice<T>(qubo: &mut Qubo, a: &VariableGroup<T>, b: &VariableGroup<T>, penalty: f64) {
    for local in 0..a.range().count.min(b.range().count) {
        qubo.add(a.index(local), b.index(local), penalty);
    }
}
