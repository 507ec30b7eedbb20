//! Fitness ranking, breeding-pool split and replacement arithmetic.

use crate::config::{PoolSizePolicy, Ranking, ReplacementPolicy, SelectionConfig};
use crate::fish::Fish;

/// Living fish split by rank. Both lists hold indices into the population,
/// best first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BreedingPools {
    pub breeding: Vec<usize>,
    pub non_breeding: Vec<usize>,
}

impl BreedingPools {
    #[must_use]
    pub fn living(&self) -> usize {
        self.breeding.len() + self.non_breeding.len()
    }

    /// Fish carried into the next generation unchanged.
    #[must_use]
    pub fn kept(&self, policy: ReplacementPolicy) -> &[usize] {
        match policy {
            ReplacementPolicy::KeepParents => &self.breeding,
            ReplacementPolicy::KeepNonBreeders => &self.non_breeding,
        }
    }
}

#[must_use]
pub fn rank_score(fish: &Fish, selection: &SelectionConfig) -> f64 {
    match selection.ranking {
        Ranking::Fitness => fish.calculate_fitness(selection),
        Ranking::Energy => fish.energy(),
    }
}

/// Indices of living fish sorted by descending score. Equal scores keep
/// population order.
#[must_use]
pub fn rank_living(fish: &[Fish], selection: &SelectionConfig) -> Vec<usize> {
    let mut ranked: Vec<(usize, f64)> = fish
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.is_dead())
        .map(|(i, f)| (i, rank_score(f, selection)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().map(|(i, _)| i).collect()
}

/// Breeding pool size before the parity adjustment.
#[must_use]
pub fn pool_size(living: usize, target: usize, policy: PoolSizePolicy) -> usize {
    match policy {
        PoolSizePolicy::HalfLiving => living.div_ceil(2),
        PoolSizePolicy::HalfTarget => target.div_ceil(2).min(living),
    }
}

/// Ranks the living fish and splits them into breeding and non-breeding
/// pools. With `require_even_pool` an odd pool hands its weakest member to
/// the non-breeders.
#[must_use]
pub fn split_pools(fish: &[Fish], target: usize, selection: &SelectionConfig) -> BreedingPools {
    let ranked = rank_living(fish, selection);
    let mut size = pool_size(ranked.len(), target, selection.pool_size);
    if selection.require_even_pool && size % 2 == 1 {
        size -= 1;
    }
    let mut breeding = ranked;
    let non_breeding = breeding.split_off(size);
    BreedingPools {
        breeding,
        non_breeding,
    }
}

/// How many offspring fill the next generation up to `target`.
#[must_use]
pub fn offspring_needed(kept: usize, offspring: usize, target: usize) -> usize {
    offspring.min(target.saturating_sub(kept))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_size_policies() {
        assert_eq!(pool_size(7, 10, PoolSizePolicy::HalfLiving), 4);
        assert_eq!(pool_size(0, 10, PoolSizePolicy::HalfLiving), 0);
        assert_eq!(pool_size(7, 10, PoolSizePolicy::HalfTarget), 5);
        assert_eq!(pool_size(3, 10, PoolSizePolicy::HalfTarget), 3);
    }

    #[test]
    fn test_offspring_needed() {
        assert_eq!(offspring_needed(5, 5, 10), 5);
        assert_eq!(offspring_needed(5, 20, 10), 5);
        assert_eq!(offspring_needed(12, 5, 10), 0);
        assert_eq!(offspring_needed(2, 3, 10), 3);
    }

    #[test]
    fn test_kept_follows_policy() {
        let pools = BreedingPools {
            breeding: vec![3, 1],
            non_breeding: vec![0, 2, 4],
        };
        assert_eq!(pools.kept(ReplacementPolicy::KeepParents), &[3, 1]);
        assert_eq!(pools.kept(ReplacementPolicy::KeepNonBreeders), &[0, 2, 4]);
        assert_eq!(pools.living(), 5);
    }
}
