use rand::{Rng, SeedableRng, seq::IndexedRandom, seq::SliceRandom, seq::index};

use crate::NodeId;

pub type Seed = u64;

pub(crate) struct Randomizer {
    rnd: rand::rngs::StdRng,
}

impl Randomizer {
    pub(crate) fn new(seed: Seed) -> Self {
        Self {
            rnd: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }

    // Prevent resonance between sensors by changing seed a little bit
    pub(crate) fn for_sensor(base_seed: Seed, id: NodeId) -> Self {
        Self::new(base_seed.wrapping_add(id as u64 + 1))
    }

    /// Uniform index in `[0, upper)`.
    pub(crate) fn below(&mut self, upper: usize) -> usize {
        self.rnd.random_range(0..upper)
    }

    pub(crate) fn choose_from_slice<T: Copy>(&mut self, from: &[T]) -> Option<T> {
        from.choose(&mut self.rnd).copied()
    }

    /// Uniformly chosen node in `[0, nodes)` that is not `excluded`.
    /// Requires at least two nodes.
    pub(crate) fn other_than(&mut self, excluded: NodeId, nodes: usize) -> NodeId {
        debug_assert!(nodes >= 2, "No node other than {excluded} exists");
        let pick = self.below(nodes - 1);
        if pick >= excluded { pick + 1 } else { pick }
    }

    /// `amount` distinct nodes from `[0, nodes)` excluding `excluded`.
    pub(crate) fn distinct_others(
        &mut self,
        excluded: NodeId,
        nodes: usize,
        amount: usize,
    ) -> Vec<NodeId> {
        index::sample(&mut self.rnd, nodes - 1, amount)
            .into_iter()
            .map(|pick| if pick >= excluded { pick + 1 } else { pick })
            .collect()
    }

    pub(crate) fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rnd);
    }
}

/// Fresh seed for runs where the caller did not pin one.
pub(crate) fn entropy_seed() -> Seed {
    rand::random()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_than_never_returns_excluded() {
        let mut random = Randomizer::new(7);
        for excluded in 0..5 {
            for _ in 0..200 {
                let pick = random.other_than(excluded, 5);
                assert_ne!(pick, excluded);
                assert!(pick < 5);
            }
        }
    }

    #[test]
    fn distinct_others_are_distinct_and_skip_excluded() {
        let mut random = Randomizer::new(11);
        let mut picks = random.distinct_others(3, 10, 9);
        picks.sort_unstable();
        assert_eq!(picks, vec![0, 1, 2, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Randomizer::new(42);
        let mut b = Randomizer::new(42);
        let xs: Vec<usize> = (0..16).map(|_| a.below(1000)).collect();
        let ys: Vec<usize> = (0..16).map(|_| b.below(1000)).collect();
        assert_eq!(xs, ys);
    }
}
