use std::collections::{HashSet, VecDeque};

use log::debug;

use crate::{
    NodeId, SimulationError,
    error::Result,
    random::{Randomizer, Seed},
};

/// How neighbour lists are wired together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Wiring {
    /// Simple undirected M-regular graph: `b` is a neighbour of `a` iff `a` is
    /// a neighbour of `b`. Needs `nodes * neighbours` to be even.
    #[default]
    Undirected,
    /// Every sensor picks its own M neighbours. Messages only travel along
    /// picked links, so the network must be strongly connected.
    Directed,
}

/// Immutable adjacency table shared by every sensor.
#[derive(Debug, Clone)]
pub struct Topology {
    neighbours: Vec<Vec<NodeId>>,
    wiring: Wiring,
}

impl Topology {
    pub fn size(&self) -> usize {
        self.neighbours.len()
    }

    pub fn wiring(&self) -> Wiring {
        self.wiring
    }

    pub fn neighbours(&self, id: NodeId) -> &[NodeId] {
        &self.neighbours[id]
    }

    /// Hand-wired table with none of the builder's guarantees.
    #[cfg(test)]
    pub(crate) fn from_neighbours(neighbours: Vec<Vec<NodeId>>, wiring: Wiring) -> Self {
        Self { neighbours, wiring }
    }

    /// Every sensor can reach every other sensor along neighbour links.
    pub fn is_connected(&self) -> bool {
        if self.size() == 0 {
            return true;
        }
        if reachable_from_first(&self.neighbours) != self.size() {
            return false;
        }
        match self.wiring {
            Wiring::Undirected => true,
            Wiring::Directed => reachable_from_first(&self.reversed()) == self.size(),
        }
    }

    fn reversed(&self) -> Vec<Vec<NodeId>> {
        let mut reversed = vec![Vec::new(); self.size()];
        for (from, targets) in self.neighbours.iter().enumerate() {
            for &to in targets {
                reversed[to].push(from);
            }
        }
        reversed
    }
}

fn reachable_from_first(adjacency: &[Vec<NodeId>]) -> usize {
    let mut visited = vec![false; adjacency.len()];
    let mut queue = VecDeque::from([0]);
    visited[0] = true;
    let mut seen = 1;

    while let Some(id) = queue.pop_front() {
        for &next in &adjacency[id] {
            if !visited[next] {
                visited[next] = true;
                seen += 1;
                queue.push_back(next);
            }
        }
    }

    seen
}

/// Builds random sensor networks in which every sensor has exactly
/// `neighbours` distinct neighbours and no self-link.
pub struct NetworkBuilder {
    nodes: usize,
    neighbours: usize,
    wiring: Wiring,
    max_attempts: usize,
    density_bound: bool,
}

impl NetworkBuilder {
    pub fn new(nodes: usize, neighbours: usize) -> Self {
        Self {
            nodes,
            neighbours,
            wiring: Wiring::default(),
            max_attempts: 32,
            density_bound: true,
        }
    }

    /// With the bound off, sparse networks are accepted and connectivity
    /// rests on the reachability check and retries alone.
    pub fn density_bound(mut self, enforced: bool) -> Self {
        self.density_bound = enforced;
        self
    }

    pub fn wiring(mut self, wiring: Wiring) -> Self {
        self.wiring = wiring;
        self
    }

    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Rejects node/neighbour counts that cannot yield a connected network
    /// where every message has somewhere to go.
    pub fn validate(&self) -> Result<()> {
        let (n, m) = (self.nodes, self.neighbours);
        if n < 2 {
            return Err(SimulationError::configuration(format!(
                "need at least 2 sensors so every message has another addressee, got {n}"
            )));
        }
        if m == 0 {
            return Err(SimulationError::configuration(
                "every sensor needs at least one neighbour",
            ));
        }
        if m >= n {
            return Err(SimulationError::configuration(format!(
                "cannot pick {m} distinct neighbours among {} other sensors",
                n - 1
            )));
        }
        if self.density_bound && 2 * m + 2 <= n {
            return Err(SimulationError::configuration(format!(
                "{n} sensors with {m} neighbours each may be disconnected, need 2*M + 2 > N"
            )));
        }
        if self.wiring == Wiring::Undirected && (n * m) % 2 != 0 {
            return Err(SimulationError::configuration(format!(
                "no undirected network of {n} sensors has exactly {m} neighbours each, N*M must be even"
            )));
        }
        if self.max_attempts == 0 {
            return Err(SimulationError::configuration(
                "at least one construction attempt is required",
            ));
        }
        Ok(())
    }

    /// Builds a network from a fixed seed; the same seed gives the same
    /// network.
    pub fn build_seeded(&self, seed: Seed) -> Result<Topology> {
        self.build(&mut Randomizer::new(seed))
    }

    pub(crate) fn build(&self, random: &mut Randomizer) -> Result<Topology> {
        self.validate()?;

        for attempt in 1..=self.max_attempts {
            let neighbours = match self.wiring {
                Wiring::Undirected => self.undirected(random),
                Wiring::Directed => self.directed(random),
            };
            let topology = Topology {
                neighbours,
                wiring: self.wiring,
            };
            if topology.is_connected() {
                debug!("Connected {:?} network built on attempt {attempt}", self.wiring);
                return Ok(topology);
            }
            debug!("Attempt {attempt} produced a disconnected network, retrying");
        }

        Err(SimulationError::GraphConstruction {
            attempts: self.max_attempts,
        })
    }

    fn directed(&self, random: &mut Randomizer) -> Vec<Vec<NodeId>> {
        (0..self.nodes)
            .map(|id| random.distinct_others(id, self.nodes, self.neighbours))
            .collect()
    }

    // Circulant M-regular graph under a random relabelling, then mixed with
    // degree-preserving double edge swaps.
    fn undirected(&self, random: &mut Randomizer) -> Vec<Vec<NodeId>> {
        let (n, m) = (self.nodes, self.neighbours);

        let mut label: Vec<NodeId> = (0..n).collect();
        random.shuffle(&mut label);

        let mut edges = Vec::with_capacity(n * m / 2);
        for i in 0..n {
            for offset in 1..=m / 2 {
                edges.push(ordered(label[i], label[(i + offset) % n]));
            }
            if m % 2 == 1 && i < n / 2 {
                edges.push(ordered(label[i], label[i + n / 2]));
            }
        }

        let mut present: HashSet<(NodeId, NodeId)> = edges.iter().copied().collect();
        debug_assert_eq!(present.len(), edges.len(), "Circulant base has duplicate edges");

        for _ in 0..edges.len() * 4 {
            let first = random.below(edges.len());
            let second = random.below(edges.len());
            let (a, b) = edges[first];
            let (c, d) = edges[second];
            if a == c || a == d || b == c || b == d {
                continue;
            }
            let (ad, cb) = (ordered(a, d), ordered(c, b));
            if present.contains(&ad) || present.contains(&cb) {
                continue;
            }
            present.remove(&(a, b));
            present.remove(&(c, d));
            present.insert(ad);
            present.insert(cb);
            edges[first] = ad;
            edges[second] = cb;
        }

        let mut neighbours = vec![Vec::with_capacity(m); n];
        for (a, b) in edges {
            neighbours[a].push(b);
            neighbours[b].push(a);
        }
        neighbours.iter_mut().for_each(|list| list.sort_unstable());
        neighbours
    }
}

fn ordered(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a < b { (a, b) } else { (b, a) }
}
