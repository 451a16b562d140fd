use log::info;

use crate::{
    Simulation, Wiring,
    error::Result,
    random::{self, Randomizer, Seed},
    topology::NetworkBuilder,
};

fn init_logger() {
    let _ = env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let module_path = record.module_path().unwrap_or("unknown");
            let crate_name = module_path.split("::").next().unwrap_or(module_path);
            use std::io::Write;
            writeln!(buf, "[{}] {}", crate_name, record.args())
        })
        .try_init();
}

pub struct SimulationBuilder {
    seed: Option<Seed>,
    nodes: usize,
    neighbours: usize,
    wiring: Wiring,
    max_attempts: usize,
    density_bound: bool,
    stack_size: Option<usize>,
}

impl Default for SimulationBuilder {
    fn default() -> Self {
        SimulationBuilder {
            seed: None,
            nodes: 10,
            neighbours: 5,
            wiring: Wiring::Undirected,
            max_attempts: 32,
            density_bound: true,
            stack_size: Some(256 * 1024),
        }
    }
}

impl SimulationBuilder {
    pub fn nodes(mut self, nodes: usize) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn neighbours(mut self, neighbours: usize) -> Self {
        self.neighbours = neighbours;
        self
    }

    pub fn wiring(mut self, wiring: Wiring) -> Self {
        self.wiring = wiring;
        self
    }

    /// Pins every random choice made while building and routing. Runs are
    /// still not replayable message by message, sensors interleave freely.
    pub fn seed(mut self, seed: Seed) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Accept networks violating `2*M + 2 > N`; they are kept only if the
    /// reachability check passes.
    pub fn enforce_density_bound(mut self, enforced: bool) -> Self {
        self.density_bound = enforced;
        self
    }

    /// Stack size of every sensor thread, `None` for the platform default.
    pub fn stack_size(mut self, stack_size: Option<usize>) -> Self {
        self.stack_size = stack_size;
        self
    }

    pub fn build(self) -> Result<Simulation> {
        init_logger();

        let network = NetworkBuilder::new(self.nodes, self.neighbours)
            .wiring(self.wiring)
            .max_attempts(self.max_attempts)
            .density_bound(self.density_bound);
        network.validate()?;

        let seed = self.seed.unwrap_or_else(random::entropy_seed);
        info!(
            "Building {:?} network: {} sensors, {} neighbours each, seed {}",
            self.wiring, self.nodes, self.neighbours, seed
        );

        let topology = network.build(&mut Randomizer::new(seed))?;
        Ok(Simulation::new(seed, topology, self.stack_size))
    }
}
