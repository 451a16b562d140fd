use std::{
    sync::Arc,
    thread::JoinHandle,
    time::{Duration, Instant},
};

use log::{debug, info};

use crate::{
    Histogram, HistogramAggregator, Mailbox, Message, SimulationError, TerminationTracker,
    Topology,
    error::Result,
    random::{Randomizer, Seed},
    sensor::SensorWorker,
    termination::Mailboxes,
};

// Keeps injection draws apart from the topology stream of the same seed
const K_INJECTION_SALT: Seed = 0x5eed_cafe;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct Report {
    /// Delivery counts, ascending by hop count.
    pub histogram: Histogram,
    pub seed: Seed,
    /// Deepest any single mailbox got during the run.
    pub peak_mailbox_depth: usize,
    pub elapsed: Duration,
}

/// A built network, ready to run once.
pub struct Simulation {
    seed: Seed,
    topology: Arc<Topology>,
    stack_size: Option<usize>,
}

impl Simulation {
    pub(crate) fn new(seed: Seed, topology: Topology, stack_size: Option<usize>) -> Self {
        Self {
            seed,
            topology: Arc::new(topology),
            stack_size,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }

    /// Seeds one message per sensor, runs every sensor on its own thread and
    /// blocks until all messages are delivered or the run is aborted.
    pub fn run(self) -> Result<Report> {
        let started = Instant::now();
        let sensors = self.topology.size();

        let mailboxes: Mailboxes = (0..sensors).map(|_| Mailbox::new()).collect();
        let tracker = Arc::new(TerminationTracker::new(sensors, mailboxes.clone()));
        let aggregator = Arc::new(HistogramAggregator::new(tracker.clone()));

        self.inject(&mailboxes)?;

        let handles = self.spawn_sensors(&mailboxes, &aggregator, &tracker);
        info!(
            "{} sensors running on a {:?} network",
            handles.len(),
            self.topology.wiring()
        );

        for handle in handles {
            let name = handle.thread().name().unwrap_or("sensor").to_string();
            if handle.join().is_err() {
                tracker.abort(SimulationError::violation(format!("{name} panicked")));
            }
        }

        tracker.outcome()?;

        let peak_mailbox_depth = mailboxes
            .iter()
            .map(Mailbox::high_watermark)
            .max()
            .unwrap_or(0);
        if peak_mailbox_depth > sensors {
            return Err(SimulationError::violation(format!(
                "a mailbox held {peak_mailbox_depth} messages, only {sensors} exist"
            )));
        }

        let histogram = Arc::try_unwrap(aggregator)
            .map_err(|_| SimulationError::violation("aggregator still shared after join"))?
            .into_histogram()?;

        let elapsed = started.elapsed();
        info!(
            "All {} messages delivered in {:?}, max {} hops. Looks good! ヽ('ー`)ノ",
            sensors,
            elapsed,
            histogram.max_hops().unwrap_or(0)
        );

        Ok(Report {
            histogram,
            seed: self.seed,
            peak_mailbox_depth,
            elapsed,
        })
    }
}

impl Simulation {
    // Every sensor starts with one message for some other sensor in its own
    // mailbox.
    fn inject(&self, mailboxes: &Mailboxes) -> Result<()> {
        let sensors = self.topology.size();
        let mut random = Randomizer::new(self.seed ^ K_INJECTION_SALT);
        for (origin, mailbox) in mailboxes.iter().enumerate() {
            let destination = random.other_than(origin, sensors);
            debug!("Injecting message S{origin} -> S{destination}");
            mailbox
                .push(Message::seed(origin, destination))
                .map_err(|_| SimulationError::violation("mailbox closed before start"))?;
        }
        Ok(())
    }

    // On a spawn failure the already running sensors are shut down through
    // the tracker and the error surfaces from `outcome`.
    fn spawn_sensors(
        &self,
        mailboxes: &Mailboxes,
        aggregator: &Arc<HistogramAggregator>,
        tracker: &TerminationTracker,
    ) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(mailboxes.len());
        for id in 0..mailboxes.len() {
            let worker = SensorWorker::new(
                id,
                self.seed,
                self.topology.clone(),
                mailboxes.clone(),
                aggregator.clone(),
            );
            match worker.spawn(self.stack_size) {
                Ok(handle) => handles.push(handle),
                Err(failure) => {
                    tracker.abort(SimulationError::Spawn(failure));
                    break;
                }
            }
        }
        handles
    }
}
