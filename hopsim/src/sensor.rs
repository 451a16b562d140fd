//! The per-sensor worker loop.
//!
//! Every sensor runs on its own OS thread and only ever blocks inside
//! [`Mailbox::receive`]. A message addressed to the sensor is handed to the
//! [`HistogramAggregator`], anything else goes one hop further to a uniformly
//! chosen neighbour.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread::{self, JoinHandle},
};

use crate::{
    HistogramAggregator, NodeId, Received, SimulationError, Topology, debug_sensor,
    error::Result, mailbox::MailboxClosed, random::Randomizer, random::Seed,
    termination::{Mailboxes, Phase},
};

pub(crate) struct SensorWorker {
    id: NodeId,
    topology: Arc<Topology>,
    mailboxes: Mailboxes,
    aggregator: Arc<HistogramAggregator>,
    random: Randomizer,
}

impl SensorWorker {
    pub(crate) fn new(
        id: NodeId,
        seed: Seed,
        topology: Arc<Topology>,
        mailboxes: Mailboxes,
        aggregator: Arc<HistogramAggregator>,
    ) -> Self {
        Self {
            id,
            topology,
            mailboxes,
            aggregator,
            random: Randomizer::for_sensor(seed, id),
        }
    }

    /// Starts the sensor on a dedicated thread named `sensor-<id>`.
    pub(crate) fn spawn(self, stack_size: Option<usize>) -> std::io::Result<JoinHandle<()>> {
        let mut builder = thread::Builder::new().name(format!("sensor-{}", self.id));
        if let Some(stack_size) = stack_size {
            builder = builder.stack_size(stack_size);
        }
        builder.spawn(move || self.run_guarded())
    }

    // A panic must not leave the other sensors parked forever.
    fn run_guarded(mut self) {
        let id = self.id;
        let aggregator = self.aggregator.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run()));
        match outcome {
            Ok(Ok(())) => debug_sensor!(id, "Shutting down"),
            Ok(Err(failure)) => aggregator.tracker().abort(failure),
            Err(_) => aggregator
                .tracker()
                .abort(SimulationError::violation(format!("sensor {id} panicked"))),
        }
    }

    pub(crate) fn run(&mut self) -> Result<()> {
        let mailbox = &self.mailboxes[self.id];
        loop {
            let message = match mailbox.receive() {
                Received::Shutdown => return Ok(()),
                Received::Message(message) => message,
            };

            if message.destination() == self.id {
                debug_sensor!(self.id, "Delivered {message}");
                self.aggregator.record_delivery(message);
                continue;
            }

            let next = self
                .random
                .choose_from_slice(self.topology.neighbours(self.id))
                .ok_or_else(|| {
                    SimulationError::violation(format!("sensor {} has no neighbours", self.id))
                })?;
            let message = message.forwarded()?;
            debug_sensor!(self.id, "Forwarding {message} via S{next}");

            if let Err(MailboxClosed(message)) = self.mailboxes[next].push(message) {
                return self.on_closed_neighbour(next, message.hops());
            }
        }
    }

    // Only legal once the run was already aborted.
    fn on_closed_neighbour(&self, next: NodeId, hops: usize) -> Result<()> {
        match self.aggregator.tracker().phase() {
            Phase::Aborted => {
                debug_sensor!(self.id, "S{next} is closed, run aborted, stopping");
                Ok(())
            }
            phase => Err(SimulationError::violation(format!(
                "S{next} closed its mailbox in phase {phase:?} while a message with {hops} hops was in flight"
            ))),
        }
    }

    #[cfg(test)]
    fn mailbox(&self) -> &crate::Mailbox {
        &self.mailboxes[self.id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Mailbox, Message, NetworkBuilder, TerminationTracker};

    struct Fixture {
        topology: Arc<Topology>,
        mailboxes: Mailboxes,
        aggregator: Arc<HistogramAggregator>,
    }

    impl Fixture {
        fn new(nodes: usize, neighbours: usize) -> Self {
            let topology = NetworkBuilder::new(nodes, neighbours)
                .build(&mut Randomizer::new(3))
                .unwrap();
            let mailboxes: Mailboxes = (0..nodes).map(|_| Mailbox::new()).collect();
            let tracker = Arc::new(TerminationTracker::new(nodes, mailboxes.clone()));
            Self {
                topology: Arc::new(topology),
                mailboxes,
                aggregator: Arc::new(HistogramAggregator::new(tracker)),
            }
        }

        fn worker(&self, id: NodeId) -> SensorWorker {
            SensorWorker::new(
                id,
                9,
                self.topology.clone(),
                self.mailboxes.clone(),
                self.aggregator.clone(),
            )
        }
    }

    #[test]
    fn foreign_message_goes_to_a_neighbour_with_one_more_hop() {
        let fixture = Fixture::new(4, 2);
        let mut worker = fixture.worker(0);
        let destination = (1..4)
            .find(|id| !fixture.topology.neighbours(0).contains(id))
            .unwrap_or(1);
        worker.mailbox().push(Message::seed(0, destination)).unwrap();
        worker.mailbox().close();

        worker.run().unwrap();

        let holders: Vec<_> = fixture
            .topology
            .neighbours(0)
            .iter()
            .filter(|&&id| !fixture.mailboxes[id].is_empty())
            .collect();
        assert_eq!(holders.len(), 1);
        match fixture.mailboxes[*holders[0]].receive() {
            Received::Message(message) => assert_eq!(message.hops(), 1),
            Received::Shutdown => panic!("Forwarded message went missing"),
        }
    }

    #[test]
    fn own_message_is_recorded() {
        let fixture = Fixture::new(2, 1);
        let mut worker = fixture.worker(1);
        worker
            .mailbox()
            .push(Message::seed(0, 1).forwarded().unwrap())
            .unwrap();
        worker.mailbox().close();

        worker.run().unwrap();
        assert_eq!(fixture.aggregator.tracker().delivered(), 1);
        assert!(fixture.mailboxes[0].is_empty());
    }

    #[test]
    fn closed_neighbour_during_running_phase_is_a_violation() {
        let fixture = Fixture::new(2, 1);
        let mut worker = fixture.worker(0);
        fixture.mailboxes[1].close();
        worker.mailbox().push(Message::seed(0, 1)).unwrap();
        worker.mailbox().close();

        assert!(matches!(
            worker.run(),
            Err(SimulationError::InternalInvariantViolation(_))
        ));
    }

    #[test]
    fn closed_neighbour_after_abort_stops_quietly() {
        let fixture = Fixture::new(2, 1);
        let mut worker = fixture.worker(0);
        worker.mailbox().push(Message::seed(0, 1)).unwrap();
        fixture
            .aggregator
            .tracker()
            .abort(SimulationError::violation("test abort"));

        assert!(worker.run().is_ok());
    }

    #[test]
    fn spawned_sensor_exits_on_shutdown() {
        let fixture = Fixture::new(2, 1);
        let handle = fixture.worker(0).spawn(Some(64 * 1024)).unwrap();
        assert_eq!(handle.thread().name(), Some("sensor-0"));
        fixture.mailboxes[0].close();
        handle.join().unwrap();
    }

    // utime + stime in clock ticks for every live `sensor-*` thread, by tid
    #[cfg(target_os = "linux")]
    fn sensor_cpu_ticks() -> std::collections::HashMap<u64, u64> {
        use std::fs;

        let mut ticks = std::collections::HashMap::new();
        for task in fs::read_dir("/proc/self/task").unwrap().flatten() {
            let Ok(stat) = fs::read_to_string(task.path().join("stat")) else {
                continue;
            };
            let (Some(open), Some(close)) = (stat.find('('), stat.rfind(')')) else {
                continue;
            };
            if !stat[open + 1..close].starts_with("sensor-") {
                continue;
            }
            // Fields 14 and 15 of proc_pid_stat(5), counted after the name
            let fields: Vec<&str> = stat[close + 1..].split_whitespace().collect();
            let used = fields[11].parse::<u64>().unwrap() + fields[12].parse::<u64>().unwrap();
            let tid = task.file_name().to_string_lossy().parse().unwrap();
            ticks.insert(tid, used);
        }
        ticks
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn idle_sensors_do_not_spin() {
        let fixture = Fixture::new(64, 33);
        let handles: Vec<_> = (0..64)
            .map(|id| fixture.worker(id).spawn(Some(64 * 1024)).unwrap())
            .collect();
        thread::sleep(std::time::Duration::from_millis(100));

        let before = sensor_cpu_ticks();
        thread::sleep(std::time::Duration::from_millis(500));
        let after = sensor_cpu_ticks();

        // One spinning sensor alone would burn about 50 ticks here
        let burnt: u64 = after
            .iter()
            .filter_map(|(tid, &used)| before.get(tid).map(|&was| used.saturating_sub(was)))
            .sum();
        assert!(burnt <= 5, "Parked sensors used {burnt} ticks of CPU");

        fixture.mailboxes.iter().for_each(Mailbox::close);
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
