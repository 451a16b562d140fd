use std::{sync::mpsc, thread, time::Duration};

use hopsim::SimulationBuilder;

const K_RUN_TIMEOUT: Duration = Duration::from_secs(30);

// N=10, M=3 is below the density bound, so connectivity comes from the
// reachability check alone.
#[test]
fn ten_sensors_terminate_a_hundred_times() {
    for seed in 0..100 {
        let (done_tx, done_rx) = mpsc::channel();
        thread::spawn(move || {
            let result = SimulationBuilder::default()
                .nodes(10)
                .neighbours(3)
                .enforce_density_bound(false)
                .max_attempts(1_000)
                .seed(seed)
                .build()
                .and_then(|simulation| simulation.run());
            let _ = done_tx.send(result);
        });

        let report = done_rx
            .recv_timeout(K_RUN_TIMEOUT)
            .unwrap_or_else(|_| panic!("Run with seed {seed} did not terminate"))
            .unwrap();
        assert_eq!(report.histogram.total_messages(), 10);
    }
}

#[test]
fn unseeded_runs_terminate() {
    for _ in 0..20 {
        let (done_tx, done_rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = done_tx.send(
                SimulationBuilder::default()
                    .nodes(20)
                    .neighbours(10)
                    .build()
                    .and_then(|simulation| simulation.run()),
            );
        });

        let report = done_rx.recv_timeout(K_RUN_TIMEOUT).unwrap().unwrap();
        assert_eq!(report.histogram.total_messages(), 20);
    }
}
