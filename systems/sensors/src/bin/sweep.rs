use std::sync::Mutex;

use clap::Parser;
use hopsim::{Histogram, SimulationBuilder, SimulationError};
use log::info;
use rayon::prelude::*;
use sensors::{exit_with, render};

/// Runs independent simulations in parallel and prints the merged histogram.
#[derive(Parser, Debug)]
#[command(name = "sweep")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of sensors (N)
    nodes: usize,

    /// Neighbours per sensor (M)
    neighbours: usize,

    /// Number of independent runs
    trials: usize,
}

fn main() {
    let args = Args::parse();

    let base_seed: u64 = rand::random();
    let merged = Mutex::new(Histogram::default());

    let outcome = (0..args.trials as u64).into_par_iter().try_for_each(|trial| {
        let report = SimulationBuilder::default()
            .nodes(args.nodes)
            .neighbours(args.neighbours)
            .seed(base_seed.wrapping_add(trial * 1_000_003))
            .build()?
            .run()?;
        info!("Trial {trial} done in {:?}", report.elapsed);
        merged
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .merge(&report.histogram);
        Ok::<(), SimulationError>(())
    });
    if let Err(error) = outcome {
        exit_with(error);
    }

    let merged = merged.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    if merged.is_empty() {
        println!("no trials run");
        return;
    }
    print!("{}", render(&merged));
    if let Some(mean) = merged.mean_hops() {
        println!(
            "\n{} messages over {} trials, mean {mean:.2} hops",
            merged.total_messages(),
            args.trials
        );
    }
}
