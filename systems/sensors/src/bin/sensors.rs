use clap::Parser;
use hopsim::SimulationBuilder;
use sensors::{exit_with, render};

/// Runs one random-forwarding simulation and prints its hop histogram.
#[derive(Parser, Debug)]
#[command(name = "sensors")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of sensors (N)
    nodes: usize,

    /// Neighbours per sensor (M)
    neighbours: usize,

    /// Seed for the network and every routing choice
    seed: Option<u64>,
}

fn main() {
    let args = Args::parse();

    let mut builder = SimulationBuilder::default()
        .nodes(args.nodes)
        .neighbours(args.neighbours);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }

    let report = builder
        .build()
        .and_then(|simulation| simulation.run())
        .unwrap_or_else(|error| exit_with(error));

    print!("{}", render(&report.histogram));
    println!(
        "\n{} messages, seed {}, {:?}",
        report.histogram.total_messages(),
        report.seed,
        report.elapsed
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn arguments_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn seed_is_optional() {
        let args = Args::try_parse_from(["sensors", "10", "6"]).unwrap();
        assert_eq!((args.nodes, args.neighbours, args.seed), (10, 6, None));

        let args = Args::try_parse_from(["sensors", "10", "6", "42"]).unwrap();
        assert_eq!(args.seed, Some(42));
    }

    #[test]
    fn rejects_missing_or_negative_counts() {
        assert!(Args::try_parse_from(["sensors", "10"]).is_err());
        assert!(Args::try_parse_from(["sensors", "-3", "1"]).is_err());
    }
}
