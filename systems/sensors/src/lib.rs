use hopsim::{Histogram, SimulationError};

/// Two-column table, one line per hop count, ascending.
pub fn render(histogram: &Histogram) -> String {
    let width = histogram
        .max_hops()
        .map_or(1, |hops| hops.to_string().len());
    histogram
        .entries()
        .iter()
        .map(|entry| format!("{:>width$}-hops {:>8}-times\n", entry.hops, entry.count))
        .collect()
}

pub fn exit_with(error: SimulationError) -> ! {
    eprintln!("error: {error}");
    std::process::exit(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopsim::SimulationBuilder;

    #[test]
    fn empty_histogram_renders_nothing() {
        assert_eq!(render(&Histogram::default()), "");
    }

    #[test]
    fn one_line_per_hop_count_right_aligned() {
        let report = SimulationBuilder::default()
            .nodes(2)
            .neighbours(1)
            .seed(4)
            .build()
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(render(&report.histogram), "1-hops        2-times\n");
    }
}
