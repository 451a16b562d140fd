//! Thread-per-sensor simulation of random-walk message delivery.
//!
//! A network of N sensors, each linked to M others, is generated at random.
//! Every sensor runs on its own OS thread and starts with one message for
//! some other sensor. Messages hop to uniformly chosen neighbours until they
//! reach their addressee, and the run ends once all N have arrived.
//!
//! ```no_run
//! use hopsim::SimulationBuilder;
//!
//! let report = SimulationBuilder::default()
//!     .nodes(100)
//!     .neighbours(50)
//!     .build()?
//!     .run()?;
//!
//! for (hops, count) in report.histogram.iter() {
//!     println!("{hops}-hops {count}-times");
//! }
//! # Ok::<(), hopsim::SimulationError>(())
//! ```

mod alloc;
mod error;
mod helpers;
mod histogram;
mod mailbox;
mod message;
mod progress;
mod random;
mod sensor;
mod simulation;
mod simulation_builder;
mod termination;
mod topology;

/// Index of a sensor, in `[0, N)`.
pub type NodeId = usize;

pub use error::SimulationError;

pub use message::Hops;
pub use message::Message;

pub use mailbox::Mailbox;
pub use mailbox::MailboxClosed;
pub use mailbox::Received;

pub use histogram::Histogram;
pub use histogram::HistogramAggregator;
pub use histogram::HistogramEntry;

pub use termination::Phase;
pub use termination::TerminationTracker;

pub use topology::NetworkBuilder;
pub use topology::Topology;
pub use topology::Wiring;

pub use random::Seed;

pub use simulation::Report;
pub use simulation::Simulation;
pub use simulation_builder::SimulationBuilder;
