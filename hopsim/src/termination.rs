//! Global completion detection.
//!
//! The tracker counts deliveries against the number of injected messages.
//! Whichever sensor reports the final delivery performs the one and only
//! `Running -> Complete` transition and closes every mailbox, which lets all
//! sensors fall out of their receive loops. A detected defect takes the
//! `Running -> Aborted` edge instead and closes the mailboxes the same way.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, error};

use crate::{Mailbox, SimulationError, error::Result, progress::Bar};

pub(crate) type Mailboxes = Arc<[Mailbox]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Complete,
    Aborted,
}

struct Progress {
    delivered: usize,
    phase: Phase,
    failure: Option<SimulationError>,
    bar: Bar,
}

pub struct TerminationTracker {
    target: usize,
    progress: Mutex<Progress>,
    mailboxes: Mailboxes,
}

impl TerminationTracker {
    pub(crate) fn new(target: usize, mailboxes: Mailboxes) -> Self {
        Self {
            target,
            progress: Mutex::new(Progress {
                delivered: 0,
                phase: Phase::Running,
                failure: None,
                bar: Bar::new(target),
            }),
            mailboxes,
        }
    }

    /// Counts one more message as delivered. Returns `true` for the caller
    /// whose delivery completed the simulation.
    pub fn on_delivery(&self) -> bool {
        let completed = {
            let mut progress = self.lock();
            let phase = progress.phase;
            match phase {
                Phase::Aborted => return false,
                Phase::Complete => {
                    drop(progress);
                    self.abort(SimulationError::violation(format!(
                        "delivery reported after all {} messages arrived",
                        self.target
                    )));
                    return false;
                }
                Phase::Running => {}
            }

            progress.delivered += 1;
            let delivered = progress.delivered;
            progress.bar.make_progress(delivered);

            if delivered == self.target {
                progress.phase = Phase::Complete;
                progress.bar.finish();
                true
            } else {
                false
            }
        };

        if completed {
            debug!("All {} messages delivered, closing mailboxes", self.target);
            self.close_all();
        }
        completed
    }

    /// Stops the simulation because of `failure`. Only the first failure is
    /// kept, and only the first transition closes the mailboxes.
    pub fn abort(&self, failure: SimulationError) {
        {
            let mut progress = self.lock();
            if progress.failure.is_some() {
                debug!("Ignoring follow-up failure: {failure}");
                return;
            }
            error!("Aborting simulation: {failure}");
            progress.failure = Some(failure);
            progress.phase = Phase::Aborted;
            progress.bar.abandon();
        }
        self.close_all();
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn delivered(&self) -> usize {
        self.lock().delivered
    }

    pub fn target(&self) -> usize {
        self.target
    }

    /// Final verdict, read once every sensor has exited.
    pub(crate) fn outcome(&self) -> Result<()> {
        let mut progress = self.lock();
        if let Some(failure) = progress.failure.take() {
            return Err(failure);
        }
        match progress.phase {
            Phase::Complete => Ok(()),
            phase => Err(SimulationError::violation(format!(
                "sensors stopped in phase {phase:?} with {}/{} messages delivered",
                progress.delivered, self.target
            ))),
        }
    }

    fn close_all(&self) {
        self.mailboxes.iter().for_each(Mailbox::close);
    }

    fn lock(&self) -> MutexGuard<'_, Progress> {
        self.progress
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
