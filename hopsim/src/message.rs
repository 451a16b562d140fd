//! The message that travels through the sensor network.
//!
//! A [`Message`] is created once per sensor at injection time and is moved,
//! never cloned, from mailbox to mailbox until it reaches its destination.
//! Its hop count only ever grows by one per forwarding step.

use std::fmt::{Debug, Display};

use crate::{NodeId, SimulationError, error::Result};

/// Number of forwarding steps a message has taken.
pub type Hops = usize;

pub struct Message {
    origin: NodeId,
    destination: NodeId,
    hops: Hops,
}

impl Message {
    pub(crate) fn seed(origin: NodeId, destination: NodeId) -> Self {
        debug_assert_ne!(origin, destination, "Self-addressed message injected");
        Self {
            origin,
            destination,
            hops: 0,
        }
    }

    /// Sensor the message was injected at.
    pub fn origin(&self) -> NodeId {
        self.origin
    }

    pub fn destination(&self) -> NodeId {
        self.destination
    }

    pub fn hops(&self) -> Hops {
        self.hops
    }

    /// Consumes the message and returns it one hop further along.
    pub(crate) fn forwarded(self) -> Result<Self> {
        let hops = self.hops.checked_add(1).ok_or_else(|| {
            SimulationError::violation(format!(
                "hop counter overflow for message {} -> {}",
                self.origin, self.destination
            ))
        })?;
        Ok(Self { hops, ..self })
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "S{} -> S{} after {} hops",
            self.origin, self.destination, self.hops
        )
    }
}

impl Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_message_starts_at_zero_hops() {
        let message = Message::seed(2, 5);
        assert_eq!(message.origin(), 2);
        assert_eq!(message.destination(), 5);
        assert_eq!(message.hops(), 0);
    }

    #[test]
    fn forwarding_adds_exactly_one_hop() {
        let message = Message::seed(0, 1).forwarded().unwrap().forwarded().unwrap();
        assert_eq!(message.hops(), 2);
        assert_eq!(message.destination(), 1);
    }

    #[test]
    fn hop_overflow_is_a_violation() {
        let message = Message {
            origin: 0,
            destination: 1,
            hops: Hops::MAX,
        };
        assert!(matches!(
            message.forwarded(),
            Err(SimulationError::InternalInvariantViolation(_))
        ));
    }
}
