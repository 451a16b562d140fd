//! Per-sensor blocking inbox.
//!
//! Any sensor may push into any neighbour's mailbox, only the owner receives.
//! The owner parks on a condition variable while the queue is empty, so idle
//! sensors cost no CPU no matter how many threads the simulation runs.

use std::{
    collections::VecDeque,
    sync::{Condvar, Mutex, MutexGuard},
};

use crate::Message;

/// Outcome of [`Mailbox::receive`].
#[derive(Debug)]
pub enum Received {
    Message(Message),
    /// The mailbox was closed and everything pushed before that was drained.
    Shutdown,
}

/// Returned by [`Mailbox::push`] on a closed mailbox. Hands the message back
/// so it is never lost silently.
#[derive(Debug)]
pub struct MailboxClosed(pub Message);

#[derive(Default)]
struct Inbox {
    pending: VecDeque<Message>,
    closed: bool,
    high_watermark: usize,
}

#[derive(Default)]
pub struct Mailbox {
    inbox: Mutex<Inbox>,
    not_empty: Condvar,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: Message) -> Result<(), MailboxClosed> {
        {
            let mut inbox = self.lock();
            if inbox.closed {
                return Err(MailboxClosed(message));
            }
            inbox.pending.push_back(message);
            inbox.high_watermark = inbox.high_watermark.max(inbox.pending.len());
        }
        self.not_empty.notify_one();
        Ok(())
    }

    /// Blocks until a message is pending or the mailbox is closed and empty.
    pub fn receive(&self) -> Received {
        let mut inbox = self
            .not_empty
            .wait_while(self.lock(), |inbox| {
                inbox.pending.is_empty() && !inbox.closed
            })
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match inbox.pending.pop_front() {
            Some(message) => Received::Message(message),
            None => Received::Shutdown,
        }
    }

    /// Idempotent.
    pub fn close(&self) {
        self.lock().closed = true;
        self.not_empty.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deepest the queue has ever been.
    pub fn high_watermark(&self) -> usize {
        self.lock().high_watermark
    }

    // A panicking pusher cannot leave the queue half-updated, keep going.
    fn lock(&self) -> MutexGuard<'_, Inbox> {
        self.inbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
