//! Request generation tickets.
//!
//! When several requests for the same view are in flight, only the response
//! to the most recently issued one should be applied. A caller takes a
//! [`Ticket`] before issuing a request and checks it when the response
//! arrives; a newer ticket makes older ones stale.

use std::sync::atomic::{AtomicU64, Ordering};

/// A numbered claim on the latest request slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    /// Sequence number of the ticket.
    #[must_use]
    pub const fn number(self) -> u64 {
        self.0
    }
}

/// Monotonic generation counter for one view.
#[derive(Debug, Default)]
pub struct RequestGenerations {
    latest: AtomicU64,
}

impl RequestGenerations {
    /// A counter that has issued no tickets.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
        }
    }

    /// Issue a ticket, superseding every earlier one.
    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether no newer ticket has been issued since `ticket`.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let generations = RequestGenerations::new();
        let slow = generations.begin();
        let fast = generations.begin();

        assert!(generations.is_current(fast));
        assert!(!generations.is_current(slow));
        assert!(fast > slow);
    }

    #[test]
    fn test_tickets_are_unique_across_threads() {
        let generations = Arc::new(RequestGenerations::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generations = Arc::clone(&generations);
                std::thread::spawn(move || {
                    (0..100).map(|_| generations.begin().number()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_default())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 800);
    }
}
