//! Build generations used to discard stale asynchronous results.
//!
//! Each route build advances a shared counter and receives a
//! [`BuildTicket`] holding the value at that moment. Work that suspends
//! (router calls during bypass synthesis) checks its ticket before and after
//! each suspension; once a newer build has started the ticket is stale and
//! the result is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

/// A result belonged to a build that is no longer current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("build generation {ticket} was superseded by generation {current}")]
pub struct StaleResult {
    /// Generation the work was started for.
    pub ticket: u64,
    /// Generation that is current now.
    pub current: u64,
}

/// Monotonic counter identifying the current route build.
///
/// Clones share the same counter.
///
/// # Examples
/// ```
/// use haulway_core::GenerationCounter;
///
/// let counter = GenerationCounter::new();
/// let first = counter.advance();
/// assert!(first.is_current());
/// let second = counter.advance();
/// assert!(!first.is_current());
/// assert!(second.is_current());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    /// Start at generation zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new generation and return its ticket.
    pub fn advance(&self) -> BuildTicket {
        let generation = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        BuildTicket {
            generation,
            counter: Arc::clone(&self.current),
        }
    }

    /// Ticket for the generation that is current right now.
    pub fn ticket(&self) -> BuildTicket {
        BuildTicket {
            generation: self.current(),
            counter: Arc::clone(&self.current),
        }
    }

    /// Current generation number.
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }
}

/// Token captured when a build starts.
#[derive(Debug, Clone)]
pub struct BuildTicket {
    generation: u64,
    counter: Arc<AtomicU64>,
}

impl BuildTicket {
    /// Generation this ticket was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether no newer build has started since the ticket was issued.
    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::Acquire) == self.generation
    }

    /// Fail with [`StaleResult`] if a newer build has started.
    pub fn ensure_current(&self) -> Result<(), StaleResult> {
        let current = self.counter.load(Ordering::Acquire);
        if current == self.generation {
            Ok(())
        } else {
            Err(StaleResult {
                ticket: self.generation,
                current,
            })
        }
    }
}

impl PartialEq for BuildTicket {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation && Arc::ptr_eq(&self.counter, &other.counter)
    }
}

impl Eq for BuildTicket {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn generations_increase() {
        let counter = GenerationCounter::new();
        assert_eq!(counter.current(), 0);
        assert_eq!(counter.advance().generation(), 1);
        assert_eq!(counter.advance().generation(), 2);
    }

    #[rstest]
    fn stale_ticket_reports_both_generations() {
        let counter = GenerationCounter::new();
        let old = counter.advance();
        counter.advance();
        assert_eq!(
            old.ensure_current(),
            Err(StaleResult {
                ticket: 1,
                current: 2
            })
        );
    }

    #[rstest]
    fn clones_share_the_counter() {
        let counter = GenerationCounter::new();
        let ticket = counter.advance();
        counter.clone().advance();
        assert!(!ticket.is_current());
        assert_eq!(counter.ticket().generation(), 2);
    }

    #[rstest]
    fn tickets_from_other_counters_differ() {
        let a = GenerationCounter::new().advance();
        let b = GenerationCounter::new().advance();
        assert_ne!(a, b);
    }
}
