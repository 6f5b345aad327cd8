//! Address edit debouncing.
//!
//! Only one timer is ever live: every [`GeocodeDebouncer::schedule`]
//! replaces the pending draft and restarts the delay. The draft is captured
//! by value, so the geocode that eventually fires uses exactly the text that
//! was current when the user stopped typing.

use std::time::Duration;

use findnest_core::AddressDraft;
use tokio::time::Instant;

use crate::generation::{Generation, GenerationCounter};

/// What the debouncer asks for when its delay elapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceOutcome {
    /// Issue exactly one geocode request for `query`.
    Geocode { generation: Generation, query: String },
    /// The draft was not eligible at fire time; no request is issued and the
    /// caller clears its coordinates.
    CoordinatesCleared,
}

#[derive(Debug)]
struct Scheduled {
    draft: AddressDraft,
    due: Instant,
}

#[derive(Debug)]
pub struct GeocodeDebouncer {
    delay: Duration,
    pending: Option<Scheduled>,
    generations: GenerationCounter,
}

impl GeocodeDebouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            generations: GenerationCounter::new(),
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records `draft` and restarts the delay. A not-yet-fired call is
    /// superseded, and a request that already fired becomes stale.
    pub fn schedule(&mut self, draft: AddressDraft) {
        self.generations.advance();
        let due = Instant::now() + self.delay;
        let superseded = self.pending.replace(Scheduled { draft, due }).is_some();
        tracing::trace!(superseded, "geocode scheduled");
    }

    /// Drops the pending call and invalidates any request already in flight.
    /// Returns `true` if a call was pending.
    pub fn cancel(&mut self) -> bool {
        self.generations.advance();
        self.pending.take().is_some()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending call fires, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    /// Fires the pending call if its delay has elapsed by `now`.
    pub fn fire_due(&mut self, now: Instant) -> Option<DebounceOutcome> {
        if self.pending.as_ref().is_none_or(|p| now < p.due) {
            return None;
        }
        let Scheduled { draft, .. } = self.pending.take()?;
        if !draft.is_eligible() {
            return Some(DebounceOutcome::CoordinatesCleared);
        }
        Some(DebounceOutcome::Geocode {
            generation: self.generations.current(),
            query: draft.to_query(),
        })
    }

    /// `true` if a response for `generation` may still be applied.
    #[must_use]
    pub fn accepts(&self, generation: Generation) -> bool {
        self.generations.is_current(generation)
    }
}
