//! Logical cancellation for async responses.
//!
//! Network calls are never aborted. Each request carries a [`Generation`]
//! ticket; starting a newer request advances the counter and every older
//! ticket stops matching, so its response is discarded on arrival.

/// Ticket attached to one outstanding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct GenerationCounter {
    current: u64,
}

impl GenerationCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidates every outstanding ticket and returns a fresh one.
    pub fn advance(&mut self) -> Generation {
        self.current = self.current.wrapping_add(1);
        Generation(self.current)
    }

    #[must_use]
    pub fn current(&self) -> Generation {
        Generation(self.current)
    }

    #[must_use]
    pub fn is_current(&self, generation: Generation) -> bool {
        generation.0 == self.current
    }
}
