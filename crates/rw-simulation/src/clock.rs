use serde::{Deserialize, Serialize};

/// The global simulation clock.
///
/// Time only moves forward, and only through [`advance`](Self::advance).
/// Entities keep their own local clocks; the difference between the two is
/// the entity's time debt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameClock {
    time: u64,
    steps: u64,
}

impl GameClock {
    /// Create a clock at time 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock that starts at the given time.
    pub fn starting_at(time: u64) -> Self {
        Self { time, steps: 0 }
    }

    /// Advance the clock by `step` units. Returns the new time.
    ///
    /// A zero step is ignored and does not count as a step.
    pub fn advance(&mut self, step: u64) -> u64 {
        if step > 0 {
            self.time = self.time.saturating_add(step);
            self.steps += 1;
        }
        self.time
    }

    /// Current global time.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Number of non-empty steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// How far a local clock lags behind the global one. Zero if it does not.
    pub fn debt(&self, local_time: u64) -> u64 {
        self.time.saturating_sub(local_time)
    }
}
