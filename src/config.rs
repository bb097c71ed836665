use std::time::Duration;

pub const DEFAULT_GRAVITY_MS: u64 = 500;
pub const DEFAULT_SOFT_DROP_MS: u64 = 50;
pub const DEFAULT_CLEAR_DELAY_MS: u64 = 400;

/// Timing and randomness knobs for a game.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GameConfig {
    /// Time between gravity steps.
    pub gravity_interval: Duration,
    /// Time between gravity steps while soft drop is held.
    pub soft_drop_interval: Duration,
    /// How long cleared rows stay visible before the stack collapses.
    pub clear_delay: Duration,
    /// Seed for piece selection; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl GameConfig {
    pub fn from_millis(gravity: u64, soft_drop: u64, clear_delay: u64) -> Self {
        Self {
            gravity_interval: Duration::from_millis(gravity),
            soft_drop_interval: Duration::from_millis(soft_drop),
            clear_delay: Duration::from_millis(clear_delay),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn gravity_for(&self, soft_drop_held: bool) -> Duration {
        if soft_drop_held {
            self.soft_drop_interval
        } else {
            self.gravity_interval
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::from_millis(
            DEFAULT_GRAVITY_MS,
            DEFAULT_SOFT_DROP_MS,
            DEFAULT_CLEAR_DELAY_MS,
        )
    }
}
