//! Configuration for the Q-learning dispatcher.

use serde::{Deserialize, Serialize};

use super::error::DispatchError;
use super::types::DirectionTrend;

/// Per-floor task count cap; larger counts are clamped to it.
pub const MAX_FLOOR_TASKS_TO_COUNT: usize = 3;
/// Number of most recent destination requests consulted for the trend.
pub const REQUESTS_TO_CONSIDER_FOR_DIRECTION_TREND: usize = 10;
/// Share of the window one direction needs to count as a trend.
pub const DIRECTION_TREND_THRESHOLD: f64 = 0.7;

pub const INITIAL_EPSILON: f64 = 1.0;
pub const MIN_EPSILON: f64 = 0.05;
pub const INITIAL_LEARNING_RATE: f64 = 0.8;
pub const MIN_LEARNING_RATE: f64 = 0.1;
pub const DISCOUNT: f64 = 0.99;

pub const ROUND_TO_START_LEARNING_DECAY: u64 = 0;
pub const ROUND_TO_END_LEARNING_DECAY: u64 = 10_000;

/// Range fresh Q-values are drawn from.
pub const INITIAL_Q_RANGE: (f64, f64) = (-200.0, -100.0);

/// Episode-driven decay of epsilon and learning rate.
///
/// Every load whose (incremented) episode falls inside
/// `[start_episode, end_episode]` multiplies both values by a geometric factor
/// chosen so that `end_episode - start_episode` steps take them from their
/// initial value to their floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecaySchedule {
    pub initial_epsilon: f64,
    pub min_epsilon: f64,
    pub initial_learning_rate: f64,
    pub min_learning_rate: f64,
    pub start_episode: u64,
    pub end_episode: u64,
}

impl DecaySchedule {
    /// Number of decay steps in the window.
    pub fn window_len(&self) -> u64 {
        self.end_episode.saturating_sub(self.start_episode)
    }

    pub fn contains(&self, episode: u64) -> bool {
        (self.start_episode..=self.end_episode).contains(&episode)
    }

    /// Per-episode multiplier for epsilon.
    pub fn epsilon_factor(&self) -> f64 {
        self.factor(self.min_epsilon, self.initial_epsilon)
    }

    /// Per-episode multiplier for the learning rate.
    pub fn learning_rate_factor(&self) -> f64 {
        self.factor(self.min_learning_rate, self.initial_learning_rate)
    }

    fn factor(&self, floor: f64, initial: f64) -> f64 {
        (floor / initial).powf(1.0 / self.window_len() as f64)
    }
}

impl Default for DecaySchedule {
    fn default() -> Self {
        Self {
            initial_epsilon: INITIAL_EPSILON,
            min_epsilon: MIN_EPSILON,
            initial_learning_rate: INITIAL_LEARNING_RATE,
            min_learning_rate: MIN_LEARNING_RATE,
            start_episode: ROUND_TO_START_LEARNING_DECAY,
            end_episode: ROUND_TO_END_LEARNING_DECAY,
        }
    }
}

/// Configuration of a [`super::Dispatcher`].
///
/// The defaults carry the dispatcher's fixed domain constants; only
/// `max_floor` normally varies between buildings. The dense table has
/// `max_floor² · 3 · (cap+1)^(2·max_floor)` entries, so large buildings need a
/// smaller `max_floor_tasks_to_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Highest floor served; floors are `1..=max_floor`.
    pub max_floor: u32,
    pub max_floor_tasks_to_count: usize,
    pub trend_window: usize,
    pub trend_threshold: f64,
    /// Discount factor γ of the Q-learning update.
    pub discount: f64,
    /// `(low, high)` range of freshly initialized Q-values.
    pub initial_q_range: (f64, f64),
    pub decay: DecaySchedule,
}

impl DispatchConfig {
    /// Default configuration for a building with `max_floor` floors.
    pub fn new(max_floor: u32) -> Self {
        Self {
            max_floor,
            ..Self::default()
        }
    }

    pub fn floors(&self) -> usize {
        self.max_floor as usize
    }

    /// One action per floor.
    pub fn action_count(&self) -> usize {
        self.floors()
    }

    /// Distinct values a clamped per-floor count can take.
    pub fn count_buckets(&self) -> usize {
        self.max_floor_tasks_to_count + 1
    }

    /// Length of the flat state tuple: location, trend, then two count vectors.
    pub fn state_len(&self) -> usize {
        2 + 2 * self.floors()
    }

    /// Size of one packed count-vector axis: `(cap+1)^max_floor`.
    pub fn count_vector_space(&self) -> usize {
        self.count_buckets()
            .checked_pow(self.max_floor)
            .unwrap_or(usize::MAX)
    }

    /// `[max_floor, 3, (cap+1)^n, (cap+1)^n]`.
    pub fn state_shape(&self) -> Vec<usize> {
        vec![
            self.floors(),
            DirectionTrend::COUNT,
            self.count_vector_space(),
            self.count_vector_space(),
        ]
    }

    /// State shape followed by the action axis.
    pub fn table_shape(&self) -> Vec<usize> {
        let mut shape = self.state_shape();
        shape.push(self.action_count());
        shape
    }

    /// Total number of table entries, `None` if it overflows `usize`.
    pub fn table_len(&self) -> Option<usize> {
        let space = self.count_buckets().checked_pow(self.max_floor)?;
        self.floors()
            .checked_mul(DirectionTrend::COUNT)?
            .checked_mul(space)?
            .checked_mul(space)?
            .checked_mul(self.action_count())
    }

    /// Checks the constructor-time invariants.
    pub fn validate(&self) -> Result<(), DispatchError> {
        let invalid = |msg: &str| Err(DispatchError::InvalidConfig(msg.to_string()));

        if self.max_floor == 0 {
            return invalid("max_floor must be at least 1");
        }
        if self.max_floor_tasks_to_count == 0 {
            return invalid("max_floor_tasks_to_count must be at least 1");
        }
        if self.trend_window == 0 {
            return invalid("trend_window must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.trend_threshold) {
            return invalid("trend_threshold must lie in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return invalid("discount must lie in [0, 1]");
        }
        let (low, high) = self.initial_q_range;
        if !(low < high) {
            return invalid("initial_q_range must be a non-empty (low, high) range");
        }
        if self.table_len().is_none() {
            return invalid("state space too large for max_floor and count cap");
        }

        let decay = &self.decay;
        if decay.end_episode <= decay.start_episode {
            return invalid("decay window must span at least one episode");
        }
        if !(decay.min_epsilon > 0.0 && decay.min_epsilon <= decay.initial_epsilon) {
            return invalid("epsilon floor must lie in (0, initial_epsilon]");
        }
        if !(decay.min_learning_rate > 0.0 && decay.min_learning_rate <= decay.initial_learning_rate)
        {
            return invalid("learning rate floor must lie in (0, initial_learning_rate]");
        }

        Ok(())
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_floor: 5,
            max_floor_tasks_to_count: MAX_FLOOR_TASKS_TO_COUNT,
            trend_window: REQUESTS_TO_CONSIDER_FOR_DIRECTION_TREND,
            trend_threshold: DIRECTION_TREND_THRESHOLD,
            discount: DISCOUNT,
            initial_q_range: INITIAL_Q_RANGE,
            decay: DecaySchedule::default(),
        }
    }
}
