//! Dense Q-table and the persisted decay bookkeeping.

use ndarray::{ArrayD, IxDyn};
use rand::distributions::Uniform;
use rand::Rng;
use tracing::{info, trace};

use super::config::{DecaySchedule, DispatchConfig};
use super::error::ModelError;
use super::state::StateIndex;
use super::store::{ModelSnapshot, ModelStore};

/// Expected-return estimates indexed by `(state, action)`, plus the episode
/// counter, exploration rate and learning rate that travel with them.
///
/// The table has shape [`DispatchConfig::table_shape`]. It is never resized;
/// a stored table of any other shape is rejected on load.
#[derive(Debug, Clone)]
pub struct QTable {
    table: ArrayD<f64>,
    shape: Vec<usize>,
    episode: u64,
    epsilon: f64,
    learning_rate: f64,
    discount: f64,
    initial_range: (f64, f64),
    decay: DecaySchedule,
}

impl QTable {
    /// Creates a freshly initialized table.
    pub fn new<R: Rng>(config: &DispatchConfig, rng: &mut R) -> Self {
        let mut q = Self::unloaded(config);
        q.reset(rng);
        q
    }

    /// A table with no storage yet; must be followed by [`QTable::load_from`]
    /// or [`QTable::reset`] before use.
    pub(crate) fn unloaded(config: &DispatchConfig) -> Self {
        Self {
            table: ArrayD::zeros(IxDyn(&[0])),
            shape: config.table_shape(),
            episode: 0,
            epsilon: config.decay.initial_epsilon,
            learning_rate: config.decay.initial_learning_rate,
            discount: config.discount,
            initial_range: config.initial_q_range,
            decay: config.decay.clone(),
        }
    }

    /// Redraws every entry uniformly from the initial range and restores the
    /// initial decay state.
    pub fn reset<R: Rng>(&mut self, rng: &mut R) {
        let (low, high) = self.initial_range;
        let dist = Uniform::new(low, high);
        self.table = ArrayD::from_shape_simple_fn(IxDyn(&self.shape), || rng.sample(&dist));
        self.episode = 0;
        self.epsilon = self.decay.initial_epsilon;
        self.learning_rate = self.decay.initial_learning_rate;
        info!(shape = ?self.shape, "Initialized fresh Q-table");
    }

    /// Replaces the table and decay state with the stored model, then starts
    /// a new episode on top of it.
    ///
    /// On error the table is left untouched.
    pub fn load_from<S: ModelStore + ?Sized>(&mut self, store: &S) -> Result<(), ModelError> {
        let snapshot = store.load()?;
        if snapshot.table.shape() != self.shape.as_slice() {
            return Err(ModelError::ShapeMismatch {
                expected: self.shape.clone(),
                found: snapshot.table.shape().to_vec(),
            });
        }
        if !(snapshot.epsilon.is_finite() && snapshot.learning_rate.is_finite()) {
            return Err(ModelError::Corrupt(
                "non-finite epsilon or learning rate".to_string(),
            ));
        }

        self.table = snapshot.table;
        self.episode = snapshot.episode;
        self.epsilon = snapshot.epsilon;
        self.learning_rate = snapshot.learning_rate;
        self.begin_episode();
        Ok(())
    }

    /// Increments the episode and applies one decay step if the new episode
    /// lies inside the decay window.
    fn begin_episode(&mut self) {
        self.episode += 1;
        if self.decay.contains(self.episode) {
            self.epsilon = (self.epsilon * self.decay.epsilon_factor()).max(self.decay.min_epsilon);
            self.learning_rate = (self.learning_rate * self.decay.learning_rate_factor())
                .max(self.decay.min_learning_rate);
        }
        info!(
            episode = self.episode,
            epsilon = self.epsilon,
            learning_rate = self.learning_rate,
            "Loaded Q-table for new episode"
        );
    }

    pub fn save_to<S: ModelStore + ?Sized>(&self, store: &S) -> Result<(), ModelError> {
        store.save(&self.snapshot())?;
        info!(episode = self.episode, "Saved Q-table");
        Ok(())
    }

    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            table: self.table.clone(),
            episode: self.episode,
            epsilon: self.epsilon,
            learning_rate: self.learning_rate,
        }
    }

    pub fn value(&self, state: &StateIndex, action: usize) -> f64 {
        self.table[&state.with_action(action)[..]]
    }

    pub fn set_value(&mut self, state: &StateIndex, action: usize, value: f64) {
        self.table[&state.with_action(action)[..]] = value;
    }

    pub fn action_count(&self) -> usize {
        self.shape.last().copied().unwrap_or(0)
    }

    /// Q-values of every action in `state`, in action order.
    pub fn action_values(&self, state: &StateIndex) -> Vec<f64> {
        (0..self.action_count())
            .map(|a| self.value(state, a))
            .collect()
    }

    /// Action with the highest value; ties go to the lowest index.
    pub fn best_action(&self, state: &StateIndex) -> usize {
        let mut best = 0;
        let mut best_value = f64::NEG_INFINITY;
        for (action, value) in self.action_values(state).into_iter().enumerate() {
            if value > best_value {
                best = action;
                best_value = value;
            }
        }
        best
    }

    pub fn max_value(&self, state: &StateIndex) -> f64 {
        self.action_values(state)
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// One-step Q-learning update:
    ///
    /// `Q[s,a] ← (1-α)·Q[s,a] + α·(r + γ·max_a' Q[s',a'])`
    pub fn update(&mut self, previous: &StateIndex, action: usize, reward: f64, current: &StateIndex) {
        let max_current = self.max_value(current);
        let old = self.value(previous, action);
        let alpha = self.learning_rate;
        let updated = (1.0 - alpha) * old + alpha * (reward + self.discount * max_current);
        self.set_value(previous, action, updated);
        trace!(?previous, action, reward, old, updated, "Q-update");
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn episode(&self) -> u64 {
        self.episode
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Overrides the exploration rate, e.g. to force pure exploitation.
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::q_learning::store::MemoryStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_config() -> DispatchConfig {
        DispatchConfig {
            max_floor_tasks_to_count: 1,
            ..DispatchConfig::new(3)
        }
    }

    fn idx(location: usize) -> StateIndex {
        StateIndex {
            location,
            trend: 2,
            pickups: 0,
            dropoffs: 0,
        }
    }

    #[test]
    fn reset_draws_from_negative_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let q = QTable::new(&small_config(), &mut rng);
        assert_eq!(q.shape(), &[3, 3, 8, 8, 3]);
        assert!(q.table.iter().all(|v| (-200.0..-100.0).contains(v)));
        assert_eq!(q.episode(), 0);
        assert_eq!(q.epsilon(), 1.0);
        assert_eq!(q.learning_rate(), 0.8);
    }

    #[test]
    fn best_action_prefers_first_maximum() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut q = QTable::new(&small_config(), &mut rng);
        let s = idx(1);
        q.set_value(&s, 0, -5.0);
        q.set_value(&s, 1, 3.0);
        q.set_value(&s, 2, 3.0);
        assert_eq!(q.best_action(&s), 1);
        assert_eq!(q.max_value(&s), 3.0);
    }

    #[test]
    fn update_follows_bellman_rule() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut q = QTable::new(&small_config(), &mut rng);
        let prev = idx(0);
        let cur = idx(2);
        q.set_value(&prev, 1, -10.0);
        for a in 0..3 {
            q.set_value(&cur, a, -20.0);
        }
        q.set_value(&cur, 2, -4.0);
        q.set_learning_rate(0.5);

        q.update(&prev, 1, -6.0, &cur);
        let expected = 0.5 * -10.0 + 0.5 * (-6.0 + 0.99 * -4.0);
        assert!((q.value(&prev, 1) - expected).abs() < 1e-12);
    }

    #[test]
    fn update_on_same_state_uses_pre_update_max() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut q = QTable::new(&small_config(), &mut rng);
        let s = idx(0);
        q.set_value(&s, 0, -1.0);
        q.set_value(&s, 1, -50.0);
        q.set_value(&s, 2, -50.0);
        q.set_learning_rate(1.0);
        q.update(&s, 0, -100.0, &s);
        assert!((q.value(&s, 0) - (-100.0 + 0.99 * -1.0)).abs() < 1e-12);
    }

    #[test]
    fn save_then_load_preserves_table_and_advances_episode() {
        let mut rng = StdRng::seed_from_u64(5);
        let config = small_config();
        let store = MemoryStore::new();
        let q = QTable::new(&config, &mut rng);
        q.save_to(&store).unwrap();

        let mut loaded = QTable::new(&config, &mut StdRng::seed_from_u64(99));
        loaded.load_from(&store).unwrap();

        assert_eq!(loaded.episode(), q.episode() + 1);
        for (a, b) in loaded.table.iter().zip(q.table.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        assert!(loaded.epsilon() <= q.epsilon());
        assert!(loaded.epsilon() >= config.decay.min_epsilon);
        assert!(loaded.learning_rate() <= q.learning_rate());
        assert!(loaded.learning_rate() >= config.decay.min_learning_rate);
    }

    #[test]
    fn decay_applies_only_inside_window() {
        let mut config = small_config();
        config.decay.start_episode = 3;
        config.decay.end_episode = 5;
        let mut rng = StdRng::seed_from_u64(6);
        let store = MemoryStore::new();
        let mut q = QTable::new(&config, &mut rng);

        // Episodes 1 and 2 fall before the window.
        for _ in 0..2 {
            q.save_to(&store).unwrap();
            q.load_from(&store).unwrap();
        }
        assert_eq!(q.episode(), 2);
        assert_eq!(q.epsilon(), 1.0);

        // Episodes 3, 4, 5 decay; the last one reaches the floor.
        for _ in 0..3 {
            q.save_to(&store).unwrap();
            q.load_from(&store).unwrap();
        }
        assert_eq!(q.episode(), 5);
        assert!(q.epsilon() < 1.0);
        assert!(q.epsilon() >= config.decay.min_epsilon);
        let eps_at_end = q.epsilon();

        q.save_to(&store).unwrap();
        q.load_from(&store).unwrap();
        assert_eq!(q.episode(), 6);
        assert_eq!(q.epsilon(), eps_at_end);
    }

    #[test]
    fn decay_is_clamped_to_floor() {
        let config = small_config();
        let mut rng = StdRng::seed_from_u64(7);
        let mut snapshot = QTable::new(&config, &mut rng).snapshot();
        snapshot.epsilon = config.decay.min_epsilon;
        snapshot.learning_rate = config.decay.min_learning_rate;
        let store = MemoryStore::with_snapshot(snapshot);

        let mut q = QTable::new(&config, &mut rng);
        q.load_from(&store).unwrap();
        assert_eq!(q.epsilon(), config.decay.min_epsilon);
        assert_eq!(q.learning_rate(), config.decay.min_learning_rate);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let mut rng = StdRng::seed_from_u64(8);
        let store = MemoryStore::new();
        QTable::new(&small_config(), &mut rng).save_to(&store).unwrap();

        let other = DispatchConfig {
            max_floor_tasks_to_count: 1,
            ..DispatchConfig::new(2)
        };
        let mut q = QTable::new(&other, &mut rng);
        let err = q.load_from(&store).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
        assert_eq!(q.shape(), &[2, 3, 4, 4, 2]);
        assert_eq!(q.episode(), 0);
    }
}
