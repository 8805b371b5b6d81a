//! The dispatcher: owns the live task list and drives one decision cycle per
//! external event.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::config::DispatchConfig;
use super::error::{DispatchError, ModelError};
use super::policy::ExplorationPolicy;
use super::q_table::QTable;
use super::reward::RewardModel;
use super::state::{State, StateEncoder};
use super::store::ModelStore;
use super::trend::DirectionTrendTracker;
use super::types::{Direction, DirectionTrend, Task, TaskKind};
use crate::algorithms::{ElevatorAlgorithm, ElevatorContext};
use crate::{Floor, RiderId, Timestamp};

/// The last decision, waiting for enough time to pass to be rewarded.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDecision {
    pub state: State,
    pub action: usize,
    pub timestamp: Timestamp,
}

/// Online Q-learning elevator dispatcher.
///
/// # Lifecycle
///
/// 1. [`Dispatcher::new`] loads the model from the store, or starts a fresh
///    table if the store holds nothing usable.
/// 2. The harness calls the four [`ElevatorAlgorithm`] operations, one at a
///    time, each returning the next floor queue.
/// 3. [`Dispatcher::save`] persists the learned state, typically once at the
///    end of the episode.
#[derive(Debug)]
pub struct Dispatcher<S: ModelStore> {
    config: DispatchConfig,
    encoder: StateEncoder,
    trend: DirectionTrendTracker,
    q_table: QTable,
    policy: ExplorationPolicy,
    /// Pending stops in registration order.
    tasks: Vec<Task>,
    /// Pickup registration time per rider, kept until the dropoff is reported.
    registrations: BTreeMap<RiderId, Timestamp>,
    pending: Option<PendingDecision>,
    updates_applied: u64,
    rng: StdRng,
    store: S,
}

impl<S: ModelStore> Dispatcher<S> {
    /// Creates a dispatcher seeded from system entropy.
    pub fn new(config: DispatchConfig, store: S) -> Result<Self, DispatchError> {
        Self::with_rng(config, store, StdRng::from_entropy())
    }

    /// Creates a dispatcher whose random choices are reproducible.
    pub fn with_seed(config: DispatchConfig, store: S, seed: u64) -> Result<Self, DispatchError> {
        Self::with_rng(config, store, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: DispatchConfig, store: S, mut rng: StdRng) -> Result<Self, DispatchError> {
        config.validate()?;

        let mut q_table = QTable::unloaded(&config);
        match q_table.load_from(&store) {
            Ok(()) => {}
            Err(ModelError::Unavailable) => {
                info!("No stored model, starting from a fresh Q-table");
                q_table.reset(&mut rng);
            }
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "Discarding unusable stored model");
                q_table.reset(&mut rng);
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            encoder: StateEncoder::new(&config),
            trend: DirectionTrendTracker::from_config(&config),
            q_table,
            policy: ExplorationPolicy::new(),
            tasks: Vec::new(),
            registrations: BTreeMap::new(),
            pending: None,
            updates_applied: 0,
            rng,
            store,
            config,
        })
    }

    /// Persists the table and decay state.
    pub fn save(&self) -> Result<(), DispatchError> {
        self.q_table.save_to(&self.store)?;
        Ok(())
    }

    /// Discards everything learned and starts over from a fresh table.
    pub fn reset_model(&mut self) {
        self.q_table.reset(&mut self.rng);
        self.pending = None;
    }

    /// Overrides the exploration rate for the rest of the episode.
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.q_table.set_epsilon(epsilon);
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn registrations(&self) -> &BTreeMap<RiderId, Timestamp> {
        &self.registrations
    }

    pub fn pending_decision(&self) -> Option<&PendingDecision> {
        self.pending.as_ref()
    }

    /// Number of Q-updates applied since construction.
    pub fn updates_applied(&self) -> u64 {
        self.updates_applied
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn q_table_mut(&mut self) -> &mut QTable {
        &mut self.q_table
    }

    pub fn trend(&self) -> DirectionTrend {
        self.trend.classify()
    }

    /// Encodes the current tasks and car position.
    pub fn current_state(&self, ctx: &dyn ElevatorContext) -> State {
        self.encoder
            .encode(&self.tasks, ctx.elevator_location(), self.trend.classify())
    }

    fn check_floor(&self, floor: Floor) -> Result<(), DispatchError> {
        if floor == 0 || floor > self.config.max_floor {
            return Err(DispatchError::InvalidFloor {
                floor,
                max_floor: self.config.max_floor,
            });
        }
        Ok(())
    }

    fn remove_task(&mut self, rider_id: RiderId, kind: TaskKind) -> Result<Task, DispatchError> {
        let pos = self
            .tasks
            .iter()
            .position(|t| t.rider_id == rider_id && t.kind == kind)
            .ok_or(DispatchError::TaskNotFound { rider_id, kind })?;
        Ok(self.tasks.remove(pos))
    }

    /// Runs one decision cycle and returns the floor queue.
    ///
    /// The previous decision is only rewarded when time has moved since it
    /// was taken; several events at the same instant share one decision
    /// window.
    fn decide(&mut self, ctx: &dyn ElevatorContext) -> Vec<Floor> {
        if self.tasks.is_empty() {
            debug!("No pending tasks, nothing to decide");
            return Vec::new();
        }

        let now = ctx.current_timestamp();
        let state = self.current_state(ctx);
        let index = state.index(self.config.count_buckets());

        let Some(selection) =
            self.policy
                .select(&self.q_table, &index, &self.tasks, &mut self.rng)
        else {
            return Vec::new();
        };

        if let Some(pending) = &self.pending {
            if pending.timestamp != now {
                let reward = RewardModel::compute(
                    self.registrations.values().copied(),
                    now,
                    pending.timestamp,
                );
                let previous = pending.state.index(self.config.count_buckets());
                self.q_table
                    .update(&previous, pending.action, reward, &index);
                self.updates_applied += 1;
            }
        }

        let queue = self.build_queue(selection.action);
        debug!(
            state = ?state.as_tuple(),
            action = selection.action,
            explored = selection.explored,
            ?queue,
            "Dispatch decision"
        );

        self.pending = Some(PendingDecision {
            state,
            action: selection.action,
            timestamp: now,
        });
        queue
    }

    /// Chosen floor first, then every other task floor in task-list order.
    fn build_queue(&self, action: usize) -> Vec<Floor> {
        let next_floor = action as Floor + 1;
        std::iter::once(next_floor)
            .chain(
                self.tasks
                    .iter()
                    .map(|t| t.floor)
                    .filter(|&floor| floor != next_floor),
            )
            .collect()
    }
}

impl<S: ModelStore> ElevatorAlgorithm for Dispatcher<S> {
    type Error = DispatchError;

    fn register_rider_source(
        &mut self,
        ctx: &dyn ElevatorContext,
        rider_id: RiderId,
        source_floor: Floor,
    ) -> Result<Vec<Floor>, DispatchError> {
        self.check_floor(source_floor)?;
        self.tasks
            .push(Task::new(rider_id, source_floor, TaskKind::Pickup));
        self.registrations
            .insert(rider_id, ctx.current_timestamp());
        Ok(self.decide(ctx))
    }

    fn register_rider_destination(
        &mut self,
        ctx: &dyn ElevatorContext,
        rider_id: RiderId,
        destination_floor: Floor,
    ) -> Result<Vec<Floor>, DispatchError> {
        self.check_floor(destination_floor)?;
        self.tasks
            .push(Task::new(rider_id, destination_floor, TaskKind::Dropoff));
        self.trend.record(
            ctx.current_timestamp(),
            Direction::of_request(destination_floor, ctx.elevator_location()),
        );
        Ok(self.decide(ctx))
    }

    fn report_rider_pickup(
        &mut self,
        ctx: &dyn ElevatorContext,
        rider_id: RiderId,
    ) -> Result<Vec<Floor>, DispatchError> {
        self.remove_task(rider_id, TaskKind::Pickup)?;
        Ok(self.decide(ctx))
    }

    fn report_rider_dropoff(
        &mut self,
        ctx: &dyn ElevatorContext,
        rider_id: RiderId,
    ) -> Result<Vec<Floor>, DispatchError> {
        self.remove_task(rider_id, TaskKind::Dropoff)?;
        // The reward inside this cycle still counts the rider's wait.
        let queue = self.decide(ctx);
        self.registrations.remove(&rider_id);
        Ok(queue)
    }
}
