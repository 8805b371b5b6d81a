//! Q-learning dispatch.
//!
//! Every external event runs one decision cycle:
//! encode state → pick an action (epsilon-greedy) → reward and update the
//! previous decision if time has passed → return the floor queue.
//!
//! Learned state (table, episode, epsilon, learning rate) lives in a
//! [`QTable`] and survives between episodes through a [`ModelStore`].

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod policy;
pub mod q_table;
pub mod reward;
pub mod state;
pub mod store;
pub mod trend;
pub mod types;


pub use config::{DecaySchedule, DispatchConfig};
pub use dispatcher::{Dispatcher, PendingDecision};
pub use error::{DispatchError, ModelError};
pub use policy::{ExplorationPolicy, Selection};
pub use q_table::QTable;
pub use reward::RewardModel;
pub use state::{State, StateEncoder, StateIndex};
pub use store::{JsonFileStore, MemoryStore, ModelSnapshot, ModelStore};
pub use trend::DirectionTrendTracker;
pub use types::{Direction, DirectionRecord, DirectionTrend, Task, TaskKind};
