//! liftq - online Q-learning elevator dispatch
//!
//! Decides which floor a single elevator should head to next from the live
//! set of pickup and dropoff requests, learning from rider waiting times and
//! carrying what it learned from one episode to the next.

pub mod algorithms;

pub use algorithms::q_learning::{
    DispatchConfig, DispatchError, Dispatcher, JsonFileStore, MemoryStore, ModelStore,
};
pub use algorithms::{ElevatorAlgorithm, ElevatorContext, ElevatorSnapshot};

/// Identifier of a rider, unique within an episode.
pub type RiderId = u64;

/// Floor number, `1..=max_floor`.
pub type Floor = u32;

/// Simulation time, in seconds.
pub type Timestamp = f64;
