pub mod q_learning;

pub use q_learning::Dispatcher;

use crate::{Floor, RiderId, Timestamp};

/// Live readings a dispatch algorithm consults on every call.
pub trait ElevatorContext {
    /// Current simulation time; never decreases between calls.
    fn current_timestamp(&self) -> Timestamp;

    /// Car position in floors; fractional while travelling.
    fn elevator_location(&self) -> f64;
}

/// Plain-value [`ElevatorContext`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevatorSnapshot {
    pub timestamp: Timestamp,
    pub location: f64,
}

impl ElevatorSnapshot {
    pub fn new(timestamp: Timestamp, location: f64) -> Self {
        Self {
            timestamp,
            location,
        }
    }
}

impl ElevatorContext for ElevatorSnapshot {
    fn current_timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn elevator_location(&self) -> f64 {
        self.location
    }
}

/// Algorithm deciding which floors a single elevator should visit next.
///
/// Each operation mutates the algorithm's view of pending riders and returns
/// the floor queue the car should follow, next stop first.
pub trait ElevatorAlgorithm {
    type Error;

    /// A rider waiting at `source_floor` asked for the car.
    fn register_rider_source(
        &mut self,
        ctx: &dyn ElevatorContext,
        rider_id: RiderId,
        source_floor: Floor,
    ) -> Result<Vec<Floor>, Self::Error>;

    /// A rider inside the car chose `destination_floor`.
    fn register_rider_destination(
        &mut self,
        ctx: &dyn ElevatorContext,
        rider_id: RiderId,
        destination_floor: Floor,
    ) -> Result<Vec<Floor>, Self::Error>;

    fn report_rider_pickup(
        &mut self,
        ctx: &dyn ElevatorContext,
        rider_id: RiderId,
    ) -> Result<Vec<Floor>, Self::Error>;

    fn report_rider_dropoff(
        &mut self,
        ctx: &dyn ElevatorContext,
        rider_id: RiderId,
    ) -> Result<Vec<Floor>, Self::Error>;
}
