//! Core types for the Q-learning dispatcher.
//!
//! Defines task kinds, travel directions and direction trends, together with
//! the integer mapping each of them uses at the state-encoding boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Floor, RiderId, Timestamp};

/// What the elevator has to do at a task's floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Pickup,
    Dropoff,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Pickup => write!(f, "pickup"),
            TaskKind::Dropoff => write!(f, "dropoff"),
        }
    }
}

/// A pending stop owned by the dispatcher's task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    pub rider_id: RiderId,
    /// Target floor, `1..=max_floor`.
    pub floor: Floor,
    pub kind: TaskKind,
}

impl Task {
    pub fn new(rider_id: RiderId, floor: Floor, kind: TaskKind) -> Self {
        Self {
            rider_id,
            floor,
            kind,
        }
    }

    /// Zero-based action index of this task's floor.
    pub fn action_index(&self) -> usize {
        self.floor as usize - 1
    }
}

/// Direction of a single destination request relative to the car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// `Up` when the destination lies strictly above the car, `Down` otherwise.
    pub fn of_request(destination: Floor, elevator_location: f64) -> Self {
        if f64::from(destination) > elevator_location {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

/// Classification of recent destination requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectionTrend {
    MostlyUp,
    MostlyDown,
    Undetermined,
}

impl DirectionTrend {
    /// Number of distinct trend codes (size of the trend axis of the table).
    pub const COUNT: usize = 3;

    /// Returns all trends in code order.
    pub fn all() -> [DirectionTrend; 3] {
        [
            DirectionTrend::MostlyUp,
            DirectionTrend::MostlyDown,
            DirectionTrend::Undetermined,
        ]
    }

    /// State-encoding code (0=MostlyUp, 1=MostlyDown, 2=Undetermined).
    pub fn code(&self) -> usize {
        match self {
            DirectionTrend::MostlyUp => 0,
            DirectionTrend::MostlyDown => 1,
            DirectionTrend::Undetermined => 2,
        }
    }

    /// Inverse of [`DirectionTrend::code`].
    pub fn from_code(code: usize) -> Option<Self> {
        Self::all().get(code).copied()
    }
}

impl fmt::Display for DirectionTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectionTrend::MostlyUp => write!(f, "mostly_up"),
            DirectionTrend::MostlyDown => write!(f, "mostly_down"),
            DirectionTrend::Undetermined => write!(f, "undetermined"),
        }
    }
}

/// One entry of the destination-direction log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionRecord {
    pub timestamp: Timestamp,
    pub direction: Direction,
}
