//! State encoding: from live tasks and car position to a table index.
//!
//! The logical state is the tuple
//! ```text
//! (location_index, trend_code, P1 .. Pn, D1 .. Dn)
//! ```
//! where `Pi`/`Di` are the clamped pickup/dropoff counts at floor `i`. For
//! table lookups the two count vectors are packed into one mixed-radix
//! integer each (base `cap + 1`, floor 1 least significant), giving the
//! `[max_floor, 3, (cap+1)^n, (cap+1)^n]` state axes.

use super::config::DispatchConfig;
use super::types::{DirectionTrend, Task, TaskKind};

/// Discretized snapshot used to index the Q-table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct State {
    /// Zero-based floor the car is nearest to.
    pub location_index: usize,
    pub trend: DirectionTrend,
    /// Clamped pending pickups per floor, ascending floor order.
    pub pickups: Vec<usize>,
    /// Clamped pending dropoffs per floor, ascending floor order.
    pub dropoffs: Vec<usize>,
}

impl State {
    /// Flat tuple form, of length `2 + 2·max_floor`.
    pub fn as_tuple(&self) -> Vec<usize> {
        let mut tuple = Vec::with_capacity(2 + self.pickups.len() + self.dropoffs.len());
        tuple.push(self.location_index);
        tuple.push(self.trend.code());
        tuple.extend(&self.pickups);
        tuple.extend(&self.dropoffs);
        tuple
    }

    /// Packs the count vectors into table coordinates.
    pub fn index(&self, buckets: usize) -> StateIndex {
        StateIndex {
            location: self.location_index,
            trend: self.trend.code(),
            pickups: pack(&self.pickups, buckets),
            dropoffs: pack(&self.dropoffs, buckets),
        }
    }
}

/// Table coordinates of a [`State`] (without the action axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateIndex {
    pub location: usize,
    pub trend: usize,
    pub pickups: usize,
    pub dropoffs: usize,
}

impl StateIndex {
    /// Full table index for `action` in this state.
    pub fn with_action(&self, action: usize) -> [usize; 5] {
        [
            self.location,
            self.trend,
            self.pickups,
            self.dropoffs,
            action,
        ]
    }

    /// Unpacks the coordinates back into a [`State`].
    ///
    /// Returns `None` if the trend code is unknown.
    pub fn decode(&self, floors: usize, buckets: usize) -> Option<State> {
        Some(State {
            location_index: self.location,
            trend: DirectionTrend::from_code(self.trend)?,
            pickups: unpack(self.pickups, floors, buckets),
            dropoffs: unpack(self.dropoffs, floors, buckets),
        })
    }
}

fn pack(counts: &[usize], buckets: usize) -> usize {
    counts
        .iter()
        .rev()
        .fold(0, |acc, &count| acc * buckets + count)
}

fn unpack(mut packed: usize, floors: usize, buckets: usize) -> Vec<usize> {
    (0..floors)
        .map(|_| {
            let digit = packed % buckets;
            packed /= buckets;
            digit
        })
        .collect()
}

/// Maps live dispatcher data onto a [`State`].
#[derive(Debug, Clone)]
pub struct StateEncoder {
    floors: usize,
    cap: usize,
}

impl StateEncoder {
    pub fn new(config: &DispatchConfig) -> Self {
        Self {
            floors: config.floors(),
            cap: config.max_floor_tasks_to_count,
        }
    }

    /// Rounds the car position to the nearest floor (half-floors to the even
    /// one) and shifts it to a zero-based index, clamped to the served range.
    pub fn location_index(&self, elevator_location: f64) -> usize {
        let floor = elevator_location.round_ties_even() as i64;
        (floor - 1).clamp(0, self.floors as i64 - 1) as usize
    }

    pub fn encode(&self, tasks: &[Task], elevator_location: f64, trend: DirectionTrend) -> State {
        State {
            location_index: self.location_index(elevator_location),
            trend,
            pickups: self.count(tasks, TaskKind::Pickup),
            dropoffs: self.count(tasks, TaskKind::Dropoff),
        }
    }

    fn count(&self, tasks: &[Task], kind: TaskKind) -> Vec<usize> {
        let mut counts = vec![0usize; self.floors];
        for task in tasks.iter().filter(|t| t.kind == kind) {
            if let Some(slot) = counts.get_mut(task.action_index()) {
                *slot = (*slot + 1).min(self.cap);
            }
        }
        counts
    }
}
