//! Epsilon-greedy action selection.

use rand::seq::SliceRandom;
use rand::Rng;

use super::q_table::QTable;
use super::state::StateIndex;
use super::types::Task;

/// An action chosen by [`ExplorationPolicy::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Zero-based target floor index.
    pub action: usize,
    /// Whether the action came from the exploration branch.
    pub explored: bool,
}

/// Epsilon-greedy selector over the Q-table.
///
/// A uniform draw above the table's epsilon exploits (argmax, lowest index on
/// ties). Otherwise it explores, picking uniformly among the distinct floors
/// that currently hold a task rather than among all actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplorationPolicy;

impl ExplorationPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Returns `None` when there are no tasks to act on.
    pub fn select<R: Rng>(
        &self,
        q_table: &QTable,
        state: &StateIndex,
        tasks: &[Task],
        rng: &mut R,
    ) -> Option<Selection> {
        if tasks.is_empty() {
            return None;
        }

        if rng.gen::<f64>() > q_table.epsilon() {
            return Some(Selection {
                action: q_table.best_action(state),
                explored: false,
            });
        }

        let floors = Self::task_floors(tasks);
        floors.choose(rng).map(|&action| Selection {
            action,
            explored: true,
        })
    }

    /// Distinct zero-based floor indices holding a task, in task-list order.
    pub fn task_floors(tasks: &[Task]) -> Vec<usize> {
        let mut floors: Vec<usize> = Vec::with_capacity(tasks.len());
        for task in tasks {
            let idx = task.action_index();
            if !floors.contains(&idx) {
                floors.push(idx);
            }
        }
        floors
    }
}
