//! Reward attributed to the previous dispatch decision.

use crate::Timestamp;

/// Computes the waiting-time penalty for the decision taken at
/// `last_action_ts`.
pub struct RewardModel;

impl RewardModel {
    /// `-Σ (now - registered)` over every still-registered rider whose pickup
    /// was registered at or after the last decision.
    pub fn compute<I>(registrations: I, now: Timestamp, last_action_ts: Timestamp) -> f64
    where
        I: IntoIterator<Item = Timestamp>,
    {
        -registrations
            .into_iter()
            .filter(|&registered| registered >= last_action_ts)
            .map(|registered| now - registered)
            .sum::<f64>()
    }
}
