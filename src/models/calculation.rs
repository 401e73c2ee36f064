//! Backend recalculation state.

use serde::{Deserialize, Serialize};

/// State pushed by the `calculationUpdate` subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationState {
    /// A recalculation is running.
    Calculating,
    /// Inputs changed since the last finished plan.
    #[default]
    Modified,
    /// A new plan is available.
    Finished,
}

impl CalculationState {
    /// Whether a client should refetch plan-derived data.
    pub fn plan_ready(self) -> bool {
        self == CalculationState::Finished
    }
}
