//! Messages exchanged between views and the coordinator.

use serde::{Deserialize, Serialize};

use crate::{AccumulatedState, FactCheckRecord};

/// Commands sent from a view to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    CheckFact { query: String },
    ClearResults,
}

/// Synchronous acknowledgement of a command. The command's effect is
/// asynchronous; `success` only reports whether it was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAck {
    pub success: bool,
}

/// Best-effort events broadcast by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CoordinatorEvent {
    #[serde(rename_all = "camelCase")]
    ResultsUpdated {
        results: Vec<FactCheckRecord>,
        pending_checks: u32,
    },
    ResultsCleared,
}

impl CoordinatorEvent {
    pub fn updated(state: &AccumulatedState) -> Self {
        CoordinatorEvent::ResultsUpdated {
            results: state.results.clone(),
            pending_checks: state.pending_checks,
        }
    }
}
