//! View-side projection of the coordinator's state.
//!
//! A view never mutates canonical state. It reads the state once when it
//! opens, turns user actions into [`Command`]s, and replaces whatever it shows
//! with each broadcast it receives. Broadcasts sent while no view was open are
//! simply lost, which is why [`ViewModel::open`] takes a fresh state read.

use thiserror::Error;

use crate::message::{Command, CoordinatorEvent};
use crate::{AccumulatedState, FactCheckRecord};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("Please enter text to fact-check")]
    EmptyQuery,
}

/// Transient status line shown under the query field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewStatus {
    #[default]
    Idle,
    /// A check was handed to the coordinator; it continues if the view closes.
    Submitted,
    Error(String),
}

impl ViewStatus {
    pub fn message(&self) -> &str {
        match self {
            ViewStatus::Idle => "",
            ViewStatus::Submitted => {
                "Fact check started! You can close this and continue browsing"
            }
            ViewStatus::Error(msg) => msg,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewModel {
    results: Vec<FactCheckRecord>,
    pending_checks: u32,
    query: String,
    status: ViewStatus,
    has_update: bool,
}

impl ViewModel {
    /// Build the view from a state read taken when it opened.
    pub fn open(state: AccumulatedState) -> Self {
        Self {
            results: state.results,
            pending_checks: state.pending_checks,
            ..Self::default()
        }
    }

    /// Pre-fill the query field from the host's current text selection.
    ///
    /// Only fills an empty field; blank selections are ignored.
    pub fn seed_query(&mut self, selection: &str) {
        let selection = selection.trim();
        if self.query.is_empty() && !selection.is_empty() {
            self.query = selection.to_string();
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn query_mut(&mut self) -> &mut String {
        &mut self.query
    }

    /// Validate the query and produce the command to send.
    pub fn on_submit_clicked(&mut self, text: &str) -> Result<Command, ViewError> {
        let query = text.trim();
        if query.is_empty() {
            self.status = ViewStatus::Error(ViewError::EmptyQuery.to_string());
            return Err(ViewError::EmptyQuery);
        }
        self.status = ViewStatus::Submitted;
        Ok(Command::CheckFact {
            query: query.to_string(),
        })
    }

    /// Clear locally right away; the next broadcast confirms or corrects it.
    pub fn on_clear_clicked(&mut self) -> Command {
        self.results.clear();
        self.pending_checks = 0;
        self.query.clear();
        self.status = ViewStatus::Idle;
        Command::ClearResults
    }

    /// Replace displayed state with a coordinator broadcast.
    pub fn apply(&mut self, event: &CoordinatorEvent) {
        match event {
            CoordinatorEvent::ResultsUpdated {
                results,
                pending_checks,
            } => {
                self.results = results.clone();
                self.pending_checks = *pending_checks;
            }
            CoordinatorEvent::ResultsCleared => {
                self.results.clear();
                self.pending_checks = 0;
            }
        }
        self.has_update = true;
        self.settle_status();
    }

    /// Re-read after missing broadcasts (e.g. a lagging receiver).
    pub fn reload(&mut self, state: AccumulatedState) {
        self.results = state.results;
        self.pending_checks = state.pending_checks;
        self.has_update = true;
        self.settle_status();
    }

    /// "Submitted" only describes checks still running.
    fn settle_status(&mut self) {
        if self.status == ViewStatus::Submitted && !self.is_pending() {
            self.status = ViewStatus::Idle;
        }
    }

    pub fn results(&self) -> &[FactCheckRecord] {
        &self.results
    }

    pub fn pending_checks(&self) -> u32 {
        self.pending_checks
    }

    pub fn is_pending(&self) -> bool {
        self.pending_checks > 0
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn clear_status(&mut self) {
        self.status = ViewStatus::Idle;
    }

    /// Whether any broadcast arrived since the view opened.
    pub fn has_update(&self) -> bool {
        self.has_update
    }
}
