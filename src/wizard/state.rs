/// Wizard state management
///
/// Tracks position, per-step validity and completion through a flow.
/// Owned exclusively by the flow and mutated only through its transitions.
use std::collections::{HashMap, HashSet};

use super::steps::StepOutcome;

/// Wizard state
#[derive(Debug, Clone, Default)]
pub struct WizardState {
    /// Index into the full (unfiltered) step list
    current_index: usize,

    /// Indices marked done; append-only until reset
    completed: HashSet<usize>,

    /// Latest validation verdict per index
    validity: HashMap<usize, bool>,

    /// Latest validation error per index
    errors: HashMap<usize, String>,

    /// Terminal flag; once set, navigation stops
    is_complete: bool,
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub(crate) fn set_current_index(&mut self, index: usize) {
        self.current_index = index;
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub(crate) fn mark_complete(&mut self) {
        self.is_complete = true;
    }

    pub fn is_step_completed(&self, index: usize) -> bool {
        self.completed.contains(&index)
    }

    pub(crate) fn mark_step_completed(&mut self, index: usize) {
        self.completed.insert(index);
    }

    /// A step with no recorded verdict counts as invalid.
    pub fn is_step_valid(&self, index: usize) -> bool {
        self.validity.get(&index).copied().unwrap_or(false)
    }

    pub fn step_error(&self, index: usize) -> Option<&str> {
        self.errors.get(&index).map(String::as_str)
    }

    pub(crate) fn record_validity(&mut self, index: usize, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Valid => {
                self.validity.insert(index, true);
                self.errors.remove(&index);
            }
            StepOutcome::Invalid(message) => {
                self.validity.insert(index, false);
                self.errors.insert(index, message.clone());
            }
        }
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Completion progress (0.0-1.0) over `total` steps.
    pub fn progress(&self, total: usize) -> f32 {
        if self.is_complete {
            return 1.0;
        }
        if total == 0 {
            return 0.0;
        }
        (self.completed.len() as f32 / total as f32).min(1.0)
    }

    pub(crate) fn reset(&mut self) {
        self.current_index = 0;
        self.completed.clear();
        self.validity.clear();
        self.errors.clear();
        self.is_complete = false;
    }
}
