/// Wizard flow management
///
/// Sequences steps, gates forward navigation on validity, honors skip
/// predicates against the live snapshot, and delivers the final snapshot
/// exactly once. Navigation that violates the ordering contract is
/// rejected silently: the call returns `false` and nothing changes.
use std::collections::HashSet;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::error::FlowError;
use crate::form::Snapshot;
use crate::messaging::{FormBus, FormEvent};

use super::state::WizardState;
use super::steps::{StepDefinition, StepOutcome, StepValidator};

/// Shown in place of a validator's own message when it faults.
pub const VALIDATOR_FAULT_MESSAGE: &str =
    "Please complete all required fields for this step.";

/// Deferred validation result, tagged with the evaluation it answers.
///
/// Replies are applied only while both tags still match the flow's
/// current evaluation; anything else is stale and gets dropped.
#[derive(Debug, Clone)]
pub struct ValidationReply {
    index: usize,
    generation: u64,
    outcome: StepOutcome,
}

impl ValidationReply {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn outcome(&self) -> &StepOutcome {
        &self.outcome
    }
}

/// Handle a deferred validator uses to deliver its result.
///
/// Consuming it via [`resolve`](Self::resolve) or [`fail`](Self::fail) is
/// the normal path; a responder dropped without resolving reports a fault
/// so the flow never waits forever.
pub struct Responder {
    index: usize,
    generation: u64,
    tx: Sender<ValidationReply>,
    sent: bool,
}

impl Responder {
    pub fn resolve(mut self, outcome: StepOutcome) {
        self.send(outcome);
    }

    pub fn fail(mut self, error: impl std::fmt::Display) {
        tracing::warn!(index = self.index, "step validator fault: {error}");
        self.send(StepOutcome::Invalid(VALIDATOR_FAULT_MESSAGE.to_string()));
    }

    fn send(&mut self, outcome: StepOutcome) {
        if self.sent {
            return;
        }
        self.sent = true;
        let _ = self.tx.send(ValidationReply {
            index: self.index,
            generation: self.generation,
            outcome,
        });
    }

    #[cfg(test)]
    pub(crate) fn test_pair(index: usize, generation: u64) -> (Self, Receiver<ValidationReply>) {
        let (tx, rx) = unbounded();
        (
            Self {
                index,
                generation,
                tx,
                sent: false,
            },
            rx,
        )
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if !self.sent {
            tracing::warn!(index = self.index, "deferred validator dropped its responder");
            self.send(StepOutcome::Invalid(VALIDATOR_FAULT_MESSAGE.to_string()));
        }
    }
}

type StepChangeFn = Box<dyn FnMut(usize) + Send>;
type CompleteFn = Box<dyn FnMut(Snapshot) + Send>;

/// Skip-aware, validated multi-step flow controller.
pub struct WizardFlow {
    steps: Vec<StepDefinition>,
    state: WizardState,
    snapshot: Snapshot,
    /// Bumped on every evaluation; deferred replies must match to land.
    generation: u64,
    /// (index, generation) of the outstanding deferred check, if any.
    awaiting: Option<(usize, u64)>,
    reply_tx: Sender<ValidationReply>,
    reply_rx: Receiver<ValidationReply>,
    form_events: Option<Receiver<FormEvent>>,
    on_step_change: Option<StepChangeFn>,
    on_complete: Option<CompleteFn>,
}

impl std::fmt::Debug for WizardFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardFlow")
            .field("steps", &self.steps.len())
            .field("generation", &self.generation)
            .field("awaiting", &self.awaiting)
            .finish_non_exhaustive()
    }
}

impl WizardFlow {
    /// Build a flow over an ordered step list. The list is fixed for the
    /// life of the flow; replacing steps mid-flow is not supported.
    pub fn new(steps: Vec<StepDefinition>, snapshot: Snapshot) -> Result<Self, FlowError> {
        if steps.is_empty() {
            return Err(FlowError::NoSteps);
        }
        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id().to_string()) {
                return Err(FlowError::DuplicateStepId(step.id().to_string()));
            }
        }

        let (reply_tx, reply_rx) = unbounded();
        let mut flow = Self {
            steps,
            state: WizardState::new(),
            snapshot,
            generation: 0,
            awaiting: None,
            reply_tx,
            reply_rx,
            form_events: None,
            on_step_change: None,
            on_complete: None,
        };
        flow.state.set_current_index(flow.first_navigable());
        flow.evaluate_current();
        Ok(flow)
    }

    /// Receive snapshots from a form bus instead of manual syncing.
    /// Call [`pump`](Self::pump) to drain the subscription.
    pub fn attach(&mut self, bus: &FormBus) {
        let (rx, _id) = bus.subscribe();
        self.form_events = Some(rx);
    }

    pub fn on_step_change(&mut self, callback: impl FnMut(usize) + Send + 'static) {
        self.on_step_change = Some(Box::new(callback));
    }

    pub fn on_complete(&mut self, callback: impl FnMut(Snapshot) + Send + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Drain queued form events and deferred validation replies.
    /// Hosts call this once per tick, or after any form mutation.
    pub fn pump(&mut self) {
        let mut latest = None;
        if let Some(rx) = &self.form_events {
            for event in rx.try_iter() {
                if let FormEvent::SnapshotChanged { snapshot } = event {
                    latest = Some(snapshot);
                }
            }
        }
        if let Some(snapshot) = latest {
            self.sync_snapshot(snapshot);
        }
        self.drain_replies();
    }

    /// Push a new snapshot; re-validates the active step.
    pub fn sync_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        if !self.state.is_complete() {
            self.evaluate_current();
        }
    }

    /// Apply any deferred validation results that have arrived. Results
    /// for a superseded evaluation or a step that is no longer active are
    /// discarded: last request wins.
    pub fn drain_replies(&mut self) {
        while let Ok(reply) = self.reply_rx.try_recv() {
            if self.state.is_complete()
                || reply.generation != self.generation
                || reply.index != self.state.current_index()
            {
                tracing::debug!(index = reply.index, "discarding stale validation result");
                continue;
            }
            self.awaiting = None;
            self.state.record_validity(reply.index, &reply.outcome);
        }
    }

    /// True while a deferred check for the active step is outstanding.
    pub fn is_validating(&self) -> bool {
        self.awaiting.is_some()
    }

    /// Move forward past any skip-marked steps. Requires the active step
    /// to be valid; completes the flow when no navigable step remains.
    pub fn advance(&mut self) -> bool {
        if self.state.is_complete() {
            return false;
        }
        self.drain_replies();
        let current = self.state.current_index();
        if !self.state.is_step_valid(current) {
            return false;
        }
        self.state.mark_step_completed(current);

        let mut next = current + 1;
        while next < self.steps.len() && self.should_skip(next) {
            next += 1;
        }

        if next >= self.steps.len() {
            self.state.mark_complete();
            self.awaiting = None;
            tracing::info!(step = %self.steps[current].id(), "flow completed");
            let snapshot = self.snapshot.clone();
            if let Some(callback) = self.on_complete.as_mut() {
                callback(snapshot);
            }
            true
        } else {
            self.move_to(next)
        }
    }

    /// Move backward past any skip-marked steps. Never gated on validity;
    /// a no-op at the first navigable step.
    pub fn retreat(&mut self) -> bool {
        if self.state.is_complete() {
            return false;
        }
        let current = self.state.current_index();
        match (0..current).rev().find(|&index| !self.should_skip(index)) {
            Some(previous) => self.move_to(previous),
            None => false,
        }
    }

    /// Jump to an arbitrary step. Allowed only when every non-skipped
    /// step before the target is completed or currently valid, and the
    /// target itself is not skip-marked.
    pub fn jump_to(&mut self, target: usize) -> bool {
        if self.state.is_complete() || target >= self.steps.len() {
            return false;
        }
        if self.should_skip(target) {
            return false;
        }
        if target == self.state.current_index() {
            return true;
        }
        self.drain_replies();
        for index in 0..target {
            if self.should_skip(index) {
                continue;
            }
            if !self.state.is_step_completed(index) && !self.state.is_step_valid(index) {
                return false;
            }
        }
        self.move_to(target)
    }

    /// Return to the initial state. Any in-flight validation result from
    /// before the reset can no longer land.
    pub fn reset(&mut self) {
        self.state.reset();
        self.awaiting = None;
        self.state.set_current_index(self.first_navigable());
        self.evaluate_current();
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index()
    }

    pub fn current_step(&self) -> &StepDefinition {
        &self.steps[self.state.current_index()]
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Error text for the active step, if its last validation failed.
    pub fn current_error(&self) -> Option<&str> {
        self.state.step_error(self.state.current_index())
    }

    pub fn can_advance(&self) -> bool {
        !self.state.is_complete() && self.state.is_step_valid(self.state.current_index())
    }

    pub fn can_retreat(&self) -> bool {
        !self.state.is_complete()
            && (0..self.state.current_index()).any(|index| !self.should_skip(index))
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    /// Indices of the steps currently part of the navigable sequence,
    /// i.e. whose skip predicate evaluates false against the live
    /// snapshot. This is what progress indicators should render.
    pub fn navigable_indices(&self) -> Vec<usize> {
        (0..self.steps.len())
            .filter(|&index| !self.should_skip(index))
            .collect()
    }

    /// 1-based position of the active step within the navigable sequence
    /// plus the navigable total. Position is 0 when the active step has
    /// itself become skip-marked by a live data change.
    pub fn display_position(&self) -> (usize, usize) {
        let navigable = self.navigable_indices();
        let position = navigable
            .iter()
            .position(|&index| index == self.state.current_index())
            .map(|found| found + 1)
            .unwrap_or(0);
        (position, navigable.len())
    }

    fn should_skip(&self, index: usize) -> bool {
        self.steps[index].should_skip(&self.snapshot)
    }

    fn first_navigable(&self) -> usize {
        (0..self.steps.len())
            .find(|&index| !self.should_skip(index))
            .unwrap_or(0)
    }

    fn move_to(&mut self, index: usize) -> bool {
        self.state.set_current_index(index);
        tracing::debug!(index, step = %self.steps[index].id(), "step changed");
        if let Some(callback) = self.on_step_change.as_mut() {
            callback(index);
        }
        self.evaluate_current();
        true
    }

    /// Run the active step's validator against the latest snapshot.
    /// Re-triggered on every snapshot change and every index change;
    /// reads the snapshot only, never mutates it.
    fn evaluate_current(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.awaiting = None;
        let index = self.state.current_index();
        let outcome = match self.steps[index].validator() {
            None => StepOutcome::Valid,
            Some(StepValidator::Sync(check)) => match check(&self.snapshot) {
                Ok(outcome) => outcome,
                Err(error) => {
                    tracing::warn!(step = %self.steps[index].id(), "step validator fault: {error:#}");
                    StepOutcome::Invalid(VALIDATOR_FAULT_MESSAGE.to_string())
                }
            },
            Some(StepValidator::Deferred(start)) => {
                self.awaiting = Some((index, self.generation));
                let responder = Responder {
                    index,
                    generation: self.generation,
                    tx: self.reply_tx.clone(),
                    sent: false,
                };
                start(self.snapshot.clone(), responder);
                return;
            }
        };
        self.state.record_validity(index, &outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use anyhow::anyhow;

    fn open_step(id: &str) -> StepDefinition {
        StepDefinition::new(id, id.to_uppercase())
    }

    fn required_step(id: &str, path: &'static str) -> StepDefinition {
        StepDefinition::new(id, id.to_uppercase()).validate(move |snapshot| {
            Ok(if snapshot.is_blank(path) {
                StepOutcome::Invalid("Value is required".to_string())
            } else {
                StepOutcome::Valid
            })
        })
    }

    #[test]
    fn test_rejects_duplicate_ids_and_empty_lists() {
        let err = WizardFlow::new(Vec::new(), Snapshot::default()).unwrap_err();
        assert!(matches!(err, FlowError::NoSteps));

        let err = WizardFlow::new(
            vec![open_step("a"), open_step("a")],
            Snapshot::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FlowError::DuplicateStepId(id) if id == "a"));
    }

    #[test]
    fn test_advance_moves_and_marks_completed() {
        let steps = vec![open_step("a"), open_step("b"), open_step("c")];
        let mut flow = WizardFlow::new(steps, Snapshot::default()).unwrap();

        assert_eq!(flow.current_index(), 0);
        assert!(flow.advance());
        assert_eq!(flow.current_index(), 1);
        assert!(flow.state().is_step_completed(0));
    }

    #[test]
    fn test_advance_blocked_while_invalid() {
        let steps = vec![open_step("a"), required_step("b", "name"), open_step("c")];
        let mut flow = WizardFlow::new(steps, Snapshot::default()).unwrap();

        assert!(flow.advance());
        assert_eq!(flow.current_index(), 1);

        // Invalid: advance must not move nor complete anything further.
        assert!(!flow.advance());
        assert_eq!(flow.current_index(), 1);
        assert_eq!(flow.current_error(), Some("Value is required"));

        flow.sync_snapshot(Snapshot::new(json!({ "name": "Acme" })));
        assert!(flow.advance());
        assert_eq!(flow.current_index(), 2);
    }

    #[test]
    fn test_validator_fault_becomes_invalid_with_fallback() {
        let steps = vec![
            StepDefinition::new("a", "A").validate(|_| Err(anyhow!("backend unreachable")))
        ];
        let mut flow = WizardFlow::new(steps, Snapshot::default()).unwrap();

        assert!(!flow.advance());
        assert_eq!(flow.current_error(), Some(VALIDATOR_FAULT_MESSAGE));
    }

    #[test]
    fn test_skip_scan_in_both_directions() {
        let snapshot = Snapshot::new(json!({ "customer_type": "individual" }));
        let steps = vec![
            open_step("customer"),
            StepDefinition::new("business", "Business")
                .skip_if(|s| s.str_at("customer_type") != Some("business")),
            open_step("review"),
        ];
        let mut flow = WizardFlow::new(steps, snapshot).unwrap();

        assert!(flow.advance());
        assert_eq!(flow.current_index(), 2, "skip-marked step is stepped over");
        assert_eq!(flow.navigable_indices(), vec![0, 2]);
        assert_eq!(flow.display_position(), (2, 2));

        assert!(flow.retreat());
        assert_eq!(flow.current_index(), 0);
    }

    #[test]
    fn test_initial_index_skips_leading_skip_marked_steps() {
        let snapshot = Snapshot::new(json!({ "returning": true }));
        let steps = vec![
            StepDefinition::new("welcome", "Welcome")
                .skip_if(|s| s.bool_at("returning") == Some(true)),
            open_step("details"),
        ];
        let flow = WizardFlow::new(steps, snapshot).unwrap();
        assert_eq!(flow.current_index(), 1);
    }

    #[test]
    fn test_retreat_blocked_at_first_navigable_step() {
        let mut flow =
            WizardFlow::new(vec![open_step("a"), open_step("b")], Snapshot::default()).unwrap();
        assert!(!flow.retreat());
        assert_eq!(flow.current_index(), 0);
        assert!(!flow.can_retreat());
    }

    #[test]
    fn test_completion_fires_exactly_once_with_latest_snapshot() {
        let completions = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(None));

        let mut flow = WizardFlow::new(
            vec![open_step("a"), open_step("b"), open_step("c")],
            Snapshot::default(),
        )
        .unwrap();
        let counter = Arc::clone(&completions);
        let slot = Arc::clone(&seen);
        flow.on_complete(move |snapshot| {
            counter.fetch_add(1, Ordering::SeqCst);
            *slot.lock() = Some(snapshot);
        });

        assert!(flow.advance());
        assert!(flow.advance());
        flow.sync_snapshot(Snapshot::new(json!({ "name": "final" })));
        assert!(flow.advance());

        assert!(flow.is_complete());
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        let snapshot = seen.lock().clone().unwrap();
        assert_eq!(snapshot.str_at("name"), Some("final"));

        // Terminal: every further transition is a no-op.
        let index = flow.current_index();
        assert!(!flow.advance());
        assert!(!flow.retreat());
        assert!(!flow.jump_to(0));
        assert_eq!(flow.current_index(), index);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_step_change_callback() {
        let visited = Arc::new(Mutex::new(Vec::new()));
        let mut flow = WizardFlow::new(
            vec![open_step("a"), open_step("b"), open_step("c")],
            Snapshot::default(),
        )
        .unwrap();
        let log = Arc::clone(&visited);
        flow.on_step_change(move |index| log.lock().push(index));

        flow.advance();
        flow.advance();
        flow.retreat();
        assert_eq!(*visited.lock(), vec![1, 2, 1]);
    }

    #[test]
    fn test_jump_containment() {
        let steps = vec![
            required_step("a", "name"),
            open_step("b"),
            open_step("c"),
        ];
        let mut flow = WizardFlow::new(steps, Snapshot::default()).unwrap();

        // Step 0 is neither completed nor valid: forward jumps rejected.
        assert!(!flow.jump_to(1));
        assert_eq!(flow.current_index(), 0);

        flow.sync_snapshot(Snapshot::new(json!({ "name": "Acme" })));
        assert!(flow.jump_to(1), "valid-but-not-completed still unlocks the jump");
        assert_eq!(flow.current_index(), 1);

        // Step 1 validated on arrival (it has no validator), so the next
        // hop opens too.
        assert!(flow.jump_to(2));
        assert_eq!(flow.current_index(), 2);

        assert!(flow.jump_to(0), "backward movement is always free");
        assert!(!flow.jump_to(3), "out of range is rejected");
    }

    #[test]
    fn test_jump_to_skip_marked_target_is_rejected() {
        let snapshot = Snapshot::new(json!({ "customer_type": "individual" }));
        let steps = vec![
            open_step("customer"),
            StepDefinition::new("business", "Business")
                .skip_if(|s| s.str_at("customer_type") != Some("business")),
        ];
        let mut flow = WizardFlow::new(steps, snapshot).unwrap();
        assert!(!flow.jump_to(1));
        assert_eq!(flow.current_index(), 0);
    }

    #[test]
    fn test_reset_allows_second_completion() {
        let completions = Arc::new(AtomicUsize::new(0));
        let mut flow = WizardFlow::new(vec![open_step("a")], Snapshot::default()).unwrap();
        let counter = Arc::clone(&completions);
        flow.on_complete(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(flow.advance());
        assert!(flow.is_complete());

        flow.reset();
        assert!(!flow.is_complete());
        assert_eq!(flow.current_index(), 0);
        assert!(flow.advance());
        assert_eq!(completions.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_deferred_result_applies_when_current() {
        let pending: Arc<Mutex<Vec<Responder>>> = Arc::new(Mutex::new(Vec::new()));
        let inbox = Arc::clone(&pending);
        let steps = vec![StepDefinition::new("account", "Account")
            .validate_deferred(move |_snapshot, responder| inbox.lock().push(responder))];
        let mut flow = WizardFlow::new(steps, Snapshot::default()).unwrap();

        assert!(flow.is_validating());
        assert!(!flow.advance(), "nothing lands until the reply arrives");

        pending.lock().pop().unwrap().resolve(StepOutcome::Valid);
        flow.drain_replies();
        assert!(!flow.is_validating());
        assert!(flow.can_advance());
    }

    #[test]
    fn test_superseded_deferred_result_is_discarded() {
        let pending: Arc<Mutex<Vec<Responder>>> = Arc::new(Mutex::new(Vec::new()));
        let inbox = Arc::clone(&pending);
        let steps = vec![StepDefinition::new("account", "Account")
            .validate_deferred(move |_snapshot, responder| inbox.lock().push(responder))];
        let mut flow = WizardFlow::new(steps, Snapshot::default()).unwrap();

        // Snapshot change supersedes the first evaluation.
        flow.sync_snapshot(Snapshot::new(json!({ "username": "mira" })));
        let mut responders = {
            let mut guard = pending.lock();
            std::mem::take(&mut *guard)
        };
        assert_eq!(responders.len(), 2);

        let stale = responders.remove(0);
        let fresh = responders.remove(0);

        // Newer result lands first; the slow stale failure must not undo it.
        fresh.resolve(StepOutcome::Valid);
        flow.drain_replies();
        assert!(flow.can_advance());

        stale.resolve(StepOutcome::Invalid("already taken".to_string()));
        flow.drain_replies();
        assert!(flow.can_advance(), "stale invalid result was discarded");
        assert_eq!(flow.current_error(), None);
    }

    #[test]
    fn test_deferred_result_for_departed_step_is_discarded() {
        let pending: Arc<Mutex<Vec<Responder>>> = Arc::new(Mutex::new(Vec::new()));
        let inbox = Arc::clone(&pending);
        let steps = vec![
            StepDefinition::new("account", "Account")
                .validate_deferred(move |_snapshot, responder| inbox.lock().push(responder)),
            open_step("review"),
        ];
        let mut flow = WizardFlow::new(steps, Snapshot::default()).unwrap();

        // Resolve the first check so we can move forward, then leave a
        // second check in flight by coming back and jumping away again.
        pending.lock().pop().unwrap().resolve(StepOutcome::Valid);
        flow.drain_replies();
        assert!(flow.advance());

        flow.retreat();
        assert!(flow.is_validating());
        assert!(flow.jump_to(1), "completed first step keeps the jump open");

        pending
            .lock()
            .pop()
            .unwrap()
            .resolve(StepOutcome::Invalid("slow failure".to_string()));
        flow.drain_replies();
        assert!(
            flow.state().is_step_valid(0),
            "late reply for an inactive step must not clobber its recorded validity"
        );
    }

    #[test]
    fn test_dropped_responder_reports_fault() {
        let steps = vec![StepDefinition::new("account", "Account")
            .validate_deferred(|_snapshot, responder| drop(responder))];
        let mut flow = WizardFlow::new(steps, Snapshot::default()).unwrap();

        flow.drain_replies();
        assert!(!flow.is_validating());
        assert_eq!(flow.current_error(), Some(VALIDATOR_FAULT_MESSAGE));
    }

    #[test]
    fn test_pump_consumes_bus_snapshots() {
        use crate::form::FormStore;

        let store = FormStore::new();
        let steps = vec![required_step("a", "name"), open_step("b")];
        let mut flow = WizardFlow::new(steps, store.snapshot()).unwrap();
        flow.attach(store.bus());

        assert!(!flow.can_advance());
        store.set("name", json!("Acme")).unwrap();
        flow.pump();
        assert!(flow.can_advance());
    }
}
