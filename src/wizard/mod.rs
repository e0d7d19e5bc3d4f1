/// Multi-step wizard module
///
/// A sequential, skip-aware, validated flow controller. The wizard holds
/// no field values of its own: it reads live snapshots pushed by the form
/// layer and only tracks position, per-step validity and completion.
///
/// ## Architecture
///
/// ```text
/// WizardFlow
///   ├── Vec<StepDefinition> (id, title, validator, skip predicate)
///   ├── WizardState (current index, completed set, validity, errors)
///   ├── Snapshot subscription (pumped from the form bus)
///   └── Deferred validation replies (generation-gated channel)
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// use form_flow::form::FormStore;
/// use form_flow::wizard::{StepDefinition, StepOutcome, WizardFlow};
///
/// let store = FormStore::new();
/// let steps = vec![
///     StepDefinition::new("basic", "Basic Info").validate(|snapshot| {
///         Ok(if snapshot.is_blank("name") {
///             StepOutcome::Invalid("Value is required".into())
///         } else {
///             StepOutcome::Valid
///         })
///     }),
///     StepDefinition::new("review", "Review"),
/// ];
///
/// let mut flow = WizardFlow::new(steps, store.snapshot())?;
/// flow.attach(store.bus());
/// flow.on_complete(|snapshot| println!("done: {}", snapshot.root()));
///
/// store.set("name", "Acme".into())?;
/// flow.pump();
/// flow.advance();
/// ```
///
/// The step list is supplied once at construction and never patched in
/// place; to change the steps, build a new flow.

pub mod flow;
pub mod state;
pub mod steps;

// Re-export commonly used types
pub use flow::{Responder, ValidationReply, WizardFlow, VALIDATOR_FAULT_MESSAGE};
pub use state::WizardState;
pub use steps::{StepDefinition, StepOutcome};
