//! Form-flow building blocks: a form-value store with push-based change
//! notification, a declarative schema-validation layer, simulated remote
//! validators, and a skip-aware, validated multi-step wizard flow.
//!
//! ## Architecture
//!
//! ```text
//! FormStore ──publishes──▶ FormBus ──snapshots──▶ WizardFlow
//!     ▲                                              │
//!  field edits                               step validators
//!                                     (Schema slices, remote stubs)
//! ```
//!
//! The store owns the values; everything downstream sees immutable
//! snapshots. The wizard gates navigation on per-step validity and hands
//! the final snapshot to its completion callback exactly once.
//!
//! See [`flows`] for runnable showcases of the whole stack.

pub mod config;
pub mod error;
pub mod flows;
pub mod form;
pub mod messaging;
pub mod remote;
pub mod schema;
pub mod wizard;

pub use error::AppResult;
pub use form::{FormStore, Snapshot};
pub use messaging::{FormBus, FormEvent};
pub use schema::{Rule, Schema, ValidationReport};
pub use wizard::{StepDefinition, StepOutcome, WizardFlow, WizardState};
