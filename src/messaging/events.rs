/// Event types published by the form layer
///
/// Events represent things that have happened (past tense).
/// They are broadcast to all subscribers.
use crate::form::Snapshot;

/// Form change events
#[derive(Debug, Clone)]
pub enum FormEvent {
    /// A single field value changed
    FieldChanged { path: String },

    /// The value tree changed; carries the new snapshot
    SnapshotChanged { snapshot: Snapshot },
}

impl FormEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            FormEvent::FieldChanged { path } => {
                format!("Field changed: {}", path)
            }
            FormEvent::SnapshotChanged { .. } => "Snapshot changed".to_string(),
        }
    }
}
