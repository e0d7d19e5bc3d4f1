/// Form state layer
///
/// Owns the live field values and publishes every change as an immutable
/// snapshot. Consumers (the wizard, schema validators, UIs) only ever see
/// snapshots; nothing outside this module mutates the value tree.
///
/// ```text
/// FormStore
///   ├── value tree (serde_json::Value, dot-path addressed)
///   ├── array helpers (push / insert_at / remove_at / move_item)
///   └── FormBus publishing FieldChanged + SnapshotChanged
/// ```
pub mod snapshot;
pub mod store;

pub use snapshot::Snapshot;
pub use store::FormStore;
