/// Live form value storage
///
/// The store owns the mutable value tree. Collaborators never share
/// mutable access: they mutate through the store's methods and observe
/// changes as snapshots published on the bus.
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

use crate::error::FormError;
use crate::messaging::{FormBus, FormEvent};

use super::snapshot::{lookup, Snapshot};

/// Holder of the current values of all tracked fields.
///
/// Cloning a store yields another handle to the same value tree and bus.
#[derive(Clone)]
pub struct FormStore {
    values: Arc<RwLock<Value>>,
    bus: FormBus,
}

impl FormStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_defaults(Value::Object(Default::default()))
    }

    /// Create a store seeded with default values (a JSON object).
    pub fn with_defaults(defaults: Value) -> Self {
        Self {
            values: Arc::new(RwLock::new(defaults)),
            bus: FormBus::new(),
        }
    }

    pub fn bus(&self) -> &FormBus {
        &self.bus
    }

    /// Immutable view of the current values.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.values.read().clone())
    }

    /// Clone of the value at `path`, if present.
    pub fn get(&self, path: &str) -> Option<Value> {
        let values = self.values.read();
        lookup(&values, path).cloned()
    }

    /// Write a value, creating intermediate objects along the way.
    ///
    /// Array elements can be overwritten by index but not created here;
    /// use [`push`](Self::push) to grow an array.
    pub fn set(&self, path: &str, value: Value) -> Result<(), FormError> {
        if path.is_empty() {
            return Err(FormError::EmptyPath);
        }
        {
            let mut values = self.values.write();
            let (parent, key) = split_tail(path);
            let parent_node = match parent {
                Some(prefix) => node_mut(&mut values, prefix, true)?,
                None => &mut *values,
            };
            match parent_node {
                Value::Object(map) => {
                    map.insert(key.to_string(), value);
                }
                Value::Array(items) => {
                    let len = items.len();
                    let index = parse_index(key, path)?;
                    let slot = items.get_mut(index).ok_or(FormError::IndexOutOfBounds {
                        path: path.to_string(),
                        index,
                        len,
                    })?;
                    *slot = value;
                }
                _ => {
                    return Err(FormError::NotAnObject {
                        path: parent.unwrap_or_default().to_string(),
                    })
                }
            }
        }
        self.publish_change(path);
        Ok(())
    }

    /// Remove a key from its parent object.
    pub fn remove(&self, path: &str) -> Result<(), FormError> {
        if path.is_empty() {
            return Err(FormError::EmptyPath);
        }
        {
            let mut values = self.values.write();
            let (parent, key) = split_tail(path);
            let parent_node = match parent {
                Some(prefix) => node_mut(&mut values, prefix, false)?,
                None => &mut *values,
            };
            let map = parent_node.as_object_mut().ok_or(FormError::NotAnObject {
                path: parent.unwrap_or_default().to_string(),
            })?;
            if map.remove(key).is_none() {
                return Err(FormError::MissingValue {
                    path: path.to_string(),
                });
            }
        }
        self.publish_change(path);
        Ok(())
    }

    /// Append to the array at `path`, creating it if missing.
    /// Returns the new length.
    pub fn push(&self, path: &str, value: Value) -> Result<usize, FormError> {
        if path.is_empty() {
            return Err(FormError::EmptyPath);
        }
        let len = {
            let mut values = self.values.write();
            let items = array_slot(&mut values, path, true)?;
            items.push(value);
            items.len()
        };
        self.publish_change(path);
        Ok(len)
    }

    /// Insert into the array at `path`; `index` may equal the length.
    pub fn insert_at(&self, path: &str, index: usize, value: Value) -> Result<(), FormError> {
        {
            let mut values = self.values.write();
            let items = array_slot(&mut values, path, true)?;
            if index > items.len() {
                return Err(FormError::IndexOutOfBounds {
                    path: path.to_string(),
                    index,
                    len: items.len(),
                });
            }
            items.insert(index, value);
        }
        self.publish_change(path);
        Ok(())
    }

    /// Remove an element from the array at `path`.
    pub fn remove_at(&self, path: &str, index: usize) -> Result<(), FormError> {
        {
            let mut values = self.values.write();
            let items = array_slot(&mut values, path, false)?;
            if index >= items.len() {
                return Err(FormError::IndexOutOfBounds {
                    path: path.to_string(),
                    index,
                    len: items.len(),
                });
            }
            items.remove(index);
        }
        self.publish_change(path);
        Ok(())
    }

    /// Reorder an element within the array at `path`.
    pub fn move_item(&self, path: &str, from: usize, to: usize) -> Result<(), FormError> {
        {
            let mut values = self.values.write();
            let items = array_slot(&mut values, path, false)?;
            let len = items.len();
            for index in [from, to] {
                if index >= len {
                    return Err(FormError::IndexOutOfBounds {
                        path: path.to_string(),
                        index,
                        len,
                    });
                }
            }
            if from != to {
                let value = items.remove(from);
                items.insert(to, value);
            }
        }
        self.publish_change(path);
        Ok(())
    }

    fn publish_change(&self, path: &str) {
        self.bus.publish(FormEvent::FieldChanged {
            path: path.to_string(),
        });
        self.bus.publish(FormEvent::SnapshotChanged {
            snapshot: self.snapshot(),
        });
    }
}

impl Default for FormStore {
    fn default() -> Self {
        Self::new()
    }
}

fn split_tail(path: &str) -> (Option<&str>, &str) {
    match path.rsplit_once('.') {
        Some((parent, key)) => (Some(parent), key),
        None => (None, path),
    }
}

fn parse_index(segment: &str, path: &str) -> Result<usize, FormError> {
    segment.parse::<usize>().map_err(|_| FormError::NotAnObject {
        path: path.to_string(),
    })
}

/// Walk a dot-path to a mutable node. With `create`, missing object keys
/// are created as empty objects; array elements are never created.
fn node_mut<'a>(root: &'a mut Value, path: &str, create: bool) -> Result<&'a mut Value, FormError> {
    let mut node = root;
    let mut walked = String::new();
    for segment in path.split('.') {
        if !walked.is_empty() {
            walked.push('.');
        }
        walked.push_str(segment);
        node = match node {
            Value::Object(map) => {
                if create {
                    map.entry(segment.to_string())
                        .or_insert_with(|| Value::Object(Default::default()))
                } else {
                    map.get_mut(segment).ok_or(FormError::MissingValue {
                        path: walked.clone(),
                    })?
                }
            }
            Value::Array(items) => {
                let len = items.len();
                let index = parse_index(segment, &walked)?;
                items.get_mut(index).ok_or(FormError::IndexOutOfBounds {
                    path: walked.clone(),
                    index,
                    len,
                })?
            }
            _ => {
                return Err(FormError::NotAnObject { path: walked });
            }
        };
    }
    Ok(node)
}

fn array_slot<'a>(
    root: &'a mut Value,
    path: &str,
    create: bool,
) -> Result<&'a mut Vec<Value>, FormError> {
    let node = if create {
        let (parent, key) = split_tail(path);
        let parent_node = match parent {
            Some(prefix) => node_mut(root, prefix, true)?,
            None => root,
        };
        match parent_node {
            Value::Object(map) => map
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new())),
            other => node_mut(other, key, false)?,
        }
    } else {
        node_mut(root, path, false)?
    };
    node.as_array_mut().ok_or_else(|| FormError::NotAnArray {
        path: path.to_string(),
    })
}
