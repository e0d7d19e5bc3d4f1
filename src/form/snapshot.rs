/// Read-only snapshots of form values
///
/// A snapshot is an immutable view of every tracked field at a point in
/// time. It is cheap to clone and safe to hand to validators on other
/// threads.
use serde_json::Value;
use std::sync::Arc;

/// Immutable view of the form value tree.
///
/// Fields are addressed by dot-separated paths; numeric segments index
/// into arrays (`departments.0.name`).
#[derive(Debug, Clone)]
pub struct Snapshot {
    root: Arc<Value>,
}

impl Snapshot {
    pub fn new(root: Value) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    /// The whole value tree.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Resolve a dot-path to the value it points at, if any.
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.root, path)
    }

    pub fn str_at(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn f64_at(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(Value::as_f64)
    }

    pub fn bool_at(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    pub fn array_len(&self, path: &str) -> Option<usize> {
        self.get(path).and_then(Value::as_array).map(Vec::len)
    }

    /// True when the path is missing, null, a blank string, or an empty
    /// array. Used by `Required`-style checks.
    pub fn is_blank(&self, path: &str) -> bool {
        match self.get(path) {
            None | Some(Value::Null) => true,
            Some(Value::String(text)) => text.trim().is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new(Value::Object(Default::default()))
    }
}

/// Walk a dot-path through objects and arrays.
pub(crate) fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.split('.') {
        node = match node {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}
