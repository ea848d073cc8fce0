//! Dynamic values that the inspector can walk.
//!
//! Containers are reference counted and interior mutable, so a [`Dynamic`]
//! graph can share sub-values and even contain itself, which an owned tree
//! cannot.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

/// Shared, lockable container storage.
pub type Shared<T> = Arc<RwLock<T>>;

/// An arbitrary value graph.
#[derive(Debug, Clone, Default)]
pub enum Dynamic {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Shared<Vec<Dynamic>>),
    Map(Shared<Vec<(String, Dynamic)>>),
    /// A value with no dynamic representation, named by its type.
    Opaque(&'static str),
}

impl Dynamic {
    /// Empty list container.
    pub fn list() -> Self {
        Self::List(Arc::new(RwLock::new(Vec::new())))
    }

    /// Empty map container.
    pub fn map() -> Self {
        Self::Map(Arc::new(RwLock::new(Vec::new())))
    }

    /// Placeholder for a value of type `T`.
    pub fn opaque<T: ?Sized>() -> Self {
        Self::Opaque(std::any::type_name::<T>())
    }

    /// Append to a list. Returns `false` if `self` is not a list.
    pub fn push(&self, value: impl Into<Dynamic>) -> bool {
        match self {
            Self::List(items) => {
                items.write().push(value.into());
                true
            }
            _ => false,
        }
    }

    /// Insert or replace a map entry. Returns `false` if `self` is not a map.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Dynamic>) -> bool {
        let Self::Map(entries) = self else {
            return false;
        };
        let key = key.into();
        let value = value.into();
        let mut entries = entries.write();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => entries.push((key, value)),
        }
        true
    }

    /// Remove every element of a container.
    ///
    /// Reference cycles keep their containers alive; clearing one member of
    /// the cycle releases it.
    pub fn clear(&self) {
        match self {
            Self::List(items) => items.write().clear(),
            Self::Map(entries) => entries.write().clear(),
            _ => {}
        }
    }

    /// Address of the container allocation, if this is a container.
    pub(crate) fn identity(&self) -> Option<usize> {
        match self {
            Self::List(items) => Some(Arc::as_ptr(items) as *const () as usize),
            Self::Map(entries) => Some(Arc::as_ptr(entries) as *const () as usize),
            _ => None,
        }
    }

    /// Build from any serde value; unrepresentable values become
    /// [`Dynamic::Opaque`].
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(json) => Self::from(json),
            Err(_) => Self::opaque::<T>(),
        }
    }
}

impl From<serde_json::Value> for Dynamic {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::Str(s),
            Value::Array(items) => Self::List(Arc::new(RwLock::new(
                items.into_iter().map(Self::from).collect(),
            ))),
            Value::Object(entries) => Self::Map(Arc::new(RwLock::new(
                entries.into_iter().map(|(k, v)| (k, Self::from(v))).collect(),
            ))),
        }
    }
}

impl From<bool> for Dynamic {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Dynamic {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Dynamic {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for Dynamic {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Dynamic {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Dynamic {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl<T: Into<Dynamic>> From<Option<T>> for Dynamic {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_existing_key() {
        let map = Dynamic::map();
        assert!(map.insert("a", 1));
        assert!(map.insert("a", 2));
        let Dynamic::Map(entries) = &map else {
            unreachable!()
        };
        assert_eq!(entries.read().len(), 1);
        assert!(matches!(entries.read()[0].1, Dynamic::Int(2)));
    }

    #[test]
    fn scalars_are_not_containers() {
        let value = Dynamic::from(3.5);
        assert!(!value.push(1));
        assert!(!value.insert("k", 1));
        assert!(value.identity().is_none());
    }

    #[test]
    fn clones_share_identity() {
        let list = Dynamic::list();
        let alias = list.clone();
        assert_eq!(list.identity(), alias.identity());
        assert_ne!(list.identity(), Dynamic::list().identity());
    }

    #[test]
    fn from_serialize_maps_json_shapes() {
        #[derive(Serialize)]
        struct Sample {
            name: &'static str,
            values: Vec<u8>,
        }
        let value = Dynamic::from_serialize(&Sample {
            name: "x",
            values: vec![1, 2],
        });
        let Dynamic::Map(entries) = value else {
            panic!("expected map");
        };
        let entries = entries.read();
        assert_eq!(entries[0].0, "name");
        assert!(matches!(&entries[1].1, Dynamic::List(items) if items.read().len() == 2));
    }

    #[test]
    fn unserializable_values_become_opaque() {
        let mut map = std::collections::HashMap::new();
        map.insert((1, 2), "tuple keys are not valid JSON object keys");
        assert!(matches!(Dynamic::from_serialize(&map), Dynamic::Opaque(name) if name.contains("HashMap")));
    }
}
