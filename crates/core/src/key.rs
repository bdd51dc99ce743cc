//! Entity keys: explicit "assigned or not" identity values.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Bound for the value types an entity key can carry.
///
/// `is_unset` reports the type's "absent" value (empty string, zero, nil UUID).
/// Such values are never stored as identities; the repository generates a key
/// in their place.
pub trait KeyValue:
    Clone + Eq + Ord + core::hash::Hash + core::fmt::Debug + Send + Sync + 'static
{
    fn is_unset(&self) -> bool {
        false
    }
}

/// Identity of an aggregate entity.
///
/// `Unassigned` orders before every assigned value, so a key-ascending scan
/// puts not-yet-persisted entities first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Key<T> {
    #[default]
    Unassigned,
    Assigned(T),
}

impl<T: KeyValue> Key<T> {
    pub fn new(value: T) -> Self {
        Key::Assigned(value).normalized()
    }

    /// Folds assigned-but-unset values (e.g. `Assigned("")`) into `Unassigned`.
    pub fn normalized(self) -> Self {
        match self {
            Key::Assigned(v) if v.is_unset() => Key::Unassigned,
            other => other,
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, Key::Assigned(v) if !v.is_unset())
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Key::Assigned(v) if !v.is_unset() => Some(v),
            _ => None,
        }
    }

    /// True when this key carries exactly `value`.
    pub fn matches(&self, value: &T) -> bool {
        self.value() == Some(value)
    }
}

impl<T> From<Option<T>> for Key<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Key::Assigned(v),
            None => Key::Unassigned,
        }
    }
}

impl<T> From<Key<T>> for Option<T> {
    fn from(value: Key<T>) -> Self {
        match value {
            Key::Assigned(v) => Some(v),
            Key::Unassigned => None,
        }
    }
}

// Serialized as an optional value: `null` when unassigned.
impl<T: Serialize> Serialize for Key<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Key::Assigned(v) => serializer.serialize_some(v),
            Key::Unassigned => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Key<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Key::from)
    }
}

impl<T: core::fmt::Display> core::fmt::Display for Key<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Key::Assigned(v) => core::fmt::Display::fmt(v, f),
            Key::Unassigned => f.write_str("<unassigned>"),
        }
    }
}

impl KeyValue for String {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

impl KeyValue for Uuid {
    fn is_unset(&self) -> bool {
        self.is_nil()
    }
}

macro_rules! impl_integer_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl KeyValue for $t {
                fn is_unset(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

impl_integer_key!(i16, i32, i64, u16, u32, u64, usize);
