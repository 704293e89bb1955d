//! Chart values with dotted-path access and override merging

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use std::path::Path;
use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::normalize::normalize;

/// A values mapping
pub type ValueMap = Map<String, JsonValue>;

/// Mutable values builder
///
/// Used while composing a request. Once finalized with [`Values::immutable`]
/// the snapshot can no longer change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(ValueMap);

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap an existing mapping
    pub fn from_map(map: ValueMap) -> Self {
        Self(map)
    }

    /// Parse values from a YAML document
    ///
    /// An empty document yields empty values.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Self::from_json_value(value)
    }

    /// Load values from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Normalize a serializable value into values
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Self::from_json_value(normalize(value)?)
    }

    fn from_json_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Null => Ok(Self::new()),
            JsonValue::Object(map) => Ok(Self(map)),
            other => Err(CoreError::Values {
                message: format!("values must be a mapping, got {}", type_name(&other)),
            }),
        }
    }

    /// Set a value at a dotted path, creating intermediate mappings
    ///
    /// The value is normalized first, so structs are stored as plain mappings.
    pub fn set<T: Serialize + ?Sized>(&mut self, path: &str, value: &T) -> Result<&mut Self> {
        let keys = split_path(path)?;
        let value = normalize(value)?;
        set_nested(&mut self.0, &keys, value);
        Ok(self)
    }

    /// Get the value at a dotted path
    ///
    /// A path that cannot be parsed names no value.
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let keys = split_path(path).ok()?;
        get_nested(&self.0, &keys)
    }

    /// Merge `other` into these values in place
    ///
    /// `other` wins at every leaf. Mappings present on both sides are merged
    /// recursively; anything else (scalars, sequences) is replaced.
    pub fn merge(&mut self, other: &Values) {
        merge_maps(&mut self.0, &other.0);
    }

    /// Consume these values and return them overridden by `other`
    pub fn override_with(mut self, other: &Values) -> Values {
        self.merge(other);
        self
    }

    /// Snapshot the current values
    pub fn immutable(&self) -> ImmutableValues {
        ImmutableValues(Arc::new(self.0.clone()))
    }

    /// Turn these values into a snapshot without copying
    pub fn into_immutable(self) -> ImmutableValues {
        ImmutableValues(Arc::new(self.0))
    }

    /// Borrow the underlying mapping
    pub fn as_map(&self) -> &ValueMap {
        &self.0
    }

    /// Take the underlying mapping
    pub fn into_map(self) -> ValueMap {
        self.0
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.0)?)
    }
}

impl From<ValueMap> for Values {
    fn from(map: ValueMap) -> Self {
        Self(map)
    }
}

/// Immutable values snapshot
///
/// Cheap to clone. Every accessor returns a copy so the snapshot itself can
/// never be modified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImmutableValues(Arc<ValueMap>);

impl ImmutableValues {
    /// An empty snapshot
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get a copy of the value at a dotted path
    pub fn get(&self, path: &str) -> Option<JsonValue> {
        let keys = split_path(path).ok()?;
        get_nested(&self.0, &keys).cloned()
    }

    /// Get a copy of the full mapping
    pub fn values(&self) -> ValueMap {
        self.0.as_ref().clone()
    }

    /// A mutable copy of this snapshot
    pub fn to_values(&self) -> Values {
        Values(self.values())
    }

    /// A new snapshot of these values overridden by `other`
    pub fn override_with(&self, other: &ImmutableValues) -> ImmutableValues {
        let mut merged = self.values();
        merge_maps(&mut merged, &other.0);
        ImmutableValues(Arc::new(merged))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ImmutableValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.as_ref().serialize(serializer)
    }
}

impl From<Values> for ImmutableValues {
    fn from(values: Values) -> Self {
        values.into_immutable()
    }
}

fn merge_maps(base: &mut ValueMap, other: &ValueMap) {
    for (key, other_value) in other {
        match (base.get_mut(key), other_value) {
            (Some(JsonValue::Object(base_map)), JsonValue::Object(other_map)) => {
                merge_maps(base_map, other_map);
            }
            _ => {
                base.insert(key.clone(), other_value.clone());
            }
        }
    }
}

fn set_nested(map: &mut ValueMap, keys: &[String], value: JsonValue) {
    let Some((last, parents)) = keys.split_last() else {
        return;
    };

    let mut current = map;
    for key in parents {
        let entry = current
            .entry(key.clone())
            .or_insert_with(|| JsonValue::Object(Map::new()));
        if !entry.is_object() {
            *entry = JsonValue::Object(Map::new());
        }
        current = match entry {
            JsonValue::Object(next) => next,
            _ => return,
        };
    }
    current.insert(last.clone(), value);
}

fn get_nested<'a>(map: &'a ValueMap, keys: &[String]) -> Option<&'a JsonValue> {
    let (first, rest) = keys.split_first()?;
    let mut current = map.get(first)?;
    for key in rest {
        current = current.as_object()?.get(key)?;
    }
    Some(current)
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a sequence",
        JsonValue::Object(_) => "a mapping",
    }
}

/// Split a dotted values path into keys
///
/// A key may be wrapped in double quotes to contain dots (`a."b.c"`); inside
/// quotes a doubled quote stands for a literal one. Quotes are not allowed
/// in unquoted keys.
pub fn split_path(path: &str) -> Result<Vec<String>> {
    let invalid = |message: &str| CoreError::InvalidPath {
        path: path.to_string(),
        message: message.to_string(),
    };

    if path.is_empty() {
        return Err(invalid("path is empty"));
    }

    let mut keys = Vec::new();
    let mut chars = path.chars().peekable();

    loop {
        let mut key = String::new();

        if chars.peek() == Some(&'"') {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        key.push('"');
                    }
                    Some('"') => break,
                    Some(c) => key.push(c),
                    None => return Err(invalid("unterminated quoted key")),
                }
            }
            match chars.next() {
                None => {
                    keys.push(key);
                    return Ok(keys);
                }
                Some('.') => keys.push(key),
                Some(_) => return Err(invalid("unexpected character after quoted key")),
            }
        } else {
            loop {
                match chars.next() {
                    None => {
                        keys.push(key);
                        return Ok(keys);
                    }
                    Some('.') => {
                        keys.push(key);
                        break;
                    }
                    Some('"') => return Err(invalid("bare quote in unquoted key")),
                    Some(c) => key.push(c),
                }
            }
        }
    }
}

/// Parse a single `path=value` assignment
///
/// The value is read as YAML so `3`, `true` and `[a, b]` keep their types.
pub fn parse_set_value(assignment: &str) -> Result<(String, JsonValue)> {
    let (path, raw) = assignment
        .split_once('=')
        .ok_or_else(|| CoreError::Values {
            message: format!("invalid assignment '{}', expected path=value", assignment),
        })?;
    split_path(path)?;

    let value = if raw.is_empty() {
        JsonValue::String(String::new())
    } else {
        serde_yaml::from_str::<JsonValue>(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
    };
    Ok((path.to_string(), value))
}
