//! Wrapping raw JSON into typed instances and collections.
//!
//! # Design
//! `wrap_one` and `wrap_many` are plain single-argument functions so they
//! compose directly as the terminal step of a response pipeline: parse the
//! body, hand the `Value` to the wrapper, deliver the result. An `Instance`
//! carries exactly the top-level keys of the server's JSON object as
//! attributes; a `Collection` preserves server order. Neither function has
//! side effects beyond construction.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{json_type, ModelError};

/// Typed in-memory representation of one server-side record.
///
/// Attributes are exactly the keys of the JSON object the instance was
/// wrapped from, plus anything merged in from later create/update
/// responses. The destroyed flag tracks lifecycle, not data: once an
/// instance has been destroyed on the server, further operations through
/// it fail with `ModelError::Destroyed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instance {
    #[serde(flatten)]
    attributes: Map<String, Value>,
    #[serde(skip)]
    destroyed: bool,
}

impl Instance {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Instance {
            attributes,
            destroyed: false,
        }
    }

    /// The `id` attribute, if the server supplied one.
    pub fn id(&self) -> Option<&Value> {
        self.attributes.get("id")
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Back to raw JSON. Wrapping the result again yields a value-equal
    /// instance, which is what makes wrapping safe to compose into
    /// pipelines that may already carry wrapped data.
    pub fn into_value(self) -> Value {
        Value::Object(self.attributes)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }

    /// Merge server-returned fields over the current attributes. Fields the
    /// server echoes back win; fields it omits are kept as-is.
    pub(crate) fn merge(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            self.attributes.insert(key, value);
        }
    }

    pub(crate) fn guard_live(&self) -> Result<(), ModelError> {
        if self.destroyed {
            Err(ModelError::Destroyed)
        } else {
            Ok(())
        }
    }
}

/// Ordered sequence of instances from a list response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Collection(Vec<Instance>);

impl Collection {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Instance> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instance> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Instance> {
        self.0
    }
}

impl std::ops::Index<usize> for Collection {
    type Output = Instance;

    fn index(&self, index: usize) -> &Instance {
        &self.0[index]
    }
}

impl IntoIterator for Collection {
    type Item = Instance;
    type IntoIter = std::vec::IntoIter<Instance>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Instance;
    type IntoIter = std::slice::Iter<'a, Instance>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Wrap a single JSON object into an `Instance`.
///
/// Anything other than an object is a `TypeMismatch`.
pub fn wrap_one(json: Value) -> Result<Instance, ModelError> {
    match json {
        Value::Object(attributes) => Ok(Instance::new(attributes)),
        other => Err(ModelError::TypeMismatch {
            expected: "object",
            found: json_type(&other),
        }),
    }
}

/// Wrap a JSON array into a `Collection`, element by element, order
/// preserved. An empty array wraps to an empty collection, never an error;
/// a non-array is a `TypeMismatch`.
pub fn wrap_many(json: Value) -> Result<Collection, ModelError> {
    match json {
        Value::Array(items) => items
            .into_iter()
            .map(wrap_one)
            .collect::<Result<Vec<_>, _>>()
            .map(Collection),
        other => Err(ModelError::TypeMismatch {
            expected: "array",
            found: json_type(&other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrap_one_carries_all_top_level_keys() {
        let instance =
            wrap_one(json!({"id": 1, "name": "Justin Meyer", "birthday": "1982-10-20"})).unwrap();
        assert_eq!(instance.id(), Some(&json!(1)));
        assert_eq!(instance.get("name"), Some(&json!("Justin Meyer")));
        assert_eq!(instance.get("birthday"), Some(&json!("1982-10-20")));
        assert_eq!(instance.attributes().len(), 3);
    }

    #[test]
    fn wrap_one_rejects_non_objects() {
        let err = wrap_one(json!([1, 2])).unwrap_err();
        assert!(matches!(
            err,
            ModelError::TypeMismatch {
                expected: "object",
                found: "array"
            }
        ));
    }

    #[test]
    fn wrap_one_is_idempotent_through_the_value_round_trip() {
        let json = json!({"id": 2, "name": "Brian Moschel"});
        let once = wrap_one(json.clone()).unwrap();
        let twice = wrap_one(once.clone().into_value()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn wrap_many_of_empty_array_is_an_empty_collection() {
        let collection = wrap_many(json!([])).unwrap();
        assert!(collection.is_empty());
        assert_eq!(collection.len(), 0);
    }

    #[test]
    fn wrap_many_preserves_length_order_and_attributes() {
        let json = json!([
            {"id": 1, "name": "Justin Meyer"},
            {"id": 2, "name": "Brian Moschel"}
        ]);
        let collection = wrap_many(json.clone()).unwrap();
        assert_eq!(collection.len(), 2);
        for (i, element) in json.as_array().unwrap().iter().enumerate() {
            assert_eq!(
                Value::Object(collection[i].attributes().clone()),
                *element,
                "element {i}"
            );
        }
    }

    #[test]
    fn wrap_many_rejects_non_arrays() {
        let err = wrap_many(json!({"id": 1})).unwrap_err();
        assert!(matches!(
            err,
            ModelError::TypeMismatch {
                expected: "array",
                found: "object"
            }
        ));
    }

    #[test]
    fn wrap_many_fails_whole_if_any_element_is_not_an_object() {
        let err = wrap_many(json!([{"id": 1}, 7])).unwrap_err();
        assert!(matches!(err, ModelError::TypeMismatch { .. }));
    }

    #[test]
    fn merge_overwrites_and_inserts() {
        let mut instance = wrap_one(json!({"name": "x"})).unwrap();
        instance.merge(
            json!({"id": 5, "name": "y"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert_eq!(instance.id(), Some(&json!(5)));
        assert_eq!(instance.get("name"), Some(&json!("y")));
    }

    #[test]
    fn instance_serializes_as_its_attributes() {
        let instance = wrap_one(json!({"id": 1, "name": "x"})).unwrap();
        let value = serde_json::to_value(&instance).unwrap();
        assert_eq!(value, json!({"id": 1, "name": "x"}));
    }

    #[test]
    fn collection_iterates_in_order() {
        let collection = wrap_many(json!([{"id": 1}, {"id": 2}, {"id": 3}])).unwrap();
        let ids: Vec<i64> = collection
            .iter()
            .map(|i| i.id().unwrap().as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
