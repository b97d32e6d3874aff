//! The JSON document model
//!
//! This module defines [`Value`], the single recursive type every other part
//! of jrot works with: the parser produces it, the printer consumes it, and
//! RPC procedures receive and return it.
//!
//! # Structure
//!
//! A value is one of the seven JSON-relevant kinds: null, boolean, number,
//! string, array, object - plus [`Value::Shared`], a non-owning attachment of
//! a subtree that lives in another document (see below). Arrays hold an
//! ordered sequence of child values; objects hold an ordered sequence of
//! [`Member`]s (key plus value). Order is insertion order and is significant:
//! it drives positional indexing, iteration, and printing.
//!
//! # Shared subtrees
//!
//! Sometimes a document needs to include a subtree that belongs to another
//! document that must remain valid afterwards. Instead of deep-copying, the
//! subtree is placed behind an `Arc` and attached with
//! [`Value::push_shared`] / [`Value::insert_shared`]. Dropping the borrowing
//! document only decrements the reference count; it never frees the target's
//! children. All read accessors resolve through `Shared` transparently, so a
//! shared node compares, prints, and indexes exactly like the value it
//! points at. The parser never produces `Shared` nodes - reparsing printed
//! output yields plainly owned values.
//!
//! # Lookup costs
//!
//! Child lookup by index and by key are linear scans. Key lookup is
//! case-insensitive and returns the first match. At RPC-message scale this
//! is the intended trade-off.
//!
//! # Examples
//!
//! ```rust
//! use jrot_core::Value;
//!
//! let mut doc = Value::object();
//! doc.insert("method", "echo");
//! doc.insert("params", Value::from_iter([Value::from(1), Value::from(2)]));
//!
//! assert_eq!(doc.member("METHOD").and_then(Value::as_str), Some("echo"));
//! assert_eq!(doc.member("params").map(Value::len), Some(2));
//! ```

use std::fmt;
use std::sync::Arc;

/// A keyed entry in a JSON object.
///
/// The key is stored alongside the value rather than inside it, so a value
/// can be detached from an object and re-attached elsewhere without dragging
/// its old name along.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Member name as it appeared in the document.
    pub key: String,
    /// The member's value.
    pub value: Value,
}

/// A JSON value.
///
/// See the [module documentation](self) for the overall model. The
/// [`Shared`](Value::Shared) variant is the only non-obvious one: it holds a
/// reference-counted handle to a value owned elsewhere, letting two documents
/// contain the same subtree without copying it.
#[derive(Debug, Clone)]
pub enum Value {
    /// JSON `null`.
    Null,
    /// JSON `true` / `false`.
    Bool(bool),
    /// A JSON number, stored as a 64-bit float. The truncated integer alias
    /// is available through [`Value::as_i64`].
    Number(f64),
    /// A JSON string (already unescaped).
    String(String),
    /// An ordered sequence of values.
    Array(Vec<Value>),
    /// An ordered sequence of keyed members.
    Object(Vec<Member>),
    /// A non-owning attachment of a value that lives in another document.
    Shared(Arc<Value>),
}

impl Value {
    /// Create an empty array.
    pub fn array() -> Value {
        Value::Array(Vec::new())
    }

    /// Create an empty object.
    pub fn object() -> Value {
        Value::Object(Vec::new())
    }

    /// Follow `Shared` indirections to the underlying value.
    ///
    /// Every read accessor below calls this first, so callers rarely need it
    /// directly; it is public for code that matches on the enum itself.
    pub fn resolve(&self) -> &Value {
        let mut v = self;
        while let Value::Shared(inner) = v {
            v = inner;
        }
        v
    }

    /// True for JSON `null`.
    pub fn is_null(&self) -> bool {
        matches!(self.resolve(), Value::Null)
    }

    /// True for JSON booleans.
    pub fn is_bool(&self) -> bool {
        matches!(self.resolve(), Value::Bool(_))
    }

    /// True for JSON numbers.
    pub fn is_number(&self) -> bool {
        matches!(self.resolve(), Value::Number(_))
    }

    /// True for JSON strings.
    pub fn is_string(&self) -> bool {
        matches!(self.resolve(), Value::String(_))
    }

    /// True for JSON arrays.
    pub fn is_array(&self) -> bool {
        matches!(self.resolve(), Value::Array(_))
    }

    /// True for JSON objects.
    pub fn is_object(&self) -> bool {
        matches!(self.resolve(), Value::Object(_))
    }

    /// The boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self.resolve() {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The numeric payload, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self.resolve() {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The truncated integer alias of a number.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_f64().map(|n| n as i64)
    }

    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self.resolve() {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The children of an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self.resolve() {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The members of an object.
    pub fn as_object(&self) -> Option<&[Member]> {
        match self.resolve() {
            Value::Object(members) => Some(members),
            _ => None,
        }
    }

    /// Number of children of an array or object; 0 for scalar kinds.
    pub fn len(&self) -> usize {
        match self.resolve() {
            Value::Array(items) => items.len(),
            Value::Object(members) => members.len(),
            _ => 0,
        }
    }

    /// True when an array or object has no children, and for scalar kinds.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Positional child lookup, counting object members in insertion order.
    pub fn get(&self, index: usize) -> Option<&Value> {
        match self.resolve() {
            Value::Array(items) => items.get(index),
            Value::Object(members) => members.get(index).map(|m| &m.value),
            _ => None,
        }
    }

    /// Case-insensitive key lookup; first match wins.
    pub fn member(&self, key: &str) -> Option<&Value> {
        match self.resolve() {
            Value::Object(members) => members
                .iter()
                .find(|m| m.key.eq_ignore_ascii_case(key))
                .map(|m| &m.value),
            _ => None,
        }
    }

    /// Append a value to an array. A no-op on any other kind.
    pub fn push(&mut self, item: impl Into<Value>) {
        if let Value::Array(items) = self {
            items.push(item.into());
        }
    }

    /// Append a keyed member to an object. A no-op on any other kind.
    ///
    /// Duplicate keys are appended as-is; [`Value::member`] will keep
    /// returning the earlier entry.
    pub fn insert(&mut self, key: impl Into<String>, item: impl Into<Value>) {
        if let Value::Object(members) = self {
            members.push(Member {
                key: key.into(),
                value: item.into(),
            });
        }
    }

    /// Attach a subtree owned by another document to an array.
    ///
    /// The target is not copied; both documents refer to the same data until
    /// the last handle is dropped.
    pub fn push_shared(&mut self, item: Arc<Value>) {
        self.push(Value::Shared(item));
    }

    /// Attach a subtree owned by another document to an object under `key`.
    pub fn insert_shared(&mut self, key: impl Into<String>, item: Arc<Value>) {
        self.insert(key, Value::Shared(item));
    }

    /// Unlink and return the child at `index`, shifting later siblings down.
    pub fn detach(&mut self, index: usize) -> Option<Value> {
        match self {
            Value::Array(items) if index < items.len() => Some(items.remove(index)),
            Value::Object(members) if index < members.len() => {
                Some(members.remove(index).value)
            }
            _ => None,
        }
    }

    /// Unlink and return the first member matching `key` (case-insensitive).
    pub fn detach_member(&mut self, key: &str) -> Option<Value> {
        if let Value::Object(members) = self {
            let index = members.iter().position(|m| m.key.eq_ignore_ascii_case(key))?;
            return Some(members.remove(index).value);
        }
        None
    }

    /// Remove and drop the child at `index`.
    pub fn remove(&mut self, index: usize) {
        self.detach(index);
    }

    /// Remove and drop the first member matching `key`.
    pub fn remove_member(&mut self, key: &str) {
        self.detach_member(key);
    }

    /// Substitute the child at `index` in place, returning the old child.
    ///
    /// Sibling order is preserved; for objects the slot keeps its position
    /// but takes no new key (use [`Value::replace_member`] for that).
    pub fn replace(&mut self, index: usize, new_item: impl Into<Value>) -> Option<Value> {
        match self {
            Value::Array(items) if index < items.len() => {
                Some(std::mem::replace(&mut items[index], new_item.into()))
            }
            Value::Object(members) if index < members.len() => Some(std::mem::replace(
                &mut members[index].value,
                new_item.into(),
            )),
            _ => None,
        }
    }

    /// Substitute the first member matching `key` in place, returning the
    /// old value. The member takes `key` as its name, exactly as given.
    pub fn replace_member(
        &mut self,
        key: &str,
        new_item: impl Into<Value>,
    ) -> Option<Value> {
        if let Value::Object(members) = self {
            let index = members.iter().position(|m| m.key.eq_ignore_ascii_case(key))?;
            members[index].key = key.to_string();
            return Some(std::mem::replace(&mut members[index].value, new_item.into()));
        }
        None
    }
}

/// Structural equality: same kinds, values, child order, and keys.
///
/// `Shared` nodes compare as the value they point at, so a document that
/// borrows a subtree is equal to one that owns a copy of it. Keys compare
/// exactly (lookup is case-insensitive, equality is not).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self.resolve(), other.resolve()) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    /// Renders the compact printed form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::printer::print_compact(self))
    }
}

// Conversions so containers can be populated without spelling out variants.

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Value {
        Value::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Value {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Value {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Value {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Value {
        Value::Array(items)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Value {
        Value::Array(iter.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Value {
        Value::Object(
            iter.into_iter()
                .map(|(k, v)| Member {
                    key: k.into(),
                    value: v.into(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_and_kinds() {
        assert!(Value::Null.is_null());
        assert!(Value::from(true).is_bool());
        assert!(Value::from(3.5).is_number());
        assert!(Value::from("hi").is_string());
        assert!(Value::array().is_array());
        assert!(Value::object().is_object());
    }

    #[test]
    fn test_number_alias_truncates() {
        assert_eq!(Value::from(3.9).as_i64(), Some(3));
        assert_eq!(Value::from(-3.9).as_i64(), Some(-3));
        assert_eq!(Value::from(7).as_f64(), Some(7.0));
    }

    #[test]
    fn test_member_lookup_is_case_insensitive() {
        let mut doc = Value::object();
        doc.insert("Method", "echo");
        assert_eq!(doc.member("method").and_then(Value::as_str), Some("echo"));
        assert_eq!(doc.member("METHOD").and_then(Value::as_str), Some("echo"));
        assert!(doc.member("params").is_none());
    }

    #[test]
    fn test_duplicate_keys_first_wins() {
        let mut doc = Value::object();
        doc.insert("k", 1);
        doc.insert("k", 2);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.member("k").and_then(Value::as_i64), Some(1));
    }

    #[test]
    fn test_push_preserves_order() {
        let mut arr = Value::array();
        for i in 0..5 {
            arr.push(i);
        }
        for i in 0..5 {
            assert_eq!(arr.get(i).and_then(Value::as_i64), Some(i as i64));
        }
    }

    #[test]
    fn test_mutators_ignore_scalar_targets() {
        let mut v = Value::from(1);
        v.push(2);
        v.insert("k", 3);
        assert_eq!(v, Value::from(1));
    }

    #[test]
    fn test_detach_relinks_siblings() {
        let mut arr: Value = (0..4).map(Value::from).collect();
        let taken = arr.detach(1);
        assert_eq!(taken, Some(Value::from(1)));
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.get(1).and_then(Value::as_i64), Some(2));
    }

    #[test]
    fn test_detach_member_by_key() {
        let mut doc: Value = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        let taken = doc.detach_member("B");
        assert_eq!(taken, Some(Value::from(2)));
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get(1).and_then(Value::as_i64), Some(3));
        assert!(doc.detach_member("missing").is_none());
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut arr: Value = (0..3).map(Value::from).collect();
        let old = arr.replace(1, "mid");
        assert_eq!(old, Some(Value::from(1)));
        assert_eq!(arr.get(1).and_then(Value::as_str), Some("mid"));
        assert_eq!(arr.len(), 3);
    }

    #[test]
    fn test_replace_member_takes_given_key() {
        let mut doc: Value = [("Alpha", 1)].into_iter().collect();
        let old = doc.replace_member("alpha", 9);
        assert_eq!(old, Some(Value::from(1)));
        let members = doc.as_object().unwrap();
        assert_eq!(members[0].key, "alpha");
        assert_eq!(members[0].value, Value::from(9));
    }

    #[test]
    fn test_shared_attachment_does_not_copy() {
        let subtree = Arc::new((0..3).map(Value::from).collect::<Value>());

        let mut doc_a = Value::object();
        doc_a.insert_shared("data", Arc::clone(&subtree));
        let mut doc_b = Value::array();
        doc_b.push_shared(Arc::clone(&subtree));

        // Both documents see the same data.
        assert_eq!(doc_a.member("data").map(Value::len), Some(3));
        assert_eq!(doc_b.get(0).map(Value::len), Some(3));
        assert_eq!(Arc::strong_count(&subtree), 3);

        // Dropping a borrowing document releases only its handle.
        drop(doc_a);
        assert_eq!(Arc::strong_count(&subtree), 2);
        assert_eq!(doc_b.get(0).and_then(|v| v.get(2)).and_then(Value::as_i64), Some(2));
    }

    #[test]
    fn test_shared_compares_as_target() {
        let owned: Value = (0..3).map(Value::from).collect();
        let shared = Value::Shared(Arc::new(owned.clone()));
        assert_eq!(shared, owned);
        assert_eq!(shared.get(1), owned.get(1));
    }

    #[test]
    fn test_structural_equality() {
        let a: Value = [("x", Value::from(1)), ("y", Value::from("s"))]
            .into_iter()
            .collect();
        let b: Value = [("x", Value::from(1)), ("y", Value::from("s"))]
            .into_iter()
            .collect();
        let reordered: Value = [("y", Value::from("s")), ("x", Value::from(1))]
            .into_iter()
            .collect();
        assert_eq!(a, b);
        assert_ne!(a, reordered);
    }
}
