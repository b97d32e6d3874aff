//! The procedure table
//!
//! An ordered, append-only registration table mapping method names to
//! [`Procedure`]s. Lookups are linear scans - fine at the handful-of-methods
//! scale an RPC server registers - with two deliberate asymmetries, both
//! pinned by tests:
//!
//! - **Lookup scans newest-first**, so registering a name twice shadows the
//!   older entry.
//! - **Deregistration removes the oldest matching entry**, compacting the
//!   table; deregistering a shadowed name therefore exposes nothing new
//!   until the newer entry is also removed.
//!
//! Name matching on dispatch is exact and case-sensitive, unlike document
//! member lookup.

use crate::procedure::Procedure;
use std::any::Any;
use std::sync::Arc;

struct ProcedureEntry {
    name: String,
    procedure: Arc<dyn Procedure>,
    data: Option<Arc<dyn Any + Send + Sync>>,
}

/// Ordered registration table for RPC methods.
#[derive(Default)]
pub struct ProcedureTable {
    entries: Vec<ProcedureEntry>,
}

impl ProcedureTable {
    /// Create an empty table.
    pub fn new() -> ProcedureTable {
        ProcedureTable::default()
    }

    /// Append a procedure under `name`.
    pub fn register(&mut self, name: impl Into<String>, procedure: Box<dyn Procedure>) {
        self.entries.push(ProcedureEntry {
            name: name.into(),
            procedure: Arc::from(procedure),
            data: None,
        });
    }

    /// Append a procedure along with an opaque data pointer that each
    /// invocation receives through its [`CallContext`](crate::CallContext).
    pub fn register_with_data(
        &mut self,
        name: impl Into<String>,
        procedure: Box<dyn Procedure>,
        data: Arc<dyn Any + Send + Sync>,
    ) {
        self.entries.push(ProcedureEntry {
            name: name.into(),
            procedure: Arc::from(procedure),
            data: Some(data),
        });
    }

    /// Remove the oldest entry registered under `name`, compacting the
    /// table. Returns whether an entry was removed.
    pub fn deregister(&mut self, name: &str) -> bool {
        match self.entries.iter().position(|e| e.name == name) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Find the procedure for `name`, scanning newest-first.
    pub fn lookup(
        &self,
        name: &str,
    ) -> Option<(Arc<dyn Procedure>, Option<Arc<dyn Any + Send + Sync>>)> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.name == name)
            .map(|e| (Arc::clone(&e.procedure), e.data.clone()))
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered method names in registration order.
    pub fn methods(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedure::from_fn;
    use jrot_core::Value;

    fn constant(n: i64) -> Box<dyn Procedure> {
        from_fn(move |_ctx, _params, _id| async move { Some(Value::from(n)) })
    }

    async fn invoke(table: &ProcedureTable, name: &str) -> Option<Value> {
        let (procedure, data) = table.lookup(name)?;
        let ctx = crate::procedure::CallContext::new(0, data);
        procedure.call(ctx, None, None).await
    }

    #[test]
    fn test_register_and_lookup() {
        let mut table = ProcedureTable::new();
        assert!(table.is_empty());
        table.register("a", constant(1));
        table.register("b", constant(2));
        assert_eq!(table.len(), 2);
        assert!(table.lookup("a").is_some());
        assert!(table.lookup("missing").is_none());
        assert_eq!(table.methods(), ["a", "b"]);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let mut table = ProcedureTable::new();
        table.register("sayHello", constant(1));
        assert!(table.lookup("sayHello").is_some());
        assert!(table.lookup("sayhello").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_registration_shadows_older_entry() {
        let mut table = ProcedureTable::new();
        table.register("m", constant(1));
        table.register("m", constant(2));
        assert_eq!(invoke(&table, "m").await, Some(Value::from(2)));

        // Deregistration removes the oldest entry first; the newer one
        // keeps serving.
        assert!(table.deregister("m"));
        assert_eq!(invoke(&table, "m").await, Some(Value::from(2)));
        assert!(table.deregister("m"));
        assert!(table.lookup("m").is_none());
    }

    #[test]
    fn test_deregister_compacts_in_order() {
        let mut table = ProcedureTable::new();
        table.register("a", constant(1));
        table.register("b", constant(2));
        table.register("c", constant(3));
        assert!(table.deregister("b"));
        assert_eq!(table.methods(), ["a", "c"]);
        assert!(!table.deregister("b"));
    }
}
