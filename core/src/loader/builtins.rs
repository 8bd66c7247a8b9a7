//! Built-in module table
//!
//! Reserved import names that resolve to host objects. Lookup happens before
//! any path resolution, so a builtin never creates a unit, never suspends
//! the importer and never touches the filesystem or the working directory.

use crate::executor::stdlib::{assert, immutable};
use crate::executor::Val;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct BuiltinTable {
    modules: HashMap<String, Val>,
}

impl BuiltinTable {
    /// The standard table: `assert` and `immutable`
    pub fn new() -> Self {
        let mut modules = HashMap::new();
        modules.insert("assert".to_string(), assert::module());
        modules.insert("immutable".to_string(), immutable::module());
        Self { modules }
    }

    /// A table with no builtins at all
    pub fn empty() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Add or replace a builtin
    pub fn register(&mut self, name: impl Into<String>, value: Val) {
        self.modules.insert(name.into(), value);
    }

    pub fn resolve(&self, name: &str) -> Option<Val> {
        self.modules.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }
}

impl Default for BuiltinTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::NativeFunc;

    #[test]
    fn test_standard_builtins() {
        let table = BuiltinTable::new();
        let Some(Val::Obj(assert)) = table.resolve("assert") else {
            panic!("assert should be an object");
        };
        assert_eq!(
            assert.get("strictEqual"),
            Some(&Val::NativeFunc(NativeFunc::AssertStrictEqual))
        );
        assert!(table.contains("immutable"));
        assert!(table.resolve("./assert").is_none());
    }

    #[test]
    fn test_register() {
        let mut table = BuiltinTable::empty();
        assert!(table.resolve("assert").is_none());
        table.register("answer", Val::Num(42.0));
        assert_eq!(table.resolve("answer"), Some(Val::Num(42.0)));
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["answer"]);
    }
}
