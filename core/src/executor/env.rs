//! Lexical environment
//!
//! A stack of scopes. Scope 0 holds the unit's injected globals; blocks, loop
//! bindings and catch variables push further scopes. Frames remember the depth
//! they started at and truncate back to it when they are popped.

use super::types::{Val, VarKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scope {
    vars: HashMap<String, Val>,
    #[serde(default, skip_serializing_if = "HashSet::is_empty")]
    consts: HashSet<String>,
}

/// Why a variable could not be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    Undefined,
    Const,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Env {
    scopes: Vec<Scope>,
}

impl Env {
    /// Create an environment whose global scope holds `globals`
    pub fn new(globals: HashMap<String, Val>) -> Self {
        Self {
            scopes: vec![Scope {
                vars: globals,
                consts: HashSet::new(),
            }],
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Drop scopes until `depth` remain (never drops the global scope)
    pub fn truncate(&mut self, depth: usize) {
        self.scopes.truncate(depth.max(1));
    }

    /// Look a variable up, innermost scope first
    pub fn lookup(&self, name: &str) -> Option<&Val> {
        self.scopes.iter().rev().find_map(|scope| scope.vars.get(name))
    }

    /// Look a variable up in the global scope only
    pub fn global(&self, name: &str) -> Option<&Val> {
        self.scopes.first().and_then(|scope| scope.vars.get(name))
    }

    /// Declare a variable in the innermost scope
    pub fn declare(&mut self, name: &str, value: Val, kind: VarKind) {
        if let Some(scope) = self.scopes.last_mut() {
            match kind {
                VarKind::Const => {
                    scope.consts.insert(name.to_string());
                }
                VarKind::Let => {
                    scope.consts.remove(name);
                }
            }
            scope.vars.insert(name.to_string(), value);
        }
    }

    /// Mutable access to an existing binding, for rebinding the variable itself
    pub fn rebind(&mut self, name: &str) -> Result<&mut Val, BindingError> {
        let scope = self
            .scopes
            .iter_mut()
            .rev()
            .find(|scope| scope.vars.contains_key(name))
            .ok_or(BindingError::Undefined)?;
        if scope.consts.contains(name) {
            return Err(BindingError::Const);
        }
        scope.vars.get_mut(name).ok_or(BindingError::Undefined)
    }

    /// Mutable access to an existing binding's value, for writing into it.
    ///
    /// Constant bindings are allowed here: `const m = {}; m.x = 1` is legal.
    pub fn value_mut(&mut self, name: &str) -> Option<&mut Val> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.vars.get_mut(name))
    }
}
