//! Test helpers for executor tests
//!
//! Common utilities for parsing modules, building VMs and a scripted host

use crate::executor::{
    inject_globals, run_until_done, Completion, ConsoleLevel, Host, Outcome, Require, Val, VM,
};
use crate::parser::ModuleDef;
use std::collections::HashMap;

/// Parse module source, validate, serialize/deserialize, and create VM
///
/// This helper:
/// - Parses the module
/// - Validates it semantically (errors only; warnings are allowed)
/// - Serializes and deserializes (to test round-trip compatibility)
/// - Creates a VM for `/test/main` with the standard globals injected
pub fn parse_module_and_build_vm(source: &str) -> VM {
    let module = crate::parser::parse_module(source).expect("Parse module failed");
    let report = crate::parser::semantic_validator::check_module(&module);
    assert!(
        report.is_loadable(),
        "Module validation failed: {:?}",
        report.errors
    );
    let json = serde_json::to_string(&module).expect("Module serialization failed");
    let module: ModuleDef = serde_json::from_str(&json).expect("Module deserialization failed");

    VM::new(module.body, inject_globals("/test/main", "/test"))
}

/// Parse module source WITHOUT validation, for testing runtime error behavior.
pub fn parse_without_validation(source: &str) -> VM {
    let module = crate::parser::parse_module(source).expect("Parse module failed");
    VM::new(module.body, inject_globals("/test/main", "/test"))
}

/// Host with scripted imports
///
/// Names registered with `inline` complete immediately; every other
/// specifier defers, as it would under the pausable engine.
#[derive(Debug, Default)]
pub struct TestHost {
    pub inline: HashMap<String, Completion>,
    pub requested: Vec<String>,
    pub printed: Vec<(ConsoleLevel, String)>,
    pub cwd: String,
}

impl TestHost {
    pub fn new() -> Self {
        Self {
            cwd: "/test".to_string(),
            ..Self::default()
        }
    }

    pub fn inline(mut self, specifier: &str, completion: Completion) -> Self {
        self.inline.insert(specifier.to_string(), completion);
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.printed.iter().map(|(_, text)| text.clone()).collect()
    }
}

impl Host for TestHost {
    fn require(&mut self, specifier: &str) -> Require {
        self.requested.push(specifier.to_string());
        match self.inline.get(specifier) {
            Some(completion) => Require::Ready(completion.clone()),
            None => Require::Deferred,
        }
    }

    fn print(&mut self, level: ConsoleLevel, text: String) {
        self.printed.push((level, text));
    }

    fn cwd(&self) -> String {
        self.cwd.clone()
    }
}

/// Run a module with a fresh `TestHost` and return its outcome and the host
pub fn run(source: &str) -> (Outcome, TestHost) {
    let mut vm = parse_module_and_build_vm(source);
    let mut host = TestHost::new();
    run_until_done(&mut vm, &mut host);
    (vm.outcome(), host)
}

/// Run a module and return the value it finished with
pub fn eval(source: &str) -> Val {
    match run(source).0 {
        Outcome::Returned(v) | Outcome::FellThrough(v) => v,
        other => panic!("Expected the module to finish, got {:?}", other),
    }
}

/// Run a module and return the error code of the uncaught throw
pub fn thrown_code(source: &str) -> String {
    match run(source).0 {
        Outcome::Threw(Val::Error(info)) => info.code,
        other => panic!("Expected an uncaught error, got {:?}", other),
    }
}

pub fn num(n: f64) -> Val {
    Val::Num(n)
}

pub fn str(s: &str) -> Val {
    Val::Str(s.to_string())
}
