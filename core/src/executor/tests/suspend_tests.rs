//! Tests for suspending on deferred imports and resuming with tagged results

use super::helpers::{num, parse_module_and_build_vm, str, TestHost};
use crate::executor::stdlib::assert;
use crate::executor::{errors, run_until_done, Completion, Outcome, Val, VM};

/* ===================== Suspend / Resume ===================== */

#[test]
fn test_deferred_require_suspends() {
    let mut vm = parse_module_and_build_vm("let b = require('./b')\nreturn b + 1");
    let mut host = TestHost::new();

    run_until_done(&mut vm, &mut host);
    assert_eq!(vm.outcome(), Outcome::Suspended("./b".to_string()));
    assert_eq!(vm.suspended_on(), Some("./b"));

    assert!(vm.resume(Completion::Normal(num(41.0))));
    run_until_done(&mut vm, &mut host);
    assert_eq!(vm.outcome(), Outcome::Returned(num(42.0)));
}

#[test]
fn test_resume_when_not_suspended() {
    let mut vm = parse_module_and_build_vm("return 1");
    assert!(!vm.resume(Completion::Normal(Val::Null)));
    run_until_done(&mut vm, &mut TestHost::new());
    assert!(!vm.resume(Completion::Normal(Val::Null)));
    assert_eq!(vm.outcome(), Outcome::Returned(num(1.0)));
}

#[test]
fn test_abnormal_resume_throws_at_call_site() {
    let mut vm = parse_module_and_build_vm(
        "let steps = []\nlet b = require('./b')\nsteps[steps.length] = 'after'\nreturn steps",
    );
    let mut host = TestHost::new();
    run_until_done(&mut vm, &mut host);

    vm.resume(Completion::Abnormal(Val::error(errors::GUEST_ERROR, "boom")));
    run_until_done(&mut vm, &mut host);
    match vm.outcome() {
        Outcome::Threw(Val::Error(info)) => assert_eq!(info.message, "boom"),
        other => panic!("Expected the import error to escape, got {:?}", other),
    }
}

#[test]
fn test_abnormal_resume_can_be_caught() {
    let mut vm = parse_module_and_build_vm(
        "try { require('./missing') } catch (e) { return 'caught ' + e.code }",
    );
    let mut host = TestHost::new();
    run_until_done(&mut vm, &mut host);

    vm.resume(Completion::Abnormal(Val::error(
        errors::MODULE_NOT_FOUND,
        "Cannot find module '/test/missing'",
    )));
    run_until_done(&mut vm, &mut host);
    assert_eq!(vm.outcome(), Outcome::Returned(str("caught MODULE_NOT_FOUND")));
}

/* ===================== Replay ===================== */

#[test]
fn test_two_requires_in_one_statement() {
    let mut vm = parse_module_and_build_vm("return require('./a') + require('./b')");
    let mut host = TestHost::new();

    run_until_done(&mut vm, &mut host);
    assert_eq!(vm.suspended_on(), Some("./a"));
    vm.resume(Completion::Normal(num(1.0)));

    run_until_done(&mut vm, &mut host);
    assert_eq!(vm.suspended_on(), Some("./b"));
    vm.resume(Completion::Normal(num(2.0)));

    run_until_done(&mut vm, &mut host);
    assert_eq!(vm.outcome(), Outcome::Returned(num(3.0)));
    assert_eq!(host.requested, vec!["./a", "./b"]);
    assert!(vm.replay.is_empty());
}

#[test]
fn test_replay_is_per_statement() {
    let mut vm = parse_module_and_build_vm(
        "let first = require('./x')\nlet second = require('./x')\nreturn [first, second]",
    );
    let mut host = TestHost::new();

    run_until_done(&mut vm, &mut host);
    vm.resume(Completion::Normal(str("one")));
    run_until_done(&mut vm, &mut host);
    assert_eq!(vm.suspended_on(), Some("./x"));
    vm.resume(Completion::Normal(str("two")));
    run_until_done(&mut vm, &mut host);

    assert_eq!(
        vm.outcome(),
        Outcome::Returned(Val::List(vec![str("one"), str("two")]))
    );
}

#[test]
fn test_inline_require_is_not_repeated() {
    let mut vm = parse_module_and_build_vm(
        "const {strictEqual} = require('assert') && require('./b')\nreturn strictEqual",
    );
    let mut host = TestHost::new().inline("assert", Completion::Normal(assert::module()));

    run_until_done(&mut vm, &mut host);
    assert_eq!(vm.suspended_on(), Some("./b"));
    vm.resume(Completion::Normal(Val::Obj(maplit::hashmap! {
        "strictEqual".to_string() => num(7.0),
    })));
    run_until_done(&mut vm, &mut host);

    assert_eq!(vm.outcome(), Outcome::Returned(num(7.0)));
    assert_eq!(host.requested, vec!["assert", "./b"]);
}

#[test]
fn test_calls_before_require_run_once() {
    let mut vm = parse_module_and_build_vm(
        "let x = [console.log('side effect'), require('./b'), console.log('after')]",
    );
    let mut host = TestHost::new();

    run_until_done(&mut vm, &mut host);
    assert_eq!(host.lines(), vec!["side effect"]);
    vm.resume(Completion::Normal(num(1.0)));
    run_until_done(&mut vm, &mut host);

    assert_eq!(host.lines(), vec!["side effect", "after"]);
    assert!(vm.replay.is_empty());
}

#[test]
fn test_replayed_calls_keep_their_first_results() {
    let source = r#"
        let seen = [process.cwd(), require('./a'), process.cwd(), require('./b')]
        return seen
    "#;
    let mut vm = parse_module_and_build_vm(source);
    let mut host = TestHost::new();

    run_until_done(&mut vm, &mut host);
    host.cwd = "/elsewhere".to_string();
    vm.resume(Completion::Normal(num(1.0)));
    run_until_done(&mut vm, &mut host);
    assert_eq!(vm.suspended_on(), Some("./b"));
    vm.resume(Completion::Normal(num(2.0)));
    run_until_done(&mut vm, &mut host);

    assert_eq!(
        vm.outcome(),
        Outcome::Returned(Val::List(vec![str("/test"), num(1.0), str("/elsewhere"), num(2.0)]))
    );
}

#[test]
fn test_throw_after_replay_clears_log() {
    let mut vm = parse_module_and_build_vm(
        "try { let x = [Math.floor(1.5), require('./a'), Math.abs('x')] } catch (e) { }\nreturn Math.abs(-3)",
    );
    let mut host = TestHost::new();

    run_until_done(&mut vm, &mut host);
    vm.resume(Completion::Normal(num(1.0)));
    run_until_done(&mut vm, &mut host);

    assert_eq!(vm.outcome(), Outcome::Returned(num(3.0)));
    assert!(vm.replay.is_empty());
}

#[test]
fn test_suspend_inside_loop_body() {
    let source = r#"
        let total = 0
        for (let name of ['./a', './b', './c']) {
            total += require(name)
        }
        return total
    "#;
    let mut vm = parse_module_and_build_vm(source);
    let mut host = TestHost::new();

    for (expected, value) in [("./a", 1.0), ("./b", 10.0), ("./c", 100.0)] {
        run_until_done(&mut vm, &mut host);
        assert_eq!(vm.suspended_on(), Some(expected));
        vm.resume(Completion::Normal(num(value)));
    }
    run_until_done(&mut vm, &mut host);
    assert_eq!(vm.outcome(), Outcome::Returned(num(111.0)));
}

#[test]
fn test_suspend_in_if_test_and_assignment_index() {
    let source = r#"
        let o = {}
        if (require('./flag')) {
            o[require('./key')] = 'set'
        }
        return o
    "#;
    let mut vm = parse_module_and_build_vm(source);
    let mut host = TestHost::new();

    run_until_done(&mut vm, &mut host);
    vm.resume(Completion::Normal(Val::Bool(true)));
    run_until_done(&mut vm, &mut host);
    assert_eq!(vm.suspended_on(), Some("./key"));
    vm.resume(Completion::Normal(str("k")));
    run_until_done(&mut vm, &mut host);

    assert_eq!(
        vm.outcome(),
        Outcome::Returned(Val::Obj(maplit::hashmap! {
            "k".to_string() => str("set"),
        }))
    );
}

/* ===================== Serialization ===================== */

#[test]
fn test_suspended_vm_survives_serialization() {
    let mut vm = parse_module_and_build_vm(
        "let a = 5\nlet b = require('./b')\nmodule.exports = a * b",
    );
    let mut host = TestHost::new();
    run_until_done(&mut vm, &mut host);

    let json = serde_json::to_string(&vm).expect("VM serialization failed");
    let mut restored: VM = serde_json::from_str(&json).expect("VM deserialization failed");

    restored.resume(Completion::Normal(num(3.0)));
    run_until_done(&mut restored, &mut host);
    assert!(matches!(restored.outcome(), Outcome::FellThrough(_)));
    assert_eq!(restored.env.global("module"), Some(&Val::Obj(maplit::hashmap! {
        "exports".to_string() => num(15.0),
    })));
}

#[test]
fn test_completion_wire_format() {
    let json = serde_json::to_value(Completion::Normal(num(1.0))).unwrap();
    assert_eq!(json["type"], "normal");
    let json = serde_json::to_value(Completion::Abnormal(str("x"))).unwrap();
    assert_eq!(json["type"], "abnormal");
}
