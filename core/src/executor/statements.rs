//! Statement execution handlers
//!
//! Each statement type has its own handler function that processes
//! the statement based on its current execution phase.
//!
//! Every handler that evaluates expressions does so in one pass: the replay
//! log is rewound before the first expression and cleared once the last one
//! produced a value. A pass that suspends leaves the frame untouched, so the
//! same pass runs again after the VM is resumed.

use super::errors::{self, ErrorInfo};
use super::env::BindingError;
use super::expressions::{eval_expr, list_index, EvalResult};
use super::host::Host;
use super::ops::binary_op;
use super::types::{
    AssignOp, Control, DeclareTarget, Expr, ForLoopKind, ForPhase, FrameKind, IfPhase,
    MemberAccess, Stmt, TryPhase, Val, VarKind,
};
use super::vm::{pop_frame, push_stmt, set_top_kind, Step, VM};

/* ===================== Evaluation Helpers ===================== */

/// Evaluate an expression as part of the current statement's pass
///
/// On suspend or throw this sets `vm.control` and returns `None`; the
/// caller must return without touching its frame.
fn eval(vm: &mut VM, expr: &Expr, host: &mut dyn Host) -> Option<Val> {
    match eval_expr(expr, &vm.env, &mut vm.replay, host) {
        EvalResult::Value { v } => Some(v),
        EvalResult::Suspend { specifier } => {
            vm.control = Control::Suspend(specifier);
            None
        }
        EvalResult::Throw { error } => {
            vm.replay.clear();
            vm.control = Control::Throw(error);
            None
        }
    }
}

fn throw(vm: &mut VM, code: &str, message: String) -> Step {
    vm.control = Control::Throw(Val::Error(ErrorInfo::new(code, message)));
    Step::Continue
}

/// Control result after an expression stopped the pass
fn stopped(vm: &VM) -> Step {
    match vm.control {
        Control::Suspend(_) => Step::Done,
        _ => Step::Continue,
    }
}

/* ===================== Statement Handlers ===================== */

/// Execute Block statement
pub fn execute_block(vm: &mut VM, idx: usize, body: &[Stmt]) -> Step {
    // Check if we've finished all statements in the block
    let Some(child) = body.get(idx) else {
        pop_frame(vm);
        return Step::Continue;
    };

    // Advance our frame before pushing the child
    set_top_kind(vm, FrameKind::Block { idx: idx + 1 });
    push_stmt(vm, child);

    Step::Continue
}

/// Execute Expression statement
pub fn execute_expr(vm: &mut VM, expr: &Expr, host: &mut dyn Host) -> Step {
    vm.replay.rewind();
    let Some(v) = eval(vm, expr, host) else {
        return stopped(vm);
    };
    vm.replay.clear();

    vm.completion = Some(v);
    pop_frame(vm);
    Step::Continue
}

/// Execute Declare statement (`let` / `const`)
pub fn execute_declare(
    vm: &mut VM,
    var_kind: VarKind,
    target: &DeclareTarget,
    init: Option<&Expr>,
    host: &mut dyn Host,
) -> Step {
    vm.replay.rewind();
    let value = match init {
        Some(expr) => match eval(vm, expr, host) {
            Some(v) => v,
            None => return stopped(vm),
        },
        None => Val::Null,
    };
    vm.replay.clear();

    // The declaration lives in the enclosing scope, not one this frame opened
    pop_frame(vm);

    match target {
        DeclareTarget::Simple { name, .. } => {
            vm.env.declare(name, value, var_kind);
        }
        DeclareTarget::Destructure { names, .. } => {
            let Val::Obj(map) = value else {
                return throw(
                    vm,
                    errors::TYPE_ERROR,
                    format!("Cannot destructure {}", value.type_name()),
                );
            };
            for name in names {
                let v = map.get(name).cloned().unwrap_or(Val::Null);
                vm.env.declare(name, v, var_kind);
            }
        }
    }

    Step::Continue
}

/// Execute Assign statement
///
/// The right-hand side is evaluated first, then any index expressions of the
/// target path, all in the same pass.
pub fn execute_assign(
    vm: &mut VM,
    var: &str,
    path: &[MemberAccess],
    op: AssignOp,
    value: &Expr,
    host: &mut dyn Host,
) -> Step {
    vm.replay.rewind();
    let Some(rhs) = eval(vm, value, host) else {
        return stopped(vm);
    };
    let mut keys = Vec::with_capacity(path.len());
    for segment in path {
        match segment {
            MemberAccess::Prop { property, .. } => keys.push(Val::Str(property.clone())),
            MemberAccess::Index { expr, .. } => match eval(vm, expr, host) {
                Some(k) => keys.push(k),
                None => return stopped(vm),
            },
        }
    }
    vm.replay.clear();
    pop_frame(vm);

    let result = if keys.is_empty() {
        assign_variable(vm, var, op, rhs)
    } else {
        assign_path(vm, var, &keys, op, rhs)
    };
    if let Err(error) = result {
        vm.control = Control::Throw(error);
    }
    Step::Continue
}

fn combine(op: AssignOp, current: &Val, rhs: Val) -> Result<Val, Val> {
    match op.binary() {
        Some(binary) => binary_op(binary, current, &rhs),
        None => Ok(rhs),
    }
}

fn assign_variable(vm: &mut VM, var: &str, op: AssignOp, rhs: Val) -> Result<(), Val> {
    let slot = vm.env.rebind(var).map_err(|err| match err {
        BindingError::Undefined => Val::Error(ErrorInfo::new(
            errors::UNDEFINED_VARIABLE,
            format!("Undefined variable '{}'", var),
        )),
        BindingError::Const => Val::Error(ErrorInfo::new(
            errors::CONST_REASSIGN,
            format!("Cannot reassign constant '{}'", var),
        )),
    })?;
    *slot = combine(op, slot, rhs)?;
    Ok(())
}

fn assign_path(vm: &mut VM, var: &str, keys: &[Val], op: AssignOp, rhs: Val) -> Result<(), Val> {
    let mut target = vm.env.value_mut(var).ok_or_else(|| {
        Val::Error(ErrorInfo::new(
            errors::UNDEFINED_VARIABLE,
            format!("Undefined variable '{}'", var),
        ))
    })?;

    let Some((last, parents)) = keys.split_last() else {
        return Ok(());
    };
    for key in parents {
        target = child_mut(target, key)?;
    }

    match (target, last) {
        (Val::Obj(map), key) => {
            let key = property_key(key)?;
            let new_value = match op {
                AssignOp::Set => rhs,
                _ => {
                    let current = map.get(&key).ok_or_else(|| missing_property(&key))?;
                    combine(op, current, rhs)?
                }
            };
            map.insert(key, new_value);
            Ok(())
        }
        (Val::List(items), Val::Num(n)) => {
            // Writing one past the end appends
            let i = list_index(*n, items.len() + 1)?;
            if i == items.len() {
                if op != AssignOp::Set {
                    return Err(index_error(*n, items.len()));
                }
                items.push(rhs);
            } else {
                items[i] = combine(op, &items[i], rhs)?;
            }
            Ok(())
        }
        (other, key) => Err(Val::Error(ErrorInfo::new(
            errors::TYPE_ERROR,
            format!(
                "Cannot assign to {} of {}",
                key.display_string(),
                other.type_name()
            ),
        ))),
    }
}

fn child_mut<'a>(target: &'a mut Val, key: &Val) -> Result<&'a mut Val, Val> {
    match target {
        Val::Obj(map) => {
            let key = property_key(key)?;
            map.get_mut(&key).ok_or_else(|| missing_property(&key))
        }
        Val::List(items) => {
            let Val::Num(n) = key else {
                return Err(Val::Error(ErrorInfo::new(
                    errors::TYPE_ERROR,
                    format!("Cannot index list with {}", key.type_name()),
                )));
            };
            let i = list_index(*n, items.len())?;
            Ok(&mut items[i])
        }
        other => Err(Val::Error(ErrorInfo::new(
            errors::TYPE_ERROR,
            format!(
                "Cannot read {} of {}",
                key.display_string(),
                other.type_name()
            ),
        ))),
    }
}

fn property_key(key: &Val) -> Result<String, Val> {
    match key {
        Val::Str(s) => Ok(s.clone()),
        Val::Num(_) => Ok(key.display_string()),
        other => Err(Val::Error(ErrorInfo::new(
            errors::TYPE_ERROR,
            format!("Cannot use {} as a property key", other.type_name()),
        ))),
    }
}

fn missing_property(key: &str) -> Val {
    Val::Error(ErrorInfo::new(
        errors::PROPERTY_NOT_FOUND,
        format!("Property '{}' not found on object", key),
    ))
}

fn index_error(n: f64, len: usize) -> Val {
    Val::Error(ErrorInfo::new(
        errors::INDEX_OUT_OF_BOUNDS,
        format!("Index {} out of bounds for length {}", n, len),
    ))
}

/// Execute Return statement
pub fn execute_return(vm: &mut VM, value: Option<&Expr>, host: &mut dyn Host) -> Step {
    vm.replay.rewind();
    let val = match value {
        Some(expr) => match eval(vm, expr, host) {
            Some(v) => v,
            None => return stopped(vm),
        },
        None => Val::Null,
    };
    vm.replay.clear();

    vm.control = Control::Return(val);
    pop_frame(vm);
    Step::Continue
}

/// Execute Throw statement
pub fn execute_throw(vm: &mut VM, value: &Expr, host: &mut dyn Host) -> Step {
    vm.replay.rewind();
    let Some(val) = eval(vm, value, host) else {
        return stopped(vm);
    };
    vm.replay.clear();

    vm.control = Control::Throw(val);
    pop_frame(vm);
    Step::Continue
}

/// Execute If statement
pub fn execute_if(
    vm: &mut VM,
    phase: IfPhase,
    test: &Expr,
    then_s: &Stmt,
    else_s: Option<&Stmt>,
    host: &mut dyn Host,
) -> Step {
    match phase {
        IfPhase::Test => {
            vm.replay.rewind();
            let Some(cond) = eval(vm, test, host) else {
                return stopped(vm);
            };
            vm.replay.clear();

            set_top_kind(
                vm,
                FrameKind::If {
                    phase: IfPhase::Done,
                },
            );
            if cond.is_truthy() {
                push_stmt(vm, then_s);
            } else if let Some(else_s) = else_s {
                push_stmt(vm, else_s);
            }
            Step::Continue
        }
        IfPhase::Done => {
            pop_frame(vm);
            Step::Continue
        }
    }
}

/// Execute While statement
///
/// The frame stays in its test phase; each time the body finishes the test
/// is evaluated again.
pub fn execute_while(vm: &mut VM, test: &Expr, body: &Stmt, host: &mut dyn Host) -> Step {
    vm.replay.rewind();
    let Some(cond) = eval(vm, test, host) else {
        return stopped(vm);
    };
    vm.replay.clear();

    if cond.is_truthy() {
        push_stmt(vm, body);
    } else {
        pop_frame(vm);
    }
    Step::Continue
}

/// Execute For loop
///
/// The iterable is evaluated once and its items snapshotted into the frame;
/// each iteration binds the next item in a fresh scope.
pub fn execute_for(
    vm: &mut VM,
    phase: ForPhase,
    items: Vec<Val>,
    idx: usize,
    kind: ForLoopKind,
    binding: &str,
    iterable: &Expr,
    body: &Stmt,
    host: &mut dyn Host,
) -> Step {
    match phase {
        ForPhase::Init => {
            vm.replay.rewind();
            let Some(collection) = eval(vm, iterable, host) else {
                return stopped(vm);
            };
            vm.replay.clear();

            let items = match iteration_items(kind, collection) {
                Ok(items) => items,
                Err(error) => {
                    vm.control = Control::Throw(error);
                    return Step::Continue;
                }
            };
            set_top_kind(
                vm,
                FrameKind::ForLoop {
                    phase: ForPhase::Next,
                    items,
                    idx: 0,
                },
            );
            Step::Continue
        }
        ForPhase::Next => {
            let Some(frame) = vm.frames.last() else {
                return Step::Done;
            };
            let scope_base = frame.scope_base;
            // Drop the previous iteration's binding scope
            vm.env.truncate(scope_base);

            let Some(item) = items.get(idx).cloned() else {
                pop_frame(vm);
                return Step::Continue;
            };

            vm.env.push_scope();
            vm.env.declare(binding, item, VarKind::Let);
            set_top_kind(
                vm,
                FrameKind::ForLoop {
                    phase: ForPhase::Next,
                    items,
                    idx: idx + 1,
                },
            );
            push_stmt(vm, body);
            Step::Continue
        }
    }
}

fn iteration_items(kind: ForLoopKind, collection: Val) -> Result<Vec<Val>, Val> {
    match (kind, collection) {
        (ForLoopKind::Of, Val::List(items)) => Ok(items),
        (ForLoopKind::Of, Val::Str(s)) => Ok(s.chars().map(|c| Val::Str(c.to_string())).collect()),
        (ForLoopKind::In, Val::Obj(map)) => {
            let mut keys: Vec<String> = map.into_keys().collect();
            keys.sort();
            Ok(keys.into_iter().map(Val::Str).collect())
        }
        (ForLoopKind::In, Val::List(items)) => {
            Ok((0..items.len()).map(|i| Val::Str(i.to_string())).collect())
        }
        (ForLoopKind::In, Val::Str(s)) => {
            Ok((0..s.chars().count()).map(|i| Val::Str(i.to_string())).collect())
        }
        (kind, other) => Err(Val::Error(ErrorInfo::new(
            errors::TYPE_ERROR,
            format!(
                "Cannot iterate over {} with for...{}",
                other.type_name(),
                match kind {
                    ForLoopKind::In => "in",
                    ForLoopKind::Of => "of",
                }
            ),
        ))),
    }
}

/// Execute Try statement
///
/// Entering pushes the try block. If the frame is seen again, the try or
/// catch block finished normally. Catching is done during unwinding.
pub fn execute_try(vm: &mut VM, phase: TryPhase, body: &Stmt) -> Step {
    match phase {
        TryPhase::Enter => {
            set_top_kind(
                vm,
                FrameKind::Try {
                    phase: TryPhase::ExecuteTry,
                },
            );
            push_stmt(vm, body);
            Step::Continue
        }
        TryPhase::ExecuteTry | TryPhase::ExecuteCatch => {
            pop_frame(vm);
            Step::Continue
        }
    }
}

/// Execute Break/Continue statements
pub fn execute_loop_control(vm: &mut VM, control: Control) -> Step {
    pop_frame(vm);
    vm.control = control;
    Step::Continue
}
