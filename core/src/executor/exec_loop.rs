//! Core execution loop
//!
//! This module contains the step() function - the heart of the interpreter.
//! It processes one frame at a time, advancing execution phases and managing the frame stack.
//!
//! ## Function Organization
//! Functions are ordered by importance/call hierarchy:
//! 1. run_until_done() / run_steps() - Drivers (call step repeatedly)
//! 2. step() - Main execution loop (dispatches to statement handlers)
//! 3. unwind() - Control flow handling

use super::errors::{self, ErrorInfo};
use super::host::Host;
use super::statements::{
    execute_assign, execute_block, execute_declare, execute_expr, execute_for, execute_if,
    execute_loop_control, execute_return, execute_throw, execute_try, execute_while,
};
use super::types::{Control, FrameKind, Stmt, TryPhase, Val, VarKind};
use super::vm::{pop_frame, push_stmt, set_top_kind, Step, VM};

/* ===================== Public API ===================== */

/// Run the VM until it completes or suspends
///
/// After it stops, inspect `vm.control` (or `vm.outcome()`) for the final state.
pub fn run_until_done(vm: &mut VM, host: &mut dyn Host) {
    while step(vm, host) == Step::Continue {}
}

/// Run at most `budget` steps
///
/// Returns the number of steps taken along with `Step::Continue` when the
/// budget ran out with work left, or `Step::Done` when the VM finished,
/// threw out of its body or suspended.
pub fn run_steps(vm: &mut VM, host: &mut dyn Host, budget: usize) -> (Step, usize) {
    for used in 1..=budget {
        if step(vm, host) == Step::Done {
            return (Step::Done, used);
        }
    }
    (Step::Continue, budget)
}

/// Execute one step of the VM
///
/// This is the core interpreter loop. It:
/// 1. Checks for active control flow and unwinds if needed
/// 2. Gets the top frame
/// 3. Matches on frame kind and execution phase
/// 4. Executes the appropriate logic
/// 5. Either continues or signals done
pub fn step(vm: &mut VM, host: &mut dyn Host) -> Step {
    // Check if we have active control flow (return/break/continue/throw/suspend)
    if vm.control != Control::None {
        return unwind(vm);
    }

    // Get top frame (if any)
    let Some(frame) = vm.frames.last() else {
        // No frames left - execution complete
        return Step::Done;
    };

    // Clone frame data we need (to avoid borrow checker issues)
    let (kind, node) = (frame.kind.clone(), frame.node.clone());

    // Dispatch to statement handler
    match (kind, &node) {
        (FrameKind::Block { idx }, Stmt::Block { body, .. }) => execute_block(vm, idx, body),

        (FrameKind::Expr { .. }, Stmt::Expr { expr, .. }) => execute_expr(vm, expr, host),

        (
            FrameKind::Declare { .. },
            Stmt::Declare {
                var_kind,
                target,
                init,
                ..
            },
        ) => execute_declare(vm, *var_kind, target, init.as_ref(), host),

        (
            FrameKind::Assign { .. },
            Stmt::Assign {
                var,
                path,
                op,
                value,
                ..
            },
        ) => execute_assign(vm, var, path, *op, value, host),

        (FrameKind::Return { .. }, Stmt::Return { value, .. }) => {
            execute_return(vm, value.as_ref(), host)
        }

        (FrameKind::Throw { .. }, Stmt::Throw { value, .. }) => execute_throw(vm, value, host),

        (
            FrameKind::If { phase },
            Stmt::If {
                test,
                then_s,
                else_s,
                ..
            },
        ) => execute_if(vm, phase, test, then_s, else_s.as_deref(), host),

        (FrameKind::While { .. }, Stmt::While { test, body, .. }) => {
            execute_while(vm, test, body, host)
        }

        (
            FrameKind::ForLoop { phase, items, idx },
            Stmt::ForLoop {
                kind,
                binding,
                iterable,
                body,
                ..
            },
        ) => execute_for(vm, phase, items, idx, *kind, binding, iterable, body, host),

        (FrameKind::Try { phase }, Stmt::Try { body, .. }) => execute_try(vm, phase, body),

        (FrameKind::Break, Stmt::Break { .. }) => execute_loop_control(vm, Control::Break),

        (FrameKind::Continue, Stmt::Continue { .. }) => {
            execute_loop_control(vm, Control::Continue)
        }

        // Frame kind does not match its statement node; the frame stack is corrupt
        (kind, node) => {
            vm.frames.clear();
            vm.control = Control::Throw(Val::Error(ErrorInfo::new(
                errors::ILLEGAL_CONTROL,
                format!("Frame {:?} does not match statement at {:?}", kind, node.span()),
            )));
            Step::Done
        }
    }
}

/* ===================== Control Flow ===================== */

/// Unwind the stack when control flow is active
///
/// Pops frames until we find an appropriate handler or run out of frames.
fn unwind(vm: &mut VM) -> Step {
    match vm.control.clone() {
        // Frames stay intact until the VM is resumed
        Control::Suspend(_) => Step::Done,

        Control::Return(_) => {
            // Return exits the entire module body
            vm.frames.clear();
            vm.env.truncate(1);
            Step::Done
        }

        Control::Throw(error) => {
            let handler = vm.frames.iter().rposition(|f| {
                matches!(
                    f.kind,
                    FrameKind::Try {
                        phase: TryPhase::ExecuteTry
                    }
                )
            });

            let Some(handler) = handler else {
                // Uncaught - the error escapes the body
                vm.frames.clear();
                vm.env.truncate(1);
                return Step::Done;
            };

            while vm.frames.len() > handler + 1 {
                pop_frame(vm);
            }

            let Some((catch_var, catch_body)) = vm.frames.last().and_then(|f| match &f.node {
                Stmt::Try {
                    catch_var,
                    catch_body,
                    ..
                } => Some((catch_var.clone(), catch_body.as_ref().clone())),
                _ => None,
            }) else {
                vm.frames.clear();
                return Step::Done;
            };

            set_top_kind(
                vm,
                FrameKind::Try {
                    phase: TryPhase::ExecuteCatch,
                },
            );
            vm.control = Control::None;

            // The catch variable gets its own scope, released with the Try frame
            vm.env.push_scope();
            vm.env.declare(&catch_var, error, VarKind::Let);
            push_stmt(vm, &catch_body);
            Step::Continue
        }

        control @ (Control::Break | Control::Continue) => {
            let Some(target) = vm.frames.iter().rposition(|f| f.kind.is_loop()) else {
                let keyword = if control == Control::Break {
                    "break"
                } else {
                    "continue"
                };
                vm.control = Control::Throw(Val::Error(ErrorInfo::new(
                    errors::ILLEGAL_CONTROL,
                    format!("'{}' outside of a loop", keyword),
                )));
                return Step::Continue;
            };

            while vm.frames.len() > target + 1 {
                pop_frame(vm);
            }
            if control == Control::Break {
                pop_frame(vm);
            }
            // On continue the loop frame is on top again and runs its next iteration
            vm.control = Control::None;
            Step::Continue
        }

        Control::None => Step::Continue,
    }
}
