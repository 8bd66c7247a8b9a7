//! Validation Rules
//!
//! - `loop_control.rs` - `break`/`continue` outside of a loop
//! - `require_specifier.rs` - `require` calls that cannot import anything

mod loop_control;
mod require_specifier;

pub use loop_control::LoopControlRule;
pub use require_specifier::RequireSpecifierRule;
