//! # Execution admission mode
//!
//! Decides whether the manager accepts one more execution.
//!
//! ## Variants
//! - `Concurrent`: any number of executions run side by side.
//! - `Single`: a new execution is refused while any execution is registered.

/// Policy controlling how many executions may be registered at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// No limit.
    #[default]
    Concurrent,

    /// At most one registered execution.
    Single,
}

impl ExecutionMode {
    /// True if a new execution may start while `active` are registered.
    pub fn admits(&self, active: usize) -> bool {
        match self {
            ExecutionMode::Concurrent => true,
            ExecutionMode::Single => active == 0,
        }
    }
}
