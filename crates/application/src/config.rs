//! Orchestration settings.

/// Settings for command execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// How many times a command is rerun after losing an optimistic
    /// concurrency check. Zero surfaces the first conflict to the caller.
    pub conflict_retries: u32,
}

impl ServiceConfig {
    pub fn new(conflict_retries: u32) -> Self {
        Self { conflict_retries }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            conflict_retries: 2,
        }
    }
}
