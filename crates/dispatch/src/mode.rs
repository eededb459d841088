//! Executor mode shared between the facade and the command processor.

use std::sync::atomic::{AtomicU8, Ordering};

/// How the command processor should treat its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorMode {
    /// Execute commands as they arrive.
    Running,
    /// Execute what is queued, then exit.
    DrainAndStop,
    /// Exit after the command in flight, discarding the rest.
    StopImmediately,
}

impl ExecutorMode {
    fn to_u8(self) -> u8 {
        match self {
            ExecutorMode::Running => 0,
            ExecutorMode::DrainAndStop => 1,
            ExecutorMode::StopImmediately => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => ExecutorMode::Running,
            1 => ExecutorMode::DrainAndStop,
            _ => ExecutorMode::StopImmediately,
        }
    }
}

/// Atomic cell holding an [`ExecutorMode`].
#[derive(Debug)]
pub(crate) struct ModeCell(AtomicU8);

impl ModeCell {
    pub(crate) fn new(mode: ExecutorMode) -> Self {
        Self(AtomicU8::new(mode.to_u8()))
    }

    pub(crate) fn get(&self) -> ExecutorMode {
        ExecutorMode::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, mode: ExecutorMode) {
        self.0.store(mode.to_u8(), Ordering::Release);
    }
}
