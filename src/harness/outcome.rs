//! Result state shared between the wrapper and the orchestrator.

use std::any::Any;

use crate::error::BoxError;

/// Lifecycle of the round-driving wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapperState {
    /// No round entered yet.
    #[default]
    Idle,
    /// Inside or after the given round.
    Running(u32),
    /// The wrapper handled the final round.
    Done,
}

/// What the driven code threw.
pub(crate) enum Captured {
    Error(BoxError),
    Panic(Box<dyn Any + Send>),
}

/// Everything the wrapper records across rounds.
pub(crate) struct Outcome<T> {
    pub(crate) value: Option<T>,
    pub(crate) claimed: Option<bool>,
    pub(crate) thrown: Option<Captured>,
    pub(crate) done: bool,
    pub(crate) invocations: u32,
    pub(crate) executions: u32,
    pub(crate) state: WrapperState,
}

impl<T> Default for Outcome<T> {
    fn default() -> Self {
        Self {
            value: None,
            claimed: None,
            thrown: None,
            done: false,
            invocations: 0,
            executions: 0,
            state: WrapperState::Idle,
        }
    }
}

impl<T> Outcome<T> {
    /// Records a thrown error; the first one wins.
    pub(crate) fn capture(&mut self, thrown: Captured) {
        if self.thrown.is_none() {
            self.thrown = Some(thrown);
        }
        self.done = true;
    }
}
