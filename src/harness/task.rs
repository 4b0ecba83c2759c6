//! Driven-routine descriptors.

use crate::error::BoxError;
use crate::harness::environment::TestEnvironment;

/// What a driven routine returns.
pub type TaskResult<T> = Result<T, BoxError>;

type Routine<T> = Box<dyn FnMut(&mut TestEnvironment<'_>) -> TaskResult<T> + Send>;

/// Whether a routine may run again on rounds after the one it first ran in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reentrancy {
    /// Runs on the first invocation only; later rounds report "not interested".
    #[default]
    FirstRoundOnly,
    /// Runs on every round the compiler issues.
    EveryRound,
}

/// Test code the wrapper executes once per eligible round.
pub struct Task<T> {
    routine: Routine<T>,
    reentrancy: Reentrancy,
}

impl<T> Task<T> {
    /// Wraps `routine` with an explicit reentrancy policy.
    pub fn new<F>(reentrancy: Reentrancy, routine: F) -> Self
    where
        F: FnMut(&mut TestEnvironment<'_>) -> TaskResult<T> + Send + 'static,
    {
        Self { routine: Box::new(routine), reentrancy }
    }

    /// A routine that runs on the first round only.
    pub fn once<F>(routine: F) -> Self
    where
        F: FnMut(&mut TestEnvironment<'_>) -> TaskResult<T> + Send + 'static,
    {
        Self::new(Reentrancy::FirstRoundOnly, routine)
    }

    /// A routine that runs on every round.
    pub fn reentrant<F>(routine: F) -> Self
    where
        F: FnMut(&mut TestEnvironment<'_>) -> TaskResult<T> + Send + 'static,
    {
        Self::new(Reentrancy::EveryRound, routine)
    }

    /// The routine's reentrancy policy.
    #[must_use]
    pub fn reentrancy(&self) -> Reentrancy {
        self.reentrancy
    }

    pub(crate) fn run(&mut self, env: &mut TestEnvironment<'_>) -> TaskResult<T> {
        (self.routine)(env)
    }
}

impl<T> std::fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("reentrancy", &self.reentrancy).finish_non_exhaustive()
    }
}
