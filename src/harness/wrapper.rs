//! The processor actually registered with the compiler.
//!
//! Each round is routed either to a driven task or straight to the plugin
//! under test. Invocation counts, return values, and thrown errors land in
//! an [`Outcome`] the orchestrator reads after the run.

use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::error::{BoxError, HarnessError};
use crate::harness::environment::TestEnvironment;
use crate::harness::outcome::{Captured, Outcome, WrapperState};
use crate::harness::task::{Reentrancy, Task};
use crate::ports::processor::{Completion, ProcessingContext, Processor, RoundInfo, SourceVersion};
use crate::vfs::VirtualFileSystem;

/// Tells the compiler to stop; the real cause is held in the outcome.
#[derive(Debug, Error)]
#[error("driven code failed in round {round}")]
pub struct RoundAborted {
    /// Round in which the failure happened.
    pub round: u32,
}

/// What the wrapper drives.
pub(crate) enum Driver<T> {
    /// A task, optionally with a plugin it may call.
    Task {
        task: Task<T>,
        plugin: Option<Box<dyn Processor>>,
    },
    /// The plugin itself, every round.
    Plugin(Box<dyn Processor>),
}

/// Demultiplexes rounds to a task or plugin and records what happened.
pub struct RoundDrivingWrapper<T> {
    driver: Driver<T>,
    store: Arc<VirtualFileSystem>,
    context: Option<ProcessingContext>,
    outcome: Arc<Mutex<Outcome<T>>>,
    last_round: u32,
}

impl<T> RoundDrivingWrapper<T> {
    pub(crate) fn new(
        driver: Driver<T>,
        store: Arc<VirtualFileSystem>,
        outcome: Arc<Mutex<Outcome<T>>>,
    ) -> Self {
        Self { driver, store, context: None, outcome, last_round: 0 }
    }

    fn plugin(&self) -> Option<&dyn Processor> {
        match &self.driver {
            Driver::Task { plugin, .. } => plugin.as_deref(),
            Driver::Plugin(plugin) => Some(plugin.as_ref()),
        }
    }

    fn enter_round(&mut self, round: &RoundInfo) -> u32 {
        assert!(
            round.number() > self.last_round,
            "round {} entered after round {}; rounds must strictly increase",
            round.number(),
            self.last_round
        );
        self.last_round = round.number();
        let mut outcome = self.outcome.lock();
        outcome.invocations += 1;
        outcome.state = WrapperState::Running(round.number());
        outcome.invocations
    }

    fn fail(&self, round: &RoundInfo, thrown: Captured) -> BoxError {
        self.outcome.lock().capture(thrown);
        Box::new(RoundAborted { round: round.number() })
    }
}

impl<T: Send + 'static> Processor for RoundDrivingWrapper<T> {
    fn name(&self) -> String {
        self.plugin().map_or_else(|| "RoundDrivingWrapper".to_string(), Processor::name)
    }

    fn supported_annotation_types(&self) -> BTreeSet<String> {
        let Some(plugin) = self.plugin() else {
            return ["*".to_string()].into();
        };
        let supported = plugin.supported_annotation_types();
        if supported.is_empty() {
            if let Some(context) = &self.context {
                context.diagnostics.warning(format!(
                    "plugin '{}' declares no supported annotation types; it will never be invoked",
                    plugin.name()
                ));
            }
        }
        supported
    }

    fn supported_options(&self) -> BTreeSet<String> {
        self.plugin().map(Processor::supported_options).unwrap_or_default()
    }

    fn supported_source_version(&self) -> SourceVersion {
        self.plugin().map_or(SourceVersion::LATEST, Processor::supported_source_version)
    }

    fn init(&mut self, context: &ProcessingContext) {
        self.context = Some(context.clone());
        match &mut self.driver {
            Driver::Task { plugin: Some(plugin), .. } | Driver::Plugin(plugin) => {
                plugin.init(context);
            }
            Driver::Task { plugin: None, .. } => {}
        }
    }

    fn process(
        &mut self,
        annotations: &BTreeSet<String>,
        round: &RoundInfo,
    ) -> Result<bool, BoxError> {
        let invocation = self.enter_round(round);
        let Some(context) = self.context.as_ref() else {
            return Err(Box::new(HarnessError::IllegalState("process called before init".into())));
        };

        let result = match &mut self.driver {
            Driver::Task { task, plugin } => {
                if invocation > 1 && task.reentrancy() == Reentrancy::FirstRoundOnly {
                    tracing::debug!(
                        round = round.number(),
                        invocation,
                        "skipping non-reentrant routine"
                    );
                    return Ok(false);
                }
                let mut env = TestEnvironment::new(
                    context,
                    &self.store,
                    round,
                    annotations,
                    invocation,
                    plugin.as_deref_mut(),
                );
                catch_unwind(AssertUnwindSafe(|| task.run(&mut env))).map(|ran| {
                    ran.map(|value| {
                        let mut outcome = self.outcome.lock();
                        outcome.value = Some(value);
                        true
                    })
                })
            }
            Driver::Plugin(plugin) => {
                catch_unwind(AssertUnwindSafe(|| plugin.process(annotations, round))).map(|ran| {
                    ran.inspect(|claimed| {
                        self.outcome.lock().claimed = Some(*claimed);
                    })
                })
            }
        };

        match result {
            Ok(Ok(claimed)) => {
                let mut outcome = self.outcome.lock();
                outcome.executions += 1;
                outcome.done = true;
                if round.processing_over() {
                    outcome.state = WrapperState::Done;
                }
                Ok(claimed)
            }
            Ok(Err(err)) => {
                tracing::debug!(
                    round = round.number(),
                    error = %err,
                    "driven code returned an error"
                );
                Err(self.fail(round, Captured::Error(err)))
            }
            Err(payload) => {
                tracing::debug!(round = round.number(), "driven code panicked");
                Err(self.fail(round, Captured::Panic(payload)))
            }
        }
    }

    fn completions(
        &self,
        element: &str,
        annotation: &str,
        member: &str,
        user_text: &str,
    ) -> Vec<Completion> {
        self.plugin()
            .map(|plugin| plugin.completions(element, annotation, member, user_text))
            .unwrap_or_default()
    }
}
