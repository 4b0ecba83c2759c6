//! End-to-end runs of the orchestrator against the simulated compiler.

use std::collections::BTreeSet;
use std::sync::Arc;

use plugin_harness::error::BoxError;
use plugin_harness::ports::{ProcessingContext, Processor, RoundInfo};
use plugin_harness::{
    Comparison, FsError, HarnessConfig, HarnessError, Location, ProcessingOrchestrator, Resources,
    Task, Validator, VirtualFileSystem, ALL_KINDS,
};

#[test]
fn listing_a_package_returns_its_seeded_file() {
    let store = VirtualFileSystem::new();
    store.seed(&Location::Source, "a.b", "Foo.txt", "hello").unwrap();
    store.seed(&Location::Source, "a.b.c", "Nested.txt", "deeper").unwrap();

    let listed = store.list(&Location::Source, "a.b", &ALL_KINDS, false).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].path(), "SOURCE/a/b/Foo.txt");
    assert_eq!(listed[0].text(), "hello");
}

#[test]
fn generated_output_is_validated_against_references() {
    let store = Arc::new(VirtualFileSystem::new());
    ProcessingOrchestrator::new()
        .with_file_system(Arc::clone(&store))
        .task(Task::once(|env| {
            env.write_output(&Location::ClassOutput, "gen", "Out.txt", "generated")?;
            Ok(())
        }))
        .run()
        .unwrap();

    let resources = Resources::in_memory().with("same.txt", "generated").with("other.txt", "other");
    let validator = Validator::new(store.as_ref(), &resources);
    validator
        .expect_generated(&Location::ClassOutput, "gen/Out.txt", "same.txt", Comparison::Bytes)
        .unwrap();

    let err = validator
        .expect_generated(&Location::ClassOutput, "gen/Out.txt", "other.txt", Comparison::Text)
        .unwrap_err();
    assert!(err.to_string().contains("CLASS_OUTPUT/gen/Out.txt"));
    assert!(err.to_string().contains("other.txt"));
}

#[test]
fn reentrant_routine_counts_every_round() {
    let report = ProcessingOrchestrator::new()
        .min_rounds(3)
        .task(Task::reentrant(|env| Ok(env.invocation_count())))
        .run()
        .unwrap();
    assert_eq!(report.rounds, 3);
    assert_eq!(report.value, Some(3));
    assert_eq!(report.executions, 3);
}

#[test]
fn non_reentrant_routine_runs_once_across_rounds() {
    let report = ProcessingOrchestrator::new()
        .min_rounds(4)
        .task(Task::once(|env| Ok(env.round().number())))
        .run()
        .unwrap();
    assert_eq!(report.invocations, 4);
    assert_eq!(report.executions, 1);
    assert_eq!(report.value, Some(1));
}

#[derive(Debug, thiserror::Error)]
#[error("plugin rejected element {0}")]
struct Rejected(String);

#[test]
fn routine_errors_surface_with_their_original_type() {
    let err = ProcessingOrchestrator::new()
        .task(Task::<()>::once(|_| Err(Rejected("a.A".into()).into())))
        .run()
        .unwrap_err();
    let rejected = err.downcast_ref::<Rejected>().expect("original error type");
    assert_eq!(rejected.0, "a.A");
}

#[test]
#[should_panic(expected = "routine blew up")]
fn routine_panics_resume_on_the_caller() {
    let _ = ProcessingOrchestrator::new()
        .task(Task::<()>::once(|_| panic!("routine blew up")))
        .run();
}

#[test]
fn warnings_as_errors_fail_the_compilation() {
    let err = ProcessingOrchestrator::new()
        .options(["-Aunknown=1", "-Werror"])
        .task(Task::once(|_| Ok(())))
        .run()
        .unwrap_err();
    match err.downcast_ref::<HarnessError>() {
        Some(HarnessError::CompilationFailed { diagnostics }) => {
            assert!(diagnostics.iter().any(|d| d.message.contains("-Werror")));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn generated_sources_feed_the_next_round() {
    let report = ProcessingOrchestrator::new()
        .task(Task::reentrant(|env| {
            if env.round().number() == 1 {
                let source = "@x.Made class Made {}";
                env.write_output(&Location::SourceOutput, "gen", "Made.java", source)?;
            }
            Ok(env.round().root_elements().iter().map(|root| root.name.clone()).collect::<Vec<_>>())
        }))
        .run()
        .unwrap();
    // Round 2 carries the generated class, round 3 is the final empty round.
    assert_eq!(report.rounds, 3);
    assert!(report.value.unwrap().is_empty());
}

struct Generator;

impl Processor for Generator {
    fn supported_annotation_types(&self) -> BTreeSet<String> {
        ["x.Gen".to_string()].into()
    }

    fn init(&mut self, _context: &ProcessingContext) {}

    fn process(
        &mut self,
        annotations: &BTreeSet<String>,
        round: &RoundInfo,
    ) -> Result<bool, BoxError> {
        Ok(!annotations.is_empty() && !round.processing_over())
    }
}

#[test]
fn task_and_plugin_share_the_run() {
    let report = ProcessingOrchestrator::new()
        .root_class("a.A", ["x.Gen"])
        .plugin(Generator)
        .task(Task::once(|env| {
            let claimed = env.run_plugin()?;
            Ok((claimed, env.plugin().map(Processor::name)))
        }))
        .run()
        .unwrap();
    let (claimed, name) = report.value.unwrap();
    assert!(claimed);
    assert!(name.unwrap().ends_with("Generator"));
}

#[test]
fn closed_store_rejects_runs() {
    let store = Arc::new(VirtualFileSystem::new());
    store.seed(&Location::Source, "a", "A.java", "@x.A class A {}").unwrap();
    store.close();
    let err = ProcessingOrchestrator::new()
        .with_file_system(store)
        .root_file(Location::Source, "a", "A.java")
        .task(Task::once(|_| Ok(())))
        .run()
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HarnessError>(),
        Some(HarnessError::Fs(FsError::ClosedFileSystem))
    ));
}

#[test]
fn configuration_drives_the_orchestrator() {
    let config =
        HarnessConfig::from_yaml_str("min_rounds: 2\noptions: [\"-Amode=fast\"]\n").unwrap();
    let report = ProcessingOrchestrator::from_config(&config)
        .task(Task::reentrant(|env| Ok(env.options().get("mode").cloned())))
        .run()
        .unwrap();
    assert_eq!(report.rounds, 2);
    assert_eq!(report.value.flatten().as_deref(), Some("fast"));
}
