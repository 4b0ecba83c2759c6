//! A host compiler stand-in that issues processing rounds.
//!
//! Round 1 carries the request's root elements. Each later round carries the
//! source files generated into `SOURCE_OUTPUT` during the round before it.
//! Empty rounds are padded until `min_rounds` is reached, and the last round
//! is flagged `processing_over` with no root elements.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::diagnostics::Diagnostics;
use crate::path::{self, FileKind, Location};
use crate::ports::compiler::{CompilationReport, CompilationRequest, Compiler};
use crate::ports::file_manager::FileManager;
use crate::ports::processor::{
    filter_supported, ProcessingContext, Processor, RootElement, RoundInfo,
};

/// Runs processing on a dedicated worker thread, the way a real host does.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedCompiler;

impl SimulatedCompiler {
    /// Creates a simulated compiler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Compiler for SimulatedCompiler {
    fn compile(&self, request: CompilationRequest) -> CompilationReport {
        let diagnostics = Arc::clone(&request.diagnostics);
        let worker = std::thread::Builder::new()
            .name("compiler-worker".to_string())
            .spawn(move || run(request));
        match worker {
            Ok(handle) => match handle.join() {
                Ok(report) => report,
                Err(payload) => std::panic::resume_unwind(payload),
            },
            Err(err) => {
                diagnostics.error(format!("could not start compiler worker: {err}"));
                CompilationReport { success: false, rounds: 0 }
            }
        }
    }
}

struct Slot {
    processor: Box<dyn Processor>,
    supported: BTreeSet<String>,
    discovered: bool,
}

/// Splits raw options into `-A` plugin options and the `-Werror` flag.
fn parse_options(options: &[String]) -> (BTreeMap<String, String>, bool) {
    let mut parsed = BTreeMap::new();
    let mut werror = false;
    for option in options {
        if let Some(body) = option.strip_prefix("-A") {
            let (key, value) = body.split_once('=').unwrap_or((body, ""));
            parsed.insert(key.to_string(), value.to_string());
        } else if option == "-Werror" {
            werror = true;
        } else {
            tracing::debug!(option = %option, "ignoring compiler option");
        }
    }
    (parsed, werror)
}

/// Collects `@Name` tokens, skipping `@interface`.
pub(crate) fn scan_annotations(text: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let mut rest = text;
    while let Some(at) = rest.find('@') {
        rest = &rest[at + 1..];
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.' || c == '$'))
            .unwrap_or(rest.len());
        let name = rest[..end].trim_end_matches('.');
        if !name.is_empty() && name != "interface" {
            found.insert(name.to_string());
        }
        rest = &rest[end..];
    }
    found
}

fn run(request: CompilationRequest) -> CompilationReport {
    let CompilationRequest {
        options,
        roots,
        processors,
        file_manager,
        diagnostics,
        source_version,
        min_rounds,
        max_rounds,
    } = request;
    let (plugin_options, werror) = parse_options(&options);
    let context = ProcessingContext {
        options: plugin_options.clone(),
        file_manager: Arc::clone(&file_manager),
        diagnostics: Arc::clone(&diagnostics),
        source_version,
    };

    let mut slots: Vec<Slot> = processors
        .into_iter()
        .map(|mut processor| {
            processor.init(&context);
            let supported = processor.supported_annotation_types();
            if processor.supported_source_version() < source_version {
                diagnostics.warning(format!(
                    "supported source version '{}' from plugin '{}' less than -source '{}'",
                    processor.supported_source_version(),
                    processor.name(),
                    source_version
                ));
            }
            Slot { processor, supported, discovered: false }
        })
        .collect();

    report_unrecognized_options(&slots, &plugin_options, &diagnostics);

    let mut seen = generated_sources(file_manager.as_ref());
    let mut pending = roots;
    let mut number = 0;
    let mut aborted = false;
    loop {
        number += 1;
        let processing_over = pending.is_empty() && number >= min_rounds;
        let round = RoundInfo::new(
            number,
            std::mem::take(&mut pending),
            processing_over,
            diagnostics.has_errors(),
        );
        tracing::debug!(
            round = number,
            roots = round.root_elements().len(),
            processing_over,
            "starting round"
        );
        if !run_round(&mut slots, &round, &diagnostics) {
            aborted = true;
            break;
        }
        if processing_over {
            break;
        }
        if number >= max_rounds {
            diagnostics.error(format!("processing did not finish within {max_rounds} rounds"));
            aborted = true;
            break;
        }
        pending = new_roots(file_manager.as_ref(), &mut seen);
    }

    if !aborted {
        for late in new_roots(file_manager.as_ref(), &mut seen) {
            diagnostics.warning(format!(
                "file for type '{}' created in the last round will not be subject to \
                 annotation processing",
                late.name
            ));
        }
    }

    if werror && !diagnostics.warnings().is_empty() {
        diagnostics.error("warnings found and -Werror specified");
    }
    let success = !aborted && !diagnostics.has_errors();
    tracing::info!(rounds = number, success, "compilation finished");
    CompilationReport { success, rounds: number }
}

/// Runs every interested processor on one round. Returns `false` to abort.
fn run_round(slots: &mut [Slot], round: &RoundInfo, diagnostics: &Diagnostics) -> bool {
    let mut unclaimed = round.annotations_present();
    for slot in slots.iter_mut() {
        let matched = filter_supported(&slot.supported, &unclaimed);
        let interested = slot.discovered || slot.supported.contains("*") || !matched.is_empty();
        if !interested {
            continue;
        }
        slot.discovered = true;
        match slot.processor.process(&matched, round) {
            Ok(true) => {
                for annotation in &matched {
                    unclaimed.remove(annotation);
                }
            }
            Ok(false) => {}
            Err(err) => {
                diagnostics.error(format!(
                    "plugin '{}' failed in round {}: {err}",
                    slot.processor.name(),
                    round.number()
                ));
                return false;
            }
        }
    }
    true
}

fn report_unrecognized_options(
    slots: &[Slot],
    options: &BTreeMap<String, String>,
    diagnostics: &Diagnostics,
) {
    if slots.is_empty() {
        return;
    }
    let recognized: BTreeSet<String> =
        slots.iter().flat_map(|slot| slot.processor.supported_options()).collect();
    let unrecognized: Vec<&str> =
        options.keys().filter(|key| !recognized.contains(*key)).map(String::as_str).collect();
    if !unrecognized.is_empty() {
        diagnostics.warning(format!(
            "the following options were not recognized by any plugin: '[{}]'",
            unrecognized.join(", ")
        ));
    }
}

fn generated_sources(file_manager: &dyn FileManager) -> BTreeSet<String> {
    file_manager
        .list(&Location::SourceOutput, "", &[FileKind::Source], true)
        .map(|entries| entries.into_iter().map(|e| e.path).collect())
        .unwrap_or_default()
}

/// Root elements for sources generated since the last call.
fn new_roots(file_manager: &dyn FileManager, seen: &mut BTreeSet<String>) -> Vec<RootElement> {
    let prefix = path::package_prefix(&Location::SourceOutput, "");
    let mut roots = Vec::new();
    for generated in generated_sources(file_manager) {
        if !seen.insert(generated.clone()) {
            continue;
        }
        let relative = generated.strip_prefix(&prefix).unwrap_or(&generated);
        let (package, name) = path::split_relative(relative);
        let annotations = match file_manager.open_input(&Location::SourceOutput, &package, &name) {
            Ok(input) => scan_annotations(&input.text()),
            Err(err) => {
                tracing::warn!(
                    path = %generated,
                    error = %err,
                    "generated source vanished before the next round"
                );
                continue;
            }
        };
        let class_name = relative
            .strip_suffix(FileKind::Source.extension())
            .unwrap_or(relative)
            .replace('/', ".");
        roots.push(RootElement { name: class_name, annotations });
    }
    roots
}
