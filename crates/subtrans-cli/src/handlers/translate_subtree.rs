//! Translate-subtree command handler

use crate::cli::TranslateSubtreeArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::{self, timing::Timer};
use crate::output::OutputWriter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use subtrans_core::{
    JsonRepository, LanguageService, Location, LocationService, NodeReport, SubtreeCollector,
    SubtreeTranslator, TranslationObserver, TranslationOptions, TranslationSummary,
};
use tracing::{debug, info, instrument};

/// Everything a machine-readable run report carries
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Option<String>,
    pub repository: PathBuf,
    pub parent_node_id: u64,
    #[serde(flatten)]
    pub options: TranslationOptions,
    pub max_depth: Option<usize>,
    /// Locations collected in the reference language
    pub collected: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: TranslationSummary,
}

/// Settings after layering flags over the configuration file
#[derive(Debug)]
struct RunSettings {
    repository: PathBuf,
    user_id: u64,
    options: TranslationOptions,
    max_depth: Option<usize>,
}

impl RunSettings {
    fn resolve(args: &TranslateSubtreeArgs, config: &Config) -> Result<Self> {
        let repository = args
            .repository
            .clone()
            .or_else(|| config.repository.path.clone())
            .ok_or(Error::RepositoryNotConfigured)?;
        if !repository.exists() {
            return Err(Error::RepositoryNotFound { path: repository });
        }

        let image_base_path = args
            .image_base_path
            .clone()
            .unwrap_or_else(|| config.images.base_path.clone());

        let options = TranslationOptions::new(&args.reference_language, &args.target_language)
            .escape_translated(args.escape_translated || config.translation.escape_translated)
            .image_base_path(image_base_path);

        Ok(Self {
            repository,
            user_id: args.user_id.unwrap_or(config.repository.user_id),
            options,
            max_depth: args.max_depth.or(config.translation.max_depth),
        })
    }
}

/// Writes each finished node to the output as it happens
struct LineReporter<'o> {
    output: &'o mut OutputWriter,
    error: Option<Error>,
}

impl TranslationObserver for LineReporter<'_> {
    fn node_finished(&mut self, report: &NodeReport) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.output.node_report(report) {
            self.error = Some(e);
        }
    }
}

/// Check every input, reporting each problem on its own line
fn validate_inputs(
    repository: &JsonRepository,
    args: &TranslateSubtreeArgs,
    output: &mut OutputWriter,
) -> Result<Location> {
    let mut problems = Vec::new();

    let root = match repository.load_location(args.parent_node_id) {
        Ok(location) => Some(location),
        Err(err) => {
            debug!(kind = %err.kind(), error = %err, "Parent node lookup failed");
            problems.push(format!("No location with id {}", args.parent_node_id));
            None
        }
    };

    for code in [&args.reference_language, &args.target_language] {
        if let Err(err) = repository.load_language(code) {
            debug!(kind = %err.kind(), error = %err, "Language lookup failed");
            problems.push(format!("No language with code {}", code));
        }
    }

    for problem in &problems {
        output.problem(problem)?;
    }

    match root {
        Some(root) if problems.is_empty() => Ok(root),
        _ => Err(Error::InvalidInput { problems }),
    }
}

/// Handle the translate-subtree command
#[instrument(skip_all, fields(parent_node_id = args.parent_node_id))]
pub fn handle_translate_subtree(
    args: TranslateSubtreeArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details(
        "translate_subtree",
        &format!(
            "{} {} -> {}",
            args.parent_node_id, args.reference_language, args.target_language
        ),
    );

    let settings = RunSettings::resolve(&args, config)?;
    debug!(?settings, "Resolved run settings");
    if !config.output.progress {
        output.disable_progress();
    }

    let repository = JsonRepository::open(&settings.repository, settings.user_id)?;
    let root = validate_inputs(&repository, &args, output)?;

    let started_at = Utc::now();

    let spinner = output.spinner(&format!(
        "Collecting subtree below location {}",
        root.id
    ));
    let collected = SubtreeCollector::new(&repository, settings.options.reference_language.clone())
        .with_max_depth(settings.max_depth)
        .collect(&root);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let tree = collected?;
    let collected = tree.len();
    output.debug(&format!("Collected {} location(s)", collected))?;

    let mut translator = SubtreeTranslator::new(&repository, settings.options.clone());
    let mut reporter = LineReporter {
        output: &mut *output,
        error: None,
    };
    let summary = translator.translate(tree, &mut reporter);
    if let Some(e) = reporter.error {
        return Err(e);
    }

    info!(
        collected,
        translated = summary.translated,
        escaped = summary.escaped,
        failed = summary.failed,
        not_visited = summary.not_visited,
        definition_loads = translator.definition_cache().loads(),
        "Subtree translation finished"
    );

    if output.is_human() {
        output.translated_count(summary.translated)?;
    } else {
        output.data(&RunReport {
            run_id: logging::current_run_id().map(str::to_string),
            repository: settings.repository,
            parent_node_id: args.parent_node_id,
            options: settings.options,
            max_depth: settings.max_depth,
            collected,
            started_at,
            finished_at: Utc::now(),
            summary,
        })?;
    }

    Ok(())
}
