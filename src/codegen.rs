//! Model generation driver.
//!
//! Iterates every model definition in a [`SpecDocument`], builds its
//! [`ModelDescriptor`], and emits three kinds of artifacts through a
//! [`Renderer`] and an [`OutputSink`]:
//! - one base module per model, rewritten on every run
//! - one override module per model, written only when absent
//! - one index module listing every generated model
//!
//! Base output is deterministic: identical input always produces
//! byte-identical base and index artifacts.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::descriptor::{ModelDescriptor, build_model_descriptor};
use crate::emit::{IndexEntry, JsRenderer, Renderer};
use crate::error::{Error, Result};
use crate::schema::{SpecDocument, model_name};
use crate::settings::Settings;

/// Statistics collected during generation for reporting.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerationStats {
    pub models_generated: usize,
    pub models_skipped: usize,
    pub overrides_created: usize,
    pub overrides_preserved: usize,
    /// Definitions without the model marker.
    pub definitions_ignored: usize,
}

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Destination of generated artifacts.
pub trait OutputSink {
    /// Whether an artifact already exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Write an artifact, replacing any previous content.
    fn write(&self, path: &Path, content: &str) -> Result<()>;
}

/// Writes artifacts to the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSink;

impl OutputSink for FsSink {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        write_file(path, content)
    }
}

/// Generates all models of a document into one output directory.
pub struct Generator<'a> {
    settings: &'a Settings,
    output_dir: PathBuf,
    renderer: Box<dyn Renderer + 'a>,
    sink: Box<dyn OutputSink + 'a>,
    clock: Box<dyn Clock + 'a>,
}

impl<'a> Generator<'a> {
    /// A generator using the JavaScript renderer, the file system, and the
    /// system clock.
    pub fn new(settings: &'a Settings, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            output_dir: output_dir.into(),
            renderer: Box::new(JsRenderer::new(settings.clone())),
            sink: Box::new(FsSink),
            clock: Box::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: impl Renderer + 'a) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: impl OutputSink + 'a) -> Self {
        self.sink = Box::new(sink);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'a) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Generate every model of `doc`.
    ///
    /// Models without a resolvable identity attribute or without properties
    /// are skipped with a warning. Any other failure (discriminator mapping
    /// defects, dangling references, I/O errors) aborts the run.
    pub fn run(&self, doc: &SpecDocument) -> Result<GenerationStats> {
        let mut stats = GenerationStats::default();
        let mut index: Vec<IndexEntry> = Vec::new();

        for (key, schema) in doc.schemas()? {
            let resolved = doc.resolve(schema)?;
            if model_name(resolved, self.settings).is_none() {
                tracing::debug!(definition = %key, "no model marker, ignoring");
                stats.definitions_ignored += 1;
                continue;
            }

            let Some(model) = build_model_descriptor(doc, self.settings, resolved)? else {
                stats.models_skipped += 1;
                continue;
            };

            self.emit_model(&model, &mut stats)?;

            let entry = IndexEntry {
                file_name: model.name.clone(),
                name: model.name.clone(),
            };
            if index.iter().any(|e| e.name == entry.name) {
                tracing::warn!(
                    model = %model.name,
                    "model generated more than once, keeping the last"
                );
            } else {
                index.push(entry);
            }
        }

        let index_path = self.output_dir.join(self.settings.index_file_name());
        self.sink
            .write(&index_path, &self.renderer.render_index(&index)?)?;

        tracing::info!(
            generated = stats.models_generated,
            skipped = stats.models_skipped,
            "generation finished"
        );
        Ok(stats)
    }

    fn emit_model(&self, model: &ModelDescriptor, stats: &mut GenerationStats) -> Result<()> {
        let base_path = self
            .output_dir
            .join(self.settings.base_file_name(&model.name));
        self.sink
            .write(&base_path, &self.renderer.render_base(model)?)?;
        stats.models_generated += 1;

        let override_path = self
            .output_dir
            .join(self.settings.override_file_name(&model.name));
        if self.sink.exists(&override_path) {
            tracing::debug!(path = %override_path.display(), "override exists, leaving untouched");
            stats.overrides_preserved += 1;
        } else {
            let content = self.renderer.render_override(model, self.clock.now())?;
            self.sink.write(&override_path, &content)?;
            stats.overrides_created += 1;
        }

        tracing::info!(model = %model.name, path = %base_path.display(), "generated model");
        Ok(())
    }
}

/// Generate every model of `doc` into `output_dir` with the default
/// renderer, the file system, and the system clock.
pub fn generate(
    doc: &SpecDocument,
    settings: &Settings,
    output_dir: &Path,
) -> Result<GenerationStats> {
    Generator::new(settings, output_dir).run(doc)
}

/// Build the descriptor of the model named `model` without writing anything.
///
/// The name is matched against the model marker first, then against the
/// definition key.
pub fn describe(
    doc: &SpecDocument,
    settings: &Settings,
    model: &str,
) -> Result<Option<ModelDescriptor>> {
    let schemas = doc.schemas()?;
    let mut by_key = None;
    for (key, schema) in schemas {
        let resolved = doc.resolve(schema)?;
        if model_name(resolved, settings) == Some(model) {
            return build_model_descriptor(doc, settings, resolved);
        }
        if key == model && by_key.is_none() {
            by_key = Some(resolved);
        }
    }
    match by_key {
        Some(schema) => build_model_descriptor(doc, settings, schema),
        None => Ok(None),
    }
}

/// Write content to a file, creating parent directories as needed.
fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, content).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
