//! Directory processor: walks pandoc HTML output and rewrites each file.

use crate::css::{CSS_MARKER, generate_theme_css};
use crate::html::{FallbackPolicy, SOURCE_CODE_CLASS, TransformError, TransformOptions, transform_html};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use verdure::{GrammarStore, HighlightOptions, Highlighter};
use walkdir::WalkDir;

/// Options for the processor.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Input directory containing pandoc HTML output.
    pub input_dir: PathBuf,
    /// Output directory (if None, modifies in place).
    pub output_dir: Option<PathBuf>,
    /// Candidate-selection and failure policy for each block.
    pub policy: FallbackPolicy,
    /// Whether to inject the theme stylesheet into rewritten documents.
    pub inject_css: bool,
    /// Whether to show verbose output.
    pub verbose: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output_dir: None,
            policy: FallbackPolicy::default(),
            inject_css: true,
            verbose: false,
        }
    }
}

/// Statistics from processing.
#[derive(Debug, Default)]
pub struct ProcessorStats {
    /// Number of HTML files processed.
    pub files_processed: usize,
    /// Number of HTML files skipped because they were already highlighted.
    pub files_already_highlighted: usize,
    /// Number of code blocks highlighted.
    pub blocks_highlighted: usize,
    /// Number of code blocks skipped.
    pub blocks_skipped: usize,
    /// Languages that were not supported.
    pub unsupported_languages: Vec<String>,
    /// Total bytes read from input HTML files.
    pub bytes_input: u64,
    /// Total bytes written to output HTML files.
    pub bytes_output: u64,
    /// Time spent processing HTML files (excludes copy time).
    pub process_duration: Duration,
}

impl ProcessorStats {
    /// Processing throughput in MB/s (excludes copy time).
    pub fn throughput_mb_s(&self) -> f64 {
        let secs = self.process_duration.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            (self.bytes_input as f64 / (1024.0 * 1024.0)) / secs
        }
    }
}

/// Processor for pandoc HTML output directories.
pub struct Processor {
    options: ProcessOptions,
}

impl Processor {
    /// Create a new processor with the given options.
    pub fn new(options: ProcessOptions) -> Self {
        Self { options }
    }

    /// Process the directory.
    pub fn process(&mut self) -> Result<ProcessorStats, ProcessError> {
        let output_dir = self
            .options
            .output_dir
            .as_ref()
            .unwrap_or(&self.options.input_dir)
            .clone();

        if let Some(ref out) = self.options.output_dir
            && out != &self.options.input_dir
        {
            if out.exists() {
                fs::remove_dir_all(out)?;
            }

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .map_err(|e| ProcessError::Progress(e.to_string()))?,
            );
            spinner.set_message("Copying directory tree...");
            spinner.enable_steady_tick(Duration::from_millis(80));

            copy_tree(&self.options.input_dir, out)?;

            spinner.finish_with_message("Copy complete");
        }

        let html_files: Vec<PathBuf> = WalkDir::new(&output_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "html"))
            .map(|e| e.path().to_path_buf())
            .collect();

        let store = Arc::new(GrammarStore::new());

        let progress = ProgressBar::new(html_files.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
                .map_err(|e| ProcessError::Progress(e.to_string()))?
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );

        let process_start = Instant::now();

        let files_processed = AtomicUsize::new(0);
        let files_already_highlighted = AtomicUsize::new(0);
        let blocks_highlighted = AtomicUsize::new(0);
        let blocks_skipped = AtomicUsize::new(0);
        let bytes_input = AtomicUsize::new(0);
        let bytes_output = AtomicUsize::new(0);
        let unsupported_languages = Mutex::new(Vec::<String>::new());

        let transform_options = TransformOptions {
            policy: self.options.policy,
            css: self.options.inject_css.then(generate_theme_css),
        };
        let verbose = self.options.verbose;

        // One highlighter per rayon worker thread, all sharing the store
        html_files.par_iter().for_each_init(
            || Highlighter::with_store_and_options(store.clone(), HighlightOptions::fast()),
            |highlighter, path| {
                if verbose {
                    tracing::info!(path = %path.display(), "processing");
                }

                match process_file(path, highlighter, &transform_options) {
                    Ok(FileOutcome::AlreadyHighlighted) => {
                        files_already_highlighted.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(FileOutcome::Processed {
                        result,
                        input_size,
                        output_size,
                    }) => {
                        files_processed.fetch_add(1, Ordering::Relaxed);
                        blocks_highlighted.fetch_add(result.blocks_highlighted, Ordering::Relaxed);
                        blocks_skipped.fetch_add(result.blocks_skipped, Ordering::Relaxed);
                        bytes_input.fetch_add(input_size, Ordering::Relaxed);
                        bytes_output.fetch_add(output_size, Ordering::Relaxed);

                        if !result.unsupported_languages.is_empty() {
                            let mut langs = unsupported_languages
                                .lock()
                                .unwrap_or_else(|e| e.into_inner());
                            for lang in result.unsupported_languages {
                                if !langs.contains(&lang) {
                                    langs.push(lang);
                                }
                            }
                        }
                    }
                    Err(e) => {
                        progress.println(format!(
                            "Warning: Failed to process {}: {}",
                            path.display(),
                            e
                        ));
                    }
                }
                progress.inc(1);
            },
        );

        let process_duration = process_start.elapsed();
        progress.finish_and_clear();

        Ok(ProcessorStats {
            files_processed: files_processed.load(Ordering::Relaxed),
            files_already_highlighted: files_already_highlighted.load(Ordering::Relaxed),
            blocks_highlighted: blocks_highlighted.load(Ordering::Relaxed),
            blocks_skipped: blocks_skipped.load(Ordering::Relaxed),
            unsupported_languages: unsupported_languages
                .into_inner()
                .unwrap_or_else(|e| e.into_inner()),
            bytes_input: bytes_input.load(Ordering::Relaxed) as u64,
            bytes_output: bytes_output.load(Ordering::Relaxed) as u64,
            process_duration,
        })
    }
}

/// Outcome of processing one file.
enum FileOutcome {
    /// File already carried the stylesheet marker from an earlier run.
    AlreadyHighlighted,
    Processed {
        result: crate::html::TransformResult,
        input_size: usize,
        output_size: usize,
    },
}

fn process_file(
    path: &Path,
    highlighter: &Highlighter,
    options: &TransformOptions,
) -> Result<FileOutcome, ProcessError> {
    let html = fs::read_to_string(path)?;
    let input_size = html.len();

    // Re-running over our own output would re-highlight already rewritten
    // markup; the stylesheet marker tells us the file is done
    if html.contains(CSS_MARKER) {
        return Ok(FileOutcome::AlreadyHighlighted);
    }

    // Quick substring check to avoid HTML parsing for files with no code blocks
    let worth_parsing = match options.policy {
        FallbackPolicy::TryEach => html.contains(SOURCE_CODE_CLASS),
        FallbackPolicy::WholeClass => html.contains("<pre"),
    };
    if !worth_parsing {
        return Ok(FileOutcome::Processed {
            result: Default::default(),
            input_size,
            output_size: input_size,
        });
    }

    let (transformed, result) = transform_html(&html, highlighter, options)?;
    let output_size = transformed.len();

    // Only write if we actually changed something
    if result.blocks_highlighted > 0 {
        fs::write(path, &transformed)?;
    }

    Ok(FileOutcome::Processed {
        result,
        input_size,
        output_size,
    })
}

/// Recursively copy `src` into `dst`, preserving directory structure and
/// symlinks.
fn copy_tree(src: &Path, dst: &Path) -> Result<(), ProcessError> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| ProcessError::Io(std::io::Error::other(e.to_string())))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| ProcessError::Io(std::io::Error::other(e.to_string())))?;
        let target = dst.join(relative);

        if entry.path_is_symlink() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            copy_symlink(entry.path(), &target)?;
        } else if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Recreate a symlink at `target`. Broken links are recreated as-is rather
/// than aborting the copy.
#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), ProcessError> {
    let dest = fs::read_link(link)?;
    std::os::unix::fs::symlink(dest, target)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), ProcessError> {
    // Creating symlinks needs elevated rights here; copy the contents and
    // skip links that do not resolve
    if let Err(e) = fs::copy(link, target) {
        tracing::warn!(link = %link.display(), error = %e, "could not copy symlink");
    }
    Ok(())
}

/// Errors that can occur during processing.
#[derive(Debug)]
pub enum ProcessError {
    /// IO error.
    Io(std::io::Error),
    /// HTML transformation error.
    Transform(TransformError),
    /// Progress bar template error.
    Progress(String),
}

impl From<std::io::Error> for ProcessError {
    fn from(e: std::io::Error) -> Self {
        ProcessError::Io(e)
    }
}

impl From<TransformError> for ProcessError {
    fn from(e: TransformError) -> Self {
        ProcessError::Transform(e)
    }
}

impl std::fmt::Display for ProcessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessError::Io(e) => write!(f, "IO error: {}", e),
            ProcessError::Transform(e) => write!(f, "transform error: {}", e),
            ProcessError::Progress(msg) => write!(f, "progress template error: {}", msg),
        }
    }
}

impl std::error::Error for ProcessError {}
