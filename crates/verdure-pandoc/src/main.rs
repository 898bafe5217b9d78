//! verdure-pandoc CLI - highlight code blocks in pandoc HTML output.

use anyhow::{Result, bail};
use clap::Parser;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use verdure_pandoc::{FallbackPolicy, ProcessOptions, Processor};

/// Post-process pandoc HTML output to add syntax highlighting to code blocks.
///
/// Finds `<pre class="sourceCode LANG"><code>` blocks in every HTML file
/// under the input directory and replaces their content with tree-sitter
/// based highlighting.
#[derive(Debug, Parser)]
#[command(name = "verdure-pandoc", version)]
struct Args {
    /// Input directory containing pandoc HTML output
    input: PathBuf,

    /// Output directory (defaults to modifying input in place)
    output: Option<PathBuf>,

    /// Treat the whole class attribute as one language name and fail on the
    /// first block that cannot be highlighted
    #[arg(long)]
    strict: bool,

    /// Do not inject the theme stylesheet into rewritten documents
    #[arg(long)]
    no_css: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if !args.input.exists() {
        bail!("Input directory does not exist: {}", args.input.display());
    }
    if !args.input.is_dir() {
        bail!("Input path is not a directory: {}", args.input.display());
    }

    let options = ProcessOptions {
        input_dir: args.input.clone(),
        output_dir: args.output.clone(),
        policy: if args.strict {
            FallbackPolicy::WholeClass
        } else {
            FallbackPolicy::TryEach
        },
        inject_css: !args.no_css,
        verbose: args.verbose,
    };

    let mut processor = Processor::new(options);

    eprintln!(
        "{} Processing pandoc output: {}",
        "verdure-pandoc".green().bold(),
        args.input.display()
    );

    if let Some(out) = &args.output {
        eprintln!("  Output: {}", out.display());
    } else {
        eprintln!("  {} Modifying in place", "Note:".yellow());
    }

    eprintln!();

    let start = Instant::now();
    let stats = processor.process()?;
    let elapsed = start.elapsed();

    eprintln!("{}", "Results:".bold());
    eprintln!(
        "  {} HTML files processed",
        stats.files_processed.to_string().cyan()
    );
    if stats.files_already_highlighted > 0 {
        eprintln!(
            "  {} files already highlighted (skipped)",
            stats.files_already_highlighted.to_string().cyan()
        );
    }
    eprintln!(
        "  {} code blocks highlighted",
        stats.blocks_highlighted.to_string().green()
    );
    eprintln!(
        "  {} code blocks skipped",
        stats.blocks_skipped.to_string().yellow()
    );

    if !stats.unsupported_languages.is_empty() {
        eprintln!(
            "\n  {} Unsupported languages: {}",
            "Note:".yellow(),
            stats.unsupported_languages.join(", ")
        );
    }

    eprintln!(
        "\n  Completed in {:.2}s ({:.1} MB/s)",
        elapsed.as_secs_f64(),
        stats.throughput_mb_s()
    );

    Ok(())
}
