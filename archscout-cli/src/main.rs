use anyhow::{bail, Context, Result};
use archscout::config::CliOverrides;
use archscout::{
    search, CancellationToken, DirArchive, Dispatcher, MemoryArchive, SearchConfig,
    SearchMetrics, SearchOutput, SearchParameters,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs::File;
use std::io::BufReader;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct CliSearchArgs {
    /// Pattern to search for
    #[arg(short = 'p', long = "pattern")]
    pattern: String,

    /// Directory or .zip archive to search
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Treat the pattern as a regular expression
    #[arg(short = 'r', long = "regex")]
    is_regex: bool,

    /// Match whole words only
    #[arg(short = 'w', long = "word")]
    word: bool,

    /// Match case exactly (ASCII folding is used otherwise)
    #[arg(short = 'c', long = "case-sensitive")]
    case_sensitive: bool,

    /// Number of scanning workers
    #[arg(short = 'j', long)]
    workers: Option<NonZeroUsize>,

    /// Skip files larger than this many bytes
    #[arg(long)]
    max_file_size: Option<u64>,

    /// File extensions to include (e.g. rs,go,js)
    #[arg(short = 'e', long)]
    extensions: Option<String>,

    /// Patterns to ignore (glob format)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Give up after this long (e.g. 500ms, 10s)
    #[arg(long)]
    timeout: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Show only statistics, not matches
    #[arg(short, long)]
    stats: bool,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a directory tree or zip archive
    Search(Box<CliSearchArgs>),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => run_search(*args),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A second init (e.g. in tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_search(args: CliSearchArgs) -> Result<()> {
    let overrides = CliOverrides {
        workers: args.workers,
        max_file_size: args.max_file_size,
        file_extensions: args.extensions.as_ref().map(|e| {
            e.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        }),
        ignore_patterns: args.ignore.clone(),
        timeout: args.timeout.clone(),
        log_level: args.log_level.clone(),
    };
    let config = SearchConfig::load_from(args.config.as_deref())
        .context("failed to load configuration")?
        .merge_with_cli(overrides);
    init_tracing(&config.log_level);
    debug!(?config, "effective configuration");

    let params = SearchParameters {
        pattern: args.pattern.clone(),
        is_regexp: args.is_regex,
        is_case_sensitive: args.case_sensitive,
        is_word_match: args.word,
    };

    let ctx = match config.timeout()? {
        Some(timeout) => CancellationToken::with_timeout(timeout),
        None => CancellationToken::new(),
    };
    let metrics = SearchMetrics::new();
    let dispatcher = Dispatcher::from_config(&config).with_recorder(Arc::new(metrics.clone()));

    let output = if is_zip(&args.path) {
        let file = File::open(&args.path)
            .with_context(|| format!("failed to open {}", args.path.display()))?;
        let archive = MemoryArchive::from_zip(BufReader::new(file), config.max_file_size)?;
        search(&ctx, &params, &archive, &dispatcher)?
    } else {
        let archive = DirArchive::open(&args.path, &config)?;
        search(&ctx, &params, &archive, &dispatcher)?
    };
    metrics.log_stats();

    if ctx.is_cancelled() {
        warn!("search cancelled before completion, results are partial");
    }

    if args.json {
        print_json(&output)?;
    } else {
        print_search_results(&output, args.stats);
    }

    match &output.error {
        Some(err) if output.file_matches.is_empty() => bail!("search failed: {}", err),
        Some(err) => {
            eprintln!("{} {}", "warning: results are incomplete:".yellow(), err);
            Ok(())
        }
        None => Ok(()),
    }
}

fn is_zip(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
}

fn print_json(output: &SearchOutput) -> Result<()> {
    let value = serde_json::json!({
        "fileMatches": output.file_matches,
        "outcome": output.outcome,
        "error": output.error.as_ref().map(|e| e.to_string()),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_search_results(output: &SearchOutput, stats_only: bool) {
    if !stats_only {
        for fm in &output.file_matches {
            println!("\n{}", fm.path.blue());
            for lm in &fm.line_matches {
                println!(
                    "{}: {}",
                    (lm.line_number + 1).to_string().green(),
                    highlight(&lm.preview, &lm.offset_and_lengths)
                );
            }
        }
    }

    println!(
        "\nFound {} matches in {} files",
        output.total_line_matches(),
        output.file_matches.len()
    );
}

/// Highlights match ranges; ranges that do not fall on char boundaries are left plain.
///
/// Offsets index the raw line bytes, so a preview that went through lossy decoding is printed
/// as is.
fn highlight(line: &str, offsets: &[(usize, usize)]) -> String {
    if line.contains(char::REPLACEMENT_CHARACTER) {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for &(start, len) in offsets {
        let end = start + len;
        if start < last
            || end > line.len()
            || !line.is_char_boundary(start)
            || !line.is_char_boundary(end)
        {
            continue;
        }
        out.push_str(&line[last..start]);
        out.push_str(&line[start..end].red().bold().to_string());
        last = end;
    }
    out.push_str(&line[last..]);
    out
}
