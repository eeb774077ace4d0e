mod output;

use clap::Parser;
use depsearch::{
    filters::parse_skip_dirs, scan, ConfigOverrides, ScanConfig, ScanError, TermSet,
};
use output::OutputFormat;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, ScanError>;

/// Exit status for a bad invocation: no terms, bad regex, bad config
const EXIT_CONFIGURATION: u8 = 2;

/// Find ports whose Makefiles match any of a set of regex terms
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root of the ports tree to scan [default: .]
    root: Option<PathBuf>,

    /// File with one regex term per line (falls back to $DEPSEARCH_TERMS)
    #[arg(long)]
    terms: Option<PathBuf>,

    /// Additional regex term (can be specified multiple times)
    #[arg(short = 'e', long = "term")]
    extra_terms: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Number of matcher threads; 0 or less means one per CPU
    #[arg(short = 'j', long, allow_negative_numbers = true)]
    jobs: Option<i64>,

    /// Skip Makefiles larger than this many bytes; 0 or less means 1 MiB
    #[arg(long = "max-size", allow_negative_numbers = true)]
    max_size: Option<i64>,

    /// Print the matching lines under each result
    #[arg(long)]
    show_lines: bool,

    /// Comma-separated directory names to skip (e.g. work,distfiles)
    #[arg(long)]
    skip_dirs: Option<String>,

    /// Log skipped files and per-file diagnostics
    #[arg(short, long)]
    verbose: bool,

    /// Additional configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            terms_path: self.terms.clone(),
            root_path: self.root.clone(),
            workers: self.jobs.map(|n| usize::try_from(n).unwrap_or(0)),
            max_file_size: self.max_size.map(|n| u64::try_from(n).unwrap_or(0)),
            show_lines: self.show_lines,
            skip_dirs: self.skip_dirs.as_deref().map(parse_skip_dirs),
            verbose: self.verbose,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("depsearch: {err}");
            if err.is_configuration() {
                ExitCode::from(EXIT_CONFIGURATION)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = ScanConfig::load_from(cli.config.as_deref())?.merge_with_cli(cli.overrides());
    init_tracing(&config);
    debug!("Effective configuration: {:?}", config);

    let terms = load_terms(&config, &cli.extra_terms)?;
    let outcome = scan(&config, &terms)?;

    let stdout = io::stdout();
    let colorize = stdout.is_terminal();
    let mut out = stdout.lock();
    output::render(cli.format, &outcome.matches, &mut out, colorize)?;
    out.flush()?;

    match outcome.error {
        Some(err) => {
            eprintln!("depsearch: {err}");
            Ok(ExitCode::FAILURE)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}

/// Builds the term set from the configured file plus any `-e` terms.
///
/// `-e` terms alone are enough to run a scan; without them a term file is
/// mandatory.
fn load_terms(config: &ScanConfig, extra_terms: &[String]) -> Result<TermSet> {
    let base = match config.resolve_terms_path() {
        Ok(path) => TermSet::load(&path)?,
        Err(ScanError::TermsNotConfigured) if !extra_terms.is_empty() => TermSet::default(),
        Err(err) => return Err(err),
    };
    base.with_added(extra_terms)
}

fn init_tracing(config: &ScanConfig) {
    let default_level = if config.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
