//! CLI binary for doclens-client.
//!
//! A thin shim over the library crate that maps CLI flags onto controller
//! entry points and reports the outcome.

use anyhow::{Context, Result};
use clap::Parser;
use doclens_client::queue::{format_size, read_entries};
use doclens_client::{
    ClientConfig, ConversionController, ConversionObserver, ConversionStatus, HttpTransport,
    Observer, OutputFormat,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Spinner that follows the controller through the busy phase.
struct SpinnerObserver {
    bar: ProgressBar,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        Arc::new(Self::with_bar(ProgressBar::new_spinner()))
    }

    fn with_bar(bar: ProgressBar) -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("DocLens");
        Self { bar }
    }
}

impl ConversionObserver for SpinnerObserver {
    fn on_status_change(&self, _from: ConversionStatus, to: ConversionStatus) {
        if to.is_busy() {
            self.bar.enable_steady_tick(Duration::from_millis(80));
            self.bar.set_message(to.message());
        }
    }

    fn on_request_start(&self, file_count: usize, total_bytes: u64) {
        self.bar.println(format!(
            "{} Sending {} file(s), {}",
            dim("◆"),
            file_count,
            format_size(total_bytes)
        ));
    }

    fn on_completed(&self, filename: &str, size: u64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} {}",
            green("✔"),
            bold(filename),
            dim(&format!("({})", format_size(size)))
        );
    }

    /// The error returned from `main` carries the message.
    fn on_failed(&self, _message: &str) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One photo to Word (saved as receipt.docx in the current directory)
  doclens receipt.jpg

  # Several scans merged into one PDF (saved as page1_and_2_more.pdf)
  doclens page1.png page2.png page3.png --format pdf -o out/

  # Plain text from a scanned PDF, against a remote service
  doclens --api-url https://doclens.example.com contract.pdf -f txt

  # Is the service up?
  doclens --check

SUPPORTED INPUTS:
  Images  .jpg .jpeg .jfif .png .webp .gif .bmp .tif .tiff
  PDF     .pdf (every page is rendered and read)

ENVIRONMENT VARIABLES:
  DOCLENS_API_URL        Conversion service base URL (default http://localhost:8000)
  DOCLENS_TIMEOUT_SECS   Whole-request timeout in seconds (default 600)
  RUST_LOG               Override the log filter
"#;

/// Convert images and PDFs into Word, PDF or text documents via the DocLens service.
#[derive(Parser, Debug)]
#[command(
    name = "doclens",
    version,
    about = "Convert images and PDFs into Word, PDF or text documents",
    long_about = "Upload one or more images or PDFs to a DocLens conversion service and save \
the rebuilt document. Multiple inputs are merged, in order, into a single output.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image or PDF files, in the order they should appear.
    #[arg(required_unless_present = "check")]
    files: Vec<PathBuf>,

    /// Output format: docx, pdf or txt.
    #[arg(short, long, env = "DOCLENS_FORMAT", default_value = "docx")]
    format: OutputFormat,

    /// Directory to save the converted document in.
    #[arg(short, long, env = "DOCLENS_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Conversion service base URL.
    #[arg(long, env = "DOCLENS_API_URL", default_value = doclens_client::config::DEFAULT_API_BASE)]
    api_url: String,

    /// Whole-request timeout in seconds.
    #[arg(long, env = "DOCLENS_TIMEOUT_SECS", default_value_t = 600)]
    timeout: u64,

    /// Only check that the service is reachable.
    #[arg(long)]
    check: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "DOCLENS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCLENS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCLENS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; keep INFO logs from
    // tearing through it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.check;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = ClientConfig::builder()
        .api_base(&cli.api_url)
        .request_timeout_secs(cli.timeout)
        .default_format(cli.format)
        .download_dir(&cli.output_dir)
        .build()
        .context("Invalid configuration")?;

    // ── Health check ─────────────────────────────────────────────────────
    if cli.check {
        let transport = HttpTransport::new(&config)?;
        let status = transport
            .ping()
            .await
            .with_context(|| format!("Service at {} is not reachable", config.api_base))?;
        println!("{} {}: {}", green("✔"), config.api_base, status.message);
        return Ok(());
    }

    // ── Read inputs ──────────────────────────────────────────────────────
    let entries = read_entries(&cli.files)
        .await
        .context("Failed to read input files")?;

    if !cli.quiet {
        for e in entries.iter().filter(|e| !e.is_supported()) {
            eprintln!(
                "{} {} has type {}; the service accepts images and PDFs only",
                yellow("⚠"),
                e.name(),
                e.content_type()
            );
        }
    }

    // ── Convert ──────────────────────────────────────────────────────────
    let mut controller = ConversionController::from_config(&config)?;
    if show_progress {
        controller = controller.with_observer(SpinnerObserver::new() as Observer);
    }

    let _ = controller.add_files(entries);
    if !cli.quiet {
        eprintln!(
            "{} {} file(s), {} → {}",
            dim("◆"),
            controller.queue().len(),
            format_size(controller.queue().total_size()),
            controller.format()
        );
    }

    let _ = controller.convert().await;

    match controller.status() {
        ConversionStatus::Completed => {
            let saved = controller
                .download()
                .await
                .context("Failed to save converted document")?;
            println!("{}", saved.display());
            Ok(())
        }
        _ => anyhow::bail!("Conversion failed: {}", controller.error_message()),
    }
}
