//! CLI binary for aislide.
//!
//! Creates one job, runs it through a worker pool and prints the final job.

use aislide::{
    CommandRenderer, DocumentRenderer, FsArtifactStore, GenerationConfig,
    GenerationProgressCallback, HtmlRenderer, Job, JobStatus, JobStore, MemoryJobStore,
    OverflowPolicy, PoolConfig, ProgressCallback, SlideGenerator, WorkerPool,
};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar plus one log line per finished slide.
struct CliProgressCallback {
    bar: ProgressBar,
    slide_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Planning");
        bar.set_message("Drafting the outline…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            slide_started: Mutex::new(None),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>2}/{len} slides  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Generating");
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_job_start(&self, _job_id: &str, total_slides: usize) {
        self.activate_bar(total_slides);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Generating {total_slides} slides…"))
        ));
    }

    fn on_slide_start(&self, _index: usize, _total: usize, title: &str) {
        if let Ok(mut started) = self.slide_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(title.to_string());
    }

    fn on_slide_complete(&self, index: usize, total: usize, has_image: bool) {
        let elapsed_ms = self
            .slide_started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} Slide {:>2}/{:<2}  {:<7}  {}",
            green("✓"),
            index + 1,
            total,
            dim(if has_image { "image" } else { "" }),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
        if index + 1 == total {
            self.bar.set_prefix("Rendering");
            self.bar.set_message("");
        }
    }

    fn on_job_complete(&self, _job_id: &str, artifact: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} Deck ready: {}", green("✔"), bold(artifact));
    }

    fn on_job_failed(&self, _job_id: &str, error: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} Generation failed: {}", red("✘"), red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Six-slide HTML deck in ./uploads
  aislide "AI in education" -n 6

  # PDF through wkhtmltopdf
  aislide "Renewable energy" --render-ext pdf --render-cmd wkhtmltopdf --quiet - -

  # A specific provider and model
  aislide "Ocean life" --provider openai --model gpt-4.1-mini

  # Machine-readable result
  aislide "Space travel" --json > job.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  GOOGLE_CSE_KEY          Google Custom Search API key (image search)
  GOOGLE_CSE_CX           Google Custom Search engine id (image search)

Without a reachable model every slide uses built-in fallback content; without
Google credentials images come from the stock-photo fallback.
"#;

/// Generate a slide deck from a topic.
#[derive(Parser, Debug)]
#[command(
    name = "aislide",
    version,
    about = "Generate a slide deck from a topic using an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Deck topic, e.g. "AI in education".
    topic: String,

    /// Number of slides (5–20).
    #[arg(short = 'n', long = "slides", env = "AISLIDE_SLIDES", default_value_t = 6,
          value_parser = clap::value_parser!(u16).range(5..=20))]
    slides: u16,

    /// Directory artifacts are written to.
    #[arg(short, long, env = "AISLIDE_OUTPUT_DIR", default_value = "uploads")]
    output_dir: PathBuf,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID (e.g. gpt-4.1-nano).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// External converter reading HTML on stdin and writing the artifact to
    /// stdout, followed by its arguments. Default: keep the HTML.
    #[arg(long, num_args = 1.., allow_hyphen_values = true, value_terminator = ";")]
    render_cmd: Vec<String>,

    /// File extension of artifacts produced by `--render-cmd`.
    #[arg(long, default_value = "pdf")]
    render_ext: String,

    /// Worker tasks (1–5).
    #[arg(long, env = "AISLIDE_WORKERS", default_value_t = 2)]
    workers: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "AISLIDE_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Per-completion timeout in seconds.
    #[arg(long, env = "AISLIDE_API_TIMEOUT", default_value_t = 30)]
    api_timeout: u64,

    /// Renderer timeout in seconds.
    #[arg(long, env = "AISLIDE_RENDER_TIMEOUT", default_value_t = 120)]
    render_timeout: u64,

    /// Google Custom Search API key.
    #[arg(long, env = "GOOGLE_CSE_KEY", hide_env_values = true)]
    google_key: Option<String>,

    /// Google Custom Search engine id.
    #[arg(long, env = "GOOGLE_CSE_CX")]
    google_cx: Option<String>,

    /// Print the final job as JSON.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "AISLIDE_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless -v is given.
    let show_progress = !cli.json && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if show_progress {
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

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress)?;
    let renderer = build_renderer(&cli);

    let jobs = Arc::new(MemoryJobStore::new());
    let artifacts = Arc::new(FsArtifactStore::new(&cli.output_dir));
    let generator = Arc::new(SlideGenerator::from_config(
        &config,
        jobs.clone(),
        artifacts,
        renderer,
    ));

    let pool_config = PoolConfig {
        workers: cli.workers,
        overflow: OverflowPolicy::Block,
        ..Default::default()
    };
    let pool = WorkerPool::start(generator, &pool_config).context("Invalid worker pool settings")?;

    let job_id = jobs
        .create(&cli.topic, usize::from(cli.slides))
        .await
        .context("Invalid request")?;
    pool.submit(job_id.clone()).await.context("Could not queue job")?;
    pool.shutdown().await;

    let job = jobs
        .get(&job_id)
        .await
        .with_context(|| format!("Job {job_id} disappeared from the store"))?;
    print_job(&cli, &job)?;

    if job.status != JobStatus::Completed {
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout)
        .render_timeout_secs(cli.render_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let (Some(key), Some(cx)) = (&cli.google_key, &cli.google_cx) {
        builder = builder.google_credentials(key, cx);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn build_renderer(cli: &Cli) -> Arc<dyn DocumentRenderer> {
    match cli.render_cmd.split_first() {
        Some((program, args)) => Arc::new(CommandRenderer::new(
            program.clone(),
            args.to_vec(),
            cli.render_ext.clone(),
            Duration::from_secs(cli.render_timeout),
        )),
        None => Arc::new(HtmlRenderer),
    }
}

fn print_job(cli: &Cli, job: &Job) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(job).context("Failed to serialise job")?;
        println!("{json}");
        return Ok(());
    }

    println!("Job:       {}", job.id);
    println!("Topic:     {}", job.topic);
    println!("Slides:    {}", job.slide_count);
    println!("Status:    {}", job.status);
    if let Some(ref artifact) = job.artifact {
        let file = artifact.rsplit('/').next().unwrap_or(artifact.as_str());
        println!("Artifact:  {}", artifact);
        println!("File:      {}", cli.output_dir.join(file).display());
    }
    if let Some(ref error) = job.error {
        println!("Error:     {}", red(error));
    }
    if let Some(done) = job.completed_at {
        let ms = (done - job.created_at).num_milliseconds();
        println!("Duration:  {}", dim(&format!("{:.1}s", ms as f64 / 1000.0)));
    }
    Ok(())
}
