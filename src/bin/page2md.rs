//! CLI binary for page2md.
//!
//! A thin shim over the library crate that maps CLI flags onto
//! `ServiceConfig` / `ConversionRequest` and prints JSON results.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use page2md::pipeline::input::resolve_page_source;
use page2md::server::{self, AppState};
use page2md::{
    convert_file, transcribe_page, ConversionRequest, Extractors, LlmGateway, ServiceConfig,
    TagDefinitions, DEFAULT_MODEL,
};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Transcribe a scanned page (image file, URL or data URI)
  page2md transcribe scan-001.png

  # Transcribe page 3 of a PDF with context from page 2
  page2md transcribe report.pdf --page 3 \
      --preceding-markdown @page2.md --preceding-image report-p2.png

  # Classify while transcribing
  page2md transcribe page.jpg --tags '{"diagnosis":"names a medical condition"}'

  # Extract text from a document (no model call)
  page2md convert notes.docx

  # Run the HTTP service
  page2md serve --host 0.0.0.0 --port 8080

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override default model ID
  PDFIUM_LIB_PATH         Path to libpdfium (PDF pages and PDF text extraction)
"#;

/// Transcribe document pages to Markdown using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "page2md",
    version,
    about = "Transcribe document pages to Markdown using Vision LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    service: ServiceArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PAGE2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PAGE2MD_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve {
        #[arg(long, env = "PAGE2MD_HOST", default_value = "127.0.0.1")]
        host: String,

        #[arg(long, env = "PAGE2MD_PORT", default_value_t = 3000)]
        port: u16,
    },

    /// Transcribe one page and print the result as JSON.
    Transcribe(TranscribeArgs),

    /// Extract the text of a local file and print `{ "markdownContent": … }`.
    Convert {
        /// Local file (.pdf, .docx, or a text/source file).
        file: PathBuf,
    },
}

/// Service-wide settings, shared by every subcommand.
#[derive(Args, Debug)]
struct ServiceArgs {
    /// Default LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Max LLM output tokens per page.
    #[arg(long, global = true, env = "PAGE2MD_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "PAGE2MD_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Retries on LLM failure.
    #[arg(long, global = true, env = "PAGE2MD_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-attempt LLM call timeout in seconds.
    #[arg(long, global = true, env = "PAGE2MD_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Maximum upload size for convert-file, in bytes.
    #[arg(long, global = true, env = "PAGE2MD_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<u64>,

    /// Comma-separated extension allow-list for convert-file.
    #[arg(long, global = true, env = "PAGE2MD_ALLOWED_EXTENSIONS", value_delimiter = ',')]
    allowed_extensions: Option<Vec<String>>,

    /// HTTP download timeout in seconds (remote PDFs).
    #[arg(long, global = true, env = "PAGE2MD_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(Args, Debug)]
struct TranscribeArgs {
    /// Image file, HTTP/HTTPS URL, data URI, or PDF (with --page).
    source: String,

    /// 1-indexed page to rasterise when SOURCE is a PDF.
    #[arg(long)]
    page: Option<usize>,

    /// High-level description of the document.
    #[arg(long)]
    description: Option<String>,

    /// What the transcription will be used for.
    #[arg(long)]
    intent: Option<String>,

    /// How charts, figures and images should be handled.
    #[arg(long)]
    graphic_instructions: Option<String>,

    /// Markdown of the preceding page (inline, or @file).
    #[arg(long)]
    preceding_markdown: Option<String>,

    /// Free-form context about the preceding page (inline, or @file).
    #[arg(long)]
    preceding_context: Option<String>,

    /// Image of the preceding page (same forms as SOURCE).
    #[arg(long)]
    preceding_image: Option<String>,

    /// 1-indexed page for --preceding-image when it is a PDF.
    #[arg(long)]
    preceding_page: Option<usize>,

    /// Do not ask for a page description.
    #[arg(long)]
    no_describe: bool,

    /// Tag definitions as a JSON object (inline, or @file).
    #[arg(long)]
    tags: Option<String>,

    /// Write the JSON result to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = Arc::new(build_config(&cli.service)?);

    match cli.command {
        Command::Serve { host, port } => {
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("Invalid listen address {host}:{port}"))?;
            server::serve(addr, AppState::new(config))
                .await
                .context("Server failed")?;
        }
        Command::Transcribe(args) => {
            let output = args.output.clone();
            let result = run_transcribe(args, &config).await?;
            let json =
                serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
            write_output(&json, output.as_deref())?;
        }
        Command::Convert { file } => {
            let output = convert_file(&file, &Extractors::default(), &config)
                .await
                .with_context(|| format!("Conversion of {} failed", file.display()))?;
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            write_output(&json, None)?;
        }
    }

    Ok(())
}

async fn run_transcribe(
    args: TranscribeArgs,
    config: &Arc<ServiceConfig>,
) -> Result<page2md::ConversionResult> {
    let page_source = resolve_page_source(&args.source, args.page, config)
        .await
        .with_context(|| format!("Cannot read page from {}", args.source))?;

    let mut request = ConversionRequest::default().with_describe(!args.no_describe);
    if let Some(v) = args.description {
        request = request.with_description(v);
    }
    if let Some(v) = args.intent {
        request = request.with_intent(v);
    }
    if let Some(v) = args.graphic_instructions {
        request = request.with_graphic_instructions(v);
    }
    if let Some(v) = args.preceding_markdown {
        request = request.with_preceding_markdown(read_inline_or_file(&v).await?);
    }
    if let Some(v) = args.preceding_context {
        request = request.with_preceding_context(read_inline_or_file(&v).await?);
    }
    if let Some(ref src) = args.preceding_image {
        let source = resolve_page_source(src, args.preceding_page, config)
            .await
            .with_context(|| format!("Cannot read preceding page from {src}"))?;
        request = request.with_preceding_image(source);
    }
    if let Some(v) = args.tags {
        let raw = read_inline_or_file(&v).await?;
        let defs: TagDefinitions = serde_json::from_str(&raw)
            .context("--tags must be a JSON object of tag name → definition")?;
        request = request.with_tag_definitions(defs);
    }

    info!(
        "Transcribing {} with {}",
        page2md::redact::redact_str(&args.source),
        config.model_for(request.model_name.as_deref())
    );

    let gateway = LlmGateway::new(Arc::clone(config));
    transcribe_page(&gateway, config, &request, &page_source)
        .await
        .context("Transcription failed")
}

/// Map CLI args to `ServiceConfig`.
fn build_config(args: &ServiceArgs) -> Result<ServiceConfig> {
    let mut builder = ServiceConfig::builder()
        .default_model(args.model.as_deref().unwrap_or(DEFAULT_MODEL))
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .max_retries(args.max_retries)
        .api_timeout_secs(args.api_timeout)
        .download_timeout_secs(args.download_timeout);

    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(bytes) = args.max_upload_bytes {
        builder = builder.max_upload_bytes(bytes);
    }
    if let Some(ref exts) = args.allowed_extensions {
        builder = builder.allowed_extensions(exts);
    }

    builder.build().context("Invalid configuration")
}

/// `@path` reads the file; anything else is taken literally.
async fn read_inline_or_file(value: &str) -> Result<String> {
    match value.strip_prefix('@') {
        Some(path) if path.is_empty() => bail!("'@' must be followed by a file path"),
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {path}")),
        None => Ok(value.to_string()),
    }
}

fn write_output(json: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => std::fs::write(p, format!("{json}\n"))
            .with_context(|| format!("Failed to write {}", p.display())),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{json}").context("Failed to write to stdout")
        }
    }
}
