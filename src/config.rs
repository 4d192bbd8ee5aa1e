//! Process-wide configuration.
//!
//! [`ServiceConfig`] is assembled once at startup through
//! [`ServiceConfigBuilder`] and then shared read-only (usually as
//! `Arc<ServiceConfig>`). Nothing in the crate mutates it after `build()`;
//! requests carry their own per-call options in
//! [`crate::request::ConversionRequest`].

use crate::dispatch::DocumentKind;
use crate::error::Page2MdError;
use edgequake_llm::LLMProvider;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Default ceiling for uploaded files: 20 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Extensions accepted by the convert-file path out of the box.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "docx", "txt", "md", "markdown", "csv", "json", "xml", "html", "htm", "yaml", "yml",
    "toml", "log", "js", "ts", "jsx", "tsx", "py", "rs", "go", "java", "c", "h", "cpp", "hpp",
    "cs", "rb", "php", "sh", "sql", "css",
];

/// Immutable service configuration.
///
/// # Example
/// ```rust
/// use page2md::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .default_model("gpt-4.1-mini")
///     .max_upload_bytes(5 * 1024 * 1024)
///     .build()
///     .unwrap();
/// assert!(config.is_allowed_extension("PDF"));
/// ```
#[derive(Clone)]
pub struct ServiceConfig {
    /// Model identifier used when a request supplies none. Default: `gpt-4.1-nano`.
    pub default_model: String,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    ///
    /// A pre-built provider is already bound to a model, so the per-request
    /// model name is ignored when this is set.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the completion. Default: 0.1.
    ///
    /// Transcription wants the model faithful to what it sees on the page.
    pub temperature: f32,

    /// Maximum tokens the model may generate per page. Default: 4096.
    ///
    /// The reply wraps the Markdown in JSON, so dense pages need headroom;
    /// setting this too low truncates the JSON and forces the degradation path.
    pub max_tokens: usize,

    /// Maximum retry attempts on a failed model call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-attempt model call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Lower-case extensions (no leading dot) accepted by convert-file.
    pub allowed_extensions: BTreeSet<String>,

    /// Maximum accepted upload size in bytes. Default: 20 MiB.
    pub max_upload_bytes: u64,

    /// Download timeout for remote PDF page sources in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Longest edge, in pixels, of a rasterised PDF page. Default: 2000.
    pub max_rendered_pixels: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 4096,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            download_timeout_secs: 120,
            max_rendered_pixels: 2000,
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("default_model", &self.default_model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve the model for a request: the caller's choice, else the default.
    pub fn model_for<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested.unwrap_or(&self.default_model)
    }

    /// Case-insensitive allow-list check. A leading dot is tolerated.
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        self.allowed_extensions
            .contains(&normalise_extension(ext))
    }

    /// Allow-list rendered for error messages, e.g. `.csv, .docx, .pdf`.
    pub fn allowed_extensions_display(&self) -> String {
        self.allowed_extensions
            .iter()
            .map(|e| format!(".{e}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Lower-case an extension and strip any leading dot.
pub fn normalise_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.config.default_model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    /// Replace the allow-list. Extensions are normalised (lower-case, no dot).
    pub fn allowed_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.allowed_extensions = exts
            .into_iter()
            .map(|e| normalise_extension(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, Page2MdError> {
        let c = &self.config;
        if c.default_model.trim().is_empty() {
            return Err(Page2MdError::InvalidConfig(
                "default model must not be empty".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(Page2MdError::InvalidConfig(
                "upload ceiling must be ≥ 1 byte".into(),
            ));
        }
        if let Some(ext) = c
            .allowed_extensions
            .iter()
            .find(|e| DocumentKind::from_extension(e).is_none())
        {
            return Err(Page2MdError::InvalidConfig(format!(
                "extension '.{ext}' has no extraction strategy"
            )));
        }
        Ok(self.config)
    }
}
