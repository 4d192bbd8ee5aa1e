//! # page2md
//!
//! Transcribe a single document page into Markdown using a Vision Language
//! Model (VLM), optionally with a short description and caller-defined
//! semantic tags.
//!
//! ## Why this crate?
//!
//! A VLM reads a page the way a human does, but its reply is untrusted: it
//! may wrap JSON in fences, drop keys, send the wrong types, or skip JSON
//! altogether. This crate owns the part around the model call: turn caller
//! intent into instructions the model can follow, then recover a typed,
//! always-valid [`ConversionResult`] from whatever comes back. A malformed
//! reply degrades to raw text; it never becomes an error.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ConversionRequest + page image
//!  │
//!  ├─ 1. Compose   system + user message (ordered optional sections)
//!  ├─ 2. Invoke    TranscriptGateway::extend_transcript (edgequake-llm)
//!  └─ 3. Extract   flatten → strip fences → parse → coerce, or degrade
//! ```
//!
//! A second, independent path ([`convert_file`], [`convert_upload`]) maps a
//! file extension onto one of three text extractors and returns the text
//! unchanged.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use page2md::{transcribe_page, ConversionRequest, LlmGateway, ServiceConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = Arc::new(ServiceConfig::default());
//!     let gateway = LlmGateway::new(Arc::clone(&config));
//!     let request = ConversionRequest::default().with_intent("search indexing");
//!     let result = transcribe_page(
//!         &gateway,
//!         &config,
//!         &request,
//!         "https://example.org/scan/page-1.png",
//!     )
//!     .await?;
//!     println!("{}", result.markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `server` | on | axum HTTP service ([`server`]) |
//! | `cli`    | on | the `page2md` binary (clap + anyhow + tracing-subscriber) |
//!
//! Library-only use:
//! ```toml
//! page2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod extractors;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod redact;
pub mod request;
pub mod tags;
pub mod transcript;

#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServiceConfig, ServiceConfigBuilder, DEFAULT_MODEL};
pub use convert::{convert_file, convert_upload, transcribe_image, transcribe_page};
pub use dispatch::{DocumentKind, Extractors, TextExtractor};
pub use error::Page2MdError;
pub use output::{ConversionResult, FileConversionOutput};
pub use pipeline::llm::{LlmGateway, TranscriptGateway};
pub use request::{ConversionRequest, TranscribeImageInput};
pub use tags::TagDefinitions;
pub use transcript::{Content, ContentPart, Message, Role, Transcript};
