//! Pipeline stages for page transcription.
//!
//! Each submodule implements exactly one transformation step so each can be
//! tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ compose ──▶ llm ──▶ extract
//! (page source) (transcript) (continuation) (ConversionResult)
//! ```
//!
//! 1. [`input`]: resolve a CLI page reference to an attachment source,
//!    using [`render`] and [`encode`] when the page lives in a PDF
//! 2. [`compose`]: build the system + user messages from a request
//! 3. [`llm`]: advance the transcript through a [`llm::TranscriptGateway`];
//!    the only stage with model I/O
//! 4. [`extract`]: recover a typed result from the untrusted reply

pub mod compose;
pub mod encode;
pub mod extract;
pub mod input;
pub mod llm;
pub mod render;
