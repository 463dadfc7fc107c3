//! pdf-gloss: annotate difficult words in PDFs with their definitions
//!
//! This crate provides MCP tools:
//! - `annotate_pdf`: Underline and highlight difficult words, attaching a definition note
//! - `classify_words`: Score words with the difficulty heuristic
//! - `define_word`: Look up the definition text used in annotation notes

pub mod annotate;
pub mod config;
pub mod definition;
pub mod difficulty;
pub mod error;
pub mod lexicon;
pub mod pdf;
pub mod pipeline;
pub mod server;
pub mod source;

pub use config::Config;
pub use difficulty::{Classifier, Reason, Verdict};
pub use error::{Error, Result};
pub use lexicon::Lexicon;
pub use pipeline::{AnnotatedDocument, DocumentReport, PageReport, Pipeline, SkipReason};
pub use server::{run_server, run_server_with_config, GlossServer, PdfSource};
