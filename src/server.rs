//! MCP Server implementation using rmcp

use crate::config::Config;
use crate::definition::{build_store, DefinitionResolver, HttpDictionaryClient};
use crate::difficulty::{Classifier, Reason};
use crate::lexicon::Lexicon;
use crate::pipeline::{DocumentReport, Pipeline};
use crate::source::{resolve_base64, resolve_path, AccessPolicy, ResolvedPdf};
use anyhow::Result;
use base64::Engine;
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// PDF source specification
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum PdfSource {
    /// File path (absolute or relative)
    Path {
        /// Path to the PDF file
        path: String,
    },
    /// Base64 encoded PDF data
    Base64 {
        /// Base64 encoded PDF content
        base64: String,
    },
}

impl<'de> serde::Deserialize<'de> for PdfSource {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;

        let Some(obj) = value.as_object() else {
            return Err(serde::de::Error::custom(format!(
                "Invalid source: expected an object with \"path\" or \"base64\", but got {}",
                match &value {
                    serde_json::Value::Array(_) => "an array",
                    serde_json::Value::String(_) => "a string",
                    serde_json::Value::Number(_) => "a number",
                    serde_json::Value::Bool(_) => "a boolean",
                    serde_json::Value::Null => "null",
                    _ => "unknown type",
                }
            )));
        };

        for key in ["path", "base64"] {
            let Some(v) = obj.get(key) else { continue };
            let Some(s) = v.as_str() else {
                return Err(serde::de::Error::custom(format!(
                    "\"{}\" must be a string",
                    key
                )));
            };
            return Ok(match key {
                "path" => PdfSource::Path {
                    path: s.to_string(),
                },
                _ => PdfSource::Base64 {
                    base64: s.to_string(),
                },
            });
        }

        let keys: Vec<&String> = obj.keys().collect();
        Err(serde::de::Error::custom(format!(
            "Invalid source: expected an object with \"path\" or \"base64\", but got keys: {:?}",
            keys
        )))
    }
}

// ============================================================================
// Request/Response types for annotate_pdf
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AnnotatePdfParams {
    /// PDF to annotate
    pub source: PdfSource,
    /// Write the annotated PDF to this path
    #[serde(default)]
    pub output_path: Option<String>,
    /// Return the annotated PDF inline as base64 (default: true)
    #[serde(default = "default_true")]
    pub include_base64: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SkippedWord {
    pub word: String,
    /// Why no annotation was added
    pub reason: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PageSummary {
    /// Page number (1-indexed)
    pub page: usize,
    /// Words that were underlined, highlighted and given a note
    pub annotated: Vec<String>,
    pub skipped: Vec<SkippedWord>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct AnnotatePdfResult {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    /// Annotated PDF, base64 encoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
    pub total_pages: usize,
    pub pages_processed: usize,
    pub annotations_applied: usize,
    pub pages: Vec<PageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnnotatePdfResult {
    fn failed(source: String, error: String) -> Self {
        Self {
            source,
            output_path: None,
            data_base64: None,
            total_pages: 0,
            pages_processed: 0,
            annotations_applied: 0,
            pages: vec![],
            error: Some(error),
        }
    }
}

fn page_summaries(report: &DocumentReport) -> Vec<PageSummary> {
    report
        .pages
        .iter()
        .map(|page| PageSummary {
            page: page.page,
            annotated: page.annotated.clone(),
            skipped: page
                .skipped
                .iter()
                .map(|(word, reason)| SkippedWord {
                    word: word.clone(),
                    reason: reason.to_string(),
                })
                .collect(),
        })
        .collect()
}

// ============================================================================
// Request/Response types for classify_words
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClassifyWordsParams {
    /// Words to score
    pub words: Vec<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct WordClassification {
    /// Normalized (trimmed, lower-cased) word
    pub word: String,
    pub is_hard: bool,
    pub reasons: Vec<Reason>,
    /// Number of checks that fired (hard at 2 or more)
    pub score: usize,
    pub syllables: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_pattern: Option<String>,
}

// ============================================================================
// Request/Response types for define_word
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DefineWordParams {
    /// Word to look up
    pub word: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DefineWordResult {
    pub word: String,
    /// Formatted definition text, as attached to annotations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Difficult-word glossing MCP server
#[derive(Clone)]
pub struct GlossServer {
    config: Arc<Config>,
    classifier: Arc<Classifier>,
    resolver: Arc<DefinitionResolver>,
    access: AccessPolicy,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl GlossServer {
    /// Build the server from configuration.
    ///
    /// Must be called within a tokio runtime; the dictionary client drives its
    /// requests on it.
    pub fn with_config(config: Config) -> crate::error::Result<Self> {
        config.validate()?;

        let lexicon = Lexicon::load(&config.lexicon)?;
        let handle =
            tokio::runtime::Handle::try_current().map_err(|e| crate::error::Error::Task {
                reason: format!("No tokio runtime: {}", e),
            })?;
        let client = HttpDictionaryClient::new(&config.dictionary, handle)?;
        let store = build_store(&config.cache);

        tracing::info!(
            cache = ?config.cache.policy,
            common_words = lexicon.common_word_count(),
            patterns = lexicon.patterns().len(),
            "Definition resolver ready"
        );

        Ok(Self::with_components(
            config,
            Arc::new(Classifier::new(lexicon)),
            Arc::new(DefinitionResolver::new(Arc::new(client), store)),
        ))
    }

    /// Assemble a server from prebuilt parts
    pub fn with_components(
        config: Config,
        classifier: Arc<Classifier>,
        resolver: Arc<DefinitionResolver>,
    ) -> Self {
        Self {
            access: AccessPolicy::new(config.server.resource_dirs.iter()),
            config: Arc::new(config),
            classifier,
            resolver,
            tool_router: Self::tool_router(),
        }
    }

    /// Annotate difficult words in a PDF
    #[tool(
        description = "Find difficult words in a PDF and annotate them. Each difficult word is underlined and highlighted on the page where it first appears, with a popup note holding its dictionary definition.

Source format: {\"path\": \"/absolute/path.pdf\"} or {\"base64\": \"...\"}. Returns the annotated PDF as base64 and/or writes it to output_path, plus a per-page report of annotated and skipped words."
    )]
    async fn annotate_pdf(&self, Parameters(params): Parameters<AnnotatePdfParams>) -> String {
        let result = self
            .process_annotate_pdf(&params)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "annotate_pdf failed");
                AnnotatePdfResult::failed(Self::source_name(&params.source), e.client_message())
            });

        let response = serde_json::json!({ "results": [result] });
        serde_json::to_string_pretty(&response).unwrap_or_default()
    }

    /// Score words with the difficulty heuristic
    #[tool(
        description = "Score words for reading difficulty. Four checks (long word, many syllables, complex spelling pattern, uncommon word) each add one point; a word with two or more points is hard. Returns the score, reasons and syllable estimate for each word."
    )]
    async fn classify_words(&self, Parameters(params): Parameters<ClassifyWordsParams>) -> String {
        let results: Vec<WordClassification> = params
            .words
            .iter()
            .map(|word| {
                let verdict = self.classifier.classify(word);
                WordClassification {
                    score: verdict.score(),
                    word: verdict.word,
                    is_hard: verdict.is_hard,
                    reasons: verdict.reasons,
                    syllables: verdict.syllables,
                    matched_pattern: verdict.matched_pattern,
                }
            })
            .collect();

        let response = serde_json::json!({ "results": results });
        serde_json::to_string_pretty(&response).unwrap_or_default()
    }

    /// Look up a definition
    #[tool(
        description = "Look up a short dictionary definition for a word (up to two senses and three usage examples), formatted as it would appear in an annotation note. Results are cached for the life of the server."
    )]
    async fn define_word(&self, Parameters(params): Parameters<DefineWordParams>) -> String {
        let result = self
            .process_define_word(&params.word)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "define_word failed");
                DefineWordResult {
                    word: params.word.clone(),
                    definition: None,
                    error: Some(e.client_message()),
                }
            });

        let response = serde_json::json!({ "results": [result] });
        serde_json::to_string_pretty(&response).unwrap_or_default()
    }
}

impl GlossServer {
    fn source_name(source: &PdfSource) -> String {
        match source {
            PdfSource::Path { path } => path.clone(),
            PdfSource::Base64 { .. } => "<base64>".to_string(),
        }
    }

    fn resolve_source(&self, source: &PdfSource) -> crate::error::Result<ResolvedPdf> {
        match source {
            PdfSource::Path { path } => {
                let checked = self.access.check_input(path)?;
                resolve_path(checked)
            }
            PdfSource::Base64 { base64 } => resolve_base64(base64),
        }
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new(
            self.config.pipeline.clone(),
            self.classifier.clone(),
            self.resolver.clone(),
        )
        .with_pdfium(self.config.pdfium.clone())
    }

    /// Write output data to a file, creating parent directories
    fn write_output(
        &self,
        output_path: &Option<String>,
        data: &[u8],
    ) -> crate::error::Result<Option<String>> {
        let Some(path_str) = output_path else {
            return Ok(None);
        };

        self.access.check_output(path_str)?;
        let path = Path::new(path_str);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, data)?;
        Ok(Some(path_str.clone()))
    }

    pub async fn process_annotate_pdf(
        &self,
        params: &AnnotatePdfParams,
    ) -> crate::error::Result<AnnotatePdfResult> {
        let resolved = self.resolve_source(&params.source)?;
        let source_name = resolved.source_name;
        let data = resolved.data;
        let pipeline = self.pipeline();

        // PDFium work and dictionary lookups both block
        let annotated = tokio::task::spawn_blocking(move || pipeline.process(&data))
            .await
            .map_err(|e| crate::error::Error::Task {
                reason: format!("Task join error: {}", e),
            })??;

        let output_path = self.write_output(&params.output_path, &annotated.data)?;
        let data_base64 = params
            .include_base64
            .then(|| base64::engine::general_purpose::STANDARD.encode(&annotated.data));

        let report = &annotated.report;
        Ok(AnnotatePdfResult {
            source: source_name,
            output_path,
            data_base64,
            total_pages: report.total_pages,
            pages_processed: report.pages_processed(),
            annotations_applied: report.annotations_applied(),
            pages: page_summaries(report),
            error: None,
        })
    }

    pub async fn process_define_word(&self, word: &str) -> crate::error::Result<DefineWordResult> {
        let resolver = self.resolver.clone();
        let lookup = word.to_string();

        let resolution = tokio::task::spawn_blocking(move || resolver.resolve(&lookup))
            .await
            .map_err(|e| crate::error::Error::Task {
                reason: format!("Task join error: {}", e),
            })?;

        let word = word.trim().to_lowercase();
        Ok(match resolution {
            Ok(definition) => DefineWordResult {
                word,
                definition: Some(definition),
                error: None,
            },
            Err(miss) => {
                tracing::info!(word = %word, reason = %miss, "No definition");
                DefineWordResult {
                    word,
                    definition: None,
                    error: Some(miss.to_string()),
                }
            }
        })
    }
}

#[tool_handler]
impl ServerHandler for GlossServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "pdf-gloss finds difficult words in PDFs and annotates them with dictionary \
                 definitions. Use classify_words and define_word to preview what annotate_pdf \
                 would do."
                    .into(),
            ),
        }
    }
}

/// Run the MCP server with default configuration
pub async fn run_server() -> Result<()> {
    run_server_with_config(Config::default()).await
}

/// Run the MCP server with full configuration
pub async fn run_server_with_config(config: Config) -> Result<()> {
    let server = GlossServer::with_config(config)?;

    tracing::info!("pdf-gloss MCP server ready, waiting for connections...");

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}
