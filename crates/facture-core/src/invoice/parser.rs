//! Parse orchestration: rasterize, recognize, extract, validate.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::error::{OcrError, Result};
use crate::matching::BusinessResolver;
use crate::models::business::MatchResult;
use crate::models::config::FactureConfig;
use crate::models::result::{ExtractionResult, FieldKind};
use crate::ocr::{DocumentText, OcrEngine, PageAggregator, RecognitionBackend};
use crate::pdf::PageRasterizer;

use super::{ExtractedFields, InvoiceExtractionKind};

/// Observable stages of one parse call.
///
/// Per-page OCR retries loop inside `RecognizingText` without changing the
/// stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Idle,
    Rasterizing,
    RecognizingText,
    ExtractingFields,
    Validating,
    Done,
    Failed,
}

/// Outcome of a parse call.
///
/// Cancellation is a first-class outcome, distinct from success and from
/// infrastructure failure.
#[derive(Debug)]
pub enum ParseOutcome {
    Completed(ExtractionResult),
    Cancelled,
}

/// Composes rasterization, OCR aggregation, field extraction, and business
/// resolution into one `parse` call.
pub struct InvoiceParser {
    rasterizer: Arc<dyn PageRasterizer>,
    aggregator: PageAggregator,
    resolver: Arc<BusinessResolver>,
    config: FactureConfig,
    kind: InvoiceExtractionKind,
}

impl InvoiceParser {
    pub fn new(
        rasterizer: Arc<dyn PageRasterizer>,
        backend: Arc<dyn RecognitionBackend>,
        resolver: Arc<BusinessResolver>,
        config: FactureConfig,
    ) -> Self {
        let engine = OcrEngine::new(backend, config.ocr.clone());
        let aggregator = PageAggregator::new(engine, config.ocr.clone());
        Self {
            rasterizer,
            aggregator,
            resolver,
            config,
            kind: InvoiceExtractionKind::Invoice,
        }
    }

    /// Extract with a different document-kind strategy.
    pub fn with_kind(mut self, kind: InvoiceExtractionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Parse a PDF into a structured extraction record.
    ///
    /// `force_ocr` bypasses the PDF's embedded text layer and always
    /// re-runs OCR.
    pub fn parse(&self, path: &Path, force_ocr: bool) -> Result<ParseOutcome> {
        self.parse_with_cancel(path, force_ocr, &CancelToken::new())
    }

    /// Like [`parse`](Self::parse), honoring a cooperative cancellation
    /// token between page recognitions and after field extraction.
    pub fn parse_with_cancel(
        &self,
        path: &Path,
        force_ocr: bool,
        cancel: &CancelToken,
    ) -> Result<ParseOutcome> {
        let start = Instant::now();
        let mut stage = ParseStage::Idle;
        info!("Parsing {} (force_ocr={})", path.display(), force_ocr);

        advance(&mut stage, ParseStage::Rasterizing);
        let embedded = if force_ocr {
            None
        } else {
            self.trusted_embedded_text(path)?
        };

        let document = match embedded {
            Some(document) => document,
            None => {
                let images = match self.rasterizer.rasterize(path) {
                    Ok(images) => images,
                    Err(e) => {
                        advance(&mut stage, ParseStage::Failed);
                        return Err(e.into());
                    }
                };

                advance(&mut stage, ParseStage::RecognizingText);
                match self.aggregator.extract(&images, cancel) {
                    Ok(document) => document,
                    Err(OcrError::Cancelled) => {
                        info!("Parse cancelled during recognition");
                        return Ok(ParseOutcome::Cancelled);
                    }
                    Err(e) => {
                        advance(&mut stage, ParseStage::Failed);
                        return Err(e.into());
                    }
                }
            }
        };

        advance(&mut stage, ParseStage::ExtractingFields);
        let company_match = self.resolver.resolve(&document.text);
        let fields = self.kind.strategy().extract(&document.text);

        if cancel.is_cancelled() {
            info!("Parse cancelled after field extraction");
            return Ok(ParseOutcome::Cancelled);
        }

        advance(&mut stage, ParseStage::Validating);
        let result = self.build_result(document, company_match, fields);

        advance(&mut stage, ParseStage::Done);
        info!(
            "Parsed {} in {}ms: confidence {:.2}, valid={}",
            path.display(),
            start.elapsed().as_millis(),
            result.confidence,
            result.is_valid
        );
        Ok(ParseOutcome::Completed(result))
    }

    /// Resolve a payee for arbitrary text; standalone entry point for
    /// interactive re-matching.
    pub fn resolve_business(&self, text: &str) -> Option<MatchResult> {
        self.resolver.resolve(text)
    }

    fn trusted_embedded_text(&self, path: &Path) -> Result<Option<DocumentText>> {
        let text = self.rasterizer.embedded_text(path)?;
        Ok(text
            .filter(|t| t.trim().len() >= self.config.ocr.min_embedded_text_len)
            .map(|t| {
                debug!("Using embedded text layer ({} chars), skipping OCR", t.len());
                DocumentText::embedded(t)
            }))
    }

    fn build_result(
        &self,
        document: DocumentText,
        company_match: Option<MatchResult>,
        fields: ExtractedFields,
    ) -> ExtractionResult {
        let weights = &self.config.scoring;
        let strategy = self.kind.strategy();

        let company_score = company_match.as_ref().map(|m| m.score).unwrap_or(0.0);
        let total_score = if fields.total.is_some() { 1.0 } else { 0.0 };
        let date_score = if fields.date.is_some() { 1.0 } else { 0.0 };
        let number_score = if fields.invoice_number.is_some() { 1.0 } else { 0.0 };

        let mut field_confidence = HashMap::from([
            (FieldKind::OcrText, document.confidence),
            (FieldKind::Company, company_score),
            (FieldKind::Total, total_score),
            (FieldKind::Date, date_score),
        ]);

        let mut weighted = weights.ocr_text * document.confidence
            + weights.company * company_score
            + weights.total * total_score
            + weights.date * date_score;
        let mut weight_sum = weights.ocr_text + weights.company + weights.total + weights.date;

        if strategy.uses_invoice_number() {
            field_confidence.insert(FieldKind::InvoiceNumber, number_score);
            weighted += weights.invoice_number * number_score;
            weight_sum += weights.invoice_number;
        }

        let confidence = if weight_sum > 0.0 {
            (weighted / weight_sum).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let company = company_match.as_ref().map(|m| m.business.clone());
        let total = fields.total.as_ref().map(|m| m.value);
        let is_valid = confidence >= self.config.ocr.confidence_threshold
            && company.is_some()
            && total.is_some();

        if !is_valid {
            warn!(
                "Extraction below validity bar (confidence {:.2}, company={}, total={})",
                confidence,
                company.is_some(),
                total.is_some()
            );
        }

        ExtractionResult {
            company,
            total,
            date: fields.date.map(|m| m.value),
            invoice_number: fields.invoice_number.map(|m| m.value),
            raw_text: document.text,
            confidence,
            field_confidence,
            is_valid,
            pages: document.pages,
            company_match,
        }
    }
}

fn advance(stage: &mut ParseStage, next: ParseStage) {
    debug!("Parse stage {:?} -> {:?}", stage, next);
    *stage = next;
}
