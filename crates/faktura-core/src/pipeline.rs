//! The extraction pipeline: decides text vs vision, normalizes the
//! model reply, and assembles the final result.
//!
//! Strictly sequential and stateless between runs. The first fatal
//! collaborator error aborts the run with its kind preserved; soft
//! degradations accumulate as warnings instead.

use std::path::Path;

use tracing::{debug, warn};

use crate::config::{OcrMode, Settings};
use crate::error::Result;
use crate::gemini::{GeminiClient, GeminiReply, ModelExtractor};
use crate::models::{ExtractionMethod, ExtractionResult};
use crate::normalize::{
    compose_filename_stub, count_words, normalize_invoice_date, sanitize_words,
    FilenameOptions, FALLBACK_DESCRIPTION,
};
use crate::normalize::text::MAX_DESCRIPTION_WORDS;
use crate::pdf::{
    is_usable_text, validate_input_pdf_path, LopdfSource, PdfSource, DEFAULT_RENDER_DPI,
};

/// Single-invoice extraction pipeline, generic over both collaborator
/// seams.
pub struct ExtractionPipeline<P, M> {
    pdf: P,
    model: M,
    max_pages: usize,
    ocr_mode: OcrMode,
    filename: FilenameOptions,
    render_dpi: u32,
}

impl ExtractionPipeline<LopdfSource, GeminiClient> {
    /// Production pipeline from resolved settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = GeminiClient::from_settings(settings)?;
        Ok(Self::new(LopdfSource::new(), client, settings))
    }
}

impl<P: PdfSource, M: ModelExtractor> ExtractionPipeline<P, M> {
    /// Assemble a pipeline over explicit collaborators.
    pub fn new(pdf: P, model: M, settings: &Settings) -> Self {
        Self {
            pdf,
            model,
            max_pages: settings.max_pages,
            ocr_mode: settings.ocr_mode,
            filename: settings.filename.clone(),
            render_dpi: DEFAULT_RENDER_DPI,
        }
    }

    /// Process one invoice PDF into an [`ExtractionResult`].
    pub async fn run(&self, pdf_path: &Path) -> Result<ExtractionResult> {
        let path = validate_input_pdf_path(pdf_path)?;
        let source_file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut warnings: Vec<String> = Vec::new();
        let (reply, extraction_method) = self.extract(&path, &mut warnings).await?;

        let invoice_date = normalize_invoice_date(
            reply.invoice_date_iso.as_deref(),
            reply.invoice_date_raw.as_deref(),
        );
        let had_date_candidate = reply
            .invoice_date_iso
            .as_deref()
            .is_some_and(|v| !v.is_empty())
            || reply
                .invoice_date_raw
                .as_deref()
                .is_some_and(|v| !v.is_empty());
        if had_date_candidate && invoice_date.is_none() {
            warnings.push("Could not normalize invoice date returned by Gemini".to_string());
        }

        let words = sanitize_words(&reply.short_description, MAX_DESCRIPTION_WORDS);
        let short_description = if words.is_empty() {
            warnings.push(format!(
                "Gemini returned an empty short description; defaulted to '{FALLBACK_DESCRIPTION}'"
            ));
            FALLBACK_DESCRIPTION.to_string()
        } else {
            words.join(" ")
        };

        if let Some(notes) = reply.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            warnings.push(notes.to_string());
        }

        let filename_stub = compose_filename_stub(
            invoice_date.as_deref(),
            Some(&short_description),
            &self.filename,
        );

        Ok(ExtractionResult {
            source_file,
            invoice_date,
            invoice_date_raw: reply.invoice_date_raw,
            short_description_words: count_words(&short_description),
            short_description,
            filename_stub,
            extraction_method,
            confidence: reply.confidence.clamp(0.0, 1.0),
            warnings,
        })
    }

    /// Decide the extraction path and obtain the model reply.
    async fn extract(
        &self,
        path: &Path,
        warnings: &mut Vec<String>,
    ) -> Result<(GeminiReply, ExtractionMethod)> {
        if self.ocr_mode == OcrMode::Gemini {
            debug!("vision mode forced by configuration");
            return self.extract_via_vision(path).await;
        }

        let extraction = self.pdf.read_embedded_text(path, self.max_pages)?;
        debug!(
            pages = extraction.pages_examined,
            quality = extraction.quality_score,
            "scored embedded text"
        );

        if !extraction.combined_text.is_empty() && is_usable_text(extraction.quality_score) {
            let reply = self
                .model
                .extract_from_text(&extraction.combined_text)
                .await?;
            return Ok((reply, ExtractionMethod::PdfText));
        }

        warn!(
            quality = extraction.quality_score,
            "embedded text unusable, falling back to vision"
        );
        warnings.push(format!(
            "Falling back to Gemini vision due to low text quality ({:.2})",
            extraction.quality_score
        ));
        self.extract_via_vision(path).await
    }

    async fn extract_via_vision(&self, path: &Path) -> Result<(GeminiReply, ExtractionMethod)> {
        let images = self.pdf.render_pages(path, self.max_pages, self.render_dpi)?;
        debug!(images = images.len(), "rendered page images");
        let reply = self.model.extract_from_images(&images).await?;
        Ok((reply, ExtractionMethod::GeminiVision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FakturaError, GeminiError, PdfError};
    use crate::pdf::TextExtraction;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    struct StubPdf {
        text: String,
        quality: f64,
        images: Vec<Vec<u8>>,
    }

    impl StubPdf {
        fn with_text(text: &str, quality: f64) -> Self {
            Self {
                text: text.to_string(),
                quality,
                images: vec![vec![0u8; 8]],
            }
        }
    }

    impl PdfSource for StubPdf {
        fn read_embedded_text(
            &self,
            _path: &Path,
            max_pages: usize,
        ) -> crate::pdf::Result<TextExtraction> {
            Ok(TextExtraction {
                page_texts: vec![self.text.clone()],
                combined_text: self.text.clone(),
                quality_score: self.quality,
                pages_examined: max_pages.min(1),
            })
        }

        fn render_pages(
            &self,
            path: &Path,
            _max_pages: usize,
            _dpi: u32,
        ) -> crate::pdf::Result<Vec<Vec<u8>>> {
            if self.images.is_empty() {
                return Err(PdfError::Render {
                    path: path.to_path_buf(),
                    reason: "no renderable page images found".to_string(),
                });
            }
            Ok(self.images.clone())
        }
    }

    enum StubReply {
        Reply(GeminiReply),
        Fail,
    }

    struct StubModel {
        reply: StubReply,
    }

    impl StubModel {
        fn replying(reply: GeminiReply) -> Self {
            Self {
                reply: StubReply::Reply(reply),
            }
        }

        fn failing() -> Self {
            Self {
                reply: StubReply::Fail,
            }
        }

        fn reply(&self) -> crate::gemini::Result<GeminiReply> {
            match &self.reply {
                StubReply::Reply(reply) => Ok(reply.clone()),
                StubReply::Fail => Err(GeminiError::Json(
                    "could not find JSON object in Gemini response".to_string(),
                )),
            }
        }
    }

    impl ModelExtractor for StubModel {
        async fn extract_from_text(&self, _text: &str) -> crate::gemini::Result<GeminiReply> {
            self.reply()
        }

        async fn extract_from_images(
            &self,
            images: &[Vec<u8>],
        ) -> crate::gemini::Result<GeminiReply> {
            if images.is_empty() {
                return Err(GeminiError::NoImages);
            }
            self.reply()
        }
    }

    fn good_reply() -> GeminiReply {
        GeminiReply {
            invoice_date_raw: Some("10 Feb 2026".to_string()),
            invoice_date_iso: Some("2026-02-10".to_string()),
            short_description: "Kawa ziarnista".to_string(),
            confidence: 0.9,
            notes: None,
        }
    }

    fn temp_pdf() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.pdf");
        std::fs::write(&path, b"%PDF-1.4 stub").unwrap();
        (dir, path)
    }

    fn pipeline<P: PdfSource, M: ModelExtractor>(
        pdf: P,
        model: M,
        ocr_mode: OcrMode,
    ) -> ExtractionPipeline<P, M> {
        let mut settings = Settings::default();
        settings.ocr_mode = ocr_mode;
        ExtractionPipeline::new(pdf, model, &settings)
    }

    #[tokio::test]
    async fn test_usable_text_takes_text_mode_with_no_warnings() {
        let (_dir, path) = temp_pdf();
        let pdf = StubPdf::with_text("Invoice Date: 10 Feb 2026\nKawa ziarnista", 0.8);
        let pipeline = pipeline(pdf, StubModel::replying(good_reply()), OcrMode::Auto);

        let result = pipeline.run(&path).await.unwrap();
        assert_eq!(result.extraction_method, ExtractionMethod::PdfText);
        assert_eq!(result.invoice_date.as_deref(), Some("2026-02-10"));
        assert_eq!(result.short_description, "kawa ziarnista");
        assert_eq!(result.short_description_words, 2);
        assert_eq!(result.filename_stub, "2026-02-10_kawa_ziarnista");
        assert_eq!(result.source_file, "invoice.pdf");
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_low_quality_falls_back_to_vision_with_one_warning() {
        let (_dir, path) = temp_pdf();
        let pdf = StubPdf::with_text("x", 0.12);
        let pipeline = pipeline(pdf, StubModel::replying(good_reply()), OcrMode::Auto);

        let result = pipeline.run(&path).await.unwrap();
        assert_eq!(result.extraction_method, ExtractionMethod::GeminiVision);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("0.12"), "{:?}", result.warnings);
    }

    #[tokio::test]
    async fn test_empty_text_falls_back_even_above_threshold() {
        let (_dir, path) = temp_pdf();
        let pdf = StubPdf::with_text("", 0.9);
        let pipeline = pipeline(pdf, StubModel::replying(good_reply()), OcrMode::Auto);

        let result = pipeline.run(&path).await.unwrap();
        assert_eq!(result.extraction_method, ExtractionMethod::GeminiVision);
    }

    #[tokio::test]
    async fn test_forced_vision_skips_text_extraction() {
        let (_dir, path) = temp_pdf();
        // Text would be usable, but the mode says vision only.
        let pdf = StubPdf::with_text("Invoice total tax", 0.99);
        let pipeline = pipeline(pdf, StubModel::replying(good_reply()), OcrMode::Gemini);

        let result = pipeline.run(&path).await.unwrap();
        assert_eq!(result.extraction_method, ExtractionMethod::GeminiVision);
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_unnormalizable_date_warns_and_uses_sentinel_stub() {
        let (_dir, path) = temp_pdf();
        let reply = GeminiReply {
            invoice_date_raw: Some("sometime in spring".to_string()),
            invoice_date_iso: None,
            short_description: "kawa".to_string(),
            confidence: 0.4,
            notes: None,
        };
        let pdf = StubPdf::with_text("Invoice body", 0.8);
        let pipeline = pipeline(pdf, StubModel::replying(reply), OcrMode::Auto);

        let result = pipeline.run(&path).await.unwrap();
        assert_eq!(result.invoice_date, None);
        assert_eq!(
            result.invoice_date_raw.as_deref(),
            Some("sometime in spring")
        );
        assert_eq!(result.filename_stub, "unknown-date_kawa");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("normalize"));
    }

    #[tokio::test]
    async fn test_degenerate_description_defaults_to_item_with_warning() {
        let (_dir, path) = temp_pdf();
        let reply = GeminiReply {
            invoice_date_raw: None,
            invoice_date_iso: Some("2026-02-10".to_string()),
            short_description: "!!! ???".to_string(),
            confidence: 0.4,
            notes: None,
        };
        let pdf = StubPdf::with_text("Invoice body", 0.8);
        let pipeline = pipeline(pdf, StubModel::replying(reply), OcrMode::Auto);

        let result = pipeline.run(&path).await.unwrap();
        assert_eq!(result.short_description, "item");
        assert_eq!(result.short_description_words, 1);
        assert_eq!(result.filename_stub, "2026-02-10_item");
        assert!(result.warnings.iter().any(|w| w.contains("'item'")));
    }

    #[tokio::test]
    async fn test_notes_are_appended_verbatim() {
        let (_dir, path) = temp_pdf();
        let reply = GeminiReply {
            notes: Some("Date was ambiguous between issue and due date".to_string()),
            ..good_reply()
        };
        let pdf = StubPdf::with_text("Invoice body", 0.8);
        let pipeline = pipeline(pdf, StubModel::replying(reply), OcrMode::Auto);

        let result = pipeline.run(&path).await.unwrap();
        assert_eq!(
            result.warnings,
            vec!["Date was ambiguous between issue and due date".to_string()]
        );
    }

    #[tokio::test]
    async fn test_out_of_range_confidence_is_clamped() {
        let (_dir, path) = temp_pdf();
        let reply = GeminiReply {
            confidence: 1.7,
            ..good_reply()
        };
        let pdf = StubPdf::with_text("Invoice body", 0.8);
        let pipeline = pipeline(pdf, StubModel::replying(reply), OcrMode::Auto);

        let result = pipeline.run(&path).await.unwrap();
        assert_eq!(result.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_parse_failure_aborts_the_run() {
        let (_dir, path) = temp_pdf();
        let pdf = StubPdf::with_text("Invoice body", 0.8);
        let pipeline = pipeline(pdf, StubModel::failing(), OcrMode::Auto);

        let err = pipeline.run(&path).await.unwrap_err();
        assert!(matches!(err, FakturaError::Gemini(GeminiError::Json(_))));
    }

    #[tokio::test]
    async fn test_invalid_path_fails_before_collaborators() {
        let pdf = StubPdf::with_text("Invoice body", 0.8);
        let pipeline = pipeline(pdf, StubModel::failing(), OcrMode::Auto);

        let err = pipeline
            .run(Path::new("/no/such/invoice.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, FakturaError::Input(_)));
    }
}
