//! Document and batch orchestration.

mod progress;

pub use progress::{NoProgress, ProgressReporter};

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::aggregation::AgentAggregator;
use crate::error::Result;
use crate::extraction::ZoneExtractionEngine;
use crate::models::{
    BatchResult, DocumentOutcome, DocumentStatus, ExtractionRecord, ProcessingResult, Zone,
    ZonexConfig,
};
use crate::pdf::TextLayer;
use progress::BatchSlice;

/// Runs zone extraction and aggregation for one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    engine: ZoneExtractionEngine,
    config: ZonexConfig,
}

impl Pipeline {
    pub fn new(config: ZonexConfig) -> Self {
        Self {
            engine: ZoneExtractionEngine::new(&config.extraction),
            config,
        }
    }

    pub fn config(&self) -> &ZonexConfig {
        &self.config
    }

    /// Extract every zone of a document, in order, and aggregate agents.
    ///
    /// Zones are validated before any page is read.
    pub async fn process_document<L, P>(
        &self,
        layer: &L,
        zones: &[Zone],
        progress: &mut P,
    ) -> Result<ProcessingResult>
    where
        L: TextLayer,
        P: ProgressReporter,
    {
        for zone in zones {
            zone.validate()?;
        }

        let total_pages = layer.page_count();
        info!("Processing {} zones over {} pages", zones.len(), total_pages);
        debug!(
            "OCR hints: language={}, enhance_image={}",
            self.config.ocr.language, self.config.ocr.enhance_image
        );

        let mut records = Vec::with_capacity(zones.len());
        let mut pages_read = BTreeSet::new();

        for (i, zone) in zones.iter().enumerate() {
            let record = if self.config.page_allowed(zone.page) {
                let outcome = self.engine.extract_zone(layer, zone).await;
                if outcome.page_read {
                    pages_read.insert(zone.page);
                }
                outcome.record
            } else {
                warn!(
                    "Zone {} on page {} is past the {}-page limit",
                    zone.id, zone.page, self.config.pdf.max_pages
                );
                ExtractionRecord::unreadable(zone)
            };
            records.push(record);

            let percent = (i + 1) as f32 / zones.len() as f32 * 100.0;
            progress.report(
                percent,
                &format!("Zone {}/{} ({}, page {})", i + 1, zones.len(), zone.tag(), zone.page),
            );
        }
        if zones.is_empty() {
            progress.report(100.0, "No zones to process");
        }

        let agents = AgentAggregator::aggregate(&records);
        info!(
            "Found {} agents on {} readable pages",
            agents.len(),
            pages_read.len()
        );

        Ok(ProcessingResult {
            agents,
            processed_pages: pages_read.len() as u32,
            total_pages,
        })
    }

    /// Load a PDF and process it.
    #[cfg(feature = "native")]
    pub async fn process_pdf<P: ProgressReporter>(
        &self,
        data: &[u8],
        zones: &[Zone],
        progress: &mut P,
    ) -> Result<ProcessingResult> {
        let document = crate::pdf::PdfExtractor::from_bytes(data)?;
        self.process_document(&document, zones, progress).await
    }

    /// Process named PDFs one after another.
    ///
    /// A document that fails to load is recorded and the batch goes on.
    #[cfg(feature = "native")]
    pub async fn process_batch<N, D, P>(
        &self,
        documents: &[(N, D)],
        zones: &[Zone],
        progress: &mut P,
    ) -> BatchResult
    where
        N: AsRef<str>,
        D: AsRef<[u8]>,
        P: ProgressReporter,
    {
        self.process_layers(
            documents.iter().map(|(name, data)| {
                let name = name.as_ref().to_string();
                let layer = crate::pdf::PdfExtractor::from_bytes(data.as_ref());
                (name, layer.map_err(Into::into))
            }),
            documents.len(),
            zones,
            progress,
        )
        .await
    }

    /// Process already opened text layers one after another.
    ///
    /// Each item is a document name with its layer or the error that
    /// prevented opening it.
    pub async fn process_layers<L, I, P>(
        &self,
        documents: I,
        count: usize,
        zones: &[Zone],
        progress: &mut P,
    ) -> BatchResult
    where
        L: TextLayer,
        I: IntoIterator<Item = (String, Result<L>)>,
        P: ProgressReporter,
    {
        let mut result = BatchResult::default();

        for (index, (name, layer)) in documents.into_iter().enumerate() {
            let mut slice = BatchSlice::new(progress, index, count);
            info!("Document {}/{}: {}", index + 1, count, name);

            let outcome = match layer {
                Ok(layer) => self.process_document(&layer, zones, &mut slice).await,
                Err(e) => Err(e),
            };

            let status = match outcome {
                Ok(processed) => DocumentStatus::Processed { result: processed },
                Err(e) => {
                    warn!("Document {} failed: {}", name, e);
                    slice.complete(&format!("{}: failed", name));
                    DocumentStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            result.documents.push(DocumentOutcome { name, status });
        }

        result
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(ZonexConfig::default())
    }
}

/// Load a PDF and extract its zones with `config`.
#[cfg(feature = "native")]
pub async fn process_pdf<P: ProgressReporter>(
    data: &[u8],
    zones: &[Zone],
    config: &ZonexConfig,
    progress: &mut P,
) -> Result<ProcessingResult> {
    Pipeline::new(config.clone())
        .process_pdf(data, zones, progress)
        .await
}

/// Process `(name, bytes)` documents sequentially with `config`.
#[cfg(feature = "native")]
pub async fn process_batch<N, D, P>(
    documents: &[(N, D)],
    zones: &[Zone],
    config: &ZonexConfig,
    progress: &mut P,
) -> BatchResult
where
    N: AsRef<str>,
    D: AsRef<[u8]>,
    P: ProgressReporter,
{
    Pipeline::new(config.clone())
        .process_batch(documents, zones, progress)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PdfError, ZonexError};
    use crate::models::{Observation, Rect, ZoneTag};
    use crate::pdf::{StaticTextLayer, TextFragment};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn zone(id: &str, tag: &str, x: f64, page: u32) -> Zone {
        Zone::new(id, Rect::new(x, 100.0, 80.0, 20.0), ZoneTag::parse(tag).unwrap(), page).unwrap()
    }

    fn form_zones(page: u32) -> Vec<Zone> {
        vec![
            zone(&format!("n{}", page), "NAME-T1", 100.0, page),
            zone(&format!("f{}", page), "FIRSTNAME-T1", 250.0, page),
            zone(&format!("a{}", page), "AMOUNT-T1", 400.0, page),
        ]
    }

    fn form_page(name: &str, first: &str, amount: &str) -> Vec<TextFragment> {
        vec![
            TextFragment::new(name, 110.0, 110.0),
            TextFragment::new(first, 260.0, 110.0),
            TextFragment::new(amount, 410.0, 110.0),
        ]
    }

    fn document() -> StaticTextLayer {
        StaticTextLayer::new(3)
            .with_page(1, form_page("MARTIN", "Zoé", "12,50 €"))
            .with_page(2, form_page("DUPONT", "Abel", "30 €"))
    }

    #[tokio::test]
    async fn test_process_document() {
        let zones: Vec<Zone> = (1..=3).flat_map(form_zones).collect();
        let mut updates = Vec::new();
        let mut progress = |p: f32, _: &str| updates.push(p);

        let result = Pipeline::default()
            .process_document(&document(), &zones, &mut progress)
            .await
            .unwrap();

        assert_eq!(result.total_pages, 3);
        assert_eq!(result.processed_pages, 3);
        assert_eq!(result.agents.len(), 2);
        assert_eq!(result.agents[0].name, "DUPONT");
        assert_eq!(result.agents[0].total, Decimal::new(30, 0));
        assert_eq!(result.agents[1].first_name, "Zoé");
        assert_eq!(result.agents[1].total, Decimal::new(125, 1));
        assert_eq!(result.agents[1].observation, Observation::None);

        assert_eq!(updates.len(), 9);
        assert!(updates.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(updates.last().copied(), Some(100.0));
    }

    #[tokio::test]
    async fn test_empty_zone_list_reports_completion() {
        let mut updates = Vec::new();
        let mut progress = |p: f32, _: &str| updates.push(p);
        let result = Pipeline::default()
            .process_document(&document(), &[], &mut progress)
            .await
            .unwrap();

        assert!(result.agents.is_empty());
        assert_eq!(result.processed_pages, 0);
        assert_eq!(updates, vec![100.0]);
    }

    #[tokio::test]
    async fn test_invalid_zone_is_rejected() {
        let mut bad = zone("bad", "NAME-T1", 100.0, 1);
        bad.rect.width = 0.0;

        let result = Pipeline::default()
            .process_document(&document(), &[bad], &mut NoProgress)
            .await;
        assert!(matches!(result, Err(ZonexError::Zone(_))));
    }

    #[tokio::test]
    async fn test_missing_page_counts_as_unread() {
        let zones = form_zones(7);
        let result = Pipeline::default()
            .process_document(&document(), &zones, &mut NoProgress)
            .await
            .unwrap();
        assert_eq!(result.processed_pages, 0);
        assert!(result.agents.is_empty());
    }

    #[tokio::test]
    async fn test_page_limit() {
        let mut config = ZonexConfig::default();
        config.pdf.max_pages = 1;
        let zones: Vec<Zone> = (1..=2).flat_map(form_zones).collect();

        let result = Pipeline::new(config)
            .process_document(&document(), &zones, &mut NoProgress)
            .await
            .unwrap();
        assert_eq!(result.processed_pages, 1);
        assert_eq!(result.agents.len(), 1);
        assert_eq!(result.agents[0].name, "MARTIN");
    }

    #[tokio::test]
    async fn test_batch_continues_after_failure() {
        let zones = form_zones(1);
        let documents = vec![
            ("a.pdf".to_string(), Ok(document())),
            (
                "broken.pdf".to_string(),
                Err(ZonexError::Pdf(PdfError::Parse("bad xref".to_string()))),
            ),
            ("c.pdf".to_string(), Ok(document())),
        ];
        let mut updates = Vec::new();
        let mut progress = |p: f32, _: &str| updates.push(p);

        let batch = Pipeline::default()
            .process_layers(documents, 3, &zones, &mut progress)
            .await;

        assert_eq!(batch.documents.len(), 3);
        assert_eq!(batch.processed_count(), 2);
        assert_eq!(batch.failures().count(), 1);
        assert_eq!(batch.agents().count(), 2);
        assert!(updates.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(updates.last().copied(), Some(100.0));
    }

    #[cfg(feature = "native")]
    #[tokio::test]
    async fn test_batch_rejects_unparseable_pdf() {
        let documents = vec![("junk.pdf", b"not a pdf".to_vec())];
        let batch = process_batch(
            &documents,
            &form_zones(1),
            &ZonexConfig::default(),
            &mut NoProgress,
        )
        .await;
        assert_eq!(batch.processed_count(), 0);
        assert!(matches!(
            batch.documents[0].status,
            DocumentStatus::Failed { .. }
        ));
    }
}
