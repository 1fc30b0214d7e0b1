//! Three-tier zone extraction.

use rust_decimal::Decimal;
use tracing::{debug, trace, warn};

use super::cleaner::{clean_field, parse_amount};
use super::matcher::ZoneMatcher;
use super::patterns::PatternExtractor;
use crate::models::{ExtractionConfig, ExtractionRecord, FieldKind, Resolution, Zone};
use crate::pdf::{TextFragment, TextLayer, page_text};

/// Outcome of one zone: the record and whether the page could be read.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneOutcome {
    pub record: ExtractionRecord,
    pub page_read: bool,
}

/// Resolves zones against a text layer.
///
/// Each zone is tried in turn against its own rectangle, an enlarged
/// rectangle, and a page-wide pattern search. When all three come back
/// empty the zone gets the UNREADABLE sentinel record.
#[derive(Debug, Clone)]
pub struct ZoneExtractionEngine {
    matcher: ZoneMatcher,
    patterns: PatternExtractor,
}

impl ZoneExtractionEngine {
    /// Create an engine from extraction settings.
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            matcher: ZoneMatcher::new(config),
            patterns: PatternExtractor::new(config),
        }
    }

    /// Extract a single zone.
    ///
    /// Page access errors never propagate: the zone degrades to the sentinel.
    pub async fn extract_zone<L: TextLayer>(&self, layer: &L, zone: &Zone) -> ZoneOutcome {
        match layer.page_fragments(zone.page).await {
            Ok(fragments) => {
                trace!("Page {} has {} fragments", zone.page, fragments.len());
                ZoneOutcome {
                    record: self.resolve(zone, &fragments),
                    page_read: true,
                }
            }
            Err(e) => {
                warn!("Zone {} unreadable, page {} failed: {}", zone.id, zone.page, e);
                ZoneOutcome {
                    record: ExtractionRecord::unreadable(zone),
                    page_read: false,
                }
            }
        }
    }

    /// Resolve a zone against the already fetched fragments of its page.
    pub fn resolve(&self, zone: &Zone, fragments: &[TextFragment]) -> ExtractionRecord {
        let Some((raw, resolution)) = self.find_text(zone, fragments) else {
            debug!("Zone {} ({}) is unreadable", zone.id, zone.tag());
            return ExtractionRecord::unreadable(zone);
        };

        let cleaned = clean_field(zone.kind, &raw);
        let amount = match zone.kind {
            FieldKind::Amount => parse_amount(&cleaned),
            _ => Decimal::ZERO,
        };
        debug!(
            "Zone {} ({}) resolved {:?} as {:?}",
            zone.id,
            zone.tag(),
            resolution,
            cleaned
        );
        ExtractionRecord::resolved(zone, raw, cleaned, amount, resolution)
    }

    fn find_text(&self, zone: &Zone, fragments: &[TextFragment]) -> Option<(String, Resolution)> {
        let direct = self.matcher.text_in_zone(fragments, &zone.rect);
        if !direct.is_empty() {
            return Some((direct, Resolution::Direct));
        }

        let expanded = self
            .matcher
            .text_in_zone(fragments, &self.matcher.expand(&zone.rect));
        if !expanded.is_empty() {
            debug!("Zone {} matched after expansion", zone.id);
            return Some((expanded, Resolution::Expanded));
        }

        self.patterns
            .extract(zone.kind, &page_text(fragments))
            .filter(|found| !found.is_empty())
            .map(|found| (found, Resolution::Pattern))
    }
}

impl Default for ZoneExtractionEngine {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FormVariant, Rect, UNREADABLE, ZoneTag};
    use crate::pdf::StaticTextLayer;
    use pretty_assertions::assert_eq;

    fn zone(id: &str, tag: &str, rect: Rect, page: u32) -> Zone {
        Zone::new(id, rect, ZoneTag::parse(tag).unwrap(), page).unwrap()
    }

    fn layer() -> StaticTextLayer {
        StaticTextLayer::new(2).with_page(
            1,
            vec![
                TextFragment::new("DUPONT", 105.0, 205.0),
                TextFragment::new("Jean", 300.0, 205.0),
                TextFragment::new("50,00 €", 420.0, 500.0),
            ],
        )
    }

    #[tokio::test]
    async fn test_direct_match() {
        let engine = ZoneExtractionEngine::default();
        let z = zone("z1", "NAME-T1", Rect::new(100.0, 200.0, 80.0, 20.0), 1);

        let outcome = engine.extract_zone(&layer(), &z).await;
        assert!(outcome.page_read);
        assert_eq!(outcome.record.name, "DUPONT");
        assert_eq!(outcome.record.resolution, Resolution::Direct);
        assert_eq!(outcome.record.coordinates.name, z.rect);
    }

    #[tokio::test]
    async fn test_expanded_match() {
        let engine = ZoneExtractionEngine::default();
        // Fragment sits 15 units left of the zone: outside tolerance, inside expansion.
        let z = zone("z2", "FIRSTNAME-T1", Rect::new(315.0, 200.0, 60.0, 20.0), 1);

        let record = engine.extract_zone(&layer(), &z).await.record;
        assert_eq!(record.first_name, "Jean");
        assert_eq!(record.resolution, Resolution::Expanded);
    }

    #[tokio::test]
    async fn test_pattern_fallback() {
        let engine = ZoneExtractionEngine::default();
        let z = zone("z3", "AMOUNT-T2", Rect::new(10.0, 10.0, 30.0, 10.0), 1);

        let record = engine.extract_zone(&layer(), &z).await.record;
        assert_eq!(record.amount, Decimal::new(50, 0));
        assert_eq!(record.variant, FormVariant::T2);
        assert_eq!(record.resolution, Resolution::Pattern);
    }

    #[tokio::test]
    async fn test_empty_page_gives_sentinel() {
        let engine = ZoneExtractionEngine::default();
        let name = zone("z4", "NAME-T1", Rect::new(10.0, 10.0, 30.0, 10.0), 2);
        let amount = zone("z5", "AMOUNT-T1", Rect::new(10.0, 10.0, 30.0, 10.0), 2);

        let outcome = engine.extract_zone(&layer(), &name).await;
        assert!(outcome.page_read);
        assert_eq!(outcome.record.name, UNREADABLE);
        assert_eq!(outcome.record.extracted_text.name, UNREADABLE);

        let record = engine.extract_zone(&layer(), &amount).await.record;
        assert_eq!(record.amount, Decimal::ZERO);
        assert_eq!(record.extracted_text.amount, "");
        assert_eq!(record.resolution, Resolution::Unreadable);
    }

    #[tokio::test]
    async fn test_bad_page_degrades_zone() {
        let engine = ZoneExtractionEngine::default();
        let z = zone("z6", "FIRSTNAME-T1", Rect::new(10.0, 10.0, 30.0, 10.0), 9);

        let outcome = engine.extract_zone(&layer(), &z).await;
        assert!(!outcome.page_read);
        assert_eq!(outcome.record.first_name, UNREADABLE);
    }

    #[tokio::test]
    async fn test_resolution_is_repeatable() {
        let engine = ZoneExtractionEngine::default();
        let layer = layer();
        for z in [
            zone("a", "NAME-T1", Rect::new(100.0, 200.0, 80.0, 20.0), 1),
            zone("b", "AMOUNT-T1", Rect::new(10.0, 10.0, 30.0, 10.0), 1),
            zone("c", "FIRSTNAME-T1", Rect::new(10.0, 10.0, 30.0, 10.0), 2),
        ] {
            let first = engine.extract_zone(&layer, &z).await;
            let second = engine.extract_zone(&layer, &z).await;
            assert_eq!(first, second);
        }
    }
}
