//! Geometric test between text fragments and zones.

use crate::models::{ExtractionConfig, Rect};
use crate::pdf::TextFragment;

/// Decides which fragments belong to a zone.
#[derive(Debug, Clone, Copy)]
pub struct ZoneMatcher {
    tolerance: f64,
    expand_x: f64,
    expand_y: f64,
}

impl ZoneMatcher {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            expand_x: config.expand_x,
            expand_y: config.expand_y,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Whether the fragment's anchor lies in `rect` grown by `tolerance`.
    ///
    /// Blank fragments and fragments without a finite position never match.
    pub fn fragment_in_zone(fragment: &TextFragment, rect: &Rect, tolerance: f64) -> bool {
        if fragment.is_blank() || !fragment.has_finite_position() {
            return false;
        }
        fragment.x >= rect.x - tolerance
            && fragment.x <= rect.right() + tolerance
            && fragment.y >= rect.y - tolerance
            && fragment.y <= rect.bottom() + tolerance
    }

    /// Text of every fragment in `rect`, space-joined in fragment order.
    pub fn text_in_zone(&self, fragments: &[TextFragment], rect: &Rect) -> String {
        fragments
            .iter()
            .filter(|f| Self::fragment_in_zone(f, rect, self.tolerance))
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }

    /// The enlarged rectangle tried when the zone itself is empty.
    pub fn expand(&self, rect: &Rect) -> Rect {
        Rect::new(
            (rect.x - self.expand_x).max(0.0),
            (rect.y - self.expand_y).max(0.0),
            rect.width + 2.0 * self.expand_x,
            rect.height + 2.0 * self.expand_y,
        )
    }
}

impl Default for ZoneMatcher {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fragment_in_zone_with_tolerance() {
        let rect = Rect::new(100.0, 200.0, 50.0, 20.0);
        let inside = TextFragment::new("DUPONT", 120.0, 210.0);
        let near = TextFragment::new("DUPONT", 92.0, 228.0);
        let far = TextFragment::new("DUPONT", 89.0, 210.0);

        assert!(ZoneMatcher::fragment_in_zone(&inside, &rect, 10.0));
        assert!(ZoneMatcher::fragment_in_zone(&near, &rect, 10.0));
        assert!(!ZoneMatcher::fragment_in_zone(&far, &rect, 10.0));
        assert!(!ZoneMatcher::fragment_in_zone(&near, &rect, 0.0));
    }

    #[test]
    fn test_blank_and_malformed_fragments_never_match() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(!ZoneMatcher::fragment_in_zone(&TextFragment::new("  ", 10.0, 10.0), &rect, 10.0));
        assert!(!ZoneMatcher::fragment_in_zone(
            &TextFragment::new("X", f64::NAN, 10.0),
            &rect,
            10.0
        ));
    }

    #[test]
    fn test_text_in_zone_keeps_fragment_order() {
        let matcher = ZoneMatcher::default();
        let fragments = vec![
            TextFragment::new("Jean", 130.0, 205.0),
            TextFragment::new("Marie", 400.0, 205.0),
            TextFragment::new("Pierre", 110.0, 205.0),
        ];
        let text = matcher.text_in_zone(&fragments, &Rect::new(100.0, 200.0, 50.0, 20.0));
        assert_eq!(text, "Jean Pierre");
    }

    #[test]
    fn test_expand_clamps_at_page_origin() {
        let matcher = ZoneMatcher::default();
        assert_eq!(
            matcher.expand(&Rect::new(100.0, 200.0, 50.0, 20.0)),
            Rect::new(80.0, 190.0, 90.0, 40.0)
        );
        assert_eq!(
            matcher.expand(&Rect::new(5.0, 3.0, 50.0, 20.0)),
            Rect::new(0.0, 0.0, 90.0, 40.0)
        );
    }
}
