//! PDF text layer access.
//!
//! The extraction core only needs three things from a document: how many
//! pages it has, the positioned text fragments of a page, and optionally a
//! picture of a page. [`TextLayer`] is that capability; [`PdfExtractor`]
//! implements it on top of lopdf and pdf-extract, [`StaticTextLayer`] keeps
//! pre-computed fragments in memory.

mod enhance;
#[cfg(feature = "native")]
mod extractor;

pub use enhance::PageEnhancer;

#[cfg(feature = "native")]
pub use extractor::PdfExtractor;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// A run of text with its anchor point.
///
/// The anchor is in reference units (scale 1.0, top-left origin), the same
/// space zones are expressed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }

    /// Build a fragment from PDF user-space coordinates (bottom-left origin).
    pub fn from_user_space(text: impl Into<String>, geometry: &PageGeometry, x: f64, y: f64) -> Self {
        let (x, y) = geometry.to_top_left(x, y);
        Self::new(text, x, y)
    }

    /// Blank fragments never take part in zone matching.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn has_finite_position(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Page box used to flip PDF user space into reference units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Left edge of the media box.
    pub origin_x: f64,
    /// Bottom edge of the media box.
    pub origin_y: f64,
    /// Unscaled media box height.
    pub height: f64,
}

impl PageGeometry {
    pub fn new(origin_x: f64, origin_y: f64, height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            height,
        }
    }

    /// Geometry of a media box given as `(llx, lly, urx, ury)`.
    pub fn from_media_box(llx: f64, lly: f64, _urx: f64, ury: f64) -> Self {
        Self::new(llx, lly, ury - lly)
    }

    /// Convert a user-space point to the top-left origin used by zones.
    pub fn to_top_left(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.origin_x, self.height - (y - self.origin_y))
    }
}

/// Join every fragment of a page with single spaces.
pub fn page_text(fragments: &[TextFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render `page` of `layer`, optionally enhance it, and save it to `path`.
///
/// The image format follows the file extension.
pub fn save_page_image<L: TextLayer>(
    layer: &L,
    page: u32,
    enhancer: Option<&PageEnhancer>,
    path: &std::path::Path,
) -> crate::Result<()> {
    let mut image = layer.render_page(page)?;
    if let Some(enhancer) = enhancer {
        image = enhancer.enhance(&image);
    }
    image.save(path)?;
    Ok(())
}

/// Narrow view of a document used by the extraction pipeline.
pub trait TextLayer {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Positioned text fragments of a page (1-indexed), in content order.
    fn page_fragments(&self, page: u32) -> impl Future<Output = Result<Vec<TextFragment>>>;

    /// Render a page as an image.
    fn render_page(&self, page: u32) -> Result<DynamicImage> {
        let _ = page;
        Err(PdfError::ImageExtraction(
            "this text layer cannot render pages".to_string(),
        ))
    }
}

/// In-memory text layer, one fragment list per page.
#[derive(Debug, Clone, Default)]
pub struct StaticTextLayer {
    pages: BTreeMap<u32, Vec<TextFragment>>,
    page_count: u32,
}

impl StaticTextLayer {
    /// Create an empty layer with `page_count` pages.
    pub fn new(page_count: u32) -> Self {
        Self {
            pages: BTreeMap::new(),
            page_count,
        }
    }

    /// Set the fragments of a page, growing the page count if needed.
    pub fn with_page(mut self, page: u32, fragments: Vec<TextFragment>) -> Self {
        self.set_page(page, fragments);
        self
    }

    pub fn set_page(&mut self, page: u32, fragments: Vec<TextFragment>) {
        self.page_count = self.page_count.max(page);
        self.pages.insert(page, fragments);
    }
}

impl TextLayer for StaticTextLayer {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    async fn page_fragments(&self, page: u32) -> Result<Vec<TextFragment>> {
        if page == 0 || page > self.page_count {
            return Err(PdfError::InvalidPage(page));
        }
        Ok(self.pages.get(&page).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flip_uses_unscaled_height() {
        let geometry = PageGeometry::from_media_box(0.0, 0.0, 595.0, 842.0);
        assert_eq!(geometry.to_top_left(100.0, 742.0), (100.0, 100.0));

        let shifted = PageGeometry::from_media_box(10.0, 20.0, 605.0, 862.0);
        assert_eq!(shifted.to_top_left(110.0, 762.0), (100.0, 100.0));
    }

    #[test]
    fn test_page_text_joins_with_spaces() {
        let fragments = vec![
            TextFragment::new("TOTAL", 0.0, 0.0),
            TextFragment::new("A", 0.0, 0.0),
            TextFragment::new("PAYER", 0.0, 0.0),
        ];
        assert_eq!(page_text(&fragments), "TOTAL A PAYER");
    }

    #[tokio::test]
    async fn test_static_layer_bounds() {
        let layer = StaticTextLayer::new(2).with_page(1, vec![TextFragment::new("x", 1.0, 2.0)]);
        assert_eq!(layer.page_fragments(1).await.unwrap().len(), 1);
        assert!(layer.page_fragments(2).await.unwrap().is_empty());
        assert!(matches!(
            layer.page_fragments(3).await,
            Err(PdfError::InvalidPage(3))
        ));
        assert!(layer.render_page(1).is_err());
    }
}
