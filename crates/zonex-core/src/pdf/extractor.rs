//! PDF text layer and page images using lopdf and pdf-extract.

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Document, Object, ObjectId};
use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace, warn};

use super::{PageGeometry, Result, TextFragment, TextLayer};
use crate::error::PdfError;

/// Text layer of a loaded PDF document.
///
/// Positioned text is read once at load time. If pdf-extract fails part way
/// through the document, pages read before the failure stay available and
/// later pages report [`PdfError::TextExtraction`].
pub struct PdfExtractor {
    document: Option<Document>,
    fragments: BTreeMap<u32, Vec<TextFragment>>,
    text_failure: Option<(u32, String)>,
}

impl PdfExtractor {
    /// Create an extractor with no document loaded.
    pub fn new() -> Self {
        Self {
            document: None,
            fragments: BTreeMap::new(),
            text_failure: None,
        }
    }

    /// Parse a PDF from bytes and read its text layer.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        let raw_data = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            decrypted_data
        } else {
            data.to_vec()
        };

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        self.read_text_layer(&raw_data);
        Ok(())
    }

    /// Load a PDF from bytes in one step.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut extractor = Self::new();
        extractor.load(data)?;
        Ok(extractor)
    }

    /// Read and load a PDF file.
    pub fn open(path: &std::path::Path) -> crate::Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::from_bytes(&data)?)
    }

    fn read_text_layer(&mut self, raw_data: &[u8]) {
        self.fragments.clear();
        self.text_failure = None;

        let doc = match pdf_extract::Document::load_mem(raw_data) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Text layer unavailable: {}", e);
                self.text_failure = Some((1, e.to_string()));
                return;
            }
        };

        let mut collector = FragmentCollector::default();
        let outcome = pdf_extract::output_doc(&doc, &mut collector);
        let failed_page = collector.current_page;
        self.fragments = collector.finish();

        if let Err(e) = outcome {
            warn!("Text layer read stopped at page {}: {}", failed_page, e);
            self.fragments.retain(|page, _| *page < failed_page);
            self.text_failure = Some((failed_page.max(1), e.to_string()));
        }

        debug!(
            "Read {} text fragments over {} pages",
            self.fragments.values().map(Vec::len).sum::<usize>(),
            self.fragments.len()
        );
    }

    fn try_extract_image_from_object(&self, doc: &Document, obj: &Object) -> Option<DynamicImage> {
        if let Object::Stream(stream) = obj {
            let dict = &stream.dict;

            let subtype = dict.get(b"Subtype").ok()?;
            if subtype.as_name().ok()? != b"Image" {
                return None;
            }

            let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
            let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;

            trace!("Found image object: {}x{}", width, height);

            let data = match stream.decompressed_content() {
                Ok(d) => d,
                Err(_) => stream.content.clone(),
            };

            if let Ok(filter) = dict.get(b"Filter") {
                let filter_name = match filter {
                    Object::Name(name) => Some(name.as_slice()),
                    Object::Array(arr) if !arr.is_empty() => {
                        arr.first().and_then(|o| o.as_name().ok())
                    }
                    _ => None,
                };

                match filter_name {
                    Some(b"DCTDecode") => {
                        // JPEG scans: the raw stream is the image file
                        return image::load_from_memory_with_format(
                            &stream.content,
                            image::ImageFormat::Jpeg,
                        )
                        .ok();
                    }
                    Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                        trace!("Unsupported scan encoding {:?}", filter_name);
                        return None;
                    }
                    _ => {}
                }
            }

            let color_space = dict
                .get(b"ColorSpace")
                .ok()
                .and_then(|o| match o {
                    Object::Name(name) => Some(name.as_slice()),
                    Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                    Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                    _ => None,
                })
                .unwrap_or(b"DeviceRGB");

            let bits = dict
                .get(b"BitsPerComponent")
                .ok()
                .and_then(|o| o.as_i64().ok())
                .unwrap_or(8) as u8;

            return create_image_from_raw(&data, width, height, color_space, bits);
        }
        None
    }

    /// Resources dictionary of a page, following `Parent` inheritance.
    fn page_resources(&self, doc: &Document, node_id: ObjectId) -> Option<lopdf::Dictionary> {
        let node = doc.get_object(node_id).ok()?;
        if let Object::Dictionary(dict) = node {
            if let Ok(resources) = dict.get(b"Resources") {
                if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
                    return Some(res_dict.clone());
                }
            }

            if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent") {
                return self.page_resources(doc, *parent_id);
            }
        }
        None
    }

    /// Images drawn on a page through its XObject resources.
    pub fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let doc = self
            .document
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))?;

        let pages = doc.get_pages();
        let page_id = pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut images = Vec::new();
        if let Some(resources) = self.page_resources(doc, *page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = doc.dereference(obj_ref) {
                            if let Some(img) = self.try_extract_image_from_object(doc, obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        debug!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }

    /// Collect unique image objects across the whole document.
    fn all_images(&self) -> Vec<DynamicImage> {
        let doc = match self.document.as_ref() {
            Some(d) => d,
            None => return vec![],
        };

        let mut images = Vec::new();
        let mut seen_objects: HashSet<ObjectId> = HashSet::new();
        for (id, object) in doc.objects.iter() {
            if !seen_objects.insert(*id) {
                continue;
            }
            if let Some(img) = self.try_extract_image_from_object(doc, object) {
                images.push(img);
            }
        }
        images
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayer for PdfExtractor {
    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    async fn page_fragments(&self, page: u32) -> Result<Vec<TextFragment>> {
        if page == 0 || page > self.page_count() {
            return Err(PdfError::InvalidPage(page));
        }
        if let Some((failed_from, message)) = &self.text_failure {
            if page >= *failed_from {
                return Err(PdfError::TextExtraction(message.clone()));
            }
        }
        Ok(self.fragments.get(&page).cloned().unwrap_or_default())
    }

    fn render_page(&self, page: u32) -> Result<DynamicImage> {
        if let Some(first) = self.page_images(page)?.into_iter().next() {
            return Ok(first);
        }

        // Scanners sometimes share one image object per page without
        // attaching it to the page resources.
        let page_idx = (page - 1) as usize;
        self.all_images()
            .into_iter()
            .nth(page_idx)
            .ok_or_else(|| PdfError::ImageExtraction(format!("no image found for page {}", page)))
    }
}

fn create_image_from_raw(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: u8,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let expected_rgb = (width * height * 3) as usize;
    let expected_gray = (width * height) as usize;

    let rgba_data: Vec<u8> = if (color_space == b"DeviceRGB" || color_space == b"RGB")
        && data.len() >= expected_rgb
    {
        data[..expected_rgb]
            .chunks(3)
            .flat_map(|c| [c[0], c[1], c[2], 255])
            .collect()
    } else if (color_space == b"DeviceGray" || color_space == b"G") && data.len() >= expected_gray {
        data[..expected_gray]
            .iter()
            .flat_map(|&g| [g, g, g, 255])
            .collect()
    } else {
        trace!(
            "Could not decode image: data_len={}, expected_rgb={}, expected_gray={}",
            data.len(),
            expected_rgb,
            expected_gray
        );
        return None;
    };

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba_data).map(DynamicImage::ImageRgba8)
}

/// Groups pdf-extract glyphs into fragments, one per shown string.
///
/// Consecutive strings on the same baseline that touch each other (kerned
/// `TJ` pieces) are merged into one fragment.
#[derive(Default)]
struct FragmentCollector {
    pages: BTreeMap<u32, Vec<TextFragment>>,
    current_page: u32,
    geometry: Option<PageGeometry>,
    current: Option<OpenFragment>,
    in_word: bool,
}

struct OpenFragment {
    text: String,
    /// Anchor in user space.
    x: f64,
    y: f64,
    /// Where the last glyph ended, in user space.
    end_x: f64,
    font_size: f64,
}

impl FragmentCollector {
    fn flush(&mut self) {
        if let (Some(open), Some(geometry)) = (self.current.take(), self.geometry) {
            if !open.text.trim().is_empty() {
                self.pages
                    .entry(self.current_page)
                    .or_default()
                    .push(TextFragment::from_user_space(open.text, &geometry, open.x, open.y));
            }
        }
    }

    fn finish(mut self) -> BTreeMap<u32, Vec<TextFragment>> {
        self.flush();
        self.pages
    }
}

impl OutputDev for FragmentCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> std::result::Result<(), OutputError> {
        self.flush();
        self.current_page = page_num;
        self.geometry = Some(PageGeometry::from_media_box(
            media_box.llx,
            media_box.lly,
            media_box.urx,
            media_box.ury,
        ));
        self.pages.entry(page_num).or_default();
        Ok(())
    }

    fn end_page(&mut self) -> std::result::Result<(), OutputError> {
        self.flush();
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> std::result::Result<(), OutputError> {
        let x = trm.m31;
        let y = trm.m32;
        // Glyph size in user space, as pdf-extract's own text output computes it
        let scaled_x = font_size * (trm.m11 + trm.m21);
        let scaled_y = font_size * (trm.m12 + trm.m22);
        let size = (scaled_x * scaled_y).abs().sqrt();

        let starts_word = !std::mem::replace(&mut self.in_word, true);
        let continues = match &self.current {
            Some(_) if !starts_word => true,
            Some(open) => {
                (open.y - y).abs() < open.font_size * 0.5
                    && x >= open.end_x - 0.5
                    && x - open.end_x < open.font_size * 0.15
            }
            None => false,
        };

        if !continues {
            self.flush();
            self.current = Some(OpenFragment {
                text: String::new(),
                x,
                y,
                end_x: x,
                font_size: size.max(1.0),
            });
        }

        if let Some(open) = self.current.as_mut() {
            open.text.push_str(char);
            open.end_x = x + width * size;
        }
        Ok(())
    }

    fn begin_word(&mut self) -> std::result::Result<(), OutputError> {
        self.in_word = false;
        Ok(())
    }

    fn end_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> std::result::Result<(), OutputError> {
        self.flush();
        Ok(())
    }
}
