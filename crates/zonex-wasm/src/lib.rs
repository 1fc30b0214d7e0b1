//! WASM bindings for zone-based extraction.
//!
//! The browser renders pages and reads their text with pdf.js; this crate
//! takes those text items and the user's zones and returns the agents.

use serde::Deserialize;
use wasm_bindgen::prelude::*;

use zonex_core::pdf::PageGeometry;
use zonex_core::{
    CanvasTransform, NoProgress, Pipeline, Rect, StaticTextLayer, TextFragment, Zone, ZonexConfig,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Parse an amount such as `"12,50 €"`; unreadable text gives 0.
#[wasm_bindgen]
pub fn parse_amount(text: &str) -> f64 {
    zonex_core::parse_amount(text)
        .to_string()
        .parse()
        .unwrap_or(0.0)
}

/// Strip everything that cannot be part of a person's name.
#[wasm_bindgen]
pub fn clean_name(text: &str) -> String {
    zonex_core::clean_name(text)
}

/// Convert a rectangle drawn on a canvas rendered at `scale` to reference units.
#[wasm_bindgen]
pub fn canvas_to_reference(rect: JsValue, scale: f64) -> Result<JsValue, JsValue> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(JsValue::from_str("scale must be positive"));
    }
    let rect: Rect = serde_wasm_bindgen::from_value(rect).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&CanvasTransform::new(scale).to_reference(rect))
        .map_err(to_js_error)
}

/// A pdf.js text content item.
///
/// Marked-content items carry neither a string nor a matrix.
#[derive(Deserialize)]
struct PdfJsTextItem {
    #[serde(rename = "str", default)]
    text: Option<String>,
    /// `[a, b, c, d, e, f]`; `e` and `f` are the user-space origin.
    #[serde(default)]
    transform: Option<[f64; 6]>,
}

/// Zone extractor class for browser use.
#[wasm_bindgen]
pub struct ZoneExtractor {
    config: ZonexConfig,
    zones: Vec<Zone>,
    layer: StaticTextLayer,
}

#[wasm_bindgen]
impl ZoneExtractor {
    /// Create an extractor for a document of `page_count` pages.
    ///
    /// `config` is an optional partial configuration object.
    #[wasm_bindgen(constructor)]
    pub fn new(page_count: u32, config: JsValue) -> Result<ZoneExtractor, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            ZonexConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(to_js_error)?
        };
        config.validate().map_err(to_js_error)?;

        Ok(Self {
            config,
            zones: Vec::new(),
            layer: StaticTextLayer::new(page_count),
        })
    }

    /// Replace the zones, given as an array of zone objects in reference units.
    #[wasm_bindgen]
    pub fn set_zones(&mut self, zones: JsValue) -> Result<(), JsValue> {
        let zones: Vec<Zone> = serde_wasm_bindgen::from_value(zones).map_err(to_js_error)?;
        for zone in &zones {
            zone.validate().map_err(to_js_error)?;
        }
        self.zones = zones;
        Ok(())
    }

    /// Add the pdf.js text items of a page.
    ///
    /// `page_height` is the unscaled viewport height used to move the
    /// origin to the top-left corner.
    #[wasm_bindgen]
    pub fn add_page(&mut self, page: u32, page_height: f64, items: JsValue) -> Result<(), JsValue> {
        if page == 0 {
            return Err(JsValue::from_str("pages are numbered from 1"));
        }
        let items: Vec<PdfJsTextItem> =
            serde_wasm_bindgen::from_value(items).map_err(to_js_error)?;
        let geometry = PageGeometry::new(0.0, 0.0, page_height);

        let fragments = items
            .into_iter()
            .filter_map(|item| match (item.text, item.transform) {
                (Some(text), Some(transform)) => Some(TextFragment::from_user_space(
                    text,
                    &geometry,
                    transform[4],
                    transform[5],
                )),
                _ => None,
            })
            .collect();
        self.layer.set_page(page, fragments);
        Ok(())
    }

    /// Number of zones currently set.
    #[wasm_bindgen(getter)]
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Run extraction; resolves to the processing result.
    ///
    /// `on_progress`, if given, is called with `(percent, status)` after
    /// each zone.
    #[wasm_bindgen]
    pub fn process(&self, on_progress: Option<js_sys::Function>) -> js_sys::Promise {
        let pipeline = Pipeline::new(self.config.clone());
        let zones = self.zones.clone();
        let layer = self.layer.clone();

        wasm_bindgen_futures::future_to_promise(async move {
            let result = match on_progress {
                Some(callback) => {
                    let mut progress = |percent: f32, status: &str| {
                        let outcome = callback.call2(
                            &JsValue::NULL,
                            &JsValue::from_f64(percent as f64),
                            &JsValue::from_str(status),
                        );
                        if outcome.is_err() {
                            web_sys::console::warn_1(&JsValue::from_str(
                                "zonex: progress callback threw",
                            ));
                        }
                    };
                    pipeline.process_document(&layer, &zones, &mut progress).await
                }
                None => pipeline.process_document(&layer, &zones, &mut NoProgress).await,
            }
            .map_err(to_js_error)?;

            serde_wasm_bindgen::to_value(&result).map_err(to_js_error)
        })
    }
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}
