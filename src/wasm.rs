//! WebAssembly exports for the picker.
//!
//! These functions are exposed to JavaScript via wasm-bindgen.
//!
//! ## Tickets
//!
//! Load tickets cross into JavaScript as the open generation. Submit
//! tickets are the generation plus an attempt counter. Hand them back
//! unchanged; results for a closed or reopened picker are ignored.
//!
//! ## Pixel Data
//!
//! Raster arguments and results are flat RGBA byte arrays
//! (length = width * height * 4), ready for `ImageData`.

use wasm_bindgen::prelude::*;

use crate::config::PickerConfig;
use crate::error::PickerError;
use crate::host;
use crate::raster::source::SourceBuffer;
use crate::selection::controller::{LoadTicket, SelectionController, SubmitTicket};
use crate::selection::hit_test::ViewTransform;

fn to_js(err: PickerError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ============================================================================
// Raster helpers
// ============================================================================

/// Distinct object ids present in a flat RGBA pick image, ascending.
#[wasm_bindgen]
pub fn identify_objects_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<u32>, JsValue> {
    let source = SourceBuffer::from_rgba(width, height, data.to_vec()).map_err(to_js)?;
    Ok(source.object_ids().into_iter().collect())
}

// ============================================================================
// Picker session
// ============================================================================

#[wasm_bindgen]
pub struct WasmPicker {
    inner: SelectionController,
    submit: Option<SubmitTicket>,
}

#[wasm_bindgen]
impl WasmPicker {
    /// Create a picker from a JSON configuration (`"{}"` for defaults).
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WasmPicker, JsValue> {
        let config = PickerConfig::from_json(config_json).map_err(to_js)?;
        let inner = SelectionController::new(config).map_err(to_js)?;
        Ok(WasmPicker { inner, submit: None })
    }

    /// Open a session.
    ///
    /// # Arguments
    /// * `manifest_json` - JSON object of id → label
    /// * `excluded` - Already excluded ids, JSON array or comma-separated
    ///
    /// # Returns
    /// Load ticket to pass to `load_png` / `load_rgba`. Malformed input is
    /// reported as such; an absent argument opens the picker disabled.
    pub fn open(&mut self, manifest_json: Option<String>, excluded: Option<String>) -> Result<u64, JsValue> {
        let (manifest, excluded) =
            host::parse_open_args(manifest_json.as_deref(), excluded.as_deref()).map_err(to_js)?;
        self.submit = None;
        self.inner
            .open(manifest, excluded)
            .map(|ticket| ticket.generation())
            .map_err(to_js)
    }

    pub fn load_png(&mut self, ticket: u64, data: &[u8]) -> Result<bool, JsValue> {
        self.inner
            .complete_load_png(LoadTicket::from_raw(ticket), Ok(data))
            .map_err(to_js)
    }

    pub fn load_rgba(&mut self, ticket: u64, data: &[u8], width: usize, height: usize) -> Result<bool, JsValue> {
        let source = SourceBuffer::from_rgba(width, height, data.to_vec());
        self.inner
            .complete_load(LoadTicket::from_raw(ticket), source)
            .map_err(to_js)
    }

    pub fn load_failed(&mut self, ticket: u64, reason: String) -> Result<bool, JsValue> {
        self.inner
            .complete_load_png(LoadTicket::from_raw(ticket), Err(reason))
            .map_err(to_js)
    }

    /// Toggle the object under the pointer; `undefined` when nothing was hit.
    pub fn click(&mut self, x: f64, y: f64, display_width: f64, display_height: f64) -> Option<bool> {
        let view = self.view(display_width, display_height);
        self.inner.click(x, y, &view)
    }

    pub fn hover(&mut self, x: f64, y: f64, display_width: f64, display_height: f64) -> bool {
        let view = self.view(display_width, display_height);
        self.inner.hover(x, y, &view)
    }

    pub fn hover_leave(&mut self) -> bool {
        self.inner.hover_leave()
    }

    /// List-widget checkbox.
    pub fn toggle(&mut self, id: u32) -> Option<bool> {
        self.inner.toggle_from_list(id)
    }

    pub fn hovered(&self) -> Option<u32> {
        self.inner.hovered()
    }

    /// Objects as a JSON array of `{id, label, locked, pending}`.
    pub fn records_json(&self) -> String {
        let records: Vec<serde_json::Value> = self
            .inner
            .registry()
            .map(|r| {
                r.iter()
                    .map(|o| {
                        serde_json::json!({
                            "id": o.id,
                            "label": o.label,
                            "locked": o.already_excluded,
                            "pending": o.pending_exclusion,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        serde_json::Value::Array(records).to_string()
    }

    pub fn needs_repaint(&self) -> bool {
        self.inner.needs_repaint()
    }

    /// Current overlay as flat RGBA bytes; empty while the canvas is blank.
    pub fn display(&mut self) -> Vec<u8> {
        self.inner
            .display()
            .map(|frame| frame.to_rgba_vec())
            .unwrap_or_default()
    }

    /// Start a submit; returns the normalized id list to send.
    pub fn begin_commit(&mut self) -> Result<String, JsValue> {
        let request = self.inner.begin_commit().map_err(to_js)?;
        self.submit = Some(request.ticket);
        Ok(request.ids)
    }

    pub fn device_id(&self) -> String {
        self.inner.config().device_id.clone()
    }

    /// Report the submit outcome; `error` is `undefined` on success.
    pub fn complete_commit(&mut self, error: Option<String>) -> Result<bool, JsValue> {
        let Some(ticket) = self.submit.take() else {
            return Ok(false);
        };
        let result = match error {
            Some(reason) => Err(reason),
            None => Ok(()),
        };
        self.inner.complete_commit(ticket, result).map_err(to_js)
    }

    pub fn close(&mut self) {
        self.submit = None;
        self.inner.close();
    }
}

impl WasmPicker {
    fn view(&self, display_width: f64, display_height: f64) -> ViewTransform {
        let (w, h) = self.inner.config().dimensions();
        ViewTransform::new(display_width, display_height, w, h)
    }
}
