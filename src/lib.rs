//! Plate Picker
//!
//! Skip-object picker for 3D-print plates: a pick raster encodes every
//! printable object as a flat, uniquely colored region, and the user toggles
//! objects for exclusion by clicking them on a recolored overlay. Python
//! bindings via PyO3 and WASM bindings for JavaScript hosts are optional.
//!
//! ## Image Format
//! Pick rasters are RGBA, `(height, width, 4)`, 8 bits per channel. The
//! object id of a pixel is `r | g << 8 | b << 16`; alpha never takes part.
//! Black (`0`) is the background.
//!
//! ## Architecture
//! - **raster**: identity codec and the immutable pick raster
//! - **render**: border detection and the full-frame overlay renderer
//! - **selection**: object registry, hit testing and the session controller
//! - **host**: plugin registration, image endpoint, manifest parsing
//!
//! The overlay is a pure function of (raster, registry, hover), recomputed
//! in full on every change and never read back for hit testing.

pub mod config;
pub mod error;
pub mod host;
pub mod raster;
pub mod render;
pub mod selection;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{Palette, PickerConfig};
pub use error::{PickerError, Result};
pub use raster::{PackedColorId, SourceBuffer, BACKGROUND_ID};
pub use render::{render, DisplayBuffer, OverlayStyle};
pub use selection::{
    CommitRequest, LoadTicket, Manifest, ObjectRecord, ObjectRegistry, PickerAction, PickerState,
    SelectionController, SubmitTicket, ViewTransform,
};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use std::collections::{BTreeMap, BTreeSet};

    use numpy::{IntoPyArray, PyArray2, PyArray3, PyReadonlyArray3};
    use pyo3::exceptions::{PyRuntimeError, PyValueError};
    use pyo3::prelude::*;

    use crate::config::PickerConfig;
    use crate::error::PickerError;
    use crate::raster::source::SourceBuffer;
    use crate::render::border;
    use crate::render::overlay::{render, OverlayStyle};
    use crate::selection::controller::{LoadTicket, SelectionController, SubmitTicket};
    use crate::selection::hit_test::ViewTransform;
    use crate::selection::registry::ObjectRegistry;

    fn to_py_err(err: PickerError) -> PyErr {
        match err {
            PickerError::Config(_) | PickerError::InvalidRaster { .. } => {
                PyValueError::new_err(err.to_string())
            }
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }

    // ========================================================================
    // Raster functions
    // ========================================================================

    /// Distinct object ids present in an RGBA pick image, ascending.
    #[pyfunction]
    pub fn identify_objects(image: PyReadonlyArray3<'_, u8>) -> Vec<u32> {
        let source = SourceBuffer::from_array(image.as_array().to_owned());
        source.object_ids().into_iter().collect()
    }

    /// Render the selection overlay for a pick image.
    ///
    /// # Arguments
    /// * `image` - RGBA pick image (height, width, 4)
    /// * `pending` - Ids painted with the excluded color
    /// * `hover` - Id whose border is highlighted
    /// * `border_width` - Highlight thickness in pixels
    #[pyfunction]
    #[pyo3(signature = (image, pending, hover=None, border_width=2))]
    pub fn render_overlay<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        pending: Vec<u32>,
        hover: Option<u32>,
        border_width: usize,
    ) -> Bound<'py, PyArray3<u8>> {
        let source = SourceBuffer::from_array(image.as_array().to_owned());
        let pending: BTreeSet<u32> = pending.into_iter().collect();
        let manifest = pending.iter().map(|&id| (id, String::new())).collect();
        let registry = ObjectRegistry::build(&manifest, &pending);
        let style = OverlayStyle {
            border_width: border_width.max(1),
            ..OverlayStyle::default()
        };
        render(&source, &registry, hover, &style)
            .into_array()
            .into_pyarray(py)
    }

    /// Border mask (255 = border) of one object in a pick image.
    #[pyfunction]
    #[pyo3(signature = (image, target, border_width=2))]
    pub fn border_mask<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        target: u32,
        border_width: usize,
    ) -> Bound<'py, PyArray2<u8>> {
        let source = SourceBuffer::from_array(image.as_array().to_owned());
        border::border_mask(source.ids(), target, border_width.max(1)).into_pyarray(py)
    }

    // ========================================================================
    // Picker session
    // ========================================================================

    /// Interactive picker session. Tickets cross into Python as plain
    /// numbers: the load ticket is the open generation, the submit ticket a
    /// `(generation, attempt)` pair.
    #[pyclass(unsendable, name = "Picker")]
    pub struct PyPicker {
        inner: SelectionController,
    }

    #[pymethods]
    impl PyPicker {
        #[new]
        #[pyo3(signature = (config_json=None))]
        fn new(config_json: Option<&str>) -> PyResult<Self> {
            let config = match config_json {
                Some(text) => PickerConfig::from_json(text).map_err(to_py_err)?,
                None => PickerConfig::default(),
            };
            let inner = SelectionController::new(config).map_err(to_py_err)?;
            Ok(Self { inner })
        }

        #[pyo3(signature = (manifest=None, excluded=None))]
        fn open(
            &mut self,
            manifest: Option<BTreeMap<u32, String>>,
            excluded: Option<Vec<u32>>,
        ) -> PyResult<u64> {
            let excluded = excluded.map(|ids| ids.into_iter().collect());
            self.inner
                .open(manifest, excluded)
                .map(|ticket| ticket.generation())
                .map_err(to_py_err)
        }

        fn load_png(&mut self, generation: u64, data: &[u8]) -> PyResult<bool> {
            self.inner
                .complete_load_png(LoadTicket::from_raw(generation), Ok(data))
                .map_err(to_py_err)
        }

        fn load_failed(&mut self, generation: u64, reason: String) -> PyResult<bool> {
            self.inner
                .complete_load_png(LoadTicket::from_raw(generation), Err(reason))
                .map_err(to_py_err)
        }

        fn click(&mut self, x: f64, y: f64, display_width: f64, display_height: f64) -> Option<bool> {
            let view = self.view(display_width, display_height);
            self.inner.click(x, y, &view)
        }

        fn hover(&mut self, x: f64, y: f64, display_width: f64, display_height: f64) -> bool {
            let view = self.view(display_width, display_height);
            self.inner.hover(x, y, &view)
        }

        fn hover_leave(&mut self) -> bool {
            self.inner.hover_leave()
        }

        fn toggle(&mut self, id: u32) -> Option<bool> {
            self.inner.toggle_from_list(id)
        }

        fn hovered(&self) -> Option<u32> {
            self.inner.hovered()
        }

        /// `(id, label, already_excluded, pending_exclusion)` per object.
        fn records(&self) -> Vec<(u32, String, bool, bool)> {
            self.inner
                .registry()
                .map(|r| {
                    r.iter()
                        .map(|o| (o.id, o.label.clone(), o.already_excluded, o.pending_exclusion))
                        .collect()
                })
                .unwrap_or_default()
        }

        fn display<'py>(&mut self, py: Python<'py>) -> Option<Bound<'py, PyArray3<u8>>> {
            self.inner
                .display()
                .map(|frame| frame.view().to_owned().into_pyarray(py))
        }

        /// Returns `(generation, attempt, device_id, ids)`.
        fn begin_commit(&mut self) -> PyResult<(u64, u32, String, String)> {
            let request = self.inner.begin_commit().map_err(to_py_err)?;
            Ok((
                request.ticket.generation(),
                request.ticket.attempt(),
                request.device_id,
                request.ids,
            ))
        }

        #[pyo3(signature = (generation, attempt, error=None))]
        fn complete_commit(
            &mut self,
            generation: u64,
            attempt: u32,
            error: Option<String>,
        ) -> PyResult<bool> {
            let result = match error {
                Some(reason) => Err(reason),
                None => Ok(()),
            };
            self.inner
                .complete_commit(SubmitTicket::from_raw(generation, attempt), result)
                .map_err(to_py_err)
        }

        fn close(&mut self) {
            self.inner.close();
        }
    }

    impl PyPicker {
        fn view(&self, display_width: f64, display_height: f64) -> ViewTransform {
            let (w, h) = self.inner.config().dimensions();
            ViewTransform::new(display_width, display_height, w, h)
        }
    }

    /// Plate Picker extension module
    #[pymodule]
    pub fn plate_picker(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(identify_objects, m)?)?;
        m.add_function(wrap_pyfunction!(render_overlay, m)?)?;
        m.add_function(wrap_pyfunction!(border_mask, m)?)?;
        m.add_class::<PyPicker>()?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::plate_picker;
