//! Picker configuration.
//!
//! Loaded from JSON by the host. Every field has a default, so an empty
//! object `{}` is a valid configuration for a 512x512 pick raster.

use serde::{Deserialize, Serialize};

use crate::error::{PickerError, Result};

pub const DEFAULT_RASTER_SIZE: usize = 512;
pub const DEFAULT_BORDER_WIDTH: usize = 2;

/// Colors painted by the overlay renderer, RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Objects pending exclusion (and already excluded ones).
    pub excluded: [u8; 4],
    /// Objects that will still be printed.
    pub includable: [u8; 4],
    /// Border of the hovered object.
    pub highlight: [u8; 4],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            excluded: [255, 0, 0, 255],
            includable: [0, 255, 0, 255],
            highlight: [255, 255, 0, 255],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Declared pick raster width in pixels.
    pub width: usize,
    /// Declared pick raster height in pixels.
    pub height: usize,
    /// Printer/job identifier handed to the submit action.
    pub device_id: String,
    pub palette: Palette,
    /// Thickness of the hover highlight, in pixels.
    pub border_width: usize,
    /// Drop manifest entries whose color never appears in the pick raster.
    /// Already-excluded entries are kept.
    pub filter_to_raster: bool,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_RASTER_SIZE,
            height: DEFAULT_RASTER_SIZE,
            device_id: String::new(),
            palette: Palette::default(),
            border_width: DEFAULT_BORDER_WIDTH,
            filter_to_raster: true,
        }
    }
}

impl PickerConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: PickerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PickerError::Config(format!(
                "raster size {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if self.border_width == 0 {
            return Err(PickerError::Config("border_width must be at least 1".into()));
        }
        Ok(())
    }

    /// `(width, height)` of the declared raster.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}
