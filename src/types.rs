use crate::entity::{Drawing, Entity};
use crate::error::NestError;
use crate::free_rect::FreeRect;
use crate::geometry;
use crate::units::Unit;
use serde::{Deserialize, Serialize};

/// A named shape with a requested quantity.
///
/// Geometry is immutable after normalization; only the quantity is meant to
/// change between optimization runs. `width`/`height`/`min_x`/`min_y` are
/// the bounding box in millimeters.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub min_x: f64,
    pub min_y: f64,
    pub quantity: u32,
    /// Source entities in millimeters. Empty for parts given as bare
    /// dimensions, in which case export falls back to the outline rectangle.
    pub entities: Vec<Entity>,
    pub units: Unit,
    pub scale_factor: f64,
}

impl Part {
    /// Builds a part from a parsed drawing via the normalization pipeline.
    pub fn from_drawing(
        name: impl Into<String>,
        drawing: &Drawing,
        quantity: u32,
    ) -> Result<Part, NestError> {
        let normalized = geometry::normalize(drawing)?;
        Ok(Part {
            name: name.into(),
            width: normalized.bbox.width,
            height: normalized.bbox.height,
            min_x: normalized.bbox.min_x,
            min_y: normalized.bbox.min_y,
            quantity,
            entities: normalized.entities,
            units: normalized.units,
            scale_factor: normalized.scale_factor,
        })
    }

    /// Builds a geometry-less part from bare millimeter dimensions.
    pub fn from_size(name: impl Into<String>, width: f64, height: f64, quantity: u32) -> Part {
        Part {
            name: name.into(),
            width,
            height,
            min_x: 0.0,
            min_y: 0.0,
            quantity,
            entities: Vec::new(),
            units: Unit::Millimeters,
            scale_factor: 1.0,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// The final position of one part copy on a sheet. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedItem {
    pub part: String,
    pub part_index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: i32,
    pub mirrored: bool,
}

/// One stock sheet with its placements and remaining free regions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub index: usize,
    pub width: f64,
    pub height: f64,
    pub items: Vec<PlacedItem>,
    pub free_rects: Vec<FreeRect>,
}

/// Result of one optimization run. Recomputed from scratch every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackingResult {
    pub total_items: u32,
    pub total_sheets: usize,
    pub utilization: f64,
    pub sheets: Vec<Sheet>,
}

/// Sheet and spacing configuration for a packing run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackConfig {
    pub sheet_width: f64,
    pub sheet_height: f64,
    #[serde(default = "default_true")]
    pub allow_rotation: bool,
    #[serde(default)]
    pub allow_mirroring: bool,
    #[serde(default)]
    pub edge_gap: f64,
    #[serde(default)]
    pub part_spacing: f64,
}

fn default_true() -> bool {
    true
}

impl PackConfig {
    pub fn new(sheet_width: f64, sheet_height: f64) -> Self {
        Self {
            sheet_width,
            sheet_height,
            allow_rotation: true,
            allow_mirroring: false,
            edge_gap: 0.0,
            part_spacing: 0.0,
        }
    }

    /// Validated before any packing attempt; failures abort the whole
    /// optimization request.
    pub fn validate(&self) -> Result<(), NestError> {
        if !(self.sheet_width > 0.0) || !(self.sheet_height > 0.0) {
            return Err(NestError::InvalidSheetConfig(format!(
                "sheet dimensions must be positive, got {}x{}",
                self.sheet_width, self.sheet_height
            )));
        }
        if self.edge_gap < 0.0 {
            return Err(NestError::InvalidSheetConfig(format!(
                "edge gap must not be negative, got {}",
                self.edge_gap
            )));
        }
        if self.part_spacing < 0.0 {
            return Err(NestError::InvalidSheetConfig(format!(
                "part spacing must not be negative, got {}",
                self.part_spacing
            )));
        }
        Ok(())
    }

    /// Sheet interior inset by the edge gap on all sides.
    pub fn usable_width(&self) -> f64 {
        self.sheet_width - 2.0 * self.edge_gap
    }

    pub fn usable_height(&self) -> f64 {
        self.sheet_height - 2.0 * self.edge_gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(PackConfig::new(1000.0, 500.0).validate().is_ok());
        assert!(PackConfig::new(0.0, 500.0).validate().is_err());
        assert!(PackConfig::new(1000.0, -1.0).validate().is_err());

        let mut config = PackConfig::new(1000.0, 500.0);
        config.edge_gap = -0.5;
        assert!(matches!(
            config.validate(),
            Err(NestError::InvalidSheetConfig(_))
        ));

        config.edge_gap = 10.0;
        config.part_spacing = -2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_usable_interior() {
        let mut config = PackConfig::new(300.0, 200.0);
        config.edge_gap = 10.0;
        assert_eq!(config.usable_width(), 280.0);
        assert_eq!(config.usable_height(), 180.0);
    }

    #[test]
    fn test_part_from_size() {
        let part = Part::from_size("shelf", 400.0, 250.0, 3);
        assert_eq!(part.area(), 100000.0);
        assert_eq!(part.quantity, 3);
        assert!(part.entities.is_empty());
        assert_eq!(part.scale_factor, 1.0);
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: PackConfig =
            serde_json::from_str(r#"{"sheet_width": 2440, "sheet_height": 1220}"#).unwrap();
        assert!(config.allow_rotation);
        assert!(!config.allow_mirroring);
        assert_eq!(config.edge_gap, 0.0);
        assert_eq!(config.part_spacing, 0.0);
    }
}
