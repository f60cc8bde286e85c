//! View options handed to the tileset view. Nothing in the crate reads
//! global state; hosts load or build a [`ViewOptions`] and pass it along.

use crate::error::TilesetError;
use crate::loader::json_loader::read_json_file;
use crate::model::TilesetModel;
use crate::tileset::TilesetKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest accepted view scale.
pub const MIN_SCALE: f32 = 0.0625;
/// Largest accepted view scale.
pub const MAX_SCALE: f32 = 16.0;

/// How the view picks its column count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapBehavior {
    /// Dynamic for image collections, fixed otherwise.
    #[default]
    Default,
    /// Fit as many columns as the viewport allows.
    Dynamic,
    /// Use the tileset's own column count.
    Fixed,
}

/// Display settings for a tileset view. Missing JSON fields take defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewOptions {
    /// Draw grid lines between cells.
    #[serde(default = "default_true")]
    pub draw_grid: bool,
    /// Column count policy.
    #[serde(default)]
    pub wrap: WrapBehavior,
    /// Mark animated tiles with a corner badge.
    #[serde(default = "default_true")]
    pub mark_animated_tiles: bool,
    /// Wheel zooms without Ctrl.
    #[serde(default)]
    pub wheel_zooms_by_default: bool,
    /// Tile zoom factor.
    #[serde(default = "one")]
    pub scale: f32,
}

fn default_true() -> bool {
    true
}
fn one() -> f32 {
    1.0
}

impl Default for ViewOptions {
    fn default() -> Self {
        ViewOptions {
            draw_grid: true,
            wrap: WrapBehavior::Default,
            mark_animated_tiles: true,
            wheel_zooms_by_default: false,
            scale: 1.0,
        }
    }
}

impl ViewOptions {
    /// Parses options from JSON.
    pub fn load_from_str(json: &str) -> Result<Self, TilesetError> {
        let options: ViewOptions = serde_json::from_str(json)?;
        Ok(options.sanitized())
    }

    /// Reads options from a `.json` file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, TilesetError> {
        let options: ViewOptions = read_json_file(path.as_ref())?;
        Ok(options.sanitized())
    }

    fn sanitized(mut self) -> Self {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            log::warn!("Ignoring view scale {}; using 1.0", self.scale);
            self.scale = 1.0;
        }
        self.scale = self.scale.clamp(MIN_SCALE, MAX_SCALE);
        self
    }

    /// Sets the scale, clamped; non-finite values are ignored.
    pub fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() {
            self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        }
    }

    /// Whether the column count follows the viewport for this kind.
    pub fn dynamic_wrapping(&self, kind: TilesetKind) -> bool {
        match self.wrap {
            WrapBehavior::Default => kind == TilesetKind::Collection,
            WrapBehavior::Dynamic => true,
            WrapBehavior::Fixed => false,
        }
    }

    /// Pixels between cells; the grid takes one.
    #[inline]
    pub fn grid_space(&self) -> i32 {
        if self.draw_grid {
            1
        } else {
            0
        }
    }

    /// On-screen size of one cell, grid line included.
    pub fn cell_size(&self, tile_width: i32, tile_height: i32) -> (f32, f32) {
        let space = self.grid_space() as f32;
        (
            tile_width as f32 * self.scale + space,
            tile_height as f32 * self.scale + space,
        )
    }

    /// Column override for a viewport `viewport_width` pixels wide; 0 when
    /// wrapping is fixed.
    pub fn column_count_for(&self, viewport_width: f32, tile_width: i32, kind: TilesetKind) -> i32 {
        if !self.dynamic_wrapping(kind) {
            return 0;
        }
        let scaled = ((tile_width as f32 * self.scale) as i32).max(1) + self.grid_space();
        (viewport_width.max(0.0) as i32 / scaled).max(1)
    }

    /// Pushes the column override for the current viewport into `model`.
    pub fn refresh_column_count(&self, model: &mut TilesetModel, viewport_width: f32) {
        let tileset = model.tileset();
        let columns = self.column_count_for(viewport_width, tileset.tile_width, tileset.kind);
        model.set_column_count_override(columns);
    }

    /// Whether a wheel step zooms rather than scrolls. Ctrl inverts the
    /// default; dynamically wrapped views always scroll by default.
    pub fn wheel_zooms(&self, kind: TilesetKind, ctrl: bool) -> bool {
        let by_default = self.wheel_zooms_by_default && !self.dynamic_wrapping(kind);
        by_default != ctrl
    }
}
