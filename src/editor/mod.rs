//! Merge and split of atlas tile spans.
//!
//! The editor never mutates a tileset. Each command reads the model's
//! snapshot and returns an [`OpGroup`]; submitting it through an
//! [`OperationLog`] is the caller's business. All rectangles here are atlas
//! grid rectangles, not view cells.

mod merge;
mod split;

pub use split::SplitEdge;

use crate::command::{submit, EditOp, OpGroup, OperationLog};
use crate::error::EditError;
use crate::model::TilesetModel;
use crate::spatial::{GridRect, PixelRect, TileId};
use crate::tileset::Tile;

/// Undo text of a merge.
pub const MERGE_TILES: &str = "Merge Tiles";
/// Undo text of a split.
pub const SPLIT_TILES: &str = "Split Tiles";
/// Undo text of a tile removal.
pub const REMOVE_TILES: &str = "Remove Tiles";

/// Computes span edits against one model snapshot.
pub struct AtlasEditor<'m> {
    model: &'m TilesetModel,
}

impl<'m> AtlasEditor<'m> {
    /// An editor reading from `model`.
    pub fn new(model: &'m TilesetModel) -> Self {
        AtlasEditor { model }
    }

    /// The snapshot edits are computed against.
    pub fn model(&self) -> &'m TilesetModel {
        self.model
    }

    /// Merges and submits in one go.
    pub fn apply_merge(
        &self,
        min_row: i32,
        max_row: i32,
        min_col: i32,
        max_col: i32,
        log: &mut dyn OperationLog,
    ) -> Result<bool, EditError> {
        submit(self.merge_selection(min_row, max_row, min_col, max_col), log)
    }

    /// Splits and submits in one go.
    pub fn apply_split(
        &self,
        tile: TileId,
        relative_row: i32,
        relative_col: i32,
        log: &mut dyn OperationLog,
    ) -> Result<bool, EditError> {
        submit(self.split_span(tile, relative_row, relative_col), log)
    }

    /// Removes one tile outright.
    pub fn remove_tile(&self, tile: TileId) -> OpGroup {
        let mut group = OpGroup::new(REMOVE_TILES);
        if let Some(tile) = self.model.find_tile(tile) {
            group.push(EditOp::RemoveTiles(vec![tile.clone()]));
        }
        group
    }

    /// Every tile except `except` whose origin cell lies inside `rect`, in
    /// tileset order. Compared in grid space so spacing cannot push a
    /// column's origin past the end of a pixel rectangle.
    fn tiles_with_origin_in(&self, rect: GridRect, except: Option<TileId>) -> Vec<Tile> {
        let layout = self.model.tileset().layout();
        self.model
            .tileset()
            .tiles()
            .iter()
            .filter(|tile| Some(tile.id) != except)
            .filter(|tile| rect.contains(layout.grid_pos(tile.image_rect)))
            .cloned()
            .collect()
    }
}

fn resize_op(tile: &Tile, to: PixelRect) -> Option<EditOp> {
    (tile.image_rect != to).then(|| EditOp::ChangeImageRect {
        tile: tile.id,
        from: tile.image_rect,
        to,
    })
}
