use super::{resize_op, AtlasEditor, MERGE_TILES};
use crate::command::{EditOp, OpGroup};
use crate::spatial::{AtlasPos, GridRect};
use crate::tileset::Tile;

impl AtlasEditor<'_> {
    /// Turns the inclusive grid range into a single tile.
    ///
    /// The tile originating at `(min_row, min_col)` is grown (or shrunk) to
    /// the whole range; without one, a new tile is created there. Tiles
    /// originating inside the range are removed. A range that leaves the
    /// atlas, or that a span from outside reaches into, yields an empty group.
    pub fn merge_selection(&self, min_row: i32, max_row: i32, min_col: i32, max_col: i32) -> OpGroup {
        let mut group = OpGroup::new(MERGE_TILES);
        let tileset = self.model.tileset();
        if !tileset.is_atlas() {
            return group;
        }

        let grid = GridRect::from_corners(min_col, min_row, max_col, max_row);
        if grid.is_empty()
            || grid.col < 0
            || grid.row < 0
            || grid.col + grid.width > tileset.columns
            || grid.row + grid.height > tileset.rows
        {
            log::debug!("Merge range {:?} is outside the atlas", grid);
            return group;
        }

        let spans = self.model.spans();
        let intruder = spans
            .query_rect(grid)
            .into_iter()
            .filter_map(|id| spans.span_of(id))
            .find(|span| !grid.contains(span.origin()));
        if let Some(span) = intruder {
            log::debug!(
                "Merge range {:?} overlaps tile {} from outside; ignoring",
                grid,
                span.tile.0
            );
            return group;
        }

        let layout = tileset.layout();
        let merge_rect = layout.pixel_rect(grid);
        let target = spans
            .origin_tile_at(AtlasPos::new(min_col, min_row))
            .and_then(|id| self.model.find_tile(id));

        let subsumed = self.tiles_with_origin_in(grid, target.map(|t| t.id));
        if !subsumed.is_empty() {
            group.push(EditOp::RemoveTiles(subsumed));
        }

        match target {
            Some(tile) => {
                if let Some(op) = resize_op(tile, merge_rect) {
                    group.push(op);
                }
            }
            None => {
                let id = tileset.generate_tile_id(min_col, min_row);
                group.push(EditOp::AddTiles(vec![Tile::new(id, merge_rect)]));
            }
        }
        group
    }
}
