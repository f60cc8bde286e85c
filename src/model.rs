//! Grid model over a tileset: maps view cells to tiles and back.
//!
//! The model holds a snapshot of the tileset plus caches derived from it
//! (tile order, reverse index, [`SpanIndex`]). None of them are patched;
//! [`TilesetModel::tileset_changed`] rebuilds everything from scratch.

use crate::command::EditOp;
use crate::document::DocumentChange;
use crate::spatial::{
    atlas_to_view, view_to_atlas, AtlasPos, Cell, GridRect, SpanIndex, TileId,
};
use crate::tileset::{Tile, Tileset};
use std::collections::HashMap;

/// Column count used when a non-atlas tileset declares none.
pub const FALLBACK_COLUMNS: i32 = 5;

/// Repaint notifications, drained with [`TilesetModel::take_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelEvent {
    /// Everything may have changed.
    Reset,
    /// Cells inside this inclusive rectangle need repainting.
    RegionChanged {
        /// First cell of the region.
        top_left: Cell,
        /// Last cell of the region, inclusive.
        bottom_right: Cell,
    },
}

/// A span as laid out in the view: `rows` x `cols` cells from `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanLayout {
    /// The spanning tile.
    pub tile: TileId,
    /// View cell of the span's top-left corner.
    pub origin: Cell,
    /// Height in cells.
    pub rows: i32,
    /// Width in cells.
    pub cols: i32,
}

/// The query surface a view needs from a tileset model.
/// The query surface a view needs from a tileset model. Cells outside the
/// grid resolve to nothing.
pub trait TileGrid {
    /// Rows in the view.
    fn row_count(&self) -> i32;
    /// Columns in the view, after any override.
    fn column_count(&self) -> i32;
    /// The tile whose span starts at `cell`.
    fn tile_at(&self, cell: Cell) -> Option<&Tile>;
    /// Where `tile` starts; `None` for unknown tiles and degenerate layouts.
    fn cell_for_tile(&self, tile: TileId) -> Option<Cell>;
    /// (columns, rows) of the tile at `cell`; 1x1 when there is none.
    fn span_size_at(&self, cell: Cell) -> (i32, i32);
    /// The multi-cell tile covering `cell`, origin included.
    fn spanning_tile_covering(&self, cell: Cell) -> Option<&Tile>;
    /// Whether a selection may include `cell`.
    fn is_selectable(&self, cell: Cell) -> bool;
}

/// Grid view over a tileset snapshot.
pub struct TilesetModel {
    tileset: Tileset,
    tile_ids: Vec<TileId>,
    positions: HashMap<TileId, usize>,
    spans: SpanIndex,
    column_count_override: i32,
    relocating: bool,
    events: Vec<ModelEvent>,
}

impl TilesetModel {
    /// A model over a copy of `tileset`.
    pub fn new(tileset: &Tileset) -> Self {
        let mut model = TilesetModel {
            tileset: tileset.clone(),
            tile_ids: Vec::new(),
            positions: HashMap::new(),
            spans: SpanIndex::default(),
            column_count_override: 0,
            relocating: false,
            events: Vec::new(),
        };
        model.refresh();
        model
    }

    fn refresh(&mut self) {
        self.tile_ids = self.tileset.tiles().iter().map(|t| t.id).collect();
        self.positions = self
            .tile_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();
        self.spans = SpanIndex::build(&self.tileset);
    }

    /// Structural change: replace the snapshot and rebuild all caches.
    pub fn tileset_changed(&mut self, tileset: &Tileset) {
        self.tileset = tileset.clone();
        self.refresh();
        self.reset();
    }

    /// Follows a document after edits. Added, removed or relocated tiles
    /// reset the view; rect and Wang id changes emit one region covering the
    /// affected spans both before and after the change.
    pub fn document_changed(&mut self, tileset: &Tileset, changes: &[DocumentChange]) {
        if changes.is_empty() {
            return;
        }
        let structural = changes.iter().any(|change| {
            matches!(
                change,
                DocumentChange::TilesAdded(_)
                    | DocumentChange::TilesRemoved(_)
                    | DocumentChange::TilesRelocated
            )
        });
        if structural {
            self.tileset_changed(tileset);
            return;
        }

        let tiles: Vec<TileId> = changes
            .iter()
            .flat_map(|change| match change {
                DocumentChange::ImageRectsChanged(ids) | DocumentChange::WangIdsChanged(ids) => {
                    ids.clone()
                }
                _ => Vec::new(),
            })
            .collect();
        let before = self.region_of(&tiles);
        self.tileset = tileset.clone();
        self.refresh();
        let after = self.region_of(&tiles);
        self.push_region(union_region(before, after));
    }

    /// A reset supersedes anything still queued.
    fn reset(&mut self) {
        self.events.clear();
        self.events.push(ModelEvent::Reset);
    }

    /// The current snapshot.
    pub fn tileset(&self) -> &Tileset {
        &self.tileset
    }

    /// Span index over the snapshot.
    pub fn spans(&self) -> &SpanIndex {
        &self.spans
    }

    /// Tile ids in tileset order.
    pub fn tile_ids(&self) -> &[TileId] {
        &self.tile_ids
    }

    /// Queued events, oldest first.
    pub fn take_events(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.events)
    }

    /// Current override; 0 when none.
    pub fn column_count_override(&self) -> i32 {
        self.column_count_override
    }

    /// 0 disables the override.
    pub fn set_column_count_override(&mut self, columns: i32) {
        let columns = columns.max(0);
        if self.column_count_override == columns {
            return;
        }
        self.column_count_override = columns;
        self.reset();
    }

    /// Whether relocate mode is on.
    pub fn is_relocating(&self) -> bool {
        self.relocating
    }

    /// Turns relocate mode on or off.
    pub fn set_relocating(&mut self, relocating: bool) {
        self.relocating = relocating;
    }

    /// True when view cells and atlas cells coincide.
    pub fn is_unwrapped(&self) -> bool {
        !self.tileset.is_atlas() || self.column_count() == self.tileset.columns
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        cell.row >= 0
            && cell.col >= 0
            && cell.row < self.row_count()
            && cell.col < self.column_count()
    }

    /// Atlas position under a view cell.
    pub fn view_to_atlas(&self, cell: Cell) -> Option<AtlasPos> {
        view_to_atlas(cell.col, cell.row, self.column_count(), self.tileset.columns)
    }

    /// View cell of an atlas position.
    pub fn atlas_to_view(&self, pos: AtlasPos) -> Option<Cell> {
        atlas_to_view(pos.col, pos.row, self.tileset.columns, self.column_count())
    }

    /// Tile lookup through the position cache.
    pub fn find_tile(&self, id: TileId) -> Option<&Tile> {
        self.positions
            .get(&id)
            .and_then(|&i| self.tileset.tiles().get(i))
    }

    /// The tile under an atlas position, resolved through its generated id.
    pub fn origin_tile_at(&self, pos: AtlasPos) -> Option<&Tile> {
        self.find_tile(self.tileset.generate_tile_id(pos.col, pos.row))
    }

    /// Every cell of the tile's span, in view coordinates, as an inclusive
    /// rectangle.
    fn span_bounds(&self, tile: TileId) -> Option<(Cell, Cell)> {
        let origin = self.cell_for_tile(tile)?;
        let (cols, rows) = self.span_of_tile(tile);
        Some((
            origin,
            Cell::new(origin.row + rows - 1, origin.col + cols - 1),
        ))
    }

    fn span_of_tile(&self, tile: TileId) -> (i32, i32) {
        self.spans
            .span_of(tile)
            .map(|s| (s.rect.width.max(1), s.rect.height.max(1)))
            .unwrap_or((1, 1))
    }

    fn region_of(&self, tiles: &[TileId]) -> Option<(Cell, Cell)> {
        tiles
            .iter()
            .filter_map(|&tile| self.span_bounds(tile))
            .fold(None, |region, bounds| union_region(region, Some(bounds)))
    }

    fn push_region(&mut self, region: Option<(Cell, Cell)>) {
        if let Some((top_left, bottom_right)) = region {
            self.events.push(ModelEvent::RegionChanged {
                top_left,
                bottom_right,
            });
        }
    }

    /// Emits one region covering every cell of the given tiles. Tiles without
    /// a cell are ignored; nothing is emitted if none has one.
    pub fn tiles_changed(&mut self, tiles: &[TileId]) {
        let region = self.region_of(tiles);
        self.push_region(region);
    }

    /// Single-tile form of [`TilesetModel::tiles_changed`].
    pub fn tile_changed(&mut self, tile: TileId) {
        self.tiles_changed(&[tile]);
    }

    /// View spans of every atlas tile larger than one cell.
    pub fn span_layout(&self) -> Vec<SpanLayout> {
        if !self.tileset.is_atlas() {
            return Vec::new();
        }
        self.spans
            .multi_cell_spans()
            .iter()
            .filter_map(|span| {
                let origin = self.cell_for_tile(span.tile)?;
                Some(SpanLayout {
                    tile: span.tile,
                    origin,
                    rows: span.rect.height,
                    cols: span.rect.width,
                })
            })
            .collect()
    }

    /// Ids of the tiles under `cells`, for a drag payload.
    pub fn drag_payload(&self, cells: &[Cell]) -> Vec<TileId> {
        cells
            .iter()
            .filter_map(|&cell| self.tile_at(cell))
            .map(|tile| tile.id)
            .collect()
    }

    /// Builds the relocation for dropping `payload` onto `destination`. Atlas
    /// tilesets are laid out by image position and cannot be reordered.
    pub fn drop_tiles(&self, payload: &[TileId], destination: Cell) -> Option<EditOp> {
        if self.tileset.is_atlas() {
            return None;
        }
        let moved: Vec<TileId> = payload
            .iter()
            .copied()
            .filter(|id| self.positions.contains_key(id))
            .collect();
        if moved.is_empty() {
            return None;
        }

        let destination_index = self
            .tile_at(destination)
            .and_then(|tile| self.positions.get(&tile.id).copied())
            .unwrap_or(self.tile_ids.len().saturating_sub(1));

        let mut after: Vec<TileId> = self
            .tile_ids
            .iter()
            .copied()
            .filter(|id| !moved.contains(id))
            .collect();
        let insert_at = destination_index.min(after.len());
        after.splice(insert_at..insert_at, moved);

        if after == self.tile_ids {
            return None;
        }
        Some(EditOp::RelocateTiles {
            before: self.tile_ids.clone(),
            after,
        })
    }

    /// The atlas grid rectangle for an inclusive view selection, if the
    /// view is unwrapped.
    pub fn atlas_rect(&self, top_left: Cell, bottom_right: Cell) -> Option<GridRect> {
        if !self.is_unwrapped() {
            return None;
        }
        Some(GridRect::from_corners(
            top_left.col,
            top_left.row,
            bottom_right.col,
            bottom_right.row,
        ))
    }
}

fn union_region(a: Option<(Cell, Cell)>, b: Option<(Cell, Cell)>) -> Option<(Cell, Cell)> {
    match (a, b) {
        (Some((a_tl, a_br)), Some((b_tl, b_br))) => Some((
            Cell::new(a_tl.row.min(b_tl.row), a_tl.col.min(b_tl.col)),
            Cell::new(a_br.row.max(b_br.row), a_br.col.max(b_br.col)),
        )),
        (region, None) | (None, region) => region,
    }
}

impl TileGrid for TilesetModel {
    fn row_count(&self) -> i32 {
        let columns = self.column_count();
        if columns <= 0 {
            return 1;
        }
        let cells = if self.tileset.is_atlas() {
            self.tileset.rows.max(0) * self.tileset.columns.max(0)
        } else {
            self.tile_ids.len() as i32
        };
        (cells + columns - 1) / columns
    }

    fn column_count(&self) -> i32 {
        if self.column_count_override > 0 {
            return self.column_count_override;
        }
        if self.tileset.columns > 0 {
            return self.tileset.columns;
        }
        if self.tileset.is_collection() {
            FALLBACK_COLUMNS
        } else {
            0
        }
    }

    fn tile_at(&self, cell: Cell) -> Option<&Tile> {
        if !self.in_bounds(cell) {
            return None;
        }
        if self.tileset.is_atlas() {
            let pos = self.view_to_atlas(cell)?;
            return self.origin_tile_at(pos);
        }
        let index = (cell.col + cell.row * self.column_count()) as usize;
        self.tile_ids.get(index).and_then(|&id| self.find_tile(id))
    }

    fn cell_for_tile(&self, tile: TileId) -> Option<Cell> {
        let columns = self.column_count();
        if columns <= 0 {
            return None;
        }
        if self.tileset.is_atlas() {
            let tile = self.find_tile(tile)?;
            let pos = self.tileset.layout().grid_pos(tile.image_rect);
            return self.atlas_to_view(pos);
        }
        let index = *self.positions.get(&tile)? as i32;
        Some(Cell::new(index / columns, index % columns))
    }

    fn span_size_at(&self, cell: Cell) -> (i32, i32) {
        if !self.tileset.is_atlas() {
            return (1, 1);
        }
        match self.tile_at(cell) {
            Some(tile) => self.span_of_tile(tile.id),
            None => (1, 1),
        }
    }

    fn spanning_tile_covering(&self, cell: Cell) -> Option<&Tile> {
        if !self.in_bounds(cell) || !self.tileset.is_atlas() {
            return None;
        }
        let pos = self.view_to_atlas(cell)?;
        self.spans
            .spanning_tile_covering(pos)
            .and_then(|id| self.find_tile(id))
    }

    fn is_selectable(&self, cell: Cell) -> bool {
        if !self.in_bounds(cell) {
            return false;
        }
        if !self.tileset.is_atlas() {
            return true;
        }
        self.relocating || self.tile_at(cell).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{submit, OpGroup};
    use crate::document::TilesetDocument;
    use crate::spatial::{tile_id_from_atlas_coords, PixelRect};
    use crate::tileset::TilesetKind;

    fn atlas() -> Tileset {
        // 4x3 atlas with a 2x2 span at (1, 0).
        let mut ts = Tileset::new("atlas", TilesetKind::Atlas, 16, 16).with_grid(4, 3);
        ts.fill_unit_tiles();
        let layout = ts.layout();
        let covered: Vec<Tile> = [(2, 0), (1, 1), (2, 1)]
            .iter()
            .map(|&(c, r)| ts.find_tile(tile_id_from_atlas_coords(c, r)).unwrap().clone())
            .collect();
        ts.apply(&EditOp::RemoveTiles(covered)).unwrap();
        let span_id = tile_id_from_atlas_coords(1, 0);
        ts.apply(&EditOp::ChangeImageRect {
            tile: span_id,
            from: PixelRect::new(16, 0, 16, 16),
            to: layout.pixel_rect(GridRect::new(1, 0, 2, 2)),
        })
        .unwrap();
        ts
    }

    fn collection(count: u32) -> Tileset {
        let mut ts = Tileset::new("things", TilesetKind::Collection, 32, 32);
        let tiles = (0..count)
            .map(|i| Tile::new(TileId(i), PixelRect::new(0, 0, 32, 32)))
            .collect();
        ts.apply(&EditOp::AddTiles(tiles)).unwrap();
        ts
    }

    #[test]
    fn atlas_geometry_follows_declared_grid() {
        let model = TilesetModel::new(&atlas());
        assert_eq!(model.column_count(), 4);
        assert_eq!(model.row_count(), 3);
        assert_eq!(model.tile_at(Cell::new(0, 1)).unwrap().id, tile_id_from_atlas_coords(1, 0));
        assert!(model.tile_at(Cell::new(1, 2)).is_none());
        assert!(model.tile_at(Cell::new(3, 0)).is_none());
        assert_eq!(model.span_size_at(Cell::new(0, 1)), (2, 2));
        assert_eq!(model.span_size_at(Cell::new(2, 3)), (1, 1));
    }

    #[test]
    fn covering_and_selectability() {
        let mut model = TilesetModel::new(&atlas());
        let covered = Cell::new(1, 2);
        assert_eq!(
            model.spanning_tile_covering(covered).unwrap().id,
            tile_id_from_atlas_coords(1, 0)
        );
        assert!(!model.is_selectable(covered));
        assert!(model.is_selectable(Cell::new(0, 1)));
        assert!(!model.is_selectable(Cell::new(-1, 0)));

        model.set_relocating(true);
        assert!(model.is_selectable(covered));
        assert!(!model.is_selectable(Cell::new(0, 4)));
    }

    #[test]
    fn out_of_range_cells_are_never_covered() {
        let model = TilesetModel::new(&atlas());
        // Both would wrap onto covered cells of the span at (1, 0).
        assert!(model.spanning_tile_covering(Cell::new(0, 5)).is_none());
        assert!(model.spanning_tile_covering(Cell::new(-1, 6)).is_none());
        assert!(model.spanning_tile_covering(Cell::new(3, 1)).is_none());
        assert!(model.spanning_tile_covering(Cell::new(1, 2)).is_some());
    }

    #[test]
    fn cell_for_tile_inverts_tile_at() {
        let model = TilesetModel::new(&atlas());
        for row in 0..model.row_count() {
            for col in 0..model.column_count() {
                let cell = Cell::new(row, col);
                if let Some(tile) = model.tile_at(cell) {
                    assert_eq!(model.cell_for_tile(tile.id), Some(cell));
                }
            }
        }
    }

    #[test]
    fn override_remaps_atlas_cells() {
        let mut model = TilesetModel::new(&atlas());
        model.take_events();
        model.set_column_count_override(6);
        assert_eq!(model.take_events(), vec![ModelEvent::Reset]);
        assert_eq!(model.row_count(), 2);
        assert!(!model.is_unwrapped());

        // Atlas (0, 1) is linear index 4, i.e. view (0, 4).
        let tile = tile_id_from_atlas_coords(0, 1);
        assert_eq!(model.cell_for_tile(tile), Some(Cell::new(0, 4)));
        assert_eq!(model.tile_at(Cell::new(0, 4)).unwrap().id, tile);

        model.set_column_count_override(6);
        assert!(model.take_events().is_empty());
    }

    #[test]
    fn collection_layout_and_fallback_columns() {
        let model = TilesetModel::new(&collection(7));
        assert_eq!(model.column_count(), FALLBACK_COLUMNS);
        assert_eq!(model.row_count(), 2);
        assert_eq!(model.tile_at(Cell::new(1, 1)).unwrap().id, TileId(6));
        assert!(model.tile_at(Cell::new(1, 2)).is_none());
        assert_eq!(model.cell_for_tile(TileId(6)), Some(Cell::new(1, 1)));
        assert!(model.is_selectable(Cell::new(1, 4)));
        assert_eq!(model.span_size_at(Cell::new(0, 0)), (1, 1));
    }

    #[test]
    fn degenerate_layout_has_no_cells() {
        let ts = Tileset::new("empty", TilesetKind::Grid, 16, 16);
        let model = TilesetModel::new(&ts);
        assert_eq!(model.column_count(), 0);
        assert_eq!(model.row_count(), 1);
        assert_eq!(model.cell_for_tile(TileId(0)), None);
        assert!(model.tile_at(Cell::new(0, 0)).is_none());
    }

    #[test]
    fn region_covers_whole_spans() {
        let mut model = TilesetModel::new(&atlas());
        model.tiles_changed(&[tile_id_from_atlas_coords(1, 0), tile_id_from_atlas_coords(0, 2)]);
        assert_eq!(
            model.take_events(),
            vec![ModelEvent::RegionChanged {
                top_left: Cell::new(0, 0),
                bottom_right: Cell::new(2, 2),
            }]
        );

        model.tile_changed(tile_id_from_atlas_coords(3, 2));
        assert_eq!(
            model.take_events(),
            vec![ModelEvent::RegionChanged {
                top_left: Cell::new(2, 3),
                bottom_right: Cell::new(2, 3),
            }]
        );

        model.tiles_changed(&[TileId(9999)]);
        assert!(model.take_events().is_empty());
    }

    #[test]
    fn rect_changes_cover_old_and_new_span() {
        let mut doc = TilesetDocument::new(atlas());
        let mut model = TilesetModel::new(doc.tileset());
        model.take_events();

        let span = tile_id_from_atlas_coords(1, 0);
        let mut group = OpGroup::new("Shrink");
        group.push(EditOp::ChangeImageRect {
            tile: span,
            from: PixelRect::new(16, 0, 32, 32),
            to: PixelRect::new(16, 0, 16, 16),
        });
        submit(group, &mut doc).unwrap();

        let changes = doc.take_changes();
        model.document_changed(doc.tileset(), &changes);
        assert_eq!(model.span_size_at(Cell::new(0, 1)), (1, 1));
        assert_eq!(
            model.take_events(),
            vec![ModelEvent::RegionChanged {
                top_left: Cell::new(0, 1),
                bottom_right: Cell::new(1, 2),
            }]
        );
        let changes = doc.take_changes();
        model.document_changed(doc.tileset(), &changes);
        assert!(model.take_events().is_empty());
    }

    #[test]
    fn structural_changes_reset_and_drop_queued_events() {
        let mut doc = TilesetDocument::new(atlas());
        let mut model = TilesetModel::new(doc.tileset());
        model.tile_changed(tile_id_from_atlas_coords(0, 0));
        model.set_column_count_override(8);
        model.tileset_changed(doc.tileset());
        assert_eq!(model.take_events(), vec![ModelEvent::Reset]);

        model.tile_changed(tile_id_from_atlas_coords(0, 0));
        let removed = doc.tileset().find_tile(tile_id_from_atlas_coords(0, 0)).unwrap().clone();
        let mut group = OpGroup::new("Remove Tiles");
        group.push(EditOp::RemoveTiles(vec![removed]));
        submit(group, &mut doc).unwrap();

        let changes = doc.take_changes();
        model.document_changed(doc.tileset(), &changes);
        assert_eq!(model.take_events(), vec![ModelEvent::Reset]);
        assert_eq!(model.tile_ids().len(), doc.tileset().tile_count());
    }

    #[test]
    fn span_layout_lists_multi_cell_tiles() {
        let model = TilesetModel::new(&atlas());
        assert_eq!(
            model.span_layout(),
            vec![SpanLayout {
                tile: tile_id_from_atlas_coords(1, 0),
                origin: Cell::new(0, 1),
                rows: 2,
                cols: 2,
            }]
        );
    }

    #[test]
    fn dropping_tiles_relocates_them() {
        let model = TilesetModel::new(&collection(4));
        let payload = model.drag_payload(&[Cell::new(0, 0)]);
        assert_eq!(payload, vec![TileId(0)]);

        let op = model.drop_tiles(&payload, Cell::new(0, 2)).unwrap();
        assert_eq!(
            op,
            EditOp::RelocateTiles {
                before: vec![TileId(0), TileId(1), TileId(2), TileId(3)],
                after: vec![TileId(1), TileId(2), TileId(0), TileId(3)],
            }
        );

        // Dropping past the last tile appends.
        let op = model.drop_tiles(&[TileId(1)], Cell::new(3, 0)).unwrap();
        let EditOp::RelocateTiles { after, .. } = op else {
            panic!("expected relocation");
        };
        assert_eq!(after, vec![TileId(0), TileId(2), TileId(3), TileId(1)]);

        assert!(model.drop_tiles(&[TileId(2)], Cell::new(0, 2)).is_none());
        assert!(TilesetModel::new(&atlas()).drop_tiles(&[TileId(0)], Cell::new(0, 0)).is_none());
    }
}
