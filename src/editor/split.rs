use super::{resize_op, AtlasEditor, SPLIT_TILES};
use crate::command::{EditOp, OpGroup};
use crate::spatial::{GridRect, TileId};
use crate::tileset::Tile;

/// The span edge a split cuts along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitEdge {
    /// Cut along the left edge; the right part stays a span.
    Left,
    /// Cut along the right edge; the left part stays a span.
    Right,
    /// Cut along the top edge; the bottom part stays a span.
    Top,
    /// Cut along the bottom edge; the top part stays a span.
    Bottom,
}

impl SplitEdge {
    /// Edge nearest to the span-local cell. Exact ties resolve in declaration
    /// order: left, right, top, bottom.
    pub fn nearest(relative_row: i32, relative_col: i32, width: i32, height: i32) -> SplitEdge {
        let left = relative_col as f32 / width.max(1) as f32;
        let top = relative_row as f32 / height.max(1) as f32;
        let candidates = [
            (SplitEdge::Left, left),
            (SplitEdge::Right, 1.0 - left),
            (SplitEdge::Top, top),
            (SplitEdge::Bottom, 1.0 - top),
        ];

        let mut best = candidates[0];
        for candidate in &candidates[1..] {
            if candidate.1 < best.1 {
                best = *candidate;
            }
        }
        best.0
    }

    /// Splits `span` into the part that stays a span and the part that is
    /// broken into unit tiles. The second rectangle always holds the clicked
    /// cell.
    pub fn partition(self, span: GridRect, relative_row: i32, relative_col: i32) -> (GridRect, GridRect) {
        let GridRect { col, row, width, height } = span;
        let (rr, rc) = (relative_row, relative_col);
        match self {
            SplitEdge::Left => (
                GridRect::new(col + rc + 1, row, width - rc - 1, height),
                GridRect::new(col, row, rc + 1, height),
            ),
            SplitEdge::Right => (
                GridRect::new(col, row, rc, height),
                GridRect::new(col + rc, row, width - rc, height),
            ),
            SplitEdge::Top => (
                GridRect::new(col, row + rr + 1, width, height - rr - 1),
                GridRect::new(col, row, width, rr + 1),
            ),
            SplitEdge::Bottom => (
                GridRect::new(col, row, width, rr),
                GridRect::new(col, row + rr, width, height - rr),
            ),
        }
    }
}

impl AtlasEditor<'_> {
    /// Breaks the side of `tile`'s span nearest the clicked cell into unit
    /// tiles and keeps the rest as one smaller span.
    ///
    /// `relative_row`/`relative_col` are span-local; anything outside the
    /// span yields an empty group.
    pub fn split_span(&self, tile: TileId, relative_row: i32, relative_col: i32) -> OpGroup {
        let mut group = OpGroup::new(SPLIT_TILES);
        let tileset = self.model.tileset();
        if !tileset.is_atlas() {
            return group;
        }

        let (Some(span_tile), Some(span)) = (self.model.find_tile(tile), self.model.spans().span_of(tile)) else {
            log::warn!("Split requested for unknown tile {}", tile.0);
            return group;
        };
        let span_rect = span.rect;
        if relative_row < 0
            || relative_col < 0
            || relative_row >= span_rect.height
            || relative_col >= span_rect.width
        {
            log::debug!(
                "Split cell ({}, {}) is outside the {}x{} span of tile {}",
                relative_row,
                relative_col,
                span_rect.width,
                span_rect.height,
                tile.0
            );
            return group;
        }

        let edge = SplitEdge::nearest(relative_row, relative_col, span_rect.width, span_rect.height);
        let (kept, split) = edge.partition(span_rect, relative_row, relative_col);
        log::debug!("Splitting tile {} along {:?}: keep {:?}, split {:?}", tile.0, edge, kept, split);

        let layout = tileset.layout();
        let origin = span_rect.origin();

        let stale = self.tiles_with_origin_in(kept, Some(tile));
        let stale_ids: Vec<TileId> = stale.iter().map(|t| t.id).collect();
        if !stale.is_empty() {
            group.push(EditOp::RemoveTiles(stale));
        }

        let mut added = Vec::new();
        if split.contains(origin) {
            let unit = layout.pixel_rect(GridRect::new(origin.col, origin.row, 1, 1));
            if let Some(op) = resize_op(span_tile, unit) {
                group.push(op);
            }
            if !kept.is_empty() {
                let id = tileset.generate_tile_id(kept.col, kept.row);
                if id == tile || (tileset.find_tile(id).is_some() && !stale_ids.contains(&id)) {
                    log::warn!("Tile id {} for the kept span is already taken", id.0);
                    debug_assert!(false, "kept span id {} collides", id.0);
                    return OpGroup::new(SPLIT_TILES);
                }
                added.push(Tile::new(id, layout.pixel_rect(kept)));
            }
        } else if let Some(op) = resize_op(span_tile, layout.pixel_rect(kept)) {
            group.push(op);
        }

        let spans = self.model.spans();
        for pos in split.positions() {
            let id = tileset.generate_tile_id(pos.col, pos.row);
            if id == tile || pos == origin {
                continue;
            }
            if spans.origin_tile_at(pos).is_some() || tileset.find_tile(id).is_some() {
                log::debug!("Cell ({}, {}) already has a tile; skipping", pos.col, pos.row);
                continue;
            }
            added.push(Tile::new(id, layout.pixel_rect(GridRect::new(pos.col, pos.row, 1, 1))));
        }
        if !added.is_empty() {
            group.push(EditOp::AddTiles(added));
        }
        group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::submit;
    use crate::document::TilesetDocument;
    use crate::model::TilesetModel;
    use crate::spatial::{tile_id_from_atlas_coords, AtlasPos, PixelRect};
    use crate::tileset::{Tileset, TilesetKind};

    /// An atlas holding a single tile spanning `span`.
    fn atlas_with_span(columns: i32, rows: i32, span: GridRect) -> Tileset {
        let mut ts = Tileset::new("atlas", TilesetKind::Atlas, 16, 16).with_grid(columns, rows);
        let rect = ts.layout().pixel_rect(span);
        let id = ts.generate_tile_id(span.col, span.row);
        ts.apply(&EditOp::AddTiles(vec![Tile::new(id, rect)])).expect("span tile");
        ts
    }

    #[test]
    fn nearest_edge_tie_break_order() {
        assert_eq!(SplitEdge::nearest(2, 2, 4, 4), SplitEdge::Left);
        assert_eq!(SplitEdge::nearest(1, 3, 4, 4), SplitEdge::Right);
        assert_eq!(SplitEdge::nearest(0, 2, 4, 4), SplitEdge::Top);
        assert_eq!(SplitEdge::nearest(2, 1, 4, 4), SplitEdge::Left);
        assert_eq!(SplitEdge::nearest(3, 2, 4, 4), SplitEdge::Bottom);
        for _ in 0..3 {
            assert_eq!(SplitEdge::nearest(2, 2, 4, 4), SplitEdge::Left);
        }
    }

    #[test]
    fn split_at_left_edge_shrinks_and_spawns_kept_span() {
        let ts = atlas_with_span(3, 1, GridRect::new(0, 0, 3, 1));
        let model = TilesetModel::new(&ts);
        let group = AtlasEditor::new(&model).split_span(TileId(0), 0, 0);
        assert_eq!(group.name, SPLIT_TILES);
        assert_eq!(
            group.ops,
            vec![
                EditOp::ChangeImageRect {
                    tile: TileId(0),
                    from: PixelRect::new(0, 0, 48, 16),
                    to: PixelRect::new(0, 0, 16, 16),
                },
                EditOp::AddTiles(vec![Tile::new(
                    tile_id_from_atlas_coords(1, 0),
                    PixelRect::new(16, 0, 32, 16)
                )]),
            ]
        );
    }

    #[test]
    fn split_in_the_middle_breaks_left_side() {
        let ts = atlas_with_span(4, 4, GridRect::new(0, 0, 4, 4));
        let model = TilesetModel::new(&ts);
        let group = AtlasEditor::new(&model).split_span(TileId(0), 2, 2);

        let mut doc = TilesetDocument::new(ts);
        assert_eq!(submit(group, &mut doc), Ok(true));
        let model = TilesetModel::new(doc.tileset());
        let spans = model.spans();

        let kept = spans.origin_tile_at(AtlasPos::new(3, 0)).unwrap();
        assert_eq!(spans.span_of(kept).unwrap().rect, GridRect::new(3, 0, 1, 4));
        assert_eq!(doc.tileset().tile_count(), 13);
        for pos in GridRect::new(0, 0, 3, 4).positions() {
            let owner = spans.origin_tile_at(pos).expect("unit tile");
            assert_eq!(spans.span_of(owner).unwrap().rect, GridRect::new(pos.col, pos.row, 1, 1));
        }
        for pos in GridRect::new(0, 0, 4, 4).positions() {
            assert_eq!(spans.owners_at(pos).len(), 1, "cell {:?}", pos);
        }
    }

    #[test]
    fn split_right_and_bottom_keep_the_origin() {
        let ts = atlas_with_span(4, 4, GridRect::new(0, 0, 4, 4));
        let model = TilesetModel::new(&ts);
        let editor = AtlasEditor::new(&model);

        let right = editor.split_span(TileId(0), 1, 3);
        assert_eq!(
            right.ops[0],
            EditOp::ChangeImageRect {
                tile: TileId(0),
                from: PixelRect::new(0, 0, 64, 64),
                to: PixelRect::new(0, 0, 48, 64),
            }
        );
        let EditOp::AddTiles(units) = &right.ops[1] else {
            panic!("expected unit tiles");
        };
        let ids: Vec<_> = units.iter().map(|t| t.id).collect();
        let expected: Vec<_> = (0..4).map(|r| tile_id_from_atlas_coords(3, r)).collect();
        assert_eq!(ids, expected);

        let bottom = editor.split_span(TileId(0), 3, 2);
        assert_eq!(
            bottom.ops[0],
            EditOp::ChangeImageRect {
                tile: TileId(0),
                from: PixelRect::new(0, 0, 64, 64),
                to: PixelRect::new(0, 0, 64, 48),
            }
        );
        let EditOp::AddTiles(units) = &bottom.ops[1] else {
            panic!("expected unit tiles");
        };
        assert_eq!(units.len(), 4);
        assert!(units.iter().all(|t| t.image_rect.y == 48));
    }

    #[test]
    fn out_of_span_cells_are_ignored() {
        let ts = atlas_with_span(4, 4, GridRect::new(0, 0, 2, 2));
        let model = TilesetModel::new(&ts);
        let editor = AtlasEditor::new(&model);
        assert!(editor.split_span(TileId(0), 2, 0).is_empty());
        assert!(editor.split_span(TileId(0), 0, -1).is_empty());
        assert!(editor.split_span(TileId(42), 0, 0).is_empty());
    }

    #[test]
    fn split_then_merge_restores_the_span() {
        let original = GridRect::new(1, 1, 3, 2);
        let ts = atlas_with_span(5, 4, original);
        let original_rect = ts.layout().pixel_rect(original);
        let span_id = ts.generate_tile_id(1, 1);
        let mut doc = TilesetDocument::new(ts);

        let model = TilesetModel::new(doc.tileset());
        AtlasEditor::new(&model)
            .apply_split(span_id, 1, 1, &mut doc)
            .unwrap();
        assert!(doc.tileset().tile_count() > 1);

        let model = TilesetModel::new(doc.tileset());
        AtlasEditor::new(&model)
            .apply_merge(1, 2, 1, 3, &mut doc)
            .unwrap();

        assert_eq!(doc.tileset().tile_count(), 1);
        assert_eq!(doc.tileset().tiles()[0].image_rect, original_rect);
    }
}
