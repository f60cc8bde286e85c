use crate::command::EditOp;
use crate::error::EditError;
use crate::spatial::{tile_id_from_atlas_coords, AtlasLayout, GridRect, PixelRect, TileId};
use crate::wang::WangSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// One step of a tile animation.
pub struct Frame {
    /// Tile shown during this frame.
    pub tile: TileId,
    /// Frame length in milliseconds.
    pub duration_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A tile and the image region it draws.
pub struct Tile {
    /// Identifier; for atlases this encodes the origin cell.
    pub id: TileId,
    /// Pixel region within the tileset image.
    pub image_rect: PixelRect,
    /// Per-tile image, used by collections.
    #[serde(default)]
    pub image_source: Option<String>,
    /// Animation frames, empty when static.
    #[serde(default)]
    pub animation: Vec<Frame>,
}

impl Tile {
    /// Creates a static tile without its own image.
    pub fn new(id: TileId, image_rect: PixelRect) -> Self {
        Tile {
            id,
            image_rect,
            image_source: None,
            animation: Vec::new(),
        }
    }

    /// Whether the tile has animation frames.
    pub fn is_animated(&self) -> bool {
        !self.animation.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
/// How a tileset lays out its tiles.
#[serde(rename_all = "lowercase")]
pub enum TilesetKind {
    /// Uniform non-spanning grid cut from one image.
    #[default]
    Grid,
    /// Tiles may span several grid cells; ids encode their origin cell.
    Atlas,
    /// One image per tile, laid out as a flat list.
    Collection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A tileset with its tiles and Wang sets.
pub struct Tileset {
    /// Display name.
    pub name: String,
    /// Layout kind.
    #[serde(default)]
    pub kind: TilesetKind,
    /// Grid cell width in pixels.
    pub tile_width: i32,
    /// Grid cell height in pixels.
    pub tile_height: i32,
    /// Pixels around the image border.
    #[serde(default)]
    pub margin: i32,
    /// Pixels between cells.
    #[serde(default)]
    pub spacing: i32,
    /// Grid columns in the image.
    #[serde(default)]
    pub columns: i32,
    /// Grid rows in the image.
    #[serde(default)]
    pub rows: i32,
    /// Atlas or grid image; collections carry one image per tile instead.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    tiles: Vec<Tile>,
    /// Wang sets defined on this tileset.
    #[serde(default)]
    pub wang_sets: Vec<WangSet>,
}

impl Tileset {
    /// Creates an empty tileset with no grid.
    pub fn new(name: impl Into<String>, kind: TilesetKind, tile_width: i32, tile_height: i32) -> Self {
        Tileset {
            name: name.into(),
            kind,
            tile_width,
            tile_height,
            margin: 0,
            spacing: 0,
            columns: 0,
            rows: 0,
            image: None,
            tiles: Vec::new(),
            wang_sets: Vec::new(),
        }
    }

    /// Sets the grid dimensions.
    pub fn with_grid(mut self, columns: i32, rows: i32) -> Self {
        self.columns = columns;
        self.rows = rows;
        self
    }

    /// Sets margin and spacing in pixels.
    pub fn with_margin_spacing(mut self, margin: i32, spacing: i32) -> Self {
        self.margin = margin;
        self.spacing = spacing;
        self
    }

    /// Whether tiles may span several cells.
    #[inline]
    pub fn is_atlas(&self) -> bool {
        self.kind == TilesetKind::Atlas
    }

    /// Whether each tile has its own image.
    #[inline]
    pub fn is_collection(&self) -> bool {
        self.kind == TilesetKind::Collection
    }

    /// Pixel geometry of the grid.
    pub fn layout(&self) -> AtlasLayout {
        AtlasLayout {
            tile_width: self.tile_width,
            tile_height: self.tile_height,
            spacing: self.spacing,
            margin: self.margin,
        }
    }

    /// Tiles in tileset order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Number of tiles.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Looks up a tile by id.
    pub fn find_tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    fn position(&self, id: TileId) -> Option<usize> {
        self.tiles.iter().position(|t| t.id == id)
    }

    /// Id of a tile whose origin is at `col`, `row`.
    #[inline]
    pub fn generate_tile_id(&self, col: i32, row: i32) -> TileId {
        tile_id_from_atlas_coords(col, row)
    }

    /// Fills an atlas or grid tileset with one unit tile per cell.
    pub fn fill_unit_tiles(&mut self) {
        let layout = self.layout();
        let atlas = self.is_atlas();
        let mut next = 0u32;
        self.tiles.clear();
        for row in 0..self.rows.max(0) {
            for col in 0..self.columns.max(0) {
                let rect = layout.pixel_rect(GridRect::new(col, row, 1, 1));
                let id = if atlas {
                    tile_id_from_atlas_coords(col, row)
                } else {
                    next += 1;
                    TileId(next - 1)
                };
                self.tiles.push(Tile::new(id, rect));
            }
        }
    }

    fn check_rect(&self, tile: TileId, rect: PixelRect) -> Result<(), EditError> {
        if self.is_atlas() && !self.layout().is_grid_aligned(rect) {
            return Err(EditError::UnalignedRect { tile, rect });
        }
        Ok(())
    }

    /// Applies one operation. Each operation is validated as a whole before
    /// the tileset is touched, so a rejected op leaves it unchanged.
    pub fn apply(&mut self, op: &EditOp) -> Result<(), EditError> {
        match op {
            EditOp::AddTiles(tiles) => {
                for (i, tile) in tiles.iter().enumerate() {
                    if self.find_tile(tile.id).is_some()
                        || tiles[..i].iter().any(|t| t.id == tile.id)
                    {
                        return Err(EditError::DuplicateTile(tile.id));
                    }
                    self.check_rect(tile.id, tile.image_rect)?;
                }
                self.tiles.extend(tiles.iter().cloned());
            }
            EditOp::RemoveTiles(tiles) => {
                if let Some(missing) = tiles.iter().find(|t| self.find_tile(t.id).is_none()) {
                    return Err(EditError::UnknownTile(missing.id));
                }
                // Wang ids stay keyed by tile id so that undoing the removal
                // brings them back.
                self.tiles.retain(|t| !tiles.iter().any(|r| r.id == t.id));
            }
            EditOp::ChangeImageRect { tile, to, .. } => {
                self.check_rect(*tile, *to)?;
                let index = self.position(*tile).ok_or(EditError::UnknownTile(*tile))?;
                self.tiles[index].image_rect = *to;
            }
            EditOp::RelocateTiles { before, after } => {
                let current: Vec<TileId> = self.tiles.iter().map(|t| t.id).collect();
                if &current != before || after.len() != before.len() {
                    return Err(EditError::OrderMismatch);
                }
                let mut reordered = Vec::with_capacity(after.len());
                for id in after {
                    let index = self.position(*id).ok_or(EditError::OrderMismatch)?;
                    reordered.push(self.tiles[index].clone());
                }
                self.tiles = reordered;
            }
            EditOp::ChangeWangId { wang_set, tile, to, .. } => {
                if self.find_tile(*tile).is_none() {
                    return Err(EditError::UnknownTile(*tile));
                }
                let set = self
                    .wang_sets
                    .get_mut(*wang_set)
                    .ok_or(EditError::UnknownWangSet(*wang_set))?;
                set.set_wang_id(*tile, *to);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wang::{WangId, WangSetType};

    fn atlas() -> Tileset {
        let mut ts = Tileset::new("atlas", TilesetKind::Atlas, 16, 16).with_grid(4, 3);
        ts.fill_unit_tiles();
        ts
    }

    #[test]
    fn fill_unit_tiles_uses_atlas_ids() {
        let ts = atlas();
        assert_eq!(ts.tile_count(), 12);
        let tile = ts.find_tile(tile_id_from_atlas_coords(2, 1)).unwrap();
        assert_eq!(tile.image_rect, PixelRect::new(32, 16, 16, 16));
    }

    #[test]
    fn apply_then_inverse_restores_tileset() {
        let mut ts = atlas();
        let before = ts.clone();
        let id = tile_id_from_atlas_coords(0, 0);
        let ops = vec![
            EditOp::RemoveTiles(vec![ts.find_tile(tile_id_from_atlas_coords(1, 0)).unwrap().clone()]),
            EditOp::ChangeImageRect {
                tile: id,
                from: PixelRect::new(0, 0, 16, 16),
                to: ts.layout().pixel_rect(GridRect::new(0, 0, 2, 1)),
            },
        ];
        for op in &ops {
            ts.apply(op).unwrap();
        }
        assert_eq!(ts.tile_count(), 11);
        for op in ops.iter().rev() {
            ts.apply(&op.inverted()).unwrap();
        }
        // Removed tiles are re-appended, so compare as sets.
        assert_eq!(ts.tile_count(), before.tile_count());
        for tile in before.tiles() {
            assert_eq!(ts.find_tile(tile.id), Some(tile));
        }
    }

    #[test]
    fn rejects_duplicates_and_unaligned_rects() {
        let mut ts = atlas();
        let dup = Tile::new(TileId(0), PixelRect::new(0, 0, 16, 16));
        assert_eq!(ts.apply(&EditOp::AddTiles(vec![dup])), Err(EditError::DuplicateTile(TileId(0))));

        let err = ts
            .apply(&EditOp::ChangeImageRect {
                tile: TileId(0),
                from: PixelRect::new(0, 0, 16, 16),
                to: PixelRect::new(3, 0, 16, 16),
            })
            .unwrap_err();
        assert!(matches!(err, EditError::UnalignedRect { .. }));
        assert_eq!(ts.find_tile(TileId(0)).unwrap().image_rect, PixelRect::new(0, 0, 16, 16));
    }

    #[test]
    fn relocate_requires_matching_order() {
        let mut ts = Tileset::new("c", TilesetKind::Collection, 8, 8);
        ts.apply(&EditOp::AddTiles(vec![
            Tile::new(TileId(1), PixelRect::new(0, 0, 8, 8)),
            Tile::new(TileId(2), PixelRect::new(0, 0, 8, 8)),
        ]))
        .unwrap();
        let op = EditOp::RelocateTiles {
            before: vec![TileId(1), TileId(2)],
            after: vec![TileId(2), TileId(1)],
        };
        ts.apply(&op).unwrap();
        assert_eq!(ts.tiles()[0].id, TileId(2));
        assert_eq!(ts.apply(&op), Err(EditError::OrderMismatch));
    }

    #[test]
    fn wang_ids_survive_remove_and_undo() {
        let mut ts = atlas();
        ts.wang_sets.push(WangSet::new("grass", WangSetType::Corner, 1));
        ts.apply(&EditOp::ChangeWangId {
            wang_set: 0,
            tile: TileId(0),
            from: WangId::EMPTY,
            to: WangId::filled(1),
        })
        .unwrap();
        let remove = EditOp::RemoveTiles(vec![ts.find_tile(TileId(0)).unwrap().clone()]);
        ts.apply(&remove).unwrap();
        ts.apply(&remove.inverted()).unwrap();
        assert_eq!(ts.wang_sets[0].wang_id_of_tile(TileId(0)), WangId::filled(1));
    }

    #[test]
    fn wang_change_needs_existing_set() {
        let mut ts = atlas();
        let err = ts
            .apply(&EditOp::ChangeWangId {
                wang_set: 2,
                tile: TileId(0),
                from: WangId::EMPTY,
                to: WangId::filled(1),
            })
            .unwrap_err();
        assert_eq!(err, EditError::UnknownWangSet(2));
    }
}
