use super::grid::{AtlasLayout, AtlasPos, GridRect, TileId};
use crate::tileset::Tileset;
use std::collections::HashMap;

/// The grid cells covered by one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// The tile.
    pub tile: TileId,
    /// Covered cells in atlas grid units.
    pub rect: GridRect,
}

impl Span {
    /// Top-left cell.
    #[inline]
    pub fn origin(&self) -> AtlasPos {
        self.rect.origin()
    }

    /// True for anything larger than 1x1.
    #[inline]
    pub fn is_multi_cell(&self) -> bool {
        self.rect.width > 1 || self.rect.height > 1
    }

    /// Whether `pos` is one of the covered cells.
    #[inline]
    pub fn contains(&self, pos: AtlasPos) -> bool {
        self.rect.contains(pos)
    }
}

/// Which tile occupies which atlas cell. Built in one pass over a tileset
/// and never patched; rebuild it whenever the tileset changes.
#[derive(Debug, Clone, Default)]
pub struct SpanIndex {
    origins: HashMap<AtlasPos, TileId>,
    spans: HashMap<TileId, Span>,
    multi_cell: Vec<Span>,
}

impl SpanIndex {
    /// Empty for anything but an atlas tileset.
    pub fn build(tileset: &Tileset) -> Self {
        let mut index = SpanIndex::default();
        if !tileset.is_atlas() {
            return index;
        }

        let layout: AtlasLayout = tileset.layout();
        for tile in tileset.tiles() {
            let rect = layout.grid_rect(tile.image_rect);
            let span = Span { tile: tile.id, rect };
            if let Some(previous) = index.origins.insert(rect.origin(), tile.id) {
                log::warn!(
                    "Tiles {} and {} share origin ({}, {})",
                    previous.0,
                    tile.id.0,
                    rect.col,
                    rect.row
                );
            }
            if span.is_multi_cell() {
                index.multi_cell.push(span);
            }
            index.spans.insert(tile.id, span);
        }
        index
    }

    /// The tile whose span starts at `pos`.
    pub fn origin_tile_at(&self, pos: AtlasPos) -> Option<TileId> {
        self.origins.get(&pos).copied()
    }

    /// The multi-cell tile whose span contains `pos`, origin included.
    pub fn spanning_tile_covering(&self, pos: AtlasPos) -> Option<TileId> {
        self.multi_cell
            .iter()
            .find(|span| span.contains(pos))
            .map(|span| span.tile)
    }

    /// True for cells only reached by a neighbouring span's overflow.
    pub fn is_covered(&self, pos: AtlasPos) -> bool {
        self.origin_tile_at(pos).is_none() && self.spanning_tile_covering(pos).is_some()
    }

    /// The cells covered by `tile`.
    pub fn span_of(&self, tile: TileId) -> Option<Span> {
        self.spans.get(&tile).copied()
    }

    /// (columns, rows) of the tile originating at `pos`; 1x1 otherwise.
    pub fn span_size_at(&self, pos: AtlasPos) -> (i32, i32) {
        self.origin_tile_at(pos)
            .and_then(|tile| self.span_of(tile))
            .map(|span| (span.rect.width, span.rect.height))
            .unwrap_or((1, 1))
    }

    /// Every tile whose span contains `pos`. More than one entry means the
    /// tileset currently has overlapping spans.
    pub fn owners_at(&self, pos: AtlasPos) -> Vec<TileId> {
        let mut owners: Vec<TileId> = self
            .spans
            .values()
            .filter(|span| span.contains(pos))
            .map(|span| span.tile)
            .collect();
        owners.sort_unstable();
        owners
    }

    /// Tiles whose span intersects `rect`, sorted by id.
    pub fn query_rect(&self, rect: GridRect) -> Vec<TileId> {
        let mut tiles: Vec<TileId> = self
            .spans
            .values()
            .filter(|span| span.rect.intersects(&rect))
            .map(|span| span.tile)
            .collect();
        tiles.sort_unstable();
        tiles
    }

    /// Multi-cell spans, in tileset order.
    pub fn multi_cell_spans(&self) -> &[Span] {
        &self.multi_cell
    }

    /// Number of indexed tiles.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// True when no tile is indexed.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
