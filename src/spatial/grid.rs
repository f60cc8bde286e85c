//! Coordinate math between view cells, atlas grid positions, tile ids and
//! atlas pixel rectangles. Everything here is pure.

use serde::{Deserialize, Serialize};

/// Tile identifier, unique within a tileset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub u32);

impl TileId {
    /// The packed integer value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Bits reserved for the column in an atlas-generated tile id.
const ATLAS_COL_BITS: u32 = 16;
const ATLAS_COL_MASK: u32 = (1 << ATLAS_COL_BITS) - 1;

/// A (row, column) position in the view grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    /// View row.
    pub row: i32,
    /// View column.
    pub col: i32,
}

impl Cell {
    /// Note the (row, column) argument order.
    #[inline]
    pub const fn new(row: i32, col: i32) -> Self {
        Cell { row, col }
    }
}

/// A (column, row) position in the atlas' native grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AtlasPos {
    /// Atlas column.
    pub col: i32,
    /// Atlas row.
    pub row: i32,
}

impl AtlasPos {
    /// Note the (column, row) argument order.
    #[inline]
    pub const fn new(col: i32, row: i32) -> Self {
        AtlasPos { col, row }
    }
}

/// Rectangle in grid units. `width`/`height` of zero means empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridRect {
    /// Left column.
    pub col: i32,
    /// Top row.
    pub row: i32,
    /// Width in cells.
    pub width: i32,
    /// Height in cells.
    pub height: i32,
}

impl GridRect {
    /// Rectangle from its top-left position and size.
    pub const fn new(col: i32, row: i32, width: i32, height: i32) -> Self {
        GridRect { col, row, width, height }
    }

    /// Inclusive corners, as produced by a drag selection.
    pub fn from_corners(min_col: i32, min_row: i32, max_col: i32, max_row: i32) -> Self {
        GridRect::new(min_col, min_row, max_col - min_col + 1, max_row - min_row + 1)
    }

    /// True when either side is not positive.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Top-left position.
    #[inline]
    pub fn origin(&self) -> AtlasPos {
        AtlasPos::new(self.col, self.row)
    }

    /// Whether `pos` lies inside; an empty rectangle contains nothing.
    pub fn contains(&self, pos: AtlasPos) -> bool {
        !self.is_empty()
            && pos.col >= self.col
            && pos.col < self.col + self.width
            && pos.row >= self.row
            && pos.row < self.row + self.height
    }

    /// Whether the two rectangles share at least one cell.
    pub fn intersects(&self, other: &GridRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.col < other.col + other.width
            && other.col < self.col + self.width
            && self.row < other.row + other.height
            && other.row < self.row + self.height
    }

    /// Row-major iteration over every position in the rectangle.
    pub fn positions(&self) -> impl Iterator<Item = AtlasPos> + '_ {
        let (w, h) = (self.width.max(0), self.height.max(0));
        (0..h).flat_map(move |r| (0..w).map(move |c| AtlasPos::new(self.col + c, self.row + r)))
    }
}

/// Rectangle in atlas pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl PixelRect {
    /// Rectangle from its top-left corner and size.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        PixelRect { x, y, width, height }
    }

    /// True when either side is not positive.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// `(x, y)` of the top-left corner.
    #[inline]
    pub fn top_left(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Point containment; an empty rectangle contains nothing.
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        !self.is_empty()
            && x >= self.x
            && x < self.x + self.width
            && y >= self.y
            && y < self.y + self.height
    }
}

/// The parameters needed to place grid cells inside an atlas image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasLayout {
    /// Cell width in pixels.
    pub tile_width: i32,
    /// Cell height in pixels.
    pub tile_height: i32,
    /// Pixels between cells.
    pub spacing: i32,
    /// Pixels around the whole grid.
    pub margin: i32,
}

impl AtlasLayout {
    /// See [`pixel_rect_from_grid`].
    pub fn pixel_rect(&self, grid: GridRect) -> PixelRect {
        pixel_rect_from_grid(grid, self.tile_width, self.tile_height, self.spacing, self.margin)
    }

    /// See [`grid_pos_from_pixel_rect`].
    pub fn grid_pos(&self, rect: PixelRect) -> AtlasPos {
        grid_pos_from_pixel_rect(rect, self.tile_width, self.tile_height, self.spacing, self.margin)
    }

    /// Span size in cells, truncated toward zero.
    pub fn span_size(&self, rect: PixelRect) -> (i32, i32) {
        if self.tile_width <= 0 || self.tile_height <= 0 {
            return (1, 1);
        }
        (rect.width / self.tile_width, rect.height / self.tile_height)
    }

    /// The grid rectangle covered by `rect`.
    pub fn grid_rect(&self, rect: PixelRect) -> GridRect {
        let origin = self.grid_pos(rect);
        let (w, h) = self.span_size(rect);
        GridRect::new(origin.col, origin.row, w, h)
    }

    /// True when `rect` is exactly what `pixel_rect` would produce for its
    /// own grid rectangle.
    pub fn is_grid_aligned(&self, rect: PixelRect) -> bool {
        let grid = self.grid_rect(rect);
        !grid.is_empty() && self.pixel_rect(grid) == rect
    }
}

/// Flattens a view cell with `view_columns` and re-expands it with
/// `atlas_columns`. Returns `None` for non-positive column counts.
pub fn view_to_atlas(
    view_col: i32,
    view_row: i32,
    view_columns: i32,
    atlas_columns: i32,
) -> Option<AtlasPos> {
    if view_columns <= 0 || atlas_columns <= 0 {
        return None;
    }
    let linear = view_col + view_row * view_columns;
    Some(AtlasPos::new(linear % atlas_columns, linear / atlas_columns))
}

/// Inverse of [`view_to_atlas`].
pub fn atlas_to_view(
    atlas_col: i32,
    atlas_row: i32,
    atlas_columns: i32,
    view_columns: i32,
) -> Option<Cell> {
    if view_columns <= 0 || atlas_columns <= 0 {
        return None;
    }
    let linear = atlas_row * atlas_columns + atlas_col;
    Some(Cell::new(linear / view_columns, linear % view_columns))
}

/// Packs the row into the high bits and the column into the low 16 bits.
#[inline]
pub fn tile_id_from_atlas_coords(col: i32, row: i32) -> TileId {
    TileId(((row as u32) << ATLAS_COL_BITS) | (col as u32 & ATLAS_COL_MASK))
}

/// Inverse of [`tile_id_from_atlas_coords`].
#[inline]
pub fn coords_from_tile_id(id: TileId) -> AtlasPos {
    AtlasPos::new((id.0 & ATLAS_COL_MASK) as i32, (id.0 >> ATLAS_COL_BITS) as i32)
}

/// Pixel rectangle of a grid rectangle: the origin steps by tile size plus
/// spacing, the size is a whole number of tiles.
pub fn pixel_rect_from_grid(
    grid: GridRect,
    tile_width: i32,
    tile_height: i32,
    spacing: i32,
    margin: i32,
) -> PixelRect {
    PixelRect::new(
        margin + grid.col * (tile_width + spacing),
        margin + grid.row * (tile_height + spacing),
        grid.width * tile_width,
        grid.height * tile_height,
    )
}

/// Rounds to the nearest cell rather than truncating.
pub fn grid_pos_from_pixel_rect(
    rect: PixelRect,
    tile_width: i32,
    tile_height: i32,
    spacing: i32,
    margin: i32,
) -> AtlasPos {
    let step_x = (tile_width + spacing).max(1) as f32;
    let step_y = (tile_height + spacing).max(1) as f32;
    AtlasPos::new(
        ((rect.x - margin) as f32 / step_x).round() as i32,
        ((rect.y - margin) as f32 / step_y).round() as i32,
    )
}
